//! The validation pipeline: ordered, short-circuiting stages turning a
//! request into a serialized verdict.
//!
//! Stage order is fixed: emptiness check, structural parse, checksum
//! validation, then optional enrichment (bank-code validation before BIC
//! resolution, since resolution assumes a checked bank code). Every stage
//! failure is still a well-formed JSON verdict; only the empty-identifier
//! case is a client error and excluded from caching.

use axum::http::StatusCode;
use tracing::error;

use ibancheck_lib::{
    parse_outcome, resolve_bic, validate_bank_code, BankDataRepository, Error as LibError, Iban,
    ValidationResult,
};

/// Immutable value derived from an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub iban: String,
    pub validate_bank_code: bool,
    pub resolve_bic: bool,
}

impl ValidationRequest {
    pub fn new(iban: impl Into<String>, validate_bank_code: bool, resolve_bic: bool) -> Self {
        Self {
            iban: iban.into(),
            validate_bank_code,
            resolve_bic,
        }
    }

    /// Deterministic cache key: identifier, then the BIC flag, then the
    /// bank-code flag, booleans rendered as `true`/`false`. Field order and
    /// rendering are fixed; two requests with identical fields always map
    /// to the same key and distinct flag sets never collide.
    pub fn cache_key(&self) -> String {
        format!("{}{}{}", self.iban, self.resolve_bic, self.validate_bank_code)
    }
}

/// Result of running the pipeline: what to send and whether to cache it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub status: StatusCode,
    pub body: String,
    /// Cacheable outcomes are stored without expiry: a verdict about a
    /// concrete identifier is a stable fact. The empty-request error is
    /// the caller's mistake, not such a fact, and is never cached.
    pub cacheable: bool,
}

/// Run every applicable stage for `request` against the injected registry.
pub fn run(request: &ValidationRequest, repo: &dyn BankDataRepository) -> PipelineOutcome {
    if request.iban.is_empty() {
        let result = ValidationResult::new(false, "Empty request.", "");
        return PipelineOutcome {
            status: StatusCode::BAD_REQUEST,
            body: serialize(&result),
            cacheable: false,
        };
    }

    let outcome = parse_outcome(&request.iban);
    if !outcome.valid {
        return not_parseable(&request.iban, &outcome.message);
    }

    let iban = match Iban::parse(&request.iban) {
        Ok(iban) => iban,
        // The pre-check passed, so this is unreachable in practice; treat
        // it like any other structural failure if it ever happens.
        Err(LibError::Unparseable { message }) => return not_parseable(&request.iban, &message),
        Err(err) => return not_parseable(&request.iban, &err.to_string()),
    };

    let mut result = iban.validate();
    if request.validate_bank_code {
        result = validate_bank_code(&iban, result, repo);
    }
    if request.resolve_bic {
        result = resolve_bic(&iban, result, repo);
    }

    PipelineOutcome {
        status: StatusCode::OK,
        body: serialize(&result),
        cacheable: true,
    }
}

/// A non-IBAN is itself a valid, cacheable answer: HTTP 200, `valid: false`.
fn not_parseable(iban: &str, diagnostic: &str) -> PipelineOutcome {
    let result = ValidationResult::new(
        false,
        format!("Cannot parse as IBAN: {}", diagnostic),
        iban,
    );
    PipelineOutcome {
        status: StatusCode::OK,
        body: serialize(&result),
        cacheable: true,
    }
}

/// Render the verdict as indented JSON. A serialization failure must not
/// take the connection down; respond with an empty body instead.
fn serialize(result: &ValidationResult) -> String {
    match serde_json::to_string_pretty(result) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, iban = %result.iban, "failed to serialize validation result");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibancheck_lib::{BankRecord, InMemoryBankData};
    use std::collections::HashSet;

    fn fixture_repo() -> InMemoryBankData {
        let repo = InMemoryBankData::new();
        repo.store(BankRecord {
            country: "DE".to_string(),
            bank_code: "37040044".to_string(),
            name: "Commerzbank".to_string(),
            bic: Some("COBADEFFXXX".to_string()),
        });
        repo
    }

    #[test]
    fn test_cache_key_deterministic_and_ordered() {
        let request = ValidationRequest::new("DE89370400440532013000", true, false);
        assert_eq!(request.cache_key(), "DE89370400440532013000falsetrue");
        assert_eq!(request.cache_key(), request.clone().cache_key());
    }

    #[test]
    fn test_cache_key_injective_over_flags() {
        let keys: HashSet<String> = [
            ValidationRequest::new("DE89370400440532013000", false, false),
            ValidationRequest::new("DE89370400440532013000", false, true),
            ValidationRequest::new("DE89370400440532013000", true, false),
            ValidationRequest::new("DE89370400440532013000", true, true),
        ]
        .iter()
        .map(ValidationRequest::cache_key)
        .collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_cache_key_empty_identifier_total() {
        let request = ValidationRequest::new("", false, false);
        assert_eq!(request.cache_key(), "falsefalse");
    }

    #[test]
    fn test_empty_request_is_client_error_and_uncacheable() {
        let repo = fixture_repo();
        let outcome = run(&ValidationRequest::new("", false, false), &repo);

        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert!(!outcome.cacheable);
        assert!(outcome.body.contains("\"valid\": false"));
        assert!(outcome.body.contains("Empty request."));
    }

    #[test]
    fn test_unparseable_is_cacheable_success() {
        let repo = fixture_repo();
        let outcome = run(&ValidationRequest::new("NOT-AN-IBAN", false, false), &repo);

        assert_eq!(outcome.status, StatusCode::OK);
        assert!(outcome.cacheable);
        assert!(outcome.body.contains("Cannot parse as IBAN:"));
        assert!(outcome.body.contains("\"valid\": false"));
    }

    #[test]
    fn test_checksum_invalid_is_cacheable_success() {
        let repo = fixture_repo();
        let outcome = run(
            &ValidationRequest::new("DE89370400440532013001", false, false),
            &repo,
        );

        assert_eq!(outcome.status, StatusCode::OK);
        assert!(outcome.cacheable);
        assert!(outcome.body.contains("Checksum validation failed"));
    }

    #[test]
    fn test_valid_without_enrichment() {
        let repo = fixture_repo();
        let outcome = run(
            &ValidationRequest::new("DE89370400440532013000", false, false),
            &repo,
        );

        assert_eq!(outcome.status, StatusCode::OK);
        assert!(outcome.body.contains("\"valid\": true"));
        assert!(!outcome.body.contains("bankCodeValid"));
        assert!(!outcome.body.contains("bic"));
    }

    #[test]
    fn test_enrichment_both_flags() {
        let repo = fixture_repo();
        let outcome = run(
            &ValidationRequest::new("DE89370400440532013000", true, true),
            &repo,
        );

        assert!(outcome.body.contains("\"bankCodeValid\": true"));
        assert!(outcome.body.contains("\"bic\": \"COBADEFFXXX\""));
        assert!(outcome.body.contains("\"bankName\": \"Commerzbank\""));
    }

    #[test]
    fn test_unknown_bank_code_invalidates() {
        let repo = fixture_repo();
        let outcome = run(
            &ValidationRequest::new("DE02120300000000202051", true, false),
            &repo,
        );

        assert_eq!(outcome.status, StatusCode::OK);
        assert!(outcome.body.contains("\"valid\": false"));
        assert!(outcome.body.contains("\"bankCodeValid\": false"));
        assert!(outcome.body.contains("Unknown bank code: 12030000"));
    }

    #[test]
    fn test_body_is_indented_json() {
        let repo = fixture_repo();
        let outcome = run(
            &ValidationRequest::new("DE89370400440532013000", false, false),
            &repo,
        );

        // to_string_pretty renders two-space indentation.
        assert!(outcome.body.starts_with("{\n  \"valid\""));
    }
}
