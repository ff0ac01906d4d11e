use serde::{Deserialize, Serialize};

/// Verdict returned to callers, serialized as the JSON response body.
///
/// The enrichment fields are only populated when the corresponding request
/// flag was set; they are omitted from the JSON entirely when `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the identifier passed every check run against it.
    pub valid: bool,

    /// Human-readable diagnostic; empty for a fully valid identifier.
    pub message: String,

    /// The identifier the verdict applies to, echoed back.
    pub iban: String,

    /// Whether the national bank code is present in the registry.
    #[serde(rename = "bankCodeValid", skip_serializing_if = "Option::is_none")]
    pub bank_code_valid: Option<bool>,

    /// Name of the institution, when a registry record was found.
    #[serde(rename = "bankName", skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,

    /// Resolved Bank Identifier Code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
}

impl ValidationResult {
    /// Create a base result with no enrichment fields.
    pub fn new(valid: bool, message: impl Into<String>, iban: impl Into<String>) -> Self {
        Self {
            valid,
            message: message.into(),
            iban: iban.into(),
            bank_code_valid: None,
            bank_name: None,
            bic: None,
        }
    }

    /// Append a diagnostic, separating multiple messages with "; ".
    pub fn push_message(&mut self, message: &str) {
        if self.message.is_empty() {
            self.message = message.to_string();
        } else {
            self.message.push_str("; ");
            self.message.push_str(message);
        }
    }
}
