//! Optional enrichment steps merged into an intermediate verdict.
//!
//! Both functions take the verdict by value and return the merged form.
//! Bank-code validation must run before BIC resolution; resolution assumes
//! the bank code segment has already been checked against the registry.

use crate::iban::Iban;
use crate::registry::BankDataRepository;
use crate::result::ValidationResult;

/// Check the identifier's national bank code against the registry.
///
/// An unknown bank code marks the whole result invalid: the identifier may
/// be checksum-correct, but it does not refer to a known institution.
pub fn validate_bank_code(
    iban: &Iban,
    mut result: ValidationResult,
    repo: &dyn BankDataRepository,
) -> ValidationResult {
    let bank_code = match iban.bank_code() {
        Some(code) => code,
        None => {
            result.bank_code_valid = Some(false);
            result.push_message(&format!(
                "Bank code validation not supported for {}",
                iban.country_code()
            ));
            return result;
        }
    };

    match repo.find(iban.country_code(), bank_code) {
        Some(record) => {
            result.bank_code_valid = Some(true);
            result.bank_name = Some(record.name);
        }
        None => {
            result.valid = false;
            result.bank_code_valid = Some(false);
            result.push_message(&format!("Unknown bank code: {}", bank_code));
        }
    }
    result
}

/// Resolve the Bank Identifier Code for the identifier's bank code.
///
/// A missing BIC is a registry gap, not a property of the identifier, so it
/// leaves `valid` untouched and only records a diagnostic.
pub fn resolve_bic(
    iban: &Iban,
    mut result: ValidationResult,
    repo: &dyn BankDataRepository,
) -> ValidationResult {
    let bank_code = match iban.bank_code() {
        Some(code) => code,
        None => {
            result.push_message(&format!(
                "BIC resolution not supported for {}",
                iban.country_code()
            ));
            return result;
        }
    };

    match repo.find(iban.country_code(), bank_code) {
        Some(record) => match record.bic {
            Some(bic) => {
                result.bic = Some(bic);
                result.bank_name.get_or_insert(record.name);
            }
            None => {
                result.push_message(&format!(
                    "No BIC found for bank code: {}",
                    bank_code
                ));
            }
        },
        None => {
            result.push_message(&format!("No BIC found for bank code: {}", bank_code));
        }
    }
    result
}
