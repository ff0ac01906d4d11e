//! Read-only bank registry consulted by the enrichment steps.
//!
//! The repository is populated once at startup by the [`crate::loaders`]
//! module and only read afterwards; the interior lock exists so multiple
//! request workers can consult it concurrently.

use std::collections::HashMap;
use std::sync::RwLock;

/// A single institution record from a national registry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRecord {
    /// Two-letter ISO country code the record belongs to.
    pub country: String,
    /// National bank code, as it appears inside the BBAN.
    pub bank_code: String,
    /// Institution name.
    pub name: String,
    /// Bank Identifier Code, when the registry publishes one.
    pub bic: Option<String>,
}

/// Lookup seam between the validation pipeline and the registry data.
///
/// Implementations must be safe for concurrent reads from multiple request
/// workers. Tests substitute counting doubles here.
pub trait BankDataRepository: Send + Sync {
    /// Find the record for a `(country, bank code)` pair.
    fn find(&self, country: &str, bank_code: &str) -> Option<BankRecord>;

    /// Number of records currently stored.
    fn len(&self) -> usize;

    /// Whether the repository holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory `BankDataRepository` backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemoryBankData {
    records: RwLock<HashMap<(String, String), BankRecord>>,
}

impl InMemoryBankData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any previous record for the same pair.
    pub fn store(&self, record: BankRecord) {
        let key = (record.country.clone(), record.bank_code.clone());
        self.records
            .write()
            .expect("bank data lock poisoned")
            .insert(key, record);
    }
}

impl BankDataRepository for InMemoryBankData {
    fn find(&self, country: &str, bank_code: &str) -> Option<BankRecord> {
        self.records
            .read()
            .expect("bank data lock poisoned")
            .get(&(country.to_string(), bank_code.to_string()))
            .cloned()
    }

    fn len(&self) -> usize {
        self.records.read().expect("bank data lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, code: &str, name: &str, bic: Option<&str>) -> BankRecord {
        BankRecord {
            country: country.to_string(),
            bank_code: code.to_string(),
            name: name.to_string(),
            bic: bic.map(String::from),
        }
    }

    #[test]
    fn test_store_and_find() {
        let repo = InMemoryBankData::new();
        repo.store(record("DE", "37040044", "Commerzbank", Some("COBADEFFXXX")));

        let hit = repo.find("DE", "37040044").unwrap();
        assert_eq!(hit.name, "Commerzbank");
        assert_eq!(hit.bic.as_deref(), Some("COBADEFFXXX"));

        assert!(repo.find("DE", "00000000").is_none());
        assert!(repo.find("AT", "37040044").is_none());
    }

    #[test]
    fn test_store_replaces_existing() {
        let repo = InMemoryBankData::new();
        repo.store(record("DE", "37040044", "Old Name", None));
        repo.store(record("DE", "37040044", "New Name", None));

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find("DE", "37040044").unwrap().name, "New Name");
    }

    #[test]
    fn test_empty_repo() {
        let repo = InMemoryBankData::new();
        assert!(repo.is_empty());
        assert_eq!(repo.len(), 0);
    }
}
