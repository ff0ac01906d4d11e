//! Application state shared by the request handlers.
//!
//! Replaces the process-wide mutable globals a naive port would use: the
//! registry and the response cache are constructed once at startup and
//! injected into handlers through axum's `State` extractor.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use ibancheck_lib::loaders::{load_bundesbank, load_csv, CsvFormat};
use ibancheck_lib::{BankDataRepository, InMemoryBankData, Result as LibResult};

use crate::cache::ResponseCache;

/// Delimited national exports loaded alongside the Bundesbank file. The
/// file names match what the download tooling produces in the data
/// directory.
const CSV_REGISTRIES: &[(&str, &str)] = &[
    ("at.csv", "AT"),
    ("nbb.csv", "BE"),
    ("lu.csv", "LU"),
    ("nl.csv", "NL"),
    ("ch.csv", "CH"),
];

/// Cheaply cloneable bundle of the injected dependencies.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repo: Arc<dyn BankDataRepository>,
    cache: ResponseCache,
}

impl AppState {
    /// Build state from pre-constructed components. Used by tests to inject
    /// doubles.
    pub fn from_components(repo: Arc<dyn BankDataRepository>, cache: ResponseCache) -> Self {
        Self {
            inner: Arc::new(AppStateInner { repo, cache }),
        }
    }

    /// Load the bank registry from `data_dir` and build fresh state.
    ///
    /// Missing registry files are logged and skipped so the service can run
    /// without enrichment data; a present-but-corrupt file is an error.
    pub fn load(data_dir: impl AsRef<Path>) -> LibResult<Self> {
        let data_dir = data_dir.as_ref();
        let repo = InMemoryBankData::new();

        let bundesbank = data_dir.join("bundesbank.txt");
        if bundesbank.exists() {
            let records = load_bundesbank(&bundesbank, &repo)?;
            info!(path = %bundesbank.display(), records, "loaded German bank registry");
        } else {
            warn!(path = %bundesbank.display(), "registry file missing, skipping");
        }

        for &(file, country) in CSV_REGISTRIES {
            let path = data_dir.join(file);
            if path.exists() {
                let records = load_csv(&path, country, CsvFormat::national_export(), &repo)?;
                info!(path = %path.display(), country, records, "loaded bank registry");
            } else {
                warn!(path = %path.display(), country, "registry file missing, skipping");
            }
        }

        info!(records = repo.len(), "bank registry ready");
        Ok(Self::from_components(Arc::new(repo), ResponseCache::new()))
    }

    /// The injected bank registry.
    pub fn repo(&self) -> &dyn BankDataRepository {
        self.inner.repo.as_ref()
    }

    /// The shared response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry_records", &self.inner.repo.len())
            .field("cached_responses", &self.inner.cache.len())
            .finish()
    }
}
