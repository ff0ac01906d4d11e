//! Registry file loaders.
//!
//! Two formats cover the national files the service ships with:
//!
//! - [`load_bundesbank`]: the German Bundesbank fixed-width `.txt` export
//! - [`load_csv`]: delimited exports (Austria and others), described by a
//!   [`CsvFormat`]
//!
//! Loaders append into any [`InMemoryBankData`] and return the number of
//! records stored, so startup can report per-file counts.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::{BankRecord, InMemoryBankData};

// Field offsets (in characters) of the Bundesbank fixed-width format.
const BLZ: (usize, usize) = (0, 8);
const MERKMAL: usize = 8;
const NAME: (usize, usize) = (9, 67);
const BIC: (usize, usize) = (139, 150);

/// Load the German Bundesbank bank code file.
///
/// Only lead records (Merkmal `1`) are stored; branch duplicates of the
/// same bank code are skipped. The file is not UTF-8 (DIN 66003 umlaut
/// substitutions); it is decoded lossily and sliced by character offset.
pub fn load_bundesbank(path: impl AsRef<Path>, repo: &InMemoryBankData) -> Result<usize> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::RegistryFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = fs::read(path)?;
    let text = String::from_utf8_lossy(&raw);

    let mut stored = 0;
    for (index, line) in text.lines().enumerate() {
        // The export ends with an empty trailer line; tolerate blank lines
        // anywhere rather than failing the whole load on them.
        if line.trim().is_empty() {
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        if chars.len() < BIC.0 {
            return Err(Error::MalformedRecord {
                path: path.to_path_buf(),
                line: index + 1,
            });
        }
        if chars[MERKMAL] != '1' {
            continue;
        }

        let field = |range: (usize, usize)| -> String {
            chars[range.0..range.1.min(chars.len())]
                .iter()
                .collect::<String>()
                .trim()
                .to_string()
        };

        let bic = field(BIC);
        repo.store(BankRecord {
            country: "DE".to_string(),
            bank_code: field(BLZ),
            name: field(NAME),
            bic: (!bic.is_empty()).then_some(bic),
        });
        stored += 1;
    }

    debug!(path = %path.display(), records = stored, "loaded bundesbank registry");
    Ok(stored)
}

/// Column layout of a delimited registry export.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub has_headers: bool,
    /// Column index of the national bank code.
    pub bank_code: usize,
    /// Column index of the institution name.
    pub name: usize,
    /// Column index of the BIC, when the export has one.
    pub bic: Option<usize>,
}

impl CsvFormat {
    /// Layout shared by the semicolon-delimited national exports the
    /// service ships with (AT, BE, LU, NL, CH): bank code, institution
    /// name, BIC, with a header row.
    pub fn national_export() -> Self {
        Self {
            delimiter: b';',
            has_headers: true,
            bank_code: 0,
            name: 1,
            bic: Some(2),
        }
    }
}

/// Load a delimited national registry export for `country`.
///
/// Rows with an empty bank code column are skipped (separators and footer
/// rows in some exports).
pub fn load_csv(
    path: impl AsRef<Path>,
    country: &str,
    format: CsvFormat,
    repo: &InMemoryBankData,
) -> Result<usize> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::RegistryFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_headers)
        .flexible(true)
        .from_path(path)?;

    let mut stored = 0;
    for record in reader.records() {
        let record = record?;
        let bank_code = record.get(format.bank_code).unwrap_or("").trim();
        if bank_code.is_empty() {
            continue;
        }

        let name = record.get(format.name).unwrap_or("").trim().to_string();
        let bic = format
            .bic
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        repo.store(BankRecord {
            country: country.to_string(),
            bank_code: bank_code.to_string(),
            name,
            bic,
        });
        stored += 1;
    }

    debug!(path = %path.display(), country, records = stored, "loaded csv registry");
    Ok(stored)
}
