//! IBAN structural parsing and ISO 7064 mod-97 checksum validation.
//!
//! The structural pre-check ([`parse_outcome`]) and the parsed form
//! ([`Iban`]) are deliberately separate: the service first asks "does this
//! even look like an IBAN?" and only then decomposes and checksums it.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::result::ValidationResult;

/// Per-country format rules.
///
/// `bank_code` is the byte range of the national bank code within the BBAN
/// (the part after country code and check digits). Only registry-backed
/// countries carry one.
#[derive(Debug, Clone, Copy)]
struct CountrySpec {
    length: usize,
    bank_code: Option<(usize, usize)>,
}

static COUNTRIES: Lazy<HashMap<&'static str, CountrySpec>> = Lazy::new(|| {
    let mut m = HashMap::new();
    let mut insert = |code, length, bank_code| {
        m.insert(code, CountrySpec { length, bank_code });
    };
    insert("AT", 20, Some((0, 5)));
    insert("BE", 16, Some((0, 3)));
    insert("BG", 22, None);
    insert("CH", 21, Some((0, 5)));
    insert("CY", 28, None);
    insert("CZ", 24, None);
    insert("DE", 22, Some((0, 8)));
    insert("DK", 18, None);
    insert("EE", 20, None);
    insert("ES", 24, None);
    insert("FI", 18, None);
    insert("FR", 27, None);
    insert("GB", 22, None);
    insert("GR", 27, None);
    insert("HR", 21, None);
    insert("HU", 28, None);
    insert("IE", 22, None);
    insert("IT", 27, None);
    insert("LI", 21, None);
    insert("LT", 20, None);
    insert("LU", 20, Some((0, 3)));
    insert("LV", 21, None);
    insert("MT", 31, None);
    insert("NL", 18, Some((0, 4)));
    insert("NO", 15, None);
    insert("PL", 28, None);
    insert("PT", 25, None);
    insert("RO", 24, None);
    insert("SE", 24, None);
    insert("SI", 19, None);
    insert("SK", 24, None);
    m
});

/// Verdict of the structural pre-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub valid: bool,
    pub message: String,
}

impl ParseOutcome {
    fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Strip spaces and uppercase. Callers may submit IBANs in the
/// human-readable grouped form ("DE89 3704 ...").
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Structural pre-check: charset, country code, check-digit digits, and
/// country-specific length. Does not run the checksum.
pub fn parse_outcome(raw: &str) -> ParseOutcome {
    let normalized = normalize(raw);

    if normalized.len() < 5 {
        return ParseOutcome::fail("too short");
    }
    if let Some(c) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return ParseOutcome::fail(format!("invalid character '{}'", c));
    }

    let country = &normalized[0..2];
    if !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return ParseOutcome::fail(format!("invalid country code {}", country));
    }
    let spec = match COUNTRIES.get(country) {
        Some(spec) => spec,
        None => return ParseOutcome::fail(format!("unknown country code {}", country)),
    };

    if !normalized[2..4].chars().all(|c| c.is_ascii_digit()) {
        return ParseOutcome::fail(format!("invalid check digits {}", &normalized[2..4]));
    }
    if normalized.len() != spec.length {
        return ParseOutcome::fail(format!(
            "invalid length for {}: expected {}, got {}",
            country,
            spec.length,
            normalized.len()
        ));
    }

    ParseOutcome::ok()
}

/// A structurally valid IBAN, decomposed into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iban {
    raw: String,
    country_code: String,
    check_digits: String,
    bban: String,
}

impl Iban {
    /// Parse an identifier into its parts.
    ///
    /// Fails with [`Error::Unparseable`] when the structural pre-check
    /// rejects the input; the message matches [`parse_outcome`].
    pub fn parse(raw: &str) -> Result<Self> {
        let outcome = parse_outcome(raw);
        if !outcome.valid {
            return Err(Error::Unparseable {
                message: outcome.message,
            });
        }

        let normalized = normalize(raw);
        Ok(Self {
            country_code: normalized[0..2].to_string(),
            check_digits: normalized[2..4].to_string(),
            bban: normalized[4..].to_string(),
            raw: normalized,
        })
    }

    /// The normalized identifier (uppercase, no spaces).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Two-letter ISO country code.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// National bank code, for countries whose format defines one.
    pub fn bank_code(&self) -> Option<&str> {
        let (start, end) = COUNTRIES.get(self.country_code.as_str())?.bank_code?;
        self.bban.get(start..end)
    }

    /// Run the ISO 7064 mod-97-10 checksum and produce the base verdict.
    pub fn validate(&self) -> ValidationResult {
        if self.mod97() == 1 {
            ValidationResult::new(true, "", &self.raw)
        } else {
            ValidationResult::new(false, "Checksum validation failed", &self.raw)
        }
    }

    /// Streaming mod-97 over the rearranged identifier (BBAN + country +
    /// check digits), letters expanded to their two-digit values.
    fn mod97(&self) -> u32 {
        let rearranged = self
            .bban
            .chars()
            .chain(self.country_code.chars())
            .chain(self.check_digits.chars());

        let mut rem: u32 = 0;
        for c in rearranged {
            if c.is_ascii_digit() {
                rem = (rem * 10 + (c as u32 - '0' as u32)) % 97;
            } else {
                let value = c as u32 - 'A' as u32 + 10;
                rem = (rem * 100 + value) % 97;
            }
        }
        rem
    }
}
