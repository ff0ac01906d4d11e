//! Core library for IBAN validation and bank registry lookups.
//!
//! This crate provides the building blocks the `ibancheck-service` HTTP
//! daemon composes into its validation pipeline:
//!
//! - [`parse_outcome`]: cheap structural pre-check (charset, country, length)
//! - [`Iban`]: parsed identifier with ISO 7064 mod-97 checksum validation
//! - [`ValidationResult`]: the JSON verdict returned to callers
//! - [`BankDataRepository`]: read-only bank registry seam with an in-memory
//!   implementation populated by the [`loaders`] module
//! - [`validate_bank_code`] / [`resolve_bic`]: optional enrichment steps
//!
//! The service treats everything here as injected collaborators; nothing in
//! this crate touches the network or shared mutable state beyond the
//! registry's interior lock.

mod enrich;
mod error;
mod iban;
pub mod loaders;
mod registry;
mod result;

pub use enrich::{resolve_bic, validate_bank_code};
pub use error::{Error, Result};
pub use iban::{parse_outcome, Iban, ParseOutcome};
pub use registry::{BankDataRepository, BankRecord, InMemoryBankData};
pub use result::ValidationResult;
