//! HTTP service for IBAN validation with response caching.
//!
//! This crate wires the `ibancheck-lib` collaborators into a small axum
//! daemon:
//!
//! - [`cache`]: time-bounded response cache with lazy expiry
//! - [`pipeline`]: the ordered parse → validate → enrich stages
//! - [`handler`]: the `/validate/{iban}` route
//! - [`pidfile`]: singleton process guard
//! - [`server`]: listener startup and graceful shutdown
//! - [`state`]: dependency-injected application state
//!
//! The handlers stay thin: all validation logic lives in `ibancheck-lib`,
//! and everything the handler needs arrives through [`state::AppState`]
//! rather than process-wide globals.

pub mod cache;
pub mod handler;
pub mod logging;
pub mod pidfile;
pub mod pipeline;
pub mod server;
pub mod state;

pub use cache::ResponseCache;
pub use pidfile::{acquire, PidFileError};
pub use pipeline::{PipelineOutcome, ValidationRequest};
pub use server::{build_router, listen_addr, run};
pub use state::AppState;
