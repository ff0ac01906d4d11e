//! The `/validate/{iban}` request handler.
//!
//! Thin by design: derive the cache key, consult the cache, and on a miss
//! run the pipeline and store the cacheable outcome. Everything the handler
//! touches arrives through [`AppState`]; the cache is the only shared
//! mutable state.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::pipeline::{self, ValidationRequest};
use crate::state::AppState;

/// Flag values recognized as true. Anything else, including malformed
/// values, is false rather than an error, to keep existing callers working.
pub fn truthy_flag(value: &str) -> bool {
    matches!(value, "1" | "true")
}

/// GET /validate/{iban}
pub async fn validate(
    State(state): State<AppState>,
    Path(iban): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle(state, iban, &params)
}

/// GET /validate and /validate/ — the empty-identifier case.
pub async fn validate_empty(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle(state, String::new(), &params)
}

fn handle(state: AppState, iban: String, params: &HashMap<String, String>) -> Response {
    let flag = |name: &str| params.get(name).map(|v| truthy_flag(v)).unwrap_or(false);
    let request = ValidationRequest::new(iban, flag("validateBankCode"), flag("getBIC"));

    let key = request.cache_key();
    if let Some((body, status)) = state.cache().get(&key) {
        debug!(iban = %request.iban, "serving validation result from cache");
        return respond(status, body);
    }

    let outcome = pipeline::run(&request, state.repo());
    if outcome.cacheable {
        state
            .cache()
            .set(&key, outcome.body.clone(), outcome.status, None);
    }
    respond(outcome.status, outcome.body)
}

fn respond(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}
