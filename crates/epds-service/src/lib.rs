//! HTTP surface for EPDS questionnaire submissions.
//!
//! Exposes an axum [`Router`] backed by any [`TokenSource`] and
//! [`ClinicalStore`]. The production binary wires in the FHIR
//! implementations from `epds-fhir`.

pub mod config;
pub mod encounter;
pub mod error;
pub mod submit;

pub use config::ServiceConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use epds_core::store::{ClinicalStore, TokenSource};
use serde_json::{Value, json};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<T, S> {
  pub tokens: Arc<T>,
  pub store:  Arc<S>,
  pub config: Arc<ServiceConfig>,
}

// Manual impl: `T` and `S` need not be `Clone` themselves.
impl<T, S> Clone for AppState<T, S> {
  fn clone(&self) -> Self {
    Self {
      tokens: self.tokens.clone(),
      store:  self.store.clone(),
      config: self.config.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the service.
pub fn router<T, S>(state: AppState<T, S>) -> Router
where
  T: TokenSource + 'static,
  S: ClinicalStore + 'static,
{
  Router::new()
    .route("/api/v1/submit-epds", post(submit::handler::<T, S>))
    .route("/health", get(health))
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
