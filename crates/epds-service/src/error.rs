//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Display text is what the caller sees. Upstream detail stays in the
//! `#[source]` chain and only reaches the logs.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A terminal failure of a submission.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  InvalidInput(#[from] epds_core::Error),

  #[error("Failed to parse request body")]
  MalformedBody,

  #[error("patient not found from identifier")]
  PatientNotFound(#[source] BoxError),

  #[error("Internal server error - authentication failed")]
  Auth(#[source] BoxError),

  #[error("Failed to create FHIR Observation")]
  Upstream(#[source] BoxError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::InvalidInput(_)
      | ApiError::MalformedBody
      | ApiError::PatientNotFound(_) => StatusCode::BAD_REQUEST,
      ApiError::Auth(_) | ApiError::Upstream(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({ "status": "error", "message": self.to_string() });
    (self.status(), Json(body)).into_response()
  }
}
