//! Error type for `epds-fhir`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// A search returned an empty bundle.
  #[error("not found: {0}")]
  NotFound(String),

  /// The remote answered with a success status but an unusable payload.
  #[error("malformed {context}: {reason}")]
  Malformed { context: String, reason: String },

  /// The clinical store answered with an unexpected status.
  #[error("{operation} failed with status {status}: {body}")]
  Upstream {
    operation: String,
    status:    u16,
    body:      String,
  },

  /// The identity service refused the client-credentials exchange.
  #[error("auth request failed with status {status}: {message}")]
  Auth { status: u16, message: String },
}

impl Error {
  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }

  pub(crate) fn malformed(
    context: impl Into<String>,
    reason: impl ToString,
  ) -> Self {
    Self::Malformed {
      context: context.into(),
      reason:  reason.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
