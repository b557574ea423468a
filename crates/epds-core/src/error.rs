//! Error types for `epds-core`.

use thiserror::Error;

/// A submission failed validation. The display text is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Invalid input: {0} is required")]
  MissingAnswer(&'static str),

  #[error("Invalid input: {0} must be an integer")]
  NotAnInteger(&'static str),

  #[error("Invalid input: {0} score must be between 0 and 3")]
  OutOfRange(&'static str),

  #[error(
    "provide patientId OR patientIdentifierSystem+patientIdentifierValue"
  )]
  MissingPatient,
}

impl Error {
  /// The form field the error refers to, if any.
  pub fn field(&self) -> Option<&'static str> {
    match self {
      Error::MissingAnswer(f) | Error::NotAnInteger(f) | Error::OutOfRange(f) => {
        Some(f)
      }
      Error::MissingPatient => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
