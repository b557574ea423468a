//! The `TokenSource` and `ClinicalStore` traits.
//!
//! Both are implemented by the FHIR backend (`epds-fhir`). The request
//! orchestrator in `epds-service` depends on these abstractions, not on any
//! concrete client, so tests can substitute in-memory fakes.

use std::{fmt, future::Future};

use crate::{score::ScoreResult, submission::PatientIdentifier};

// ─── Credential ──────────────────────────────────────────────────────────────

/// An opaque bearer credential for the clinical store.
///
/// `Debug` is redacted so the token never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for AccessToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("AccessToken(<redacted>)")
  }
}

/// Something that can hand out a currently-valid [`AccessToken`].
pub trait TokenSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return a token with at least the implementation's lead time remaining,
  /// fetching a fresh one if necessary.
  fn access_token(
    &self,
  ) -> impl Future<Output = Result<AccessToken, Self::Error>> + Send + '_;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The remote clinical-records store.
///
/// Searches return the id of the first hit only; callers never see the rest
/// of the result set. Creates return the id the store assigned.
pub trait ClinicalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Resolution ────────────────────────────────────────────────────────

  /// Resolve an identifier pair to a patient id.
  fn find_patient_by_identifier<'a>(
    &'a self,
    token: &'a AccessToken,
    identifier: &'a PatientIdentifier,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Most recent encounter linked to an appointment.
  fn find_encounter_by_appointment<'a>(
    &'a self,
    token: &'a AccessToken,
    appointment_id: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Most recent encounter for the patient whose status is arrived or
  /// in-progress.
  fn find_active_encounter<'a>(
    &'a self,
    token: &'a AccessToken,
    patient_id: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Record the total score against the patient. This is the primary record.
  fn create_score_observation<'a>(
    &'a self,
    token: &'a AccessToken,
    patient_id: &'a str,
    score: &'a ScoreResult,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Raise a high-risk flag. Scoped to the encounter when one is given,
  /// otherwise to the patient alone.
  fn create_risk_flag<'a>(
    &'a self,
    token: &'a AccessToken,
    patient_id: &'a str,
    encounter_id: Option<&'a str>,
    score: &'a ScoreResult,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Notify a provider about a high-risk result.
  fn create_alert_communication<'a>(
    &'a self,
    token: &'a AccessToken,
    patient_id: &'a str,
    recipient: &'a str,
    score: &'a ScoreResult,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
