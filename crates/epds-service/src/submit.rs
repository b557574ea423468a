//! Handler for `POST /api/v1/submit-epds` and the submission workflow behind
//! it.
//!
//! | Step | Failure |
//! |------|---------|
//! | Validate form, score answers | 400 |
//! | Obtain access token | 500 |
//! | Resolve patient (direct id or identifier search) | 400 |
//! | Create score Observation | 500 |
//! | High risk only: resolve encounter, create Flag, create Communication | logged only |

use axum::{
  Json,
  extract::{Form, State, rejection::FormRejection},
};
use epds_core::{
  score::{self, QUESTION_COUNT, QUESTION_FIELDS, ScoreResult},
  store::{AccessToken, ClinicalStore, TokenSource},
  submission::{PatientRef, RawSubmission, Submission},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, encounter, error::ApiError};

// ─── Wire types ──────────────────────────────────────────────────────────────

/// Form fields accepted by `POST /api/v1/submit-epds`.
#[derive(Debug, Default)]
pub struct SubmissionForm {
  pub patient_id:                Option<String>,
  pub patient_identifier_system: Option<String>,
  pub patient_identifier_value:  Option<String>,
  pub encounter_id:              Option<String>,
  pub appointment_id:            Option<String>,
  pub answers:                   [Option<String>; QUESTION_COUNT],
}

impl SubmissionForm {
  /// Collect decoded `key=value` pairs. Unknown keys are ignored and the
  /// first value of a repeated key wins.
  pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
    let mut form = Self::default();
    for (key, value) in pairs {
      let slot = match key.as_str() {
        "patientId" => &mut form.patient_id,
        "patientIdentifierSystem" => &mut form.patient_identifier_system,
        "patientIdentifierValue" => &mut form.patient_identifier_value,
        "encounterId" => &mut form.encounter_id,
        "appointmentId" => &mut form.appointment_id,
        other => match QUESTION_FIELDS.iter().position(|f| *f == other) {
          Some(i) => &mut form.answers[i],
          None => continue,
        },
      };
      if slot.is_none() {
        *slot = Some(value);
      }
    }
    form
  }

  fn raw(&self) -> RawSubmission<'_> {
    RawSubmission {
      patient_id:                self.patient_id.as_deref(),
      patient_identifier_system: self.patient_identifier_system.as_deref(),
      patient_identifier_value:  self.patient_identifier_value.as_deref(),
      encounter_id:              self.encounter_id.as_deref(),
      appointment_id:            self.appointment_id.as_deref(),
      answers:                   self.answers.each_ref().map(|a| a.as_deref()),
    }
  }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
  pub status:           String,
  pub observation_id:   String,
  pub calculated_score: u8,
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /api/v1/submit-epds`, form-encoded. Returns the Observation id and
/// the total score.
pub async fn handler<T, S>(
  State(state): State<AppState<T, S>>,
  form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Json<SubmissionResponse>, ApiError>
where
  T: TokenSource + 'static,
  S: ClinicalStore + 'static,
{
  let pairs = match form {
    Ok(Form(pairs)) => pairs,
    // A body of any other media type carries no form fields.
    Err(FormRejection::InvalidFormContentType(e)) => {
      tracing::warn!(error = %e, "request body is not form-encoded");
      Vec::new()
    }
    Err(e) => {
      tracing::error!(error = %e, "failed to parse form data");
      return Err(ApiError::MalformedBody);
    }
  };
  let form = SubmissionForm::from_pairs(pairs);

  let submission = Submission::parse(form.raw()).map_err(|e| {
    tracing::error!(error = %e, "validation failed");
    ApiError::from(e)
  })?;

  let receipt = process(
    state.tokens.as_ref(),
    state.store.as_ref(),
    &state.config.alert_provider_id,
    &submission,
  )
  .await?;

  Ok(Json(SubmissionResponse {
    status:           "success".to_string(),
    observation_id:   receipt.observation_id,
    calculated_score: receipt.score.total,
  }))
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// What the caller is told about a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
  pub patient_id:     String,
  pub observation_id: String,
  pub score:          ScoreResult,
}

/// Score, authenticate, resolve the patient, write the Observation and, for
/// high-risk results, attempt the alert records.
pub async fn process<T, S>(
  tokens: &T,
  store: &S,
  alert_recipient: &str,
  submission: &Submission,
) -> Result<Receipt, ApiError>
where
  T: TokenSource,
  S: ClinicalStore,
{
  let score = score::score(&submission.answers);
  tracing::info!(
    total = score.total,
    q10 = score.q10,
    risk = ?score.risk,
    "calculated EPDS score"
  );

  let token = tokens.access_token().await.map_err(|e| {
    tracing::error!(error = %e, "failed to obtain access token");
    ApiError::Auth(Box::new(e))
  })?;

  let patient_id = match &submission.patient {
    PatientRef::Id(id) => id.clone(),
    PatientRef::Identifier(identifier) => store
      .find_patient_by_identifier(&token, identifier)
      .await
      .map_err(|e| {
        tracing::error!(
          system = %identifier.system,
          value = %identifier.value,
          error = %e,
          "patient lookup failed"
        );
        ApiError::PatientNotFound(Box::new(e))
      })?,
  };

  let observation_id = store
    .create_score_observation(&token, &patient_id, &score)
    .await
    .map_err(|e| {
      tracing::error!(%patient_id, error = %e, "failed to create Observation");
      ApiError::Upstream(Box::new(e))
    })?;

  if score.risk.is_high() {
    tracing::info!(
      %patient_id,
      total = score.total,
      q10 = score.q10,
      "high risk detected, raising alerts"
    );
    let plan = encounter::strategies(submission);
    let encounter_id =
      encounter::resolve(store, &token, &patient_id, &plan).await;
    raise_alerts(
      store,
      &token,
      &patient_id,
      encounter_id.as_deref(),
      alert_recipient,
      &score,
    )
    .await
    .log(&patient_id);
  }

  tracing::info!(%patient_id, %observation_id, "processed EPDS submission");
  Ok(Receipt {
    patient_id,
    observation_id,
    score,
  })
}

// ─── Best-effort alerts ──────────────────────────────────────────────────────

/// Results of the two alert writes. Only ever logged.
#[derive(Debug)]
pub struct AlertOutcome<E> {
  pub encounter_id:  Option<String>,
  pub flag:          Result<String, E>,
  pub communication: Result<String, E>,
}

impl<E: std::fmt::Display> AlertOutcome<E> {
  fn log(&self, patient_id: &str) {
    match &self.flag {
      Ok(flag_id) if self.encounter_id.is_none() => tracing::warn!(
        %patient_id,
        %flag_id,
        "created patient-scoped Flag; no encounter found"
      ),
      Ok(flag_id) => tracing::info!(
        %patient_id,
        %flag_id,
        encounter_id = ?self.encounter_id,
        "created Flag"
      ),
      Err(e) => tracing::error!(
        %patient_id,
        encounter_id = ?self.encounter_id,
        error = %e,
        "failed to create Flag"
      ),
    }
    match &self.communication {
      Ok(communication_id) => {
        tracing::info!(%patient_id, %communication_id, "created Communication")
      }
      Err(e) => tracing::error!(
        %patient_id,
        error = %e,
        "failed to create Communication"
      ),
    }
  }
}

/// Create the Flag, then the Communication. Each runs regardless of the
/// other's outcome.
async fn raise_alerts<S: ClinicalStore>(
  store: &S,
  token: &AccessToken,
  patient_id: &str,
  encounter_id: Option<&str>,
  recipient: &str,
  score: &ScoreResult,
) -> AlertOutcome<S::Error> {
  let flag = store
    .create_risk_flag(token, patient_id, encounter_id, score)
    .await;
  let communication = store
    .create_alert_communication(token, patient_id, recipient, score)
    .await;
  AlertOutcome {
    encounter_id: encounter_id.map(str::to_owned),
    flag,
    communication,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn first_value_of_a_repeated_key_wins() {
    let form = SubmissionForm::from_pairs(pairs(&[
      ("q1", "2"),
      ("patientId", "pat-1"),
      ("q1", "3"),
      ("patientId", "pat-2"),
    ]));
    assert_eq!(form.answers[0].as_deref(), Some("2"));
    assert_eq!(form.patient_id.as_deref(), Some("pat-1"));
  }

  #[test]
  fn unknown_keys_are_ignored() {
    let form = SubmissionForm::from_pairs(pairs(&[("q11", "3"), ("note", "x"), ("q10", "1")]));
    assert_eq!(form.answers[9].as_deref(), Some("1"));
    assert!(form.answers[..9].iter().all(Option::is_none));
    assert_eq!(form.patient_id, None);
  }
}
