//! Encounter discovery for high-risk flags.
//!
//! An explicit encounter id short-circuits everything. Otherwise the
//! appointment lookup (when an appointment id was given) is tried before the
//! active-encounter lookup for the patient. A failed strategy only moves the
//! cascade on; running out of strategies yields `None` and the flag is
//! written against the patient alone.

use epds_core::{
  store::{AccessToken, ClinicalStore},
  submission::Submission,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterStrategy {
  /// Supplied by the caller; no lookup.
  Explicit(String),
  /// Most recent encounter linked to the appointment.
  ByAppointment(String),
  /// Most recent arrived or in-progress encounter for the patient.
  ActiveForPatient,
}

/// The ordered strategies for a submission.
pub fn strategies(submission: &Submission) -> Vec<EncounterStrategy> {
  if let Some(id) = &submission.encounter_id {
    return vec![EncounterStrategy::Explicit(id.clone())];
  }
  let mut plan = Vec::with_capacity(2);
  if let Some(appointment_id) = &submission.appointment_id {
    plan.push(EncounterStrategy::ByAppointment(appointment_id.clone()));
  }
  plan.push(EncounterStrategy::ActiveForPatient);
  plan
}

/// Try each strategy in order and return the first encounter found.
pub async fn resolve<S: ClinicalStore>(
  store: &S,
  token: &AccessToken,
  patient_id: &str,
  strategies: &[EncounterStrategy],
) -> Option<String> {
  for strategy in strategies {
    let attempt = match strategy {
      EncounterStrategy::Explicit(id) => return Some(id.clone()),
      EncounterStrategy::ByAppointment(appointment_id) => {
        store.find_encounter_by_appointment(token, appointment_id).await
      }
      EncounterStrategy::ActiveForPatient => {
        store.find_active_encounter(token, patient_id).await
      }
    };

    match attempt {
      Ok(encounter_id) => {
        tracing::info!(%encounter_id, ?strategy, "resolved encounter");
        return Some(encounter_id);
      }
      Err(e) => {
        tracing::warn!(%patient_id, ?strategy, error = %e, "encounter lookup failed");
      }
    }
  }
  None
}
