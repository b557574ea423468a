//! [`ClinicalStore`] impl for [`FhirClient`].

use epds_core::{
  score::ScoreResult,
  store::{AccessToken, ClinicalStore},
  submission::PatientIdentifier,
};

use crate::{client::FhirClient, error::{Error, Result}};

impl ClinicalStore for FhirClient {
  type Error = Error;

  async fn find_patient_by_identifier(
    &self,
    token: &AccessToken,
    identifier: &PatientIdentifier,
  ) -> Result<String> {
    self.patient_id_by_identifier(token, identifier).await
  }

  async fn find_encounter_by_appointment(
    &self,
    token: &AccessToken,
    appointment_id: &str,
  ) -> Result<String> {
    self.encounter_by_appointment(token, appointment_id).await
  }

  async fn find_active_encounter(
    &self,
    token: &AccessToken,
    patient_id: &str,
  ) -> Result<String> {
    self.active_encounter(token, patient_id).await
  }

  async fn create_score_observation(
    &self,
    token: &AccessToken,
    patient_id: &str,
    score: &ScoreResult,
  ) -> Result<String> {
    self.create_observation(token, patient_id, score).await
  }

  async fn create_risk_flag(
    &self,
    token: &AccessToken,
    patient_id: &str,
    encounter_id: Option<&str>,
    score: &ScoreResult,
  ) -> Result<String> {
    self.create_flag(token, patient_id, encounter_id, score).await
  }

  async fn create_alert_communication(
    &self,
    token: &AccessToken,
    patient_id: &str,
    recipient: &str,
    score: &ScoreResult,
  ) -> Result<String> {
    self.create_communication(token, patient_id, recipient, score).await
  }
}
