//! Record writes: the score Observation, the high-risk Flag and the provider
//! Communication.

use chrono::Utc;
use epds_core::{score::ScoreResult, store::AccessToken};

use crate::{
  client::FhirClient,
  error::Result,
  resources::{Communication, Flag, Observation},
};

impl FhirClient {
  pub async fn create_observation(
    &self,
    token: &AccessToken,
    patient_id: &str,
    score: &ScoreResult,
  ) -> Result<String> {
    let observation = Observation::epds_total(patient_id, score, Utc::now());
    let id = self.create(token, "Observation", &observation).await?;
    tracing::info!(%patient_id, observation_id = %id, "created Observation");
    Ok(id)
  }

  pub async fn create_flag(
    &self,
    token: &AccessToken,
    patient_id: &str,
    encounter_id: Option<&str>,
    score: &ScoreResult,
  ) -> Result<String> {
    let flag = Flag::epds_high_risk(patient_id, encounter_id, score);
    let id = self.create(token, "Flag", &flag).await?;
    tracing::info!(%patient_id, ?encounter_id, flag_id = %id, "created Flag");
    Ok(id)
  }

  pub async fn create_communication(
    &self,
    token: &AccessToken,
    patient_id: &str,
    recipient: &str,
    score: &ScoreResult,
  ) -> Result<String> {
    let communication =
      Communication::epds_alert(patient_id, recipient, score, Utc::now());
    let id = self.create(token, "Communication", &communication).await?;
    tracing::info!(%patient_id, communication_id = %id, "created Communication");
    Ok(id)
  }
}
