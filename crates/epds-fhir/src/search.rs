//! Patient and encounter resolution.

use epds_core::{store::AccessToken, submission::PatientIdentifier};

use crate::{client::FhirClient, error::Result};

/// Encounter statuses that count as an ongoing visit.
pub const ACTIVE_ENCOUNTER_STATUSES: &str = "arrived,in-progress";

impl FhirClient {
  /// `GET /Patient?identifier={system}|{value}`
  pub async fn patient_id_by_identifier(
    &self,
    token: &AccessToken,
    identifier: &PatientIdentifier,
  ) -> Result<String> {
    let criteria = format!("{}|{}", identifier.system, identifier.value);
    self
      .search_first(
        token,
        "Patient",
        &[("identifier", criteria.as_str())],
        format!("patient with identifier {criteria}"),
      )
      .await
  }

  /// `GET /Encounter?appointment=Appointment/{id}&_sort=-date&_count=1`
  pub async fn encounter_by_appointment(
    &self,
    token: &AccessToken,
    appointment_id: &str,
  ) -> Result<String> {
    let appointment = format!("Appointment/{appointment_id}");
    self
      .search_first(
        token,
        "Encounter",
        &[
          ("appointment", appointment.as_str()),
          ("_sort", "-date"),
          ("_count", "1"),
        ],
        format!("encounter for appointment {appointment_id}"),
      )
      .await
  }

  /// `GET /Encounter?subject=Patient/{id}&status=arrived,in-progress&_sort=-date&_count=1`
  pub async fn active_encounter(
    &self,
    token: &AccessToken,
    patient_id: &str,
  ) -> Result<String> {
    let subject = format!("Patient/{patient_id}");
    self
      .search_first(
        token,
        "Encounter",
        &[
          ("subject", subject.as_str()),
          ("status", ACTIVE_ENCOUNTER_STATUSES),
          ("_sort", "-date"),
          ("_count", "1"),
        ],
        format!("active encounter for patient {patient_id}"),
      )
      .await
  }
}
