//! FHIR R4 resource payloads written by the service.
//!
//! Only the fields the service sets are modelled. Constructors take `now`
//! explicitly so payloads are deterministic under test.

use chrono::{DateTime, SecondsFormat, Utc};
use epds_core::score::ScoreResult;
use serde::Serialize;

// ─── Datatypes ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coding {
  pub system:  String,
  pub code:    String,
  pub display: String,
}

impl Coding {
  fn new(system: &str, code: &str, display: &str) -> Self {
    Self {
      system:  system.to_string(),
      code:    code.to_string(),
      display: display.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeableConcept {
  pub coding: Vec<Coding>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
  pub reference: String,
}

impl Reference {
  pub fn patient(id: &str) -> Self {
    Self { reference: format!("Patient/{id}") }
  }

  pub fn encounter(id: &str) -> Self {
    Self { reference: format!("Encounter/{id}") }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
  pub tag: Vec<Coding>,
}

fn timestamp(now: DateTime<Utc>) -> String {
  now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// The EPDS total score, the primary record of a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
  pub resource_type:       &'static str,
  pub status:              &'static str,
  pub category:            Vec<CodeableConcept>,
  pub code:                CodeableConcept,
  pub subject:             Reference,
  pub effective_date_time: String,
  pub value_integer:       u8,
}

impl Observation {
  pub fn epds_total(
    patient_id: &str,
    score: &ScoreResult,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      resource_type:       "Observation",
      status:              "final",
      category:            vec![CodeableConcept {
        coding: vec![Coding::new(
          "http://terminology.hl7.org/CodeSystem/observation-category",
          "survey",
          "Survey",
        )],
        text:   None,
      }],
      code:                CodeableConcept {
        coding: vec![Coding::new(
          "http://loinc.org",
          "99046-5",
          "Total score [EPDS]",
        )],
        text:   Some("EPDS Total Score".to_string()),
      },
      subject:             Reference::patient(patient_id),
      effective_date_time: timestamp(now),
      value_integer:       score.total,
    }
  }
}

// ─── Flag ────────────────────────────────────────────────────────────────────

/// High-risk banner shown against the patient (and the visit, when known).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
  pub resource_type: &'static str,
  pub status:        &'static str,
  pub category:      Vec<CodeableConcept>,
  pub code:          CodeableConcept,
  pub subject:       Reference,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub encounter:     Option<Reference>,
  pub meta:          Meta,
}

impl Flag {
  pub fn epds_high_risk(
    patient_id: &str,
    encounter_id: Option<&str>,
    score: &ScoreResult,
  ) -> Self {
    Self {
      resource_type: "Flag",
      status:        "active",
      category:      vec![CodeableConcept {
        coding: vec![Coding::new(
          "http://example.org/codes",
          "epds-high-risk",
          "EPDS High Risk Alert",
        )],
        text:   Some("High EPDS Score or Self-Harm Risk Reported".to_string()),
      }],
      code:          CodeableConcept {
        coding: Vec::new(),
        text:   Some(format!(
          "High EPDS Score ({}) or Q10 Risk ({}) indicated.",
          score.total, score.q10
        )),
      },
      subject:       Reference::patient(patient_id),
      encounter:     encounter_id.map(Reference::encounter),
      meta:          Meta {
        tag: vec![Coding::new(
          "urn:cornell:epds:tags",
          "epds-high-risk",
          "EPDS High Risk Indicator",
        )],
      },
    }
  }
}

// ─── Communication ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
  pub content_string: String,
}

/// Alert message to the responsible provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
  pub resource_type: &'static str,
  pub status:        &'static str,
  pub category:      Vec<CodeableConcept>,
  pub subject:       Reference,
  pub recipient:     Vec<Reference>,
  pub payload:       Vec<Payload>,
  pub sent:          String,
}

impl Communication {
  /// `recipient` is a full reference, e.g. `Practitioner/123`.
  pub fn epds_alert(
    patient_id: &str,
    recipient: &str,
    score: &ScoreResult,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      resource_type: "Communication",
      status:        "completed",
      category:      vec![CodeableConcept {
        coding: vec![Coding::new(
          "http://terminology.hl7.org/CodeSystem/communication-category",
          "alert",
          "Alert",
        )],
        text:   None,
      }],
      subject:       Reference::patient(patient_id),
      recipient:     vec![Reference { reference: recipient.to_string() }],
      payload:       vec![Payload {
        content_string: format!(
          "Alert: High EPDS score ({}) recorded for Patient {}. Q10 Score: {}. \
           Please review patient chart.",
          score.total, patient_id, score.q10
        ),
      }],
      sent:          timestamp(now),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use epds_core::score::Risk;
  use serde_json::json;

  use super::*;

  fn high() -> ScoreResult {
    ScoreResult { total: 14, q10: 1, risk: Risk::High }
  }

  fn noon() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() }

  #[test]
  fn observation_shape() {
    let value = serde_json::to_value(Observation::epds_total("p1", &high(), noon())).unwrap();
    assert_eq!(value["resourceType"], "Observation");
    assert_eq!(value["status"], "final");
    assert_eq!(value["code"]["coding"][0]["code"], "99046-5");
    assert_eq!(value["subject"], json!({ "reference": "Patient/p1" }));
    assert_eq!(value["effectiveDateTime"], "2025-03-01T12:00:00Z");
    assert_eq!(value["valueInteger"], 14);
    assert!(value["category"][0].get("text").is_none());
  }

  #[test]
  fn flag_with_encounter() {
    let value = serde_json::to_value(Flag::epds_high_risk("p1", Some("e7"), &high())).unwrap();
    assert_eq!(value["encounter"], json!({ "reference": "Encounter/e7" }));
    assert_eq!(value["code"]["text"], "High EPDS Score (14) or Q10 Risk (1) indicated.");
    assert_eq!(value["code"]["coding"], json!([]));
    assert_eq!(value["meta"]["tag"][0]["system"], "urn:cornell:epds:tags");
  }

  #[test]
  fn flag_without_encounter_is_patient_scoped() {
    let value = serde_json::to_value(Flag::epds_high_risk("p1", None, &high())).unwrap();
    assert!(value.get("encounter").is_none());
    assert_eq!(value["subject"]["reference"], "Patient/p1");
  }

  #[test]
  fn communication_shape() {
    let value = serde_json::to_value(Communication::epds_alert(
      "p1",
      "Practitioner/dr-9",
      &high(),
      noon(),
    ))
    .unwrap();
    assert_eq!(value["recipient"], json!([{ "reference": "Practitioner/dr-9" }]));
    assert_eq!(value["category"][0]["coding"][0]["code"], "alert");
    assert_eq!(
      value["payload"][0]["contentString"],
      "Alert: High EPDS score (14) recorded for Patient p1. Q10 Score: 1. Please review patient chart."
    );
    assert_eq!(value["sent"], "2025-03-01T12:00:00Z");
  }
}
