//! Submission: one validated questionnaire plus whatever identifying
//! information the caller supplied.

use crate::{
  error::{Error, Result},
  score::{Answers, QUESTION_COUNT},
};

/// An `(system, value)` pair identifying a patient in some external system,
/// e.g. a medical record number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientIdentifier {
  pub system: String,
  pub value:  String,
}

/// How the caller identified the patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientRef {
  /// A FHIR `Patient` id, used as-is.
  Id(String),
  /// Needs a remote lookup before any write.
  Identifier(PatientIdentifier),
}

/// Raw, unvalidated field values as they arrived on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSubmission<'a> {
  pub patient_id:                Option<&'a str>,
  pub patient_identifier_system: Option<&'a str>,
  pub patient_identifier_value:  Option<&'a str>,
  pub encounter_id:              Option<&'a str>,
  pub appointment_id:            Option<&'a str>,
  pub answers:                   [Option<&'a str>; QUESTION_COUNT],
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
  pub patient:        PatientRef,
  pub encounter_id:   Option<String>,
  pub appointment_id: Option<String>,
  pub answers:        Answers,
}

impl Submission {
  /// Validate a raw submission.
  ///
  /// Answers are checked first, then the patient reference. A direct
  /// `patientId` wins over an identifier pair; the pair is only usable when
  /// both halves are present. Identifier fields are whitespace-trimmed and
  /// empty values count as absent.
  pub fn parse(raw: RawSubmission<'_>) -> Result<Self> {
    let answers = Answers::parse(raw.answers)?;

    let patient = match (
      present(raw.patient_id),
      present(raw.patient_identifier_system),
      present(raw.patient_identifier_value),
    ) {
      (Some(id), _, _) => PatientRef::Id(id.to_owned()),
      (None, Some(system), Some(value)) => {
        PatientRef::Identifier(PatientIdentifier {
          system: system.to_owned(),
          value:  value.to_owned(),
        })
      }
      _ => return Err(Error::MissingPatient),
    };

    Ok(Self {
      patient,
      encounter_id: present(raw.encounter_id).map(str::to_owned),
      appointment_id: present(raw.appointment_id).map(str::to_owned),
      answers,
    })
  }
}

fn present(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|s| !s.is_empty())
}
