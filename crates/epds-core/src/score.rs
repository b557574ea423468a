//! EPDS score engine.
//!
//! Ten answers, each scored 0-3, are summed into a total in `0..=30`. A
//! submission is high risk when the total reaches [`HIGH_RISK_TOTAL`] or when
//! the self-harm item (question 10) is answered with anything but zero.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of questions in the questionnaire.
pub const QUESTION_COUNT: usize = 10;

/// Highest score a single answer may carry.
pub const MAX_ANSWER: u8 = 3;

/// Totals at or above this value are high risk.
pub const HIGH_RISK_TOTAL: u8 = 13;

/// Form field names, in question order.
pub const QUESTION_FIELDS: [&str; QUESTION_COUNT] =
  ["q1", "q2", "q3", "q4", "q5", "q6", "q7", "q8", "q9", "q10"];

// ─── Answers ─────────────────────────────────────────────────────────────────

/// Ten validated answers, each in `0..=MAX_ANSWER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answers([u8; QUESTION_COUNT]);

impl Answers {
  /// Build from already-numeric answers, rejecting any out of range.
  pub fn new(values: [u8; QUESTION_COUNT]) -> Result<Self> {
    for (value, field) in values.iter().zip(QUESTION_FIELDS) {
      if *value > MAX_ANSWER {
        return Err(Error::OutOfRange(field));
      }
    }
    Ok(Self(values))
  }

  /// Parse the raw form values for `q1`..`q10`, in order.
  ///
  /// The first offending field is reported: missing (or empty), then
  /// non-integer, then out of range.
  pub fn parse(raw: [Option<&str>; QUESTION_COUNT]) -> Result<Self> {
    let mut values = [0u8; QUESTION_COUNT];
    for ((slot, raw), field) in values.iter_mut().zip(raw).zip(QUESTION_FIELDS) {
      *slot = parse_answer(field, raw)?;
    }
    Ok(Self(values))
  }

  pub fn values(&self) -> &[u8; QUESTION_COUNT] { &self.0 }

  /// The self-harm item.
  pub fn q10(&self) -> u8 { self.0[QUESTION_COUNT - 1] }
}

fn parse_answer(field: &'static str, raw: Option<&str>) -> Result<u8> {
  let raw = match raw {
    Some(s) if !s.is_empty() => s,
    _ => return Err(Error::MissingAnswer(field)),
  };
  let value: i64 = raw.parse().map_err(|_| Error::NotAnInteger(field))?;
  if !(0..=i64::from(MAX_ANSWER)).contains(&value) {
    return Err(Error::OutOfRange(field));
  }
  Ok(value as u8)
}

// ─── Result ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
  Low,
  High,
}

impl Risk {
  pub fn is_high(&self) -> bool { matches!(self, Self::High) }
}

/// Outcome of scoring one questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
  pub total: u8,
  pub q10:   u8,
  pub risk:  Risk,
}

/// Score a validated set of answers.
pub fn score(answers: &Answers) -> ScoreResult {
  let total: u8 = answers.values().iter().sum();
  let q10 = answers.q10();
  let risk = if total >= HIGH_RISK_TOTAL || q10 >= 1 {
    Risk::High
  } else {
    Risk::Low
  };
  ScoreResult { total, q10, risk }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn answers(values: [u8; QUESTION_COUNT]) -> Answers {
    Answers::new(values).unwrap()
  }

  fn raw(values: [&str; QUESTION_COUNT]) -> [Option<&str>; QUESTION_COUNT] {
    values.map(Some)
  }

  #[test]
  fn total_is_sum_of_answers() {
    let result = score(&answers([3, 2, 1, 2, 1, 3, 1, 0, 0, 1]));
    assert_eq!(result.total, 14);
    assert_eq!(result.q10, 1);
    assert_eq!(result.risk, Risk::High);
  }

  #[test]
  fn maximum_total_is_thirty() {
    let result = score(&answers([3; QUESTION_COUNT]));
    assert_eq!(result.total, 30);
  }

  #[test]
  fn total_thirteen_without_q10_is_high() {
    let result = score(&answers([3, 3, 3, 3, 1, 0, 0, 0, 0, 0]));
    assert_eq!(result.total, 13);
    assert_eq!(result.risk, Risk::High);
  }

  #[test]
  fn total_twelve_with_q10_is_high() {
    let result = score(&answers([3, 3, 3, 2, 0, 0, 0, 0, 0, 1]));
    assert_eq!(result.total, 12);
    assert_eq!(result.risk, Risk::High);
  }

  #[test]
  fn total_twelve_without_q10_is_low() {
    let result = score(&answers([3, 3, 3, 3, 0, 0, 0, 0, 0, 0]));
    assert_eq!(result.total, 12);
    assert_eq!(result.risk, Risk::Low);
  }

  #[test]
  fn all_zero_is_low() {
    let result = score(&answers([0; QUESTION_COUNT]));
    assert_eq!(result.total, 0);
    assert!(!result.risk.is_high());
  }

  #[test]
  fn parse_accepts_valid_answers() {
    let parsed =
      Answers::parse(raw(["0", "0", "0", "1", "0", "1", "0", "0", "0", "0"]))
        .unwrap();
    assert_eq!(score(&parsed).total, 2);
  }

  #[test]
  fn parse_reports_missing_field() {
    let mut fields = raw(["0"; QUESTION_COUNT]);
    fields[4] = None;
    assert_eq!(Answers::parse(fields), Err(Error::MissingAnswer("q5")));
  }

  #[test]
  fn parse_treats_empty_as_missing() {
    let mut fields = raw(["0"; QUESTION_COUNT]);
    fields[0] = Some("");
    assert_eq!(Answers::parse(fields), Err(Error::MissingAnswer("q1")));
  }

  #[test]
  fn parse_reports_non_integer() {
    let mut fields = raw(["1"; QUESTION_COUNT]);
    fields[2] = Some("two");
    assert_eq!(Answers::parse(fields), Err(Error::NotAnInteger("q3")));

    fields[2] = Some("1.5");
    assert_eq!(Answers::parse(fields), Err(Error::NotAnInteger("q3")));
  }

  #[test]
  fn parse_reports_out_of_range() {
    let mut fields = raw(["1"; QUESTION_COUNT]);
    fields[9] = Some("4");
    assert_eq!(Answers::parse(fields), Err(Error::OutOfRange("q10")));

    fields[9] = Some("-1");
    assert_eq!(Answers::parse(fields), Err(Error::OutOfRange("q10")));
  }

  #[test]
  fn parse_reports_first_offending_field() {
    let mut fields = raw(["1"; QUESTION_COUNT]);
    fields[6] = Some("9");
    fields[2] = None;
    let err = Answers::parse(fields).unwrap_err();
    assert_eq!(err.field(), Some("q3"));
  }

  #[test]
  fn new_rejects_out_of_range() {
    let mut values = [0; QUESTION_COUNT];
    values[1] = 4;
    assert_eq!(Answers::new(values), Err(Error::OutOfRange("q2")));
  }
}
