//! Runtime configuration, deserialised from `config.toml` and `EPDS_*`
//! environment variables.

use std::time::Duration;

use epds_fhir::{
  AuthConfig, FhirConfig,
  config::{
    DEFAULT_AUDIENCE, DEFAULT_AUTH_TIMEOUT, DEFAULT_FHIR_TIMEOUT,
    DEFAULT_LEAD_TIME_SECS,
  },
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("required setting `{0}` is not set")]
  Missing(&'static str),
}

#[derive(Deserialize, Clone)]
pub struct ServiceConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub fhir_base_url:        String,
  pub auth_url:             String,
  pub project_id:           String,
  pub client_id:            String,
  pub client_secret:        String,
  /// FHIR reference of the provider who receives alerts, e.g.
  /// `Practitioner/123`.
  pub alert_provider_id:    String,
  #[serde(default = "default_audience")]
  pub auth_audience:        String,
  #[serde(default = "default_lead_time_secs")]
  pub token_lead_time_secs: i64,
  #[serde(default = "default_auth_timeout_secs")]
  pub auth_timeout_secs:    u64,
  #[serde(default = "default_fhir_timeout_secs")]
  pub fhir_timeout_secs:    u64,
}

/// `EPDS_*` environment variables, e.g. `EPDS_FHIR_BASE_URL`.
///
/// Values stay strings until deserialisation so ids and secrets keep any
/// leading zeros.
pub fn environment() -> ::config::Environment {
  ::config::Environment::with_prefix("EPDS")
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_audience() -> String { DEFAULT_AUDIENCE.to_string() }
fn default_lead_time_secs() -> i64 { DEFAULT_LEAD_TIME_SECS }
fn default_auth_timeout_secs() -> u64 { DEFAULT_AUTH_TIMEOUT.as_secs() }
fn default_fhir_timeout_secs() -> u64 { DEFAULT_FHIR_TIMEOUT.as_secs() }

impl ServiceConfig {
  /// Reject required settings that are present but blank.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let required = [
      ("fhir_base_url", &self.fhir_base_url),
      ("auth_url", &self.auth_url),
      ("project_id", &self.project_id),
      ("client_id", &self.client_id),
      ("client_secret", &self.client_secret),
      ("alert_provider_id", &self.alert_provider_id),
    ];
    match required.iter().find(|(_, value)| value.trim().is_empty()) {
      Some((name, _)) => Err(ConfigError::Missing(*name)),
      None => Ok(()),
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      token_url:     self.auth_url.clone(),
      client_id:     self.client_id.clone(),
      client_secret: self.client_secret.clone(),
      audience:      self.auth_audience.clone(),
      lead_time:     chrono::Duration::seconds(self.token_lead_time_secs),
      timeout:       Duration::from_secs(self.auth_timeout_secs),
    }
  }

  pub fn fhir_config(&self) -> FhirConfig {
    FhirConfig {
      base_url:   self.fhir_base_url.clone(),
      project_id: self.project_id.clone(),
      timeout:    Duration::from_secs(self.fhir_timeout_secs),
    }
  }
}
