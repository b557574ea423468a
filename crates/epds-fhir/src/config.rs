//! Connection settings for the identity service and the FHIR store.

use std::{fmt, time::Duration};

/// Audience requested in the client-credentials exchange.
pub const DEFAULT_AUDIENCE: &str = "https://api.zapehr.com";

/// Tokens are treated as expired this long before their real expiry.
pub const DEFAULT_LEAD_TIME_SECS: i64 = 5 * 60;

pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_FHIR_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for [`TokenCache`](crate::TokenCache).
#[derive(Clone)]
pub struct AuthConfig {
  pub token_url:     String,
  pub client_id:     String,
  pub client_secret: String,
  pub audience:      String,
  pub lead_time:     chrono::Duration,
  pub timeout:       Duration,
}

impl AuthConfig {
  /// Settings with the default audience, lead time and timeout.
  pub fn new(
    token_url: impl Into<String>,
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
  ) -> Self {
    Self {
      token_url:     token_url.into(),
      client_id:     client_id.into(),
      client_secret: client_secret.into(),
      audience:      DEFAULT_AUDIENCE.to_string(),
      lead_time:     chrono::Duration::seconds(DEFAULT_LEAD_TIME_SECS),
      timeout:       DEFAULT_AUTH_TIMEOUT,
    }
  }
}

impl fmt::Debug for AuthConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AuthConfig")
      .field("token_url", &self.token_url)
      .field("client_id", &self.client_id)
      .field("client_secret", &"<redacted>")
      .field("audience", &self.audience)
      .field("lead_time", &self.lead_time)
      .field("timeout", &self.timeout)
      .finish()
  }
}

/// Settings for [`FhirClient`](crate::FhirClient).
#[derive(Debug, Clone)]
pub struct FhirConfig {
  /// Base URL of the FHIR R4 API; a trailing `/` is tolerated.
  pub base_url:   String,
  /// Sent as `x-zapehr-project-id` on every request.
  pub project_id: String,
  pub timeout:    Duration,
}

impl FhirConfig {
  pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
    Self {
      base_url:   base_url.into(),
      project_id: project_id.into(),
      timeout:    DEFAULT_FHIR_TIMEOUT,
    }
  }
}
