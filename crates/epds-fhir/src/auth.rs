//! Client-credentials token cache.
//!
//! A single cached token is shared by every request. Reads take a shared
//! lock; a miss takes the exclusive lock and re-checks before fetching, so a
//! herd of callers arriving at expiry triggers exactly one exchange.

use chrono::{DateTime, Utc};
use epds_core::store::{AccessToken, TokenSource};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
  config::AuthConfig,
  error::{Error, Result},
};

#[derive(Debug, Clone)]
struct CachedToken {
  token:      AccessToken,
  expires_at: DateTime<Utc>,
}

impl CachedToken {
  /// `true` while more than `lead_time` remains before expiry.
  fn is_fresh(&self, lead_time: chrono::Duration, now: DateTime<Utc>) -> bool {
    self
      .expires_at
      .checked_sub_signed(lead_time)
      .is_some_and(|deadline| now < deadline)
  }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
  client_id:     &'a str,
  client_secret: &'a str,
  grant_type:    &'static str,
  audience:      &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
  #[serde(default)]
  access_token: String,
  #[serde(default)]
  token_type:   String,
  expires_in:   i64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
  #[serde(default)]
  error:             String,
  #[serde(default)]
  error_description: String,
}

/// Process-lifetime cache for the clinical store's bearer token.
pub struct TokenCache {
  client: Client,
  config: AuthConfig,
  cached: RwLock<Option<CachedToken>>,
}

impl TokenCache {
  pub fn new(config: AuthConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self {
      client,
      config,
      cached: RwLock::new(None),
    })
  }

  /// Return the cached token, or fetch and cache a new one.
  pub async fn token(&self) -> Result<AccessToken> {
    {
      let cache = self.cached.read().await;
      if let Some(cached) = cache.as_ref()
        && cached.is_fresh(self.config.lead_time, Utc::now())
      {
        tracing::debug!("using cached access token");
        return Ok(cached.token.clone());
      }
    }

    let mut cache = self.cached.write().await;

    // Another caller may have refreshed while we waited for the lock.
    if let Some(cached) = cache.as_ref()
      && cached.is_fresh(self.config.lead_time, Utc::now())
    {
      tracing::debug!("access token refreshed by a concurrent caller");
      return Ok(cached.token.clone());
    }

    let fresh = self.fetch().await?;
    let token = fresh.token.clone();
    *cache = Some(fresh);
    Ok(token)
  }

  async fn fetch(&self) -> Result<CachedToken> {
    tracing::info!(url = %self.config.token_url, "fetching new access token");

    let resp = self
      .client
      .post(&self.config.token_url)
      .header(header::ACCEPT, "application/json")
      .json(&TokenRequest {
        client_id:     &self.config.client_id,
        client_secret: &self.config.client_secret,
        grant_type:    "client_credentials",
        audience:      &self.config.audience,
      })
      .send()
      .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if status != StatusCode::OK {
      let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
        Ok(e) if !e.error.is_empty() => {
          format!("{} - {}", e.error, e.error_description)
        }
        _ => body,
      };
      return Err(Error::Auth {
        status: status.as_u16(),
        message,
      });
    }

    let parsed: TokenResponse = serde_json::from_str(&body)
      .map_err(|e| Error::malformed("token response", e))?;

    if parsed.access_token.is_empty() {
      return Err(Error::malformed("token response", "empty access_token"));
    }

    let expires_at = chrono::Duration::try_seconds(parsed.expires_in)
      .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
      .ok_or_else(|| {
        Error::malformed("token response", "expires_in out of range")
      })?;

    tracing::info!(
      expires_in = parsed.expires_in,
      token_type = %parsed.token_type,
      "obtained access token"
    );

    Ok(CachedToken {
      token:      AccessToken::new(parsed.access_token),
      expires_at,
    })
  }
}

impl TokenSource for TokenCache {
  type Error = Error;

  async fn access_token(&self) -> Result<AccessToken> { self.token().await }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
  };

  use super::*;

  fn cache_for(server: &MockServer) -> TokenCache {
    TokenCache::new(AuthConfig::new(
      format!("{}/oauth/token", server.uri()),
      "client-1",
      "shh",
    ))
    .unwrap()
  }

  fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
    json!({ "access_token": token, "token_type": "Bearer", "expires_in": expires_in })
  }

  async fn seed(cache: &TokenCache, token: &str, remaining: chrono::Duration) {
    *cache.cached.write().await = Some(CachedToken {
      token:      AccessToken::new(token),
      expires_at: Utc::now() + remaining,
    });
  }

  #[tokio::test]
  async fn fetches_with_client_credentials_then_caches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .and(header("content-type", "application/json"))
      .and(body_json(json!({
        "client_id":     "client-1",
        "client_secret": "shh",
        "grant_type":    "client_credentials",
        "audience":      "https://api.zapehr.com",
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 3600)))
      .expect(1)
      .mount(&server)
      .await;

    let cache = cache_for(&server);
    assert_eq!(cache.token().await.unwrap().as_str(), "tok-1");
    assert_eq!(cache.token().await.unwrap().as_str(), "tok-1");
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_callers_share_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(token_body("shared", 3600))
          .set_delay(Duration::from_millis(200)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let cache = Arc::new(cache_for(&server));
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move { cache.token().await })
      })
      .collect();

    for handle in handles {
      let token = handle.await.unwrap().unwrap();
      assert_eq!(token.as_str(), "shared");
    }
  }

  #[tokio::test]
  async fn fresh_cached_token_skips_identity_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new", 3600)))
      .expect(0)
      .mount(&server)
      .await;

    let cache = cache_for(&server);
    seed(&cache, "cached", chrono::Duration::minutes(30)).await;
    assert_eq!(cache.token().await.unwrap().as_str(), "cached");
  }

  #[tokio::test]
  async fn token_inside_lead_time_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new", 3600)))
      .expect(1)
      .mount(&server)
      .await;

    let cache = cache_for(&server);
    seed(&cache, "stale", chrono::Duration::minutes(2)).await;
    assert_eq!(cache.token().await.unwrap().as_str(), "new");
    assert_eq!(cache.token().await.unwrap().as_str(), "new");
  }

  #[tokio::test]
  async fn short_lived_token_is_not_reused() {
    // Lifetime below the lead time: every call must fetch.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(token_body("brief", 60)))
      .expect(2)
      .mount(&server)
      .await;

    let cache = cache_for(&server);
    cache.token().await.unwrap();
    cache.token().await.unwrap();
  }

  #[tokio::test]
  async fn error_payload_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({
        "error": "invalid_client",
        "error_description": "bad secret",
      })))
      .mount(&server)
      .await;

    let err = cache_for(&server).token().await.unwrap_err();
    match err {
      Error::Auth { status, message } => {
        assert_eq!(status, 401);
        assert_eq!(message, "invalid_client - bad secret");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn plain_error_body_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503).set_body_string("down"))
      .mount(&server)
      .await;

    let err = cache_for(&server).token().await.unwrap_err();
    assert!(matches!(err, Error::Auth { status: 503, ref message } if message == "down"));
  }

  #[tokio::test]
  async fn empty_access_token_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(token_body("", 3600)))
      .mount(&server)
      .await;

    let err = cache_for(&server).token().await.unwrap_err();
    assert!(matches!(err, Error::Malformed { .. }), "{err:?}");
  }

  #[tokio::test]
  async fn unrepresentable_expiry_is_malformed() {
    for expires_in in [1_000_000_000_000_000, i64::MIN] {
      let server = MockServer::start().await;
      Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("t", expires_in)))
        .mount(&server)
        .await;

      let err = cache_for(&server).token().await.unwrap_err();
      assert!(
        matches!(&err, Error::Malformed { reason, .. } if reason.contains("expires_in")),
        "{expires_in}: {err:?}"
      );
    }
  }

  #[test]
  fn expiry_near_the_calendar_floor_is_stale() {
    let cached = CachedToken {
      token:      AccessToken::new("t"),
      expires_at: DateTime::<Utc>::MIN_UTC,
    };
    assert!(!cached.is_fresh(chrono::Duration::minutes(5), Utc::now()));
  }

  #[tokio::test]
  async fn failures_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(500))
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(token_body("second", 3600)))
      .mount(&server)
      .await;

    let cache = cache_for(&server);
    assert!(cache.token().await.is_err());
    assert_eq!(cache.token().await.unwrap().as_str(), "second");
  }

  #[test]
  fn debug_output_hides_secrets() {
    let config = AuthConfig::new("http://auth", "id", "super-secret");
    assert!(!format!("{config:?}").contains("super-secret"));
    assert!(!format!("{:?}", AccessToken::new("bearer-xyz")).contains("bearer-xyz"));
  }
}
