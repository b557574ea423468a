//! [`FhirClient`]: authenticated access to the FHIR REST API.
//!
//! Every request carries the bearer token, the project header and FHIR JSON
//! content negotiation. Searches keep only the first bundle entry; creates
//! read back only the assigned id.

use epds_core::store::AccessToken;
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::{
  config::FhirConfig,
  error::{Error, Result},
};

const FHIR_JSON: &str = "application/fhir+json";
const PROJECT_HEADER: &str = "x-zapehr-project-id";

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Bundle {
  #[serde(default)]
  entry: Vec<BundleEntry>,
}

#[derive(Deserialize)]
struct BundleEntry {
  #[serde(default)]
  resource: Option<ResourceId>,
}

/// Any resource, reduced to its id.
#[derive(Deserialize)]
struct ResourceId {
  #[serde(default)]
  id: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FhirClient {
  client: Client,
  config: FhirConfig,
}

impl FhirClient {
  pub fn new(config: FhirConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, resource_type: &str) -> String {
    format!(
      "{}/{}",
      self.config.base_url.trim_end_matches('/'),
      resource_type
    )
  }

  fn request(
    &self,
    method: Method,
    resource_type: &str,
    token: &AccessToken,
  ) -> RequestBuilder {
    self
      .client
      .request(method, self.url(resource_type))
      .bearer_auth(token.as_str())
      .header(PROJECT_HEADER, &self.config.project_id)
      .header(header::ACCEPT, FHIR_JSON)
  }

  /// `GET /{resource_type}?{query}` and return the id of the first entry.
  ///
  /// `what` describes the search for the `NotFound` message.
  pub(crate) async fn search_first(
    &self,
    token: &AccessToken,
    resource_type: &str,
    query: &[(&str, &str)],
    what: String,
  ) -> Result<String> {
    tracing::debug!(resource_type, ?query, "searching");

    let resp = self
      .request(Method::GET, resource_type, token)
      .query(query)
      .send()
      .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if status != StatusCode::OK {
      return Err(Error::Upstream {
        operation: format!("{resource_type} search"),
        status: status.as_u16(),
        body,
      });
    }

    let bundle: Bundle = serde_json::from_str(&body)
      .map_err(|e| Error::malformed(format!("{resource_type} bundle"), e))?;

    let first = bundle
      .entry
      .into_iter()
      .next()
      .ok_or(Error::NotFound(what))?;

    first
      .resource
      .and_then(|r| r.id)
      .filter(|id| !id.is_empty())
      .ok_or_else(|| {
        Error::malformed(
          format!("{resource_type} bundle"),
          "first entry has no id",
        )
      })
  }

  /// `POST /{resource_type}` and return the id the server assigned.
  pub(crate) async fn create<R: Serialize>(
    &self,
    token: &AccessToken,
    resource_type: &str,
    resource: &R,
  ) -> Result<String> {
    let payload = serde_json::to_vec(resource)
      .map_err(|e| Error::malformed(format!("{resource_type} payload"), e))?;

    tracing::debug!(resource_type, "creating resource");

    let resp = self
      .request(Method::POST, resource_type, token)
      .header(header::CONTENT_TYPE, FHIR_JSON)
      .body(payload)
      .send()
      .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if status != StatusCode::CREATED {
      return Err(Error::Upstream {
        operation: format!("{resource_type} create"),
        status: status.as_u16(),
        body,
      });
    }

    let created: ResourceId = serde_json::from_str(&body).map_err(|e| {
      Error::malformed(format!("{resource_type} create response"), e)
    })?;

    created.id.filter(|id| !id.is_empty()).ok_or_else(|| {
      Error::malformed(
        format!("{resource_type} create response"),
        "response did not contain an id",
      )
    })
  }
}
