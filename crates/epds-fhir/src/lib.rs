//! FHIR backend for the EPDS submission service.
//!
//! Implements [`epds_core::store::TokenSource`] with [`TokenCache`] (a
//! client-credentials token cache) and [`epds_core::store::ClinicalStore`]
//! with [`FhirClient`], both over [`reqwest`].

mod records;
mod search;
mod store;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod resources;

pub use auth::TokenCache;
pub use client::FhirClient;
pub use config::{AuthConfig, FhirConfig};
pub use error::{Error, Result};
