//! Core types and trait definitions for the EPDS submission service.
//!
//! This crate has no HTTP dependencies. It owns the score
//! engine, submission validation, and the collaborator traits that the FHIR
//! backend implements.

// Store traits spell out `Send` futures explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod score;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
