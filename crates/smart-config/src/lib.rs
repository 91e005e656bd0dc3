//! SMART-on-FHIR client configuration
//!
//! Exposes the OAuth client identifier, FHIR and OAuth endpoints, redirect
//! URI, and browser storage key names used by a SMART-on-FHIR client app.
//! This crate performs no network I/O and no persistence; the authorization
//! flow and token storage live with whoever imports these values.
//!
//! Two ways to consume the configuration:
//! 1. The raw `constants`, importable anywhere as `&'static str`
//! 2. A `SmartSettings` record, either `SmartSettings::shared()` for the
//!    built-in values or `SmartSettings::load()` for an injected TOML file
//!    (staging, tests) validated against the same invariants

pub mod constants;
pub mod error;
pub mod loader;
pub mod settings;

pub use constants::*;
pub use error::{Error, Result};
pub use loader::resolve_path;
pub use settings::{SmartSettings, StorageKeys};
