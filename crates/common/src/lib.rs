//! Shared configuration-loading errors for the SMART-on-FHIR client workspace

mod error;

pub use error::{Error, Result};
