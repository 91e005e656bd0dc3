//! Loading alternate SMART settings from TOML
//!
//! Path precedence: CLI arg > SMART_CONFIG_PATH env var > default file name.
//! Every key in the file is optional; anything left out keeps the value
//! from `constants`, so a staging file only lists what differs.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::constants::{
    CLIENT_ID, CODE_VERIFIER_STORAGE_KEY, FHIR_BASE_URL, REDIRECT_URI, SMART_AUTH_URL,
    SMART_TOKEN_URL, TOKEN_RESPONSE_STORAGE_KEY,
};
use crate::error::Result;
use crate::settings::{SmartSettings, StorageKeys};

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "smart-config.toml";

/// Env var naming an alternate config file
pub const CONFIG_PATH_ENV: &str = "SMART_CONFIG_PATH";

/// On-disk layout
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    smart: SmartSection,
    #[serde(default)]
    storage: StorageSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SmartSection {
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_fhir_base_url")]
    fhir_base_url: String,
    #[serde(default = "default_authorize_url")]
    authorize_url: String,
    #[serde(default = "default_token_url")]
    token_url: String,
    #[serde(default = "default_redirect_uri")]
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageSection {
    #[serde(default = "default_code_verifier_key")]
    code_verifier_key: String,
    #[serde(default = "default_token_response_key")]
    token_response_key: String,
}

impl Default for SmartSection {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            fhir_base_url: default_fhir_base_url(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            redirect_uri: default_redirect_uri(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            code_verifier_key: default_code_verifier_key(),
            token_response_key: default_token_response_key(),
        }
    }
}

fn default_client_id() -> String {
    CLIENT_ID.to_owned()
}

fn default_fhir_base_url() -> String {
    FHIR_BASE_URL.to_owned()
}

fn default_authorize_url() -> String {
    SMART_AUTH_URL.to_owned()
}

fn default_token_url() -> String {
    SMART_TOKEN_URL.to_owned()
}

fn default_redirect_uri() -> String {
    REDIRECT_URI.to_owned()
}

fn default_code_verifier_key() -> String {
    CODE_VERIFIER_STORAGE_KEY.to_owned()
}

fn default_token_response_key() -> String {
    TOKEN_RESPONSE_STORAGE_KEY.to_owned()
}

impl FileConfig {
    fn into_settings(self) -> SmartSettings {
        SmartSettings {
            client_id: self.smart.client_id,
            fhir_base_url: self.smart.fhir_base_url,
            authorize_url: self.smart.authorize_url,
            token_url: self.smart.token_url,
            redirect_uri: self.smart.redirect_uri,
            storage: StorageKeys {
                code_verifier: self.storage.code_verifier_key,
                token_response: self.storage.token_response_key,
            },
        }
    }
}

impl SmartSettings {
    /// Parse settings from TOML text, fill gaps from the constants, validate.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(contents).map_err(common::Error::from)?;
        let settings = file.into_settings();
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(common::Error::from)?;
        Self::from_file_contents(path, &contents)
    }

    /// Like `load`, but a missing file yields the built-in settings.
    ///
    /// Only `NotFound` falls back. A file that exists but cannot be read,
    /// parsed, or validated is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_file_contents(path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using built-in SMART settings");
                Ok(Self::default())
            }
            Err(e) => Err(common::Error::Config(format!(
                "cannot read config file {}: {e}",
                path.display()
            ))
            .into()),
        }
    }

    fn from_file_contents(path: &Path, contents: &str) -> Result<Self> {
        let settings = Self::from_toml_str(contents)?;
        info!(path = %path.display(), client_id = %settings.client_id(), "loaded SMART settings");
        Ok(settings)
    }
}

/// Resolve config file path from CLI arg or SMART_CONFIG_PATH env var.
pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
    if let Some(p) = cli_path {
        return PathBuf::from(p);
    }
    if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
