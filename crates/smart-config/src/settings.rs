//! Immutable SMART client configuration record
//!
//! Groups the seven constants into one read-only value so callers can take a
//! `&SmartSettings` instead of reaching for globals, and so tests or staging
//! deployments can hand in a different record (see `loader`). Fields are
//! private; a record never changes after it is built.

use std::sync::LazyLock;

use tracing::debug;
use url::Url;

use crate::constants::{
    CLIENT_ID, CODE_VERIFIER_STORAGE_KEY, FHIR_BASE_URL, REDIRECT_URI, SMART_AUTH_URL,
    SMART_TOKEN_URL, TOKEN_RESPONSE_STORAGE_KEY,
};
use crate::error::{Error, Result};

static SHARED: LazyLock<SmartSettings> = LazyLock::new(SmartSettings::default);

/// Key names under which the host app persists flow state across the
/// authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub(crate) code_verifier: String,
    pub(crate) token_response: String,
}

impl StorageKeys {
    /// Key for the PKCE code verifier
    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    /// Key for the token endpoint response
    pub fn token_response(&self) -> &str {
        &self.token_response
    }

    /// Both keys paired with the config field they come from.
    pub fn all(&self) -> [(&'static str, &str); 2] {
        [
            ("storage.code_verifier_key", self.code_verifier.as_str()),
            ("storage.token_response_key", self.token_response.as_str()),
        ]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            code_verifier: CODE_VERIFIER_STORAGE_KEY.to_owned(),
            token_response: TOKEN_RESPONSE_STORAGE_KEY.to_owned(),
        }
    }
}

/// OAuth client identity, endpoints, and storage keys for one SMART app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartSettings {
    pub(crate) client_id: String,
    pub(crate) fhir_base_url: String,
    pub(crate) authorize_url: String,
    pub(crate) token_url: String,
    pub(crate) redirect_uri: String,
    pub(crate) storage: StorageKeys,
}

impl Default for SmartSettings {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID.to_owned(),
            fhir_base_url: FHIR_BASE_URL.to_owned(),
            authorize_url: SMART_AUTH_URL.to_owned(),
            token_url: SMART_TOKEN_URL.to_owned(),
            redirect_uri: REDIRECT_URI.to_owned(),
            storage: StorageKeys::default(),
        }
    }
}

impl SmartSettings {
    /// Process-wide settings built from the constants on first use.
    pub fn shared() -> &'static SmartSettings {
        &SHARED
    }

    /// Sent as `client_id` in authorization and token requests
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn fhir_base_url(&self) -> &str {
        &self.fhir_base_url
    }

    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Sent as `redirect_uri`; the authorization server calls back here with `?code=`
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn storage_keys(&self) -> &StorageKeys {
        &self.storage
    }

    /// Check every value against its invariant.
    ///
    /// - all seven values are non-empty, with no surrounding whitespace
    /// - FHIR base, authorize and token URLs are absolute `https` URLs
    /// - the FHIR base carries no query or fragment, so resource paths
    ///   appended to it land in the URL path
    /// - the redirect URI is an absolute URI (plain `http` is allowed for
    ///   local development callbacks)
    /// - the two storage keys differ
    pub fn validate(&self) -> Result<()> {
        require_value("client_id", &self.client_id)?;

        let base = require_https("fhir_base_url", &self.fhir_base_url)?;
        if base.query().is_some() || base.fragment().is_some() {
            return Err(Error::InvalidUrl {
                field: "fhir_base_url",
                value: self.fhir_base_url.clone(),
                reason: "base URL must not carry a query or fragment".into(),
            });
        }

        require_https("authorize_url", &self.authorize_url)?;
        require_https("token_url", &self.token_url)?;
        require_absolute("redirect_uri", &self.redirect_uri)?;

        for (field, key) in self.storage.all() {
            require_value(field, key)?;
        }
        if self.storage.code_verifier == self.storage.token_response {
            return Err(Error::StorageKeyCollision(format!(
                "code verifier and token response both use {:?}",
                self.storage.code_verifier
            )));
        }

        debug!(
            client_id = %self.client_id,
            fhir_base_url = %self.fhir_base_url,
            "SMART settings validated"
        );
        Ok(())
    }

    /// Build a FHIR request URL from a resource path such as `Patient/123`.
    ///
    /// Exactly one `/` separates base and path regardless of slashes on
    /// either side. Query strings are kept as given. An empty path returns
    /// the base URL itself. Paths with `.` or `..` segments (plain or
    /// percent-encoded) are rejected; the result always stays under the base.
    pub fn resource_url(&self, path: &str) -> Result<Url> {
        let base = self.fhir_base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if has_dot_segment(path) {
            return Err(Error::InvalidUrl {
                field: "resource_path",
                value: path.to_owned(),
                reason: "dot segments would leave the FHIR base".into(),
            });
        }
        let joined = if path.is_empty() {
            base.to_owned()
        } else {
            format!("{base}/{path}")
        };

        Url::parse(&joined).map_err(|e| Error::InvalidUrl {
            field: "fhir_base_url",
            value: joined,
            reason: e.to_string(),
        })
    }
}

fn require_value(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::EmptyValue { field });
    }
    if value.trim() != value {
        return Err(Error::SurroundingWhitespace { field });
    }
    Ok(())
}

fn require_absolute(field: &'static str, value: &str) -> Result<Url> {
    require_value(field, value)?;
    Url::parse(value).map_err(|e| Error::InvalidUrl {
        field,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

// `url` refuses https without a host, so the scheme check covers that too.
fn require_https(field: &'static str, value: &str) -> Result<Url> {
    let url = require_absolute(field, value)?;
    if url.scheme() != "https" {
        return Err(Error::InsecureScheme {
            field,
            scheme: url.scheme().to_owned(),
        });
    }
    Ok(url)
}

/// True when the path part (before any `?` or `#`) has a segment the URL
/// parser would resolve as `.` or `..`.
fn has_dot_segment(path: &str) -> bool {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split(['/', '\\']).any(|segment| {
        matches!(
            segment.to_ascii_lowercase().as_str(),
            "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_storage(code_verifier: &str, token_response: &str) -> SmartSettings {
        SmartSettings {
            storage: StorageKeys {
                code_verifier: code_verifier.into(),
                token_response: token_response.into(),
            },
            ..SmartSettings::default()
        }
    }

    #[test]
    fn defaults_mirror_constants() {
        let settings = SmartSettings::default();
        assert_eq!(settings.client_id(), CLIENT_ID);
        assert_eq!(settings.fhir_base_url(), FHIR_BASE_URL);
        assert_eq!(settings.authorize_url(), SMART_AUTH_URL);
        assert_eq!(settings.token_url(), SMART_TOKEN_URL);
        assert_eq!(settings.redirect_uri(), REDIRECT_URI);
        assert_eq!(
            settings.storage_keys().code_verifier(),
            CODE_VERIFIER_STORAGE_KEY
        );
        assert_eq!(
            settings.storage_keys().token_response(),
            TOKEN_RESPONSE_STORAGE_KEY
        );
    }

    #[test]
    fn defaults_pass_validation() {
        SmartSettings::default().validate().unwrap();
    }

    #[test]
    fn shared_returns_the_same_record_every_time() {
        let a = SmartSettings::shared();
        let b = SmartSettings::shared();
        assert!(std::ptr::eq(a, b), "shared settings must be a single instance");
        assert_eq!(a, &SmartSettings::default());
        assert_eq!(a.client_id(), b.client_id());
    }

    #[test]
    fn shared_is_readable_from_many_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| SmartSettings::shared().token_url().to_owned()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), SMART_TOKEN_URL);
        }
    }

    #[test]
    fn resource_url_joins_patient_path() {
        let url = SmartSettings::default()
            .resource_url("/Patient/123")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://fhir.epic.com/interconnect-fhir-oauth/api/FHIR/R4/Patient/123"
        );
    }

    #[test]
    fn resource_url_tolerates_missing_or_doubled_slashes() {
        let settings = SmartSettings {
            fhir_base_url: format!("{FHIR_BASE_URL}/"),
            ..SmartSettings::default()
        };
        let expected = format!("{FHIR_BASE_URL}/Observation");
        assert_eq!(
            settings.resource_url("Observation").unwrap().as_str(),
            expected
        );
        assert_eq!(
            settings.resource_url("//Observation").unwrap().as_str(),
            expected
        );
    }

    #[test]
    fn resource_url_keeps_query_parameters() {
        let url = SmartSettings::default()
            .resource_url("Observation?patient=123&category=vital-signs")
            .unwrap();
        assert_eq!(url.path(), "/interconnect-fhir-oauth/api/FHIR/R4/Observation");
        assert_eq!(url.query(), Some("patient=123&category=vital-signs"));
    }

    #[test]
    fn resource_url_empty_path_is_base() {
        let url = SmartSettings::default().resource_url("").unwrap();
        assert_eq!(url.as_str(), FHIR_BASE_URL);
    }

    #[test]
    fn empty_client_id_rejected() {
        let settings = SmartSettings {
            client_id: "  ".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::EmptyValue { field: "client_id" }),
            "got: {err:?}"
        );
    }

    #[test]
    fn plain_http_token_url_rejected() {
        let settings = SmartSettings {
            token_url: "http://fhir.epic.com/interconnect-fhir-oauth/oauth2/token".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::InsecureScheme { field: "token_url", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn relative_fhir_base_rejected() {
        let settings = SmartSettings {
            fhir_base_url: "/api/FHIR/R4".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidUrl { field: "fhir_base_url", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn relative_redirect_uri_rejected() {
        let settings = SmartSettings {
            redirect_uri: "callback".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidUrl { field: "redirect_uri", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn colliding_storage_keys_rejected() {
        let err = with_storage("smart_state", "smart_state")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::StorageKeyCollision(_)), "got: {err:?}");
        assert!(err.to_string().contains("smart_state"));
    }

    #[test]
    fn empty_storage_key_rejected() {
        let err = with_storage("", "smart_token_response")
            .validate()
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::EmptyValue {
                    field: "storage.code_verifier_key"
                }
            ),
            "got: {err:?}"
        );
    }

    #[test]
    fn storage_keys_all_lists_both_roles() {
        let keys = StorageKeys::default();
        let all = keys.all();
        assert_eq!(all[0], ("storage.code_verifier_key", "smart_code_verifier"));
        assert_eq!(all[1], ("storage.token_response_key", "smart_token_response"));
    }

    #[test]
    fn fhir_base_with_query_rejected() {
        let settings = SmartSettings {
            fhir_base_url: "https://x.example/fhir?tenant=a".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidUrl { field: "fhir_base_url", .. }),
            "got: {err:?}"
        );
        assert!(err.to_string().contains("query or fragment"), "got: {err}");
    }

    #[test]
    fn fhir_base_with_fragment_rejected() {
        let settings = SmartSettings {
            fhir_base_url: "https://x.example/fhir#r4".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidUrl { field: "fhir_base_url", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn padded_redirect_uri_rejected() {
        let settings = SmartSettings {
            redirect_uri: " http://localhost:5173 ".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(
                err,
                Error::SurroundingWhitespace {
                    field: "redirect_uri"
                }
            ),
            "got: {err:?}"
        );
    }

    #[test]
    fn padded_client_id_rejected() {
        let settings = SmartSettings {
            client_id: " abc ".into(),
            ..SmartSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, Error::SurroundingWhitespace { field: "client_id" }),
            "got: {err:?}"
        );
    }

    #[test]
    fn padded_storage_key_rejected() {
        let err = with_storage("smart_code_verifier\n", "smart_token_response")
            .validate()
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::SurroundingWhitespace {
                    field: "storage.code_verifier_key"
                }
            ),
            "got: {err:?}"
        );
    }

    #[test]
    fn resource_url_rejects_parent_segments() {
        let settings = SmartSettings::default();
        for path in [
            "../../oauth2/token",
            "Patient/../../../oauth2/token",
            "%2e%2e/oauth2/token",
            "Patient/%2E./x",
            "./Patient",
            "..\\oauth2",
        ] {
            let err = settings.resource_url(path).unwrap_err();
            assert!(
                matches!(err, Error::InvalidUrl { field: "resource_path", .. }),
                "{path} must be rejected, got: {err:?}"
            );
        }
    }

    #[test]
    fn resource_url_allows_dots_inside_segments_and_query() {
        let settings = SmartSettings::default();
        let url = settings
            .resource_url("Binary/abc.pdf?_format=..json")
            .unwrap();
        assert_eq!(url.path(), "/interconnect-fhir-oauth/api/FHIR/R4/Binary/abc.pdf");
        assert_eq!(url.query(), Some("_format=..json"));
    }
}
