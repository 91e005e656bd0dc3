//! SMART-on-FHIR constants
//!
//! Public OAuth client configuration for the Epic sandbox. These values are
//! not secrets; they identify a public client application. Access tokens
//! obtained with them are the secret part and never pass through this crate.

/// OAuth client ID registered with Epic for this app
pub const CLIENT_ID: &str = "9cd3bd3e-3d8b-482f-ab18-7dc5a021302f";

/// Root of all FHIR R4 resource requests
pub const FHIR_BASE_URL: &str = "https://fhir.epic.com/interconnect-fhir-oauth/api/FHIR/R4";

/// SMART authorization endpoint (target of the initial browser redirect)
pub const SMART_AUTH_URL: &str = "https://fhir.epic.com/interconnect-fhir-oauth/oauth2/authorize";

/// Token endpoint for code exchange and token refresh
pub const SMART_TOKEN_URL: &str = "https://fhir.epic.com/interconnect-fhir-oauth/oauth2/token";

/// Redirect URI. Must match the value registered with Epic byte for byte.
pub const REDIRECT_URI: &str = "http://localhost:5173";

/// Storage key for the PKCE code verifier, kept across the authorization redirect
pub const CODE_VERIFIER_STORAGE_KEY: &str = "smart_code_verifier";

/// Storage key for the token endpoint response
pub const TOKEN_RESPONSE_STORAGE_KEY: &str = "smart_token_response";
