//! Connection configuration
//!
//! Settings the host query engine hands the plugin for one connection:
//! credential material, the region list, and error-suppression patterns.

use serde::Deserialize;

/// Per-connection configuration supplied by the host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionConfig {
    /// Static access key id. Takes effect together with `secret_key`.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Static access key secret.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Optional STS session token. Presence switches the credential to STS.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Named profile from the aliyun CLI configuration file.
    /// Wins over static keys when both are set.
    #[serde(default)]
    pub profile: Option<String>,
    /// Regions to fan out over. The first entry doubles as the default
    /// region for global services.
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    /// Provider error codes (substring match) to suppress instead of
    /// surfacing as query errors.
    #[serde(default)]
    pub ignore_error_codes: Vec<String>,
    /// Base URL override for all services. Intended for private endpoints
    /// and tests; when unset the public per-region endpoints are used.
    #[serde(default)]
    pub endpoint: Option<String>,
}
