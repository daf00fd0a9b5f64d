//! Error taxonomy and the ignorable-error classifier
//!
//! Four classes of failure flow through the crate: fatal configuration
//! errors, provider-reported API errors (terminal unless the code is
//! recognized as transient by the retry layer), transport/decoding errors,
//! and errors the connection configuration asks to suppress entirely.

use crate::connection::ConnectionConfig;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid connection configuration. Aborts the operation
    /// that triggered it; never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// An error envelope reported by the provider API.
    #[error("{code}: {message} (status {status})")]
    Api {
        code: String,
        message: String,
        status: u16,
    },

    /// A success-shaped response carrying an empty payload and an
    /// inconsistent success flag. The provider occasionally returns these
    /// on a flaky success path; call sites retry them as failures.
    #[error("empty success response: {0}")]
    EmptyResponse(String),

    #[error("request failed")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode base64 payload")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to parse csv payload")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// The provider-assigned error code, when there is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Throttling rejections are the one provider code the retry policy
    /// treats as transient.
    pub fn is_throttling(&self) -> bool {
        self.code() == Some("Throttling")
    }

    pub fn is_empty_response(&self) -> bool {
        matches!(self, Error::EmptyResponse(_))
    }
}

/// Markers a DNS resolution failure leaves in the rendered error chain.
/// Regions where a service has no endpoint fail this way during fan-out;
/// the Go SDK renders them as "no such host", reqwest/hyper as the rest.
const DNS_FAILURE_MARKERS: &[&str] = &["no such host", "dns error", "failed to lookup address"];

/// Render an error with its full source chain. Classification works over
/// text because the interesting causes (DNS failures in particular) sit
/// several levels down the chain.
fn error_text(err: &Error) -> String {
    use std::error::Error as _;
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Decide whether an error should be suppressed instead of surfaced.
///
/// Returns true for DNS resolution failures (the service does not exist in
/// the region being fanned out over) and for errors whose provider code or
/// rendered text contains any pattern from the connection's
/// `ignore_error_codes`, merged with the per-call `overrides` list used by
/// Get-style lookups for expected not-found conditions.
pub fn is_ignorable(err: &Error, config: &ConnectionConfig, overrides: &[&str]) -> bool {
    let text = error_text(err);

    if DNS_FAILURE_MARKERS.iter().any(|m| text.contains(m)) {
        return true;
    }

    let patterns = config
        .ignore_error_codes
        .iter()
        .map(String::as_str)
        .chain(overrides.iter().copied());

    for pattern in patterns {
        if let Some(code) = err.code() {
            if code.contains(pattern) {
                return true;
            }
        }
        if text.contains(pattern) {
            return true;
        }
    }

    false
}

/// Log a listing/hydrate error without polluting the logs for missing or
/// disabled services: ignorable errors go to debug, everything else is a
/// real query error.
pub fn log_query_error(location: &str, err: &Error, config: &ConnectionConfig) {
    if is_ignorable(err, config, &[]) {
        tracing::debug!(location, error = %err, "ignoring error for unreachable or disabled service");
    } else {
        tracing::error!(location, error = %err, "query error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str, message: &str) -> Error {
        Error::Api {
            code: code.to_string(),
            message: message.to_string(),
            status: 404,
        }
    }

    fn config_with(codes: &[&str]) -> ConnectionConfig {
        ConnectionConfig {
            ignore_error_codes: codes.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dns_failure_is_ignorable() {
        let err = Error::Io(std::io::Error::other(
            "dns error: failed to lookup address information: Name or service not known",
        ));
        assert!(is_ignorable(&err, &ConnectionConfig::default(), &[]));
    }

    #[test]
    fn test_connection_refused_is_not_ignorable() {
        let err = Error::Io(std::io::Error::other("tcp connect error: Connection refused"));
        assert!(!is_ignorable(&err, &ConnectionConfig::default(), &[]));
    }

    #[test]
    fn test_configured_code_pattern_matches() {
        let err = api("EntityNotExist.Role", "role does not exist");
        assert!(is_ignorable(&err, &config_with(&["EntityNotExist"]), &[]));
        assert!(!is_ignorable(&err, &ConnectionConfig::default(), &[]));
    }

    #[test]
    fn test_per_call_override_merges_with_config() {
        let err = api("InvalidKeyPair.NotFound", "key pair not found");
        let config = config_with(&["Forbidden.RAM"]);
        assert!(!is_ignorable(&err, &config, &[]));
        assert!(is_ignorable(&err, &config, &["InvalidKeyPair.NotFound"]));
    }

    #[test]
    fn test_message_text_also_matches() {
        let err = api("ServiceUnavailable", "the specified service is not enabled");
        assert!(is_ignorable(&err, &config_with(&["not enabled"]), &[]));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let err = api("Throttling", "request was denied due to request throttling");
        let config = config_with(&["EntityNotExist"]);
        let first = is_ignorable(&err, &config, &[]);
        let second = is_ignorable(&err, &config, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_throttling_code() {
        assert!(api("Throttling", "slow down").is_throttling());
        assert!(!api("Throttling.User", "slow down").is_throttling());
        assert!(!Error::config("missing access_key").is_throttling());
    }
}
