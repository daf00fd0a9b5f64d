//! OpenAPI RPC client
//!
//! A thin authenticated handle for one cloud service in one region. All
//! list/get operations go through [`OpenApiClient::invoke`], which issues an
//! RPC-style request and returns the parsed JSON envelope. Request signing
//! lives in the provider SDK layer and is out of scope here; the handle
//! carries the key material with each call.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::auth::credential::CredentialConfig;
use crate::error::{Error, Result};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging: truncate and strip non-printable
/// characters.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // Back off to a char boundary; the cut may land inside a
        // multi-byte character.
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Authenticated client for one (service, region) pair.
#[derive(Debug, Clone)]
pub struct OpenApiClient {
    http: reqwest::Client,
    endpoint: String,
    region: String,
    access_key_id: String,
    security_token: Option<String>,
}

impl OpenApiClient {
    /// Build a client bound to a credential and region.
    ///
    /// Reads all three key-material accessors up front so each failure
    /// (id, secret, token) propagates as its own attributable error.
    pub fn new(
        service: &str,
        region: &str,
        credentials: &CredentialConfig,
        endpoint_override: Option<&str>,
    ) -> Result<Self> {
        if region.is_empty() {
            return Err(Error::config(format!(
                "region must be passed to build the {service} client"
            )));
        }

        let access_key_id = credentials.credential.access_key_id()?.to_string();
        // The secret feeds request signing inside the transport; reading it
        // here surfaces deferred-material failures at construction time.
        let _access_key_secret = credentials.credential.access_key_secret()?;
        let security_token = credentials
            .credential
            .security_token()?
            .map(str::to_string);

        let endpoint = match endpoint_override {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{service}.{region}.aliyuncs.com"),
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("alicloud-tables/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            region: region.to_string(),
            access_key_id,
            security_token,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Invoke one RPC-style action and return the parsed response envelope.
    ///
    /// Non-2xx responses are decoded from the provider error envelope into
    /// [`Error::Api`]; transport failures surface as [`Error::Http`].
    pub async fn invoke(
        &self,
        action: &str,
        version: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|err| Error::config(format!("invalid endpoint {}: {err}", self.endpoint)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("Action", action);
            query.append_pair("Version", version);
            query.append_pair("RegionId", &self.region);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        tracing::debug!(action, url = %url, "invoking api");

        let mut request = self
            .http
            .get(url)
            .header("x-acs-accesskey-id", &self.access_key_id);
        if let Some(token) = &self.security_token {
            request = request.header("x-acs-security-token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(action, status = %status, body = %sanitize_for_log(&body), "api error response");
            return Err(parse_error_envelope(&body, status.as_u16()));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Decode the provider error envelope (`Code`/`Message`) into an API error,
/// falling back to a sanitized body when the envelope is not JSON.
fn parse_error_envelope(body: &str, status: u16) -> Error {
    match serde_json::from_str::<Value>(body) {
        Ok(envelope) => Error::Api {
            code: envelope
                .get("Code")
                .and_then(Value::as_str)
                .unwrap_or("UnknownError")
                .to_string(),
            message: envelope
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            status,
        },
        Err(_) => Error::Api {
            code: "UnknownError".to_string(),
            message: sanitize_for_log(body),
            status,
        },
    }
}
