//! Credential resolution
//!
//! Applies the credential precedence in order, short-circuiting on the
//! first fully-satisfied source:
//!
//! 1. profile named in the connection config
//! 2. profile named in the environment
//! 3. access key + secret (+ optional session token) in the connection config
//! 4. access key + secret (+ optional session token) from the environment
//!
//! Each source is a terminal attempt: a named-but-broken profile fails
//! resolution rather than falling through. No source satisfied is a fatal
//! configuration error.

use super::credential::{Credential, CredentialConfig};
use super::env::Env;
use super::profile;
use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};
use crate::regions;

/// Profile name fallbacks, provider-branded and generic variants.
pub const PROFILE_ENV_VARS: &[&str] = &[
    "ALIBABACLOUD_PROFILE",
    "ALIBABA_CLOUD_PROFILE",
    "ALICLOUD_PROFILE",
];

pub const ACCESS_KEY_ID_ENV_VARS: &[&str] = &[
    "ALIBABACLOUD_ACCESS_KEY_ID",
    "ALICLOUD_ACCESS_KEY_ID",
    "ALICLOUD_ACCESS_KEY",
];

pub const ACCESS_KEY_SECRET_ENV_VARS: &[&str] = &[
    "ALIBABACLOUD_ACCESS_KEY_SECRET",
    "ALICLOUD_ACCESS_KEY_SECRET",
    "ALICLOUD_SECRET_KEY",
];

pub const SESSION_TOKEN_ENV_VARS: &[&str] = &[
    "ALIBABACLOUD_SECURITY_TOKEN",
    "ALICLOUD_SECURITY_TOKEN",
    "ALICLOUD_SESSION_TOKEN",
];

/// Resolve the effective identity for a connection.
pub fn resolve(config: &ConnectionConfig, env: &Env) -> Result<CredentialConfig> {
    let default_region = regions::default_region(config, env)?;

    if let Some(name) = &config.profile {
        let credential = profile::credential_from_profile(name, env)?;
        return Ok(CredentialConfig {
            credential,
            default_region,
        });
    }

    if let Some(name) = env.first_of(PROFILE_ENV_VARS) {
        let credential = profile::credential_from_profile(&name, env)?;
        return Ok(CredentialConfig {
            credential,
            default_region,
        });
    }

    if let (Some(access_key_id), Some(access_key_secret)) =
        (&config.access_key, &config.secret_key)
    {
        return Ok(CredentialConfig {
            credential: from_keys(
                access_key_id.clone(),
                access_key_secret.clone(),
                config.session_token.clone(),
            ),
            default_region,
        });
    }

    if let (Some(access_key_id), Some(access_key_secret)) = (
        env.first_of(ACCESS_KEY_ID_ENV_VARS),
        env.first_of(ACCESS_KEY_SECRET_ENV_VARS),
    ) {
        return Ok(CredentialConfig {
            credential: from_keys(
                access_key_id,
                access_key_secret,
                env.first_of(SESSION_TOKEN_ENV_VARS),
            ),
            default_region,
        });
    }

    Err(Error::config(
        "either 'access_key' and 'secret_key' or 'profile' must be set in the connection configuration",
    ))
}

/// Session-token presence is the STS discriminant, not a user choice.
fn from_keys(
    access_key_id: String,
    access_key_secret: String,
    session_token: Option<String>,
) -> Credential {
    match session_token.filter(|t| !t.is_empty()) {
        Some(security_token) => Credential::Sts {
            access_key_id,
            access_key_secret,
            security_token,
        },
        None => Credential::AccessKey {
            access_key_id,
            access_key_secret,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_config() -> ConnectionConfig {
        ConnectionConfig {
            access_key: Some("CFG_ID".to_string()),
            secret_key: Some("CFG_SECRET".to_string()),
            ..Default::default()
        }
    }

    fn keys_env() -> Env {
        Env::from_map([
            ("ALIBABACLOUD_ACCESS_KEY_ID", "ENV_ID"),
            ("ALIBABACLOUD_ACCESS_KEY_SECRET", "ENV_SECRET"),
        ])
    }

    #[test]
    fn test_config_keys_win_over_env_keys() {
        let resolved = resolve(&keys_config(), &keys_env()).unwrap();
        assert_eq!(resolved.credential.access_key_id().unwrap(), "CFG_ID");
    }

    #[test]
    fn test_env_keys_as_fallback() {
        let resolved = resolve(&ConnectionConfig::default(), &keys_env()).unwrap();
        assert_eq!(resolved.credential.access_key_id().unwrap(), "ENV_ID");
        assert_eq!(resolved.credential.security_token().unwrap(), None);
    }

    #[test]
    fn test_env_key_synonym_order() {
        let env = Env::from_map([
            ("ALICLOUD_ACCESS_KEY", "GENERIC"),
            ("ALIBABACLOUD_ACCESS_KEY_ID", "BRANDED"),
            ("ALICLOUD_SECRET_KEY", "SECRET"),
        ]);
        let resolved = resolve(&ConnectionConfig::default(), &env).unwrap();
        assert_eq!(resolved.credential.access_key_id().unwrap(), "BRANDED");
    }

    #[test]
    fn test_session_token_discriminates_sts() {
        let config = ConnectionConfig {
            session_token: Some("TOKEN".to_string()),
            ..keys_config()
        };
        let resolved = resolve(&config, &Env::empty()).unwrap();
        assert_eq!(
            resolved.credential.security_token().unwrap(),
            Some("TOKEN")
        );
    }

    #[test]
    fn test_env_session_token() {
        let env = Env::from_map([
            ("ALICLOUD_ACCESS_KEY_ID", "ID"),
            ("ALICLOUD_ACCESS_KEY_SECRET", "SECRET"),
            ("ALICLOUD_SECURITY_TOKEN", "TOKEN"),
        ]);
        let resolved = resolve(&ConnectionConfig::default(), &env).unwrap();
        assert_eq!(
            resolved.credential.security_token().unwrap(),
            Some("TOKEN")
        );
    }

    #[test]
    fn test_no_source_is_fatal_config_error() {
        let err = resolve(&ConnectionConfig::default(), &Env::empty()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let message = err.to_string();
        assert!(message.contains("access_key"));
        assert!(message.contains("profile"));
    }

    #[test]
    fn test_broken_profile_does_not_fall_through() {
        // A named profile is a terminal attempt even though static keys are
        // also configured.
        let config = ConnectionConfig {
            profile: Some("ghost".to_string()),
            ..keys_config()
        };
        let env = Env::from_map([(
            profile::CONFIG_FILE_ENV_VAR,
            "/nonexistent/aliyun-config.json",
        )]);
        assert!(matches!(resolve(&config, &env), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_profile_wins_over_config_keys() {
        // Precedence puts any profile source above static keys; a profile
        // named in the environment that cannot be loaded must fail rather
        // than fall back to the configured keys.
        let env = Env::from_map([
            ("ALIBABACLOUD_PROFILE", "ghost"),
            (profile::CONFIG_FILE_ENV_VAR, "/nonexistent/aliyun-config.json"),
        ]);
        assert!(matches!(resolve(&keys_config(), &env), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_region_attached() {
        let config = ConnectionConfig {
            regions: Some(vec!["eu-central-1".to_string()]),
            ..keys_config()
        };
        let resolved = resolve(&config, &Env::empty()).unwrap();
        assert_eq!(resolved.default_region, "eu-central-1");
    }
}
