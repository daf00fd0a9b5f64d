//! aliyun CLI profile file
//!
//! Profile-based credentials come from the CLI configuration at
//! `~/.aliyun/config.json` (overridable via `ALIBABA_CLOUD_CONFIG_FILE`):
//! a `current` pointer plus a `profiles` array, each entry carrying a mode
//! and the material for that mode.

use std::path::PathBuf;

use serde::Deserialize;

use super::credential::Credential;
use super::env::Env;
use crate::error::{Error, Result};

/// Environment override for the CLI configuration file location.
pub const CONFIG_FILE_ENV_VAR: &str = "ALIBABA_CLOUD_CONFIG_FILE";

#[derive(Debug, Deserialize)]
struct CliConfig {
    #[serde(default)]
    profiles: Vec<CliProfile>,
}

#[derive(Debug, Deserialize)]
struct CliProfile {
    name: String,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    access_key_id: String,
    #[serde(default)]
    access_key_secret: String,
    #[serde(default)]
    sts_token: String,
}

/// Location of the CLI configuration file.
pub fn config_file_path(env: &Env) -> Option<PathBuf> {
    if let Some(path) = env.get(CONFIG_FILE_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir().map(|home| home.join(".aliyun").join("config.json"))
}

/// Build a credential from the named CLI profile.
///
/// A missing file, missing profile, or incomplete key material is a
/// configuration error; the one exception is a profile whose mode defers
/// material production (role-based modes), which resolves to a credential
/// whose accessors fail attributably instead.
pub fn credential_from_profile(name: &str, env: &Env) -> Result<Credential> {
    let path = config_file_path(env).ok_or_else(|| {
        Error::config("could not determine the aliyun CLI config file location")
    })?;

    let content = std::fs::read_to_string(&path).map_err(|err| {
        Error::config(format!(
            "failed to read aliyun CLI config {}: {err}",
            path.display()
        ))
    })?;

    let config: CliConfig = serde_json::from_str(&content).map_err(|err| {
        Error::config(format!(
            "invalid aliyun CLI config {}: {err}",
            path.display()
        ))
    })?;

    let profile = config
        .profiles
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| {
            Error::config(format!(
                "profile {name} not found in {}",
                path.display()
            ))
        })?;

    credential_from_entry(profile)
}

fn credential_from_entry(profile: &CliProfile) -> Result<Credential> {
    match profile.mode.as_str() {
        "AK" => {
            if profile.access_key_id.is_empty() || profile.access_key_secret.is_empty() {
                return Err(Error::config(format!(
                    "profile {} is missing access_key_id or access_key_secret",
                    profile.name
                )));
            }
            Ok(Credential::AccessKey {
                access_key_id: profile.access_key_id.clone(),
                access_key_secret: profile.access_key_secret.clone(),
            })
        }
        "StsToken" => {
            if profile.access_key_id.is_empty()
                || profile.access_key_secret.is_empty()
                || profile.sts_token.is_empty()
            {
                return Err(Error::config(format!(
                    "profile {} is missing STS key material",
                    profile.name
                )));
            }
            Ok(Credential::Sts {
                access_key_id: profile.access_key_id.clone(),
                access_key_secret: profile.access_key_secret.clone(),
                security_token: profile.sts_token.clone(),
            })
        }
        mode => Ok(Credential::ProfileRole {
            profile: profile.name.clone(),
            mode: mode.to_string(),
        }),
    }
}
