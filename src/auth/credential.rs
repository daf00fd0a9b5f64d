//! Credential types
//!
//! The resolved identity used to authenticate every API call. Key-material
//! accessors return `Result` because a credential can be backed by a profile
//! mode whose material cannot be produced locally; each accessor fails with
//! its own attributable error.

use crate::error::{Error, Result};

/// An authentication identity capable of producing key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Plain long-lived access key pair.
    AccessKey {
        access_key_id: String,
        access_key_secret: String,
    },
    /// Short-lived STS credential; discriminated from `AccessKey` purely by
    /// session-token presence at resolution time.
    Sts {
        access_key_id: String,
        access_key_secret: String,
        security_token: String,
    },
    /// A CLI profile whose mode needs a remote exchange (RamRoleArn,
    /// EcsRamRole, ...) to produce key material. Recognized so the failure
    /// surfaces at the accessor that needs the material, not at resolution.
    ProfileRole { profile: String, mode: String },
}

impl Credential {
    pub fn access_key_id(&self) -> Result<&str> {
        match self {
            Credential::AccessKey { access_key_id, .. }
            | Credential::Sts { access_key_id, .. } => Ok(access_key_id),
            Credential::ProfileRole { profile, mode } => Err(Error::config(format!(
                "failed to get access key id: profile {profile} uses unsupported credential mode {mode}"
            ))),
        }
    }

    pub fn access_key_secret(&self) -> Result<&str> {
        match self {
            Credential::AccessKey {
                access_key_secret, ..
            }
            | Credential::Sts {
                access_key_secret, ..
            } => Ok(access_key_secret),
            Credential::ProfileRole { profile, mode } => Err(Error::config(format!(
                "failed to get access key secret: profile {profile} uses unsupported credential mode {mode}"
            ))),
        }
    }

    /// The session token, when this is an STS credential.
    pub fn security_token(&self) -> Result<Option<&str>> {
        match self {
            Credential::AccessKey { .. } => Ok(None),
            Credential::Sts { security_token, .. } => Ok(Some(security_token)),
            Credential::ProfileRole { profile, mode } => Err(Error::config(format!(
                "failed to get security token: profile {profile} uses unsupported credential mode {mode}"
            ))),
        }
    }
}

/// The effective identity for one query execution context. Created once,
/// immutable afterwards, held by the credential cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfig {
    pub credential: Credential,
    pub default_region: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_material() {
        let cred = Credential::AccessKey {
            access_key_id: "AKID".to_string(),
            access_key_secret: "SECRET".to_string(),
        };
        assert_eq!(cred.access_key_id().unwrap(), "AKID");
        assert_eq!(cred.access_key_secret().unwrap(), "SECRET");
        assert_eq!(cred.security_token().unwrap(), None);
    }

    #[test]
    fn test_sts_material() {
        let cred = Credential::Sts {
            access_key_id: "AKID".to_string(),
            access_key_secret: "SECRET".to_string(),
            security_token: "TOKEN".to_string(),
        };
        assert_eq!(cred.security_token().unwrap(), Some("TOKEN"));
    }

    #[test]
    fn test_profile_role_accessors_fail_independently() {
        let cred = Credential::ProfileRole {
            profile: "ops".to_string(),
            mode: "RamRoleArn".to_string(),
        };
        let id_err = cred.access_key_id().unwrap_err().to_string();
        let secret_err = cred.access_key_secret().unwrap_err().to_string();
        let token_err = cred.security_token().unwrap_err().to_string();
        assert!(id_err.contains("access key id"));
        assert!(secret_err.contains("access key secret"));
        assert!(token_err.contains("security token"));
    }
}
