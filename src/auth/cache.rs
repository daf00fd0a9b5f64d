//! Credential cache
//!
//! One resolution per query execution context: concurrent first callers
//! observe a single in-flight resolution and share its result. A failed
//! resolution is not cached; the next access re-attempts, so a transient
//! profile-file or STS hiccup does not poison the rest of the query.

use tokio::sync::OnceCell;

use super::credential::CredentialConfig;
use super::env::Env;
use super::resolver;
use crate::connection::ConnectionConfig;
use crate::error::Result;

/// Single-flight memoized credential resolution, owned by the per-context
/// connection cache.
#[derive(Debug, Default)]
pub struct CredentialCache {
    cell: OnceCell<CredentialConfig>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved credential configuration, resolving on first access.
    pub async fn get(&self, config: &ConnectionConfig, env: &Env) -> Result<&CredentialConfig> {
        self.cell
            .get_or_try_init(|| async { resolver::resolve(config, env) })
            .await
    }
}
