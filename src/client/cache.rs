//! Service client cache
//!
//! Memoized client handles keyed by `"{service}-{region}"`. The first caller
//! for a key constructs the client, everyone else reuses the same handle for
//! the lifetime of the query execution context. Construction happens outside
//! the map lock; concurrent first callers for one key share a single
//! construction through a per-entry cell.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use super::http::OpenApiClient;
use crate::auth::{CredentialCache, Env};
use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};

type Entry = Arc<OnceCell<Arc<OpenApiClient>>>;

/// Per-context cache of authenticated service clients.
#[derive(Debug, Default)]
pub struct ClientCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The client for a (service, region) pair, constructing it on first
    /// access. Region is mandatory: global services pass the connection's
    /// default region, which discriminates the cache key only.
    pub async fn get(
        &self,
        service: &str,
        region: &str,
        config: &ConnectionConfig,
        env: &Env,
        credentials: &CredentialCache,
    ) -> Result<Arc<OpenApiClient>> {
        if region.is_empty() {
            return Err(Error::config(format!(
                "region must be passed to the {service} service"
            )));
        }

        let key = format!("{service}-{region}");
        let entry = {
            let mut entries = self.entries.lock().await;
            entries.entry(key).or_default().clone()
        };

        let client = entry
            .get_or_try_init(|| async {
                let resolved = credentials.get(config, env).await?;
                let client =
                    OpenApiClient::new(service, region, resolved, config.endpoint.as_deref())?;
                Ok::<_, Error>(Arc::new(client))
            })
            .await?;

        Ok(Arc::clone(client))
    }

    /// Number of distinct clients constructed so far.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_config() -> ConnectionConfig {
        ConnectionConfig {
            access_key: Some("AKID".to_string()),
            secret_key: Some("SECRET".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_repeated_access_returns_identical_handle() {
        let cache = ClientCache::new();
        let credentials = CredentialCache::new();
        let config = keys_config();
        let env = Env::empty();

        let first = cache
            .get("ecs", "cn-hangzhou", &config, &env, &credentials)
            .await
            .unwrap();
        let second = cache
            .get("ecs", "cn-hangzhou", &config, &env, &credentials)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_constructs_once() {
        let cache = ClientCache::new();
        let credentials = CredentialCache::new();
        let config = keys_config();
        let env = Env::empty();

        let (a, b, c) = tokio::join!(
            cache.get("vpc", "us-east-1", &config, &env, &credentials),
            cache.get("vpc", "us-east-1", &config, &env, &credentials),
            cache.get("vpc", "us-east-1", &config, &env, &credentials),
        );
        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_get_distinct_clients() {
        let cache = ClientCache::new();
        let credentials = CredentialCache::new();
        let config = keys_config();
        let env = Env::empty();

        let hangzhou = cache
            .get("ecs", "cn-hangzhou", &config, &env, &credentials)
            .await
            .unwrap();
        let beijing = cache
            .get("ecs", "cn-beijing", &config, &env, &credentials)
            .await
            .unwrap();
        let ram = cache
            .get("ram", "cn-hangzhou", &config, &env, &credentials)
            .await
            .unwrap();

        assert!(!Arc::ptr_eq(&hangzhou, &beijing));
        assert!(!Arc::ptr_eq(&hangzhou, &ram));
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_empty_region_is_config_error() {
        let cache = ClientCache::new();
        let credentials = CredentialCache::new();
        let err = cache
            .get("ecs", "", &keys_config(), &Env::empty(), &credentials)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("ecs"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_construction() {
        let cache = ClientCache::new();
        let credentials = CredentialCache::new();
        let err = cache
            .get(
                "ecs",
                "cn-hangzhou",
                &ConnectionConfig::default(),
                &Env::empty(),
                &credentials,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(cache.is_empty().await);
    }
}
