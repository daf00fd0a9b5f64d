//! Query execution context
//!
//! The seam between the host query engine and table implementations. The
//! host supplies a row sink, a row budget, a rate-limit gate, and pushed-down
//! qualifiers; the plugin side contributes the per-context credential and
//! client caches. Everything a listing routine needs travels through
//! [`QueryData`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{CredentialCache, Env};
use crate::client::{ClientCache, OpenApiClient};
use crate::connection::ConnectionConfig;
use crate::error::Result;
use crate::regions;

/// Row budget sentinel meaning "no limit".
pub const NO_LIMIT: u64 = u64::MAX;

/// Qualifier column carrying the region during matrix fan-out.
pub const MATRIX_KEY_REGION: &str = "region";

/// Receives rows for one listing invocation, in response order.
pub trait RowStream: Send + Sync {
    /// Deliver one row-shaped record.
    fn stream_row(&self, row: Value);

    /// How many rows the caller still wants. Zero signals the listing must
    /// stop immediately, even mid-page; [`NO_LIMIT`] means no limit was
    /// pushed down.
    fn rows_remaining(&self) -> u64;
}

/// Grants permission to issue the next list-page request. May suspend the
/// calling flow until the host allows it.
#[async_trait]
pub trait ListRateLimiter: Send + Sync {
    async fn wait_for_list(&self, service: &str, action: &str);
}

/// Equality qualifiers the caller pushed down (region, name, id, ...).
#[derive(Debug, Clone, Default)]
pub struct QualMap {
    quals: HashMap<String, Value>,
}

impl QualMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.quals.insert(column.to_string(), value.into());
        self
    }

    /// The single equality value for a column. List values (IN clauses)
    /// return `None`: they cannot feed a scalar provider filter.
    pub fn equals_string(&self, column: &str) -> Option<&str> {
        self.quals.get(column).and_then(Value::as_str)
    }

    /// The equality values for a column as a list; a scalar value becomes a
    /// one-element list.
    pub fn equals_string_list(&self, column: &str) -> Option<Vec<String>> {
        match self.quals.get(column)? {
            Value::String(s) => Some(vec![s.clone()]),
            Value::Array(values) => Some(
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// The caches shared by every listing flow within one query execution
/// context. Read-mostly after first population; population is
/// at-most-once-construction.
#[derive(Debug, Default)]
pub struct ConnectionCache {
    pub credentials: CredentialCache,
    pub clients: ClientCache,
}

impl ConnectionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything one listing invocation needs: connection settings, pushed-down
/// qualifiers, the shared caches, and the host collaborators.
pub struct QueryData {
    pub connection: ConnectionConfig,
    pub quals: QualMap,
    env: Env,
    cache: Arc<ConnectionCache>,
    sink: Arc<dyn RowStream>,
    limiter: Arc<dyn ListRateLimiter>,
}

impl QueryData {
    pub fn new(
        connection: ConnectionConfig,
        cache: Arc<ConnectionCache>,
        sink: Arc<dyn RowStream>,
        limiter: Arc<dyn ListRateLimiter>,
    ) -> Self {
        Self {
            connection,
            quals: QualMap::new(),
            env: Env::process(),
            cache,
            sink,
            limiter,
        }
    }

    pub fn with_quals(mut self, quals: QualMap) -> Self {
        self.quals = quals;
        self
    }

    /// Override the environment source; tests pass a fixed map.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// The region this flow fans out over, when the table is regional.
    pub fn matrix_region(&self) -> Option<&str> {
        self.quals.equals_string(MATRIX_KEY_REGION)
    }

    /// The connection's default region (used by global services).
    pub fn default_region(&self) -> Result<String> {
        regions::default_region(&self.connection, &self.env)
    }

    /// The cached client for a (service, region) pair.
    pub async fn client(&self, service: &str, region: &str) -> Result<Arc<OpenApiClient>> {
        self.cache
            .clients
            .get(
                service,
                region,
                &self.connection,
                &self.env,
                &self.cache.credentials,
            )
            .await
    }

    /// Block until the host permits the next list-page request.
    pub async fn wait_for_list_rate_limit(&self, service: &str, action: &str) {
        self.limiter.wait_for_list(service, action).await;
    }

    pub fn stream_row(&self, row: Value) {
        self.sink.stream_row(row);
    }

    pub fn rows_remaining(&self) -> u64 {
        self.sink.rows_remaining()
    }
}
