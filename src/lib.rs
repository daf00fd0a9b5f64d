//! Alibaba Cloud table plugin core.
//!
//! The building blocks a query-engine host needs to expose Alibaba Cloud
//! inventory as tables: credential resolution with per-context caching, a
//! keyed OpenAPI client cache, a retry policy tuned to the provider's
//! throttling behavior, an ignorable-error classifier, and a generic
//! pagination/streaming protocol driven by an embedded table registry.
//!
//! The host supplies connection configuration, pushed-down qualifiers, a row
//! sink, and a rate-limit gate through [`query::QueryData`]; everything else
//! lives here.

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod query;
pub mod regions;
pub mod retry;
pub mod table;

pub use connection::ConnectionConfig;
pub use error::{Error, Result};
pub use query::{ConnectionCache, ListRateLimiter, QualMap, QueryData, RowStream, NO_LIMIT};
