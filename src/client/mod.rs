//! Service clients
//!
//! Authenticated per-(service, region) API handles and their per-context
//! cache.
//!
//! - [`http`] - The RPC-style client built on reqwest
//! - [`cache`] - At-most-once-construction client memoization

pub mod cache;
pub mod http;

pub use cache::ClientCache;
pub use http::OpenApiClient;
