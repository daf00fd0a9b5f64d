//! Credential resolution and caching
//!
//! Determines the effective identity used to authenticate all API calls and
//! memoizes it per query execution context.
//!
//! # Module Structure
//!
//! - [`credential`] - Credential types and key-material accessors
//! - [`resolver`] - Multi-source precedence resolution
//! - [`profile`] - aliyun CLI profile file parsing
//! - [`cache`] - Single-flight per-context memoization
//! - [`env`] - Injectable environment lookup
//!
//! # Precedence
//!
//! profile (config) > profile (env) > keys (config) > keys (env) > fatal
//! configuration error. Session-token presence discriminates STS from plain
//! access-key credentials.

pub mod cache;
pub mod credential;
pub mod env;
pub mod profile;
pub mod resolver;

pub use cache::CredentialCache;
pub use credential::{Credential, CredentialConfig};
pub use env::Env;
pub use resolver::resolve;
