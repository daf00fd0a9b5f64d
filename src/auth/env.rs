//! Environment lookup abstraction
//!
//! Credential and region resolution consult environment variables as
//! fallback sources. Wrapping the lookup keeps resolution deterministic in
//! tests, which pass a fixed map instead of touching the process state.

use std::collections::HashMap;

/// Source of environment variables.
#[derive(Debug, Clone, Default)]
pub enum Env {
    /// Read from the process environment.
    #[default]
    Process,
    /// Read from a fixed map; used by tests.
    Map(HashMap<String, String>),
}

impl Env {
    pub fn process() -> Self {
        Env::Process
    }

    /// An environment with no variables set.
    pub fn empty() -> Self {
        Env::Map(HashMap::new())
    }

    pub fn from_map<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Env::Map(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Env::Process => std::env::var(key).ok(),
            Env::Map(map) => map.get(key).cloned(),
        }
    }

    /// First non-empty value among `keys`, checked in order.
    pub fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }
}
