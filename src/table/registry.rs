//! Table registry - load table definitions from embedded JSON
//!
//! Table definitions (service, action, response shape, pagination idiom,
//! columns) are data, not code: they ship as JSON compiled into the binary
//! and feed the generic list/get protocol in [`super::list`]. Adding a
//! mechanical table needs no new Rust.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

/// Embedded table definition files (compiled into the binary)
const TABLE_FILES: &[&str] = &[
    include_str!("defs/ecs.json"),
    include_str!("defs/vpc.json"),
    include_str!("defs/ram.json"),
    include_str!("defs/kms.json"),
    include_str!("defs/cs.json"),
    include_str!("defs/cms.json"),
];

/// Column exposed to the host's schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Dotted path into the normalized row.
    pub json_path: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Whether a table fans out per region or talks to a global endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One listing flow per region; the region arrives as a matrix qual.
    Regional,
    /// Single flow against the connection's default region.
    Global,
}

/// The pagination idiom of the provider API backing a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pagination {
    /// Page number plus a provider-reported total count.
    Numbered {
        page_size: i64,
        #[serde(default = "default_size_param")]
        size_param: String,
        #[serde(default = "default_page_param")]
        page_param: String,
        #[serde(default = "default_total_path")]
        total_path: String,
        #[serde(default = "default_page_path")]
        page_path: String,
    },
    /// Opaque cursor. Exhausted when the response token is empty, or when
    /// `truncated_path` is present and reports false (Marker/IsTruncated
    /// style).
    Token {
        max_results: i64,
        #[serde(default = "default_max_results_param")]
        size_param: String,
        #[serde(default = "default_token_param")]
        token_param: String,
        #[serde(default = "default_token_path")]
        token_path: String,
        #[serde(default)]
        truncated_path: Option<String>,
    },
    /// No total count: the page number advances until a page comes back
    /// empty.
    Exhaustion {
        page_size: i64,
        #[serde(default = "default_size_param")]
        size_param: String,
        #[serde(default = "default_page_param")]
        page_param: String,
    },
    /// One fetch, no pagination.
    Single,
}

fn default_size_param() -> String {
    "PageSize".to_string()
}
fn default_page_param() -> String {
    "PageNumber".to_string()
}
fn default_total_path() -> String {
    "TotalCount".to_string()
}
fn default_page_path() -> String {
    "PageNumber".to_string()
}
fn default_max_results_param() -> String {
    "MaxResults".to_string()
}
fn default_token_param() -> String {
    "NextToken".to_string()
}
fn default_token_path() -> String {
    "NextToken".to_string()
}

/// Keyed single-resource lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GetDef {
    /// Qualifier column carrying the key.
    pub key_column: String,
    /// Request parameter the key feeds.
    pub request_param: String,
    /// Path to the (single or singleton-array) result.
    pub response_path: String,
    /// Error codes meaning "not there", suppressed instead of surfaced.
    #[serde(default)]
    pub ignore_not_found: Vec<String>,
}

/// One table definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub description: String,
    pub service: String,
    pub action: String,
    /// Provider API version, e.g. "2014-05-26".
    pub version: String,
    /// Dotted path to the items array in the response envelope.
    pub response_path: String,
    pub scope: Scope,
    pub pagination: Pagination,
    /// Static request parameters sent with every page.
    #[serde(default)]
    pub request_params: HashMap<String, String>,
    /// Path to the provider tag array, when the resource is taggable.
    #[serde(default)]
    pub tag_path: Option<String>,
    #[serde(default)]
    pub get: Option<GetDef>,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    tables: Vec<TableDef>,
}

static REGISTRY: OnceLock<HashMap<String, TableDef>> = OnceLock::new();

/// The table registry, loaded from embedded JSON on first access.
pub fn registry() -> &'static HashMap<String, TableDef> {
    REGISTRY.get_or_init(|| {
        let mut tables = HashMap::new();
        for content in TABLE_FILES {
            let file: TableFile = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("failed to parse embedded table JSON: {e}"));
            for table in file.tables {
                tables.insert(table.name.clone(), table);
            }
        }
        tables
    })
}

/// Look up a table definition by name.
pub fn get_table(name: &str) -> Option<&'static TableDef> {
    registry().get(name)
}

/// All table names.
pub fn table_names() -> Vec<&'static str> {
    registry().keys().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads() {
        assert!(!registry().is_empty());
    }

    #[test]
    fn test_key_pair_table() {
        let table = get_table("alicloud_ecs_key_pair").expect("key pair table");
        assert_eq!(table.service, "ecs");
        assert_eq!(table.action, "DescribeKeyPairs");
        assert_eq!(table.scope, Scope::Regional);
        assert!(matches!(table.pagination, Pagination::Numbered { .. }));
        assert!(table.get.is_some());
    }

    #[test]
    fn test_ram_user_uses_marker_cursor() {
        let table = get_table("alicloud_ram_user").expect("ram user table");
        assert_eq!(table.scope, Scope::Global);
        match &table.pagination {
            Pagination::Token {
                token_param,
                truncated_path,
                ..
            } => {
                assert_eq!(token_param, "Marker");
                assert_eq!(truncated_path.as_deref(), Some("IsTruncated"));
            }
            other => panic!("expected marker cursor, got {other:?}"),
        }
    }

    #[test]
    fn test_every_table_has_columns() {
        for (name, table) in registry() {
            assert!(!table.columns.is_empty(), "table {name} has no columns");
            assert!(!table.version.is_empty(), "table {name} has no API version");
        }
    }
}
