//! Tables: the registry of definitions and the generic protocol that lists
//! them, plus the two hand-written flows (metric statistics and the RAM
//! credential report) whose provider surfaces do not fit the registry.

pub mod credential_report;
pub mod list;
pub mod metrics;
pub mod registry;
pub mod transform;

pub use list::{get, list};
pub use registry::{get_table, registry, table_names, ColumnDef, Pagination, Scope, TableDef};
