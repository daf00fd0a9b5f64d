//! Generic list/get protocol
//!
//! One listing routine drives every registry table: pick the region, page
//! through the provider API in whichever idiom the table declares, normalize
//! each item, and stream it to the host. The row budget pushes down into the
//! requested page size and stops the flow mid-page when satisfied.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::client::OpenApiClient;
use crate::error::{is_ignorable, log_query_error, Error, Result};
use crate::query::{QueryData, NO_LIMIT};
use crate::retry::{default_retryable, with_retry, API_MAX_RETRIES, API_RETRY_SEED};
use crate::table::registry::{GetDef, Pagination, Scope, TableDef};
use crate::table::transform::{int_at_path, items_at_path, normalize_item, string_at_path, value_at_path};

/// List all rows of a table into the query's row stream.
///
/// Provider errors that the connection (or the table's get config) marks
/// ignorable end the flow quietly; everything else is logged and surfaced.
pub async fn list(data: &QueryData, table: &TableDef) -> Result<()> {
    let region = region_for(data, table)?;
    let client = data.client(&table.service, &region).await?;

    let result = match &table.pagination {
        Pagination::Numbered {
            page_size,
            size_param,
            page_param,
            total_path,
            page_path,
        } => {
            list_numbered(
                data, table, &client, &region, *page_size, size_param, page_param, total_path,
                page_path,
            )
            .await
        }
        Pagination::Token {
            max_results,
            size_param,
            token_param,
            token_path,
            truncated_path,
        } => {
            list_token(
                data,
                table,
                &client,
                &region,
                *max_results,
                size_param,
                token_param,
                token_path,
                truncated_path.as_deref(),
            )
            .await
        }
        Pagination::Exhaustion {
            page_size,
            size_param,
            page_param,
        } => {
            list_exhaustion(data, table, &client, &region, *page_size, size_param, page_param)
                .await
        }
        Pagination::Single => list_single(data, table, &client, &region).await,
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if is_ignorable(&err, &data.connection, &[]) => {
            log_query_error(&format!("{}.list", table.name), &err, &data.connection);
            Ok(())
        }
        Err(err) => {
            log_query_error(&format!("{}.list", table.name), &err, &data.connection);
            Err(err)
        }
    }
}

/// Fetch a single keyed row. `Ok(None)` when the key qual is absent, the
/// resource does not exist, or a not-found code the table declares comes
/// back; the row is normalized exactly like a listed one.
pub async fn get(data: &QueryData, table: &TableDef) -> Result<Option<Value>> {
    let def = match &table.get {
        Some(def) => def,
        None => {
            return Err(Error::config(format!(
                "table {} does not support keyed get",
                table.name
            )))
        }
    };
    let key = match data.quals.equals_string(&def.key_column) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => return Ok(None),
    };

    let region = region_for(data, table)?;
    let client = data.client(&table.service, &region).await?;

    let mut params = base_params(table);
    params.insert(def.request_param.clone(), key);

    let response = match fetch_page(data, table, &client, &params).await {
        Ok(response) => response,
        Err(err) if not_found(&err, def) => {
            debug!(table = %table.name, code = err.code(), "keyed get found nothing");
            return Ok(None);
        }
        Err(err) if is_ignorable(&err, &data.connection, &[]) => {
            log_query_error(&format!("{}.get", table.name), &err, &data.connection);
            return Ok(None);
        }
        Err(err) => {
            log_query_error(&format!("{}.get", table.name), &err, &data.connection);
            return Err(err);
        }
    };

    let item = match value_at_path(&response, &def.response_path) {
        Some(Value::Null) | None => return Ok(None),
        Some(item) => item.clone(),
    };
    Ok(Some(normalize_item(item, table.tag_path.as_deref(), &region)))
}

fn not_found(err: &Error, def: &GetDef) -> bool {
    err.code()
        .is_some_and(|code| def.ignore_not_found.iter().any(|c| c == code))
}

/// Regional tables list the region from the fan-out qual; global tables use
/// the connection's default region for the single flow.
fn region_for(data: &QueryData, table: &TableDef) -> Result<String> {
    match table.scope {
        Scope::Regional => match data.matrix_region() {
            Some(region) => Ok(region.to_string()),
            None => data.default_region(),
        },
        Scope::Global => data.default_region(),
    }
}

fn base_params(table: &TableDef) -> BTreeMap<String, String> {
    table
        .request_params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// The page size to request: the configured size, shrunk to the remaining
/// row budget when a smaller limit was pushed down.
fn effective_size(configured: i64, remaining: u64) -> i64 {
    if remaining == NO_LIMIT {
        return configured;
    }
    configured.min(remaining.min(i64::MAX as u64) as i64).max(1)
}

/// One rate-limited, retried page fetch.
async fn fetch_page(
    data: &QueryData,
    table: &TableDef,
    client: &Arc<OpenApiClient>,
    params: &BTreeMap<String, String>,
) -> Result<Value> {
    data.wait_for_list_rate_limit(&table.service, &table.action)
        .await;
    with_retry(API_MAX_RETRIES, API_RETRY_SEED, default_retryable, || {
        client.invoke(&table.action, &table.version, params)
    })
    .await
}

/// Stream one page's items. Returns false when the row budget is spent and
/// the listing must stop, even with provider pages left.
fn stream_items(data: &QueryData, table: &TableDef, region: &str, response: &Value) -> bool {
    for item in items_at_path(response, &table.response_path) {
        if data.rows_remaining() == 0 {
            return false;
        }
        data.stream_row(normalize_item(item, table.tag_path.as_deref(), region));
    }
    data.rows_remaining() != 0
}

#[allow(clippy::too_many_arguments)]
async fn list_numbered(
    data: &QueryData,
    table: &TableDef,
    client: &Arc<OpenApiClient>,
    region: &str,
    page_size: i64,
    size_param: &str,
    page_param: &str,
    total_path: &str,
    page_path: &str,
) -> Result<()> {
    let mut page: i64 = 1;
    let mut seen: i64 = 0;
    // Offset pagination: the provider derives the page window from
    // page number times page size, so the size must stay constant for the
    // whole listing. The row budget shrinks only the initial request.
    let size = effective_size(page_size, data.rows_remaining());
    loop {
        let mut params = base_params(table);
        params.insert(size_param.to_string(), size.to_string());
        params.insert(page_param.to_string(), page.to_string());

        let response = fetch_page(data, table, client, &params).await?;
        let count = items_at_path(&response, &table.response_path).len() as i64;
        if !stream_items(data, table, region, &response) {
            return Ok(());
        }

        seen += count;
        let total = int_at_path(&response, total_path).unwrap_or(0);
        // An empty page also terminates, whatever the reported total says.
        if seen >= total || count == 0 {
            return Ok(());
        }
        page = int_at_path(&response, page_path).unwrap_or(page) + 1;
    }
}

#[allow(clippy::too_many_arguments)]
async fn list_token(
    data: &QueryData,
    table: &TableDef,
    client: &Arc<OpenApiClient>,
    region: &str,
    max_results: i64,
    size_param: &str,
    token_param: &str,
    token_path: &str,
    truncated_path: Option<&str>,
) -> Result<()> {
    let mut token: Option<String> = None;
    loop {
        let size = effective_size(max_results, data.rows_remaining());
        let mut params = base_params(table);
        params.insert(size_param.to_string(), size.to_string());
        if let Some(token) = &token {
            params.insert(token_param.to_string(), token.clone());
        }

        let response = fetch_page(data, table, client, &params).await?;
        if !stream_items(data, table, region, &response) {
            return Ok(());
        }

        if let Some(path) = truncated_path {
            if !truthy_at_path(&response, path) {
                return Ok(());
            }
        }
        token = string_at_path(&response, token_path);
        if token.is_none() {
            return Ok(());
        }
    }
}

/// Truncation flags arrive as a JSON bool or the strings "true"/"false"
/// depending on the service.
fn truthy_at_path(response: &Value, path: &str) -> bool {
    match value_at_path(response, path) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

async fn list_exhaustion(
    data: &QueryData,
    table: &TableDef,
    client: &Arc<OpenApiClient>,
    region: &str,
    page_size: i64,
    size_param: &str,
    page_param: &str,
) -> Result<()> {
    let mut page: i64 = 1;
    // Fixed across pages, like the numbered mode: the page window is an
    // offset computed from the size.
    let size = effective_size(page_size, data.rows_remaining());
    loop {
        let mut params = base_params(table);
        params.insert(size_param.to_string(), size.to_string());
        params.insert(page_param.to_string(), page.to_string());

        let response = fetch_page(data, table, client, &params).await?;
        if items_at_path(&response, &table.response_path).is_empty() {
            return Ok(());
        }
        if !stream_items(data, table, region, &response) {
            return Ok(());
        }
        page += 1;
    }
}

async fn list_single(
    data: &QueryData,
    table: &TableDef,
    client: &Arc<OpenApiClient>,
    region: &str,
) -> Result<()> {
    let params = base_params(table);
    let response = fetch_page(data, table, client, &params).await?;
    stream_items(data, table, region, &response);
    Ok(())
}
