//! RAM credential report
//!
//! The report is generated out of band: a first `GetCredentialReport` may
//! answer with an expired/missing-report code, in which case we trigger
//! `GenerateCredentialReport` and long-poll until the new report is ready
//! (up to roughly a minute of fibonacci backoff). The payload itself is a
//! base64-encoded CSV, one record per RAM identity.

use std::collections::BTreeMap;

use base64::prelude::{Engine, BASE64_STANDARD};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{log_query_error, Result};
use crate::query::QueryData;
use crate::retry::{with_retry, REPORT_POLL_MAX_RETRIES, REPORT_POLL_SEED};

const IMS_SERVICE: &str = "ims";
const IMS_API_VERSION: &str = "2019-08-15";

/// Codes meaning the report is stale or was never generated; regeneration
/// fixes them.
const REGENERATE_CODES: &[&str] = &[
    "Expired.CredentialReport",
    "EntityNotExist.Report",
    "ReportNotGenerated",
];

/// Decode the base64 CSV payload into one row-shaped value per record,
/// keyed by the report's own header names, with the generation time
/// attached to every row.
fn report_rows(content: &str, generated_time: Option<&str>) -> Result<Vec<Value>> {
    let decoded = BASE64_STANDARD.decode(content)?;
    let mut reader = csv::Reader::from_reader(decoded.as_slice());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        if let Some(generated_time) = generated_time {
            row.insert(
                "generated_time".to_string(),
                Value::String(generated_time.to_string()),
            );
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// Stream the account's credential report, generating a fresh one when the
/// provider says the current report is missing or expired.
pub async fn list_credential_report(data: &QueryData) -> Result<()> {
    let region = data.default_region()?;
    let client = data.client(IMS_SERVICE, &region).await?;
    let params = BTreeMap::new();

    data.wait_for_list_rate_limit(IMS_SERVICE, "GetCredentialReport")
        .await;
    let response = match client
        .invoke("GetCredentialReport", IMS_API_VERSION, &params)
        .await
    {
        Ok(response) => response,
        Err(err)
            if err
                .code()
                .is_some_and(|code| REGENERATE_CODES.contains(&code)) =>
        {
            debug!(code = err.code(), "credential report expired or missing, generating a new one");
            client
                .invoke("GenerateCredentialReport", IMS_API_VERSION, &params)
                .await?;

            // Generation is asynchronous on the provider side; poll until the
            // report comes back, treating every failure as retryable.
            with_retry(REPORT_POLL_MAX_RETRIES, REPORT_POLL_SEED, |_| true, || {
                client.invoke("GetCredentialReport", IMS_API_VERSION, &params)
            })
            .await?
        }
        Err(err) => {
            log_query_error("credential_report.list", &err, &data.connection);
            return Err(err);
        }
    };

    let content = match response.get("Content").and_then(Value::as_str) {
        Some(content) if !content.is_empty() => content,
        _ => return Ok(()),
    };
    let generated_time = response.get("GeneratedTime").and_then(Value::as_str);

    for row in report_rows(content, generated_time)? {
        if data.rows_remaining() == 0 {
            return Ok(());
        }
        data.stream_row(row);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(csv_text: &str) -> String {
        BASE64_STANDARD.encode(csv_text)
    }

    #[test]
    fn test_report_rows_decode_and_carry_generated_time() {
        let content = encode(
            "user,password_exist,mfa_active\n\
             alice,true,true\n\
             bob,false,false\n",
        );
        let rows = report_rows(&content, Some("2026-08-01T00:00:00Z")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["user"], "alice");
        assert_eq!(rows[0]["mfa_active"], "true");
        assert_eq!(rows[1]["user"], "bob");
        assert_eq!(rows[1]["generated_time"], "2026-08-01T00:00:00Z");
    }

    #[test]
    fn test_report_rows_reject_bad_base64() {
        assert!(report_rows("not base64!!!", None).is_err());
    }
}
