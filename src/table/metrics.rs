//! CloudMonitor metric statistics
//!
//! `DescribeMetricList` is the flakiest provider surface: besides ordinary
//! throttling it sometimes answers 200 with an empty `Datapoints` and
//! `Success != true`. Both retry through the fibonacci policy; a genuinely
//! empty window streams nothing.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::error::{log_query_error, Error, Result};
use crate::query::QueryData;
use crate::retry::{default_retryable, with_retry, API_MAX_RETRIES, API_RETRY_SEED};

const CMS_SERVICE: &str = "cms";
const CMS_API_VERSION: &str = "2019-01-01";
const ACTION: &str = "DescribeMetricList";

/// Statistic granularity; selects both the aggregation period and how far
/// back the query window opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Hourly,
    FiveMinutes,
}

impl Granularity {
    /// Aggregation period in seconds, as the provider expects it.
    pub fn period_seconds(self) -> i64 {
        match self {
            Granularity::Daily => 86_400,
            Granularity::Hourly => 3_600,
            Granularity::FiveMinutes => 300,
        }
    }

    /// Days of history to request.
    fn window_days(self) -> i64 {
        match self {
            Granularity::Daily | Granularity::Hourly => 30,
            Granularity::FiveMinutes => 5,
        }
    }

    fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.window_days())
    }
}

fn format_window(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Millisecond datapoint timestamps become RFC3339.
fn format_timestamp(millis: f64) -> Option<String> {
    let secs = (millis / 1000.0).floor() as i64;
    DateTime::<Utc>::from_timestamp(secs, 0).map(format_window)
}

/// Flatten the embedded datapoint JSON string into row values. The provider
/// keys each point by the dimension name plus Average/Maximum/Minimum and a
/// millisecond `timestamp`.
fn metric_rows(
    datapoints: &str,
    namespace: &str,
    metric_name: &str,
    dimension_name: &str,
) -> Result<Vec<Value>> {
    let points: Vec<Map<String, Value>> = serde_json::from_str(datapoints)?;
    let rows = points
        .iter()
        .map(|point| {
            json!({
                "dimension_name": dimension_name,
                "dimension_value": point.get(dimension_name).cloned().unwrap_or(Value::Null),
                "namespace": namespace,
                "metric_name": metric_name,
                "average": point.get("Average").cloned().unwrap_or(Value::Null),
                "maximum": point.get("Maximum").cloned().unwrap_or(Value::Null),
                "minimum": point.get("Minimum").cloned().unwrap_or(Value::Null),
                "timestamp": point
                    .get("timestamp")
                    .and_then(Value::as_f64)
                    .and_then(format_timestamp),
            })
        })
        .collect();
    Ok(rows)
}

/// Stream metric statistics for one (namespace, metric, dimension) triple
/// over the granularity's window, following the response cursor until the
/// provider runs out of pages.
pub async fn list_metric_statistics(
    data: &QueryData,
    granularity: Granularity,
    namespace: &str,
    metric_name: &str,
    dimension_name: &str,
    dimension_value: &str,
) -> Result<()> {
    let region = data.default_region()?;
    let client = data.client(CMS_SERVICE, &region).await?;

    let now = Utc::now();
    let mut params = BTreeMap::new();
    params.insert("Namespace".to_string(), namespace.to_string());
    params.insert("MetricName".to_string(), metric_name.to_string());
    params.insert(
        "Dimensions".to_string(),
        json!([{ dimension_name: dimension_value }]).to_string(),
    );
    params.insert(
        "StartTime".to_string(),
        format_window(granularity.window_start(now)),
    );
    params.insert("EndTime".to_string(), format_window(now));
    params.insert(
        "Period".to_string(),
        granularity.period_seconds().to_string(),
    );

    loop {
        data.wait_for_list_rate_limit(CMS_SERVICE, ACTION).await;
        let response = with_retry(API_MAX_RETRIES, API_RETRY_SEED, default_retryable, || {
            let params = params.clone();
            let client = client.clone();
            async move {
                let response = client.invoke(ACTION, CMS_API_VERSION, &params).await?;
                let datapoints = response
                    .get("Datapoints")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let success = response.get("Success").and_then(Value::as_bool);
                // Anomalous 200: no datapoints and the body says it failed.
                // A retry usually comes back with the data.
                if datapoints.is_empty() && success != Some(true) {
                    return Err(Error::EmptyResponse(format!(
                        "{ACTION} answered without datapoints for {namespace}/{metric_name}"
                    )));
                }
                Ok(response)
            }
        })
        .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                log_query_error("metric_statistics.list", &err, &data.connection);
                return Err(err);
            }
        };

        let datapoints = response
            .get("Datapoints")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if datapoints.is_empty() {
            return Ok(());
        }
        for row in metric_rows(datapoints, namespace, metric_name, dimension_name)? {
            if data.rows_remaining() == 0 {
                return Ok(());
            }
            data.stream_row(row);
        }

        match response.get("NextToken").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                params.insert("NextToken".to_string(), token.to_string());
            }
            _ => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_by_granularity() {
        assert_eq!(Granularity::Daily.period_seconds(), 86_400);
        assert_eq!(Granularity::Hourly.period_seconds(), 3_600);
        assert_eq!(Granularity::FiveMinutes.period_seconds(), 300);
    }

    #[test]
    fn test_window_days() {
        let now = Utc::now();
        assert_eq!(now - Granularity::Daily.window_start(now), Duration::days(30));
        assert_eq!(now - Granularity::Hourly.window_start(now), Duration::days(30));
        assert_eq!(
            now - Granularity::FiveMinutes.window_start(now),
            Duration::days(5)
        );
    }

    #[test]
    fn test_format_timestamp_is_rfc3339() {
        assert_eq!(
            format_timestamp(1_700_000_000_000.0).unwrap(),
            "2023-11-14T22:13:20Z"
        );
    }

    #[test]
    fn test_metric_rows_flatten_the_embedded_json() {
        let datapoints = r#"[
            {"instanceId": "i-abc", "Average": 1.5, "Maximum": 3.0,
             "Minimum": 0.5, "timestamp": 1700000000000}
        ]"#;
        let rows = metric_rows(datapoints, "acs_ecs_dashboard", "CPUUtilization", "instanceId")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["dimension_value"], "i-abc");
        assert_eq!(rows[0]["average"], 1.5);
        assert_eq!(rows[0]["timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_metric_rows_reject_garbage() {
        assert!(metric_rows("not json", "ns", "m", "d").is_err());
    }
}
