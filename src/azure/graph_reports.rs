use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::info;
use url::Url;

use super::credentials::acquire_token;
use crate::config::AzureConfig;
use crate::error::AppError;
use crate::table;

/// Graph CSV reports open with this column
const CSV_REPORT_MARKER: &str = "Report refresh date";

/// A report as returned to the caller. Never aggregated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportPayload {
    Csv(CsvReport),
    Json(JsonValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvReport {
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub columns: Vec<String>,
}

/// Check that `endpoint` is an absolute http(s) URL on an allowed host.
pub fn validate_report_url(endpoint: &str, allowed_hosts: &[String]) -> Result<Url, AppError> {
    let url = Url::parse(endpoint.trim())
        .map_err(|e| AppError::InvalidRequest(format!("endpoint is not a valid URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidRequest(format!(
            "endpoint must use http or https, got '{}'",
            url.scheme()
        )));
    }

    let host = url.host_str().unwrap_or_default();
    if !allowed_hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(host)) {
        return Err(AppError::InvalidRequest(format!(
            "endpoint host '{}' is not an allowed report host",
            host
        )));
    }

    Ok(url)
}

pub fn is_csv_report(content_type: &str, body: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/csv")
        || body
            .trim_start_matches('\u{feff}')
            .trim_start()
            .get(..CSV_REPORT_MARKER.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(CSV_REPORT_MARKER))
}

/// Turn a report response body into a payload: CSV becomes rows and
/// columns, anything else must be JSON and is returned as-is.
pub fn parse_report_body(content_type: &str, body: &str) -> Result<ReportPayload, AppError> {
    if is_csv_report(content_type, body) {
        let (columns, rows) = table::csv_to_json_rows(body)
            .map_err(|e| AppError::InternalError(format!("Failed to parse report CSV: {}", e)))?;
        return Ok(ReportPayload::Csv(CsvReport { rows, columns }));
    }

    if body.trim().is_empty() {
        return Ok(ReportPayload::Json(JsonValue::Null));
    }

    serde_json::from_str(body)
        .map(ReportPayload::Json)
        .map_err(|e| AppError::InternalError(format!("Report response is neither CSV nor JSON: {}", e)))
}

/// Fetch a Graph report with an app-only token.
pub async fn fetch_report(
    client: &Client,
    azure: &AzureConfig,
    endpoint: &Url,
) -> Result<ReportPayload, AppError> {
    let creds = azure.client_credentials()?;
    let token = acquire_token(client, azure, &creds, &azure.graph_scope).await?;

    info!(endpoint = %endpoint, "Fetching usage report");

    let request = client
        .get(endpoint.clone())
        .bearer_auth(token.secret())
        .timeout(Duration::from_secs(azure.timeout_seconds));

    let response = super::send("graph_report", request).await?;
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.text().await?;

    parse_report_body(&content_type, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_only() -> Vec<String> {
        vec!["graph.microsoft.com".to_string()]
    }

    #[test]
    fn test_validate_report_url_accepts_graph() {
        let url = validate_report_url(
            "https://graph.microsoft.com/v1.0/reports/getEmailActivityUserDetail(period='D30')",
            &graph_only(),
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("graph.microsoft.com"));
    }

    #[test]
    fn test_validate_report_url_rejects_other_hosts_and_schemes() {
        for endpoint in [
            "https://evil.example.com/v1.0/reports",
            "file:///etc/passwd",
            "not a url",
            "/v1.0/reports/relative",
        ] {
            let err = validate_report_url(endpoint, &graph_only()).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)), "{} accepted", endpoint);
        }
    }

    #[test]
    fn test_is_csv_report() {
        assert!(is_csv_report("text/csv; charset=utf-8", "a,b"));
        assert!(is_csv_report("application/octet-stream", "\u{feff}Report Refresh Date,User\n"));
        assert!(!is_csv_report("application/json", "{\"value\": []}"));
        assert!(!is_csv_report("", ""));
    }

    #[test]
    fn test_parse_csv_report() {
        let body = "Report Refresh Date,User Principal Name,Send Count\n2025-01-31,a@contoso.com,12\n2025-01-31,b@contoso.com,\n";
        let payload = parse_report_body("application/octet-stream", body).unwrap();

        let ReportPayload::Csv(report) = payload else {
            panic!("expected a CSV report");
        };
        assert_eq!(report.columns, vec!["Report Refresh Date", "User Principal Name", "Send Count"]);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0]["Send Count"], 12);
        assert_eq!(report.rows[1]["Send Count"], JsonValue::Null);
    }

    #[test]
    fn test_csv_report_keeps_large_counts_exact() {
        let body = "Report Refresh Date,Send Count,Storage Used (Byte)\n2025-01-31,12,9007199254740993\n";
        let payload = parse_report_body("text/csv", body).unwrap();
        let json = serde_json::to_string(&payload).unwrap();

        assert!(json.contains(r#""Send Count":12,"#), "{}", json);
        assert!(json.contains(r#""Storage Used (Byte)":9007199254740993}"#), "{}", json);
    }

    #[test]
    fn test_parse_json_report_is_pass_through() {
        let body = r#"{"value": [{"id": 1}], "@odata.nextLink": "x"}"#;
        let payload = parse_report_body("application/json", body).unwrap();

        assert_eq!(payload, ReportPayload::Json(serde_json::from_str(body).unwrap()));
    }

    #[test]
    fn test_parse_invalid_report_body() {
        let err = parse_report_body("text/html", "<html></html>").unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn test_csv_report_serializes_rows_and_columns() {
        let payload = parse_report_body("text/csv", "a,b\n1,x\n").unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["columns"], serde_json::json!(["a", "b"]));
        assert_eq!(json["rows"][0]["b"], "x");
    }
}
