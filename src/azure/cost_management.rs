use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::credentials::{acquire_token, AccessToken};
use crate::config::AzureConfig;
use crate::error::AppError;
use crate::table::{Table, TableError, Value};

/// Upper bound on `nextLink` pages followed for one query
const MAX_PAGES: usize = 50;

/// Date range for a daily cost query, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CostQuery {
    /// Parse ISO dates (`YYYY-MM-DD`, or an RFC 3339 timestamp whose date is used).
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self, AppError> {
        let start_date = parse_iso_date("start_date", start_date)?;
        let end_date = parse_iso_date("end_date", end_date)?;

        if end_date < start_date {
            return Err(AppError::InvalidRequest(format!(
                "end_date ({}) is before start_date ({})",
                end_date, start_date
            )));
        }

        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Request body for the Cost Management query API
    pub fn body(&self) -> JsonValue {
        json!({
            "type": "Usage",
            "timeframe": "Custom",
            "timePeriod": {
                "from": format!("{}T00:00:00Z", self.start_date.format("%Y-%m-%d")),
                "to": format!("{}T23:59:59Z", self.end_date.format("%Y-%m-%d")),
            },
            "dataset": {
                "granularity": "Daily",
                "aggregation": {
                    "totalCost": { "name": "PreTaxCost", "function": "Sum" }
                }
            }
        })
    }
}

fn parse_iso_date(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive()))
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "{} must be an ISO date (YYYY-MM-DD), got '{}'",
                name, raw
            ))
        })
}

pub fn query_url(azure: &AzureConfig, subscription_id: &str) -> String {
    format!(
        "{}/subscriptions/{}/providers/Microsoft.CostManagement/query?api-version={}",
        azure.management_host.trim_end_matches('/'),
        subscription_id,
        azure.cost_api_version
    )
}

/// One page of a query response
#[derive(Debug, Default, PartialEq)]
pub struct QueryPage {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub next_link: Option<String>,
}

/// Pull columns, rows and the continuation link out of a query response.
///
/// Missing `properties`, `columns` or `rows` read as empty.
pub fn parse_query_page(body: &JsonValue) -> QueryPage {
    let Some(props) = body.get("properties") else {
        return QueryPage::default();
    };

    let columns = props
        .get("columns")
        .and_then(JsonValue::as_array)
        .map(|cols| {
            cols.iter()
                .enumerate()
                .map(|(idx, col)| {
                    col.get("name")
                        .and_then(JsonValue::as_str)
                        .map(String::from)
                        .unwrap_or_else(|| format!("Unnamed: {}", idx))
                })
                .collect()
        })
        .unwrap_or_default();

    let rows = props
        .get("rows")
        .and_then(JsonValue::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(JsonValue::as_array)
                .map(|cells| cells.iter().map(Value::from_json).collect())
                .collect()
        })
        .unwrap_or_default();

    let next_link = props
        .get("nextLink")
        .and_then(JsonValue::as_str)
        .filter(|link| !link.is_empty())
        .map(String::from);

    QueryPage {
        columns,
        rows,
        next_link,
    }
}

/// Fetch daily costs for `query` and shape them into a [`Table`].
///
/// `subscription_override` wins over the configured subscription id.
pub async fn fetch_cost_table(
    client: &Client,
    azure: &AzureConfig,
    query: &CostQuery,
    subscription_override: Option<&str>,
) -> Result<Table, AppError> {
    let (creds, subscription_id) = azure.subscription_credentials(subscription_override)?;
    let token = acquire_token(client, azure, &creds, &azure.management_scope).await?;

    info!(
        subscription_id = %subscription_id,
        start_date = %query.start_date,
        end_date = %query.end_date,
        "Querying Cost Management"
    );

    let body = query.body();
    let mut url = query_url(azure, &subscription_id);
    let mut table = Table::default();

    for page_number in 1..=MAX_PAGES {
        let page = fetch_page(client, azure, &token, &url, &body).await?;
        debug!(page = page_number, rows = page.rows.len(), "Received cost query page");

        // Columns come from the first page that has them; later pages repeat them.
        if table.columns().is_empty() {
            table = Table::new(page.columns);
        }

        if table.columns().is_empty() {
            if !page.rows.is_empty() {
                warn!(
                    page = page_number,
                    rows = page.rows.len(),
                    "Cost query page has rows but no columns; ignoring them"
                );
            }
        } else {
            for row in page.rows {
                table.push_row(row).map_err(unexpected_shape)?;
            }
        }

        match page.next_link {
            Some(next) if page_number < MAX_PAGES => url = next,
            Some(_) => {
                warn!(max_pages = MAX_PAGES, "Cost query still paginated; stopping early");
                break;
            }
            None => break,
        }
    }

    Ok(table)
}

async fn fetch_page(
    client: &Client,
    azure: &AzureConfig,
    token: &AccessToken,
    url: &str,
    body: &JsonValue,
) -> Result<QueryPage, AppError> {
    let request = client
        .post(url)
        .bearer_auth(token.secret())
        .timeout(Duration::from_secs(azure.timeout_seconds))
        .json(body);

    let response = super::send("cost_query", request).await?;
    let body: JsonValue = response.json().await?;

    Ok(parse_query_page(&body))
}

fn unexpected_shape(err: TableError) -> AppError {
    AppError::InternalError(format!("Unexpected cost query response: {}", err))
}
