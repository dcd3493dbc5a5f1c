use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    aggregator::{self, AggregateOptions, AggregationResult},
    azure::cost_management::{fetch_cost_table, CostQuery},
    error::AppError,
    metrics,
};

#[derive(Debug, Deserialize)]
pub struct CostParams {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

/// Handle /azure-costs endpoint
///
/// Fetches daily costs for the range and aggregates them without a sample.
pub async fn azure_costs(
    State(state): State<AppState>,
    params: Result<Query<CostParams>, QueryRejection>,
) -> Result<Json<AggregationResult>, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let query = CostQuery::parse(&params.start_date, &params.end_date)?;

    // Held across awaits, so take an owned snapshot.
    let config = state.config.load_full();
    let table = fetch_cost_table(
        &state.http_client,
        &config.azure,
        &query,
        params.subscription_id.as_deref(),
    )
    .await?;

    let result = aggregator::aggregate(&table, &AggregateOptions::remote())?;
    metrics::record_aggregation("cost_management", &result.stats);

    tracing::info!(
        rows = table.len(),
        months = result.monthly.len(),
        dropped_invalid_date = result.stats.dropped_invalid_date,
        "Cost query aggregated"
    );

    Ok(Json(result))
}
