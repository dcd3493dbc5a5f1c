use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    azure::graph_reports::{fetch_report, validate_report_url, ReportPayload},
    error::AppError,
};

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub endpoint: String,
}

/// Handle /m365-report endpoint
///
/// The report is returned as fetched; it is never aggregated.
pub async fn m365_report(
    State(state): State<AppState>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Json<ReportPayload>, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let config = state.config.load_full();
    let url = validate_report_url(&params.endpoint, &config.azure.allowed_report_hosts)?;
    let payload = fetch_report(&state.http_client, &config.azure, &url).await?;

    Ok(Json(payload))
}
