//! Azure billing and Microsoft Graph report clients
//!
//! Both remote pathways authenticate with the client-credential flow
//! ([`credentials`]). The Cost Management query ([`cost_management`]) yields
//! a [`Table`](crate::table::Table) for the aggregator; Graph reports
//! ([`graph_reports`]) are passed through unaggregated.

pub mod cost_management;
pub mod credentials;
pub mod graph_reports;

use reqwest::{RequestBuilder, Response};
use std::time::Instant;
use tracing::warn;

use crate::{error::AppError, metrics};

/// Send `request`, record it under `target`, and turn non-success statuses
/// into [`AppError::UpstreamError`].
async fn send(target: &'static str, request: RequestBuilder) -> Result<Response, AppError> {
    let started = Instant::now();

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            metrics::record_upstream(target, "error", started.elapsed());
            warn!(target_api = target, error = %e, "Upstream request failed");
            return Err(e.into());
        }
    };

    let status = response.status();
    metrics::record_upstream(target, status.as_str(), started.elapsed());

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(target_api = target, status = %status, "Upstream returned an error status");
        return Err(AppError::UpstreamError { status, message });
    }

    Ok(response)
}
