use axum::{extract::State, response::Html};

use super::AppState;
use crate::error::AppError;

/// Handle / endpoint with the landing page
pub async fn serve_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let path = state.config.load().server.static_dir.join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Landing page unavailable");
            Err(AppError::InternalError("Landing page is not available".to_string()))
        }
    }
}
