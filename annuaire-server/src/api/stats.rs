//! Directory-wide statistics endpoint.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use log::error;
use serde::Serialize;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_businesses: i64,
    /// Active business count per category slug.
    pub category_counts: BTreeMap<String, i64>,
    /// Completion time of the most recent successful sync, RFC 3339.
    pub last_update: Option<String>,
}

/// `GET /api/stats` — totals plus the last successful sync time.
pub async fn overview(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let store = state.store().await;

    let internal = |err| {
        error!("failed to compute stats: {err}");
        ApiError::internal("Failed to fetch stats")
    };

    let total_businesses = store.count_active_businesses().map_err(internal)?;
    let category_counts = store
        .list_categories_with_counts()
        .map_err(internal)?
        .into_iter()
        .map(|entry| (entry.category.slug, entry.business_count))
        .collect();
    let last_update = store
        .last_successful_sync()
        .map_err(internal)?
        .and_then(|record| record.completed_at)
        .map(|at| at.to_rfc3339());

    Ok(Json(StatsResponse {
        total_businesses,
        category_counts,
        last_update,
    }))
}
