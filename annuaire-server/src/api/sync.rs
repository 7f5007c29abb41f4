//! Administrative sync endpoints: trigger a run, inspect an audit row.

use axum::Json;
use axum::extract::{Path, State};
use log::error;
use serde::{Deserialize, Serialize};

use annuaire_core::SyncStatus;
use annuaire_data::{DEFAULT_SYNC_KIND, run_sync};

use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Run kind, `"full"` when absent.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTriggered {
    pub sync_id: i64,
    pub status: SyncStatus,
    pub businesses_added: u64,
    pub businesses_updated: u64,
}

/// `POST /api/admin/sync` — run one synchronous sync against the source.
///
/// The run executes inline in the request; the response carries the final
/// counts. Failures are recorded in the audit log by the orchestrator and
/// surface here as a 500 with the failure message.
pub async fn trigger(
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncTriggered>, ApiError> {
    let kind = body
        .and_then(|Json(request)| request.kind)
        .unwrap_or_else(|| DEFAULT_SYNC_KIND.to_owned());

    let mut store = state.store().await;
    let report = run_sync(&mut store, state.source(), &kind).map_err(|err| {
        error!("sync run failed: {err}");
        ApiError::internal_with_message("Sync failed", err.to_string())
    })?;

    Ok(Json(SyncTriggered {
        sync_id: report.sync_id,
        status: SyncStatus::Success,
        businesses_added: report.added,
        businesses_updated: report.updated,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogView {
    pub id: i64,
    pub status: SyncStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub businesses_added: i64,
    pub businesses_updated: i64,
    pub businesses_removed: i64,
    pub error_message: Option<String>,
}

/// `GET /api/admin/sync/{id}` — one audit row with RFC 3339 timestamps.
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SyncLogView>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid sync ID"))?;

    let record = {
        let store = state.store().await;
        store.find_sync_log(id).map_err(|err| {
            error!("failed to load sync log {id}: {err}");
            ApiError::internal("Failed to fetch sync log")
        })?
    };

    let Some(record) = record else {
        return Err(ApiError::not_found("Sync log not found"));
    };

    Ok(Json(SyncLogView {
        id: record.id,
        status: record.status,
        started_at: record.started_at.to_rfc3339(),
        completed_at: record.completed_at.map(|at| at.to_rfc3339()),
        businesses_added: record.businesses_added,
        businesses_updated: record.businesses_updated,
        businesses_removed: record.businesses_removed,
        error_message: record.error_message,
    }))
}
