//! Operator view of the reconciliation log.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use store::{ReconciliationLog, ReconciliationTask, Store};

use super::AppState;
use crate::error::ApiError;

/// GET /reconciliation-tasks: every logged discrepancy, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ReconciliationTask>>, ApiError> {
    Ok(Json(state.store.tasks().await?))
}
