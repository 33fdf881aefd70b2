use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::job_cost_snapshot;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::snapshots::VerificationReport;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/:id/snapshot", get(get_snapshot))
        .route("/snapshots/:id/verify", get(verify_snapshot))
}

async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<job_cost_snapshot::Model>, ServiceError> {
    Ok(Json(state.services.snapshots.get_for_job(id).await?))
}

async fn verify_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<VerificationReport>, ServiceError> {
    Ok(Json(state.services.snapshots.verify(id).await?))
}
