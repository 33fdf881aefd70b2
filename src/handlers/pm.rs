use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::meter_reading;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::pm::SupervisorOverride;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assets/:id/meter-readings", post(record_meter_reading))
        .route("/pm/check", post(check_pm_due))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SupervisorOverrideRequest {
    pub supervisor_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MeterReadingRequest {
    pub reading: Decimal,
    pub created_by: Uuid,
    pub supervisor_override: Option<SupervisorOverrideRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeterReadingResponse {
    pub reading: meter_reading::Model,
    pub rollback_detected: bool,
    pub generated_job_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PmCheckRequest {
    pub company_id: Uuid,
    pub asset_id: Option<Uuid>,
    pub actor_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PmCheckResponse {
    pub generated_job_ids: Vec<Uuid>,
}

async fn record_meter_reading(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MeterReadingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .pm
        .record_meter_reading(
            id,
            payload.reading,
            payload.created_by,
            payload.supervisor_override.map(|o| SupervisorOverride {
                supervisor_id: o.supervisor_id,
                reason: o.reason,
            }),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MeterReadingResponse {
            reading: outcome.reading,
            rollback_detected: outcome.rollback_detected,
            generated_job_ids: outcome.generated_job_ids,
        }),
    ))
}

async fn check_pm_due(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PmCheckRequest>,
) -> Result<Json<PmCheckResponse>, ServiceError> {
    let generated_job_ids = state
        .services
        .pm
        .check_pm_due(payload.company_id, payload.asset_id, payload.actor_id)
        .await?;
    Ok(Json(PmCheckResponse { generated_job_ids }))
}
