use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::downtime_log::{self, DowntimeCategory};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::downtime::{AvailabilityReport, StartDowntimeInput};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/downtime", post(start_downtime))
        .route("/downtime/:id/end", post(end_downtime))
        .route("/assets/:id/availability", get(asset_availability))
        .route("/companies/:id/availability", get(fleet_availability))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartDowntimeRequest {
    pub asset_id: Uuid,
    pub job_id: Option<Uuid>,
    pub category: DowntimeCategory,
    pub opportunity_cost_per_hour: Option<Decimal>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityParams {
    pub year: i32,
    pub month: u32,
}

async fn start_downtime(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartDowntimeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let log = state
        .services
        .downtime
        .start(StartDowntimeInput {
            asset_id: payload.asset_id,
            job_id: payload.job_id,
            category: payload.category,
            opportunity_cost_per_hour: payload.opportunity_cost_per_hour,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn end_downtime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<downtime_log::Model>, ServiceError> {
    Ok(Json(state.services.downtime.end(id).await?))
}

async fn asset_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<AvailabilityReport>, ServiceError> {
    Ok(Json(
        state
            .services
            .downtime
            .availability(id, params.year, params.month)
            .await?,
    ))
}

async fn fleet_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<AvailabilityReport>>, ServiceError> {
    Ok(Json(
        state
            .services
            .downtime
            .fleet_availability(id, params.year, params.month)
            .await?,
    ))
}
