use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::job_cost_entry::{self, CostType};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::costing::NewCostEntry;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/:id/costs", post(add_cost).get(list_costs))
        .route("/jobs/:id/parts/issue", post(issue_parts))
        .route("/jobs/:id/parts/return", post(return_parts))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCostRequest {
    pub cost_type: CostType,
    pub amount: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PartsRequest {
    pub line_id: Uuid,
    pub quantity: Decimal,
    pub actor_id: Uuid,
}

async fn add_cost(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCostRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state
        .services
        .costing
        .add_cost(
            id,
            NewCostEntry {
                cost_type: payload.cost_type,
                amount: payload.amount,
                quantity: payload.quantity,
                unit_cost: payload.unit_cost,
                reference_type: payload.reference_type,
                reference_id: payload.reference_id,
                created_by: payload.created_by,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn list_costs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<job_cost_entry::Model>>, ServiceError> {
    Ok(Json(state.services.costing.entries(id).await?))
}

async fn issue_parts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let line = state
        .services
        .costing
        .issue_parts(id, payload.line_id, payload.quantity, payload.actor_id)
        .await?;
    Ok(Json(line))
}

async fn return_parts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let line = state
        .services
        .costing
        .return_parts(id, payload.line_id, payload.quantity, payload.actor_id)
        .await?;
    Ok(Json(line))
}
