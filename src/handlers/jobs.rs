use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::job::{self, JobType};
use crate::entities::job_cost_snapshot;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::jobs::{CreateJobInput, JobAction, TransitionPayload};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/transition", post(transition_job))
        .route("/jobs/:id/close", post(close_job))
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateJobRequest {
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub failure_type_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub job_type: JobType,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub safety_photo_required: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub action: JobAction,
    pub actor_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub safety_photo_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseJobRequest {
    pub actor_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub job: job::Model,
    pub old_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<job_cost_snapshot::Model>,
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .services
        .jobs
        .create_job(CreateJobInput {
            company_id: payload.company_id,
            asset_id: payload.asset_id,
            failure_type_id: payload.failure_type_id,
            title: payload.title,
            job_type: payload.job_type,
            priority: payload.priority,
            safety_photo_required: payload.safety_photo_required,
            created_by: payload.created_by,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<job::Model>, ServiceError> {
    Ok(Json(state.services.jobs.get_job(id).await?))
}

async fn transition_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, ServiceError> {
    let outcome = state
        .services
        .jobs
        .transition(
            id,
            payload.action,
            payload.actor_id,
            TransitionPayload {
                assignee_id: payload.assignee_id,
                safety_photo_url: payload.safety_photo_url,
            },
        )
        .await?;
    Ok(Json(TransitionResponse {
        old_status: outcome.old_status.as_str().to_string(),
        snapshot: outcome.snapshot,
        job: outcome.job,
    }))
}

async fn close_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseJobRequest>,
) -> Result<Json<job_cost_snapshot::Model>, ServiceError> {
    let snapshot = state.services.jobs.close_job(id, payload.actor_id).await?;
    Ok(Json(snapshot))
}
