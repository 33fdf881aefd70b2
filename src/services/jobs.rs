use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::clock::Clock;
use crate::entities::job::{self, JobStatus, JobType};
use crate::entities::{asset, failure_type, job_cost_snapshot, technician};
use crate::errors::{codes, ServiceError};
use crate::events::{Event, EventSender, NotificationAudience};
use crate::services::{costing, snapshots};

/// Actions a caller can request against a job. Which actions are legal
/// depends solely on the job's current status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobAction {
    Assign,
    Start,
    Pause,
    Resume,
    Complete,
    Close,
    Cancel,
}

/// The lifecycle transition table. Returns the target status when `action`
/// is legal from `current`, `None` otherwise. Terminal states have no rows.
pub fn allowed_target(current: &JobStatus, action: JobAction) -> Option<JobStatus> {
    use JobAction::*;
    use JobStatus::*;
    match (current, action) {
        (Created, Assign) => Some(Assigned),
        (Created, Cancel) => Some(Cancelled),
        (Assigned, Start) => Some(InProgress),
        (Assigned, Cancel) => Some(Cancelled),
        (InProgress, Pause) => Some(Paused),
        (InProgress, Complete) => Some(Completed),
        (Paused, Resume) => Some(InProgress),
        (Paused, Cancel) => Some(Cancelled),
        (Completed, Close) => Some(Closed),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CreateJobInput {
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub failure_type_id: Option<Uuid>,
    pub title: String,
    pub job_type: JobType,
    pub priority: String,
    pub safety_photo_required: bool,
    pub created_by: Uuid,
}

/// Optional data carried by a transition request. Only some actions read
/// these fields.
#[derive(Debug, Clone, Default)]
pub struct TransitionPayload {
    pub assignee_id: Option<Uuid>,
    pub safety_photo_url: Option<String>,
}

/// Result of a successful transition. `snapshot` is populated only by
/// `close`.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub job: job::Model,
    pub old_status: JobStatus,
    pub snapshot: Option<job_cost_snapshot::Model>,
}

/// Job lifecycle state machine and its transition side effects.
#[derive(Clone)]
pub struct JobService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl JobService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    #[instrument(skip(self, input), fields(asset_id = %input.asset_id))]
    pub async fn create_job(&self, input: CreateJobInput) -> Result<job::Model, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "job title must not be empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let created = self
            .db
            .transaction::<_, job::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    asset::Entity::find_by_id(input.asset_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Asset {} not found", input.asset_id))
                        })?;

                    if let Some(failure_type_id) = input.failure_type_id {
                        failure_type::Entity::find_by_id(failure_type_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Failure type {} not found",
                                    failure_type_id
                                ))
                            })?;
                    }

                    new_job_model(&input, now).insert(txn).await.map_err(Into::into)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(job_id = %created.id, "job created");
        self.event_sender
            .send(Event::JobCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(created)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<job::Model, ServiceError> {
        job::Entity::find_by_id(job_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job {} not found", job_id)))
    }

    /// Applies one lifecycle action atomically. Guards, timestamps, labor
    /// costing, and snapshot creation all commit or roll back together; the
    /// job row is untouched when any guard rejects.
    #[instrument(skip(self, payload), fields(job_id = %job_id, action = %action))]
    pub async fn transition(
        &self,
        job_id: Uuid,
        action: JobAction,
        actor_id: Uuid,
        payload: TransitionPayload,
    ) -> Result<TransitionOutcome, ServiceError> {
        let now = self.clock.now();
        let outcome = self
            .db
            .transaction::<_, TransitionOutcome, ServiceError>(move |txn| {
                Box::pin(async move { apply_transition(txn, job_id, action, &payload, now).await })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            job_id = %job_id,
            from = outcome.old_status.as_str(),
            to = outcome.job.status.as_str(),
            "job transitioned"
        );
        self.emit_transition_events(&outcome, actor_id).await?;
        Ok(outcome)
    }

    /// Closes a completed job, freezing its cost snapshot.
    pub async fn close_job(
        &self,
        job_id: Uuid,
        actor_id: Uuid,
    ) -> Result<job_cost_snapshot::Model, ServiceError> {
        let outcome = self
            .transition(job_id, JobAction::Close, actor_id, TransitionPayload::default())
            .await?;
        outcome.snapshot.ok_or_else(|| {
            ServiceError::Integrity(format!("close of job {} produced no snapshot", job_id))
        })
    }

    async fn emit_transition_events(
        &self,
        outcome: &TransitionOutcome,
        actor_id: Uuid,
    ) -> Result<(), ServiceError> {
        let send = |event| async move {
            self.event_sender
                .send(event)
                .await
                .map_err(ServiceError::EventError)
        };

        send(Event::JobStatusChanged {
            job_id: outcome.job.id,
            old_status: outcome.old_status.as_str().to_string(),
            new_status: outcome.job.status.as_str().to_string(),
            actor_id,
        })
        .await?;

        match outcome.job.status {
            JobStatus::Completed => {
                send(Event::JobCompleted {
                    job_id: outcome.job.id,
                    total_cost: outcome.job.total_cost,
                })
                .await?;
                send(Event::NotificationRequested {
                    audience: NotificationAudience::Supervisors,
                    subject: format!("Job {} completed", outcome.job.id),
                    body: format!(
                        "\"{}\" completed with total cost {}",
                        outcome.job.title, outcome.job.total_cost
                    ),
                })
                .await?;
            }
            JobStatus::Closed => {
                if let Some(snapshot) = &outcome.snapshot {
                    send(Event::JobClosed {
                        job_id: outcome.job.id,
                        snapshot_id: snapshot.id,
                    })
                    .await?;
                }
            }
            JobStatus::Cancelled => {
                send(Event::JobCancelled(outcome.job.id)).await?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn new_job_model(input: &CreateJobInput, now: DateTime<Utc>) -> job::ActiveModel {
    job::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(input.company_id),
        asset_id: Set(input.asset_id),
        failure_type_id: Set(input.failure_type_id),
        pm_schedule_id: Set(None),
        title: Set(input.title.clone()),
        job_type: Set(input.job_type.clone()),
        status: Set(JobStatus::Created),
        priority: Set(input.priority.clone()),
        assigned_to: Set(None),
        safety_photo_required: Set(input.safety_photo_required),
        safety_photo_url: Set(None),
        total_pause_seconds: Set(0),
        material_cost: Set(Default::default()),
        labor_cost: Set(Default::default()),
        fuel_cost: Set(Default::default()),
        service_cost: Set(Default::default()),
        other_cost: Set(Default::default()),
        total_cost: Set(Default::default()),
        created_by: Set(input.created_by),
        created_at: Set(now),
        started_at: Set(None),
        paused_at: Set(None),
        completed_at: Set(None),
        closed_at: Set(None),
        updated_at: Set(now),
    }
}

async fn apply_transition(
    txn: &sea_orm::DatabaseTransaction,
    job_id: Uuid,
    action: JobAction,
    payload: &TransitionPayload,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, ServiceError> {
    let current = job::Entity::find_by_id(job_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Job {} not found", job_id)))?;

    let old_status = current.status.clone();
    let target = allowed_target(&old_status, action).ok_or_else(|| {
        ServiceError::InvalidTransition {
            current: old_status.as_str().to_string(),
            action: action.to_string(),
        }
    })?;

    let mut update: job::ActiveModel = current.clone().into();
    update.status = Set(target.clone());
    update.updated_at = Set(now);

    match action {
        JobAction::Assign => {
            let assignee_id = payload.assignee_id.ok_or_else(|| {
                ServiceError::ValidationError("assign requires an assignee_id".to_string())
            })?;
            technician::Entity::find_by_id(assignee_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Technician {} not found", assignee_id))
                })?;
            update.assigned_to = Set(Some(assignee_id));
        }
        JobAction::Start => {
            // First start wins; a later restart never rewrites it
            if current.started_at.is_none() {
                update.started_at = Set(Some(now));
            }
        }
        JobAction::Pause => {
            update.paused_at = Set(Some(now));
        }
        JobAction::Resume => {
            if let Some(paused_at) = current.paused_at {
                let paused_for = (now - paused_at).num_seconds().max(0);
                update.total_pause_seconds = Set(current.total_pause_seconds + paused_for);
            }
            update.paused_at = Set(None);
        }
        JobAction::Complete => {
            ensure_no_pending_returns(txn, &current).await?;
            let photo = ensure_safety_photo(txn, &current, payload).await?;
            update.safety_photo_url = Set(photo);
            update.completed_at = Set(Some(now));
        }
        JobAction::Close => {
            if current.completed_at.is_none() {
                return Err(ServiceError::precondition(
                    codes::JOB_NOT_COMPLETED,
                    format!("job {} has no completion timestamp", job_id),
                ));
            }
            ensure_no_pending_returns(txn, &current).await?;
            ensure_safety_photo(txn, &current, payload).await?;
            update.closed_at = Set(Some(now));
        }
        JobAction::Cancel => {}
    }

    let mut updated = update.update(txn).await?;

    let snapshot = match action {
        JobAction::Complete => {
            if let Some((_, refreshed)) = costing::record_labor_cost(txn, &updated, now).await? {
                updated = refreshed;
            }
            None
        }
        JobAction::Close => Some(snapshots::create_for_job(txn, &updated, now).await?),
        _ => None,
    };

    Ok(TransitionOutcome {
        job: updated,
        old_status,
        snapshot,
    })
}

async fn ensure_no_pending_returns(
    txn: &sea_orm::DatabaseTransaction,
    current: &job::Model,
) -> Result<(), ServiceError> {
    let pending = costing::pending_return_lines(txn, current.id).await?;
    if !pending.is_empty() {
        return Err(ServiceError::precondition(
            codes::UNRETURNED_PARTS,
            format!(
                "{} request line(s) still have unreturned parts",
                pending.len()
            ),
        ));
    }
    Ok(())
}

/// Enforces the safety photo gate and resolves the photo URL to store. The
/// gate applies when the job, its asset, or its failure type is flagged
/// safety-critical.
async fn ensure_safety_photo(
    txn: &sea_orm::DatabaseTransaction,
    current: &job::Model,
    payload: &TransitionPayload,
) -> Result<Option<String>, ServiceError> {
    let mut required = current.safety_photo_required;

    if !required {
        if let Some(job_asset) = asset::Entity::find_by_id(current.asset_id).one(txn).await? {
            required = job_asset.safety_critical;
        }
    }
    if !required {
        if let Some(failure_type_id) = current.failure_type_id {
            if let Some(ft) = failure_type::Entity::find_by_id(failure_type_id).one(txn).await? {
                required = ft.safety_critical;
            }
        }
    }

    let photo = payload
        .safety_photo_url
        .clone()
        .or_else(|| current.safety_photo_url.clone());

    if required && photo.is_none() {
        return Err(ServiceError::precondition(
            codes::SAFETY_PHOTO_REQUIRED,
            "a safety verification photo is required before completion".to_string(),
        ));
    }
    Ok(photo)
}
