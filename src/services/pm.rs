use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::entities::alert::{self, AlertSeverity};
use crate::entities::job::{self, JobStatus, JobType};
use crate::entities::{asset, meter_reading, pm_schedule};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

const ROLLBACK_ALERT_CATEGORY: &str = "meter_rollback";

/// A schedule is due once the meter reaches the due point.
pub fn is_due(current_meter: Decimal, next_due_meter: Decimal) -> bool {
    current_meter >= next_due_meter
}

/// Overdue past a 10%-of-interval grace window beyond the due point.
pub fn is_overdue(current_meter: Decimal, next_due_meter: Decimal, interval_value: Decimal) -> bool {
    current_meter > next_due_meter + interval_value * dec!(0.1)
}

/// Substitutes asset placeholders into a schedule's job title template.
pub fn render_title(template: &str, target: &asset::Model) -> String {
    template
        .replace("{asset_code}", &target.code)
        .replace("{asset_description}", &target.description)
}

/// Explicit authorization to accept a meter reading below the current meter,
/// e.g. after a gauge replacement.
#[derive(Debug, Clone)]
pub struct SupervisorOverride {
    pub supervisor_id: Uuid,
    pub reason: String,
}

/// Result of recording one meter reading.
#[derive(Debug, Clone)]
pub struct MeterReadingOutcome {
    pub reading: meter_reading::Model,
    pub rollback_detected: bool,
    pub generated_job_ids: Vec<Uuid>,
}

struct SweepResult {
    reading: meter_reading::Model,
    rollback: Option<RollbackInfo>,
    generated: Vec<(Uuid, Uuid)>,
}

struct RollbackInfo {
    alert_id: Uuid,
    previous: Decimal,
    reported: Decimal,
}

/// Meter-driven preventive maintenance scheduling.
#[derive(Clone)]
pub struct PmService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl PmService {
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

    /// Records a meter reading and sweeps the asset's schedules for due
    /// maintenance. A reading below the current meter is a rollback: it is
    /// stored and alerted but does not move the meter or generate jobs
    /// unless a supervisor override accompanies it.
    #[instrument(skip(self, supervisor_override), fields(asset_id = %asset_id, reading = %reading))]
    pub async fn record_meter_reading(
        &self,
        asset_id: Uuid,
        reading: Decimal,
        created_by: Uuid,
        supervisor_override: Option<SupervisorOverride>,
    ) -> Result<MeterReadingOutcome, ServiceError> {
        if reading < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "meter reading must not be negative".to_string(),
            ));
        }

        let now = self.clock.now();
        let result = self
            .db
            .transaction::<_, SweepResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let target = asset::Entity::find_by_id(asset_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Asset {} not found", asset_id))
                        })?;

                    let previous = target.current_meter;
                    let rollback = reading < previous;

                    let stored = meter_reading::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        asset_id: Set(asset_id),
                        reading: Set(reading),
                        previous_reading: Set(Some(previous)),
                        effective_date: Set(now),
                        rollback: Set(rollback),
                        created_by: Set(created_by),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await?;

                    if rollback {
                        let message = match &supervisor_override {
                            None => format!(
                                "Meter reading {} is below current meter {} on asset {}",
                                reading, previous, target.code
                            ),
                            Some(authorization) => format!(
                                "Meter rollback to {} on asset {} authorized by supervisor {}: {}",
                                reading, target.code, authorization.supervisor_id, authorization.reason
                            ),
                        };
                        let severity = if supervisor_override.is_some() {
                            AlertSeverity::Warning
                        } else {
                            AlertSeverity::High
                        };
                        let raised = alert::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            company_id: Set(target.company_id),
                            asset_id: Set(Some(asset_id)),
                            severity: Set(severity),
                            category: Set(ROLLBACK_ALERT_CATEGORY.to_string()),
                            message: Set(message),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;

                        if supervisor_override.is_none() {
                            return Ok(SweepResult {
                                reading: stored,
                                rollback: Some(RollbackInfo {
                                    alert_id: raised.id,
                                    previous,
                                    reported: reading,
                                }),
                                generated: Vec::new(),
                            });
                        }

                        let mut update: asset::ActiveModel = target.clone().into();
                        update.current_meter = Set(reading);
                        update.updated_at = Set(now);
                        let target = update.update(txn).await?;

                        let generated =
                            sweep_asset_schedules(txn, &target, created_by, now).await?;
                        return Ok(SweepResult {
                            reading: stored,
                            rollback: Some(RollbackInfo {
                                alert_id: raised.id,
                                previous,
                                reported: reading,
                            }),
                            generated,
                        });
                    }

                    let mut update: asset::ActiveModel = target.clone().into();
                    update.current_meter = Set(reading);
                    update.updated_at = Set(now);
                    let target = update.update(txn).await?;

                    let generated = sweep_asset_schedules(txn, &target, created_by, now).await?;
                    Ok(SweepResult {
                        reading: stored,
                        rollback: None,
                        generated,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send(Event::MeterReadingRecorded { asset_id, reading })
            .await
            .map_err(ServiceError::EventError)?;

        if let Some(rollback) = &result.rollback {
            warn!(
                asset_id = %asset_id,
                previous = %rollback.previous,
                reported = %rollback.reported,
                "meter rollback recorded"
            );
            self.event_sender
                .send(Event::MeterRollbackDetected {
                    asset_id,
                    previous: rollback.previous,
                    reported: rollback.reported,
                    alert_id: rollback.alert_id,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        for (schedule_id, job_id) in &result.generated {
            info!(schedule_id = %schedule_id, job_id = %job_id, "preventive job generated");
            self.event_sender
                .send(Event::PmJobGenerated {
                    schedule_id: *schedule_id,
                    job_id: *job_id,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(MeterReadingOutcome {
            rollback_detected: result.rollback.is_some(),
            generated_job_ids: result.generated.iter().map(|(_, j)| *j).collect(),
            reading: result.reading,
        })
    }

    /// Sweeps active schedules against current meters without recording a
    /// reading. Scoped to one asset when `asset_id` is given, otherwise to
    /// the whole company.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn check_pm_due(
        &self,
        company_id: Uuid,
        asset_id: Option<Uuid>,
        actor_id: Uuid,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let now = self.clock.now();
        let generated = self
            .db
            .transaction::<_, Vec<(Uuid, Uuid)>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut query =
                        asset::Entity::find().filter(asset::Column::CompanyId.eq(company_id));
                    if let Some(asset_id) = asset_id {
                        query = query.filter(asset::Column::Id.eq(asset_id));
                    }
                    let assets = query.all(txn).await?;
                    if asset_id.is_some() && assets.is_empty() {
                        return Err(ServiceError::NotFound(format!(
                            "Asset {} not found",
                            asset_id.unwrap_or_default()
                        )));
                    }

                    let mut generated = Vec::new();
                    for target in &assets {
                        generated
                            .extend(sweep_asset_schedules(txn, target, actor_id, now).await?);
                    }
                    Ok(generated)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        for (schedule_id, job_id) in &generated {
            info!(schedule_id = %schedule_id, job_id = %job_id, "preventive job generated");
            self.event_sender
                .send(Event::PmJobGenerated {
                    schedule_id: *schedule_id,
                    job_id: *job_id,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(generated.into_iter().map(|(_, j)| j).collect())
    }
}

/// Checks every active schedule of one asset, generating jobs and advancing
/// due points. Returns (schedule_id, job_id) pairs for generated jobs.
async fn sweep_asset_schedules<C: ConnectionTrait>(
    conn: &C,
    target: &asset::Model,
    created_by: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<(Uuid, Uuid)>, ServiceError> {
    let schedules = pm_schedule::Entity::find()
        .filter(pm_schedule::Column::AssetId.eq(target.id))
        .filter(pm_schedule::Column::IsActive.eq(true))
        .all(conn)
        .await?;

    let mut generated = Vec::new();
    for schedule in schedules {
        if let Some(new_job) = check_schedule(conn, &schedule, target, created_by, now).await? {
            generated.push((schedule.id, new_job.id));
        }
    }
    Ok(generated)
}

/// Generates a preventive job for a due schedule unless one is already
/// pending, then advances the schedule's due point.
async fn check_schedule<C: ConnectionTrait>(
    conn: &C,
    schedule: &pm_schedule::Model,
    target: &asset::Model,
    created_by: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<job::Model>, ServiceError> {
    if !is_due(target.current_meter, schedule.next_due_meter) {
        return Ok(None);
    }

    // Duplicate suppression: an unfinished job from this schedule blocks a
    // new one, and the due point stays put until it finishes
    let pending = job::Entity::find()
        .filter(job::Column::PmScheduleId.eq(schedule.id))
        .filter(job::Column::Status.is_in([
            JobStatus::Created,
            JobStatus::Assigned,
            JobStatus::InProgress,
        ]))
        .one(conn)
        .await?;
    if pending.is_some() {
        return Ok(None);
    }

    let priority = if is_overdue(
        target.current_meter,
        schedule.next_due_meter,
        schedule.interval_value,
    ) {
        "high".to_string()
    } else {
        schedule.priority.clone()
    };

    let new_job = job::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(schedule.company_id),
        asset_id: Set(target.id),
        failure_type_id: Set(None),
        pm_schedule_id: Set(Some(schedule.id)),
        title: Set(render_title(&schedule.job_title_template, target)),
        job_type: Set(JobType::Preventive),
        status: Set(JobStatus::Created),
        priority: Set(priority),
        assigned_to: Set(None),
        safety_photo_required: Set(false),
        safety_photo_url: Set(None),
        total_pause_seconds: Set(0),
        material_cost: Set(Decimal::ZERO),
        labor_cost: Set(Decimal::ZERO),
        fuel_cost: Set(Decimal::ZERO),
        service_cost: Set(Decimal::ZERO),
        other_cost: Set(Decimal::ZERO),
        total_cost: Set(Decimal::ZERO),
        created_by: Set(created_by),
        created_at: Set(now),
        started_at: Set(None),
        paused_at: Set(None),
        completed_at: Set(None),
        closed_at: Set(None),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let mut update: pm_schedule::ActiveModel = schedule.clone().into();
    update.last_service_meter = Set(target.current_meter);
    update.next_due_meter = Set(target.current_meter + schedule.interval_value);
    update.updated_at = Set(now);
    update.update(conn).await?;

    Ok(Some(new_job))
}
