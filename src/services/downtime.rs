use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::clock::Clock;
use crate::entities::downtime_log::{self, DowntimeCategory};
use crate::entities::{asset, job};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Traffic-light availability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityBand {
    Green,
    Yellow,
    Red,
}

/// Green at 90% and above, yellow at 70%, red below.
pub fn classify(availability_percent: Decimal) -> AvailabilityBand {
    if availability_percent >= dec!(90) {
        AvailabilityBand::Green
    } else if availability_percent >= dec!(70) {
        AvailabilityBand::Yellow
    } else {
        AvailabilityBand::Red
    }
}

/// Calendar-month availability for one asset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailabilityReport {
    pub asset_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub total_calendar_hours: Decimal,
    pub downtime_hours: Decimal,
    pub availability_percent: Decimal,
    pub band: AvailabilityBand,
    /// Downtime hours per category for the same window
    pub by_category: HashMap<String, Decimal>,
}

#[derive(Debug, Clone)]
pub struct StartDowntimeInput {
    pub asset_id: Uuid,
    pub job_id: Option<Uuid>,
    pub category: DowntimeCategory,
    pub opportunity_cost_per_hour: Option<Decimal>,
}

/// UTC bounds of a calendar month: first instant inclusive, first instant
/// of the next month exclusive.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    if !(1..=12).contains(&month) {
        return Err(ServiceError::ValidationError(format!(
            "month must be 1-12, got {}",
            month
        )));
    }
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ServiceError::ValidationError(format!("invalid month {}-{}", year, month)))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ServiceError::ValidationError(format!("invalid month {}-{}", year, month)))?;
    Ok((start, end))
}

/// Seconds of `[start, end)` that fall inside `[window_start, window_end)`.
pub fn overlap_seconds(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> i64 {
    let clamped_start = start.max(window_start);
    let clamped_end = end.min(window_end);
    (clamped_end - clamped_start).num_seconds().max(0)
}

/// Downtime recording and availability reporting.
#[derive(Clone)]
pub struct DowntimeService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: Arc<dyn Clock>,
}

impl DowntimeService {
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

    /// Opens a downtime interval for an asset. An asset can have at most one
    /// open interval; a second start is rejected.
    #[instrument(skip(self, input), fields(asset_id = %input.asset_id))]
    pub async fn start(
        &self,
        input: StartDowntimeInput,
    ) -> Result<downtime_log::Model, ServiceError> {
        let now = self.clock.now();
        let log = self
            .db
            .transaction::<_, downtime_log::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let target = asset::Entity::find_by_id(input.asset_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Asset {} not found", input.asset_id))
                        })?;

                    if let Some(job_id) = input.job_id {
                        job::Entity::find_by_id(job_id).one(txn).await?.ok_or_else(|| {
                            ServiceError::NotFound(format!("Job {} not found", job_id))
                        })?;
                    }

                    let open = downtime_log::Entity::find()
                        .filter(downtime_log::Column::AssetId.eq(input.asset_id))
                        .filter(downtime_log::Column::EndedAt.is_null())
                        .one(txn)
                        .await?;
                    if let Some(open) = open {
                        return Err(ServiceError::Conflict(format!(
                            "Asset {} already has an open downtime interval ({})",
                            input.asset_id, open.id
                        )));
                    }

                    let rate = input
                        .opportunity_cost_per_hour
                        .or(target.opportunity_cost_per_hour);

                    downtime_log::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        asset_id: Set(input.asset_id),
                        job_id: Set(input.job_id),
                        category: Set(input.category.clone()),
                        started_at: Set(now),
                        ended_at: Set(None),
                        duration_minutes: Set(None),
                        opportunity_cost_per_hour: Set(rate),
                        lost_opportunity_cost: Set(None),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(Into::into)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(downtime_log_id = %log.id, "downtime started");
        self.event_sender
            .send(Event::DowntimeStarted {
                asset_id: log.asset_id,
                downtime_log_id: log.id,
                category: log.category.as_str().to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;
        Ok(log)
    }

    /// Closes an open downtime interval, fixing its duration and the lost
    /// opportunity cost.
    #[instrument(skip(self), fields(downtime_log_id = %downtime_log_id))]
    pub async fn end(&self, downtime_log_id: Uuid) -> Result<downtime_log::Model, ServiceError> {
        let now = self.clock.now();
        let log = self
            .db
            .transaction::<_, downtime_log::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let open = downtime_log::Entity::find_by_id(downtime_log_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Downtime log {} not found",
                                downtime_log_id
                            ))
                        })?;
                    if open.ended_at.is_some() {
                        return Err(ServiceError::Conflict(format!(
                            "Downtime log {} is already ended",
                            downtime_log_id
                        )));
                    }

                    let duration_minutes =
                        ((now - open.started_at).num_milliseconds() as f64 / 60_000.0).round()
                            as i64;
                    let lost = open.opportunity_cost_per_hour.map(|rate| {
                        (Decimal::from(duration_minutes) / dec!(60) * rate).round_dp(2)
                    });

                    let mut update: downtime_log::ActiveModel = open.into();
                    update.ended_at = Set(Some(now));
                    update.duration_minutes = Set(Some(duration_minutes));
                    update.lost_opportunity_cost = Set(lost);
                    update.update(txn).await.map_err(Into::into)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            downtime_log_id = %log.id,
            duration_minutes = log.duration_minutes,
            "downtime ended"
        );
        self.event_sender
            .send(Event::DowntimeEnded {
                asset_id: log.asset_id,
                downtime_log_id: log.id,
                duration_minutes: log.duration_minutes.unwrap_or(0),
            })
            .await
            .map_err(ServiceError::EventError)?;
        Ok(log)
    }

    /// Calendar-month availability for one asset. Open intervals count up to
    /// the current time; intervals spanning the month edge are clamped to it.
    pub async fn availability(
        &self,
        asset_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<AvailabilityReport, ServiceError> {
        asset::Entity::find_by_id(asset_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", asset_id)))?;
        self.availability_for(asset_id, year, month).await
    }

    /// Per-asset availability for every asset of a company.
    pub async fn fleet_availability(
        &self,
        company_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<AvailabilityReport>, ServiceError> {
        let assets = asset::Entity::find()
            .filter(asset::Column::CompanyId.eq(company_id))
            .order_by_asc(asset::Column::Code)
            .all(self.db.as_ref())
            .await?;

        let mut reports = Vec::with_capacity(assets.len());
        for a in assets {
            reports.push(self.availability_for(a.id, year, month).await?);
        }
        Ok(reports)
    }

    async fn availability_for(
        &self,
        asset_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<AvailabilityReport, ServiceError> {
        let (window_start, window_end) = month_bounds(year, month)?;
        let now = self.clock.now();

        let logs = downtime_log::Entity::find()
            .filter(downtime_log::Column::AssetId.eq(asset_id))
            .filter(downtime_log::Column::StartedAt.lt(window_end))
            .all(self.db.as_ref())
            .await?;

        let mut downtime_secs: i64 = 0;
        let mut by_category_secs: HashMap<String, i64> = HashMap::new();
        for log in &logs {
            let end = log.ended_at.unwrap_or(now);
            let secs = overlap_seconds(log.started_at, end, window_start, window_end);
            if secs > 0 {
                downtime_secs += secs;
                *by_category_secs
                    .entry(log.category.as_str().to_string())
                    .or_insert(0) += secs;
            }
        }

        let total_calendar_hours =
            Decimal::from((window_end - window_start).num_seconds()) / dec!(3600);
        let downtime_hours = (Decimal::from(downtime_secs) / dec!(3600)).round_dp(4);
        let availability_percent = ((total_calendar_hours - downtime_hours)
            / total_calendar_hours
            * dec!(100))
        .round_dp(2);

        let by_category = by_category_secs
            .into_iter()
            .map(|(k, secs)| (k, (Decimal::from(secs) / dec!(3600)).round_dp(4)))
            .collect();

        Ok(AvailabilityReport {
            asset_id,
            year,
            month,
            total_calendar_hours,
            downtime_hours,
            availability_percent,
            band: classify(availability_percent),
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_thresholds() {
        assert_eq!(classify(dec!(100)), AvailabilityBand::Green);
        assert_eq!(classify(dec!(90)), AvailabilityBand::Green);
        assert_eq!(classify(dec!(89.99)), AvailabilityBand::Yellow);
        assert_eq!(classify(dec!(70)), AvailabilityBand::Yellow);
        assert_eq!(classify(dec!(69.99)), AvailabilityBand::Red);
        assert_eq!(classify(dec!(0)), AvailabilityBand::Red);
    }

    #[test]
    fn month_bounds_handles_year_rollover() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_bounds_rejects_invalid_month() {
        assert!(matches!(
            month_bounds(2024, 13),
            Err(ServiceError::ValidationError(_))
        ));
        assert!(matches!(
            month_bounds(2024, 0),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn overlap_clamps_to_window() {
        let ws = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let we = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        // Fully inside
        let s = Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap();
        let e = Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap();
        assert_eq!(overlap_seconds(s, e, ws, we), 12 * 3600);

        // Spanning the start edge
        let s = Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap();
        let e = Utc.with_ymd_and_hms(2024, 4, 1, 6, 0, 0).unwrap();
        assert_eq!(overlap_seconds(s, e, ws, we), 6 * 3600);

        // Entirely outside
        let s = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let e = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
        assert_eq!(overlap_seconds(s, e, ws, we), 0);
    }
}
