#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use uuid::Uuid;

use upkeep_api::clock::{Clock, ManualClock};
use upkeep_api::entities::{asset, failure_type, item_request_line, pm_schedule, technician};
use upkeep_api::events::{self, EventSender};
use upkeep_api::handlers::AppServices;
use upkeep_api::migrator::Migrator;

/// Helper harness: services backed by an in-memory SQLite database and a
/// manually driven clock.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub clock: Arc<ManualClock>,
    pub services: AppServices,
    pub company_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state. The clock
    /// starts at 2024-04-01 08:00 UTC.
    pub async fn new() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let pool = Database::connect(opt)
            .await
            .expect("failed to create test database");
        Migrator::up(&pool, None)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap(),
        ));
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let services = AppServices::new(db.clone(), event_sender, clock_dyn);

        Self {
            db,
            clock,
            services,
            company_id: Uuid::new_v4(),
            _event_task: event_task,
        }
    }

    pub async fn seed_asset(
        &self,
        code: &str,
        current_meter: Decimal,
        safety_critical: bool,
        opportunity_cost_per_hour: Option<Decimal>,
    ) -> asset::Model {
        let now = self.clock.now();
        asset::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(self.company_id),
            code: Set(code.to_string()),
            description: Set(format!("Test asset {}", code)),
            current_meter: Set(current_meter),
            meter_unit: Set("hours".to_string()),
            safety_critical: Set(safety_critical),
            opportunity_cost_per_hour: Set(opportunity_cost_per_hour),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed asset for tests")
    }

    pub async fn seed_technician(&self, hourly_rate: Decimal) -> technician::Model {
        technician::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(self.company_id),
            name: Set("Test Technician".to_string()),
            hourly_rate: Set(hourly_rate),
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed technician for tests")
    }

    pub async fn seed_failure_type(&self, safety_critical: bool) -> failure_type::Model {
        failure_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(self.company_id),
            name: Set("Hydraulic failure".to_string()),
            safety_critical: Set(safety_critical),
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed failure type for tests")
    }

    pub async fn seed_request_line(
        &self,
        job_id: Uuid,
        approved_qty: Decimal,
        unit_cost: Decimal,
    ) -> item_request_line::Model {
        let now = self.clock.now();
        item_request_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(job_id),
            item_name: Set("Hydraulic filter".to_string()),
            requested_qty: Set(approved_qty),
            approved_qty: Set(approved_qty),
            issued_qty: Set(Decimal::ZERO),
            returned_qty: Set(Decimal::ZERO),
            unit_cost: Set(unit_cost),
            total_cost: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed request line for tests")
    }

    pub async fn seed_schedule(
        &self,
        asset_id: Uuid,
        interval_value: Decimal,
        next_due_meter: Decimal,
        job_title_template: &str,
    ) -> pm_schedule::Model {
        let now = self.clock.now();
        pm_schedule::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(self.company_id),
            asset_id: Set(asset_id),
            interval_type: Set(pm_schedule::IntervalType::Hours),
            interval_value: Set(interval_value),
            last_service_meter: Set(next_due_meter - interval_value),
            next_due_meter: Set(next_due_meter),
            job_title_template: Set(job_title_template.to_string()),
            priority: Set("medium".to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed schedule for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
