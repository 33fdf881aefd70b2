pub mod costing;
pub mod downtime;
pub mod jobs;
pub mod pm;
pub mod snapshots;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::clock::Clock;
use crate::events::EventSender;
use crate::services::{
    CostLedgerService, CostSnapshotService, DowntimeService, JobService, PmService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub jobs: Arc<JobService>,
    pub costing: Arc<CostLedgerService>,
    pub snapshots: Arc<CostSnapshotService>,
    pub downtime: Arc<DowntimeService>,
    pub pm: Arc<PmService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs: Arc::new(JobService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            costing: Arc::new(CostLedgerService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            snapshots: Arc::new(CostSnapshotService::new(db.clone(), clock.clone())),
            downtime: Arc::new(DowntimeService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
            )),
            pm: Arc::new(PmService::new(db, event_sender, clock)),
        }
    }
}

/// All versioned API routes.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(jobs::routes())
        .merge(costing::routes())
        .merge(snapshots::routes())
        .merge(downtime::routes())
        .merge(pm::routes())
}
