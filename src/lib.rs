//! Maintenance management backend: job lifecycle, append-only cost ledger,
//! cost snapshots with integrity digests, downtime tracking with availability
//! reporting, and meter-driven preventive maintenance scheduling.

pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::events::EventSender;
use crate::handlers::AppServices;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

/// The full v1 API surface.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    handlers::api_routes()
}
