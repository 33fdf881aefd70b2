pub mod costing;
pub mod downtime;
pub mod jobs;
pub mod pm;
pub mod snapshots;

pub use costing::CostLedgerService;
pub use downtime::DowntimeService;
pub use jobs::JobService;
pub use pm::PmService;
pub use snapshots::CostSnapshotService;
