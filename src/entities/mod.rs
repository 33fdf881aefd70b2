pub mod alert;
pub mod asset;
pub mod document_hash;
pub mod downtime_log;
pub mod failure_type;
pub mod item_request_line;
pub mod job;
pub mod job_cost_entry;
pub mod job_cost_snapshot;
pub mod meter_reading;
pub mod pm_schedule;
pub mod technician;
