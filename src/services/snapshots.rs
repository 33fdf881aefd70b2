use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::entities::{document_hash, job, job_cost_snapshot, technician};
use crate::errors::ServiceError;
use crate::services::costing;

pub(crate) const SNAPSHOT_DOCUMENT_TYPE: &str = "job_cost_snapshot";

/// Canonical digest input. Field order is part of the format; changing it
/// invalidates every stored digest.
#[derive(Serialize)]
struct DigestPayload {
    job_id: Uuid,
    material_cost: Decimal,
    labor_cost: Decimal,
    fuel_cost: Decimal,
    service_cost: Decimal,
    other_cost: Decimal,
    total_cost: Decimal,
    labor_hours: Decimal,
    hourly_rate: Decimal,
    timestamp: String,
}

fn compute_digest(payload: &DigestPayload) -> Result<String, ServiceError> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|e| ServiceError::Integrity(format!("snapshot serialization failed: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn digest_for_snapshot(snapshot: &job_cost_snapshot::Model) -> Result<String, ServiceError> {
    compute_digest(&DigestPayload {
        job_id: snapshot.job_id,
        material_cost: snapshot.material_cost,
        labor_cost: snapshot.labor_cost,
        fuel_cost: snapshot.fuel_cost,
        service_cost: snapshot.service_cost,
        other_cost: snapshot.other_cost,
        total_cost: snapshot.total_cost,
        labor_hours: snapshot.labor_hours,
        hourly_rate: snapshot.hourly_rate,
        timestamp: rfc3339(snapshot.created_at),
    })
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Freezes a closed job's economics into an immutable snapshot, writing the
/// digest both on the snapshot row and into the document-hash ledger. Runs
/// inside the caller's closing transaction.
pub(crate) async fn create_for_job<C: ConnectionTrait>(
    conn: &C,
    target: &job::Model,
    now: DateTime<Utc>,
) -> Result<job_cost_snapshot::Model, ServiceError> {
    let existing = job_cost_snapshot::Entity::find()
        .filter(job_cost_snapshot::Column::JobId.eq(target.id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Job {} already has a cost snapshot",
            target.id
        )));
    }

    let hourly_rate = match target.assigned_to {
        Some(technician_id) => technician::Entity::find_by_id(technician_id)
            .one(conn)
            .await?
            .map(|t| t.hourly_rate)
            .unwrap_or(Decimal::ZERO),
        None => Decimal::ZERO,
    };

    let labor_hours = match (target.started_at, target.completed_at) {
        (Some(started_at), Some(completed_at)) => {
            costing::labor_hours(started_at, completed_at, target.total_pause_seconds)
        }
        _ => Decimal::ZERO,
    };

    let digest = compute_digest(&DigestPayload {
        job_id: target.id,
        material_cost: target.material_cost,
        labor_cost: target.labor_cost,
        fuel_cost: target.fuel_cost,
        service_cost: target.service_cost,
        other_cost: target.other_cost,
        total_cost: target.total_cost,
        labor_hours,
        hourly_rate,
        timestamp: rfc3339(now),
    })?;

    let snapshot = job_cost_snapshot::ActiveModel {
        id: Set(Uuid::new_v4()),
        job_id: Set(target.id),
        material_cost: Set(target.material_cost),
        labor_cost: Set(target.labor_cost),
        fuel_cost: Set(target.fuel_cost),
        service_cost: Set(target.service_cost),
        other_cost: Set(target.other_cost),
        total_cost: Set(target.total_cost),
        labor_hours: Set(labor_hours),
        hourly_rate: Set(hourly_rate),
        digest: Set(digest.clone()),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    document_hash::ActiveModel {
        id: Set(Uuid::new_v4()),
        document_type: Set(SNAPSHOT_DOCUMENT_TYPE.to_string()),
        document_id: Set(snapshot.id),
        digest: Set(digest),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    info!(job_id = %target.id, snapshot_id = %snapshot.id, "cost snapshot created");
    Ok(snapshot)
}

/// Outcome of a snapshot integrity check.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct VerificationReport {
    pub snapshot_id: Uuid,
    pub job_id: Uuid,
    pub verified: bool,
}

/// Read and verification API over immutable cost snapshots.
#[derive(Clone)]
pub struct CostSnapshotService {
    db: Arc<DatabaseConnection>,
    #[allow(dead_code)]
    clock: Arc<dyn Clock>,
}

impl CostSnapshotService {
    pub fn new(db: Arc<DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn get_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<job_cost_snapshot::Model, ServiceError> {
        job_cost_snapshot::Entity::find()
            .filter(job_cost_snapshot::Column::JobId.eq(job_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No snapshot for job {}", job_id)))
    }

    /// Recomputes the digest from stored fields and compares it against both
    /// stored copies. Any mismatch is an integrity failure.
    #[instrument(skip(self), fields(snapshot_id = %snapshot_id))]
    pub async fn verify(&self, snapshot_id: Uuid) -> Result<VerificationReport, ServiceError> {
        let snapshot = job_cost_snapshot::Entity::find_by_id(snapshot_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Snapshot {} not found", snapshot_id))
            })?;

        let recomputed = digest_for_snapshot(&snapshot)?;
        if recomputed != snapshot.digest {
            warn!(snapshot_id = %snapshot_id, "snapshot digest does not match stored fields");
            return Err(ServiceError::Integrity(format!(
                "snapshot {} digest mismatch",
                snapshot_id
            )));
        }

        let ledger_copy = document_hash::Entity::find()
            .filter(document_hash::Column::DocumentType.eq(SNAPSHOT_DOCUMENT_TYPE))
            .filter(document_hash::Column::DocumentId.eq(snapshot_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::Integrity(format!(
                    "snapshot {} has no document-hash ledger entry",
                    snapshot_id
                ))
            })?;
        if ledger_copy.digest != snapshot.digest {
            warn!(snapshot_id = %snapshot_id, "document-hash ledger copy diverged");
            return Err(ServiceError::Integrity(format!(
                "snapshot {} ledger digest mismatch",
                snapshot_id
            )));
        }

        Ok(VerificationReport {
            snapshot_id,
            job_id: snapshot.job_id,
            verified: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_snapshot() -> job_cost_snapshot::Model {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap();
        let mut snapshot = job_cost_snapshot::Model {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            material_cost: dec!(120.00),
            labor_cost: dec!(87.50),
            fuel_cost: Decimal::ZERO,
            service_cost: Decimal::ZERO,
            other_cost: dec!(10),
            total_cost: dec!(217.50),
            labor_hours: dec!(3.5),
            hourly_rate: dec!(25),
            digest: String::new(),
            created_at,
        };
        snapshot.digest = digest_for_snapshot(&snapshot).unwrap();
        snapshot
    }

    #[test]
    fn digest_is_stable_for_identical_fields() {
        let snapshot = sample_snapshot();
        assert_eq!(digest_for_snapshot(&snapshot).unwrap(), snapshot.digest);
    }

    #[test]
    fn digest_changes_when_a_total_changes() {
        let mut snapshot = sample_snapshot();
        snapshot.total_cost += dec!(0.01);
        assert_ne!(digest_for_snapshot(&snapshot).unwrap(), snapshot.digest);
    }

    #[test]
    fn digest_changes_when_timestamp_changes() {
        let mut snapshot = sample_snapshot();
        snapshot.created_at += chrono::Duration::seconds(1);
        assert_ne!(digest_for_snapshot(&snapshot).unwrap(), snapshot.digest);
    }
}
