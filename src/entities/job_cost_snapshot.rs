use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Immutable record of final job economics, created exactly once at closure.
/// `digest` is a SHA-256 over the canonical serialization of the totals; a
/// second copy lives in the document-hash ledger.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "job_cost_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub job_id: Uuid,
    pub material_cost: Decimal,
    pub labor_cost: Decimal,
    pub fuel_cost: Decimal,
    pub service_cost: Decimal,
    pub other_cost: Decimal,
    pub total_cost: Decimal,
    pub labor_hours: Decimal,
    pub hourly_rate: Decimal,
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
