use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maintainable asset. `current_meter` is advanced by meter readings and
/// drives preventive-maintenance scheduling.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub description: String,
    pub current_meter: Decimal,
    /// Unit of the meter (hours, kilometers, miles)
    pub meter_unit: String,
    /// Safety-critical assets require a safety photo before job completion
    pub safety_critical: bool,
    pub opportunity_cost_per_hour: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::job::Entity")]
    Jobs,
    #[sea_orm(has_many = "super::downtime_log::Entity")]
    DowntimeLogs,
    #[sea_orm(has_many = "super::pm_schedule::Entity")]
    PmSchedules,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Jobs.def()
    }
}

impl Related<super::downtime_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DowntimeLogs.def()
    }
}

impl Related<super::pm_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PmSchedules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
