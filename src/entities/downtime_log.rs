use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DowntimeCategory {
    #[sea_orm(string_value = "BREAKDOWN")]
    Breakdown,
    #[sea_orm(string_value = "SCHEDULED_MAINTENANCE")]
    ScheduledMaintenance,
    #[sea_orm(string_value = "WAITING_PARTS")]
    WaitingParts,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl DowntimeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakdown => "BREAKDOWN",
            Self::ScheduledMaintenance => "SCHEDULED_MAINTENANCE",
            Self::WaitingParts => "WAITING_PARTS",
            Self::Other => "OTHER",
        }
    }
}

/// Unavailability interval for an asset. At most one open interval
/// (ended_at = null) may exist per asset at any time; a partial unique index
/// backs the application-level check.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "downtime_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub asset_id: Uuid,
    pub job_id: Option<Uuid>,
    pub category: DowntimeCategory,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Computed on close: round((ended_at - started_at) in minutes)
    pub duration_minutes: Option<i64>,
    pub opportunity_cost_per_hour: Option<Decimal>,
    pub lost_opportunity_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}
