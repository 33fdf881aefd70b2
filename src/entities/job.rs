use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle states of a maintenance job. The transition table lives in
/// `services::jobs`; CLOSED and CANCELLED have no outgoing transitions.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[sea_orm(string_value = "CREATED")]
    Created,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "PAUSED")]
    Paused,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
            Self::Closed => "CLOSED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    #[sea_orm(string_value = "BREAKDOWN")]
    Breakdown,
    #[sea_orm(string_value = "PREVENTIVE")]
    Preventive,
    #[sea_orm(string_value = "CORRECTIVE")]
    Corrective,
}

/// Maintenance job. Cost columns are a materialized view of the cost ledger,
/// refreshed on every ledger write; the ledger is authoritative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub failure_type_id: Option<Uuid>,
    pub pm_schedule_id: Option<Uuid>,
    pub title: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub priority: String,
    pub assigned_to: Option<Uuid>,
    pub safety_photo_required: bool,
    pub safety_photo_url: Option<String>,
    /// Cumulative pause time in seconds, maintained by resume transitions
    pub total_pause_seconds: i64,
    pub material_cost: Decimal,
    pub labor_cost: Decimal,
    pub fuel_cost: Decimal,
    pub service_cost: Decimal,
    pub other_cost: Decimal,
    pub total_cost: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
    #[sea_orm(has_many = "super::job_cost_entry::Entity")]
    CostEntries,
    #[sea_orm(has_many = "super::item_request_line::Entity")]
    ItemRequestLines,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::job_cost_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CostEntries.def()
    }
}

impl Related<super::item_request_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemRequestLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
