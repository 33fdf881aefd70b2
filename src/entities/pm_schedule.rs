use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalType {
    #[sea_orm(string_value = "HOURS")]
    Hours,
    #[sea_orm(string_value = "DAYS")]
    Days,
    #[sea_orm(string_value = "KILOMETERS")]
    Kilometers,
    #[sea_orm(string_value = "MILES")]
    Miles,
}

/// Meter-driven preventive maintenance schedule. `next_due_meter` advances
/// only when a job is generated, never while one is already pending.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pm_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub asset_id: Uuid,
    pub interval_type: IntervalType,
    pub interval_value: Decimal,
    pub last_service_meter: Decimal,
    pub next_due_meter: Decimal,
    /// Job title template; `{asset_code}` and `{asset_description}` are
    /// substituted at generation time
    pub job_title_template: String,
    pub priority: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
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
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
