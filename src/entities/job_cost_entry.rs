use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostType {
    #[sea_orm(string_value = "MATERIAL")]
    Material,
    #[sea_orm(string_value = "LABOR")]
    Labor,
    #[sea_orm(string_value = "FUEL")]
    Fuel,
    #[sea_orm(string_value = "SERVICE")]
    Service,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl CostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "MATERIAL",
            Self::Labor => "LABOR",
            Self::Fuel => "FUEL",
            Self::Service => "SERVICE",
            Self::Other => "OTHER",
        }
    }
}

/// Append-only cost ledger entry. Never updated or deleted; a return or
/// correction is a new negative-amount entry. `seq_no` is monotonic per job
/// and `running_total` is the ledger balance after this entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_cost_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub seq_no: i64,
    pub cost_type: CostType,
    /// Signed amount; negative = credit/return
    pub amount: Decimal,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub running_total: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_by: Uuid,
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

impl Model {
    pub fn is_credit(&self) -> bool {
        self.amount.is_sign_negative()
    }
}
