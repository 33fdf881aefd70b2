use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Spare-part request line for a job. Invariants checked on every issuance
/// and return: issued_qty <= approved_qty, returned_qty <= issued_qty.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_request_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub item_name: String,
    pub requested_qty: Decimal,
    pub approved_qty: Decimal,
    pub issued_qty: Decimal,
    pub returned_qty: Decimal,
    pub unit_cost: Decimal,
    /// Net issued value: (issued_qty - returned_qty) * unit_cost
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
    /// Quantity issued but not yet returned
    pub fn outstanding_qty(&self) -> Decimal {
        self.issued_qty - self.returned_qty
    }
}
