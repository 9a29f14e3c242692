use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A finalized stock-out document. Rows are written once by the finalizer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "consumption_bills")]
#[schema(as = ConsumptionBill)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bill_date: DateTime<Utc>,
    pub employee_name: String,
    pub employee_signature: Option<String>,
    pub is_finished: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_item::Entity")]
    Items,
}

impl Related<super::bill_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
