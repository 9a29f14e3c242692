use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staging copy of a consumption bill. At most one row is live at a time;
/// saving replaces every existing row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "draft_bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub employee_name: Option<String>,
    pub employee_signature: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::draft_bill_item::Entity")]
    Items,
}

impl Related<super::draft_bill_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
