use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A finalized stock-in document.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reception_sheets")]
#[schema(as = ReceptionSheet)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reception_date: DateTime<Utc>,
    pub supplier: String,
    pub document_number: Option<String>,
    pub notes: Option<String>,
    pub is_finished: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reception_item::Entity")]
    Items,
}

impl Related<super::reception_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
