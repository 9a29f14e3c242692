use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A stock item tracked by the catalog, keyed by its unique `code`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "products")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique product code
    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 64, message = "Code must be between 1 and 64 characters"))]
    pub code: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    /// Unit of measure (pcs, kg, m, ...)
    #[validate(length(min = 1, max = 32, message = "Unit must be between 1 and 32 characters"))]
    pub unit: String,

    /// Quantity on hand
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity: Decimal,

    /// Storage location
    pub location: Option<String>,

    /// Low-stock threshold
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub min_stock: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(quantity: Decimal, min_stock: Decimal) -> Model {
        Model {
            id: 1,
            code: "A1".into(),
            name: "Bolt".into(),
            unit: "pcs".into(),
            quantity,
            location: None,
            min_stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_includes_threshold() {
        assert!(product(dec!(5), dec!(5)).is_low_stock());
        assert!(product(dec!(4.5), dec!(5)).is_low_stock());
        assert!(!product(dec!(5.01), dec!(5)).is_low_stock());
    }

    #[test]
    fn empty_code_fails_validation() {
        let mut model = product(dec!(1), dec!(0));
        model.code = String::new();
        assert!(model.validate().is_err());
    }
}
