use crate::{
    entities::product::{self, Column as ProductColumn, Entity as Product},
    errors::ServiceError,
    models::document::non_blank,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Fields accepted when creating or editing a product.
#[derive(Clone, Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 64, message = "Code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "Unit is required"))]
    pub unit: String,
    #[validate(custom = "non_negative")]
    #[schema(value_type = String, example = "10")]
    pub quantity: Decimal,
    pub location: Option<String>,
    #[validate(custom = "non_negative")]
    #[schema(value_type = String, example = "2")]
    pub min_stock: Decimal,
}

impl ProductInput {
    /// Trims text fields; a blank location becomes `None`.
    pub fn normalized(self) -> Self {
        Self {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            unit: self.unit.trim().to_string(),
            location: non_blank(self.location),
            ..self
        }
    }
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Product catalog: CRUD and lookups over `products`.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a product.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - a required field is blank or a quantity is negative
    /// * `DuplicateCode` - another product already uses `input.code`
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        if self.find_by_code(&input.code).await?.is_some() {
            return Err(ServiceError::DuplicateCode(input.code));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: NotSet,
            code: Set(input.code.clone()),
            name: Set(input.name),
            unit: Set(input.unit),
            quantity: Set(input.quantity),
            location: Set(input.location),
            min_stock: Set(input.min_stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_product_write(e, &input.code))?;

        info!(product_id = model.id, code = %model.code, "Product created");
        Ok(model)
    }

    /// Replaces every editable field of product `id`.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no product with `id`
    /// * `DuplicateCode` - the new code belongs to a different product
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn update(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let existing = self.get(id).await?;

        if let Some(other) = self.find_by_code(&input.code).await? {
            if other.id != id {
                return Err(ServiceError::DuplicateCode(input.code));
            }
        }

        let mut active: product::ActiveModel = existing.into();
        active.code = Set(input.code.clone());
        active.name = Set(input.name);
        active.unit = Set(input.unit);
        active.quantity = Set(input.quantity);
        active.location = Set(input.location);
        active.min_stock = Set(input.min_stock);

        let model = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_product_write(e, &input.code))?;

        info!(product_id = id, "Product updated");
        Ok(model)
    }

    /// Deletes product `id`. Line items referencing its code are snapshots
    /// and are left untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product with ID {} not found",
                id
            )));
        }
        info!(product_id = id, "Product deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<product::Model>, ServiceError> {
        find_by_code(&*self.db, code).await
    }

    /// All products ordered by name.
    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(Product::find()
            .order_by_asc(ProductColumn::Name)
            .all(&*self.db)
            .await?)
    }

    /// Products whose code, name or location contains `query`, ignoring case.
    /// A blank query lists everything.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<product::Model>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list().await;
        }

        let pattern = format!("%{}%", query.to_lowercase());
        let matches = |col: ProductColumn| {
            Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone())
        };

        Ok(Product::find()
            .filter(
                Condition::any()
                    .add(matches(ProductColumn::Code))
                    .add(matches(ProductColumn::Name))
                    .add(matches(ProductColumn::Location)),
            )
            .order_by_asc(ProductColumn::Name)
            .all(&*self.db)
            .await?)
    }

    /// Products at or below their minimum stock, lowest quantity first.
    pub async fn list_low_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(Product::find()
            .filter(Expr::col(ProductColumn::Quantity).lte(Expr::col(ProductColumn::MinStock)))
            .order_by_asc(ProductColumn::Quantity)
            .all(&*self.db)
            .await?)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(Product::find().count(&*self.db).await?)
    }
}

/// Looks a product up by code on any connection, including an open
/// transaction.
pub async fn find_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<product::Model>, ServiceError> {
    Ok(Product::find()
        .filter(ProductColumn::Code.eq(code))
        .one(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> ProductInput {
        ProductInput {
            code: "  A1 ".into(),
            name: " Hex bolt M8 ".into(),
            unit: "pcs".into(),
            quantity: dec!(10),
            location: Some("   ".into()),
            min_stock: dec!(2),
        }
    }

    #[test]
    fn normalized_trims_fields() {
        let normalized = input().normalized();
        assert_eq!(normalized.code, "A1");
        assert_eq!(normalized.name, "Hex bolt M8");
        assert_eq!(normalized.location, None);
        assert!(normalized.validate().is_ok());
    }

    #[test]
    fn blank_code_is_rejected() {
        let mut bad = input();
        bad.code = "   ".into();
        assert!(bad.normalized().validate().is_err());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut bad = input();
        bad.quantity = dec!(-1);
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
    }
}
