use crate::{
    errors::ServiceError,
    models::{DocumentKind, LineItem},
    services::catalog::ProductCatalogService,
    session::SessionContext,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Builds up the line items of a document inside a session.
#[derive(Clone)]
pub struct LineItemService {
    catalog: ProductCatalogService,
}

impl LineItemService {
    pub fn new(catalog: ProductCatalogService) -> Self {
        Self { catalog }
    }

    /// Appends a snapshot of product `product_code` to the `kind` buffer.
    ///
    /// Consumption bills reject quantities above the product's current
    /// catalog quantity. Items already pending in the buffer are not
    /// subtracted before the comparison.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - `quantity` is zero or negative
    /// * `ProductNotFound` - no product has `product_code`
    /// * `InsufficientStock` - bill quantity exceeds stock on hand
    #[instrument(skip(self, ctx))]
    pub async fn add_item(
        &self,
        ctx: &mut SessionContext,
        kind: DocumentKind,
        product_code: &str,
        quantity: Decimal,
    ) -> Result<LineItem, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let code = product_code.trim();
        let product = self
            .catalog
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(code.to_string()))?;

        if kind.checks_stock() && quantity > product.quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "Requested {} {} of '{}' but only {} in stock",
                quantity, product.unit, product.code, product.quantity
            )));
        }

        let item = ctx
            .buffer_mut(kind)
            .push(
                product.code,
                product.name,
                product.unit,
                quantity,
                product.location,
            )
            .clone();

        debug!(
            item_number = item.item_number,
            code = %item.code,
            %quantity,
            "Line item added"
        );
        Ok(item)
    }

    /// Removes the item at 0-based `index`. Out-of-range indexes do nothing.
    pub fn remove_item(
        &self,
        ctx: &mut SessionContext,
        kind: DocumentKind,
        index: usize,
    ) -> Option<LineItem> {
        ctx.buffer_mut(kind).remove(index)
    }

    pub fn clear(&self, ctx: &mut SessionContext, kind: DocumentKind) {
        ctx.buffer_mut(kind).clear();
    }
}

/// Parses a quantity typed into a form field. Accepts a decimal comma.
pub fn parse_quantity(raw: &str) -> Result<Decimal, ServiceError> {
    let cleaned = raw.trim().replace(',', ".");
    Decimal::from_str(&cleaned)
        .map_err(|_| ServiceError::ValidationError(format!("Invalid quantity '{}'", raw.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_quantity_accepts_plain_and_comma_decimals() {
        assert_eq!(parse_quantity("4").unwrap(), dec!(4));
        assert_eq!(parse_quantity(" 2.5 ").unwrap(), dec!(2.5));
        assert_eq!(parse_quantity("2,5").unwrap(), dec!(2.5));
    }

    #[test]
    fn parse_quantity_rejects_garbage() {
        assert!(matches!(
            parse_quantity("four"),
            Err(ServiceError::ValidationError(_))
        ));
        assert!(parse_quantity("").is_err());
    }
}
