use super::{
    common::{form_text, Session},
    AppState,
};
use crate::{
    entities::product,
    errors::ServiceError,
    services::{line_items::parse_quantity, ProductInput},
    session::Flash,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const PRODUCTS_PAGE: &str = "/products";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductSearch {
    /// Matches code, name or location, ignoring case
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListView {
    pub products: Vec<product::Model>,
    pub search: String,
    pub flashes: Vec<Flash>,
}

/// Product fields as posted by the add and edit forms.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductForm {
    pub code: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<String>,
    pub location: Option<String>,
    pub min_stock: Option<String>,
}

impl ProductForm {
    fn into_input(self) -> Result<ProductInput, ServiceError> {
        let quantity = parse_quantity(self.quantity.as_deref().unwrap_or_default())?;
        let min_stock = match self.min_stock.as_deref().map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => parse_quantity(raw)?,
        };

        Ok(ProductInput {
            code: form_text(self.code),
            name: form_text(self.name),
            unit: form_text(self.unit),
            quantity,
            location: self.location,
            min_stock,
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/add", post(add_product))
        .route("/products/edit/:id", get(get_product).post(edit_product))
        .route("/products/delete/:id", get(delete_product))
}

/// List products, optionally filtered by a search term
#[utoipa::path(
    get,
    path = "/products",
    params(ProductSearch),
    responses(
        (status = 200, description = "Products returned", body = ProductListView,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductSearch>,
) -> Result<impl IntoResponse, ServiceError> {
    let search = query.search.unwrap_or_default();
    let products = state.services.catalog.search(&search).await?;

    Ok(Json(ProductListView {
        products,
        search,
        flashes: session.into_flashes(),
    }))
}

/// Create a product, then redirect to the product list
#[utoipa::path(
    post,
    path = "/products/add",
    request_body(content = ProductForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /products with a flash message")
    ),
    tag = "products"
)]
pub async fn add_product(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<ProductForm>,
) -> Response {
    let result = match form.into_input() {
        Ok(input) => state.services.catalog.create(input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(product) => session
            .ctx
            .flash_success(format!("Product '{}' added", product.code)),
        Err(e) => session.ctx.flash_error(e.flash_message()),
    }
    session.redirect(PRODUCTS_PAGE)
}

/// Get a product for editing
#[utoipa::path(
    get,
    path = "/products/edit/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = product::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.get(id).await?;
    Ok(Json(product))
}

/// Update a product, then redirect to the product list
#[utoipa::path(
    post,
    path = "/products/edit/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content = ProductForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /products with a flash message"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn edit_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response, ServiceError> {
    let result = match form.into_input() {
        Ok(input) => state.services.catalog.update(id, input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(product) => session
            .ctx
            .flash_success(format!("Product '{}' updated", product.code)),
        Err(e @ ServiceError::NotFound(_)) => return Err(e),
        Err(e) => session.ctx.flash_error(e.flash_message()),
    }
    Ok(session.redirect(PRODUCTS_PAGE))
}

/// Delete a product, then redirect to the product list
#[utoipa::path(
    get,
    path = "/products/delete/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 303, description = "Redirect to /products with a flash message"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut session: Session,
) -> Result<Response, ServiceError> {
    state.services.catalog.delete(id).await?;
    session.ctx.flash_success("Product deleted");
    Ok(session.redirect(PRODUCTS_PAGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn form_defaults_min_stock_to_zero() {
        let form = ProductForm {
            code: Some("A1".into()),
            name: Some("Bolt".into()),
            unit: Some("pcs".into()),
            quantity: Some("10,5".into()),
            ..Default::default()
        };

        let input = form.into_input().unwrap();
        assert_eq!(input.quantity, dec!(10.5));
        assert_eq!(input.min_stock, Decimal::ZERO);
    }

    #[test]
    fn form_rejects_unparseable_quantity() {
        let form = ProductForm {
            quantity: Some("ten".into()),
            ..Default::default()
        };
        assert!(matches!(
            form.into_input(),
            Err(ServiceError::ValidationError(_))
        ));
    }
}
