use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stock Ledger",
        version = "1.0.0",
        description = r#"
# Stock Ledger

Warehouse stock keeping: a product catalog plus two document types that move
stock. Consumption bills take stock out; reception sheets bring it in.

## Sessions

Documents are composed item by item in a per-session buffer. The session is
tracked by the `inventory_session` cookie issued on the first request.

## Page flows

Form posts answer `303 See Other` and leave a flash message in the session.
The next page view (any `GET` returning a view model) drains the flashes.

## Error Handling

JSON endpoints share one error body:

```json
{
  "error": "Not Found",
  "message": "Not found: Product with ID 42 not found",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

`add_item` answers `{"error": "..."}` with status 400 instead.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "dashboard", description = "Stock overview"),
        (name = "products", description = "Product catalog"),
        (name = "consumption_bills", description = "Consumption bills; reception routes mirror these under /reception"),
        (name = "reception", description = "Reception sheets")
    ),
    paths(
        crate::handlers::dashboard::dashboard,

        crate::handlers::products::list_products,
        crate::handlers::products::add_product,
        crate::handlers::products::get_product,
        crate::handlers::products::edit_product,
        crate::handlers::products::delete_product,

        crate::handlers::documents::list_bills,
        crate::handlers::documents::list_receptions,
        crate::handlers::documents::builder,
        crate::handlers::documents::load_draft,
        crate::handlers::documents::add_item,
        crate::handlers::documents::remove_item,
        crate::handlers::documents::clear_items,
        crate::handlers::documents::save_draft,
        crate::handlers::documents::finalize,
        crate::handlers::documents::view_bill,
        crate::handlers::documents::view_reception,
        crate::handlers::documents::export_document,
    ),
    components(
        schemas(
            crate::entities::product::Model,
            crate::entities::consumption_bill::Model,
            crate::entities::bill_item::Model,
            crate::entities::reception_sheet::Model,
            crate::entities::reception_item::Model,
            crate::models::DocumentKind,
            crate::models::LineItem,
            crate::models::DocumentMetadata,
            crate::models::BillMetadata,
            crate::models::ReceptionMetadata,
            crate::services::BillDocument,
            crate::services::ReceptionDocument,
            crate::session::Flash,
            crate::session::FlashLevel,
            crate::handlers::dashboard::DashboardView,
            crate::handlers::products::ProductListView,
            crate::handlers::products::ProductForm,
            crate::handlers::documents::BuilderView,
            crate::handlers::documents::BillListView,
            crate::handlers::documents::ReceptionListView,
            crate::handlers::documents::AddItemForm,
            crate::handlers::documents::AddItemResponse,
            crate::handlers::documents::DocumentForm,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_document_routes() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Stock Ledger"));
        assert!(json.contains("/consumption_bills/add_item"));
        assert!(json.contains("/reception/view/{id}"));
        assert!(json.contains("ConsumptionBill"));
    }
}
