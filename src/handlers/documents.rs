//! Routes for consumption bills and reception sheets.
//!
//! Both document kinds share one set of handlers; each router carries its
//! [`DocumentKind`] as a request extension.

use super::{
    common::{form_text, item_error_response, success_response, Session},
    AppState,
};
use crate::{
    entities::{consumption_bill, product, reception_sheet},
    errors::ServiceError,
    models::{BillMetadata, DocumentKind, DocumentMetadata, LineItem, ReceptionMetadata},
    services::{line_items::parse_quantity, BillDocument, ReceptionDocument},
    session::Flash,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn base_path(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Bill => "/consumption_bills",
        DocumentKind::Reception => "/reception",
    }
}

fn builder_path(kind: DocumentKind) -> String {
    format!("{}/create", base_path(kind))
}

pub fn bill_routes() -> Router<AppState> {
    routes(DocumentKind::Bill).route(base_path(DocumentKind::Bill), get(list_bills))
}

pub fn reception_routes() -> Router<AppState> {
    routes(DocumentKind::Reception).route(base_path(DocumentKind::Reception), get(list_receptions))
}

fn routes(kind: DocumentKind) -> Router<AppState> {
    let base = base_path(kind);
    let view = match kind {
        DocumentKind::Bill => get(view_bill),
        DocumentKind::Reception => get(view_reception),
    };

    Router::new()
        .route(&format!("{base}/create"), get(builder))
        .route(&format!("{base}/load_draft"), get(load_draft))
        .route(&format!("{base}/add_item"), post(add_item))
        .route(&format!("{base}/remove_item/:index"), get(remove_item))
        .route(&format!("{base}/clear"), get(clear_items))
        .route(&format!("{base}/save_draft"), post(save_draft))
        .route(&format!("{base}/finalize"), post(finalize))
        .route(&format!("{base}/view/:id"), view)
        .route(&format!("{base}/export/:id"), get(export_document))
        .layer(Extension(kind))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuilderView {
    pub kind: DocumentKind,
    /// Items currently in the session buffer
    pub items: Vec<LineItem>,
    /// Header fields from the loaded draft, if any
    pub draft: Option<DocumentMetadata>,
    pub products: Vec<product::Model>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BillListView {
    pub bills: Vec<consumption_bill::Model>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceptionListView {
    pub receptions: Vec<reception_sheet::Model>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AddItemForm {
    #[serde(alias = "productCode")]
    pub product_code: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddItemResponse {
    pub success: bool,
    pub item: LineItem,
}

/// Header fields posted with save-draft and finalize. Fields that do not
/// belong to the route's document kind are ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DocumentForm {
    pub employee_name: Option<String>,
    pub employee_signature: Option<String>,
    pub supplier: Option<String>,
    pub document_number: Option<String>,
    pub notes: Option<String>,
}

impl DocumentForm {
    fn into_metadata(self, kind: DocumentKind) -> DocumentMetadata {
        match kind {
            DocumentKind::Bill => DocumentMetadata::Bill(BillMetadata {
                employee_name: form_text(self.employee_name),
                employee_signature: self.employee_signature,
            }),
            DocumentKind::Reception => DocumentMetadata::Reception(ReceptionMetadata {
                supplier: form_text(self.supplier),
                document_number: self.document_number,
                notes: self.notes,
            }),
        }
    }
}

fn draft_metadata(session: &Session, kind: DocumentKind) -> Option<DocumentMetadata> {
    match kind {
        DocumentKind::Bill => session.ctx.bill_draft.clone().map(DocumentMetadata::Bill),
        DocumentKind::Reception => session
            .ctx
            .reception_draft
            .clone()
            .map(DocumentMetadata::Reception),
    }
}

/// List consumption bills, newest first
#[utoipa::path(
    get,
    path = "/consumption_bills",
    responses(
        (status = 200, description = "Bills returned", body = BillListView),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "consumption_bills"
)]
pub async fn list_bills(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let bills = state.services.documents.list_bills().await?;
    Ok(Json(BillListView {
        bills,
        flashes: session.into_flashes(),
    }))
}

/// List reception sheets, newest first
#[utoipa::path(
    get,
    path = "/reception",
    responses(
        (status = 200, description = "Reception sheets returned", body = ReceptionListView),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "reception"
)]
pub async fn list_receptions(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let receptions = state.services.documents.list_receptions().await?;
    Ok(Json(ReceptionListView {
        receptions,
        flashes: session.into_flashes(),
    }))
}

/// Document builder: buffered items, draft header fields and the product list.
///
/// On the first visit of a session with an untouched, empty buffer, the
/// saved draft is restored into it.
#[utoipa::path(
    get,
    path = "/consumption_bills/create",
    responses(
        (status = 200, description = "Builder view returned; mirrored at /reception/create", body = BuilderView),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "consumption_bills"
)]
pub async fn builder(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    mut session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let services = &state.services;
    if session.ctx.offer_draft(kind) && session.ctx.buffer(kind).is_empty() {
        services.drafts.restore_into(&mut session.ctx, kind).await?;
    }

    let products = services.catalog.list().await?;
    let view = BuilderView {
        kind,
        items: session.ctx.buffer(kind).items().to_vec(),
        draft: draft_metadata(&session, kind),
        products,
        flashes: session.ctx.take_flashes(),
    };
    session.save();
    Ok(Json(view))
}

/// Replace the buffer with the saved draft
#[utoipa::path(
    get,
    path = "/consumption_bills/load_draft",
    responses(
        (status = 303, description = "Redirect to the builder; mirrored at /reception/load_draft")
    ),
    tag = "consumption_bills"
)]
pub async fn load_draft(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    mut session: Session,
) -> Result<Response, ServiceError> {
    match state.services.drafts.restore_into(&mut session.ctx, kind).await? {
        Some(draft) => session
            .ctx
            .flash_success(format!("Draft loaded with {} item(s)", draft.items.len())),
        None => session.ctx.flash_error("No saved draft"),
    }
    Ok(session.redirect(&builder_path(kind)))
}

/// Add a product to the document being built
#[utoipa::path(
    post,
    path = "/consumption_bills/add_item",
    request_body(content = AddItemForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Item added; mirrored at /reception/add_item", body = AddItemResponse),
        (status = 400, description = "Unknown product, bad quantity or insufficient stock",
            example = json!({"error": "Product 'Z9' not found"})
        )
    ),
    tag = "consumption_bills"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    mut session: Session,
    Form(form): Form<AddItemForm>,
) -> Response {
    let code = form_text(form.product_code);
    if code.is_empty() {
        return item_error_response(ServiceError::ValidationError(
            "Product code is required".to_string(),
        ));
    }
    let quantity = match parse_quantity(form.quantity.as_deref().unwrap_or_default()) {
        Ok(quantity) => quantity,
        Err(e) => return item_error_response(e),
    };

    match state
        .services
        .line_items
        .add_item(&mut session.ctx, kind, &code, quantity)
        .await
    {
        Ok(item) => {
            session.save();
            success_response(AddItemResponse {
                success: true,
                item,
            })
        }
        Err(e) => item_error_response(e),
    }
}

/// Remove the item at a 0-based index; out-of-range indexes are ignored
#[utoipa::path(
    get,
    path = "/consumption_bills/remove_item/{index}",
    params(("index" = usize, Path, description = "0-based item position")),
    responses(
        (status = 303, description = "Redirect to the builder; mirrored at /reception/remove_item/{index}")
    ),
    tag = "consumption_bills"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    Path(index): Path<usize>,
    mut session: Session,
) -> Response {
    if let Some(item) = state
        .services
        .line_items
        .remove_item(&mut session.ctx, kind, index)
    {
        session
            .ctx
            .flash_success(format!("Item '{}' removed", item.code));
    }
    session.redirect(&builder_path(kind))
}

/// Empty the buffer
#[utoipa::path(
    get,
    path = "/consumption_bills/clear",
    responses(
        (status = 303, description = "Redirect to the builder; mirrored at /reception/clear")
    ),
    tag = "consumption_bills"
)]
pub async fn clear_items(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    mut session: Session,
) -> Response {
    state.services.line_items.clear(&mut session.ctx, kind);
    session.redirect(&builder_path(kind))
}

/// Save the buffer and header fields as the draft
#[utoipa::path(
    post,
    path = "/consumption_bills/save_draft",
    request_body(content = DocumentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the builder; mirrored at /reception/save_draft")
    ),
    tag = "consumption_bills"
)]
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    mut session: Session,
    Form(form): Form<DocumentForm>,
) -> Response {
    let metadata = form.into_metadata(kind);
    let items = session.ctx.buffer(kind).items().to_vec();

    match state.services.drafts.save_draft(&metadata, &items).await {
        Ok(_) => {
            match metadata {
                DocumentMetadata::Bill(meta) => session.ctx.bill_draft = Some(meta),
                DocumentMetadata::Reception(meta) => session.ctx.reception_draft = Some(meta),
            }
            session.ctx.flash_success("Draft saved");
        }
        Err(e) => {
            warn!(error = %e, %kind, "Draft could not be saved");
            session.ctx.flash_error(e.flash_message());
        }
    }
    session.redirect(&builder_path(kind))
}

/// Finalize the document: store it, apply stock changes and clear the buffer
#[utoipa::path(
    post,
    path = "/consumption_bills/finalize",
    request_body(content = DocumentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the list on success or back to the builder with an error flash; mirrored at /reception/finalize")
    ),
    tag = "consumption_bills"
)]
pub async fn finalize(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    mut session: Session,
    Form(form): Form<DocumentForm>,
) -> Response {
    let metadata = form.into_metadata(kind);

    match state
        .services
        .documents
        .finalize(&mut session.ctx, metadata)
        .await
    {
        Ok(id) => {
            session
                .ctx
                .flash_success(format!("{} #{} finalized", capitalized(kind.label()), id));
            session.redirect(base_path(kind))
        }
        Err(e) => {
            warn!(error = %e, %kind, "Finalize rejected");
            session.ctx.flash_error(e.flash_message());
            session.redirect(&builder_path(kind))
        }
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Get a finalized consumption bill with its items
#[utoipa::path(
    get,
    path = "/consumption_bills/view/{id}",
    params(("id" = i32, Path, description = "Consumption bill ID")),
    responses(
        (status = 200, description = "Bill returned", body = BillDocument),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "consumption_bills"
)]
pub async fn view_bill(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BillDocument>, ServiceError> {
    Ok(Json(state.services.documents.get_bill(id).await?))
}

/// Get a finalized reception sheet with its items
#[utoipa::path(
    get,
    path = "/reception/view/{id}",
    params(("id" = i32, Path, description = "Reception sheet ID")),
    responses(
        (status = 200, description = "Reception sheet returned", body = ReceptionDocument),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "reception"
)]
pub async fn view_reception(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReceptionDocument>, ServiceError> {
    Ok(Json(state.services.documents.get_reception(id).await?))
}

/// Download a finalized document as an xlsx workbook
#[utoipa::path(
    get,
    path = "/consumption_bills/export/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Workbook attachment; mirrored at /reception/export/{id}"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "consumption_bills"
)]
pub async fn export_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let file = state.services.documents.export(kind, id).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        file.file_name
    ))
    .map_err(|e| ServiceError::ExportError(e.to_string()))?;

    let mut response = file.bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_form_keeps_only_fields_of_the_kind() {
        let form = DocumentForm {
            employee_name: Some(" Ana ".into()),
            supplier: Some("Acme".into()),
            ..Default::default()
        };

        match form.into_metadata(DocumentKind::Bill) {
            DocumentMetadata::Bill(meta) => assert_eq!(meta.employee_name, "Ana"),
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[test]
    fn builder_path_follows_kind() {
        assert_eq!(builder_path(DocumentKind::Bill), "/consumption_bills/create");
        assert_eq!(builder_path(DocumentKind::Reception), "/reception/create");
    }

    #[test]
    fn capitalized_uppercases_first_letter() {
        assert_eq!(capitalized("consumption bill"), "Consumption bill");
        assert_eq!(capitalized(""), "");
    }
}
