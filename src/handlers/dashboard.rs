use super::{common::Session, AppState};
use crate::{
    entities::{consumption_bill, product, reception_sheet},
    errors::ServiceError,
    session::Flash,
};
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    /// Products at or below their minimum stock
    pub low_stock_products: Vec<product::Model>,
    pub total_products: u64,
    pub recent_bills: Vec<consumption_bill::Model>,
    pub recent_receptions: Vec<reception_sheet::Model>,
    pub flashes: Vec<Flash>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Stock overview with the latest documents
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Dashboard returned", body = DashboardView,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let limit = state.config.recent_documents_limit;
    let services = &state.services;

    let view = DashboardView {
        low_stock_products: services.catalog.list_low_stock().await?,
        total_products: services.catalog.count().await?,
        recent_bills: services.documents.recent_bills(limit).await?,
        recent_receptions: services.documents.recent_receptions(limit).await?,
        flashes: session.into_flashes(),
    };
    Ok(Json(view))
}
