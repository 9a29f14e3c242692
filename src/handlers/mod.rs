pub mod common;
pub mod dashboard;
pub mod documents;
pub mod products;

use crate::services::{DocumentService, DraftService, LineItemService, ProductCatalogService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<ProductCatalogService>,
    pub line_items: Arc<LineItemService>,
    pub drafts: Arc<DraftService>,
    pub documents: Arc<DocumentService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let catalog = ProductCatalogService::new(db.clone());
        Self {
            line_items: Arc::new(LineItemService::new(catalog.clone())),
            catalog: Arc::new(catalog),
            drafts: Arc::new(DraftService::new(db.clone())),
            documents: Arc::new(DocumentService::new(db)),
        }
    }
}
