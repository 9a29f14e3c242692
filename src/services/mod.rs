pub mod catalog;
pub mod documents;
pub mod drafts;
pub mod export;
pub mod line_items;

pub use catalog::{ProductCatalogService, ProductInput};
pub use documents::{BillDocument, DocumentService, ReceptionDocument};
pub use drafts::{Draft, DraftService};
pub use export::ExportedFile;
pub use line_items::LineItemService;
