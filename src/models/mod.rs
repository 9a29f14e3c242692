pub mod document;

pub use document::{
    BillMetadata, DocumentKind, DocumentMetadata, LineItem, ReceptionMetadata,
};
