use super::buffer::LineItemBuffer;
use crate::models::{BillMetadata, DocumentKind, ReceptionMetadata};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next page view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Per-session working state.
///
/// Buffer operations take this context explicitly; nothing about the
/// document being composed lives in process-wide state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionContext {
    bill_items: LineItemBuffer,
    reception_items: LineItemBuffer,
    /// Header fields from the last loaded bill draft
    pub bill_draft: Option<BillMetadata>,
    /// Header fields from the last loaded reception draft
    pub reception_draft: Option<ReceptionMetadata>,
    bill_draft_offered: bool,
    reception_draft_offered: bool,
    flashes: Vec<Flash>,
}

impl SessionContext {
    pub fn buffer(&self, kind: DocumentKind) -> &LineItemBuffer {
        match kind {
            DocumentKind::Bill => &self.bill_items,
            DocumentKind::Reception => &self.reception_items,
        }
    }

    /// Mutable access to the `kind` buffer. Once a session has changed its
    /// buffer, the saved draft is no longer restored into it automatically.
    pub fn buffer_mut(&mut self, kind: DocumentKind) -> &mut LineItemBuffer {
        match kind {
            DocumentKind::Bill => {
                self.bill_draft_offered = true;
                &mut self.bill_items
            }
            DocumentKind::Reception => {
                self.reception_draft_offered = true;
                &mut self.reception_items
            }
        }
    }

    /// Returns `true` only if the `kind` draft has not been offered yet and
    /// the buffer has never been changed in this session.
    pub fn offer_draft(&mut self, kind: DocumentKind) -> bool {
        let offered = match kind {
            DocumentKind::Bill => &mut self.bill_draft_offered,
            DocumentKind::Reception => &mut self.reception_draft_offered,
        };
        !std::mem::replace(offered, true)
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn flash_success(&mut self, message: impl Into<String>) {
        self.flash(FlashLevel::Success, message);
    }

    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.flash(FlashLevel::Error, message);
    }

    /// Drains pending flashes.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn buffers_are_independent_per_kind() {
        let mut ctx = SessionContext::default();
        ctx.buffer_mut(DocumentKind::Bill).push(
            "A1".into(),
            "Bolt".into(),
            "pcs".into(),
            dec!(2),
            None,
        );

        assert_eq!(ctx.buffer(DocumentKind::Bill).len(), 1);
        assert!(ctx.buffer(DocumentKind::Reception).is_empty());
    }

    #[test]
    fn draft_is_offered_once_per_kind() {
        let mut ctx = SessionContext::default();
        assert!(ctx.offer_draft(DocumentKind::Bill));
        assert!(!ctx.offer_draft(DocumentKind::Bill));
        assert!(ctx.offer_draft(DocumentKind::Reception));

        let mut ctx = SessionContext::default();
        ctx.buffer_mut(DocumentKind::Reception).clear();
        assert!(!ctx.offer_draft(DocumentKind::Reception));
        assert!(ctx.offer_draft(DocumentKind::Bill));
    }

    #[test]
    fn flashes_are_drained_once() {
        let mut ctx = SessionContext::default();
        ctx.flash_success("Product added");
        ctx.flash_error("Code taken");

        let flashes = ctx.take_flashes();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].level, FlashLevel::Success);
        assert!(ctx.take_flashes().is_empty());
    }
}
