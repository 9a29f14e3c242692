use crate::{
    db::in_transaction,
    entities::{draft_bill, draft_bill_item, draft_reception, draft_reception_item},
    errors::ServiceError,
    models::{BillMetadata, DocumentKind, DocumentMetadata, LineItem, ReceptionMetadata},
    session::SessionContext,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

/// A persisted draft with its items in item-number order.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Draft {
    pub metadata: DocumentMetadata,
    pub items: Vec<LineItem>,
    pub last_updated: DateTime<Utc>,
}

/// Single-slot draft storage per document kind.
///
/// Saving deletes every existing draft of the kind and inserts a fresh one
/// in the same transaction, so readers see either the old draft or the new
/// one.
#[derive(Clone)]
pub struct DraftService {
    db: Arc<DatabaseConnection>,
}

fn optional_text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl DraftService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Replaces the draft for `metadata.kind()` with `metadata` and `items`.
    /// Metadata is stored as given; required fields are not checked.
    #[instrument(skip(self, metadata, items), fields(kind = %metadata.kind(), items = items.len()))]
    pub async fn save_draft(
        &self,
        metadata: &DocumentMetadata,
        items: &[LineItem],
    ) -> Result<i32, ServiceError> {
        let metadata = metadata.clone();
        let items = items.to_vec();
        let kind = metadata.kind();

        let draft_id = in_transaction(&self.db, "save_draft", move |txn| {
            Box::pin(async move {
                delete_drafts(txn, kind).await?;
                let now = Utc::now();

                match metadata {
                    DocumentMetadata::Bill(meta) => {
                        let draft = draft_bill::ActiveModel {
                            id: NotSet,
                            employee_name: Set(optional_text(&meta.employee_name)),
                            employee_signature: Set(meta.employee_signature),
                            last_updated: Set(now),
                        }
                        .insert(txn)
                        .await?;

                        for item in items {
                            draft_bill_item::ActiveModel {
                                id: NotSet,
                                draft_id: Set(draft.id),
                                item_number: Set(item.item_number),
                                product_code: Set(item.code),
                                product_name: Set(item.name),
                                unit: Set(item.unit),
                                quantity: Set(item.quantity),
                                location: Set(item.location),
                            }
                            .insert(txn)
                            .await?;
                        }
                        Ok(draft.id)
                    }
                    DocumentMetadata::Reception(meta) => {
                        let draft = draft_reception::ActiveModel {
                            id: NotSet,
                            supplier: Set(optional_text(&meta.supplier)),
                            document_number: Set(meta.document_number),
                            notes: Set(meta.notes),
                            last_updated: Set(now),
                        }
                        .insert(txn)
                        .await?;

                        for item in items {
                            draft_reception_item::ActiveModel {
                                id: NotSet,
                                draft_id: Set(draft.id),
                                item_number: Set(item.item_number),
                                product_code: Set(item.code),
                                product_name: Set(item.name),
                                unit: Set(item.unit),
                                quantity: Set(item.quantity),
                                location: Set(item.location),
                            }
                            .insert(txn)
                            .await?;
                        }
                        Ok(draft.id)
                    }
                }
            })
        })
        .await?;

        info!(draft_id, %kind, "Draft saved");
        Ok(draft_id)
    }

    /// The most recently updated draft of `kind`, if any.
    #[instrument(skip(self))]
    pub async fn load_draft(&self, kind: DocumentKind) -> Result<Option<Draft>, ServiceError> {
        let db = &*self.db;
        let draft = match kind {
            DocumentKind::Bill => {
                let Some(draft) = draft_bill::Entity::find()
                    .order_by_desc(draft_bill::Column::LastUpdated)
                    .order_by_desc(draft_bill::Column::Id)
                    .one(db)
                    .await?
                else {
                    return Ok(None);
                };

                let items = draft_bill_item::Entity::find()
                    .filter(draft_bill_item::Column::DraftId.eq(draft.id))
                    .order_by_asc(draft_bill_item::Column::ItemNumber)
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| LineItem {
                        item_number: row.item_number,
                        code: row.product_code,
                        name: row.product_name,
                        unit: row.unit,
                        quantity: row.quantity,
                        location: row.location,
                    })
                    .collect();

                Draft {
                    metadata: DocumentMetadata::Bill(BillMetadata {
                        employee_name: draft.employee_name.unwrap_or_default(),
                        employee_signature: draft.employee_signature,
                    }),
                    items,
                    last_updated: draft.last_updated,
                }
            }
            DocumentKind::Reception => {
                let Some(draft) = draft_reception::Entity::find()
                    .order_by_desc(draft_reception::Column::LastUpdated)
                    .order_by_desc(draft_reception::Column::Id)
                    .one(db)
                    .await?
                else {
                    return Ok(None);
                };

                let items = draft_reception_item::Entity::find()
                    .filter(draft_reception_item::Column::DraftId.eq(draft.id))
                    .order_by_asc(draft_reception_item::Column::ItemNumber)
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| LineItem {
                        item_number: row.item_number,
                        code: row.product_code,
                        name: row.product_name,
                        unit: row.unit,
                        quantity: row.quantity,
                        location: row.location,
                    })
                    .collect();

                Draft {
                    metadata: DocumentMetadata::Reception(ReceptionMetadata {
                        supplier: draft.supplier.unwrap_or_default(),
                        document_number: draft.document_number,
                        notes: draft.notes,
                    }),
                    items,
                    last_updated: draft.last_updated,
                }
            }
        };

        debug!(%kind, items = draft.items.len(), "Draft loaded");
        Ok(Some(draft))
    }

    /// Loads the `kind` draft and, when one exists, replaces the session's
    /// buffer and remembered header fields with it.
    pub async fn restore_into(
        &self,
        ctx: &mut SessionContext,
        kind: DocumentKind,
    ) -> Result<Option<Draft>, ServiceError> {
        let Some(draft) = self.load_draft(kind).await? else {
            return Ok(None);
        };

        ctx.buffer_mut(kind).replace(draft.items.clone());
        match &draft.metadata {
            DocumentMetadata::Bill(meta) => ctx.bill_draft = Some(meta.clone()),
            DocumentMetadata::Reception(meta) => ctx.reception_draft = Some(meta.clone()),
        }
        Ok(Some(draft))
    }
}

/// Deletes every draft of `kind` and its items on `conn`.
pub async fn delete_drafts<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
) -> Result<(), ServiceError> {
    match kind {
        DocumentKind::Bill => {
            draft_bill_item::Entity::delete_many().exec(conn).await?;
            draft_bill::Entity::delete_many().exec(conn).await?;
        }
        DocumentKind::Reception => {
            draft_reception_item::Entity::delete_many().exec(conn).await?;
            draft_reception::Entity::delete_many().exec(conn).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_text_maps_empty_to_none() {
        assert_eq!(optional_text(""), None);
        assert_eq!(optional_text("Ana"), Some("Ana".to_string()));
    }
}
