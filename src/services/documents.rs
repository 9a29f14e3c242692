use crate::{
    db::in_transaction,
    entities::{bill_item, consumption_bill, product, reception_item, reception_sheet},
    errors::ServiceError,
    models::{DocumentKind, DocumentMetadata, LineItem},
    services::{
        catalog::find_by_code,
        drafts::delete_drafts,
        export::{
            bill_file_name, project_bill, project_reception, reception_file_name, render_xlsx,
            ExportedFile,
        },
    },
    session::SessionContext,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// A consumption bill with its items in item-number order.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BillDocument {
    pub bill: consumption_bill::Model,
    pub items: Vec<bill_item::Model>,
}

/// A reception sheet with its items in item-number order.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReceptionDocument {
    pub reception: reception_sheet::Model,
    pub items: Vec<reception_item::Model>,
}

/// Turns session buffers into finalized documents and reads them back.
#[derive(Clone)]
pub struct DocumentService {
    db: Arc<DatabaseConnection>,
}

impl DocumentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finalizes the document described by `metadata` from the matching
    /// buffer in `ctx`.
    ///
    /// Inside one transaction this writes the document and its line items,
    /// adjusts stock for every item (bills subtract, receptions add) and
    /// deletes the drafts of that kind. On commit the buffer is cleared and
    /// the new document id is returned. On any error nothing is written and
    /// `ctx` is left as it was.
    ///
    /// A line item whose product has since been deleted is still recorded;
    /// only its stock adjustment is skipped.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - employee name (bill) or supplier (reception) is blank
    /// * `EmptyDocument` - the buffer has no items
    #[instrument(skip(self, ctx, metadata), fields(kind = %metadata.kind()))]
    pub async fn finalize(
        &self,
        ctx: &mut SessionContext,
        metadata: DocumentMetadata,
    ) -> Result<i32, ServiceError> {
        let metadata = metadata.normalized();
        metadata.ensure_required()?;

        let kind = metadata.kind();
        let items = ctx.buffer(kind).items().to_vec();
        if items.is_empty() {
            return Err(ServiceError::EmptyDocument);
        }
        let item_count = items.len();

        let document_id = in_transaction(&self.db, "finalize_document", move |txn| {
            Box::pin(async move {
                let now = Utc::now();
                let document_id = match metadata {
                    DocumentMetadata::Bill(meta) => {
                        consumption_bill::ActiveModel {
                            id: NotSet,
                            bill_date: Set(now),
                            employee_name: Set(meta.employee_name),
                            employee_signature: Set(meta.employee_signature),
                            is_finished: Set(true),
                        }
                        .insert(txn)
                        .await?
                        .id
                    }
                    DocumentMetadata::Reception(meta) => {
                        reception_sheet::ActiveModel {
                            id: NotSet,
                            reception_date: Set(now),
                            supplier: Set(meta.supplier),
                            document_number: Set(meta.document_number),
                            notes: Set(meta.notes),
                            is_finished: Set(true),
                        }
                        .insert(txn)
                        .await?
                        .id
                    }
                };

                for item in items {
                    adjust_stock(txn, kind, &item).await?;
                    insert_line_item(txn, kind, document_id, item).await?;
                }

                delete_drafts(txn, kind).await?;
                Ok(document_id)
            })
        })
        .await?;

        ctx.buffer_mut(kind).clear();
        match kind {
            DocumentKind::Bill => ctx.bill_draft = None,
            DocumentKind::Reception => ctx.reception_draft = None,
        }

        counter!("stock_ledger.documents.finalized", 1, "kind" => kind.label());
        info!(document_id, %kind, items = item_count, "Document finalized");
        Ok(document_id)
    }

    /// Bills, newest first.
    pub async fn list_bills(&self) -> Result<Vec<consumption_bill::Model>, ServiceError> {
        Ok(consumption_bill::Entity::find()
            .order_by_desc(consumption_bill::Column::BillDate)
            .order_by_desc(consumption_bill::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Reception sheets, newest first.
    pub async fn list_receptions(&self) -> Result<Vec<reception_sheet::Model>, ServiceError> {
        Ok(reception_sheet::Entity::find()
            .order_by_desc(reception_sheet::Column::ReceptionDate)
            .order_by_desc(reception_sheet::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn recent_bills(
        &self,
        limit: u64,
    ) -> Result<Vec<consumption_bill::Model>, ServiceError> {
        Ok(consumption_bill::Entity::find()
            .order_by_desc(consumption_bill::Column::BillDate)
            .order_by_desc(consumption_bill::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    pub async fn recent_receptions(
        &self,
        limit: u64,
    ) -> Result<Vec<reception_sheet::Model>, ServiceError> {
        Ok(reception_sheet::Entity::find()
            .order_by_desc(reception_sheet::Column::ReceptionDate)
            .order_by_desc(reception_sheet::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_bill(&self, id: i32) -> Result<BillDocument, ServiceError> {
        let bill = consumption_bill::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Consumption bill {} not found", id)))?;

        let items = bill_item::Entity::find()
            .filter(bill_item::Column::BillId.eq(id))
            .order_by_asc(bill_item::Column::ItemNumber)
            .all(&*self.db)
            .await?;

        Ok(BillDocument { bill, items })
    }

    #[instrument(skip(self))]
    pub async fn get_reception(&self, id: i32) -> Result<ReceptionDocument, ServiceError> {
        let reception = reception_sheet::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reception sheet {} not found", id)))?;

        let items = reception_item::Entity::find()
            .filter(reception_item::Column::ReceptionId.eq(id))
            .order_by_asc(reception_item::Column::ItemNumber)
            .all(&*self.db)
            .await?;

        Ok(ReceptionDocument { reception, items })
    }

    /// Renders document `id` of `kind` as an xlsx workbook.
    #[instrument(skip(self))]
    pub async fn export(&self, kind: DocumentKind, id: i32) -> Result<ExportedFile, ServiceError> {
        let (file_name, sheet) = match kind {
            DocumentKind::Bill => {
                let document = self.get_bill(id).await?;
                (bill_file_name(&document), project_bill(&document))
            }
            DocumentKind::Reception => {
                let document = self.get_reception(id).await?;
                (reception_file_name(&document), project_reception(&document))
            }
        };

        let bytes = render_xlsx(&sheet)?;
        info!(document_id = id, %kind, size = bytes.len(), "Document exported");
        Ok(ExportedFile { file_name, bytes })
    }
}

async fn insert_line_item<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
    document_id: i32,
    item: LineItem,
) -> Result<(), ServiceError> {
    match kind {
        DocumentKind::Bill => {
            bill_item::ActiveModel {
                id: NotSet,
                bill_id: Set(document_id),
                item_number: Set(item.item_number),
                product_code: Set(item.code),
                product_name: Set(item.name),
                unit: Set(item.unit),
                quantity: Set(item.quantity),
                location: Set(item.location),
            }
            .insert(conn)
            .await?;
        }
        DocumentKind::Reception => {
            reception_item::ActiveModel {
                id: NotSet,
                reception_id: Set(document_id),
                item_number: Set(item.item_number),
                product_code: Set(item.code),
                product_name: Set(item.name),
                unit: Set(item.unit),
                quantity: Set(item.quantity),
                location: Set(item.location),
                entry_date: Set(Utc::now()),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

/// Applies one line item's stock effect. Missing products are skipped.
async fn adjust_stock<C: ConnectionTrait>(
    conn: &C,
    kind: DocumentKind,
    item: &LineItem,
) -> Result<(), ServiceError> {
    let Some(product) = find_by_code(conn, &item.code).await? else {
        warn!(
            code = %item.code,
            item_number = item.item_number,
            %kind,
            "Product no longer exists; stock adjustment skipped"
        );
        counter!("stock_ledger.stock_adjustments.skipped", 1);
        return Ok(());
    };

    let new_quantity = kind.apply_delta(product.quantity, item.quantity);
    let mut active: product::ActiveModel = product.into();
    active.quantity = Set(new_quantity);
    active.update(conn).await?;
    Ok(())
}
