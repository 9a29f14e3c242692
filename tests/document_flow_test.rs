mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use stock_ledger::{
    errors::ServiceError,
    models::{BillMetadata, DocumentKind, DocumentMetadata, ReceptionMetadata},
};

use common::{new_context, TestApp};

fn bill_meta(employee: &str) -> DocumentMetadata {
    DocumentMetadata::Bill(BillMetadata {
        employee_name: employee.to_string(),
        employee_signature: None,
    })
}

fn reception_meta(supplier: &str) -> DocumentMetadata {
    DocumentMetadata::Reception(ReceptionMetadata {
        supplier: supplier.to_string(),
        document_number: Some("INV-1".to_string()),
        notes: None,
    })
}

#[tokio::test]
async fn bill_checks_live_stock_and_finalize_subtracts() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    let item = services
        .line_items
        .add_item(&mut ctx, DocumentKind::Bill, "A1", dec!(4))
        .await
        .unwrap();
    assert_eq!(item.item_number, 1);
    assert_eq!(item.name, "Product A1");
    assert_eq!(item.location.as_deref(), Some("Rack 1"));

    let err = services
        .line_items
        .add_item(&mut ctx, DocumentKind::Bill, "A1", dec!(11))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));
    assert_eq!(ctx.buffer(DocumentKind::Bill).len(), 1);

    let id = services
        .documents
        .finalize(&mut ctx, bill_meta("Ana Pop"))
        .await
        .unwrap();

    assert_eq!(app.product_quantity("A1").await, dec!(6));
    assert!(ctx.buffer(DocumentKind::Bill).is_empty());

    let document = services.documents.get_bill(id).await.unwrap();
    assert_eq!(document.bill.employee_name, "Ana Pop");
    assert!(document.bill.is_finished);
    assert_eq!(document.items.len(), 1);
    assert_eq!(document.items[0].quantity, dec!(4));
}

#[tokio::test]
async fn bill_accepts_quantity_equal_to_stock() {
    let app = TestApp::new().await;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    app.state
        .services
        .line_items
        .add_item(&mut ctx, DocumentKind::Bill, "A1", dec!(10))
        .await
        .unwrap();
    app.state
        .services
        .documents
        .finalize(&mut ctx, bill_meta("Ana"))
        .await
        .unwrap();

    assert_eq!(app.product_quantity("A1").await, dec!(0));
}

#[tokio::test]
async fn reception_has_no_stock_check_and_adds() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(1)).await;
    let mut ctx = new_context();

    services
        .line_items
        .add_item(&mut ctx, DocumentKind::Reception, "A1", dec!(50))
        .await
        .unwrap();
    services
        .line_items
        .add_item(&mut ctx, DocumentKind::Reception, "A1", dec!(2.5))
        .await
        .unwrap();

    let id = services
        .documents
        .finalize(&mut ctx, reception_meta("Acme"))
        .await
        .unwrap();

    assert_eq!(app.product_quantity("A1").await, dec!(53.5));
    let document = services.documents.get_reception(id).await.unwrap();
    assert_eq!(document.reception.supplier, "Acme");
    let numbers: Vec<_> = document.items.iter().map(|i| i.item_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn add_item_rejects_unknown_code_and_non_positive_quantity() {
    let app = TestApp::new().await;
    let line_items = &app.state.services.line_items;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    assert_matches!(
        line_items
            .add_item(&mut ctx, DocumentKind::Bill, "Z9", dec!(1))
            .await,
        Err(ServiceError::ProductNotFound(code)) if code == "Z9"
    );
    assert_matches!(
        line_items
            .add_item(&mut ctx, DocumentKind::Reception, "A1", dec!(0))
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert!(ctx.buffer(DocumentKind::Bill).is_empty());
    assert!(ctx.buffer(DocumentKind::Reception).is_empty());
}

#[tokio::test]
async fn finalize_requires_items_and_header_fields() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    assert_matches!(
        services
            .documents
            .finalize(&mut ctx, bill_meta("Ana"))
            .await,
        Err(ServiceError::EmptyDocument)
    );

    services
        .line_items
        .add_item(&mut ctx, DocumentKind::Reception, "A1", dec!(1))
        .await
        .unwrap();
    assert_matches!(
        services
            .documents
            .finalize(&mut ctx, reception_meta("   "))
            .await,
        Err(ServiceError::ValidationError(msg)) if msg == "Supplier is required"
    );

    assert_eq!(ctx.buffer(DocumentKind::Reception).len(), 1);
    assert!(services.documents.list_receptions().await.unwrap().is_empty());
    assert_eq!(app.product_quantity("A1").await, dec!(10));
}

#[tokio::test]
async fn finalize_records_items_of_deleted_products() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let gone = app.seed_product("G1", dec!(10)).await;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    for code in ["G1", "A1"] {
        services
            .line_items
            .add_item(&mut ctx, DocumentKind::Bill, code, dec!(3))
            .await
            .unwrap();
    }
    services.catalog.delete(gone.id).await.unwrap();

    let id = services
        .documents
        .finalize(&mut ctx, bill_meta("Ana"))
        .await
        .unwrap();

    let document = services.documents.get_bill(id).await.unwrap();
    assert_eq!(document.items.len(), 2);
    assert_eq!(document.items[0].product_code, "G1");
    assert_eq!(app.product_quantity("A1").await, dec!(7));
}

#[tokio::test]
async fn failed_finalize_rolls_back_everything() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    services
        .line_items
        .add_item(&mut ctx, DocumentKind::Bill, "A1", dec!(4))
        .await
        .unwrap();
    services
        .drafts
        .save_draft(&bill_meta("Ana"), ctx.buffer(DocumentKind::Bill).items())
        .await
        .unwrap();

    // Line item inserts now fail after the header and stock update went through.
    app.execute("DROP TABLE bill_items").await;

    let err = services
        .documents
        .finalize(&mut ctx, bill_meta("Ana"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DatabaseError(_));

    assert_eq!(app.product_quantity("A1").await, dec!(10));
    assert!(services.documents.list_bills().await.unwrap().is_empty());
    assert!(services
        .drafts
        .load_draft(DocumentKind::Bill)
        .await
        .unwrap()
        .is_some());
    assert_eq!(ctx.buffer(DocumentKind::Bill).len(), 1);
}

#[tokio::test]
async fn finalize_deletes_drafts_of_that_kind_only() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    services
        .drafts
        .save_draft(&reception_meta("Acme"), &[])
        .await
        .unwrap();
    services
        .line_items
        .add_item(&mut ctx, DocumentKind::Bill, "A1", dec!(1))
        .await
        .unwrap();
    services
        .drafts
        .save_draft(&bill_meta("Ana"), ctx.buffer(DocumentKind::Bill).items())
        .await
        .unwrap();

    services
        .documents
        .finalize(&mut ctx, bill_meta("Ana"))
        .await
        .unwrap();

    assert!(services
        .drafts
        .load_draft(DocumentKind::Bill)
        .await
        .unwrap()
        .is_none());
    assert!(services
        .drafts
        .load_draft(DocumentKind::Reception)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn listings_are_newest_first() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(100)).await;
    let mut ctx = new_context();

    let mut ids = Vec::new();
    for employee in ["First", "Second", "Third"] {
        services
            .line_items
            .add_item(&mut ctx, DocumentKind::Bill, "A1", dec!(1))
            .await
            .unwrap();
        ids.push(
            services
                .documents
                .finalize(&mut ctx, bill_meta(employee))
                .await
                .unwrap(),
        );
    }

    let listed: Vec<_> = services
        .documents
        .list_bills()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);

    let recent = services.documents.recent_bills(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].employee_name, "Third");
}

#[tokio::test]
async fn export_returns_workbook_named_after_document() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    app.seed_product("A1", dec!(10)).await;
    let mut ctx = new_context();

    services
        .line_items
        .add_item(&mut ctx, DocumentKind::Reception, "A1", dec!(2))
        .await
        .unwrap();
    let id = services
        .documents
        .finalize(&mut ctx, reception_meta("Acme"))
        .await
        .unwrap();

    let file = services
        .documents
        .export(DocumentKind::Reception, id)
        .await
        .unwrap();
    assert!(file.file_name.starts_with(&format!("reception_{}_", id)));
    assert!(file.file_name.ends_with(".xlsx"));
    assert!(file.bytes.starts_with(b"PK"));

    assert_matches!(
        services.documents.export(DocumentKind::Bill, 999).await,
        Err(ServiceError::NotFound(_))
    );
}
