use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_products_table::Migration),
            Box::new(m20240301_000002_create_consumption_bill_tables::Migration),
            Box::new(m20240301_000003_create_reception_tables::Migration),
            Box::new(m20240301_000004_create_draft_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Unit).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Products::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Location).string().null())
                        .col(
                            ColumnDef::new(Products::MinStock)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_name")
                        .table(Products::Table)
                        .col(Products::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Code,
        Name,
        Unit,
        Quantity,
        Location,
        MinStock,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_consumption_bill_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_consumption_bill_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ConsumptionBills::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConsumptionBills::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ConsumptionBills::BillDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumptionBills::EmployeeName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumptionBills::EmployeeSignature)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ConsumptionBills::IsFinished)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BillItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BillItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(BillItems::BillId).integer().not_null())
                        .col(ColumnDef::new(BillItems::ItemNumber).integer().not_null())
                        .col(ColumnDef::new(BillItems::ProductCode).string_len(64).not_null())
                        .col(ColumnDef::new(BillItems::ProductName).string().not_null())
                        .col(ColumnDef::new(BillItems::Unit).string_len(32).not_null())
                        .col(
                            ColumnDef::new(BillItems::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(BillItems::Location).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bill_items_bill_id")
                                .from(BillItems::Table, BillItems::BillId)
                                .to(ConsumptionBills::Table, ConsumptionBills::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bill_items_bill_id")
                        .table(BillItems::Table)
                        .col(BillItems::BillId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BillItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ConsumptionBills::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ConsumptionBills {
        Table,
        Id,
        BillDate,
        EmployeeName,
        EmployeeSignature,
        IsFinished,
    }

    #[derive(DeriveIden)]
    enum BillItems {
        Table,
        Id,
        BillId,
        ItemNumber,
        ProductCode,
        ProductName,
        Unit,
        Quantity,
        Location,
    }
}

mod m20240301_000003_create_reception_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_reception_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReceptionSheets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceptionSheets::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ReceptionSheets::ReceptionDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReceptionSheets::Supplier).string().not_null())
                        .col(
                            ColumnDef::new(ReceptionSheets::DocumentNumber)
                                .string_len(64)
                                .null(),
                        )
                        .col(ColumnDef::new(ReceptionSheets::Notes).text().null())
                        .col(
                            ColumnDef::new(ReceptionSheets::IsFinished)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReceptionItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceptionItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ReceptionItems::ReceptionId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceptionItems::ItemNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceptionItems::ProductCode)
                                .string_len(64)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceptionItems::ProductName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReceptionItems::Unit).string_len(32).not_null())
                        .col(
                            ColumnDef::new(ReceptionItems::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReceptionItems::Location).string().null())
                        .col(
                            ColumnDef::new(ReceptionItems::EntryDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reception_items_reception_id")
                                .from(ReceptionItems::Table, ReceptionItems::ReceptionId)
                                .to(ReceptionSheets::Table, ReceptionSheets::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reception_items_reception_id")
                        .table(ReceptionItems::Table)
                        .col(ReceptionItems::ReceptionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceptionItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ReceptionSheets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReceptionSheets {
        Table,
        Id,
        ReceptionDate,
        Supplier,
        DocumentNumber,
        Notes,
        IsFinished,
    }

    #[derive(DeriveIden)]
    enum ReceptionItems {
        Table,
        Id,
        ReceptionId,
        ItemNumber,
        ProductCode,
        ProductName,
        Unit,
        Quantity,
        Location,
        EntryDate,
    }
}

mod m20240301_000004_create_draft_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_draft_tables"
        }
    }

    /// Draft line-item tables share one layout; only the owning table differs.
    fn draft_items_table(
        table: DraftItems,
        parent: impl IntoIden + 'static,
        parent_id: impl IntoIden + 'static,
        fk_name: &str,
    ) -> TableCreateStatement {
        Table::create()
            .table(table)
            .if_not_exists()
            .col(
                ColumnDef::new(DraftItems::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(DraftItems::DraftId).integer().not_null())
            .col(ColumnDef::new(DraftItems::ItemNumber).integer().not_null())
            .col(ColumnDef::new(DraftItems::ProductCode).string_len(64).not_null())
            .col(ColumnDef::new(DraftItems::ProductName).string().not_null())
            .col(ColumnDef::new(DraftItems::Unit).string_len(32).not_null())
            .col(
                ColumnDef::new(DraftItems::Quantity)
                    .decimal_len(16, 4)
                    .not_null(),
            )
            .col(ColumnDef::new(DraftItems::Location).string().null())
            .foreign_key(
                ForeignKey::create()
                    .name(fk_name)
                    .from(table, DraftItems::DraftId)
                    .to(parent, parent_id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DraftBills::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DraftBills::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DraftBills::EmployeeName).string().null())
                        .col(ColumnDef::new(DraftBills::EmployeeSignature).string().null())
                        .col(
                            ColumnDef::new(DraftBills::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(draft_items_table(
                    DraftItems::DraftBillItems,
                    DraftBills::Table,
                    DraftBills::Id,
                    "fk_draft_bill_items_draft_id",
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DraftReceptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DraftReceptions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DraftReceptions::Supplier).string().null())
                        .col(
                            ColumnDef::new(DraftReceptions::DocumentNumber)
                                .string_len(64)
                                .null(),
                        )
                        .col(ColumnDef::new(DraftReceptions::Notes).text().null())
                        .col(
                            ColumnDef::new(DraftReceptions::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(draft_items_table(
                    DraftItems::DraftReceptionItems,
                    DraftReceptions::Table,
                    DraftReceptions::Id,
                    "fk_draft_reception_items_draft_id",
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DraftItems::DraftReceptionItems).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DraftReceptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DraftItems::DraftBillItems).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DraftBills::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DraftBills {
        Table,
        Id,
        EmployeeName,
        EmployeeSignature,
        LastUpdated,
    }

    #[derive(DeriveIden)]
    enum DraftReceptions {
        Table,
        Id,
        Supplier,
        DocumentNumber,
        Notes,
        LastUpdated,
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum DraftItems {
        DraftBillItems,
        DraftReceptionItems,
        Id,
        DraftId,
        ItemNumber,
        ProductCode,
        ProductName,
        Unit,
        Quantity,
        Location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sea_orm::{
        ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection,
        EntityTrait,
    };

    async fn memory_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        Database::connect(opt).await.unwrap()
    }

    #[tokio::test]
    async fn migrations_apply_on_sqlite_and_keep_fractional_quantities() {
        let db = memory_db().await;
        Migrator::up(&db, None).await.unwrap();
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());

        let now = Utc::now();
        let inserted = product::ActiveModel {
            code: Set("A1".to_string()),
            name: Set("Hex bolt".to_string()),
            unit: Set("pcs".to_string()),
            quantity: Set(dec!(10) - dec!(3.3333)),
            location: Set(None),
            min_stock: Set(dec!(0.5)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let stored = product::Entity::find_by_id(inserted.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.quantity, dec!(6.6667));
        assert_eq!(stored.min_stock, dec!(0.5));
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let db = memory_db().await;
        Migrator::up(&db, None).await.unwrap();
        Migrator::down(&db, None).await.unwrap();
        assert_eq!(Migrator::get_pending_migrations(&db).await.unwrap().len(), 4);
    }
}
