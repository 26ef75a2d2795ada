use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_products_table::Products;
use super::m20250301_000005_create_sales_table::Sales;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SaleLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SaleLines::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SaleLines::SaleId).uuid().not_null())
                    .col(ColumnDef::new(SaleLines::ProductId).uuid().not_null())
                    .col(ColumnDef::new(SaleLines::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(SaleLines::UnitPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleLines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_lines_sale_id")
                            .from(SaleLines::Table, SaleLines::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_lines_product_id")
                            .from(SaleLines::Table, SaleLines::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sale_lines_sale_id")
                    .table(SaleLines::Table)
                    .col(SaleLines::SaleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SaleLines::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SaleLines {
    Table,
    Id,
    SaleId,
    ProductId,
    Quantity,
    UnitPrice,
    CreatedAt,
}
