use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_users_table::Users;
use super::m20250301_000002_create_customers_table::Customers;
use super::m20250301_000003_create_products_table::Products;
use super::m20250301_000008_create_board_columns_table::BoardColumns;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Cards::ColumnId).uuid().not_null())
                    .col(ColumnDef::new(Cards::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Cards::Description).text().null())
                    .col(ColumnDef::new(Cards::CustomerId).uuid().null())
                    .col(ColumnDef::new(Cards::ProductId).uuid().null())
                    .col(ColumnDef::new(Cards::AssigneeId).uuid().null())
                    .col(ColumnDef::new(Cards::DueDate).date().null())
                    .col(
                        ColumnDef::new(Cards::Priority)
                            .string_len(10)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(Cards::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Cards::MovedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_column_id")
                            .from(Cards::Table, Cards::ColumnId)
                            .to(BoardColumns::Table, BoardColumns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_customer_id")
                            .from(Cards::Table, Cards::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_product_id")
                            .from(Cards::Table, Cards::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_assignee_id")
                            .from(Cards::Table, Cards::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cards_column_id")
                    .table(Cards::Table)
                    .col(Cards::ColumnId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Cards {
    Table,
    Id,
    ColumnId,
    Title,
    Description,
    CustomerId,
    ProductId,
    AssigneeId,
    DueDate,
    Priority,
    Position,
    MovedAt,
    CreatedAt,
    UpdatedAt,
}
