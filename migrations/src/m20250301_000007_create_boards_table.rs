use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_users_table::Users;
use super::m20250301_000002_create_customers_table::Customers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Boards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Boards::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Boards::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Boards::Description).text().null())
                    .col(ColumnDef::new(Boards::CustomerId).uuid().null())
                    .col(ColumnDef::new(Boards::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Boards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Boards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Boards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_boards_customer_id")
                            .from(Boards::Table, Boards::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_boards_created_by")
                            .from(Boards::Table, Boards::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Boards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Boards {
    Table,
    Id,
    Name,
    Description,
    CustomerId,
    CreatedBy,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
