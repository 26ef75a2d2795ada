use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_users_table::Users;
use super::m20250301_000008_create_board_columns_table::BoardColumns;
use super::m20250301_000009_create_cards_table::Cards;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MovementLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MovementLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MovementLogs::CardId).uuid().not_null())
                    .col(ColumnDef::new(MovementLogs::FromColumnId).uuid().null())
                    .col(ColumnDef::new(MovementLogs::ToColumnId).uuid().not_null())
                    .col(ColumnDef::new(MovementLogs::MovedBy).uuid().null())
                    .col(ColumnDef::new(MovementLogs::Note).text().null())
                    .col(
                        ColumnDef::new(MovementLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movement_logs_card_id")
                            .from(MovementLogs::Table, MovementLogs::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movement_logs_to_column_id")
                            .from(MovementLogs::Table, MovementLogs::ToColumnId)
                            .to(BoardColumns::Table, BoardColumns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movement_logs_moved_by")
                            .from(MovementLogs::Table, MovementLogs::MovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movement_logs_card_id")
                    .table(MovementLogs::Table)
                    .col(MovementLogs::CardId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MovementLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MovementLogs {
    Table,
    Id,
    CardId,
    FromColumnId,
    ToColumnId,
    MovedBy,
    Note,
    CreatedAt,
}
