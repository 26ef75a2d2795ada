use sea_orm_migration::prelude::*;

use super::m20250301_000007_create_boards_table::Boards;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BoardColumns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BoardColumns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BoardColumns::BoardId).uuid().not_null())
                    .col(
                        ColumnDef::new(BoardColumns::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BoardColumns::Color)
                            .string_len(7)
                            .not_null()
                            .default("#3B82F6"),
                    )
                    .col(ColumnDef::new(BoardColumns::Position).integer().not_null())
                    .col(ColumnDef::new(BoardColumns::CardLimit).integer().null())
                    .col(
                        ColumnDef::new(BoardColumns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BoardColumns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_board_columns_board_id")
                            .from(BoardColumns::Table, BoardColumns::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_board_columns_board_position")
                    .table(BoardColumns::Table)
                    .col(BoardColumns::BoardId)
                    .col(BoardColumns::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BoardColumns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BoardColumns {
    Table,
    Id,
    BoardId,
    Name,
    Color,
    Position,
    CardLimit,
    CreatedAt,
    UpdatedAt,
}
