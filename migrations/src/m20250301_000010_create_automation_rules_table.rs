use sea_orm_migration::prelude::*;

use super::m20250301_000007_create_boards_table::Boards;
use super::m20250301_000008_create_board_columns_table::BoardColumns;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutomationRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutomationRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AutomationRules::BoardId).uuid().not_null())
                    .col(
                        ColumnDef::new(AutomationRules::Name)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::Trigger)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::TriggerColumnId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::Target)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::MessageTemplate)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_automation_rules_board_id")
                            .from(AutomationRules::Table, AutomationRules::BoardId)
                            .to(Boards::Table, Boards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_automation_rules_trigger_column_id")
                            .from(AutomationRules::Table, AutomationRules::TriggerColumnId)
                            .to(BoardColumns::Table, BoardColumns::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_automation_rules_board_id")
                    .table(AutomationRules::Table)
                    .col(AutomationRules::BoardId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AutomationRules {
    Table,
    Id,
    BoardId,
    Name,
    Trigger,
    TriggerColumnId,
    Target,
    MessageTemplate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
