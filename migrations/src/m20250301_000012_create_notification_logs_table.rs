use sea_orm_migration::prelude::*;

use super::m20250301_000009_create_cards_table::Cards;
use super::m20250301_000010_create_automation_rules_table::AutomationRules;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotificationLogs::CardId).uuid().not_null())
                    .col(ColumnDef::new(NotificationLogs::RuleId).uuid().null())
                    .col(
                        ColumnDef::new(NotificationLogs::Recipient)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(NotificationLogs::Message).text().not_null())
                    .col(
                        ColumnDef::new(NotificationLogs::Status)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(NotificationLogs::ErrorDetail).text().null())
                    .col(
                        ColumnDef::new(NotificationLogs::Attempts)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(NotificationLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_logs_card_id")
                            .from(NotificationLogs::Table, NotificationLogs::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_logs_rule_id")
                            .from(NotificationLogs::Table, NotificationLogs::RuleId)
                            .to(AutomationRules::Table, AutomationRules::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notification_logs_card_id")
                    .table(NotificationLogs::Table)
                    .col(NotificationLogs::CardId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum NotificationLogs {
    Table,
    Id,
    CardId,
    RuleId,
    Recipient,
    Message,
    Status,
    ErrorDetail,
    Attempts,
    CreatedAt,
}
