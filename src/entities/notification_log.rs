use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit record of one automation send attempt. A row is
/// written whether or not delivery succeeded; resolution failures are
/// recorded with `status = error` and a detail naming the missing link.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub card_id: Uuid,

    /// Kept nullable so deleting a rule does not erase its audit trail
    #[sea_orm(nullable)]
    pub rule_id: Option<Uuid>,

    pub recipient: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub status: NotificationStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_detail: Option<String>,

    pub attempts: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::card::Entity",
        from = "Column::CardId",
        to = "super::card::Column::Id",
        on_delete = "Cascade"
    )]
    Card,
    #[sea_orm(
        belongs_to = "super::automation_rule::Entity",
        from = "Column::RuleId",
        to = "super::automation_rule::Column::Id"
    )]
    Rule,
}

impl Related<super::card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Card.def()
    }
}

impl Related<super::automation_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Outcome of a send attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "error")]
    Error,
    #[sea_orm(string_value = "pending")]
    Pending,
}
