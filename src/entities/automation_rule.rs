use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Board-scoped reactive policy: when a card transition matches the
/// trigger, the message template is rendered against the card and sent
/// to the resolved target, with the outcome recorded in the
/// notification log.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "automation_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub board_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    pub trigger: RuleTrigger,

    /// For movement rules: restricts firing to moves landing in this
    /// column. Unset means any movement on the board.
    #[sea_orm(nullable)]
    pub trigger_column_id: Option<Uuid>,

    pub target: NotifyTarget,

    /// Supports {card_title}, {customer_name}, {product_name},
    /// {assignee_name}, {due_date}, {column_name} and their legacy
    /// Portuguese aliases.
    #[sea_orm(column_type = "Text")]
    #[validate(length(min = 1, message = "Message template is required"))]
    pub message_template: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::board::Entity",
        from = "Column::BoardId",
        to = "super::board::Column::Id",
        on_delete = "Cascade"
    )]
    Board,
    #[sea_orm(
        belongs_to = "super::board_column::Entity",
        from = "Column::TriggerColumnId",
        to = "super::board_column::Column::Id"
    )]
    TriggerColumn,
    #[sea_orm(has_many = "super::notification_log::Entity")]
    NotificationLogs,
}

impl Related<super::board::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Board.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Kind of card transition a rule reacts to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum RuleTrigger {
    #[sea_orm(string_value = "creation")]
    Creation,
    #[sea_orm(string_value = "movement")]
    Movement,
    #[sea_orm(string_value = "assignment")]
    Assignment,
}

/// Who receives the rendered message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum NotifyTarget {
    /// The board's linked customer (not the card's own link)
    #[sea_orm(string_value = "customer")]
    Customer,
    /// The card's assignee
    #[sea_orm(string_value = "assignee")]
    Assignee,
    /// The first administrator account, by stable ordering
    #[sea_orm(string_value = "admin")]
    Admin,
}
