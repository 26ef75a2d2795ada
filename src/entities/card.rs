use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Unit of work living in exactly one column at a time. Position is
/// best-effort ordering within the column, not database-enforced.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub column_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(nullable)]
    pub customer_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub product_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub assignee_id: Option<Uuid>,

    #[sea_orm(nullable)]
    pub due_date: Option<NaiveDate>,

    pub priority: CardPriority,

    pub position: i32,

    /// Last time the card changed column
    pub moved_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::board_column::Entity",
        from = "Column::ColumnId",
        to = "super::board_column::Column::Id",
        on_delete = "Cascade"
    )]
    Column,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssigneeId",
        to = "super::user::Column::Id"
    )]
    Assignee,
    #[sea_orm(has_many = "super::movement_log::Entity")]
    MovementLogs,
    #[sea_orm(has_many = "super::notification_log::Entity")]
    NotificationLogs,
}

impl Related<super::board_column::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Column.def()
    }
}

impl Related<super::movement_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementLogs.def()
    }
}

impl Related<super::notification_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Card priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum CardPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

impl Default for CardPriority {
    fn default() -> Self {
        CardPriority::Medium
    }
}
