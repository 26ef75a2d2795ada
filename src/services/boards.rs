use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{authorize, AuthUser, BoardAction},
    entities::{
        automation_rule::{self, Entity as AutomationRule, NotifyTarget, RuleTrigger},
        board::{self, Entity as Board},
        board_column::{self, Entity as BoardColumn, DEFAULT_COLOR},
        card::{self, CardPriority, Entity as Card},
        customer::Entity as Customer,
        movement_log::{self, Entity as MovementLog},
        notification_log::{self, Entity as NotificationLog},
        user::Entity as User,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::automation::{AutomationService, CardTransition},
};

/// Kanban boards, columns, cards and their automation rules.
///
/// Every mutation is gated by the `authorize` capability check against
/// the owning board. Card mutations invoke the automation engine after
/// their transaction commits; automation failures never surface here.
#[derive(Clone)]
pub struct BoardService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    automation: AutomationService,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBoardInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBoardInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub customer_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateColumnInput {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub color: Option<String>,
    pub position: i32,
    pub card_limit: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateColumnInput {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub color: Option<String>,
    pub position: Option<i32>,
    pub card_limit: Option<Option<i32>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCardInput {
    pub column_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<CardPriority>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCardInput {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<CardPriority>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveCardInput {
    pub target_column_id: Uuid,
    pub position: i32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRuleInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    pub trigger: RuleTrigger,
    pub trigger_column_id: Option<Uuid>,
    pub target: NotifyTarget,
    #[validate(length(min = 1, message = "Message template is required"))]
    pub message_template: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRuleInput {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub trigger: Option<RuleTrigger>,
    pub trigger_column_id: Option<Option<Uuid>>,
    pub target: Option<NotifyTarget>,
    #[validate(length(min = 1, message = "Message template is required"))]
    pub message_template: Option<String>,
    pub is_active: Option<bool>,
}

impl BoardService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        automation: AutomationService,
    ) -> Self {
        Self {
            db,
            event_sender,
            automation,
        }
    }

    fn check(actor: &AuthUser, action: BoardAction, board: &board::Model) -> Result<(), ServiceError> {
        if !authorize(actor, action, board) {
            return Err(ServiceError::Forbidden(
                "Not allowed to perform this action on the board".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_board(&self, id: Uuid) -> Result<board::Model, ServiceError> {
        Board::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Board {} not found", id)))
    }

    async fn find_column(&self, id: Uuid) -> Result<board_column::Model, ServiceError> {
        BoardColumn::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Column {} not found", id)))
    }

    async fn find_card(&self, id: Uuid) -> Result<card::Model, ServiceError> {
        Card::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Card {} not found", id)))
    }

    /// Resolves the board a card lives on, via its column.
    async fn board_of_card(&self, card: &card::Model) -> Result<board::Model, ServiceError> {
        let column = self.find_column(card.column_id).await?;
        self.find_board(column.board_id).await
    }

    /// Fails with Conflict when the column is at its card limit.
    /// Runs inside the caller's transaction so the count the check sees
    /// is the count the insert lands on.
    async fn check_capacity<C: ConnectionTrait>(
        conn: &C,
        column: &board_column::Model,
    ) -> Result<(), ServiceError> {
        if let Some(limit) = column.card_limit {
            let count = Card::find()
                .filter(card::Column::ColumnId.eq(column.id))
                .count(conn)
                .await?;
            if count >= limit as u64 {
                return Err(ServiceError::Conflict(format!(
                    "Column '{}' is at its limit of {} cards",
                    column.name, limit
                )));
            }
        }
        Ok(())
    }

    // ----- Boards -----

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn create_board(
        &self,
        actor: &AuthUser,
        input: CreateBoardInput,
    ) -> Result<board::Model, ServiceError> {
        input.validate()?;

        if let Some(customer_id) = input.customer_id {
            Customer::find_by_id(customer_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Customer {} not found", customer_id))
                })?;
        }

        let board_id = Uuid::new_v4();
        let created = board::ActiveModel {
            id: Set(board_id),
            name: Set(input.name),
            description: Set(input.description),
            customer_id: Set(input.customer_id),
            created_by: Set(actor.user_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::BoardCreated(board_id))
            .await;

        info!("Created board: {}", board_id);
        Ok(created)
    }

    /// Managers see every board; everyone else only their own.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn list_boards(&self, actor: &AuthUser) -> Result<Vec<board::Model>, ServiceError> {
        let mut query = Board::find().order_by_asc(board::Column::CreatedAt);
        if !actor.is_manager() {
            query = query.filter(board::Column::CreatedBy.eq(actor.user_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn get_board(&self, actor: &AuthUser, id: Uuid) -> Result<board::Model, ServiceError> {
        let board = self.find_board(id).await?;
        Self::check(actor, BoardAction::View, &board)?;
        Ok(board)
    }

    #[instrument(skip(self, actor))]
    pub async fn update_board(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdateBoardInput,
    ) -> Result<board::Model, ServiceError> {
        input.validate()?;
        let board = self.find_board(id).await?;
        Self::check(actor, BoardAction::Edit, &board)?;

        if let Some(customer_id) = input.customer_id {
            Customer::find_by_id(customer_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Customer {} not found", customer_id))
                })?;
        }

        let mut model: board::ActiveModel = board.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(customer_id) = input.customer_id {
            model.customer_id = Set(Some(customer_id));
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));
        let updated = model.update(&*self.db).await?;

        self.event_sender.send_or_log(Event::BoardUpdated(id)).await;
        Ok(updated)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_board(&self, actor: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        let board = self.find_board(id).await?;
        Self::check(actor, BoardAction::Delete, &board)?;

        board.delete(&*self.db).await?;

        self.event_sender.send_or_log(Event::BoardDeleted(id)).await;
        info!("Deleted board: {}", id);
        Ok(())
    }

    // ----- Columns -----

    #[instrument(skip(self, actor))]
    pub async fn create_column(
        &self,
        actor: &AuthUser,
        board_id: Uuid,
        input: CreateColumnInput,
    ) -> Result<board_column::Model, ServiceError> {
        input.validate()?;
        let board = self.find_board(board_id).await?;
        Self::check(actor, BoardAction::ManageColumns, &board)?;

        let taken = BoardColumn::find()
            .filter(board_column::Column::BoardId.eq(board_id))
            .filter(board_column::Column::Position.eq(input.position))
            .one(&*self.db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Position {} is already taken on this board",
                input.position
            )));
        }

        let column_id = Uuid::new_v4();
        let created = board_column::ActiveModel {
            id: Set(column_id),
            board_id: Set(board_id),
            name: Set(input.name),
            color: Set(input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string())),
            position: Set(input.position),
            card_limit: Set(input.card_limit),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ColumnCreated {
                board_id,
                column_id,
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_columns(
        &self,
        board_id: Uuid,
    ) -> Result<Vec<board_column::Model>, ServiceError> {
        self.find_board(board_id).await?;
        let columns = BoardColumn::find()
            .filter(board_column::Column::BoardId.eq(board_id))
            .order_by_asc(board_column::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(columns)
    }

    #[instrument(skip(self, actor))]
    pub async fn update_column(
        &self,
        actor: &AuthUser,
        column_id: Uuid,
        input: UpdateColumnInput,
    ) -> Result<board_column::Model, ServiceError> {
        input.validate()?;
        let column = self.find_column(column_id).await?;
        let board = self.find_board(column.board_id).await?;
        Self::check(actor, BoardAction::ManageColumns, &board)?;

        if let Some(position) = input.position {
            let taken = BoardColumn::find()
                .filter(board_column::Column::BoardId.eq(column.board_id))
                .filter(board_column::Column::Position.eq(position))
                .filter(board_column::Column::Id.ne(column_id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Position {} is already taken on this board",
                    position
                )));
            }
        }

        let mut model: board_column::ActiveModel = column.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(color) = input.color {
            model.color = Set(color);
        }
        if let Some(position) = input.position {
            model.position = Set(position);
        }
        if let Some(card_limit) = input.card_limit {
            model.card_limit = Set(card_limit);
        }
        model.updated_at = Set(Some(Utc::now()));
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_column(&self, actor: &AuthUser, column_id: Uuid) -> Result<(), ServiceError> {
        let column = self.find_column(column_id).await?;
        let board = self.find_board(column.board_id).await?;
        Self::check(actor, BoardAction::ManageColumns, &board)?;

        column.delete(&*self.db).await?;
        Ok(())
    }

    // ----- Cards -----

    /// Creates a card in a column of the given board. Fails with
    /// Conflict when the column is full; records the initial placement
    /// in the movement log and fires creation automation after commit.
    #[instrument(skip(self, actor))]
    pub async fn create_card(
        &self,
        actor: &AuthUser,
        board_id: Uuid,
        input: CreateCardInput,
    ) -> Result<card::Model, ServiceError> {
        input.validate()?;
        let board = self.find_board(board_id).await?;
        Self::check(actor, BoardAction::ManageCards, &board)?;

        let column = self.find_column(input.column_id).await?;
        if column.board_id != board_id {
            return Err(ServiceError::ValidationError(
                "Column does not belong to this board".to_string(),
            ));
        }

        if let Some(assignee_id) = input.assignee_id {
            User::find_by_id(assignee_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", assignee_id)))?;
        }

        let txn = self.db.begin().await?;

        Self::check_capacity(&txn, &column).await?;

        let card_id = Uuid::new_v4();
        let now = Utc::now();
        let created = card::ActiveModel {
            id: Set(card_id),
            column_id: Set(column.id),
            title: Set(input.title),
            description: Set(input.description),
            customer_id: Set(input.customer_id),
            product_id: Set(input.product_id),
            assignee_id: Set(input.assignee_id),
            due_date: Set(input.due_date),
            priority: Set(input.priority.unwrap_or_default()),
            position: Set(input.position.unwrap_or(0)),
            moved_at: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        movement_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            card_id: Set(card_id),
            from_column_id: Set(None),
            to_column_id: Set(column.id),
            moved_by: Set(Some(actor.user_id)),
            note: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CardCreated { board_id, card_id })
            .await;

        self.automation.process(&created, CardTransition::Created).await;

        info!("Created card: {}", card_id);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_cards(&self, board_id: Uuid) -> Result<Vec<card::Model>, ServiceError> {
        self.find_board(board_id).await?;
        let column_ids: Vec<Uuid> = BoardColumn::find()
            .filter(board_column::Column::BoardId.eq(board_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        let cards = Card::find()
            .filter(card::Column::ColumnId.is_in(column_ids))
            .order_by_asc(card::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(cards)
    }

    #[instrument(skip(self))]
    pub async fn get_card(&self, id: Uuid) -> Result<card::Model, ServiceError> {
        self.find_card(id).await
    }

    /// Updates card fields other than its column. When the update sets
    /// an assignee, assignment automation fires after the write.
    #[instrument(skip(self, actor))]
    pub async fn update_card(
        &self,
        actor: &AuthUser,
        card_id: Uuid,
        input: UpdateCardInput,
    ) -> Result<card::Model, ServiceError> {
        input.validate()?;
        let card = self.find_card(card_id).await?;
        let board = self.board_of_card(&card).await?;
        Self::check(actor, BoardAction::ManageCards, &board)?;

        let assigning = input.assignee_id.is_some();
        if let Some(assignee_id) = input.assignee_id {
            User::find_by_id(assignee_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", assignee_id)))?;
        }

        let mut model: card::ActiveModel = card.into();
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(customer_id) = input.customer_id {
            model.customer_id = Set(Some(customer_id));
        }
        if let Some(product_id) = input.product_id {
            model.product_id = Set(Some(product_id));
        }
        if let Some(assignee_id) = input.assignee_id {
            model.assignee_id = Set(Some(assignee_id));
        }
        if let Some(due_date) = input.due_date {
            model.due_date = Set(Some(due_date));
        }
        if let Some(priority) = input.priority {
            model.priority = Set(priority);
        }
        model.updated_at = Set(Some(Utc::now()));
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CardUpdated(card_id))
            .await;

        if assigning && updated.assignee_id.is_some() {
            self.automation
                .process(&updated, CardTransition::Assigned)
                .await;
        }

        Ok(updated)
    }

    /// Moves a card to a column on its board. One transaction updates
    /// the card and appends exactly one movement log row; movement
    /// automation is invoked only after that commit. Moving within the
    /// same column is a plain reorder and logs nothing.
    #[instrument(skip(self, actor))]
    pub async fn move_card(
        &self,
        actor: &AuthUser,
        card_id: Uuid,
        input: MoveCardInput,
    ) -> Result<card::Model, ServiceError> {
        let card = self.find_card(card_id).await?;
        let board = self.board_of_card(&card).await?;
        Self::check(actor, BoardAction::MoveCards, &board)?;

        let target = self.find_column(input.target_column_id).await?;
        if target.board_id != board.id {
            return Err(ServiceError::ValidationError(
                "Target column is not on the card's board".to_string(),
            ));
        }

        let from_column_id = card.column_id;
        let changing_column = from_column_id != target.id;

        let txn = self.db.begin().await?;

        if changing_column {
            Self::check_capacity(&txn, &target).await?;
        }

        let now = Utc::now();
        let mut model: card::ActiveModel = card.into();
        model.column_id = Set(target.id);
        model.position = Set(input.position);
        if changing_column {
            model.moved_at = Set(now);
        }
        model.updated_at = Set(Some(now));
        let moved = model.update(&txn).await?;

        if changing_column {
            movement_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                card_id: Set(card_id),
                from_column_id: Set(Some(from_column_id)),
                to_column_id: Set(target.id),
                moved_by: Set(Some(actor.user_id)),
                note: Set(input.note),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        if changing_column {
            self.event_sender
                .send_or_log(Event::CardMoved {
                    card_id,
                    from_column_id,
                    to_column_id: target.id,
                })
                .await;

            self.automation
                .process(
                    &moved,
                    CardTransition::Moved {
                        to_column_id: target.id,
                    },
                )
                .await;
        }

        Ok(moved)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_card(&self, actor: &AuthUser, card_id: Uuid) -> Result<(), ServiceError> {
        let card = self.find_card(card_id).await?;
        let board = self.board_of_card(&card).await?;
        Self::check(actor, BoardAction::ManageCards, &board)?;

        card.delete(&*self.db).await?;
        Ok(())
    }

    /// Movement history, newest first.
    #[instrument(skip(self))]
    pub async fn card_history(
        &self,
        card_id: Uuid,
    ) -> Result<Vec<movement_log::Model>, ServiceError> {
        self.find_card(card_id).await?;
        let entries = MovementLog::find()
            .filter(movement_log::Column::CardId.eq(card_id))
            .order_by_desc(movement_log::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }

    /// Automation attempts recorded for the card, newest first.
    #[instrument(skip(self))]
    pub async fn card_notifications(
        &self,
        card_id: Uuid,
    ) -> Result<Vec<notification_log::Model>, ServiceError> {
        self.find_card(card_id).await?;
        let entries = NotificationLog::find()
            .filter(notification_log::Column::CardId.eq(card_id))
            .order_by_desc(notification_log::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }

    // ----- Automation rules -----

    #[instrument(skip(self, actor))]
    pub async fn create_rule(
        &self,
        actor: &AuthUser,
        board_id: Uuid,
        input: CreateRuleInput,
    ) -> Result<automation_rule::Model, ServiceError> {
        input.validate()?;
        let board = self.find_board(board_id).await?;
        Self::check(actor, BoardAction::ManageRules, &board)?;

        if let Some(column_id) = input.trigger_column_id {
            let column = self.find_column(column_id).await?;
            if column.board_id != board_id {
                return Err(ServiceError::ValidationError(
                    "Trigger column is not on this board".to_string(),
                ));
            }
        }

        let created = automation_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            board_id: Set(board_id),
            name: Set(input.name),
            trigger: Set(input.trigger),
            trigger_column_id: Set(input.trigger_column_id),
            target: Set(input.target),
            message_template: Set(input.message_template),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_rules(
        &self,
        actor: &AuthUser,
        board_id: Uuid,
    ) -> Result<Vec<automation_rule::Model>, ServiceError> {
        let board = self.find_board(board_id).await?;
        Self::check(actor, BoardAction::View, &board)?;
        let rules = AutomationRule::find()
            .filter(automation_rule::Column::BoardId.eq(board_id))
            .order_by_asc(automation_rule::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rules)
    }

    #[instrument(skip(self, actor))]
    pub async fn update_rule(
        &self,
        actor: &AuthUser,
        rule_id: Uuid,
        input: UpdateRuleInput,
    ) -> Result<automation_rule::Model, ServiceError> {
        input.validate()?;
        let rule = AutomationRule::find_by_id(rule_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Rule {} not found", rule_id)))?;
        let board = self.find_board(rule.board_id).await?;
        Self::check(actor, BoardAction::ManageRules, &board)?;

        if let Some(Some(column_id)) = input.trigger_column_id {
            let column = self.find_column(column_id).await?;
            if column.board_id != rule.board_id {
                return Err(ServiceError::ValidationError(
                    "Trigger column is not on this board".to_string(),
                ));
            }
        }

        let mut model: automation_rule::ActiveModel = rule.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(trigger) = input.trigger {
            model.trigger = Set(trigger);
        }
        if let Some(trigger_column_id) = input.trigger_column_id {
            model.trigger_column_id = Set(trigger_column_id);
        }
        if let Some(target) = input.target {
            model.target = Set(target);
        }
        if let Some(message_template) = input.message_template {
            model.message_template = Set(message_template);
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_rule(&self, actor: &AuthUser, rule_id: Uuid) -> Result<(), ServiceError> {
        let rule = AutomationRule::find_by_id(rule_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Rule {} not found", rule_id)))?;
        let board = self.find_board(rule.board_id).await?;
        Self::check(actor, BoardAction::ManageRules, &board)?;

        rule.delete(&*self.db).await?;
        Ok(())
    }
}
