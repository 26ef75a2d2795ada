mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use common::{seed_customer, FailingTransport, TestApp};
use opsboard_api::auth::AuthUser;
use opsboard_api::entities::automation_rule::{Entity as AutomationRule, NotifyTarget, RuleTrigger};
use opsboard_api::entities::board_column;
use opsboard_api::entities::notification_log::{self, NotificationStatus};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use opsboard_api::errors::ServiceError;
use opsboard_api::services::boards::{
    CreateBoardInput, CreateCardInput, CreateColumnInput, CreateRuleInput, MoveCardInput,
};

async fn board_with_columns(
    app: &TestApp,
    actor: &AuthUser,
    customer_id: Option<Uuid>,
) -> (Uuid, board_column::Model, board_column::Model) {
    let board = app
        .services
        .boards
        .create_board(
            actor,
            CreateBoardInput {
                name: "Orders".to_string(),
                description: None,
                customer_id,
            },
        )
        .await
        .expect("create board");

    let todo = app
        .services
        .boards
        .create_column(
            actor,
            board.id,
            CreateColumnInput {
                name: "To do".to_string(),
                color: None,
                position: 0,
                card_limit: None,
            },
        )
        .await
        .expect("create column");
    let done = app
        .services
        .boards
        .create_column(
            actor,
            board.id,
            CreateColumnInput {
                name: "Done".to_string(),
                color: None,
                position: 1,
                card_limit: None,
            },
        )
        .await
        .expect("create column");

    (board.id, todo, done)
}

fn card_input(column_id: Uuid, title: &str) -> CreateCardInput {
    CreateCardInput {
        column_id,
        title: title.to_string(),
        description: None,
        customer_id: None,
        product_id: None,
        assignee_id: None,
        due_date: None,
        priority: None,
        position: None,
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn column_limit_blocks_creation_and_incoming_moves() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let (board_id, todo, _done) = board_with_columns(&app, &admin, None).await;

    let tight = app
        .services
        .boards
        .create_column(
            &admin,
            board_id,
            CreateColumnInput {
                name: "In progress".to_string(),
                color: None,
                position: 2,
                card_limit: Some(2),
            },
        )
        .await
        .expect("create column");

    for title in ["First", "Second"] {
        app.services
            .boards
            .create_card(&admin, board_id, card_input(tight.id, title))
            .await
            .expect("card fits under the limit");
    }

    let third = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(tight.id, "Third"))
        .await;
    assert_matches!(third, Err(ServiceError::Conflict(_)));

    // Moving into the full column is blocked the same way.
    let parked = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(todo.id, "Parked"))
        .await
        .expect("create card");
    let pushed = app
        .services
        .boards
        .move_card(
            &admin,
            parked.id,
            MoveCardInput {
                target_column_id: tight.id,
                position: 0,
                note: None,
            },
        )
        .await;
    assert_matches!(pushed, Err(ServiceError::Conflict(_)));

    let unchanged = app
        .services
        .boards
        .get_card(parked.id)
        .await
        .expect("get card");
    assert_eq!(unchanged.column_id, todo.id, "card stays where it was");

    let cards = app
        .services
        .boards
        .list_cards(board_id)
        .await
        .expect("list cards");
    let in_tight = cards.iter().filter(|c| c.column_id == tight.id).count();
    assert_eq!(in_tight, 2);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn each_column_change_logs_exactly_one_entry() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let (board_id, todo, done) = board_with_columns(&app, &admin, None).await;

    let card = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(todo.id, "Ship part"))
        .await
        .expect("create card");

    // Creation records the initial placement.
    let history = app
        .services
        .boards
        .card_history(card.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_column_id, None);
    assert_eq!(history[0].to_column_id, todo.id);

    app.services
        .boards
        .move_card(
            &admin,
            card.id,
            MoveCardInput {
                target_column_id: done.id,
                position: 0,
                note: Some("ready".to_string()),
            },
        )
        .await
        .expect("move card");

    let history = app
        .services
        .boards
        .card_history(card.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].from_column_id, Some(todo.id));
    assert_eq!(history[0].to_column_id, done.id);
    assert_eq!(history[0].note.as_deref(), Some("ready"));
    assert_eq!(history[0].moved_by, Some(admin.user_id));

    // Reordering inside the column is not a movement.
    app.services
        .boards
        .move_card(
            &admin,
            card.id,
            MoveCardInput {
                target_column_id: done.id,
                position: 5,
                note: None,
            },
        )
        .await
        .expect("reorder card");
    let history = app
        .services
        .boards
        .card_history(card.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2, "reorder adds no log entry");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn creation_rule_notifies_the_boards_customer() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let customer = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let (board_id, todo, _done) = board_with_columns(&app, &admin, Some(customer.id)).await;

    app.services
        .boards
        .create_rule(
            &admin,
            board_id,
            CreateRuleInput {
                name: "Welcome".to_string(),
                trigger: RuleTrigger::Creation,
                trigger_column_id: None,
                target: NotifyTarget::Customer,
                message_template: "Hello {customer_name}, card {card_title} is due {due_date}"
                    .to_string(),
                is_active: None,
            },
        )
        .await
        .expect("create rule");

    let mut input = card_input(todo.id, "Ship part");
    input.due_date = NaiveDate::from_ymd_opt(2024, 3, 5);
    let card = app
        .services
        .boards
        .create_card(&admin, board_id, input)
        .await
        .expect("create card");

    let sent = app.transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "billing@acme.test");
    assert_eq!(sent[0].subject, "Card notification - Ship part");
    assert_eq!(sent[0].body, "Hello Acme Corp, card Ship part is due 05/03/2024");

    let logs = app
        .services
        .boards
        .card_notifications(card.id)
        .await
        .expect("notifications");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, NotificationStatus::Sent);
    assert_eq!(logs[0].recipient, "Acme Corp <billing@acme.test>");
    assert_eq!(logs[0].attempts, 1);

    // The log row links back to the rule that produced it.
    let (log, rule) = notification_log::Entity::find()
        .find_also_related(AutomationRule)
        .filter(notification_log::Column::CardId.eq(card.id))
        .one(&*app.db)
        .await
        .expect("query log")
        .expect("one log");
    assert_eq!(log.status, NotificationStatus::Sent);
    assert_eq!(rule.expect("linked rule").name, "Welcome");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn movement_rule_fires_only_for_its_trigger_column() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let customer = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let (board_id, todo, done) = board_with_columns(&app, &admin, Some(customer.id)).await;

    app.services
        .boards
        .create_rule(
            &admin,
            board_id,
            CreateRuleInput {
                name: "Done alert".to_string(),
                trigger: RuleTrigger::Movement,
                trigger_column_id: Some(done.id),
                target: NotifyTarget::Customer,
                message_template: "{card_title} reached {column_name}".to_string(),
                is_active: None,
            },
        )
        .await
        .expect("create rule");

    let card = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(todo.id, "Ship part"))
        .await
        .expect("create card");
    assert!(
        app.transport.sent().await.is_empty(),
        "movement rule ignores creation"
    );

    // Into the watched column fires the rule.
    app.services
        .boards
        .move_card(
            &admin,
            card.id,
            MoveCardInput {
                target_column_id: done.id,
                position: 0,
                note: None,
            },
        )
        .await
        .expect("move card");
    let sent = app.transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, "Ship part reached Done");

    // Back out of it does not.
    app.services
        .boards
        .move_card(
            &admin,
            card.id,
            MoveCardInput {
                target_column_id: todo.id,
                position: 0,
                note: None,
            },
        )
        .await
        .expect("move card");
    assert_eq!(app.transport.sent().await.len(), 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn assignment_rule_notifies_the_new_assignee() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let (board_id, todo, _done) = board_with_columns(&app, &admin, None).await;

    app.services
        .boards
        .create_rule(
            &admin,
            board_id,
            CreateRuleInput {
                name: "You're up".to_string(),
                trigger: RuleTrigger::Assignment,
                trigger_column_id: None,
                target: NotifyTarget::Assignee,
                message_template: "{assignee_name}, please pick up {card_title}".to_string(),
                is_active: None,
            },
        )
        .await
        .expect("create rule");

    let card = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(todo.id, "Ship part"))
        .await
        .expect("create card");
    assert!(app.transport.sent().await.is_empty());

    app.services
        .boards
        .update_card(
            &admin,
            card.id,
            opsboard_api::services::boards::UpdateCardInput {
                assignee_id: Some(app.staff.user_id),
                ..Default::default()
            },
        )
        .await
        .expect("assign card");

    let sent = app.transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "sam@example.com");
    assert_eq!(sent[0].body, "Sam Staff, please pick up Ship part");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unresolvable_recipient_is_logged_without_a_send() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    // No customer on the board, so the customer target cannot resolve.
    let (board_id, todo, _done) = board_with_columns(&app, &admin, None).await;

    app.services
        .boards
        .create_rule(
            &admin,
            board_id,
            CreateRuleInput {
                name: "Welcome".to_string(),
                trigger: RuleTrigger::Creation,
                trigger_column_id: None,
                target: NotifyTarget::Customer,
                message_template: "Hello {customer_name}".to_string(),
                is_active: None,
            },
        )
        .await
        .expect("create rule");

    let card = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(todo.id, "Ship part"))
        .await
        .expect("card creation survives the failed rule");

    assert!(app.transport.sent().await.is_empty());
    let logs = app
        .services
        .boards
        .card_notifications(card.id)
        .await
        .expect("notifications");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, NotificationStatus::Error);
    assert_eq!(
        logs[0].error_detail.as_deref(),
        Some("No customer linked to the board")
    );
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn delivery_failure_never_fails_the_mutation() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let customer = seed_customer(&app, "Acme Corp", "billing@acme.test").await;
    let (board_id, todo, done) = board_with_columns(&app, &admin, Some(customer.id)).await;

    app.services
        .boards
        .create_rule(
            &admin,
            board_id,
            CreateRuleInput {
                name: "Done alert".to_string(),
                trigger: RuleTrigger::Movement,
                trigger_column_id: None,
                target: NotifyTarget::Customer,
                message_template: "{card_title} moved".to_string(),
                is_active: None,
            },
        )
        .await
        .expect("create rule");

    let boards = app.board_service_with_transport(Arc::new(FailingTransport));
    let card = boards
        .create_card(&admin, board_id, card_input(todo.id, "Ship part"))
        .await
        .expect("create card");

    let moved = boards
        .move_card(
            &admin,
            card.id,
            MoveCardInput {
                target_column_id: done.id,
                position: 0,
                note: None,
            },
        )
        .await
        .expect("move succeeds despite the broken transport");
    assert_eq!(moved.column_id, done.id);

    let logs = boards
        .card_notifications(card.id)
        .await
        .expect("notifications");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, NotificationStatus::Error);
    assert_eq!(
        logs[0].error_detail.as_deref(),
        Some("Transport error: connection refused")
    );
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn plain_users_can_move_cards_but_not_restructure() {
    let app = TestApp::new().await;
    let admin = app.admin.clone();
    let member = app.member.clone();
    let (board_id, todo, done) = board_with_columns(&app, &admin, None).await;

    let card = app
        .services
        .boards
        .create_card(&admin, board_id, card_input(todo.id, "Ship part"))
        .await
        .expect("create card");

    let moved = app
        .services
        .boards
        .move_card(
            &member,
            card.id,
            MoveCardInput {
                target_column_id: done.id,
                position: 0,
                note: None,
            },
        )
        .await
        .expect("plain users may move cards");
    assert_eq!(moved.column_id, done.id);

    let column = app
        .services
        .boards
        .create_column(
            &member,
            board_id,
            CreateColumnInput {
                name: "Blocked".to_string(),
                color: None,
                position: 9,
                card_limit: None,
            },
        )
        .await;
    assert_matches!(column, Err(ServiceError::Forbidden(_)));

    let created = app
        .services
        .boards
        .create_card(&member, board_id, card_input(todo.id, "Nope"))
        .await;
    assert_matches!(created, Err(ServiceError::Forbidden(_)));

    let deleted = app.services.boards.delete_board(&member, board_id).await;
    assert_matches!(deleted, Err(ServiceError::Forbidden(_)));
}
