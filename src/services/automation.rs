use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        automation_rule::{self, Entity as AutomationRule, NotifyTarget, RuleTrigger},
        board::{self, Entity as Board},
        board_column::Entity as BoardColumn,
        card,
        customer::Entity as Customer,
        notification_log::{self, NotificationStatus},
        product::Entity as Product,
        user::{self, Entity as User, UserRole},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications::EmailTransport,
};

/// Card state change handed to the engine by the board service after
/// the triggering mutation has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTransition {
    Created,
    Moved { to_column_id: Uuid },
    Assigned,
}

/// Live values a message template is rendered against.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub card_title: String,
    /// The board's linked customer, not the card's own link
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
    pub assignee_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub column_name: Option<String>,
}

/// Placeholder substituted for a token whose backing relation is absent.
const MISSING_VALUE: &str = "not provided";

/// Recognized tokens with their legacy aliases. Both spellings of a
/// token render the same value.
const TOKEN_ALIASES: [(&[&str], TokenKind); 6] = [
    (&["{card_title}", "{card_titulo}"], TokenKind::CardTitle),
    (&["{customer_name}", "{cliente_nome}"], TokenKind::CustomerName),
    (&["{product_name}", "{produto_nome}"], TokenKind::ProductName),
    (
        &["{assignee_name}", "{responsavel_nome}"],
        TokenKind::AssigneeName,
    ),
    (&["{due_date}", "{data_vencimento}"], TokenKind::DueDate),
    (&["{column_name}", "{coluna_nome}"], TokenKind::ColumnName),
];

#[derive(Debug, Clone, Copy)]
enum TokenKind {
    CardTitle,
    CustomerName,
    ProductName,
    AssigneeName,
    DueDate,
    ColumnName,
}

/// Renders a message template, replacing every recognized token with
/// its live value or the fixed placeholder when the backing relation is
/// absent. Dates render as `DD/MM/YYYY`.
///
/// A single left-to-right scan: substituted values are emitted verbatim
/// and never rescanned, so token-shaped text inside a value stays
/// literal.
pub fn render_template(template: &str, ctx: &TemplateContext) -> String {
    let mut message = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(brace) = rest.find('{') {
        message.push_str(&rest[..brace]);
        rest = &rest[brace..];
        for (aliases, kind) in TOKEN_ALIASES {
            for alias in aliases {
                if rest.starts_with(alias) {
                    message.push_str(&token_value(kind, ctx));
                    rest = &rest[alias.len()..];
                    continue 'scan;
                }
            }
        }
        // Not a recognized token; keep the brace literal.
        message.push('{');
        rest = &rest[1..];
    }
    message.push_str(rest);
    message
}

fn token_value(kind: TokenKind, ctx: &TemplateContext) -> String {
    match kind {
        TokenKind::CardTitle => ctx.card_title.clone(),
        TokenKind::CustomerName => ctx
            .customer_name
            .clone()
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
        TokenKind::ProductName => ctx
            .product_name
            .clone()
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
        TokenKind::AssigneeName => ctx
            .assignee_name
            .clone()
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
        TokenKind::DueDate => ctx
            .due_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
        TokenKind::ColumnName => ctx
            .column_name
            .clone()
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
    }
}

/// Decides whether a rule fires for a transition.
///
/// Creation rules fire only on first persist. Movement rules fire on a
/// column change when the rule has no trigger column or the trigger
/// column is the destination. Assignment rules fire when an update
/// leaves the assignee set.
pub fn should_trigger(rule: &automation_rule::Model, transition: &CardTransition) -> bool {
    match (rule.trigger, transition) {
        (RuleTrigger::Creation, CardTransition::Created) => true,
        (RuleTrigger::Movement, CardTransition::Moved { to_column_id }) => rule
            .trigger_column_id
            .map_or(true, |col| col == *to_column_id),
        (RuleTrigger::Assignment, CardTransition::Assigned) => true,
        _ => false,
    }
}

/// Rule-based notification engine.
///
/// Invoked explicitly by the board service after the triggering card
/// mutation commits. Every attempted send leaves one notification log
/// row; failures are recorded and swallowed so a broken rule can never
/// fail the mutation that fired it.
#[derive(Clone)]
pub struct AutomationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    transport: Arc<dyn EmailTransport>,
}

struct ResolvedRecipient {
    email: String,
    name: String,
}

impl ResolvedRecipient {
    fn display(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

impl AutomationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        transport: Arc<dyn EmailTransport>,
    ) -> Self {
        Self {
            db,
            event_sender,
            transport,
        }
    }

    /// Evaluates every active rule on the card's board against the
    /// transition. Infallible by contract: each rule is isolated, and
    /// any error ends up in the notification log or the trace output.
    #[instrument(skip(self, card), fields(card_id = %card.id))]
    pub async fn process(&self, card: &card::Model, transition: CardTransition) {
        let board = match self.board_of(card).await {
            Ok(board) => board,
            Err(e) => {
                error!(error = %e, "Automation skipped: cannot resolve card's board");
                return;
            }
        };

        let rules = match AutomationRule::find()
            .filter(automation_rule::Column::BoardId.eq(board.id))
            .filter(automation_rule::Column::IsActive.eq(true))
            .order_by_asc(automation_rule::Column::CreatedAt)
            .all(&*self.db)
            .await
        {
            Ok(rules) => rules,
            Err(e) => {
                error!(error = %e, "Automation skipped: cannot load rules");
                return;
            }
        };

        for rule in rules {
            if !should_trigger(&rule, &transition) {
                continue;
            }
            if let Err(e) = self.fire_rule(&rule, card, &board).await {
                // The log row itself failed; nothing left but the trace.
                error!(rule_id = %rule.id, error = %e, "Automation rule failed");
            }
        }
    }

    async fn board_of(&self, card: &card::Model) -> Result<board::Model, ServiceError> {
        let column = BoardColumn::find_by_id(card.column_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Column {} not found", card.column_id))
            })?;
        Board::find_by_id(column.board_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Board {} not found", column.board_id)))
    }

    /// Renders, resolves and delivers one rule, recording the outcome.
    async fn fire_rule(
        &self,
        rule: &automation_rule::Model,
        card: &card::Model,
        board: &board::Model,
    ) -> Result<(), ServiceError> {
        let ctx = self.build_context(card, board).await?;
        let message = render_template(&rule.message_template, &ctx);
        let subject = format!("Card notification - {}", card.title);

        let (recipient, status, error_detail) = match self.resolve_recipient(rule, card, board).await
        {
            Ok(recipient) => {
                match self
                    .transport
                    .send(&recipient.email, &subject, &message)
                    .await
                {
                    Ok(()) => (recipient.display(), NotificationStatus::Sent, None),
                    Err(e) => {
                        warn!(rule_id = %rule.id, error = %e, "Notification delivery failed");
                        (
                            recipient.display(),
                            NotificationStatus::Error,
                            Some(e.to_string()),
                        )
                    }
                }
            }
            Err(detail) => {
                warn!(rule_id = %rule.id, detail, "Notification recipient unresolved");
                (String::new(), NotificationStatus::Error, Some(detail))
            }
        };

        let sent = status == NotificationStatus::Sent;
        notification_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            card_id: Set(card.id),
            rule_id: Set(Some(rule.id)),
            recipient: Set(recipient),
            message: Set(message),
            status: Set(status),
            error_detail: Set(error_detail),
            attempts: Set(1),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::NotificationAttempted {
                card_id: card.id,
                rule_id: rule.id,
                sent,
            })
            .await;

        Ok(())
    }

    async fn build_context(
        &self,
        card: &card::Model,
        board: &board::Model,
    ) -> Result<TemplateContext, ServiceError> {
        let customer_name = match board.customer_id {
            Some(id) => Customer::find_by_id(id)
                .one(&*self.db)
                .await?
                .map(|c| c.name),
            None => None,
        };
        let product_name = match card.product_id {
            Some(id) => Product::find_by_id(id).one(&*self.db).await?.map(|p| p.name),
            None => None,
        };
        let assignee_name = match card.assignee_id {
            Some(id) => User::find_by_id(id).one(&*self.db).await?.map(|u| u.name),
            None => None,
        };
        let column_name = BoardColumn::find_by_id(card.column_id)
            .one(&*self.db)
            .await?
            .map(|c| c.name);

        Ok(TemplateContext {
            card_title: card.title.clone(),
            customer_name,
            product_name,
            assignee_name,
            due_date: card.due_date,
            column_name,
        })
    }

    /// Resolves the rule's target to a concrete address. The error
    /// string names the specific missing link and goes straight into
    /// the notification log.
    async fn resolve_recipient(
        &self,
        rule: &automation_rule::Model,
        card: &card::Model,
        board: &board::Model,
    ) -> Result<ResolvedRecipient, String> {
        let found = match rule.target {
            NotifyTarget::Customer => {
                let customer_id = board
                    .customer_id
                    .ok_or_else(|| "No customer linked to the board".to_string())?;
                Customer::find_by_id(customer_id)
                    .one(&*self.db)
                    .await
                    .map_err(|e| e.to_string())?
                    .map(|c| ResolvedRecipient {
                        email: c.email,
                        name: c.name,
                    })
                    .ok_or_else(|| "No customer linked to the board".to_string())?
            }
            NotifyTarget::Assignee => {
                let assignee_id = card
                    .assignee_id
                    .ok_or_else(|| "No assignee on the card".to_string())?;
                User::find_by_id(assignee_id)
                    .one(&*self.db)
                    .await
                    .map_err(|e| e.to_string())?
                    .map(|u| ResolvedRecipient {
                        email: u.email,
                        name: u.name,
                    })
                    .ok_or_else(|| "No assignee on the card".to_string())?
            }
            NotifyTarget::Admin => User::find()
                .filter(user::Column::Role.eq(UserRole::Admin))
                .filter(user::Column::IsActive.eq(true))
                .order_by_asc(user::Column::CreatedAt)
                .order_by_asc(user::Column::Id)
                .one(&*self.db)
                .await
                .map_err(|e| e.to_string())?
                .map(|u| ResolvedRecipient {
                    email: u.email,
                    name: u.name,
                })
                .ok_or_else(|| "No administrator found".to_string())?,
        };

        if found.email.trim().is_empty() {
            return Err("Resolved recipient has no email address".to_string());
        }
        Ok(found)
    }
}
