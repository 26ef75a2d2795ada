use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        cart_line::{self, Entity as CartLine},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Who a cart belongs to: an anonymous browser session or an
/// authenticated user, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    Session(String),
    User(Uuid),
}

impl CartOwner {
    /// Builds an owner from the raw request pair, enforcing the
    /// exactly-one rule.
    pub fn resolve(session_id: Option<String>, user_id: Option<Uuid>) -> Result<Self, ServiceError> {
        match (session_id, user_id) {
            (Some(s), None) if !s.is_empty() => Ok(CartOwner::Session(s)),
            (None, Some(u)) => Ok(CartOwner::User(u)),
            _ => Err(ServiceError::ValidationError(
                "Exactly one of session_id or user_id must be provided".to_string(),
            )),
        }
    }

    pub(crate) fn condition(&self) -> Condition {
        match self {
            CartOwner::Session(s) => Condition::all()
                .add(cart_line::Column::SessionId.eq(s.clone()))
                .add(cart_line::Column::UserId.is_null()),
            CartOwner::User(u) => Condition::all().add(cart_line::Column::UserId.eq(*u)),
        }
    }

    fn session_value(&self) -> Option<String> {
        match self {
            CartOwner::Session(s) => Some(s.clone()),
            CartOwner::User(_) => None,
        }
    }

    fn user_value(&self) -> Option<Uuid> {
        match self {
            CartOwner::Session(_) => None,
            CartOwner::User(u) => Some(*u),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCartLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart contents plus the running total.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<cart_line::Model>,
    pub total: Decimal,
}

/// Session- or user-scoped pending cart. Lines merge per product and
/// every quantity change re-checks live stock so a cart can never hold
/// more of a product than exists.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a product to the owner's cart, merging with an existing line
    /// for the same product. The combined quantity must fit live stock.
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        owner: CartOwner,
        input: AddCartLineInput,
    ) -> Result<cart_line::Model, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product = Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let existing = CartLine::find()
            .filter(owner.condition())
            .filter(cart_line::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        let line = if let Some(line) = existing {
            let combined = line.quantity + input.quantity;
            if !product.has_stock(combined) {
                return Err(ServiceError::Conflict(format!(
                    "Only {} units of '{}' available; cart already holds {}",
                    product.stock, product.name, line.quantity
                )));
            }
            let mut model: cart_line::ActiveModel = line.into();
            model.quantity = Set(combined);
            model.updated_at = Set(Some(Utc::now()));
            model.update(&txn).await?
        } else {
            if !product.has_stock(input.quantity) {
                return Err(ServiceError::Conflict(format!(
                    "Only {} units of '{}' available",
                    product.stock, product.name
                )));
            }
            let model = cart_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                session_id: Set(owner.session_value()),
                user_id: Set(owner.user_value()),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                unit_price: Set(product.price),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            };
            model.insert(&txn).await?
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartLineAdded {
                line_id: line.id,
                product_id: input.product_id,
            })
            .await;

        info!("Cart line {} now holds {} units", line.id, line.quantity);
        Ok(line)
    }

    /// Sets a line's quantity. The new quantity must fit live stock.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<cart_line::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let line = CartLine::find_by_id(line_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart line {} not found", line_id)))?;

        let product = Product::find_by_id(line.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", line.product_id))
            })?;

        if !product.has_stock(quantity) {
            return Err(ServiceError::Conflict(format!(
                "Only {} units of '{}' available",
                product.stock, product.name
            )));
        }

        let mut model: cart_line::ActiveModel = line.into();
        model.quantity = Set(quantity);
        model.updated_at = Set(Some(Utc::now()));
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartLineUpdated(line_id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: Uuid) -> Result<(), ServiceError> {
        let line = CartLine::find_by_id(line_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart line {} not found", line_id)))?;

        line.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartLineRemoved(line_id))
            .await;

        Ok(())
    }

    /// Returns the owner's lines, oldest first, with the cart total.
    #[instrument(skip(self))]
    pub async fn list_lines(&self, owner: CartOwner) -> Result<CartView, ServiceError> {
        let lines = CartLine::find()
            .filter(owner.condition())
            .order_by_asc(cart_line::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let total = lines.iter().map(|l| l.subtotal()).sum();
        Ok(CartView { lines, total })
    }

    /// Removes every line the owner holds.
    #[instrument(skip(self))]
    pub async fn clear(&self, owner: CartOwner) -> Result<u64, ServiceError> {
        let result = CartLine::delete_many()
            .filter(owner.condition())
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_requires_exactly_one_key() {
        assert!(CartOwner::resolve(Some("sess-1".to_string()), None).is_ok());
        assert!(CartOwner::resolve(None, Some(Uuid::new_v4())).is_ok());
        assert!(CartOwner::resolve(None, None).is_err());
        assert!(CartOwner::resolve(Some("sess-1".to_string()), Some(Uuid::new_v4())).is_err());
        assert!(CartOwner::resolve(Some(String::new()), None).is_err());
    }
}
