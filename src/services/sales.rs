use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        cart_line::{self, Entity as CartLine},
        customer::Entity as Customer,
        product::{self, Entity as Product},
        sale::{self, Entity as Sale},
        sale_line::{self, Entity as SaleLine},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::carts::CartOwner,
};

/// Stock-reducing sale engine.
///
/// All mutations run inside one transaction: the sale, its lines and
/// every stock decrement either all commit or none do. The decrement is
/// a guarded conditional update (`stock = stock - q` filtered on
/// `stock >= q`), so two concurrent sales of the last unit cannot both
/// succeed.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price override; defaults to the product's live price.
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: Option<Uuid>,
    pub lines: Vec<SaleLineInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleFilter {
    pub customer_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalePage {
    pub sales: Vec<sale::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// A committed sale with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub lines: Vec<sale_line::Model>,
}

impl SaleService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Decrements stock for one line, failing when fewer than
    /// `quantity` units remain. The filter on the current stock level
    /// makes the check-and-decrement atomic under concurrency.
    async fn decrement_stock(
        txn: &DatabaseTransaction,
        product: &product::Model,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let result = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .filter(product::Column::Id.eq(product.id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "Insufficient stock for '{}': requested {}, available {}",
                product.name, quantity, product.stock
            )));
        }
        Ok(())
    }

    async fn check_customer(
        txn: &DatabaseTransaction,
        customer_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if let Some(id) = customer_id {
            Customer::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;
        }
        Ok(())
    }

    /// Creates a sale from explicit lines. Every line is validated
    /// before anything is written; on any failure the transaction rolls
    /// back and no stock moves.
    #[instrument(skip(self))]
    pub async fn create_sale(&self, input: CreateSaleInput) -> Result<SaleWithLines, ServiceError> {
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "A sale requires at least one line".to_string(),
            ));
        }
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Quantity must be greater than zero".to_string(),
                ));
            }
            if let Some(price) = line.unit_price {
                if price <= Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Unit price must be greater than zero".to_string(),
                    ));
                }
            }
        }

        let txn = self.db.begin().await?;

        Self::check_customer(&txn, input.customer_id).await?;

        // Resolve products and the effective unit price per line before
        // touching stock, so a later line's failure produces a clean
        // error rather than a half-applied decrement surviving rollback.
        let mut resolved: Vec<(product::Model, i32, Decimal)> = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = Product::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;
            if !product.has_stock(line.quantity) {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for '{}': requested {}, available {}",
                    product.name, line.quantity, product.stock
                )));
            }
            let unit_price = line.unit_price.unwrap_or(product.price);
            resolved.push((product, line.quantity, unit_price));
        }

        let sale = self.commit_sale(txn, input.customer_id, resolved).await?;

        self.event_sender
            .send_or_log(Event::SaleCreated(sale.sale.id))
            .await;

        info!(sale_id = %sale.sale.id, total = %sale.sale.total, "Created sale");
        Ok(sale)
    }

    /// Converts the owner's cart into a sale. The sale lines carry the
    /// unit price snapshotted on each cart line; stock is validated
    /// live. The cart is drained only when the whole conversion
    /// commits.
    #[instrument(skip(self))]
    pub async fn create_sale_from_cart(
        &self,
        owner: CartOwner,
        customer_id: Option<Uuid>,
    ) -> Result<SaleWithLines, ServiceError> {
        let txn = self.db.begin().await?;

        Self::check_customer(&txn, customer_id).await?;

        let cart_lines = CartLine::find()
            .filter(owner.condition())
            .order_by_asc(cart_line::Column::CreatedAt)
            .all(&txn)
            .await?;
        if cart_lines.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".to_string()));
        }

        let mut resolved: Vec<(product::Model, i32, Decimal)> = Vec::with_capacity(cart_lines.len());
        for line in &cart_lines {
            let product = Product::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;
            if !product.has_stock(line.quantity) {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for '{}': requested {}, available {}",
                    product.name, line.quantity, product.stock
                )));
            }
            resolved.push((product, line.quantity, line.unit_price));
        }

        let line_count = cart_lines.len();
        let line_ids: Vec<Uuid> = cart_lines.iter().map(|l| l.id).collect();

        // Drain the consumed lines inside the same transaction.
        CartLine::delete_many()
            .filter(cart_line::Column::Id.is_in(line_ids))
            .exec(&txn)
            .await?;

        let sale = self.commit_sale(txn, customer_id, resolved).await?;

        self.event_sender
            .send_or_log(Event::CartConverted {
                sale_id: sale.sale.id,
                line_count,
            })
            .await;

        info!(sale_id = %sale.sale.id, line_count, "Converted cart to sale");
        Ok(sale)
    }

    /// Writes the sale, its lines and the stock decrements, then
    /// commits. `resolved` pairs each product with the quantity and the
    /// unit price already agreed for it.
    async fn commit_sale(
        &self,
        txn: DatabaseTransaction,
        customer_id: Option<Uuid>,
        resolved: Vec<(product::Model, i32, Decimal)>,
    ) -> Result<SaleWithLines, ServiceError> {
        let sale_id = Uuid::new_v4();
        let now = Utc::now();

        let total: Decimal = resolved
            .iter()
            .map(|(_, quantity, unit_price)| *unit_price * Decimal::from(*quantity))
            .sum();

        let sale = sale::ActiveModel {
            id: Set(sale_id),
            customer_id: Set(customer_id),
            total: Set(total),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(resolved.len());
        for (product, quantity, unit_price) in &resolved {
            Self::decrement_stock(&txn, product, *quantity).await?;

            let line = sale_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(product.id),
                quantity: Set(*quantity),
                unit_price: Set(*unit_price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            lines.push(line);
        }

        txn.commit().await?;

        for (product, quantity, _) in &resolved {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    product_id: product.id,
                    quantity: *quantity,
                    remaining: product.stock - quantity,
                })
                .await;
        }

        Ok(SaleWithLines { sale, lines })
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, id: Uuid) -> Result<SaleWithLines, ServiceError> {
        let sale = Sale::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;
        let lines = self.get_sale_lines(id).await?;
        Ok(SaleWithLines { sale, lines })
    }

    #[instrument(skip(self))]
    pub async fn get_sale_lines(&self, sale_id: Uuid) -> Result<Vec<sale_line::Model>, ServiceError> {
        let lines = SaleLine::find()
            .filter(sale_line::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_line::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(lines)
    }

    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        filter: SaleFilter,
        page: u64,
        per_page: u64,
    ) -> Result<SalePage, ServiceError> {
        let mut query = Sale::find().order_by_desc(sale::Column::CreatedAt);
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sale::Column::CustomerId.eq(customer_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(sale::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(sale::Column::CreatedAt.lte(to));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(SalePage {
            sales,
            total,
            page,
            per_page,
        })
    }

    /// Deletes a sale and its lines as a unit. Lines go first inside
    /// the transaction so no orphan line is ever observable, even on a
    /// backend without enforced foreign keys.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let sale = Sale::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))?;

        SaleLine::delete_many()
            .filter(sale_line::Column::SaleId.eq(sale.id))
            .exec(&txn)
            .await?;
        Sale::delete_by_id(sale.id).exec(&txn).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::SaleDeleted(id)).await;

        info!("Deleted sale: {}", id);
        Ok(())
    }
}
