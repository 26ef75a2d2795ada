pub mod auth;
pub mod boards;
pub mod carts;
pub mod common;
pub mod customers;
pub mod products;
pub mod sales;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::{
    events::EventSender,
    services::{
        AutomationService, BoardService, CartService, CustomerService, EmailTransport,
        ProductService, SaleService,
    },
};

/// Container wiring every domain service onto the shared database pool
/// and event channel.
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<CustomerService>,
    pub products: Arc<ProductService>,
    pub carts: Arc<CartService>,
    pub sales: Arc<SaleService>,
    pub boards: Arc<BoardService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        transport: Arc<dyn EmailTransport>,
    ) -> Self {
        let automation = AutomationService::new(db.clone(), event_sender.clone(), transport);

        Self {
            customers: Arc::new(CustomerService::new(db.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db.clone(), event_sender.clone())),
            carts: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            sales: Arc::new(SaleService::new(db.clone(), event_sender.clone())),
            boards: Arc::new(BoardService::new(db, event_sender, automation)),
        }
    }
}
