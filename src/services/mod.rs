pub mod automation;
pub mod boards;
pub mod carts;
pub mod customers;
pub mod notifications;
pub mod products;
pub mod sales;

pub use automation::AutomationService;
pub use boards::BoardService;
pub use carts::CartService;
pub use customers::CustomerService;
pub use notifications::{EmailTransport, LoggingEmailTransport};
pub use products::ProductService;
pub use sales::SaleService;
