//! Database entities (sea-orm models).

pub mod automation_rule;
pub mod board;
pub mod board_column;
pub mod card;
pub mod cart_line;
pub mod customer;
pub mod movement_log;
pub mod notification_log;
pub mod product;
pub mod sale;
pub mod sale_line;
pub mod user;

pub use automation_rule::{
    Entity as AutomationRule, Model as AutomationRuleModel, NotifyTarget, RuleTrigger,
};
pub use board::{Entity as Board, Model as BoardModel};
pub use board_column::{Entity as BoardColumn, Model as BoardColumnModel};
pub use card::{CardPriority, Entity as Card, Model as CardModel};
pub use cart_line::{Entity as CartLine, Model as CartLineModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use movement_log::{Entity as MovementLog, Model as MovementLogModel};
pub use notification_log::{
    Entity as NotificationLog, Model as NotificationLogModel, NotificationStatus,
};
pub use product::{Entity as Product, Model as ProductModel};
pub use sale::{Entity as Sale, Model as SaleModel};
pub use sale_line::{Entity as SaleLine, Model as SaleLineModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
