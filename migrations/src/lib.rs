pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_customers_table;
mod m20250301_000003_create_products_table;
mod m20250301_000004_create_cart_lines_table;
mod m20250301_000005_create_sales_table;
mod m20250301_000006_create_sale_lines_table;
mod m20250301_000007_create_boards_table;
mod m20250301_000008_create_board_columns_table;
mod m20250301_000009_create_cards_table;
mod m20250301_000010_create_automation_rules_table;
mod m20250301_000011_create_movement_logs_table;
mod m20250301_000012_create_notification_logs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_customers_table::Migration),
            Box::new(m20250301_000003_create_products_table::Migration),
            Box::new(m20250301_000004_create_cart_lines_table::Migration),
            Box::new(m20250301_000005_create_sales_table::Migration),
            Box::new(m20250301_000006_create_sale_lines_table::Migration),
            Box::new(m20250301_000007_create_boards_table::Migration),
            Box::new(m20250301_000008_create_board_columns_table::Migration),
            Box::new(m20250301_000009_create_cards_table::Migration),
            Box::new(m20250301_000010_create_automation_rules_table::Migration),
            Box::new(m20250301_000011_create_movement_logs_table::Migration),
            Box::new(m20250301_000012_create_notification_logs_table::Migration),
        ]
    }
}
