pub mod audit_logs;
pub mod deliveries;
pub mod order_items;
pub mod orders;
pub mod pizzas;
pub mod sea_orm_active_enums;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use deliveries::Entity as Deliveries;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use pizzas::Entity as Pizzas;
pub use users::Entity as Users;
