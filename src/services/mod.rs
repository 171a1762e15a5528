pub mod auth_service;
pub mod delivery_service;
pub mod order_service;
pub mod pizza_service;
pub mod user_service;
