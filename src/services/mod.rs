pub mod admin_service;
pub mod customer_service;
pub mod inventory_service;
pub mod order_service;
