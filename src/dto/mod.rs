pub mod customers;
pub mod inventory;
pub mod orders;
