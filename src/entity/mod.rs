pub mod customers;
pub mod inventory_items;
pub mod order_items;
pub mod orders;
pub mod users;

pub use customers::Entity as Customers;
pub use inventory_items::Entity as InventoryItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
