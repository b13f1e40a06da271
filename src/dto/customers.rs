use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Customer;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterCustomerRequest {
    pub name: String,
    /// Raw phone input, normalized server-side to `+254XXXXXXXXX`.
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<Customer>,
}
