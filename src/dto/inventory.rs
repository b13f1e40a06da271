use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::InventoryItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub on_hand: i32,
    pub warn_limit: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub on_hand: Option<i32>,
    pub warn_limit: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<InventoryItem>,
}
