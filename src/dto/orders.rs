use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    pub quantity: i32,
}

/// Result of a placed order. `warnings` carries the lines that were
/// skipped (unknown item, insufficient stock) without aborting the batch.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub line_summaries: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
