use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Staff directory account. Identity (login, tokens) is handled by an
/// external provider; this table only carries what the notifier and the
/// staff guard need.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub phone_number: Option<String>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    /// Sequential zero-padded code, `000001` onwards.
    pub code: String,
    /// Always normalized to `+254XXXXXXXXX`.
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price in whole Kenyan shillings.
    pub price: i64,
    pub on_hand: i32,
    pub warn_limit: i32,
    pub state: StockState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    /// Name snapshot taken at placement time.
    pub item_name: String,
    pub quantity: i32,
    /// Price snapshot taken at placement time, never recomputed.
    pub price_at_order: i64,
}

impl OrderItem {
    pub fn total(&self) -> i64 {
        self.price_at_order * self.quantity as i64
    }
}

/// Append-only SMS delivery log row.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SentSms {
    pub id: Uuid,
    pub phone_number: String,
    pub message: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Pending,
    Approved,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Human form used in outbound messages ("Pending", "Delivered"...).
    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "PENDING" => Ok(OrderStatus::Pending),
            "APPROVED" => Ok(OrderStatus::Approved),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockState {
    Available,
    FewRemaining,
    OutOfStock,
}

impl StockState {
    /// Derive availability from on-hand quantity and the warn threshold.
    pub fn derive(on_hand: i32, warn_limit: i32) -> Self {
        if on_hand == 0 {
            StockState::OutOfStock
        } else if on_hand <= warn_limit {
            StockState::FewRemaining
        } else {
            StockState::Available
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_state_out_of_stock_when_empty() {
        assert_eq!(StockState::derive(0, 5), StockState::OutOfStock);
    }

    #[test]
    fn stock_state_few_remaining_at_or_below_limit() {
        assert_eq!(StockState::derive(3, 5), StockState::FewRemaining);
        assert_eq!(StockState::derive(5, 5), StockState::FewRemaining);
    }

    #[test]
    fn stock_state_available_above_limit() {
        assert_eq!(StockState::derive(10, 5), StockState::Available);
        assert_eq!(StockState::derive(6, 5), StockState::Available);
    }

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in [
            OrderStatus::Created,
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_item_total_is_quantity_times_snapshot() {
        let line = OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            item_name: "Monitor".into(),
            quantity: 3,
            price_at_order: 20000,
        };
        assert_eq!(line.total(), 60000);
    }
}
