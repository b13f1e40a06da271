//! Status Notifier: formats outbound messages, fans them out through the
//! SMS gateway and records every attempt in the delivery log.
//!
//! Notification is always best-effort. Gateway failures are logged and
//! swallowed here; the order placement / status update that triggered the
//! message must never fail because SMS delivery did.

use std::sync::Arc;

use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{Customer, Order, OrderStatus};
use crate::sms::SmsGateway;

/// Decide whether a status update warrants a notification: only an actual
/// transition does, re-saving the same status does not.
pub fn status_change_notifies(old: OrderStatus, new: OrderStatus) -> bool {
    old != new
}

fn confirmation_message(customer_name: &str, summary: &str, total: i64) -> String {
    format!("Hi {customer_name}, your order has been received: {summary}. Total: Ksh {total}.")
}

fn status_message(customer_name: &str, status: OrderStatus) -> String {
    match status {
        OrderStatus::Delivered => {
            format!("Hi {customer_name}, your order has been delivered. Thank you for shopping with us!")
        }
        other => format!(
            "Hi {customer_name}, your order status is now: {}.",
            other.display_name()
        ),
    }
}

fn low_stock_message(item_name: &str, remaining: i32) -> String {
    format!("Stock alert: {item_name} has only {remaining} left!")
}

#[derive(Clone)]
pub struct Notifier {
    pool: DbPool,
    gateway: Arc<dyn SmsGateway>,
}

impl Notifier {
    pub fn new(pool: DbPool, gateway: Arc<dyn SmsGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Order confirmation to the customer who just placed it.
    pub async fn order_confirmation(&self, customer: &Customer, order: &Order, summary: &str) {
        let message = confirmation_message(&customer.name, summary, order.total_amount);
        self.dispatch(&customer.phone_number, &message).await;
    }

    /// Status transition message to the order's customer.
    pub async fn order_status_change(&self, customer: &Customer, order: &Order) {
        let message = status_message(&customer.name, order.status);
        self.dispatch(&customer.phone_number, &message).await;
    }

    /// Low-stock alert fanned out to every staff account with a phone number.
    pub async fn low_stock(&self, item_name: &str, remaining: i32) {
        let recipients: Vec<(String,)> = match sqlx::query_as(
            "SELECT phone_number FROM users WHERE is_staff AND phone_number IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "could not load staff contacts for stock alert");
                return;
            }
        };

        let message = low_stock_message(item_name, remaining);
        for (phone_number,) in recipients {
            self.dispatch(&phone_number, &message).await;
        }
    }

    async fn dispatch(&self, phone_number: &str, message: &str) {
        let status = match self.gateway.send(phone_number, message).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(phone_number, error = %err, "SMS send failed");
                "failed".to_string()
            }
        };

        if let Err(err) = self.record(phone_number, message, &status).await {
            tracing::warn!(error = %err, "could not record SMS delivery log entry");
        }
    }

    async fn record(&self, phone_number: &str, message: &str, status: &str) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sent_sms (id, phone_number, message, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(phone_number)
        .bind(message)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_to_different_status_notifies() {
        assert!(status_change_notifies(
            OrderStatus::Created,
            OrderStatus::Delivered
        ));
        assert!(status_change_notifies(
            OrderStatus::Pending,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn resetting_same_status_does_not_notify() {
        assert!(!status_change_notifies(
            OrderStatus::Created,
            OrderStatus::Created
        ));
    }

    #[test]
    fn confirmation_message_mentions_summary_and_total() {
        let msg = confirmation_message("Jane", "Laptop x1", 80000);
        assert!(msg.contains("Jane"));
        assert!(msg.contains("Laptop x1"));
        assert!(msg.contains("Ksh 80000"));
    }

    #[test]
    fn delivered_status_gets_special_wording() {
        let msg = status_message("Jane", OrderStatus::Delivered);
        assert!(msg.to_lowercase().contains("delivered"));

        let msg = status_message("Jane", OrderStatus::Pending);
        assert!(msg.contains("status is now: Pending"));
    }

    #[test]
    fn low_stock_message_names_item_and_count() {
        let msg = low_stock_message("Laptop", 3);
        assert!(msg.contains("Laptop"));
        assert!(msg.contains("3 left"));
    }
}
