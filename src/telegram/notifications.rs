//! Order notification fan-out
//!
//! After a successful finalize the order summary is delivered to every
//! registered manager (or the configured fallback chat). Delivery is
//! fire-and-forget: one attempt per recipient, failures are logged and
//! swallowed, the committed order is never affected.

use async_trait::async_trait;
use teloxide::prelude::*;

use crate::core::config;
use crate::core::error::AppResult;
use crate::storage::db::DbConnection;
use crate::storage::managers::list_manager_ids;
use crate::storage::orders::OrderSummary;

/// Message delivery primitive. The bot implements it for production;
/// tests substitute a recorder to count delivery attempts.
#[async_trait]
pub trait Messenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()>;
}

#[async_trait]
impl Messenger for Bot {
    async fn send_text(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}

/// Recipients for order notifications: all registered managers, or the
/// configured fallback chat when none are registered.
pub fn notification_recipients(conn: &DbConnection) -> Vec<i64> {
    match list_manager_ids(conn) {
        Ok(ids) if !ids.is_empty() => ids,
        Ok(_) => config::MANAGER_CHAT_ID.iter().copied().collect(),
        Err(e) => {
            log::error!("Failed to load manager list: {}", e);
            config::MANAGER_CHAT_ID.iter().copied().collect()
        }
    }
}

/// Plain-text order summary: order id, phone, one line per item, total.
pub fn order_summary_text(summary: &OrderSummary) -> String {
    let mut lines = vec![
        format!("Новый заказ #{}", summary.order_id),
        format!("Телефон: {}", summary.customer_phone),
        String::new(),
    ];
    for line in &summary.lines {
        let title = match &line.flavor {
            Some(flavor) => format!("{} ({})", line.title, flavor),
            None => line.title.clone(),
        };
        lines.push(format!(
            "{} — {} x {:.2} = {:.2}",
            title,
            line.quantity,
            line.unit_price,
            line.subtotal()
        ));
    }
    lines.push(String::new());
    lines.push(format!("Итого: {:.2}", summary.total()));
    lines.join("\n")
}

/// Delivers the summary to every recipient. Each attempt is isolated: a
/// failed send is logged and the loop moves on. Returns the number of
/// successful deliveries.
pub async fn notify_new_order<M: Messenger + Sync>(messenger: &M, recipients: &[i64], summary: &OrderSummary) -> usize {
    if recipients.is_empty() {
        log::warn!(
            "Order #{} submitted but no managers registered and no fallback chat configured",
            summary.order_id
        );
        return 0;
    }

    let text = order_summary_text(summary);
    let mut delivered = 0;
    for &chat_id in recipients {
        match messenger.send_text(chat_id, &text).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                log::error!(
                    "Failed to deliver order #{} notification to {}: {}",
                    summary.order_id,
                    chat_id,
                    e
                );
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::orders::CartLine;

    fn summary() -> OrderSummary {
        OrderSummary {
            order_id: 7,
            customer_phone: "+70000000000".to_string(),
            lines: vec![
                CartLine {
                    product_id: 1,
                    title: "Чай".to_string(),
                    flavor: None,
                    quantity: 3,
                    unit_price: 100.0,
                },
                CartLine {
                    product_id: 2,
                    title: "Кофе".to_string(),
                    flavor: Some("Арабика".to_string()),
                    quantity: 5,
                    unit_price: 80.0,
                },
            ],
        }
    }

    #[test]
    fn test_summary_text_lines_and_total() {
        let text = order_summary_text(&summary());
        assert!(text.contains("Новый заказ #7"));
        assert!(text.contains("Телефон: +70000000000"));
        assert!(text.contains("Чай — 3 x 100.00 = 300.00"));
        assert!(text.contains("Кофе (Арабика) — 5 x 80.00 = 400.00"));
        assert!(text.contains("Итого: 700.00"));
    }
}
