//! Integration tests for checkout: state machine contract, finalize and the
//! notification fan-out.
//!
//! Run with: cargo test --test checkout_test

mod common;

use std::sync::Mutex;

use async_trait::async_trait;
use common::{seed_product, setup_db};
use lavka::core::{AppError, AppResult};
use lavka::storage::get_connection;
use lavka::storage::managers::add_manager;
use lavka::storage::orders::{add_cart_item, finalize_order, get_order_status};
use lavka::telegram::checkout::{is_affirmative, CheckoutFlow, CheckoutState};
use lavka::telegram::notifications::{notification_recipients, notify_new_order, order_summary_text, Messenger};
use pretty_assertions::assert_eq;

const USER: i64 = 2002;

/// Records every delivery attempt; optionally fails for one recipient.
struct RecordingMessenger {
    attempts: Mutex<Vec<i64>>,
    fail_for: Option<i64>,
}

impl RecordingMessenger {
    fn new(fail_for: Option<i64>) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            fail_for,
        }
    }

    fn attempts(&self) -> Vec<i64> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, _text: &str) -> AppResult<()> {
        self.attempts.lock().unwrap().push(chat_id);
        if self.fail_for == Some(chat_id) {
            return Err(AppError::InvalidInput("simulated delivery failure".to_string()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_two_managers_get_exactly_one_attempt_each() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 2).unwrap();

    add_manager(&conn, 111).unwrap();
    add_manager(&conn, 222).unwrap();

    let summary = finalize_order(&mut conn, USER, "+7000").unwrap();
    let recipients = notification_recipients(&conn);
    assert_eq!(recipients, vec![111, 222]);

    let messenger = RecordingMessenger::new(None);
    let delivered = notify_new_order(&messenger, &recipients, &summary).await;

    assert_eq!(messenger.attempts(), vec![111, 222]);
    assert_eq!(delivered, 2);
}

#[tokio::test]
async fn test_one_failed_delivery_affects_neither_the_rest_nor_the_order() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 2).unwrap();

    add_manager(&conn, 111).unwrap();
    add_manager(&conn, 222).unwrap();

    let summary = finalize_order(&mut conn, USER, "+7000").unwrap();
    let order_id = summary.order_id;

    let messenger = RecordingMessenger::new(Some(111));
    let delivered = notify_new_order(&messenger, &notification_recipients(&conn), &summary).await;

    // Both recipients were attempted exactly once; only one succeeded.
    assert_eq!(messenger.attempts(), vec![111, 222]);
    assert_eq!(delivered, 1);

    // The already-committed order is untouched by the failure.
    assert_eq!(get_order_status(&conn, order_id).unwrap().as_deref(), Some("submitted"));
}

#[tokio::test]
async fn test_no_recipients_means_no_attempts() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();
    let summary = finalize_order(&mut conn, USER, "+7000").unwrap();

    let messenger = RecordingMessenger::new(None);
    let delivered = notify_new_order(&messenger, &[], &summary).await;

    assert!(messenger.attempts().is_empty());
    assert_eq!(delivered, 0);
}

#[test]
fn test_summary_text_contains_frozen_line_prices() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 3).unwrap();

    let summary = finalize_order(&mut conn, USER, "+79990001122").unwrap();
    let text = order_summary_text(&summary);

    assert!(text.contains(&format!("Новый заказ #{}", summary.order_id)));
    assert!(text.contains("Телефон: +79990001122"));
    assert!(text.contains("Чай — 3 x 100.00 = 300.00"));
    assert!(text.contains("Итого: 300.00"));
}

// --- State machine contract ---

#[test]
fn test_checkout_states_progress_and_clear() {
    let flow = CheckoutFlow::new();
    assert!(!flow.is_active(USER));

    flow.start(USER);
    assert_eq!(flow.get(USER), Some(CheckoutState::AwaitingPhone));

    flow.set(
        USER,
        CheckoutState::AwaitingConfirmation {
            phone: "+7000".to_string(),
        },
    );
    assert_eq!(
        flow.get(USER),
        Some(CheckoutState::AwaitingConfirmation {
            phone: "+7000".to_string()
        })
    );

    // Terminal states are never stored.
    flow.clear(USER);
    assert!(!flow.is_active(USER));
}

#[test]
fn test_checkout_start_resets_previous_state() {
    let flow = CheckoutFlow::new();
    flow.set(
        USER,
        CheckoutState::AwaitingConfirmation {
            phone: "stale".to_string(),
        },
    );

    // A new flow always starts from scratch, stale slots notwithstanding.
    flow.start(USER);
    assert_eq!(flow.get(USER), Some(CheckoutState::AwaitingPhone));
}

#[test]
fn test_confirmation_token_set() {
    for token in ["да", "Да", "ДА", "yes", "Y", "ok", " OK "] {
        assert!(is_affirmative(token), "{token:?} should confirm");
    }
    for token in ["нет", "no", "", "ладно", "да нет"] {
        assert!(!is_affirmative(token), "{token:?} should cancel");
    }
}
