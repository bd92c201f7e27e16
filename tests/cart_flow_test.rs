//! Integration tests for the cart aggregate: line merging, flavor gating,
//! price snapshots and finalize.
//!
//! Run with: cargo test --test cart_flow_test

mod common;

use common::{seed_bulk_product, seed_flavor, seed_product, setup_db};
use lavka::core::AppError;
use lavka::storage::catalog::{archive_product, update_product_price};
use lavka::storage::get_connection;
use lavka::storage::orders::{
    add_cart_item, clear_cart, count_submitted_orders, finalize_order, get_order_status, load_cart,
};
use pretty_assertions::assert_eq;

const USER: i64 = 1001;

#[test]
fn test_duplicate_add_merges_into_one_line() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);

    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();
    add_cart_item(&mut conn, USER, product_id, None, 2).unwrap();

    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 3);
}

#[test]
fn test_add_without_flavor_is_rejected_and_mutates_nothing() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Снюс", 100.0);
    seed_flavor(&conn, product_id, "Мята");

    let result = add_cart_item(&mut conn, USER, product_id, None, 1);
    assert!(matches!(result, Err(AppError::FlavorRequired)));

    // No order line was created, not even an empty cart with lines.
    let cart = load_cart(&conn, USER).unwrap();
    assert!(cart.map(|c| c.lines.is_empty()).unwrap_or(true));
}

#[test]
fn test_flavored_lines_are_keyed_per_flavor() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Снюс", 100.0);
    let mint = seed_flavor(&conn, product_id, "Мята");
    let berry = seed_flavor(&conn, product_id, "Ягода");

    add_cart_item(&mut conn, USER, product_id, Some(mint), 1).unwrap();
    add_cart_item(&mut conn, USER, product_id, Some(berry), 1).unwrap();
    add_cart_item(&mut conn, USER, product_id, Some(mint), 2).unwrap();

    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.lines.len(), 2);
    let mint_line = cart.lines.iter().find(|l| l.flavor.as_deref() == Some("Мята")).unwrap();
    assert_eq!(mint_line.quantity, 3);
}

#[test]
fn test_unknown_flavor_is_rejected() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Снюс", 100.0);
    seed_flavor(&conn, product_id, "Мята");

    let result = add_cart_item(&mut conn, USER, product_id, Some(999), 1);
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn test_archived_product_cannot_be_added() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Старый товар", 100.0);
    archive_product(&conn, product_id).unwrap();

    let result = add_cart_item(&mut conn, USER, product_id, None, 1);
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn test_cart_total_simple() {
    // Product A: price 100, no bulk, qty 3 → total 300.
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "A", 100.0);

    add_cart_item(&mut conn, USER, product_id, None, 3).unwrap();

    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.total(), 300.0);
}

#[test]
fn test_cart_total_bulk_single_add() {
    // Product B: price 100, threshold 5, bulk 80, qty 5 → total 400.
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_bulk_product(&conn, "B", 100.0, 5, 80.0);

    add_cart_item(&mut conn, USER, product_id, None, 5).unwrap();

    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.lines[0].unit_price, 80.0);
    assert_eq!(cart.total(), 400.0);
}

#[test]
fn test_repeat_add_reprices_at_cumulative_quantity() {
    // Crossing the threshold through repeated small adds charges the bulk
    // price for the whole line.
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_bulk_product(&conn, "B", 100.0, 5, 80.0);

    add_cart_item(&mut conn, USER, product_id, None, 3).unwrap();
    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.lines[0].unit_price, 100.0);
    assert_eq!(cart.total(), 300.0);

    add_cart_item(&mut conn, USER, product_id, None, 2).unwrap();
    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.lines[0].quantity, 5);
    assert_eq!(cart.lines[0].unit_price, 80.0);
    assert_eq!(cart.total(), 400.0);
}

#[test]
fn test_line_price_is_frozen_against_product_edits() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);

    add_cart_item(&mut conn, USER, product_id, None, 3).unwrap();
    update_product_price(&conn, product_id, 250.0).unwrap();

    // The snapshot on the line must not follow the catalog.
    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_eq!(cart.lines[0].unit_price, 100.0);
    assert_eq!(cart.total(), 300.0);
}

#[test]
fn test_clear_cart_keeps_order_row_for_reuse() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);

    add_cart_item(&mut conn, USER, product_id, None, 2).unwrap();
    let order_id = load_cart(&conn, USER).unwrap().unwrap().order_id;

    clear_cart(&conn, USER).unwrap();
    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert!(cart.lines.is_empty());
    assert_eq!(cart.order_id, order_id);

    // The same order row picks up the next add.
    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();
    assert_eq!(load_cart(&conn, USER).unwrap().unwrap().order_id, order_id);
}

#[test]
fn test_one_new_order_per_user() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let tea = seed_product(&conn, "Чай", 100.0);
    let coffee = seed_product(&conn, "Кофе", 150.0);

    add_cart_item(&mut conn, USER, tea, None, 1).unwrap();
    add_cart_item(&mut conn, USER, coffee, None, 1).unwrap();

    let new_orders: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM orders WHERE user_id = ?1 AND status = 'new'",
            [USER],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(new_orders, 1);
}

#[test]
fn test_carts_are_scoped_per_user() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);

    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();
    add_cart_item(&mut conn, USER + 1, product_id, None, 5).unwrap();

    assert_eq!(load_cart(&conn, USER).unwrap().unwrap().lines[0].quantity, 1);
    assert_eq!(load_cart(&conn, USER + 1).unwrap().unwrap().lines[0].quantity, 5);
}

#[test]
fn test_finalize_empty_cart_fails_without_status_change() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();

    // No cart at all.
    assert!(matches!(finalize_order(&mut conn, USER, "+7000"), Err(AppError::EmptyCart)));

    // Cart exists but has zero lines.
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();
    let order_id = load_cart(&conn, USER).unwrap().unwrap().order_id;
    clear_cart(&conn, USER).unwrap();

    assert!(matches!(finalize_order(&mut conn, USER, "+7000"), Err(AppError::EmptyCart)));
    assert_eq!(get_order_status(&conn, order_id).unwrap().as_deref(), Some("new"));
}

#[test]
fn test_finalize_submits_order_with_phone() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 3).unwrap();

    let summary = finalize_order(&mut conn, USER, "+79990001122").unwrap();
    assert_eq!(summary.customer_phone, "+79990001122");
    assert_eq!(summary.lines.len(), 1);
    assert_eq!(summary.total(), 300.0);

    assert_eq!(
        get_order_status(&conn, summary.order_id).unwrap().as_deref(),
        Some("submitted")
    );
    let phone: Option<String> = conn
        .query_row(
            "SELECT customer_phone FROM orders WHERE id = ?1",
            [summary.order_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(phone.as_deref(), Some("+79990001122"));

    // The cart is gone; the next add starts a fresh order.
    assert!(load_cart(&conn, USER).unwrap().is_none());
}

#[test]
fn test_double_finalize_produces_single_submitted_order() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);
    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();

    finalize_order(&mut conn, USER, "+7000").unwrap();
    // Double-tap on confirm: the status guard turns the second call into
    // an empty-cart failure.
    assert!(matches!(finalize_order(&mut conn, USER, "+7000"), Err(AppError::EmptyCart)));

    assert_eq!(count_submitted_orders(&conn, USER).unwrap(), 1);
}

#[test]
fn test_new_cart_after_finalize_is_independent() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);

    add_cart_item(&mut conn, USER, product_id, None, 1).unwrap();
    let first = finalize_order(&mut conn, USER, "+7000").unwrap();

    add_cart_item(&mut conn, USER, product_id, None, 2).unwrap();
    let cart = load_cart(&conn, USER).unwrap().unwrap();
    assert_ne!(cart.order_id, first.order_id);
    assert_eq!(cart.lines[0].quantity, 2);
}

#[test]
fn test_invalid_quantity_is_rejected() {
    let db = setup_db();
    let mut conn = get_connection(&db.pool).unwrap();
    let product_id = seed_product(&conn, "Чай", 100.0);

    assert!(matches!(
        add_cart_item(&mut conn, USER, product_id, None, 0),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        add_cart_item(&mut conn, USER, product_id, None, -3),
        Err(AppError::InvalidInput(_))
    ));
}
