//! Shared helpers for integration tests: throwaway SQLite database with
//! migrations applied, plus catalog seeding shortcuts.

#![allow(dead_code)]

use lavka::storage::catalog::{
    create_flavor, create_product, update_product_bulk_price, update_product_bulk_threshold, NewProduct,
};
use lavka::storage::{create_pool, DbConnection, DbPool};
use tempfile::TempDir;

pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    TestDb { pool, _dir: dir }
}

pub fn seed_product(conn: &DbConnection, title: &str, price: f64) -> i64 {
    create_product(
        conn,
        &NewProduct {
            title,
            description: None,
            price,
            photo_file_id: None,
            in_stock: true,
            category_id: None,
        },
    )
    .unwrap()
}

pub fn seed_bulk_product(conn: &DbConnection, title: &str, price: f64, threshold: i64, bulk_price: f64) -> i64 {
    let id = seed_product(conn, title, price);
    update_product_bulk_threshold(conn, id, Some(threshold)).unwrap();
    update_product_bulk_price(conn, id, Some(bulk_price)).unwrap();
    id
}

pub fn seed_flavor(conn: &DbConnection, product_id: i64, name: &str) -> i64 {
    create_flavor(conn, product_id, name).unwrap()
}
