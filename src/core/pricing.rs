//! Pricing policy
//!
//! One pure function shared by the product view (live preview), the cart
//! add path (snapshot written onto the order line) and the repeat-add
//! re-pricing. Once a snapshot is written to a line it is never recomputed
//! from the product again — later price edits affect only future adds.

use crate::storage::catalog::Product;

/// Returns the unit price for `quantity` items of `product`.
///
/// The bulk price applies only when both `bulk_threshold` and `bulk_price`
/// are set and the quantity meets the threshold; either field alone leaves
/// the base price in effect.
pub fn unit_price(product: &Product, quantity: i64) -> f64 {
    if let (Some(threshold), Some(bulk)) = (product.bulk_threshold, product.bulk_price) {
        if quantity >= threshold {
            return bulk;
        }
    }
    product.price
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, bulk_threshold: Option<i64>, bulk_price: Option<f64>) -> Product {
        Product {
            id: 1,
            title: "Товар".to_string(),
            description: None,
            price,
            bulk_threshold,
            bulk_price,
            stock_qty: 0,
            in_stock: true,
            is_deleted: false,
            photo_file_id: None,
            category_id: None,
        }
    }

    #[test]
    fn test_base_price_without_bulk_fields() {
        let p = product(100.0, None, None);
        assert_eq!(unit_price(&p, 1), 100.0);
        assert_eq!(unit_price(&p, 1000), 100.0);
    }

    #[test]
    fn test_bulk_price_at_and_above_threshold() {
        let p = product(100.0, Some(5), Some(80.0));
        assert_eq!(unit_price(&p, 4), 100.0);
        assert_eq!(unit_price(&p, 5), 80.0);
        assert_eq!(unit_price(&p, 6), 80.0);
    }

    #[test]
    fn test_threshold_without_bulk_price_is_inert() {
        // Absent bulk price disables bulk pricing even with a threshold set.
        let p = product(100.0, Some(5), None);
        assert_eq!(unit_price(&p, 10), 100.0);
    }

    #[test]
    fn test_bulk_price_without_threshold_is_inert() {
        let p = product(100.0, None, Some(80.0));
        assert_eq!(unit_price(&p, 10), 100.0);
    }
}
