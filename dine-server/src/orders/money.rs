//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done in `Decimal` internally, then converted to `f64`
//! for storage/serialization. Monetary comparisons use a 0.01 tolerance.

use rust_decimal::prelude::*;
use shared::models::{Order, OrderItem, PaymentEntry};

use crate::orders::actions::OrderError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per item (₹1,000,000)
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;
/// Maximum allowed payment amount (₹1,000,000)
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::InvalidOperation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a line item before it enters an order
pub fn validate_item(item: &OrderItem) -> Result<(), OrderError> {
    require_finite(item.price, "price")?;
    if item.price < 0.0 {
        return Err(OrderError::InvalidOperation(format!(
            "price must be non-negative, got {}",
            item.price
        )));
    }
    if item.price > MAX_PRICE {
        return Err(OrderError::InvalidOperation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.price
        )));
    }
    if item.quantity <= 0 {
        return Err(OrderError::InvalidOperation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidOperation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Validate a monetary amount supplied by a caller (payment, refund, discount)
pub fn validate_amount(amount: f64, field_name: &str) -> Result<(), OrderError> {
    require_finite(amount, field_name)?;
    if amount <= 0.0 {
        return Err(OrderError::InvalidOperation(format!(
            "{} must be positive, got {}",
            field_name, amount
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(OrderError::InvalidOperation(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_AMOUNT, amount
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Recalculate an order's financial fields from its items and discount
///
/// subtotal = Σ line totals, total = subtotal - discount + tax. The tax
/// amount is derived from the configured rate on the discounted subtotal.
pub fn recalculate_totals(order: &mut Order, tax_rate_percent: f64) {
    let subtotal: Decimal = order.items.iter().map(|i| i.line_total()).sum();
    let discount = to_decimal(order.discount_amount).min(subtotal);
    let taxable = subtotal - discount;
    let tax = (taxable * to_decimal(tax_rate_percent) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);

    order.subtotal = to_f64(subtotal);
    order.discount_amount = to_f64(discount);
    order.tax = to_f64(tax);
    order.total = to_f64(taxable + tax);
}

/// Sum settled ledger amounts net of refunds
pub fn sum_paid(entries: &[PaymentEntry]) -> f64 {
    let total: Decimal = entries
        .iter()
        .map(|e| to_decimal(e.amount) - to_decimal(e.refunded_amount))
        .sum();
    to_f64(total)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Check whether `amount` exceeds `limit` beyond the tolerance
pub fn exceeds(amount: f64, limit: f64) -> bool {
    to_decimal(amount) > to_decimal(limit) + MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ItemStatus;

    fn item(price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            menu_item_id: "menu-1".to_string(),
            name: "Item".to_string(),
            price,
            quantity,
            is_veg: true,
            item_status: ItemStatus::Queued,
            started_at: None,
            ready_at: None,
            served_at: None,
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        let sum_dec = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_to_decimal_nan_becomes_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_validate_item_bounds() {
        assert!(validate_item(&item(250.0, 2)).is_ok());
        assert!(validate_item(&item(-1.0, 1)).is_err());
        assert!(validate_item(&item(f64::NAN, 1)).is_err());
        assert!(validate_item(&item(10.0, 0)).is_err());
        assert!(validate_item(&item(10.0, 10000)).is_err());
        assert!(validate_item(&item(MAX_PRICE + 1.0, 1)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(100.0, "amount").is_ok());
        assert!(validate_amount(0.0, "amount").is_err());
        assert!(validate_amount(-5.0, "amount").is_err());
        assert!(validate_amount(f64::INFINITY, "amount").is_err());
    }

    #[test]
    fn test_recalculate_totals() {
        let mut order = Order {
            id: "ord-1".to_string(),
            restaurant_id: "rest-1".to_string(),
            order_number: 101,
            order_token: "tok".to_string(),
            order_type: Default::default(),
            table_id: None,
            table_number: None,
            session_id: None,
            customer: Default::default(),
            special_instructions: None,
            items: vec![item(250.0, 2), item(75.0, 1)],
            subtotal: 0.0,
            discount_amount: 50.0,
            discount: None,
            tax: 0.0,
            total: 0.0,
            payment_status: Default::default(),
            payment_method: Default::default(),
            split: None,
            refund_amount: 0.0,
            refund_reason: None,
            refunded_at: None,
            order_status: Default::default(),
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
            created_at: 0,
            updated_at: 0,
        };

        recalculate_totals(&mut order, 5.0);
        assert_eq!(order.subtotal, 575.0);
        // (575 - 50) * 5% = 26.25
        assert_eq!(order.tax, 26.25);
        assert_eq!(order.total, 551.25);
        assert!(order.totals_consistent());
    }

    #[test]
    fn test_recalculate_caps_discount_at_subtotal() {
        let mut order = Order {
            items: vec![item(10.0, 1)],
            discount_amount: 100.0,
            ..serde_json::from_value(serde_json::json!({
                "id": "ord-1", "restaurant_id": "rest-1", "order_number": 1,
                "order_token": "tok", "order_type": "dine_in", "items": [],
                "subtotal": 0.0, "discount_amount": 0.0, "tax": 0.0, "total": 0.0,
                "payment_status": "pending", "payment_method": {"kind": "cash"},
                "refund_amount": 0.0, "order_status": "pending_payment",
                "version": 0, "created_at": 0, "updated_at": 0
            }))
            .unwrap()
        };

        recalculate_totals(&mut order, 0.0);
        assert_eq!(order.discount_amount, 10.0);
        assert_eq!(order.total, 0.0);
    }

    #[test]
    fn test_sum_paid_nets_refunds() {
        let entry = |amount: f64, refunded: f64| PaymentEntry {
            payment_id: "p".to_string(),
            order_id: "o".to_string(),
            restaurant_id: "r".to_string(),
            method: "cash".to_string(),
            amount,
            provider_order_ref: None,
            provider_payment_id: None,
            split_part: false,
            refunded_amount: refunded,
            created_at: 0,
        };
        assert_eq!(sum_paid(&[entry(200.0, 0.0), entry(325.0, 25.0)]), 500.0);
    }

    #[test]
    fn test_money_eq_and_exceeds() {
        assert!(money_eq(100.0, 100.0));
        assert!(money_eq(100.004, 100.006));
        assert!(!money_eq(100.0, 100.02));

        assert!(!exceeds(100.0, 100.0));
        assert!(!exceeds(100.009, 100.0)); // within tolerance
        assert!(exceeds(100.02, 100.0));
    }
}
