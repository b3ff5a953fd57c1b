//! Checkout arithmetic shared by the order flow. All amounts are in minor
//! currency units; promo codes map to fixed rules rather than a table.

use crate::config::PricingConfig;

/// Sum of `price_snapshot * quantity` over cart lines.
pub fn subtotal(lines: &[(i64, i32)]) -> i64 {
    lines
        .iter()
        .map(|(price, quantity)| price * (*quantity as i64))
        .sum()
}

/// Fixed promo lookup. Unknown or absent codes yield no discount.
pub fn promo_discount(code: Option<&str>, subtotal: i64) -> i64 {
    match code {
        // 10% off the subtotal.
        Some("FIRST10") => subtotal / 10,
        // Flat 50 or 5%, whichever is less.
        Some("SAVE50") => i64::min(50, subtotal / 20),
        _ => 0,
    }
}

pub fn delivery_fee(subtotal: i64, pricing: &PricingConfig) -> i64 {
    if subtotal >= pricing.free_delivery_threshold {
        0
    } else {
        pricing.delivery_fee
    }
}

/// `subtotal - discount + delivery_fee`, with the discount clamped to the
/// subtotal so the total can never drop below the delivery fee. Returns the
/// clamped discount alongside the total.
pub fn order_total(subtotal: i64, discount: i64, delivery_fee: i64) -> (i64, i64) {
    let discount = discount.clamp(0, subtotal);
    (discount, subtotal - discount + delivery_fee)
}
