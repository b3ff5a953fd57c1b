use freshcart_api::config::PricingConfig;
use freshcart_api::pricing::{delivery_fee, order_total, promo_discount, subtotal};
use freshcart_api::services::product_service::relevance_score;

fn default_pricing() -> PricingConfig {
    PricingConfig::default()
}

#[test]
fn subtotal_sums_snapshot_times_quantity() {
    let lines = [(100, 2), (250, 1), (30, 4)];
    assert_eq!(subtotal(&lines), 200 + 250 + 120);
    assert_eq!(subtotal(&[]), 0);
}

#[test]
fn delivery_is_free_above_threshold() {
    let pricing = default_pricing();
    assert_eq!(delivery_fee(600, &pricing), 0);
    assert_eq!(delivery_fee(500, &pricing), 0);
    assert_eq!(delivery_fee(300, &pricing), 50);
}

#[test]
fn first10_takes_ten_percent() {
    assert_eq!(promo_discount(Some("FIRST10"), 1000), 100);

    let fee = delivery_fee(1000, &default_pricing());
    let (discount, total) = order_total(1000, 100, fee);
    assert_eq!(discount, 100);
    assert_eq!(total, 900);
}

#[test]
fn save50_is_capped_at_five_percent() {
    // 5% of 400 is 20, below the flat 50.
    assert_eq!(promo_discount(Some("SAVE50"), 400), 20);
    // 5% of 2000 is 100, so the flat 50 wins.
    assert_eq!(promo_discount(Some("SAVE50"), 2000), 50);
}

#[test]
fn unknown_promo_gives_no_discount() {
    assert_eq!(promo_discount(Some("BOGUS"), 1000), 0);
    assert_eq!(promo_discount(None, 1000), 0);
}

#[test]
fn discount_never_pushes_total_below_delivery_fee() {
    let pricing = default_pricing();
    let fee = delivery_fee(100, &pricing);
    let (discount, total) = order_total(100, 10_000, fee);
    assert_eq!(discount, 100);
    assert_eq!(total, fee);
}

#[test]
fn relevance_prefers_name_prefix_over_description() {
    let prefix = relevance_score("milk", "Milk chocolate", Some("a bar"));
    let contains = relevance_score("milk", "Chocolate with milk", Some("a bar"));
    let desc_only = relevance_score("milk", "Chocolate bar", Some("made with milk"));
    let none = relevance_score("milk", "Orange juice", Some("freshly squeezed"));

    assert_eq!(prefix, 15);
    assert_eq!(contains, 10);
    assert_eq!(desc_only, 3);
    assert_eq!(none, 0);
    assert!(prefix > contains && contains > desc_only && desc_only > none);
}

#[test]
fn relevance_is_case_insensitive() {
    assert_eq!(
        relevance_score("MILK", "milk bottle", None),
        relevance_score("milk", "Milk Bottle", None)
    );
}
