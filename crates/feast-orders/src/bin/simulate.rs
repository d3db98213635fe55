//! # Checkout Simulator
//!
//! Drives one order through the order book from cart to refund and prints
//! the resulting order as JSON.
//!
//! ## Usage
//! ```bash
//! cargo run -p feast-orders --bin simulate
//!
//! # Use a config file and a stricter status policy
//! cargo run -p feast-orders --bin simulate -- --config ./feast.toml
//! FEAST_STATUS_POLICY=terminal_lock cargo run -p feast-orders --bin simulate
//! ```
//!
//! ## Scenario
//! - Pizza ($10.00) + Soda ($2.00) → $12.00
//! - 2024 offer applied on 2024-06-01 → attached
//! - Single-use coupon already redeemed by another order → rejected
//! - Pizza removed → $2.00
//! - Card payment captured, then refunded

use chrono::{TimeZone, Utc};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use feast_core::{
    Coupon, DiscountValue, Food, Money, Offer, Order, OrderStatus, Payment, PaymentMethod, Percent,
    Restaurant, User, UserRole,
};
use feast_orders::{init_tracing, Clock, FixedClock, OrderBook, OrdersConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Feast Checkout Simulator");
                println!();
                println!("Usage: simulate [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = OrdersConfig::load(config_path)?;
    init_tracing(&config.logging.filter);

    let start = Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .ok_or("invalid simulation start time")?;
    let clock = Arc::new(FixedClock::new(start));
    let book = OrderBook::from_config(&config, clock.clone());

    // Catalogue
    let pizza = Food::new(1, "Pizza", "1 large", Money::from_cents(1000))?;
    let soda = Food::new(2, "Soda", "330 ml", Money::from_cents(200))?;
    let mut restaurant = Restaurant::new(200, "Luigi's", Vec::new())?;
    restaurant.add_menu_item(pizza.clone());
    restaurant.add_menu_item(soda.clone());

    let mut ada = User::register(100, "Ada", "ada@example.com", Vec::new(), UserRole::customer())?;
    ada.add_to_cart(&pizza);
    ada.add_to_cart(&soda);
    let cart: Vec<Food> = ada.cart().map(<[Food]>::to_vec).unwrap_or_default();

    // Discounts
    let offer = Offer::new(
        1,
        "2024 special",
        DiscountValue::percentage(Percent::from_bps(1000)),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().ok_or("invalid offer start")?,
        Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).single().ok_or("invalid offer end")?,
    )
    .with_description("10% off all year");
    let coupon = Coupon::new(1, "Launch coupon", "LAUNCH", offer.clone())?.with_usage_limit(1);
    book.coupons().register(coupon).await?;

    // Someone else got there first.
    book.place_order(Order::new(1, 101, restaurant.id(), "", clock.now()))
        .await?;
    book.redeem_coupon(1, "LAUNCH").await?;

    // Checkout
    let order = book
        .place_user_order(&ada, 2, &restaurant, &cart, "Ring the bell")
        .await?;
    let order_id = order.id();
    println!("Order {} total: {}", order_id, book.total_price(order_id).await?);

    let offer_outcome = book.apply_offer(order_id, &offer).await?;
    let coupon_outcome = book.redeem_coupon(order_id, "LAUNCH").await?;
    println!("Offer: {:?}, coupon: {:?}", offer_outcome, coupon_outcome);

    book.remove_item(order_id, pizza.id()).await?;
    let total = book.total_price(order_id).await?;
    println!("After removing pizza: {}", total);

    book.update_status(order_id, OrderStatus::Accepted).await?;
    book.update_status(order_id, OrderStatus::Preparing).await?;

    let payment = Payment::new(1, PaymentMethod::Card, total, clock.now());
    book.complete_payment(order_id, payment).await?;
    clock.advance(chrono::Duration::minutes(5));
    book.capture_payment(order_id, &format!("txn_{}", Uuid::new_v4().simple()))
        .await?;

    book.update_status(order_id, OrderStatus::Cancelled).await?;
    book.refund_payment(order_id).await?;

    let summary = book.get(order_id).await?;
    info!(order_id, status = %summary.status(), "Simulation finished");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
