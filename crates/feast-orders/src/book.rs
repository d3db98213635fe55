//! # Order Book
//!
//! Concurrent home for live orders.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         OrderBook                                       │
//! │                                                                         │
//! │  orders: RwLock<HashMap<order id, Arc<Mutex<Order>>>>                   │
//! │                                                                         │
//! │  caller ──► read map ──► clone Arc ──► release map ──► lock order       │
//! │                                                          │              │
//! │                                 mutate through feast-core ◄┘            │
//! │                                                                         │
//! │  Same order id:      callers queue on that order's mutex                │
//! │  Different order id: no shared lock is held while mutating              │
//! │                                                                         │
//! │  Injected: Clock (offer windows, payment stamps)                        │
//! │            IdGenerator (order line ids)                                 │
//! │            TransitionPolicy (status changes)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use feast_core::{
    CoreResult, DiscountOutcome, Food, IdGenerator, Money, Offer, Order, OrderStatus, Payment,
    Restaurant, SequentialIds, StatusChange, TransitionPolicy, User,
};

use crate::clock::Clock;
use crate::config::OrdersConfig;
use crate::coupons::CouponRegistry;
use crate::error::{OrdersError, OrdersResult};

pub struct OrderBook {
    orders: RwLock<HashMap<u64, Arc<Mutex<Order>>>>,
    coupons: CouponRegistry,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    policy: Box<dyn TransitionPolicy>,
}

impl OrderBook {
    pub fn new(
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        policy: Box<dyn TransitionPolicy>,
    ) -> Self {
        OrderBook {
            orders: RwLock::new(HashMap::new()),
            coupons: CouponRegistry::new(),
            ids,
            clock,
            policy,
        }
    }

    /// Builds a book with sequential line ids and the configured status policy.
    pub fn from_config(config: &OrdersConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            service = %config.service.name,
            policy = %config.orders.status_policy,
            first_item_id = config.orders.first_item_id,
            "Order book ready"
        );
        Self::new(
            Arc::new(SequentialIds::starting_at(config.orders.first_item_id)),
            clock,
            config.orders.status_policy.policy(),
        )
    }

    pub fn coupons(&self) -> &CouponRegistry {
        &self.coupons
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    // =========================================================================
    // Placing & Reading
    // =========================================================================

    /// Starts tracking `order`. Order ids are chosen by the caller and must
    /// be unique within the book.
    pub async fn place_order(&self, order: Order) -> OrdersResult<u64> {
        let order_id = order.id();
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order_id) {
            warn!(order_id, "Rejected duplicate order id");
            return Err(OrdersError::DuplicateOrder(order_id));
        }

        info!(
            order_id,
            user_id = order.user_id(),
            restaurant_id = order.restaurant_id(),
            items = order.items().len(),
            "Order placed"
        );
        orders.insert(order_id, Arc::new(Mutex::new(order)));
        Ok(order_id)
    }

    /// Builds the order from `user`'s selection (one line per food, stamped
    /// with the clock's now) and places it.
    pub async fn place_user_order(
        &self,
        user: &User,
        order_id: u64,
        restaurant: &Restaurant,
        items: &[Food],
        description: &str,
    ) -> OrdersResult<Order> {
        let order = user.place_order(
            order_id,
            restaurant,
            items,
            description,
            self.ids.as_ref(),
            self.clock.now(),
        );
        self.place_order(order.clone()).await?;
        Ok(order)
    }

    /// Snapshot of the order as it is now.
    pub async fn get(&self, order_id: u64) -> OrdersResult<Order> {
        self.with_order(order_id, |order| order.clone()).await
    }

    pub async fn total_price(&self, order_id: u64) -> OrdersResult<Money> {
        self.with_order(order_id, |order| order.total_price()).await
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Returns the new line's id.
    pub async fn add_item(&self, order_id: u64, food: &Food, quantity: &str) -> OrdersResult<u64> {
        let item_id = self
            .with_order(order_id, |order| order.add_item(food, quantity, self.ids.as_ref()))
            .await?;
        debug!(order_id, food_id = food.id(), item_id, price = %food.price(), "Item added");
        Ok(item_id)
    }

    /// Returns how many lines were removed; zero is not an error.
    pub async fn remove_item(&self, order_id: u64, food_id: u64) -> OrdersResult<usize> {
        let removed = self
            .with_order(order_id, |order| order.remove_item(food_id))
            .await?;
        debug!(order_id, food_id, removed, "Items removed");
        Ok(removed)
    }

    pub async fn change_item_quantity(
        &self,
        order_id: u64,
        item_id: u64,
        quantity: &str,
    ) -> OrdersResult<bool> {
        self.with_order(order_id, |order| order.change_item_quantity(item_id, quantity))
            .await
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Attaches `offer` if it is valid at the clock's current time.
    pub async fn apply_offer(&self, order_id: u64, offer: &Offer) -> OrdersResult<DiscountOutcome> {
        let now = self.clock.now();
        let outcome = self
            .with_order(order_id, |order| order.apply_offer(offer, now))
            .await?;
        log_outcome(order_id, "offer", offer.name(), outcome);
        Ok(outcome)
    }

    /// Attaches the registered coupon if it has uses left, without consuming
    /// one. Use [`OrderBook::redeem_coupon`] to attach and count in one step.
    pub async fn apply_coupon(&self, order_id: u64, code: &str) -> OrdersResult<DiscountOutcome> {
        let entry = self.order_entry(order_id).await?;
        let coupon = self.coupons.entry(code).await?;

        let mut order = entry.lock().await;
        let coupon = coupon.lock().await;
        let outcome = order.apply_coupon(&coupon);
        log_outcome(order_id, "coupon", coupon.code(), outcome);
        Ok(outcome)
    }

    /// Attaches the coupon and consumes one use, holding both the order and
    /// the coupon lock so the usability check and the increment cannot be
    /// split by another redemption. The order ends up holding the coupon
    /// as it is after the increment.
    pub async fn redeem_coupon(&self, order_id: u64, code: &str) -> OrdersResult<DiscountOutcome> {
        let entry = self.order_entry(order_id).await?;
        let coupon = self.coupons.entry(code).await?;

        let mut order = entry.lock().await;
        let mut coupon = coupon.lock().await;
        let outcome = order.redeem_coupon(&mut *coupon);
        if outcome.is_attached() {
            debug!(order_id, code = %coupon.code(), used_count = coupon.used_count(), "Coupon redeemed");
        }
        log_outcome(order_id, "coupon", coupon.code(), outcome);
        Ok(outcome)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Changes status through the book's transition policy.
    pub async fn update_status(&self, order_id: u64, status: OrderStatus) -> OrdersResult<StatusChange> {
        let policy = self.policy.as_ref();
        let change = self
            .with_order(order_id, |order| order.update_status_with(status, policy))
            .await?
            .inspect_err(|err| warn!(order_id, %status, error = %err, "Status change refused"))?;
        info!(order_id, from = %change.from, status = %change.to, "Order status changed");
        Ok(change)
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Attaches `payment` as-is; returns the payment it replaced, if any.
    pub async fn complete_payment(&self, order_id: u64, payment: Payment) -> OrdersResult<Option<Payment>> {
        let payment_id = payment.id();
        let replaced = self
            .with_order(order_id, |order| order.complete_payment(payment))
            .await?;
        info!(order_id, payment_id, replaced = replaced.is_some(), "Payment attached");
        Ok(replaced)
    }

    /// Completes the attached payment, stamped with the clock's now.
    pub async fn capture_payment(&self, order_id: u64, transaction_id: &str) -> OrdersResult<Payment> {
        let now = self.clock.now();
        let payment = self
            .drive_payment(order_id, |payment| payment.complete(transaction_id, now))
            .await?;
        info!(order_id, transaction_id, "Payment captured");
        Ok(payment)
    }

    pub async fn fail_payment(&self, order_id: u64) -> OrdersResult<Payment> {
        let payment = self.drive_payment(order_id, Payment::fail).await?;
        info!(order_id, "Payment failed");
        Ok(payment)
    }

    pub async fn refund_payment(&self, order_id: u64) -> OrdersResult<Payment> {
        let payment = self.drive_payment(order_id, Payment::refund).await?;
        info!(order_id, amount = %payment.amount(), "Payment refunded");
        Ok(payment)
    }

    // =========================================================================
    // Locking
    // =========================================================================

    async fn order_entry(&self, order_id: u64) -> OrdersResult<Arc<Mutex<Order>>> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(OrdersError::OrderNotFound(order_id))
    }

    /// Runs `f` with exclusive access to one order.
    async fn with_order<F, R>(&self, order_id: u64, f: F) -> OrdersResult<R>
    where
        F: FnOnce(&mut Order) -> R,
    {
        let entry = self.order_entry(order_id).await?;
        let mut order = entry.lock().await;
        Ok(f(&mut *order))
    }

    /// Applies one payment transition and returns the payment afterwards.
    async fn drive_payment<F>(&self, order_id: u64, step: F) -> OrdersResult<Payment>
    where
        F: FnOnce(&mut Payment) -> CoreResult<()>,
    {
        self.with_order(order_id, |order| -> OrdersResult<Payment> {
            let payment = order.payment_mut().ok_or(OrdersError::NoPayment(order_id))?;
            step(&mut *payment).inspect_err(
                |err| warn!(order_id, payment_id = payment.id(), error = %err, "Payment transition refused"),
            )?;
            Ok(payment.clone())
        })
        .await?
    }
}

fn log_outcome(order_id: u64, kind: &str, name: &str, outcome: DiscountOutcome) {
    match outcome {
        DiscountOutcome::Attached => info!(order_id, kind, code = %name, "Discount attached"),
        DiscountOutcome::Rejected(reason) => {
            info!(order_id, kind, code = %name, reason = reason.code(), "Discount rejected")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::StatusPolicyKind;
    use chrono::{DateTime, TimeZone, Utc};
    use feast_core::{
        CoreError, Coupon, DiscountValue, PaymentMethod, PaymentStatus, Percent, RejectionReason,
        Unrestricted, UserRole,
    };

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn pizza() -> Food {
        Food::new(1, "Pizza", "1 large", Money::from_cents(1000)).unwrap()
    }

    fn soda() -> Food {
        Food::new(2, "Soda", "330 ml", Money::from_cents(200)).unwrap()
    }

    fn offer_2024() -> Offer {
        Offer::new(
            1,
            "2024 special",
            DiscountValue::percentage(Percent::from_bps(1000)),
            ymd(2024, 1, 1),
            ymd(2024, 12, 31),
        )
    }

    fn book_at(at: DateTime<Utc>) -> (OrderBook, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(at));
        let book = OrderBook::new(
            Arc::new(SequentialIds::default()),
            clock.clone(),
            Box::new(Unrestricted),
        );
        (book, clock)
    }

    async fn book_with_order() -> (OrderBook, Arc<FixedClock>) {
        let (book, clock) = book_at(ymd(2024, 6, 1));
        book.place_order(Order::new(7, 100, 200, "", ymd(2024, 6, 1)))
            .await
            .unwrap();
        (book, clock)
    }

    #[tokio::test]
    async fn test_place_and_get() {
        let (book, _) = book_with_order().await;
        assert_eq!(book.len().await, 1);
        assert_eq!(book.get(7).await.unwrap().status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_orders() {
        let (book, _) = book_with_order().await;

        let err = book
            .place_order(Order::new(7, 1, 1, "", ymd(2024, 6, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrdersError::DuplicateOrder(7)));

        assert!(matches!(book.get(8).await, Err(OrdersError::OrderNotFound(8))));
        assert!(matches!(
            book.add_item(8, &pizza(), "1").await,
            Err(OrdersError::OrderNotFound(8))
        ));
    }

    #[tokio::test]
    async fn test_items_through_book() {
        let (book, _) = book_with_order().await;
        let line = book.add_item(7, &pizza(), "1").await.unwrap();
        book.add_item(7, &soda(), "1").await.unwrap();
        assert_eq!(book.total_price(7).await.unwrap(), Money::from_cents(1200));

        assert!(book.change_item_quantity(7, line, "2 large").await.unwrap());
        assert_eq!(book.remove_item(7, pizza().id()).await.unwrap(), 1);
        assert_eq!(book.remove_item(7, 999).await.unwrap(), 0);
        assert_eq!(book.total_price(7).await.unwrap(), Money::from_cents(200));
    }

    #[tokio::test]
    async fn test_offer_uses_clock() {
        let (book, clock) = book_with_order().await;

        clock.set(ymd(2025, 1, 1));
        assert_eq!(
            book.apply_offer(7, &offer_2024()).await.unwrap(),
            DiscountOutcome::Rejected(RejectionReason::OfferExpired)
        );

        clock.set(ymd(2024, 12, 31));
        assert!(book.apply_offer(7, &offer_2024()).await.unwrap().is_attached());
        assert!(book.get(7).await.unwrap().offer().is_some());
    }

    #[tokio::test]
    async fn test_apply_coupon_does_not_consume() {
        let (book, _) = book_with_order().await;
        let coupon = Coupon::new(1, "Once", "ONCE", offer_2024())
            .unwrap()
            .with_usage_limit(1);
        book.coupons().register(coupon).await.unwrap();

        assert!(book.apply_coupon(7, "ONCE").await.unwrap().is_attached());
        assert_eq!(book.coupons().snapshot("ONCE").await.unwrap().used_count(), 0);

        assert!(matches!(
            book.apply_coupon(7, "MISSING").await,
            Err(OrdersError::CouponNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_redeem_coupon_consumes_once() {
        let (book, _) = book_with_order().await;
        book.place_order(Order::new(8, 101, 200, "", ymd(2024, 6, 1)))
            .await
            .unwrap();
        let coupon = Coupon::new(1, "Once", "ONCE", offer_2024())
            .unwrap()
            .with_usage_limit(1);
        book.coupons().register(coupon).await.unwrap();

        assert!(book.redeem_coupon(7, "ONCE").await.unwrap().is_attached());
        let registry = book.coupons().snapshot("ONCE").await.unwrap();
        let on_order = book.get(7).await.unwrap().coupon().cloned().unwrap();
        assert_eq!(on_order.used_count(), registry.used_count());
        assert!(!on_order.is_usable());

        assert_eq!(
            book.redeem_coupon(8, "ONCE").await.unwrap(),
            DiscountOutcome::Rejected(RejectionReason::CouponExhausted)
        );
        assert!(book.get(8).await.unwrap().coupon().is_none());
        assert_eq!(book.coupons().snapshot("ONCE").await.unwrap().used_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redemption_of_single_use_coupon() {
        let (book, _) = book_at(ymd(2024, 6, 1));
        let book = Arc::new(book);
        for order_id in 1..=20 {
            book.place_order(Order::new(order_id, order_id, 200, "", ymd(2024, 6, 1)))
                .await
                .unwrap();
        }
        let coupon = Coupon::new(1, "Once", "ONCE", offer_2024())
            .unwrap()
            .with_usage_limit(1);
        book.coupons().register(coupon).await.unwrap();

        let mut handles = Vec::new();
        for order_id in 1..=20 {
            let book = Arc::clone(&book);
            handles.push(tokio::spawn(async move {
                book.redeem_coupon(order_id, "ONCE").await.unwrap()
            }));
        }

        let mut attached = 0;
        for handle in handles {
            if handle.await.unwrap().is_attached() {
                attached += 1;
            }
        }

        assert_eq!(attached, 1);
        assert_eq!(book.coupons().snapshot("ONCE").await.unwrap().used_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_to_one_order_are_serialized() {
        let (book, _) = book_with_order().await;
        let book = Arc::new(book);

        let mut handles = Vec::new();
        for _ in 0..25 {
            let book = Arc::clone(&book);
            handles.push(tokio::spawn(async move {
                book.add_item(7, &soda(), "1").await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let order = book.get(7).await.unwrap();
        assert_eq!(order.items().len(), 25);
        assert_eq!(order.total_price(), Money::from_cents(5000));
    }

    #[tokio::test]
    async fn test_status_policy_from_config() {
        let mut config = OrdersConfig::default();
        config.orders.status_policy = StatusPolicyKind::TerminalLock;
        let book = OrderBook::from_config(&config, Arc::new(FixedClock::new(ymd(2024, 6, 1))));
        book.place_order(Order::new(1, 1, 1, "", ymd(2024, 6, 1)))
            .await
            .unwrap();

        book.update_status(1, OrderStatus::Cancelled).await.unwrap();
        let err = book.update_status(1, OrderStatus::Accepted).await.unwrap_err();
        assert!(matches!(
            err,
            OrdersError::Core(CoreError::InvalidTransition { entity: "order", .. })
        ));
        assert_eq!(book.get(1).await.unwrap().status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unrestricted_status_changes() {
        let (book, _) = book_with_order().await;
        book.update_status(7, OrderStatus::Delivered).await.unwrap();
        let change = book.update_status(7, OrderStatus::Pending).await.unwrap();
        assert_eq!(change.from, OrderStatus::Delivered);
        assert_eq!(change.to, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_lifecycle_through_book() {
        let (book, clock) = book_with_order().await;
        assert!(matches!(book.fail_payment(7).await, Err(OrdersError::NoPayment(7))));

        let payment = Payment::new(1, PaymentMethod::Card, Money::from_cents(1200), ymd(2024, 6, 1));
        assert!(book.complete_payment(7, payment).await.unwrap().is_none());

        let err = book.refund_payment(7).await.unwrap_err();
        assert!(matches!(err, OrdersError::Core(CoreError::InvalidTransition { .. })));

        clock.set(ymd(2024, 6, 2));
        let captured = book.capture_payment(7, "txn_42").await.unwrap();
        assert_eq!(captured.status(), PaymentStatus::Completed);
        assert_eq!(captured.completed_at(), Some(ymd(2024, 6, 2)));
        assert_eq!(captured.transaction_id(), Some("txn_42"));

        let refunded = book.refund_payment(7).await.unwrap();
        assert_eq!(refunded.status(), PaymentStatus::Refunded);
        assert_eq!(
            book.get(7).await.unwrap().payment().map(Payment::status),
            Some(PaymentStatus::Refunded)
        );
    }

    #[tokio::test]
    async fn test_place_user_order_stamps_clock() {
        let (book, _) = book_at(ymd(2024, 6, 1));
        let restaurant = Restaurant::new(200, "Luigi's", Vec::new()).unwrap();
        let user =
            User::register(100, "Ada", "ada@example.com", Vec::new(), UserRole::customer()).unwrap();

        let order = book
            .place_user_order(&user, 9, &restaurant, &[pizza(), soda()], "Leave at door")
            .await
            .unwrap();

        assert_eq!(order.created_at(), ymd(2024, 6, 1));
        assert_eq!(book.get(9).await.unwrap().total_price(), Money::from_cents(1200));
    }
}
