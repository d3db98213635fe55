//! # Order Aggregate
//!
//! The unit of consistency: one order, the lines it exclusively owns, and the
//! discount and payment attached to it.
//!
//! ## Aggregate Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order                                                                  │
//! │  ├── status        Pending | Accepted | Preparing | OnTheWay |          │
//! │  │                 Delivered | Cancelled     (update_status)            │
//! │  ├── items         Vec<OrderItem>            (add_item / remove_item)   │
//! │  │                 price captured at add time                           │
//! │  ├── offer         Option<Offer>             (apply_offer, checked once)│
//! │  ├── coupon        Option<Coupon>   (apply_coupon / redeem_coupon)      │
//! │  └── payment       Option<Payment>           (complete_payment)         │
//! │                                                                         │
//! │  Status, items, discount and payment are independent axes: changing     │
//! │  one never touches another.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Transitions
//! Any status may follow any other. All changes go through
//! [`Order::update_status_with`], so a [`TransitionPolicy`] can restrict the
//! graph without changing the call sites; [`Order::update_status`] uses
//! [`Unrestricted`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::discount::{Coupon, CouponUse, DiscountOutcome, Offer, RejectionReason};
use crate::error::{CoreError, CoreResult};
use crate::ids::IdGenerator;
use crate::money::Money;
use crate::payment::Payment;
use crate::records::Food;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Preparing,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::OnTheWay,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Delivered and Cancelled end the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Accepted => write!(f, "Accepted"),
            OrderStatus::Preparing => write!(f, "Preparing"),
            OrderStatus::OnTheWay => write!(f, "On the Way"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A status change that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

// =============================================================================
// Transition Policies
// =============================================================================

/// Decides whether an order may move from one status to another.
pub trait TransitionPolicy: Send + Sync {
    fn check(&self, from: OrderStatus, to: OrderStatus) -> CoreResult<()>;
}

/// Accepts every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl TransitionPolicy for Unrestricted {
    fn check(&self, _from: OrderStatus, _to: OrderStatus) -> CoreResult<()> {
        Ok(())
    }
}

/// Freezes orders once they are Delivered or Cancelled. Setting a terminal
/// order to its current status is still allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalLock;

impl TransitionPolicy for TerminalLock {
    fn check(&self, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
        if from.is_terminal() && from != to {
            return Err(CoreError::invalid_transition("order", from, to));
        }
        Ok(())
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// One line of an order.
///
/// Snapshot pattern: `food` and `price` are frozen copies taken when the line
/// was added. Repricing the menu later never reaches back into them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    id: u64,
    food: Food,
    price: Money,
    quantity: String,
}

impl OrderItem {
    fn capture(id: u64, food: &Food, quantity: String) -> Self {
        OrderItem {
            id,
            food: food.clone(),
            price: food.price(),
            quantity,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn food(&self) -> &Food {
        &self.food
    }

    pub fn food_id(&self) -> u64 {
        self.food.id()
    }

    /// Price captured when the line was added.
    pub fn price(&self) -> Money {
        self.price
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    fn change_quantity(&mut self, quantity: String) {
        self.quantity = quantity;
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    id: u64,
    user_id: u64,
    restaurant_id: u64,
    /// Insertion order is display order.
    items: Vec<OrderItem>,
    description: String,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
    status: OrderStatus,
    offer: Option<Offer>,
    coupon: Option<Coupon>,
    payment: Option<Payment>,
}

impl Order {
    /// Creates an empty Pending order.
    pub fn new(
        id: u64,
        user_id: u64,
        restaurant_id: u64,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Order {
            id,
            user_id,
            restaurant_id,
            items: Vec::new(),
            description: description.into(),
            created_at,
            status: OrderStatus::Pending,
            offer: None,
            coupon: None,
            payment: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn restaurant_id(&self) -> u64 {
        self.restaurant_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn offer(&self) -> Option<&Offer> {
        self.offer.as_ref()
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    pub fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    /// Mutable access to the attached payment, for driving its state machine.
    pub fn payment_mut(&mut self) -> Option<&mut Payment> {
        self.payment.as_mut()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    // =========================================================================
    // Item Ledger
    // =========================================================================

    /// Appends a line for `food`, capturing its current price. The same food
    /// added twice gives two lines. Returns the new line's id.
    pub fn add_item(&mut self, food: &Food, quantity: impl Into<String>, ids: &dyn IdGenerator) -> u64 {
        let item = OrderItem::capture(ids.next_id(), food, quantity.into());
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Removes every line referencing `food_id` and returns how many went.
    /// Zero means nothing matched; that is not an error.
    pub fn remove_item(&mut self, food_id: u64) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.food_id() != food_id);
        before - self.items.len()
    }

    /// Rewrites the quantity descriptor of one line. Returns false when no
    /// line has `item_id`.
    pub fn change_item_quantity(&mut self, item_id: u64, quantity: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.change_quantity(quantity.into());
                true
            }
            None => false,
        }
    }

    /// Sum of the captured line prices. Discounts are not applied here.
    pub fn total_price(&self) -> Money {
        self.items.iter().map(OrderItem::price).sum()
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Sets the status. Every transition is accepted.
    pub fn update_status(&mut self, new_status: OrderStatus) -> CoreResult<StatusChange> {
        self.update_status_with(new_status, &Unrestricted)
    }

    /// Sets the status if `policy` allows it; otherwise the order is left
    /// unchanged and the policy's error is returned.
    pub fn update_status_with(
        &mut self,
        new_status: OrderStatus,
        policy: &dyn TransitionPolicy,
    ) -> CoreResult<StatusChange> {
        let from = self.status;
        policy.check(from, new_status)?;
        self.status = new_status;
        Ok(StatusChange {
            from,
            to: new_status,
        })
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Attaches `offer` if it is valid at `now`. A rejected offer leaves any
    /// previously attached offer in place.
    pub fn apply_offer(&mut self, offer: &Offer, now: DateTime<Utc>) -> DiscountOutcome {
        let outcome = DiscountOutcome::from(offer.check_at(now));
        if outcome.is_attached() {
            self.offer = Some(offer.clone());
        }
        outcome
    }

    /// Attaches a snapshot of `coupon` if it still has uses left. Does not
    /// consume a use; see [`Coupon::mark_used`].
    pub fn apply_coupon(&mut self, coupon: &Coupon) -> DiscountOutcome {
        let outcome = DiscountOutcome::from(coupon.check_usable());
        if outcome.is_attached() {
            self.coupon = Some(coupon.clone());
        }
        outcome
    }

    /// Consumes one use of `coupon` and attaches the updated copy, so the
    /// order carries the post-redemption count. An exhausted coupon is
    /// neither counted nor attached.
    pub fn redeem_coupon(&mut self, coupon: &mut Coupon) -> DiscountOutcome {
        match coupon.mark_used() {
            CouponUse::Used { .. } => {
                self.coupon = Some(coupon.clone());
                DiscountOutcome::Attached
            }
            CouponUse::Exhausted => DiscountOutcome::Rejected(RejectionReason::CouponExhausted),
        }
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Attaches `payment` as-is, returning any payment it replaces. The
    /// payment's own state is not touched.
    pub fn complete_payment(&mut self, payment: Payment) -> Option<Payment> {
        self.payment.replace(payment)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
