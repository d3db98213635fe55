//! # feast-core: Order Lifecycle & Discount/Payment Rules
//!
//! Pure business logic for the Feast food-ordering platform. No I/O, no
//! clocks, no locks: "now" and fresh ids are handed in by the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Feast Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │            feast-orders (OrderBook, CouponRegistry)             │    │
//! │  │   one lock per order id • clock • id generator • config • logs  │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ feast-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐        │    │
//! │  │   │  order   │  │ discount │  │ payment  │  │ records  │        │    │
//! │  │   │  Order   │  │  Offer   │  │ Payment  │  │ User     │        │    │
//! │  │   │OrderItem │  │  Coupon  │  │ (state   │  │ Food     │        │    │
//! │  │   │ policies │  │ outcomes │  │ machine) │  │Restaurant│        │    │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────┘        │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`order`] - Order aggregate, item ledger, status transitions
//! - [`discount`] - Offer windows, coupon usage caps, attachment outcomes
//! - [`payment`] - Payment state machine
//! - [`records`] - User, Address, Restaurant, Food, Delivery, Rating
//! - [`money`] - Integer-cents `Money` and basis-point `Percent`
//! - [`ids`] - Injected identity generation for order lines
//! - [`validation`] - Record field validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use feast_core::{Food, Money, Order, SequentialIds};
//!
//! let ids = SequentialIds::default();
//! let pizza = Food::new(1, "Pizza", "1 large", Money::from_cents(1000)).unwrap();
//! let soda = Food::new(2, "Soda", "330 ml", Money::from_cents(200)).unwrap();
//!
//! let mut order = Order::new(10, 100, 200, "", Utc::now());
//! order.add_item(&pizza, "1", &ids);
//! order.add_item(&soda, "1", &ids);
//! assert_eq!(order.total_price().to_string(), "$12.00");
//!
//! order.remove_item(pizza.id());
//! assert_eq!(order.total_price().to_string(), "$2.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod ids;
pub mod money;
pub mod order;
pub mod payment;
pub mod records;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{Coupon, CouponUse, DiscountOutcome, DiscountValue, Offer, RejectionReason};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ids::{IdGenerator, SequentialIds};
pub use money::{Money, Percent};
pub use order::{
    Order, OrderItem, OrderStatus, StatusChange, TerminalLock, TransitionPolicy, Unrestricted,
};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use records::{Address, Delivery, Food, Rating, Restaurant, User, UserRole};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted display name (users, restaurants, dishes, coupons).
pub const MAX_NAME_LEN: usize = 200;

/// Lowest star rating a review can carry.
pub const MIN_RATING: u8 = 1;

/// Highest star rating a review can carry.
pub const MAX_RATING: u8 = 5;
