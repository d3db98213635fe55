//! # Order Service Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Service Error Categories                       │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐  │
//! │  │  Configuration  │  │     Lookup      │  │     Domain              │  │
//! │  │                 │  │                 │  │                         │  │
//! │  │  InvalidConfig  │  │  OrderNotFound  │  │  Core(CoreError)        │  │
//! │  │  ConfigLoad...  │  │  CouponNotFound │  │  Validation             │  │
//! │  │                 │  │  Duplicate...   │  │                         │  │
//! │  │                 │  │  NoPayment      │  │                         │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejected discounts are not errors here either; they come back as
//! `DiscountOutcome` values.

use feast_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for order service operations.
pub type OrdersResult<T> = Result<T, OrdersError>;

#[derive(Debug, Error)]
pub enum OrdersError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    #[error("Order {0} already exists")]
    DuplicateOrder(u64),

    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error("Coupon code {0} is already registered")]
    DuplicateCoupon(String),

    #[error("Order {0} has no payment attached")]
    NoPayment(u64),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationError> for OrdersError {
    fn from(err: ValidationError) -> Self {
        OrdersError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for OrdersError {
    fn from(err: std::io::Error) -> Self {
        OrdersError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for OrdersError {
    fn from(err: toml::de::Error) -> Self {
        OrdersError::ConfigLoadFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_passes_through_transparently() {
        let err: OrdersError = CoreError::invalid_transition("payment", "pending", "refunded").into();
        assert_eq!(err.to_string(), "Invalid payment transition: pending -> refunded");
    }

    #[test]
    fn test_validation_error_wraps_into_core() {
        let err: OrdersError = ValidationError::Required {
            field: "code".to_string(),
        }
        .into();
        assert!(matches!(err, OrdersError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_toml_error_is_config_load_failure() {
        let err: OrdersError = toml::from_str::<toml::Table>("not = [valid").unwrap_err().into();
        assert!(matches!(err, OrdersError::ConfigLoadFailed(_)));
    }
}
