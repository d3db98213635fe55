//! # Error Types
//!
//! Domain-specific error types for feast-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  feast-core errors (this file)                                          │
//! │  ├── CoreError        - State machine and business rule failures        │
//! │  └── ValidationError  - Record field validation failures                │
//! │                                                                         │
//! │  feast-orders errors (separate crate)                                   │
//! │  └── OrdersError      - Lookups, configuration, wraps CoreError         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → OrdersError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Business rejections that callers routinely hit are returned as outcome
//! values instead:
//! - Offer outside its window / coupon exhausted → [`crate::discount::DiscountOutcome`]
//! - Removing an item or address that is not there → no-op
//! - Marking an exhausted coupon used → [`crate::discount::CouponUse::Exhausted`]

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are programming or input mistakes the caller must see, as opposed
/// to routine rejections (see module docs).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A state machine was asked to move along an edge it does not have.
    ///
    /// ## When This Occurs
    /// - `refund()` on a payment that is still Pending
    /// - `complete()` on a payment that already Failed
    /// - An order status change vetoed by a transition policy
    ///
    /// The entity is left unchanged.
    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// A restaurant was asked to act on an order placed elsewhere.
    #[error("Order {order_id} does not belong to restaurant {restaurant_id}")]
    ForeignOrder { order_id: u64, restaurant_id: u64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an `InvalidTransition` from any two displayable states.
    pub fn invalid_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        CoreError::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for record fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::invalid_transition("payment", "pending", "refunded");
        assert_eq!(
            err.to_string(),
            "Invalid payment transition: pending -> refunded"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "rating must be between 1 and 5");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
