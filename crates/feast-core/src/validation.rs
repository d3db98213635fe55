//! # Validation Module
//!
//! Field validation for the records around an order (users, addresses, food,
//! ratings) and for the few free-text inputs the rules engine accepts
//! (coupon codes, transaction ids).
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Record setter (User::update_email, Food::update_price, ...)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_*() ← THIS MODULE                                             │
//! │       │                                                                 │
//! │       ├── Err(ValidationError) → field untouched                        │
//! │       └── Ok(())               → field assigned                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Offer dates are deliberately NOT validated: an inverted window is
//! accepted and simply never valid.
//!
//! ## Usage
//! ```rust
//! use feast_core::validation::{validate_coupon_code, validate_email};
//!
//! validate_email("ana@example.com").unwrap();
//! validate_coupon_code("WELCOME-10").unwrap();
//! assert!(validate_coupon_code("has space").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_NAME_LEN, MAX_RATING, MIN_RATING};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (user, restaurant, food, coupon, offer).
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part and domain, no whitespace
///
/// ```rust
/// use feast_core::validation::validate_email;
///
/// assert!(validate_email("ana@example.com").is_ok());
/// assert!(validate_email("ana.example.com").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(invalid("must look like name@domain")),
    }
}

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Letters, numbers, hyphens and underscores only
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a payment processor transaction id.
///
/// A completed payment must carry a non-blank reference.
pub fn validate_transaction_id(transaction_id: &str) -> ValidationResult<()> {
    let transaction_id = transaction_id.trim();

    if transaction_id.is_empty() {
        return Err(ValidationError::Required {
            field: "transaction_id".to_string(),
        });
    }

    if transaction_id.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "transaction_id".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a postal code: non-blank, at most 12 characters of letters,
/// digits, spaces and hyphens.
pub fn validate_zip_code(zip: &str) -> ValidationResult<()> {
    let zip = zip.trim();

    if zip.is_empty() {
        return Err(ValidationError::Required {
            field: "zip_code".to_string(),
        });
    }

    if zip.len() > 12 {
        return Err(ValidationError::TooLong {
            field: "zip_code".to_string(),
            max: 12,
        });
    }

    if !zip
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "zip_code".to_string(),
            reason: "must contain only letters, digits, spaces, and hyphens".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a menu price. Zero is allowed (free items), negative is not.
///
/// ```rust
/// use feast_core::money::Money;
/// use feast_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a star rating: [`MIN_RATING`]..=[`MAX_RATING`].
pub fn validate_rating(stars: u8) -> ValidationResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&stars) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING as i64,
            max: MAX_RATING as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Luigi's Pizzeria").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b").is_ok());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("ana @example.com").is_err());
    }

    #[test]
    fn test_validate_coupon_code() {
        assert!(validate_coupon_code("FEAST50").is_ok());
        assert!(validate_coupon_code("new_user-1").is_ok());
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("50%OFF").is_err());
        assert!(validate_coupon_code(&"X".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_transaction_id() {
        assert!(validate_transaction_id("txn_123").is_ok());
        assert!(validate_transaction_id("").is_err());
        assert!(validate_transaction_id("  ").is_err());
    }

    #[test]
    fn test_validate_zip_code() {
        assert!(validate_zip_code("560001").is_ok());
        assert!(validate_zip_code("SW1A 1AA").is_ok());
        assert!(validate_zip_code("").is_err());
        assert!(validate_zip_code("12#45").is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
