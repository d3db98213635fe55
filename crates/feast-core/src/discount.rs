//! # Discount Evaluator
//!
//! Validity rules for offers and coupons.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OFFER   valid at t  ⇔  start_date <= t <= end_date   (both inclusive)  │
//! │                                                                         │
//! │          ──────[start ████████████████ end]──────► time                 │
//! │           not yet active      valid          expired                    │
//! │                                                                         │
//! │  COUPON  usable      ⇔  usage_limit is None  OR  used_count < limit     │
//! │          mark_used   :  used_count += 1 only while usable               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validity is a point-in-time question. An order asks it once, when the
//! discount is attached, and never re-checks it.
//!
//! Offer dates are not range-checked on construction; a window whose end
//! precedes its start is accepted and is never valid.
//!
//! ## Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use feast_core::discount::{Coupon, CouponUse, DiscountValue, Offer};
//! use feast_core::money::Percent;
//!
//! let offer = Offer::new(
//!     1,
//!     "Summer",
//!     DiscountValue::percentage(Percent::from_bps(1500)),
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
//! );
//! assert!(offer.is_valid_at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
//!
//! let mut coupon = Coupon::new(7, "Welcome", "WELCOME", offer)
//!     .unwrap()
//!     .with_usage_limit(1);
//! assert_eq!(coupon.mark_used(), CouponUse::Used { used_count: 1 });
//! assert_eq!(coupon.mark_used(), CouponUse::Exhausted);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Percent;
use crate::error::ValidationError;
use crate::validation::{validate_coupon_code, validate_name, ValidationResult};

// =============================================================================
// Discount Value
// =============================================================================

/// What an offer takes off: either a percentage or a free-text flat deal
/// ("Free garlic bread", "$5 off").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountValue {
    Percentage { percent: Percent },
    Flat { description: String },
}

impl DiscountValue {
    pub fn percentage(percent: Percent) -> Self {
        DiscountValue::Percentage { percent }
    }

    pub fn flat(description: impl Into<String>) -> Self {
        DiscountValue::Flat {
            description: description.into(),
        }
    }
}

impl fmt::Display for DiscountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountValue::Percentage { percent } => write!(f, "{} off", percent),
            DiscountValue::Flat { description } => write!(f, "{}", description),
        }
    }
}

// =============================================================================
// Offer
// =============================================================================

/// A time-bounded discount definition. Fixed once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Offer {
    id: u64,
    name: String,
    description: String,
    discount: DiscountValue,
    /// First instant the offer is valid (inclusive).
    #[ts(as = "String")]
    start_date: DateTime<Utc>,
    /// Last instant the offer is valid (inclusive).
    #[ts(as = "String")]
    end_date: DateTime<Utc>,
}

impl Offer {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        discount: DiscountValue,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Offer {
            id,
            name: name.into(),
            description: String::new(),
            discount,
            start_date,
            end_date,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn discount(&self) -> &DiscountValue {
        &self.discount
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// True iff `start_date <= at <= end_date`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.check_at(at).is_ok()
    }

    /// Like [`Offer::is_valid_at`] but says which side of the window `at`
    /// fell on.
    pub fn check_at(&self, at: DateTime<Utc>) -> Result<(), RejectionReason> {
        if at < self.start_date {
            Err(RejectionReason::OfferNotYetActive)
        } else if at > self.end_date {
            Err(RejectionReason::OfferExpired)
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A usage-limited redemption of one offer, identified by a code.
///
/// ## Invariants
/// - `used_count` starts at 0 and only moves through [`Coupon::mark_used`]
/// - With a limit set, `used_count` never passes it
/// - `used_count` never wraps; an unlimited coupon stops at `u32::MAX`
///
/// Deserialization re-checks these, so a stored coupon cannot come back
/// already over its limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Coupon {
    id: u64,
    name: String,
    code: String,
    offer: Offer,
    /// `None` means unlimited.
    usage_limit: Option<u32>,
    used_count: u32,
}

/// Result of [`Coupon::mark_used`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CouponUse {
    /// The counter moved; `used_count` is the new value.
    Used { used_count: u32 },
    /// The coupon was already at its limit; nothing changed.
    Exhausted,
}

impl Coupon {
    /// Creates an unlimited, unused coupon. The code is trimmed and must pass
    /// [`validate_coupon_code`].
    pub fn new(
        id: u64,
        name: impl Into<String>,
        code: impl Into<String>,
        offer: Offer,
    ) -> ValidationResult<Self> {
        let name = name.into();
        let code = code.into();
        validate_name("name", &name)?;
        validate_coupon_code(&code)?;

        Ok(Coupon {
            id,
            name,
            code: code.trim().to_string(),
            offer,
            usage_limit: None,
            used_count: 0,
        })
    }

    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub fn usage_limit(&self) -> Option<u32> {
        self.usage_limit
    }

    pub fn used_count(&self) -> u32 {
        self.used_count
    }

    /// True iff `used_count < usage_limit`, or no limit is set and the
    /// counter still has room.
    pub fn is_usable(&self) -> bool {
        match self.usage_limit {
            None => self.used_count < u32::MAX,
            Some(limit) => self.used_count < limit,
        }
    }

    /// Uses left before the limit, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.used_count))
    }

    /// Consumes one use. A coupon that is not usable is left untouched and
    /// reports [`CouponUse::Exhausted`]; this is a guard, not an error.
    pub fn mark_used(&mut self) -> CouponUse {
        if !self.is_usable() {
            return CouponUse::Exhausted;
        }
        let Some(next) = self.used_count.checked_add(1) else {
            return CouponUse::Exhausted;
        };
        self.used_count = next;
        CouponUse::Used { used_count: next }
    }

    pub(crate) fn check_usable(&self) -> Result<(), RejectionReason> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(RejectionReason::CouponExhausted)
        }
    }
}

/// Wire shape of [`Coupon`], checked before it becomes one.
#[derive(Deserialize)]
struct CouponRecord {
    id: u64,
    name: String,
    code: String,
    offer: Offer,
    usage_limit: Option<u32>,
    used_count: u32,
}

impl TryFrom<CouponRecord> for Coupon {
    type Error = ValidationError;

    fn try_from(record: CouponRecord) -> ValidationResult<Self> {
        let mut coupon = Coupon::new(record.id, record.name, record.code, record.offer)?;
        if let Some(limit) = record.usage_limit {
            if record.used_count > limit {
                return Err(ValidationError::OutOfRange {
                    field: "used_count".to_string(),
                    min: 0,
                    max: i64::from(limit),
                });
            }
        }
        coupon.usage_limit = record.usage_limit;
        coupon.used_count = record.used_count;
        Ok(coupon)
    }
}

impl<'de> Deserialize<'de> for Coupon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = CouponRecord::deserialize(deserializer)?;
        Coupon::try_from(record).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Attachment Outcome
// =============================================================================

/// Why a discount was not attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Evaluated before the offer's `start_date`.
    OfferNotYetActive,
    /// Evaluated after the offer's `end_date`.
    OfferExpired,
    /// The coupon has reached its usage limit.
    CouponExhausted,
}

impl RejectionReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::OfferNotYetActive => "offer_not_yet_active",
            RejectionReason::OfferExpired => "offer_expired",
            RejectionReason::CouponExhausted => "coupon_exhausted",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of trying to attach an offer or coupon to an order.
///
/// Rejection is an expected business answer, so it is a value rather than
/// an error. A rejected discount leaves the order exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum DiscountOutcome {
    Attached,
    Rejected(RejectionReason),
}

impl DiscountOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, DiscountOutcome::Attached)
    }
}

impl From<Result<(), RejectionReason>> for DiscountOutcome {
    fn from(check: Result<(), RejectionReason>) -> Self {
        match check {
            Ok(()) => DiscountOutcome::Attached,
            Err(reason) => DiscountOutcome::Rejected(reason),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
