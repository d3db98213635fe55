//! # Payment State Machine
//!
//! Tracks one payment from creation to its final state, independently of the
//! order it is attached to.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              complete(txn)               refund()                       │
//! │   ┌─────────┐ ───────────► ┌───────────┐ ─────────► ┌──────────┐        │
//! │   │ Pending │              │ Completed │            │ Refunded │        │
//! │   └─────────┘ ───────────► └───────────┘            └──────────┘        │
//! │                  fail()    ┌───────────┐                                │
//! │                 ─────────► │  Failed   │                                │
//! │                            └───────────┘                                │
//! │                                                                         │
//! │  Failed and Refunded are terminal. Every other call returns             │
//! │  CoreError::InvalidTransition and leaves the payment unchanged.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_transaction_id, ValidationResult};

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Wallet,
    /// Anything the platform has not enumerated yet ("voucher", ...).
    Other(String),
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::Wallet => write!(f, "wallet"),
            PaymentMethod::Other(name) => write!(f, "{}", name),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// No transitions leave a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards an order.
///
/// `completed_at` and `transaction_id` are only ever populated by
/// [`Payment::complete`]. They are present exactly when the status is
/// Completed or Refunded; deserialization enforces the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Payment {
    id: u64,
    method: PaymentMethod,
    amount: Money,
    status: PaymentStatus,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    completed_at: Option<DateTime<Utc>>,
    transaction_id: Option<String>,
}

impl Payment {
    /// Creates a Pending payment.
    pub fn new(id: u64, method: PaymentMethod, amount: Money, created_at: DateTime<Utc>) -> Self {
        Payment {
            id,
            method,
            amount,
            status: PaymentStatus::Pending,
            created_at,
            completed_at: None,
            transaction_id: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> &PaymentMethod {
        &self.method
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Pending → Completed. Stamps `at` and stores the processor reference.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless the payment is Pending
    /// - `Validation` if `transaction_id` is blank
    pub fn complete(&mut self, transaction_id: impl Into<String>, at: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_from(PaymentStatus::Pending, PaymentStatus::Completed)?;
        let transaction_id = transaction_id.into();
        validate_transaction_id(&transaction_id)?;

        self.status = PaymentStatus::Completed;
        self.completed_at = Some(at);
        self.transaction_id = Some(transaction_id.trim().to_string());
        Ok(())
    }

    /// Pending → Failed.
    pub fn fail(&mut self) -> CoreResult<()> {
        self.ensure_from(PaymentStatus::Pending, PaymentStatus::Failed)?;
        self.status = PaymentStatus::Failed;
        Ok(())
    }

    /// Completed → Refunded. The completion stamp and transaction id are kept.
    pub fn refund(&mut self) -> CoreResult<()> {
        self.ensure_from(PaymentStatus::Completed, PaymentStatus::Refunded)?;
        self.status = PaymentStatus::Refunded;
        Ok(())
    }

    fn ensure_from(&self, required: PaymentStatus, target: PaymentStatus) -> CoreResult<()> {
        if self.status == required {
            Ok(())
        } else {
            Err(CoreError::invalid_transition("payment", self.status, target))
        }
    }
}

#[derive(Deserialize)]
struct PaymentRecord {
    id: u64,
    method: PaymentMethod,
    amount: Money,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    transaction_id: Option<String>,
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = ValidationError;

    fn try_from(record: PaymentRecord) -> ValidationResult<Self> {
        let settled = matches!(
            record.status,
            PaymentStatus::Completed | PaymentStatus::Refunded
        );

        match (&record.transaction_id, record.completed_at) {
            (Some(txn), Some(_)) if settled => validate_transaction_id(txn)?,
            (None, None) if !settled => {}
            (None, _) if settled => {
                return Err(ValidationError::Required {
                    field: "transaction_id".to_string(),
                })
            }
            (_, None) if settled => {
                return Err(ValidationError::Required {
                    field: "completed_at".to_string(),
                })
            }
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "transaction_id".to_string(),
                    reason: format!("not expected on a {} payment", record.status),
                })
            }
        }

        Ok(Payment {
            id: record.id,
            method: record.method,
            amount: record.amount,
            status: record.status,
            created_at: record.created_at,
            completed_at: record.completed_at,
            transaction_id: record.transaction_id,
        })
    }
}

impl<'de> Deserialize<'de> for Payment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = PaymentRecord::deserialize(deserializer)?;
        Payment::try_from(record).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
