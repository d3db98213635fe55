//! # Identity Generation
//!
//! Entities arrive with identities assigned by their owners. The one
//! exception is [`crate::order::OrderItem`], which the order creates itself;
//! those ids come from an [`IdGenerator`] the caller injects.
//!
//! ```rust
//! use feast_core::ids::{IdGenerator, SequentialIds};
//!
//! let ids = SequentialIds::starting_at(100);
//! assert_eq!(ids.next_id(), 100);
//! assert_eq!(ids.next_id(), 101);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh numeric identities.
///
/// Implementations must never hand out the same value twice, including
/// under concurrent calls.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> u64;
}

/// Monotonic in-process counter.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn starting_at(first: u64) -> Self {
        SequentialIds {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
