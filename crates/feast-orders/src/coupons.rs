//! # Coupon Registry
//!
//! One owned `Coupon` record per code, shared by every order that redeems it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CouponRegistry                                                         │
//! │                                                                         │
//! │  RwLock<HashMap<code, Arc<Mutex<Coupon>>>>                              │
//! │    │                         │                                          │
//! │    │ read: look up the entry │ lock: check usable + increment           │
//! │    │ write: register         │       as one step                        │
//! │                                                                         │
//! │  Lock order when an order is involved: order first, then coupon.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use feast_core::{Coupon, CouponUse};

use crate::error::{OrdersError, OrdersResult};

#[derive(Debug, Default)]
pub struct CouponRegistry {
    coupons: RwLock<HashMap<String, Arc<Mutex<Coupon>>>>,
}

impl CouponRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `coupon`. Codes are unique.
    pub async fn register(&self, coupon: Coupon) -> OrdersResult<()> {
        let mut coupons = self.coupons.write().await;
        let code = coupon.code().to_string();
        if coupons.contains_key(&code) {
            return Err(OrdersError::DuplicateCoupon(code));
        }

        info!(code = %code, limit = ?coupon.usage_limit(), "Coupon registered");
        coupons.insert(code, Arc::new(Mutex::new(coupon)));
        Ok(())
    }

    /// Current state of the coupon behind `code`.
    pub async fn snapshot(&self, code: &str) -> OrdersResult<Coupon> {
        let entry = self.entry(code).await?;
        let coupon = entry.lock().await;
        Ok(coupon.clone())
    }

    /// Consumes one use. An exhausted coupon is left as it was and reported
    /// as [`CouponUse::Exhausted`].
    pub async fn mark_used(&self, code: &str) -> OrdersResult<CouponUse> {
        let entry = self.entry(code).await?;
        let mut coupon = entry.lock().await;
        let result = coupon.mark_used();
        debug!(code = %code, ?result, "Coupon use recorded");
        Ok(result)
    }

    pub async fn len(&self) -> usize {
        self.coupons.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.coupons.read().await.is_empty()
    }

    /// The shared record for `code`. The map lock is released before the
    /// caller locks the coupon.
    pub(crate) async fn entry(&self, code: &str) -> OrdersResult<Arc<Mutex<Coupon>>> {
        let code = code.trim();
        self.coupons
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| OrdersError::CouponNotFound(code.to_string()))
    }
}
