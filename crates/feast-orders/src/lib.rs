//! # feast-orders: Concurrent Order Service
//!
//! Puts feast-core's order aggregate behind shared access.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      feast-orders                                       │
//! │                                                                         │
//! │  ┌──────────────┐   ┌────────────────────────────┐   ┌──────────────┐   │
//! │  │ OrdersConfig │──►│         OrderBook          │◄──│    Clock     │   │
//! │  │ (feast.toml, │   │  one Mutex per order id    │   │ System/Fixed │   │
//! │  │  FEAST_* env)│   │  TransitionPolicy          │   └──────────────┘   │
//! │  └──────────────┘   │  IdGenerator               │                      │
//! │                     │  ┌──────────────────────┐  │                      │
//! │                     │  │   CouponRegistry     │  │                      │
//! │                     │  │ one Mutex per code   │  │                      │
//! │                     │  └──────────────────────┘  │                      │
//! │                     └─────────────┬──────────────┘                      │
//! │                                   ▼                                     │
//! │                              feast-core                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`book`] - `OrderBook`, per-order serialized mutation
//! - [`coupons`] - `CouponRegistry`, guarded usage counters
//! - [`clock`] - Injected time source
//! - [`config`] - Configuration loading
//! - [`error`] - Service error types

pub mod book;
pub mod clock;
pub mod config;
pub mod coupons;
pub mod error;

pub use book::OrderBook;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LoggingSettings, OrderSettings, OrdersConfig, ServiceSettings, StatusPolicyKind};
pub use coupons::CouponRegistry;
pub use error::{OrdersError, OrdersResult};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback_filter` (usually
/// `config.logging.filter`) is used.
pub fn init_tracing(fallback_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
