#![doc = include_str!("../README.md")]
//!
//! # Core Components
//!
//! - [`Bucket`] - One key's fill level, with pure drain and admit transitions
//! - [`Store`] - Persistent, TTL-bounded map of buckets; every evaluation returns a new snapshot
//! - [`Limiter`] - A store shared in place behind a single lock, driven by a [`Clock`]
//! - [`Limit`] and [`StoreConfig`] - Configuration
//!
//! # Quick Start
//!
//! ```rust
//! use dripline::Store;
//!
//! // holds 5 requests per key, drains 1 per second
//! let store = Store::new(5, 1.0).unwrap();
//!
//! let (decision, store) = store.evaluate("user-42", 0.0).unwrap();
//! assert!(decision.is_admitted());
//! assert_eq!(1.0, store.lookup("user-42").unwrap().level());
//! ```

mod bucket;
mod clock;
mod config;
mod error;
mod limit;
mod limiter;
mod store;

pub use bucket::{Admission, Bucket};
#[cfg(feature = "quanta")]
pub use clock::QuantaClock;
#[cfg(feature = "tokio")]
pub use clock::TokioClock;
pub use clock::{Clock, ManualClock, StdClock, SystemClock};
pub use config::StoreConfig;
pub use error::*;
pub use limit::Limit;
pub use limiter::Limiter;
pub use store::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL, Decision, Store};
