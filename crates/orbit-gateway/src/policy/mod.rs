//! Policy layer (rate limiting).
//!
//! Compiles the configured per-group rates into a lookup table and counts
//! requests against fixed windows keyed by user or source address.

pub mod engine;
pub mod limiter;
pub mod rate;

pub use engine::{PolicyDecision, RequestPolicy};
pub use limiter::{
    Clock, CounterStore, Identity, InMemoryCounterStore, ManualClock, RateDecision, RateKey,
    RateLimiter, SystemClock,
};
pub use rate::{EndpointGroup, Rate};
