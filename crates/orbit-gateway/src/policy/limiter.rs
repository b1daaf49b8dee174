//! Fixed-window request counters.
//!
//! Counter state lives behind [`CounterStore`] and time behind [`Clock`], so
//! tests can drive windows deterministically with [`ManualClock`].

use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use orbit_core::model::UserId;

use super::rate::{EndpointGroup, Rate};

/// Monotonic time source for window boundaries.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Snapshot of a window right after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u32,
    pub expires_at: Instant,
}

/// Backing store for rate-limit windows.
pub trait CounterStore: Send + Sync {
    /// Atomically bump the counter for `key`.
    ///
    /// When no window exists, or the current one has expired at `now`, a new
    /// window of length `window` starts at `now` with count 1.
    fn increment(&self, key: &str, window: Duration, now: Instant) -> WindowState;

    /// Drop windows that expired at or before `now`. Returns how many went.
    fn purge_expired(&self, now: Instant) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    expires_at: Instant,
    count: u32,
}

impl Window {
    fn open(now: Instant, len: Duration) -> Self {
        Self {
            expires_at: now + len,
            count: 0,
        }
    }
}

/// Process-local counter store. The map entry lock makes increment-and-read
/// atomic per key; distinct keys never contend beyond their shard.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, key: &str, window: Duration, now: Instant) -> WindowState {
        let mut w = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window::open(now, window));

        if now >= w.expires_at {
            *w = Window::open(now, window);
        }
        w.count = w.count.saturating_add(1);

        WindowState {
            count: w.count,
            expires_at: w.expires_at,
        }
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| w.expires_at > now);
        before.saturating_sub(self.windows.len())
    }
}

/// Who a request is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    User(UserId),
    Ip(IpAddr),
    Unknown,
}

impl Identity {
    /// Prefer the authenticated user, fall back to the source address.
    pub fn resolve(user: Option<UserId>, ip: Option<IpAddr>) -> Self {
        match (user, ip) {
            (Some(id), _) => Identity::User(id),
            (None, Some(ip)) => Identity::Ip(ip),
            (None, None) => Identity::Unknown,
        }
    }
}

/// Counter key: endpoint group plus identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey(String);

impl RateKey {
    pub fn new(group: EndpointGroup, identity: Identity) -> Self {
        let key = match identity {
            Identity::User(id) => format!("{group}:user:{id}"),
            Identity::Ip(ip) => format!("{group}:ip:{ip}"),
            Identity::Unknown => format!("{group}:ip:unknown"),
        };
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u32, remaining: u32 },
    /// The request was counted even though it is rejected.
    Rejected { count: u32, retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// In-memory store and wall clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCounterStore::new()), Arc::new(SystemClock))
    }

    /// Count this request against `key` and decide whether it may proceed.
    pub fn check_and_increment(&self, key: &RateKey, rate: Rate) -> RateDecision {
        let now = self.clock.now();
        let state = self.store.increment(key.as_str(), rate.window, now);

        if state.count > rate.limit {
            RateDecision::Rejected {
                count: state.count,
                retry_after: state.expires_at.saturating_duration_since(now),
            }
        } else {
            RateDecision::Allowed {
                count: state.count,
                remaining: rate.limit - state.count,
            }
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired(self.clock.now())
    }
}
