//! Fixed-window rate limiting per (client identity, endpoint).
//!
//! The table is owned by a single [`RateLimiter`] instance built at startup and
//! shared by `Arc` across request handlers. Windows are created lazily and
//! removed only by [`RateLimiter::sweep`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::AdmissionConfig;

/// Identity used when no caller address can be derived.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Limits applied to every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub window: Duration,
    pub max_requests: u32,
    /// A window untouched for `window * idle_multiplier` is swept.
    pub idle_multiplier: u32,
}

impl RateLimits {
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            idle_multiplier: config.idle_multiplier,
        }
    }

    fn idle_after(&self) -> Duration {
        self.window.saturating_mul(self.idle_multiplier.max(1))
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::from_config(&AdmissionConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    identity: String,
    endpoint: String,
}

/// Counter state for one key.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    started: Instant,
    last_seen: Instant,
}

/// Rate limiter shared by all request handlers.
pub struct RateLimiter {
    windows: DashMap<WindowKey, RateWindow>,
    limits: ArcSwap<RateLimits>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            windows: DashMap::new(),
            limits: ArcSwap::from_pointee(limits),
        }
    }

    /// Count a request and report whether it is within the limit.
    pub fn check(&self, identity: &str, endpoint: &str) -> bool {
        self.check_at(identity, endpoint, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    ///
    /// Denied requests still increment the counter, so a client over the limit
    /// stays rejected until the window rolls over.
    pub fn check_at(&self, identity: &str, endpoint: &str, now: Instant) -> bool {
        let limits = self.limits.load();
        let identity = if identity.is_empty() { UNKNOWN_IDENTITY } else { identity };

        let key = WindowKey {
            identity: identity.to_string(),
            endpoint: endpoint.to_string(),
        };

        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self.windows.entry(key).or_insert(RateWindow {
            count: 0,
            started: now,
            last_seen: now,
        });
        let window = entry.value_mut();

        if now.saturating_duration_since(window.started) > limits.window {
            window.count = 0;
            window.started = now;
        }

        window.count = window.count.saturating_add(1);
        window.last_seen = now;

        window.count <= limits.max_requests
    }

    /// Remove windows idle for longer than `window * idle_multiplier`.
    /// Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let idle_after = self.limits.load().idle_after();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.last_seen) <= idle_after);
        before.saturating_sub(self.windows.len())
    }

    /// Apply new limits. Existing windows keep their counts.
    pub fn reconfigure(&self, limits: RateLimits) {
        let previous = self.limits.swap(Arc::new(limits));
        if *previous != limits {
            tracing::info!(
                window_secs = limits.window.as_secs(),
                max_requests = limits.max_requests,
                "Rate limits updated"
            );
        }
    }

    pub fn limits(&self) -> RateLimits {
        **self.limits.load()
    }

    /// Number of tracked (identity, endpoint) windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}
