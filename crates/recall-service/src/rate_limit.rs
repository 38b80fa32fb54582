//! Per-client rate governors protecting billed generation calls.
//!
//! Two strategies implement [`RateGovernor`]:
//!
//! - [`FixedWindowGovernor`]: a counter per client that resets once its
//!   window has elapsed. A client can burst up to twice the limit across a
//!   window boundary.
//! - [`GcraGovernor`]: the `governor` crate's keyed GCRA limiter, with the
//!   same burst allowance but continuous replenishment.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tokio::time::Instant;
use tracing::{debug, warn};

use recall_core::defaults::{RATE_LIMIT_PERIOD_SECS, RATE_LIMIT_REQUESTS};
use recall_core::{Error, RateGovernor, Result, Unlimited};

use crate::config::{RateLimitConfig, RateLimitStrategy};

/// One client's counter for its current window.
#[derive(Debug, Clone, Copy)]
pub struct RateRecord {
    pub count: u32,
    pub window_start: Instant,
}

/// Fixed-window counter per client key.
///
/// The map lock is held only to find or insert a record; the
/// read-check-increment runs under that record's own mutex, so distinct
/// clients never wait on each other's bookkeeping.
pub struct FixedWindowGovernor {
    limit: u32,
    window: Duration,
    records: RwLock<HashMap<String, Arc<Mutex<RateRecord>>>>,
}

impl Default for FixedWindowGovernor {
    fn default() -> Self {
        Self::new(
            RATE_LIMIT_REQUESTS,
            Duration::from_secs(RATE_LIMIT_PERIOD_SECS),
        )
    }
}

impl FixedWindowGovernor {
    /// `limit` requests per `window`; a zero limit is raised to one.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of client keys currently holding a record.
    pub fn tracked_clients(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Current record for `client_key`, if any.
    pub fn record(&self, client_key: &str) -> Option<RateRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .get(client_key)
            .map(|r| *r.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn record_for(&self, client_key: &str) -> Arc<Mutex<RateRecord>> {
        if let Some(record) = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(client_key)
        {
            return Arc::clone(record);
        }

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(records.entry(client_key.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(RateRecord {
                count: 0,
                window_start: Instant::now(),
            }))
        }))
    }
}

impl RateGovernor for FixedWindowGovernor {
    fn allow(&self, client_key: &str) -> bool {
        let record = self.record_for(client_key);
        let mut record = record.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if now.duration_since(record.window_start) > self.window {
            *record = RateRecord {
                count: 1,
                window_start: now,
            };
            return true;
        }

        if record.count < self.limit {
            record.count += 1;
            return true;
        }

        warn!(
            subsystem = "governor",
            component = "fixed_window",
            client_key,
            limit = self.limit,
            window_secs = self.window.as_secs(),
            "Rate limit exceeded"
        );
        false
    }

    /// Drop records whose window has already elapsed.
    ///
    /// A dropped client starts a fresh window on its next request, which is
    /// exactly what an expired record would have done, so admission is
    /// unchanged. Returns the number of records removed.
    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|_, record| {
            let record = record.lock().unwrap_or_else(|e| e.into_inner());
            now.duration_since(record.window_start) <= self.window
        });
        let removed = before - records.len();
        if removed > 0 {
            debug!(
                subsystem = "governor",
                component = "fixed_window",
                removed,
                remaining = records.len(),
                "Purged expired rate records"
            );
        }
        removed
    }
}

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// GCRA limiter per client key: `limit` burst, one unit replenished every
/// `window / limit`.
pub struct GcraGovernor {
    limiter: KeyedLimiter,
    limit: u32,
}

impl GcraGovernor {
    pub fn new(limit: u32, window: Duration) -> Result<Self> {
        let burst = NonZeroU32::new(limit)
            .ok_or_else(|| Error::Config("rate limit must be non-zero".to_string()))?;
        let quota = Quota::with_period(window / limit)
            .ok_or_else(|| Error::Config("rate limit period must be non-zero".to_string()))?
            .allow_burst(burst);
        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            limit,
        })
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl RateGovernor for GcraGovernor {
    fn allow(&self, client_key: &str) -> bool {
        match self.limiter.check_key(&client_key.to_string()) {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    subsystem = "governor",
                    component = "gcra",
                    client_key,
                    limit = self.limit,
                    "Rate limit exceeded"
                );
                false
            }
        }
    }
    /// Forget clients whose allowance is fully replenished.
    fn purge_expired(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }
}

/// Build the governor selected by configuration.
pub fn build_governor(config: &RateLimitConfig) -> Result<Arc<dyn RateGovernor>> {
    if !config.enabled {
        debug!(subsystem = "governor", "Rate limiting disabled");
        return Ok(Arc::new(Unlimited));
    }
    let window = Duration::from_secs(config.period_secs);
    let governor: Arc<dyn RateGovernor> = match config.strategy {
        RateLimitStrategy::FixedWindow => {
            Arc::new(FixedWindowGovernor::new(config.requests, window))
        }
        RateLimitStrategy::Gcra => Arc::new(GcraGovernor::new(config.requests, window)?),
    };
    Ok(governor)
}
