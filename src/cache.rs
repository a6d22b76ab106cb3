//! In-memory event cache with an injected clock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::info;

use crate::models::{DateEvents, Event, Retrieved};

/// Freshness window for the full aggregation.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
/// Interval of the unconditional flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(delta) = chrono::Duration::from_std(by) {
            *now += delta;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default)]
struct CacheState {
    all_events: Option<Retrieved<Vec<Event>>>,
    last_updated: Option<DateTime<Utc>>,
    date_events: HashMap<String, DateEvents>,
}

pub struct EventCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: Mutex<CacheState>,
    refill: AsyncMutex<()>,
}

impl EventCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            state: Mutex::new(CacheState::default()),
            refill: AsyncMutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached aggregation and the source failures hit while building it,
    /// if it was populated less than `ttl` ago.
    pub fn fresh_events(&self) -> Option<Retrieved<Vec<Event>>> {
        let now = self.clock.now();
        let state = self.state();
        let updated = state.last_updated?;
        let fresh = (now - updated)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(false);
        if fresh {
            state.all_events.clone()
        } else {
            None
        }
    }

    pub fn store_events(&self, events: Retrieved<Vec<Event>>) {
        let now = self.clock.now();
        let mut state = self.state();
        state.all_events = Some(events);
        state.last_updated = Some(now);
    }

    pub fn date_events(&self, date: &str) -> Option<DateEvents> {
        self.state().date_events.get(date).cloned()
    }

    pub fn store_date_events(&self, date: &str, events: DateEvents) {
        self.state().date_events.insert(date.to_string(), events);
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state().last_updated
    }

    /// Drops the aggregation and every per-date entry.
    pub fn flush(&self) {
        *self.state() = CacheState::default();
        info!("cache cleared");
    }

    /// Serializes refills of the aggregation slot. Holders must re-check
    /// `fresh_events` after acquiring it.
    pub async fn refill_guard(&self) -> AsyncMutexGuard<'_, ()> {
        self.refill.lock().await
    }
}
