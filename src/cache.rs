//! # Event cache
//! Single-slot store for the last accepted batch of events.
//!
//! The slot is replaced wholesale on every accepted fetch and never merged.
//! Readers get a cheap `Arc` snapshot; a racing writer simply replaces the
//! batch again (last write wins).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::ingest::types::Event;

/// Wall-clock source in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cached batch and the moment it was accepted.
#[derive(Debug, Clone)]
pub struct CachedBatch {
    pub events: Arc<Vec<Event>>,
    pub timestamp_ms: u64,
    /// Set by [`EventCache::mark_stale`]; the batch stays usable as fallback.
    pub stale: bool,
}

pub struct EventCache {
    slot: RwLock<Option<CachedBatch>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl EventCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Snapshot of the slot, expired or not.
    pub fn get(&self) -> Option<CachedBatch> {
        match self.slot.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Non-empty and younger than the TTL at `now_ms`.
    pub fn is_valid(&self, now_ms: u64) -> bool {
        self.get().is_some_and(|b| Self::batch_is_fresh(&b, now_ms, self.ttl))
    }

    /// The cached batch if it is valid at `now_ms`.
    pub fn fresh(&self, now_ms: u64) -> Option<CachedBatch> {
        self.get()
            .filter(|b| Self::batch_is_fresh(b, now_ms, self.ttl))
    }

    /// The cached batch if it holds any events, regardless of age.
    pub fn any_data(&self) -> Option<CachedBatch> {
        self.get().filter(|b| !b.events.is_empty())
    }

    pub fn set(&self, events: Vec<Event>, now_ms: u64) -> CachedBatch {
        let batch = CachedBatch {
            events: Arc::new(events),
            timestamp_ms: now_ms,
            stale: false,
        };
        *self.write_slot() = Some(batch.clone());
        batch
    }

    /// Expire the current batch early without discarding it.
    ///
    /// Used after a failed forced refresh so the next read goes back to the
    /// source instead of serving a batch the caller just tried to replace.
    /// Only flags the slot if it still holds `seen`; a batch stored by a
    /// concurrent fetch in the meantime is left alone.
    pub fn mark_stale(&self, seen: &CachedBatch) {
        if let Some(b) = self.write_slot().as_mut() {
            if Arc::ptr_eq(&b.events, &seen.events) {
                b.stale = true;
            }
        }
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<CachedBatch>> {
        match self.slot.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn batch_is_fresh(b: &CachedBatch, now_ms: u64, ttl: Duration) -> bool {
        !b.stale
            && !b.events.is_empty()
            && (now_ms.saturating_sub(b.timestamp_ms) as u128) < ttl.as_millis()
    }
}
