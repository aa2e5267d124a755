//! Interval gating for registry checks
//!
//! A check is allowed when no record exists for the key or when
//! `now >= last_check + interval`. Storage failures never block a check:
//! they are logged and treated as a missing record.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::version::cache::{CacheKey, CacheRecord, CacheStorage};
use crate::version::clock::Clock;

/// Outcome of consulting the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// A check may run; the record now holds `checked_at`
    Proceed { checked_at: i64 },
    /// The interval has not elapsed; the record is untouched
    Skip { cached_latest: Option<String> },
}

pub struct CacheGate {
    storage: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
}

impl CacheGate {
    pub fn new(storage: Arc<dyn CacheStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Returns true and records the current time if a check is due.
    pub async fn should_check(&self, key: &CacheKey, interval_ms: u64) -> bool {
        matches!(
            self.evaluate(key, interval_ms).await,
            GateDecision::Proceed { .. }
        )
    }

    pub async fn evaluate(&self, key: &CacheKey, interval_ms: u64) -> GateDecision {
        let now = self.clock.now_ms();

        let record = match self.storage.get(key).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to read cache record for {}, checking anyway: {}", key, e);
                None
            }
        };

        let mut previous_latest = None;
        if let Some(record) = record {
            let interval = i64::try_from(interval_ms).unwrap_or(i64::MAX);
            let next_allowed = record.last_check.saturating_add(interval);
            if now < next_allowed {
                debug!(
                    "Skipping check for {}: next check allowed in {}ms",
                    key,
                    next_allowed - now
                );
                return GateDecision::Skip {
                    cached_latest: record.latest,
                };
            }
            previous_latest = record.latest;
        }

        // Keep the last known version in case the upcoming fetch fails
        let record = CacheRecord {
            last_check: now,
            latest: previous_latest,
        };
        if let Err(e) = self.storage.set(key, &record).await {
            warn!("Failed to write cache record for {}: {}", key, e);
        }

        debug!("Check allowed for {} at {}", key, now);
        GateDecision::Proceed { checked_at: now }
    }
}
