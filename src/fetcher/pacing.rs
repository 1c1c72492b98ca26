//! Per-host request pacing.
//!
//! Every outbound request to a host first takes that host's permit. The
//! permit is exclusive, so at most one request per host is in flight, and
//! a new permit is only handed out once the jittered minimum spacing has
//! elapsed since the previous request to that host finished.

use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{Instant, sleep};
use tracing::debug;

type Slot = Arc<Mutex<Option<Instant>>>;

#[derive(Debug)]
pub struct HostPacer {
    hosts: DashMap<String, Slot>,
    min_spacing: Duration,
}

/// Exclusive right to talk to one host. Released on drop.
#[derive(Debug)]
pub struct HostPermit {
    guard: OwnedMutexGuard<Option<Instant>>,
}

impl Drop for HostPermit {
    fn drop(&mut self) {
        *self.guard = Some(Instant::now());
    }
}

impl HostPacer {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            hosts: DashMap::new(),
            min_spacing,
        }
    }

    pub async fn acquire(&self, host: &str) -> HostPermit {
        // Clone the slot out so the map shard is not held across the await
        let slot = self
            .hosts
            .entry(host.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let guard = slot.lock_owned().await;

        if let Some(last) = *guard {
            let spacing = self.jittered_spacing();
            let elapsed = last.elapsed();
            if elapsed < spacing {
                let wait = spacing - elapsed;
                debug!(host, wait_ms = wait.as_millis() as u64, "pacing request");
                sleep(wait).await;
            }
        }

        HostPermit { guard }
    }

    /// Minimum spacing scaled by a random factor in [0.5, 1.5), never below half.
    fn jittered_spacing(&self) -> Duration {
        if self.min_spacing.is_zero() {
            return Duration::ZERO;
        }
        let factor = rand::thread_rng().gen_range(0.5..1.5);
        self.min_spacing.mul_f64(factor)
    }
}
