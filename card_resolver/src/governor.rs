//! Global pacing for outbound catalog requests.
//!
//! One governor is shared by every adapter that talks to the network. Each
//! `acquire` reserves the next free slot, so grants are spaced at least
//! `min_interval` apart no matter how many callers race for them.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

pub struct RateGovernor {
    min_interval: Duration,
    /// Earliest instant the next grant may happen
    next_slot: Mutex<Option<Instant>>,
}

impl RateGovernor {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Pacing state stays usable after a panic elsewhere; the worst case is
    /// one slightly early grant.
    fn lock_slot(&self) -> MutexGuard<'_, Option<Instant>> {
        self.next_slot.lock().unwrap_or_else(|poisoned| {
            warn!("Rate governor mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until this caller's slot comes up. Never fails.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.lock_slot();
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        let now = Instant::now();
        if slot > now {
            debug!("Rate governor: waiting {:?}", slot - now);
            tokio::time::sleep_until(slot).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let governor = RateGovernor::new(Duration::from_millis(100));
        let start = Instant::now();
        governor.acquire().await;
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_acquires_are_spaced() {
        let governor = RateGovernor::new(Duration::from_millis(100));
        let start = Instant::now();
        for _ in 0..4 {
            governor.acquire().await;
        }
        assert!(Instant::now() - start >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_get_distinct_slots() {
        let governor = Arc::new(RateGovernor::new(Duration::from_millis(50)));
        let start = Instant::now();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let governor = Arc::clone(&governor);
                tokio::spawn(async move {
                    governor.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut grants = Vec::new();
        for handle in handles {
            grants.push(handle.await.unwrap() - start);
        }
        grants.sort();

        for pair in grants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(50));
        }
        assert!(*grants.last().unwrap() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_governor_does_not_delay() {
        let governor = RateGovernor::new(Duration::from_millis(100));
        governor.acquire().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        let before = Instant::now();
        governor.acquire().await;
        assert_eq!(Instant::now() - before, Duration::ZERO);
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let governor = RateGovernor::new(Duration::ZERO);
        for _ in 0..10 {
            governor.acquire().await;
        }
        assert_eq!(governor.min_interval(), Duration::ZERO);
    }
}
