//! In-memory cache of resolved image URLs
//!
//! Keyed by card identity and image size. Entries never expire by age;
//! when the entry count passes the ceiling, only the most recently
//! inserted half is kept.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mtg_common::{CardRef, ImageCandidate, ImageSize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    identity: String,
    size: ImageSize,
}

impl CacheKey {
    pub fn new(identity: impl Into<String>, size: ImageSize) -> Self {
        Self {
            identity: identity.into(),
            size,
        }
    }

    /// Key for a card, or `None` when the card has no identifier or name
    pub fn for_card(card: &CardRef, size: ImageSize) -> Option<Self> {
        card.identity_key().map(|identity| Self::new(identity, size))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub image: ImageCandidate,
    /// Whether the URL passed the validation gate before being stored
    pub validated: bool,
    pub inserted_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
}

pub struct ImageCache {
    state: Mutex<CacheState>,
    ceiling: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ImageCache {
    pub fn new(ceiling: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ceiling: ceiling.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log::warn!("Image cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Get a cached entry, counting the hit or miss
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.peek(key);
        match entry {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("Image cache hit for {} ({})", key.identity, key.size);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        entry
    }

    /// Get a cached entry without touching the statistics
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock_state().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock_state().entries.contains_key(key)
    }

    /// Store a resolved image, then trim if the ceiling was passed.
    /// Re-inserting a key counts as a fresh insertion.
    pub fn set(&self, key: CacheKey, image: ImageCandidate, validated: bool) {
        let mut state = self.lock_state();
        let seq = state.next_seq;
        state.next_seq += 1;
        log::debug!(
            "Cached {} image for {} ({})",
            image.tier,
            key.identity,
            key.size
        );
        state.entries.insert(
            key,
            CacheEntry {
                image,
                validated,
                inserted_at: Utc::now(),
                seq,
            },
        );
        Self::trim(&mut state, self.ceiling);
    }

    /// Run an eviction pass; returns how many entries were dropped
    pub fn evict_if_oversized(&self) -> usize {
        let mut state = self.lock_state();
        Self::trim(&mut state, self.ceiling)
    }

    fn trim(state: &mut CacheState, ceiling: usize) -> usize {
        let before = state.entries.len();
        if before <= ceiling {
            return 0;
        }

        let keep = (ceiling / 2).max(1);
        let mut seqs: Vec<u64> = state.entries.values().map(|e| e.seq).collect();
        seqs.sort_unstable_by(|a, b| b.cmp(a));
        let oldest_kept = seqs[keep - 1];
        state.entries.retain(|_, entry| entry.seq >= oldest_kept);

        let evicted = before - state.entries.len();
        log::info!(
            "Image cache passed {} entries, evicted {} (kept {})",
            ceiling,
            evicted,
            state.entries.len()
        );
        evicted
    }

    pub fn clear(&self) {
        let mut state = self.lock_state();
        let dropped = state.entries.len();
        state.entries.clear();
        log::info!("Image cache cleared ({} entries)", dropped);
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            in_flight: 0,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
