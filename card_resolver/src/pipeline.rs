//! Image resolution pipeline
//!
//! Embedded image map, then cache check, then in-flight deduplication,
//! then a walk over the remote providers in tier order with optional
//! validation, then the placeholder. `resolve` is total: every call ends
//! with a URL.
//!
//! Each walk runs in its own spawned task, so a caller that stops waiting
//! does not cancel the lookup. Concurrent callers for the same key share
//! one walk through a `Shared` future registered in the pending table
//! before the first await; a drop guard inside the task removes that
//! entry however the walk ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use mtg_common::{CardRef, ImageCandidate, ImageSize, SourceTier};
use tokio::task::JoinHandle;

use crate::image_cache::{CacheKey, CacheStats, ImageCache};
use crate::providers::{ImageProvider, PlaceholderProvider};
use crate::validation::ImageValidator;

type SharedResolution = Shared<BoxFuture<'static, ImageCandidate>>;

/// An in-flight walk and whether it load-tests its candidates
#[derive(Clone)]
struct PendingResolution {
    resolution: SharedResolution,
    validated: bool,
}

enum Lookup {
    Cached(ImageCandidate),
    Pending(PendingResolution),
}

/// Per-call resolution policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Load-test each candidate before accepting it
    pub validate: bool,
    /// Skip the cache lookup (the result is still cached)
    pub force_refresh: bool,
}

impl ResolveOptions {
    pub fn validated() -> Self {
        Self {
            validate: true,
            ..Default::default()
        }
    }
}

struct PipelineInner {
    providers: Vec<Arc<dyn ImageProvider>>,
    placeholder: PlaceholderProvider,
    validator: Arc<dyn ImageValidator>,
    cache: ImageCache,
    pending: Mutex<HashMap<CacheKey, PendingResolution>>,
}

impl PipelineInner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<CacheKey, PendingResolution>> {
        self.pending.lock().unwrap_or_else(|poisoned| {
            warn!("Pending resolution table was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// A cached entry is good enough unless the caller wants validation
    /// and the entry was stored without it.
    fn usable_cached(&self, key: &CacheKey, validate: bool, count: bool) -> Option<ImageCandidate> {
        let entry = if count {
            self.cache.get(key)
        } else {
            self.cache.peek(key)
        };
        let entry = entry?;
        if validate && !entry.validated && !entry.image.is_placeholder() {
            debug!(
                "Cached image for {} was never validated, resolving again",
                key.identity()
            );
            return None;
        }
        Some(entry.image)
    }

    /// Direct-tier providers read the record itself. The cache key does
    /// not cover a record's embedded map, so these run before the cache
    /// and their URLs are returned as-is.
    async fn embedded(&self, card: &CardRef, size: ImageSize) -> Option<ImageCandidate> {
        let direct = self
            .providers
            .iter()
            .filter(|p| p.tier() == SourceTier::Direct);
        for provider in direct {
            if let Some(url) = provider.resolve(card, size).await {
                return Some(ImageCandidate {
                    url,
                    tier: SourceTier::Direct,
                    size,
                });
            }
        }
        None
    }

    async fn walk(&self, card: &CardRef, size: ImageSize, validate: bool) -> ImageCandidate {
        let remote = self
            .providers
            .iter()
            .filter(|p| p.tier() != SourceTier::Direct);
        for provider in remote {
            let tier = provider.tier();
            let Some(url) = provider.resolve(card, size).await else {
                debug!("[{}] no candidate", tier);
                continue;
            };

            if validate && tier != SourceTier::Placeholder && !self.validator.validate(&url).await
            {
                warn!("[{}] candidate failed validation: {}", tier, url);
                continue;
            }

            debug!("[{}] accepted {}", tier, url);
            return ImageCandidate { url, tier, size };
        }

        info!(
            "All image tiers exhausted for {:?}, using placeholder",
            card.name().or(card.identifier())
        );
        self.placeholder.candidate(size)
    }
}

/// Removes the pending entry when the resolution task ends, including
/// by panic.
struct PendingGuard {
    inner: Arc<PipelineInner>,
    key: CacheKey,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.inner.lock_pending().remove(&self.key);
    }
}

#[derive(Clone)]
pub struct ImagePipeline {
    inner: Arc<PipelineInner>,
}

impl ImagePipeline {
    pub fn new(
        providers: Vec<Arc<dyn ImageProvider>>,
        placeholder: PlaceholderProvider,
        validator: Arc<dyn ImageValidator>,
        cache_ceiling: usize,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                providers,
                placeholder,
                validator,
                cache: ImageCache::new(cache_ceiling),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn placeholder(&self, size: ImageSize) -> ImageCandidate {
        self.inner.placeholder.candidate(size)
    }

    /// Resolve an image for `card`. Never fails; worst case is the
    /// placeholder for `size`.
    pub async fn resolve(
        &self,
        card: &CardRef,
        size: ImageSize,
        options: ResolveOptions,
    ) -> ImageCandidate {
        if let Some(image) = self.inner.embedded(card, size).await {
            return image;
        }

        let Some(key) = CacheKey::for_card(card, size) else {
            debug!("Card has neither identifier nor name, using placeholder");
            return self.placeholder(size);
        };

        if !options.force_refresh {
            if let Some(image) = self.inner.usable_cached(&key, options.validate, true) {
                return image;
            }
        }

        loop {
            let pending = match self.lookup_or_spawn(&key, card, options) {
                Lookup::Cached(image) => return image,
                Lookup::Pending(pending) => pending,
            };
            let image = pending.resolution.await;
            if !options.validate || pending.validated || image.is_placeholder() {
                return image;
            }

            // Attached to a walk that did not load-test its result
            if self.inner.validator.validate(&image.url).await {
                self.inner.cache.set(key.clone(), image.clone(), true);
                return image;
            }
            warn!(
                "[{}] shared result failed validation, resolving {} again: {}",
                image.tier,
                key.identity(),
                image.url
            );
        }
    }

    /// Atomic check-and-insert on the pending table. An existing walk is
    /// joined whatever its validation mode; the cache is re-checked under
    /// the lock since a walk may have settled after the caller's first
    /// check (settlement caches before clearing its pending entry).
    fn lookup_or_spawn(&self, key: &CacheKey, card: &CardRef, options: ResolveOptions) -> Lookup {
        let mut table = self.inner.lock_pending();
        if let Some(existing) = table.get(key) {
            debug!("Attaching to in-flight resolution for {}", key.identity());
            return Lookup::Pending(existing.clone());
        }
        if !options.force_refresh {
            if let Some(image) = self.inner.usable_cached(key, options.validate, false) {
                return Lookup::Cached(image);
            }
        }
        let pending = self.spawn_resolution(key.clone(), card.clone(), options.validate);
        table.insert(key.clone(), pending.clone());
        Lookup::Pending(pending)
    }

    fn spawn_resolution(&self, key: CacheKey, card: CardRef, validate: bool) -> PendingResolution {
        let inner = Arc::clone(&self.inner);
        let size = key.size();
        let fallback = inner.placeholder.candidate(size);

        let handle: JoinHandle<ImageCandidate> = tokio::spawn(async move {
            let guard = PendingGuard {
                inner: Arc::clone(&inner),
                key,
            };
            let image = inner.walk(&card, size, validate).await;
            inner.cache.set(guard.key.clone(), image.clone(), validate);
            drop(guard);
            image
        });

        let resolution = async move {
            match handle.await {
                Ok(image) => image,
                Err(e) => {
                    warn!("Image resolution task failed: {}", e);
                    fallback
                }
            }
        }
        .boxed()
        .shared();

        PendingResolution {
            resolution,
            validated: validate,
        }
    }

    /// Warm the cache for `cards`. Results and failures are discarded;
    /// the handle may be dropped.
    pub fn preload(&self, cards: Vec<CardRef>, size: ImageSize) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let count = cards.len();
            let lookups = cards.iter().map(|card| {
                pipeline.resolve(card, size, ResolveOptions::default())
            });
            futures::future::join_all(lookups).await;
            debug!("Preloaded {} card images ({})", count, size);
        })
    }

    /// Drop every cached URL. In-flight resolutions still settle into
    /// the cache afterwards.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock_pending().len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            in_flight: self.in_flight(),
            ..self.inner.cache.stats()
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
