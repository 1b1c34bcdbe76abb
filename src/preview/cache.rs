//! Expiring LRU cache for encoded previews.
//!
//! Every entry carries its own time-to-live. Lookups treat an entry older
//! than its TTL as absent and drop it on the spot; there is no background
//! sweeper.
//!
//! # Size-Based Eviction
//!
//! Values report a byte weight. The cache tracks the total weight and evicts
//! least-recently-used entries once the capacity is exceeded, independently
//! of expiry.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default preview cache capacity: 256MB
pub const DEFAULT_PREVIEW_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

/// Default time-to-live for cached previews (one hour)
pub const DEFAULT_PREVIEW_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Weighted Values
// =============================================================================

/// A cached value with a size in bytes, used for capacity accounting.
pub trait Weighted {
    fn weight(&self) -> usize;
}

impl Weighted for Bytes {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

// =============================================================================
// Cache Keys
// =============================================================================

/// Cache key for an enhanced quad preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewCacheKey {
    /// Mosaic identifier
    pub mosaic_id: Arc<str>,

    /// Quad identifier within the mosaic
    pub quad_id: Arc<str>,
}

impl PreviewCacheKey {
    /// Create a new cache key.
    pub fn new(mosaic_id: impl Into<Arc<str>>, quad_id: impl Into<Arc<str>>) -> Self {
        Self {
            mosaic_id: mosaic_id.into(),
            quad_id: quad_id.into(),
        }
    }
}

// =============================================================================
// Expiring Cache
// =============================================================================

struct CacheEntry<V> {
    value: V,
    inserted: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted) < self.ttl
    }
}

/// Size-bounded LRU cache whose entries expire after a per-entry TTL.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
/// Locks are only held for in-memory bookkeeping.
///
/// # Example
///
/// ```
/// use basemap_gateway::preview::{PreviewCache, PreviewCacheKey};
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = PreviewCache::new();
///
///     let key = PreviewCacheKey::new("mosaic-1", "123-456");
///     let png = Bytes::from_static(b"\x89PNG");
///
///     cache.put(key.clone(), png.clone(), Duration::from_secs(60)).await;
///     assert_eq!(cache.get(&key).await, Some(png));
/// }
/// ```
pub struct ExpiringCache<K, V> {
    /// The underlying LRU cache
    cache: RwLock<LruCache<K, CacheEntry<V>>>,

    /// Maximum total weight in bytes
    max_size: usize,

    /// Current total weight in bytes
    current_size: RwLock<usize>,
}

/// Cache of encoded PNG previews keyed by mosaic and quad.
pub type PreviewCache = ExpiringCache<PreviewCacheKey, Bytes>;

impl<K, V> ExpiringCache<K, V>
where
    K: Hash + Eq,
    V: Weighted + Clone,
{
    /// Create a cache with the default capacity (256MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PREVIEW_CACHE_CAPACITY)
    }

    /// Create a cache with the given capacity in bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache with the given capacity in bytes and maximum entry count.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            )),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Get a value if present and younger than its TTL.
    ///
    /// An expired entry is removed and reported as absent. A hit marks the
    /// entry as recently used.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.cache.write().await;
        let now = Instant::now();

        match cache.get(key) {
            Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        if let Some(expired) = cache.pop(key) {
            let mut current_size = self.current_size.write().await;
            *current_size = current_size.saturating_sub(expired.value.weight());
        }
        None
    }

    /// Check for a fresh entry without updating LRU order.
    pub async fn contains(&self, key: &K) -> bool {
        let cache = self.cache.read().await;
        cache
            .peek(key)
            .is_some_and(|entry| entry.is_fresh(Instant::now()))
    }

    /// Store a value with the given TTL, replacing any existing entry.
    ///
    /// If the cache is over capacity after insertion, least-recently-used
    /// entries are evicted until it fits.
    pub async fn put(&self, key: K, value: V, ttl: Duration) {
        let weight = value.weight();
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        let entry = CacheEntry {
            value,
            inserted: Instant::now(),
            ttl,
        };

        // push() hands back either the replaced value or an entry-count eviction
        if let Some((_, displaced)) = cache.push(key, entry) {
            *current_size = current_size.saturating_sub(displaced.value.weight());
        }
        *current_size += weight;

        while *current_size > self.max_size {
            if let Some((_, evicted)) = cache.pop_lru() {
                *current_size = current_size.saturating_sub(evicted.value.weight());
            } else {
                break;
            }
        }
    }

    /// Remove an entry, returning its value if it existed.
    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        let entry = cache.pop(key)?;
        *current_size = current_size.saturating_sub(entry.value.weight());
        Some(entry.value)
    }

    /// Clear all entries.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        let cache = self.cache.read().await;
        cache.is_empty()
    }

    /// Current total weight in bytes.
    pub async fn size(&self) -> usize {
        let current_size = self.current_size.read().await;
        *current_size
    }

    /// Maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl<K, V> Default for ExpiringCache<K, V>
where
    K: Hash + Eq,
    V: Weighted + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
