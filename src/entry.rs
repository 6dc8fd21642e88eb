//! Cache items owned by an [`LfuCache`](crate::policy::lfu::LfuCache).
//!
//! A [`CacheItem`] is handed out as `Arc<CacheItem<K, V>>`. Its payload,
//! lifespan and last-access timestamp sit behind a per-item lock, so reading
//! an item never needs the cache's structural lock. The access counter is
//! only written by the cache while it holds that structural lock; readers see
//! it through an atomic.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

#[derive(Debug)]
struct ItemState<V> {
    data: Arc<V>,
    life_span: Duration,
    accessed_on: Instant,
}

/// A key/value record with access bookkeeping.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use freqcache::entry::CacheItem;
///
/// let item = CacheItem::new("apple", Duration::ZERO, 3u32);
/// assert_eq!(*item.key(), "apple");
/// assert_eq!(*item.data(), 3);
/// assert_eq!(item.access_count(), 1);
/// assert_eq!(item.life_span(), Duration::ZERO);
/// ```
pub struct CacheItem<K, V> {
    key: K,
    created_on: Instant,
    access_count: AtomicU64,
    state: RwLock<ItemState<V>>,
}

impl<K, V> CacheItem<K, V> {
    /// Creates an item with an access count of 1.
    ///
    /// A zero `life_span` means the item never expires. The cache does not
    /// sweep expired items; the lifespan is informational.
    pub fn new(key: K, life_span: Duration, data: V) -> Self {
        Self::from_arc(key, life_span, Arc::new(data))
    }

    /// Like [`new`](Self::new), for a payload that is already shared.
    pub fn from_arc(key: K, life_span: Duration, data: Arc<V>) -> Self {
        let now = Instant::now();
        Self {
            key,
            created_on: now,
            access_count: AtomicU64::new(1),
            state: RwLock::new(ItemState {
                data,
                life_span,
                accessed_on: now,
            }),
        }
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns a handle to the current payload.
    pub fn data(&self) -> Arc<V> {
        Arc::clone(&self.state.read().data)
    }

    pub fn life_span(&self) -> Duration {
        self.state.read().life_span
    }

    pub fn created_on(&self) -> Instant {
        self.created_on
    }

    /// When the item was last inserted, updated or read through the cache.
    pub fn accessed_on(&self) -> Instant {
        self.state.read().accessed_on
    }

    /// Number of accesses while resident; equals the item's LFU frequency.
    #[inline]
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Acquire)
    }

    /// Marks the item as accessed now without changing its frequency.
    pub fn keep_alive(&self) {
        self.state.write().accessed_on = Instant::now();
    }

    /// `true` if the item has a lifespan and has not been accessed within it
    /// as of `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        let state = self.state.read();
        !state.life_span.is_zero() && now.saturating_duration_since(state.accessed_on) > state.life_span
    }

    /// Replaces payload and lifespan and refreshes the access timestamp.
    pub(crate) fn update(&self, data: Arc<V>, life_span: Duration) {
        let mut state = self.state.write();
        state.data = data;
        state.life_span = life_span;
        state.accessed_on = Instant::now();
    }

    pub(crate) fn set_access_count(&self, count: u64) {
        self.access_count.store(count, Ordering::Release);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheItem<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("CacheItem")
            .field("key", &self.key)
            .field("data", &state.data)
            .field("life_span", &state.life_span)
            .field("access_count", &self.access_count())
            .finish()
    }
}
