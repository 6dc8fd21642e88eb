//! # LFU (Least Frequently Used) Cache
//!
//! A bounded, thread-safe key/value store that evicts the item with the
//! lowest access frequency when capacity is reached, breaking ties by
//! recency. Misses can be filled by a data loader, and callers can observe
//! admissions and removals through hooks.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                          LfuCache<K, V>                                  │
//!   │                                                                          │
//!   │   inner: RwLock<LfuState>  (structural lock)                             │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  items: HashMap<K, Arc<CacheItem<K, V>>>   (primary map)           │ │
//!   │   │                                                                    │ │
//!   │   │  freq: FrequencyBuckets<K>                                         │ │
//!   │   │    key → NodeId          (bucket position)                         │ │
//!   │   │    freq → Bucket         (recency-ordered keys)                    │ │
//!   │   │    lowest ⇄ highest      (chain of populated levels)               │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   hooks: RwLock<Hooks>  (added / about-to-delete / data loader)          │
//!   │   capacity: usize       (immutable, read without locking)                │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Flow
//!
//! ```text
//!   value(key, args)
//!        │
//!        ▼
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ Resident?  YES → touch (freq + 1, most recent in new bucket), return │
//!   └──────────────────────────────────────────────────────────────────────┘
//!        │ NO
//!        ▼
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ Loader configured?  NO → Err(KeyNotFound)                            │
//!   └──────────────────────────────────────────────────────────────────────┘
//!        │ YES  (structural lock released while the loader runs)
//!        ▼
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ Loader result?  None → Err(KeyNotFoundOrLoadable)                    │
//!   │                 Some → relock; admit at freq 1 (evicting if full)    │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction
//!
//! The victim is the tail of the bucket at the minimum frequency: lowest
//! frequency first, least recently touched among equals. About-to-delete
//! hooks see the victim before it leaves any map.
//!
//! ## Hooks and locking
//!
//! - Every hook fires while the structural write lock is held, so no hook
//!   may call back into the same cache. Added hooks see the item already
//!   resident; about-to-delete hooks see it still resident.
//! - Hooks for one item never interleave with another writer: an item's
//!   added hooks always complete before any removal of it begins.
//! - A panicking hook unwinds out of the operation. Removal hooks fire before
//!   the index is touched, so the cache stays consistent either way.
//!
//! ## Loader race
//!
//! While the loader runs, other threads may admit the same key. After
//! relocking, a resident entry wins: it is touched and returned, and the
//! loaded item is dropped.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use freqcache::policy::lfu::LfuCache;
//!
//! let cache: LfuCache<&str, u32> = LfuCache::new("fruit", 2);
//! cache.insert("apple", Duration::ZERO, 1);
//! cache.insert("banana", Duration::ZERO, 2);
//!
//! // "apple" is read once more, so "banana" is the LFU victim.
//! cache.value(&"apple", &[]).unwrap();
//! cache.insert("cherry", Duration::ZERO, 3);
//!
//! assert!(cache.exists(&"apple"));
//! assert!(!cache.exists(&"banana"));
//! assert_eq!(cache.frequency(&"apple"), Some(2));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ds::FrequencyBuckets;
use crate::entry::CacheItem;
use crate::error::{CacheError, InvariantError, Result};
use crate::hooks::{self, Hooks, ItemCallback, LoaderArg};

type Callbacks<K, V> = Arc<[ItemCallback<K, V>]>;

/// Upper bound on up-front map allocation; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 4096;

struct LfuState<K, V> {
    items: FxHashMap<K, Arc<CacheItem<K, V>>>,
    freq: FrequencyBuckets<K>,
}

impl<K, V> LfuState<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(PREALLOC_LIMIT);
        Self {
            items: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            freq: FrequencyBuckets::with_capacity(capacity),
        }
    }

    fn touch(&mut self, item: &CacheItem<K, V>) {
        if let Some(freq) = self.freq.touch(item.key()) {
            item.set_access_count(freq);
        }
    }

    /// Makes `item` resident at frequency 1, evicting first when full.
    ///
    /// Eviction may relink the populated-level chain to a higher minimum;
    /// inserting at level 1 then puts level 1 back at its head. Both are
    /// O(1) link updates.
    fn admit(&mut self, name: &str, capacity: usize, item: Arc<CacheItem<K, V>>, removing: &Callbacks<K, V>) {
        if self.items.len() >= capacity {
            self.evict(name, removing);
        }
        item.set_access_count(1);
        self.freq.insert(item.key().clone());
        debug!(cache = %name, key = ?item.key(), "admitted item");
        self.items.insert(item.key().clone(), item);
    }

    fn evict(&mut self, name: &str, removing: &Callbacks<K, V>) {
        let Some(key) = self.freq.peek_min().cloned() else {
            return;
        };
        let Some(item) = self.items.get(&key).cloned() else {
            return;
        };

        hooks::notify(removing, &item);
        let freq = self.freq.pop_min().map(|(_, freq)| freq);
        self.items.remove(&key);
        debug!(cache = %name, key = ?key, freq, "evicted least frequently used item");
    }
}

/// Thread-safe LFU cache.
///
/// See the module-level documentation for the eviction and locking model.
pub struct LfuCache<K, V> {
    name: String,
    capacity: usize,
    inner: RwLock<LfuState<K, V>>,
    hooks: RwLock<Hooks<K, V>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Creates an empty cache holding at most `capacity` items.
    ///
    /// A capacity of 0 is legal: such a cache never admits anything.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            inner: RwLock::new(LfuState::with_capacity(capacity)),
            hooks: RwLock::new(Hooks::new()),
        }
    }

    pub(crate) fn with_hooks(name: impl Into<String>, capacity: usize, hooks: Hooks<K, V>) -> Self {
        let cache = Self::new(name, capacity);
        *cache.hooks.write() = hooks;
        cache
    }

    /// Name given at construction, used as the `cache` field of log events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of resident items. Immutable, so no lock is taken.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident items.
    pub fn count(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// `true` if `key` is resident. Does not count as an access.
    pub fn exists(&self, key: &K) -> bool {
        self.inner.read().items.contains_key(key)
    }

    /// Current access frequency of `key`, without counting as an access.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.read().freq.frequency(key)
    }

    /// Inserts or updates `key`.
    ///
    /// Updating a resident key replaces its payload and lifespan and counts
    /// as an access. A new key is admitted at frequency 1, evicting the LFU
    /// item first when the cache is full; added hooks then fire with it
    /// before the structural lock is released.
    /// Returns the resident item (or, with capacity 0, the item that was
    /// refused admission).
    pub fn insert(&self, key: K, life_span: Duration, data: V) -> Arc<CacheItem<K, V>> {
        let (added, removing) = self.hook_lists();
        let mut state = self.inner.write();

        if let Some(item) = state.items.get(&key).cloned() {
            item.update(Arc::new(data), life_span);
            state.touch(&item);
            debug!(cache = %self.name, key = ?key, freq = item.access_count(), "updated item");
            return item;
        }

        let item = Arc::new(CacheItem::new(key, life_span, data));
        if self.capacity == 0 {
            trace!(cache = %self.name, key = ?item.key(), "zero capacity, item not admitted");
            return item;
        }

        state.admit(&self.name, self.capacity, Arc::clone(&item), &removing);
        hooks::notify(&added, &item);
        item
    }

    /// Returns the item for `key`, counting the read as an access.
    ///
    /// On a miss the configured data loader (if any) is called with `key`
    /// and `args` while the structural lock is released.
    ///
    /// # Errors
    ///
    /// - [`CacheError::KeyNotFound`] on a miss with no data loader.
    /// - [`CacheError::KeyNotFoundOrLoadable`] when the loader returns `None`.
    pub fn value(&self, key: &K, args: &[LoaderArg]) -> Result<Arc<CacheItem<K, V>>> {
        {
            let mut state = self.inner.write();
            if let Some(item) = state.items.get(key).cloned() {
                item.keep_alive();
                state.touch(&item);
                trace!(cache = %self.name, key = ?key, freq = item.access_count(), "hit");
                return Ok(item);
            }
        }

        let Some(loader) = self.hooks.read().loader() else {
            trace!(cache = %self.name, key = ?key, "miss");
            return Err(CacheError::KeyNotFound);
        };

        let Some(loaded) = loader(key, args) else {
            debug!(cache = %self.name, key = ?key, "loader declined key");
            return Err(CacheError::KeyNotFoundOrLoadable);
        };

        let (added, removing) = self.hook_lists();
        let mut state = self.inner.write();

        if let Some(resident) = state.items.get(loaded.key()).cloned() {
            resident.keep_alive();
            state.touch(&resident);
            debug!(
                cache = %self.name,
                key = ?resident.key(),
                "key admitted concurrently while loading, keeping resident item"
            );
            return Ok(resident);
        }

        let item = Arc::new(loaded);
        if self.capacity == 0 {
            trace!(cache = %self.name, key = ?item.key(), "zero capacity, loaded item not admitted");
            return Ok(item);
        }

        state.admit(&self.name, self.capacity, Arc::clone(&item), &removing);
        hooks::notify(&added, &item);
        Ok(item)
    }

    /// Shorthand for [`value`](Self::value) with no loader arguments.
    pub fn get(&self, key: &K) -> Result<Arc<CacheItem<K, V>>> {
        self.value(key, &[])
    }

    /// Removes `key` and returns its item.
    ///
    /// About-to-delete hooks fire before the item leaves the cache.
    ///
    /// # Errors
    ///
    /// [`CacheError::KeyNotFound`] if `key` is not resident.
    pub fn delete(&self, key: &K) -> Result<Arc<CacheItem<K, V>>> {
        let removing = self.hooks.read().about_to_delete();
        let mut state = self.inner.write();

        let item = state.items.get(key).cloned().ok_or(CacheError::KeyNotFound)?;
        hooks::notify(&removing, &item);
        state.freq.remove(key);
        state.items.remove(key);

        debug!(cache = %self.name, key = ?key, "deleted item");
        Ok(item)
    }

    /// Removes every item.
    ///
    /// About-to-delete hooks fire once per resident item, in no particular
    /// order, then all bookkeeping is reset in one step.
    pub fn flush(&self) {
        let removing = self.hooks.read().about_to_delete();
        let mut state = self.inner.write();

        debug!(cache = %self.name, items = state.items.len(), "flushing cache");
        if !removing.is_empty() {
            for item in state.items.values() {
                hooks::notify(&removing, item);
            }
        }
        state.items.clear();
        state.freq.clear();
    }

    /// Calls `f` for every resident item, in no particular order.
    ///
    /// Runs under the shared lock; `f` must not write to this cache.
    pub fn foreach<F>(&self, mut f: F)
    where
        F: FnMut(&K, &Arc<CacheItem<K, V>>),
    {
        let state = self.inner.read();
        for (key, item) in &state.items {
            f(key, item);
        }
    }

    /// Returns up to `count` items, highest frequency first and most
    /// recently touched first among equal frequencies.
    ///
    /// ```
    /// use std::time::Duration;
    /// use freqcache::policy::lfu::LfuCache;
    ///
    /// let cache: LfuCache<&str, ()> = LfuCache::new("ranked", 8);
    /// for key in ["a", "b", "c"] {
    ///     cache.insert(key, Duration::ZERO, ());
    /// }
    /// cache.get(&"a").unwrap();
    /// cache.get(&"a").unwrap();
    /// cache.get(&"c").unwrap();
    ///
    /// let ranked: Vec<_> = cache.most_accessed(3).iter().map(|item| *item.key()).collect();
    /// assert_eq!(ranked, vec!["a", "c", "b"]);
    /// ```
    pub fn most_accessed(&self, count: usize) -> Vec<Arc<CacheItem<K, V>>> {
        let state = self.inner.read();
        state
            .freq
            .iter_descending()
            .take(count)
            .filter_map(|(key, _)| state.items.get(key).cloned())
            .collect()
    }

    /// Replaces all added hooks with `callback`.
    pub fn set_added_callback<F>(&self, callback: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.hooks.write().set_added(Arc::new(callback));
    }

    /// Appends `callback` to the added hooks.
    pub fn add_added_callback<F>(&self, callback: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.hooks.write().add_added(Arc::new(callback));
    }

    /// Removes every added hook.
    pub fn clear_added_callbacks(&self) {
        self.hooks.write().clear_added();
    }

    /// Replaces all about-to-delete hooks with `callback`.
    pub fn set_about_to_delete_callback<F>(&self, callback: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.hooks.write().set_about_to_delete(Arc::new(callback));
    }

    /// Appends `callback` to the about-to-delete hooks.
    pub fn add_about_to_delete_callback<F>(&self, callback: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.hooks.write().add_about_to_delete(Arc::new(callback));
    }

    /// Removes every about-to-delete hook.
    pub fn clear_about_to_delete_callbacks(&self) {
        self.hooks.write().clear_about_to_delete();
    }

    /// Installs the loader consulted on read misses, replacing any previous one.
    pub fn set_data_loader<F>(&self, loader: F)
    where
        F: Fn(&K, &[LoaderArg]) -> Option<CacheItem<K, V>> + Send + Sync + 'static,
    {
        self.hooks.write().set_loader(Arc::new(loader));
    }

    /// Removes the loader; later misses fail with [`CacheError::KeyNotFound`].
    pub fn clear_data_loader(&self) {
        self.hooks.write().clear_loader();
    }

    /// Verifies the structural invariants of the cache.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        let state = self.inner.read();
        state.freq.check_invariants()?;

        if state.items.len() != state.freq.len() {
            return Err(InvariantError::new(format!(
                "{} items but {} tracked keys",
                state.items.len(),
                state.freq.len()
            )));
        }
        if state.items.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} items exceed capacity {}",
                state.items.len(),
                self.capacity
            )));
        }
        for (key, item) in &state.items {
            if item.key() != key {
                return Err(InvariantError::new(format!("item for {key:?} carries key {:?}", item.key())));
            }
            if state.freq.frequency(key) != Some(item.access_count()) {
                return Err(InvariantError::new(format!(
                    "{key:?} has access count {} but frequency {:?}",
                    item.access_count(),
                    state.freq.frequency(key)
                )));
            }
        }
        Ok(())
    }

    fn hook_lists(&self) -> (Callbacks<K, V>, Callbacks<K, V>) {
        let hooks = self.hooks.read();
        (hooks.added(), hooks.about_to_delete())
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("len", &self.inner.read().items.len())
            .field("hooks", &*self.hooks.read())
            .finish()
    }
}
