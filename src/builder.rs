//! Configured construction of an [`LfuCache`].
//!
//! Collects the name, capacity, hooks and loader up front so a cache is fully
//! wired before any other thread can see it.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use freqcache::builder::LfuCacheBuilder;
//! use freqcache::entry::CacheItem;
//!
//! let cache = LfuCacheBuilder::new("users")
//!     .capacity(2)
//!     .data_loader(|key: &u64, _args| Some(CacheItem::new(*key, Duration::ZERO, format!("user-{key}"))))
//!     .build();
//!
//! assert_eq!(*cache.get(&7).unwrap().data(), "user-7");
//! assert_eq!(cache.capacity(), 2);
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::entry::CacheItem;
use crate::hooks::{Hooks, LoaderArg};
use crate::policy::lfu::LfuCache;

/// Capacity used when [`LfuCacheBuilder::capacity`] is not called.
pub const DEFAULT_CAPACITY: usize = 128;

/// Builder for [`LfuCache`] instances.
pub struct LfuCacheBuilder<K, V> {
    name: String,
    capacity: usize,
    hooks: Hooks<K, V>,
}

impl<K, V> LfuCacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Starts a builder for a cache called `name` with [`DEFAULT_CAPACITY`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: DEFAULT_CAPACITY,
            hooks: Hooks::new(),
        }
    }

    /// Maximum number of resident items. 0 builds a cache that admits nothing.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Appends an added hook. May be called repeatedly.
    pub fn on_added<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.hooks.add_added(Arc::new(callback));
        self
    }

    /// Appends an about-to-delete hook. May be called repeatedly.
    pub fn on_about_to_delete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.hooks.add_about_to_delete(Arc::new(callback));
        self
    }

    pub fn data_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&K, &[LoaderArg]) -> Option<CacheItem<K, V>> + Send + Sync + 'static,
    {
        self.hooks.set_loader(Arc::new(loader));
        self
    }

    pub fn build(self) -> LfuCache<K, V> {
        LfuCache::with_hooks(self.name, self.capacity, self.hooks)
    }
}

impl<K, V> Debug for LfuCacheBuilder<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LfuCacheBuilder")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("hooks", &self.hooks)
            .finish()
    }
}
