//! freqcache: a thread-safe LFU cache with O(1) frequency-bucketed eviction.
//!
//! Items are kept in per-frequency recency lists; eviction takes the least
//! recently touched item at the lowest frequency. Caches can fill misses
//! through a data loader, report admissions and removals through hooks, and
//! be shared by name through a [`CacheRegistry`](registry::CacheRegistry).
//!
//! ```
//! use std::time::Duration;
//! use freqcache::prelude::*;
//!
//! let cache: LfuCache<u32, &str> = LfuCacheBuilder::new("quickstart").capacity(2).build();
//! cache.insert(1, Duration::ZERO, "one");
//! cache.insert(2, Duration::ZERO, "two");
//! cache.get(&1).unwrap();
//! cache.insert(3, Duration::ZERO, "three");
//!
//! assert!(cache.exists(&1));
//! assert!(!cache.exists(&2));
//! ```

pub mod builder;
pub mod ds;
pub mod entry;
pub mod error;
pub mod hooks;
pub mod policy;
pub mod prelude;
pub mod registry;
