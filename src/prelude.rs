pub use crate::builder::{DEFAULT_CAPACITY, LfuCacheBuilder};
pub use crate::ds::FrequencyBuckets;
pub use crate::entry::CacheItem;
pub use crate::error::{CacheError, InvariantError, Result};
pub use crate::hooks::{DataLoader, ItemCallback, LoaderArg};
pub use crate::policy::lfu::LfuCache;
pub use crate::registry::CacheRegistry;
