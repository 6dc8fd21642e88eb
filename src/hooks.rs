//! Lifecycle callbacks and the data loader.
//!
//! An [`LfuCache`](crate::policy::lfu::LfuCache) carries two ordered callback
//! lists and one optional loader:
//!
//! | Surface            | Fired                                            |
//! |--------------------|--------------------------------------------------|
//! | added              | after an item is admitted (insert or loader)     |
//! | about-to-delete    | before an item is evicted, deleted or flushed    |
//! | data loader        | on a read miss, to materialize the missing item  |
//!
//! Lists are stored copy-on-write: registration rebuilds the list, dispatch
//! takes a cheap `Arc` snapshot, so a callback that registers another
//! callback only affects later operations.
//!
//! Callbacks run synchronously on the calling thread. A panicking callback is
//! not caught; it unwinds out of the cache operation that fired it.

use std::fmt;
use std::sync::Arc;

use crate::entry::CacheItem;

/// Callback receiving an item that was just admitted or is about to go.
pub type ItemCallback<K, V> = Arc<dyn Fn(&Arc<CacheItem<K, V>>) + Send + Sync>;

/// Loader invoked with the missed key and the caller's arguments.
///
/// Returning `None` means the key cannot be loaded.
pub type DataLoader<K, V> = Arc<dyn Fn(&K, &[LoaderArg]) -> Option<CacheItem<K, V>> + Send + Sync>;

/// Caller context forwarded to a [`DataLoader`] on a miss.
///
/// # Example
///
/// ```
/// use freqcache::hooks::LoaderArg;
///
/// let args: Vec<LoaderArg> = vec!["tenant-7".into(), 42i64.into(), true.into()];
/// assert_eq!(args[0].as_str(), Some("tenant-7"));
/// assert_eq!(args[1].as_int(), Some(42));
/// assert_eq!(args[2].as_bool(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderArg {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl LoaderArg {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LoaderArg::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            LoaderArg::Int(value) => Some(*value),
            LoaderArg::UInt(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            LoaderArg::UInt(value) => Some(*value),
            LoaderArg::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            LoaderArg::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LoaderArg::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            LoaderArg::Bytes(value) => Some(value),
            LoaderArg::Str(value) => Some(value.as_bytes()),
            _ => None,
        }
    }
}

impl From<bool> for LoaderArg {
    fn from(value: bool) -> Self {
        LoaderArg::Bool(value)
    }
}

impl From<i32> for LoaderArg {
    fn from(value: i32) -> Self {
        LoaderArg::Int(i64::from(value))
    }
}

impl From<i64> for LoaderArg {
    fn from(value: i64) -> Self {
        LoaderArg::Int(value)
    }
}

impl From<u32> for LoaderArg {
    fn from(value: u32) -> Self {
        LoaderArg::UInt(u64::from(value))
    }
}

impl From<u64> for LoaderArg {
    fn from(value: u64) -> Self {
        LoaderArg::UInt(value)
    }
}

impl From<f64> for LoaderArg {
    fn from(value: f64) -> Self {
        LoaderArg::Float(value)
    }
}

impl From<&str> for LoaderArg {
    fn from(value: &str) -> Self {
        LoaderArg::Str(value.to_owned())
    }
}

impl From<String> for LoaderArg {
    fn from(value: String) -> Self {
        LoaderArg::Str(value)
    }
}

impl From<Vec<u8>> for LoaderArg {
    fn from(value: Vec<u8>) -> Self {
        LoaderArg::Bytes(value)
    }
}

/// Registered callbacks of one cache.
pub(crate) struct Hooks<K, V> {
    added: Arc<[ItemCallback<K, V>]>,
    about_to_delete: Arc<[ItemCallback<K, V>]>,
    loader: Option<DataLoader<K, V>>,
}

impl<K, V> Hooks<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            added: Arc::from(Vec::new()),
            about_to_delete: Arc::from(Vec::new()),
            loader: None,
        }
    }

    pub(crate) fn added(&self) -> Arc<[ItemCallback<K, V>]> {
        Arc::clone(&self.added)
    }

    pub(crate) fn about_to_delete(&self) -> Arc<[ItemCallback<K, V>]> {
        Arc::clone(&self.about_to_delete)
    }

    pub(crate) fn loader(&self) -> Option<DataLoader<K, V>> {
        self.loader.clone()
    }

    pub(crate) fn set_added(&mut self, callback: ItemCallback<K, V>) {
        self.added = Arc::from(vec![callback]);
    }

    pub(crate) fn add_added(&mut self, callback: ItemCallback<K, V>) {
        self.added = appended(&self.added, callback);
    }

    pub(crate) fn clear_added(&mut self) {
        self.added = Arc::from(Vec::new());
    }

    pub(crate) fn set_about_to_delete(&mut self, callback: ItemCallback<K, V>) {
        self.about_to_delete = Arc::from(vec![callback]);
    }

    pub(crate) fn add_about_to_delete(&mut self, callback: ItemCallback<K, V>) {
        self.about_to_delete = appended(&self.about_to_delete, callback);
    }

    pub(crate) fn clear_about_to_delete(&mut self) {
        self.about_to_delete = Arc::from(Vec::new());
    }

    pub(crate) fn set_loader(&mut self, loader: DataLoader<K, V>) {
        self.loader = Some(loader);
    }

    pub(crate) fn clear_loader(&mut self) {
        self.loader = None;
    }
}

impl<K, V> Default for Hooks<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Hooks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("added", &self.added.len())
            .field("about_to_delete", &self.about_to_delete.len())
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

fn appended<K, V>(
    current: &[ItemCallback<K, V>],
    callback: ItemCallback<K, V>,
) -> Arc<[ItemCallback<K, V>]> {
    let mut list = Vec::with_capacity(current.len() + 1);
    list.extend(current.iter().cloned());
    list.push(callback);
    Arc::from(list)
}

/// Fires every callback in registration order.
pub(crate) fn notify<K, V>(callbacks: &[ItemCallback<K, V>], item: &Arc<CacheItem<K, V>>) {
    for callback in callbacks {
        callback(item);
    }
}
