//! Frequency buckets for O(1) LFU bookkeeping.
//!
//! Tracks, for every resident key, its access frequency and its recency
//! position among the keys that share that frequency. Insert, touch, remove
//! and eviction are all O(1), independent of how high frequencies climb.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        FrequencyBuckets<K> Layout                           │
//! │                                                                             │
//! │   ┌─────────────────────────────┐   ┌─────────────────────────────────┐     │
//! │   │  index: HashMap<K, NodeId>  │   │  nodes: NodePool<K>             │     │
//! │   │  (key → bucket position)    │   │                                 │     │
//! │   │  "apple"  ──► n0 ───────────┼───┼─► n0 │ freq:5, prev/next        │     │
//! │   │  "banana" ──► n1 ───────────┼───┼─► n1 │ freq:1, prev/next        │     │
//! │   │  "cherry" ──► n2 ───────────┼───┼─► n2 │ freq:1, prev/next        │     │
//! │   └─────────────────────────────┘   └─────────────────────────────────┘     │
//! │                                                                             │
//! │   buckets: HashMap<u64, Bucket>                                             │
//! │                                                                             │
//! │     lowest ──► freq=1: head ──► [n2] ◄──► [n1] ◄── tail                     │
//! │                  │ higher        newest    oldest (evicted first)           │
//! │                  ▼                                                          │
//! │     highest ─► freq=5: head ──► [n0] ◄── tail                               │
//! │                                                                             │
//! │     freq=2..=4: kept, empty, not linked                                     │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bucket lifecycle
//!
//! Buckets are created lazily the first time a key reaches their frequency
//! and stay in the map when they empty out; only [`FrequencyBuckets::clear`]
//! drops them. Because keys enter at frequency 1 and climb one level per
//! touch, the created levels are always exactly `1..=max_freq`.
//!
//! ## Populated-level list
//!
//! Non-empty buckets are chained in ascending order through their
//! `lower`/`higher` links. The head of that chain is the minimum frequency
//! and the tail is the highest populated one.
//!
//! - insert: a new key lands at level 1, which becomes the head.
//! - touch: level `f + 1` is linked directly above `f` when it first fills,
//!   and `f` is unlinked if the move emptied it.
//! - remove / pop: an emptied level is unlinked; its `higher` neighbour
//!   becomes the minimum when it was the head.
//!
//! No operation scans frequency values, so a key touched millions of times
//! costs nothing on later evictions.
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::ds::FrequencyBuckets;
//!
//! let mut freq = FrequencyBuckets::new();
//! freq.insert("apple");
//! freq.insert("banana");
//! freq.insert("cherry");
//!
//! freq.touch(&"apple");
//! freq.touch(&"apple");
//!
//! // Lowest frequency first, oldest among ties
//! assert_eq!(freq.pop_min(), Some(("banana", 1)));
//! assert_eq!(freq.pop_min(), Some(("cherry", 1)));
//! assert_eq!(freq.pop_min(), Some(("apple", 3)));
//! assert_eq!(freq.pop_min(), None);
//! ```
//!
//! ## Thread Safety
//!
//! Not thread-safe; [`LfuCache`](crate::policy::lfu::LfuCache) guards it with
//! its structural lock.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::InvariantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

/// Bucket list node. Link fields are touched on every move, so they lead.
#[derive(Debug)]
struct Node<K> {
    prev: Option<NodeId>,
    next: Option<NodeId>,
    freq: u64,
    key: K,
}

/// Recycling node storage; a `NodeId` stays valid until its node is released.
#[derive(Debug)]
struct NodePool<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    live: usize,
}

impl<K> NodePool<K> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    fn alloc(&mut self, node: Node<K>) -> NodeId {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(node);
            return NodeId(idx);
        }
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    fn release(&mut self, id: NodeId) -> Option<Node<K>> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(node)
    }

    #[inline]
    fn get(&self, id: NodeId) -> Option<&Node<K>> {
        self.slots.get(id.0)?.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K>> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    /// Neighbouring populated levels; meaningful only while `len > 0`.
    lower: Option<u64>,
    higher: Option<u64>,
}

/// O(1) LFU tracker with recency tie-breaking inside each frequency.
///
/// # Example
///
/// ```
/// use freqcache::ds::FrequencyBuckets;
///
/// let mut freq = FrequencyBuckets::new();
/// freq.insert("a");
/// freq.insert("b");
/// freq.touch(&"a");
///
/// assert_eq!(freq.frequency(&"a"), Some(2));
/// assert_eq!(freq.frequency(&"b"), Some(1));
/// assert_eq!(freq.min_freq(), Some(1));
/// assert_eq!(freq.peek_min(), Some(&"b"));
/// ```
pub struct FrequencyBuckets<K> {
    nodes: NodePool<K>,
    index: FxHashMap<K, NodeId>,
    buckets: FxHashMap<u64, Bucket>,
    lowest: Option<u64>,
    highest: Option<u64>,
    max_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tracker with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodePool::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            lowest: None,
            highest: None,
            max_freq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.live
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.live == 0
    }

    /// Returns the current frequency of `key`.
    #[inline]
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = self.index.get(key)?;
        self.nodes.get(*id).map(|node| node.freq)
    }

    /// Returns the lowest populated frequency, or `None` when empty.
    #[inline]
    pub fn min_freq(&self) -> Option<u64> {
        self.lowest
    }

    /// Returns the next eviction candidate without removing it.
    pub fn peek_min(&self) -> Option<&K> {
        let id = self.buckets.get(&self.lowest?)?.tail?;
        self.nodes.get(id).map(|node| &node.key)
    }

    /// Tracks a new key at frequency 1, at the head of that bucket.
    ///
    /// Returns `false` (and changes nothing) if the key is already tracked.
    ///
    /// ```
    /// use freqcache::ds::FrequencyBuckets;
    ///
    /// let mut freq = FrequencyBuckets::new();
    /// assert!(freq.insert("a"));
    /// assert!(!freq.insert("a"));
    /// assert_eq!(freq.frequency(&"a"), Some(1));
    /// ```
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        let id = self.nodes.alloc(Node {
            prev: None,
            next: None,
            freq: 1,
            key: key.clone(),
        });
        self.index.insert(key, id);

        let was_empty = self.bucket_len(1) == 0;
        self.attach_front(1, id);
        if was_empty {
            self.link_level(1, None);
        }
        true
    }

    /// Moves `key` one frequency level up and returns the new frequency.
    ///
    /// The key becomes the most recent entry of its new bucket. Returns
    /// `None` if the key is not tracked. At `u64::MAX` the frequency
    /// saturates and only the recency position is refreshed.
    ///
    /// ```
    /// use freqcache::ds::FrequencyBuckets;
    ///
    /// let mut freq = FrequencyBuckets::new();
    /// freq.insert("key");
    ///
    /// assert_eq!(freq.touch(&"key"), Some(2));
    /// assert_eq!(freq.touch(&"key"), Some(3));
    /// assert_eq!(freq.min_freq(), Some(3));
    /// assert_eq!(freq.touch(&"missing"), None);
    /// ```
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let old = self.nodes.get(id)?.freq;
        self.detach(old, id);

        if old == u64::MAX {
            self.attach_front(old, id);
            return Some(old);
        }

        let new = old + 1;
        if let Some(node) = self.nodes.get_mut(id) {
            node.freq = new;
        }
        let new_was_empty = self.bucket_len(new) == 0;
        self.attach_front(new, id);
        if new_was_empty {
            // `old` is still linked here, so `new` slots in right above it.
            self.link_level(new, Some(old));
        }
        if self.bucket_len(old) == 0 {
            self.unlink_level(old);
        }
        Some(new)
    }

    /// Stops tracking `key` and returns the frequency it had.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let id = self.index.remove(key)?;
        let freq = self.nodes.get(id)?.freq;
        self.detach(freq, id);
        self.nodes.release(id);
        if self.bucket_len(freq) == 0 {
            self.unlink_level(freq);
        }
        Some(freq)
    }

    /// Removes and returns the eviction candidate `(key, freq)`.
    ///
    /// The candidate is the least recently touched key of the lowest
    /// populated frequency.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        let freq = self.lowest?;
        let id = self.buckets.get(&freq)?.tail?;
        self.detach(freq, id);
        let node = self.nodes.release(id)?;
        self.index.remove(&node.key);
        if self.bucket_len(freq) == 0 {
            self.unlink_level(freq);
        }
        Some((node.key, freq))
    }

    /// Drops every key and every bucket.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.buckets.clear();
        self.lowest = None;
        self.highest = None;
        self.max_freq = 0;
    }

    /// Iterates `(key, freq)` from the highest frequency down, most recent
    /// first within a level. Empty levels are never visited.
    ///
    /// ```
    /// use freqcache::ds::FrequencyBuckets;
    ///
    /// let mut freq = FrequencyBuckets::new();
    /// for key in ["a", "b", "c"] {
    ///     freq.insert(key);
    /// }
    /// freq.touch(&"a");
    /// freq.touch(&"a");
    /// freq.touch(&"c");
    ///
    /// let order: Vec<_> = freq.iter_descending().map(|(k, _)| *k).collect();
    /// assert_eq!(order, vec!["a", "c", "b"]);
    /// ```
    pub fn iter_descending(&self) -> impl Iterator<Item = (&K, u64)> + '_ {
        std::iter::successors(self.highest, move |freq| {
            self.buckets.get(freq).and_then(|bucket| bucket.lower)
        })
        .flat_map(move |freq| self.iter_bucket(freq).map(move |key| (key, freq)))
    }

    /// Verifies the structural invariants of the tracker.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.nodes.live {
            return Err(InvariantError::new(format!(
                "index has {} keys but pool holds {} nodes",
                self.index.len(),
                self.nodes.live
            )));
        }
        if self.buckets.len() as u64 != self.max_freq
            || self.buckets.keys().any(|freq| *freq == 0 || *freq > self.max_freq)
        {
            return Err(InvariantError::new(format!(
                "{} buckets exist but max_freq is {}",
                self.buckets.len(),
                self.max_freq
            )));
        }

        let mut total = 0usize;
        let mut populated = 0usize;
        let mut lowest_populated: Option<u64> = None;
        for (&freq, bucket) in &self.buckets {
            let count = self.check_bucket_links(freq, bucket)?;
            if count > 0 {
                populated += 1;
                lowest_populated = Some(lowest_populated.map_or(freq, |low| low.min(freq)));
            }
            total += count;
        }

        if total != self.nodes.live {
            return Err(InvariantError::new(format!(
                "buckets link {total} nodes but pool holds {}",
                self.nodes.live
            )));
        }
        if self.lowest != lowest_populated {
            return Err(InvariantError::new(format!(
                "min_freq is {:?} but lowest populated bucket is {lowest_populated:?}",
                self.lowest
            )));
        }

        let mut chained = 0usize;
        let mut previous: Option<u64> = None;
        let mut current = self.lowest;
        while let Some(freq) = current {
            let bucket = self
                .buckets
                .get(&freq)
                .ok_or_else(|| InvariantError::new(format!("linked level {freq} has no bucket")))?;
            if bucket.len == 0 {
                return Err(InvariantError::new(format!("empty level {freq} is linked")));
            }
            if bucket.lower != previous || previous.is_some_and(|prev| prev >= freq) {
                return Err(InvariantError::new(format!("level links out of order at {freq}")));
            }
            previous = Some(freq);
            current = bucket.higher;
            chained += 1;
        }
        if chained != populated || self.highest != previous {
            return Err(InvariantError::new(format!(
                "{chained} levels linked but {populated} populated"
            )));
        }
        Ok(())
    }

    fn check_bucket_links(&self, freq: u64, bucket: &Bucket) -> Result<usize, InvariantError> {
        let mut current = bucket.head;
        let mut last = None;
        let mut count = 0usize;
        while let Some(id) = current {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("dangling node in bucket {freq}")))?;
            if node.freq != freq {
                return Err(InvariantError::new(format!(
                    "node with freq {} linked into bucket {freq}",
                    node.freq
                )));
            }
            if node.prev != last {
                return Err(InvariantError::new(format!("broken back link in bucket {freq}")));
            }
            if self.index.get(&node.key) != Some(&id) {
                return Err(InvariantError::new(format!("index disagrees with bucket {freq}")));
            }
            last = Some(id);
            current = node.next;
            count += 1;
        }
        if bucket.tail != last || bucket.len != count {
            return Err(InvariantError::new(format!(
                "bucket {freq} records len {} but links {count}",
                bucket.len
            )));
        }
        Ok(count)
    }

    #[inline]
    fn bucket_len(&self, freq: u64) -> usize {
        self.buckets.get(&freq).map_or(0, |bucket| bucket.len)
    }

    fn iter_bucket(&self, freq: u64) -> BucketIter<'_, K> {
        BucketIter {
            nodes: &self.nodes,
            current: self.buckets.get(&freq).and_then(|bucket| bucket.head),
        }
    }

    fn bucket_mut(&mut self, freq: u64) -> &mut Bucket {
        if freq > self.max_freq {
            self.max_freq = freq;
        }
        self.buckets.entry(freq).or_default()
    }

    /// Chains the populated level `freq` directly above `lower` (or at the
    /// bottom when `lower` is `None`).
    fn link_level(&mut self, freq: u64, lower: Option<u64>) {
        let higher = match lower {
            Some(lower) => self.buckets.get(&lower).and_then(|bucket| bucket.higher),
            None => self.lowest,
        };

        let bucket = self.bucket_mut(freq);
        bucket.lower = lower;
        bucket.higher = higher;

        match lower.and_then(|lower| self.buckets.get_mut(&lower)) {
            Some(bucket) => bucket.higher = Some(freq),
            None => self.lowest = Some(freq),
        }
        match higher.and_then(|higher| self.buckets.get_mut(&higher)) {
            Some(bucket) => bucket.lower = Some(freq),
            None => self.highest = Some(freq),
        }
    }

    fn unlink_level(&mut self, freq: u64) {
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            return;
        };
        let (lower, higher) = (bucket.lower.take(), bucket.higher.take());

        match lower.and_then(|lower| self.buckets.get_mut(&lower)) {
            Some(bucket) => bucket.higher = higher,
            None => self.lowest = higher,
        }
        match higher.and_then(|higher| self.buckets.get_mut(&higher)) {
            Some(bucket) => bucket.lower = lower,
            None => self.highest = lower,
        }
    }

    fn attach_front(&mut self, freq: u64, id: NodeId) {
        let old_head = self.bucket_mut(freq).head;
        if let Some(node) = self.nodes.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(head) = old_head
            && let Some(node) = self.nodes.get_mut(head)
        {
            node.prev = Some(id);
        }

        let bucket = self.bucket_mut(freq);
        if old_head.is_none() {
            bucket.tail = Some(id);
        }
        bucket.head = Some(id);
        bucket.len += 1;
    }

    fn detach(&mut self, freq: u64, id: NodeId) {
        let Some((prev, next)) = self.nodes.get(id).map(|node| (node.prev, node.next)) else {
            return;
        };

        if let Some(prev) = prev
            && let Some(node) = self.nodes.get_mut(prev)
        {
            node.next = next;
        }
        if let Some(next) = next
            && let Some(node) = self.nodes.get_mut(next)
        {
            node.prev = prev;
        }
        if let Some(bucket) = self.buckets.get_mut(&freq) {
            if prev.is_none() {
                bucket.head = next;
            }
            if next.is_none() {
                bucket.tail = prev;
            }
            bucket.len = bucket.len.saturating_sub(1);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for FrequencyBuckets<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyBuckets")
            .field("len", &self.nodes.live)
            .field("buckets", &self.buckets.len())
            .field("min_freq", &self.lowest)
            .field("max_freq", &self.max_freq)
            .finish()
    }
}

/// Head-to-tail iterator over one frequency bucket.
struct BucketIter<'a, K> {
    nodes: &'a NodePool<K>,
    current: Option<NodeId>,
}

impl<'a, K> Iterator for BucketIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.current?)?;
        self.current = node.next;
        Some(&node.key)
    }
}
