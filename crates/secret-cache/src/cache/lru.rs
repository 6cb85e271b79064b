//! Bounded LRU store
//!
//! A fixed-capacity key/value map with least-recently-used eviction. Every
//! operation locks the store's single internal mutex, so one instance is one
//! mutual-exclusion domain; distinct stores never contend with each other.
//! Recency is tracked with an intrusive doubly-linked list over a slab of
//! nodes, keeping all operations O(1) amortized.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

/// Capacity used when a store is created with capacity zero.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Sentinel index for list ends.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

#[derive(Debug)]
struct LruState<K, V> {
    /// Key to slab index
    map: HashMap<K, usize>,
    /// Slab of list nodes; `None` slots are reusable
    nodes: Vec<Option<Node<K, V>>>,
    /// Reusable slab slots
    free: Vec<usize>,
    /// Most recently used
    head: usize,
    /// Least recently used
    tail: usize,
}

impl<K: Eq + Hash + Clone, V> LruState<K, V> {
    fn detach(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        if prev == NIL {
            self.head = next;
        } else if let Some(node) = self.nodes[prev].as_mut() {
            node.next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else if let Some(node) = self.nodes[next].as_mut() {
            node.prev = prev;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            if let Some(node) = self.nodes[old_head].as_mut() {
                node.prev = idx;
            }
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    /// Move an existing node to the most-recently-used position.
    fn touch(&mut self, idx: usize) {
        if self.head != idx {
            self.detach(idx);
            self.push_front(idx);
        }
    }

    fn insert_front(&mut self, key: K, value: V) -> usize {
        let node = Node {
            key,
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.push_front(idx);
        idx
    }

    fn remove_index(&mut self, idx: usize) -> Option<Node<K, V>> {
        self.detach(idx);
        let node = self.nodes[idx].take()?;
        self.free.push(idx);
        Some(node)
    }

    /// Evict the single least-recently-used entry.
    fn evict_lru(&mut self) {
        let tail = self.tail;
        if tail == NIL {
            return;
        }
        if let Some(node) = self.remove_index(tail) {
            self.map.remove(&node.key);
        }
    }
}

/// A bounded, thread-safe LRU cache.
///
/// `get` and `put` on an existing key move it to the most-recently-used
/// position. Inserting a new key while at capacity evicts exactly the
/// least-recently-used entry, so the size never exceeds the capacity.
#[derive(Debug)]
pub struct LruCache<K, V> {
    state: Mutex<LruState<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            state: Mutex::new(LruState {
                map: HashMap::new(),
                nodes: Vec::new(),
                free: Vec::new(),
                head: NIL,
                tail: NIL,
            }),
            capacity,
        }
    }

    /// Return the value mapped to `key`, marking it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.state.lock();
        let idx = *state.map.get(key)?;
        state.touch(idx);
        state.nodes[idx].as_ref().map(|node| node.value.clone())
    }

    /// Determine if the cache contains `key`, without touching recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.lock().map.contains_key(key)
    }

    /// Map `key` to `value`, evicting the least-recently-used entry if the
    /// insert would exceed capacity.
    pub fn put(&self, key: K, value: V) {
        let _ = self.get_and_put(key, value);
    }

    /// Map `key` to `value` and return the previously mapped value.
    pub fn get_and_put(&self, key: K, value: V) -> Option<V> {
        let mut state = self.state.lock();
        if let Some(&idx) = state.map.get(&key) {
            state.touch(idx);
            return state
                .nodes[idx]
                .as_mut()
                .map(|node| std::mem::replace(&mut node.value, value));
        }
        if state.map.len() >= self.capacity {
            state.evict_lru();
        }
        let idx = state.insert_front(key.clone(), value);
        state.map.insert(key, idx);
        None
    }

    /// Map `key` to `value` only if no mapping exists. Returns true if the
    /// mapping was made.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        let mut state = self.state.lock();
        if let Some(&idx) = state.map.get(&key) {
            state.touch(idx);
            return false;
        }
        if state.map.len() >= self.capacity {
            state.evict_lru();
        }
        let idx = state.insert_front(key.clone(), value);
        state.map.insert(key, idx);
        true
    }

    /// Remove `key` from the cache. Returns true if a mapping was removed.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_and_remove(key).is_some()
    }

    /// Remove `key` and return the previously mapped value.
    pub fn get_and_remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.state.lock();
        let idx = state.map.remove(key)?;
        state.remove_index(idx).map(|node| node.value)
    }

    /// Remove `key` only if it is currently mapped to `expected`. Returns
    /// true if the mapping was removed.
    pub fn remove_with_value<Q>(&self, key: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        let mut state = self.state.lock();
        let Some(&idx) = state.map.get(key) else {
            return false;
        };
        let matches = state.nodes[idx]
            .as_ref()
            .is_some_and(|node| &node.value == expected);
        if !matches {
            return false;
        }
        state.map.remove(key);
        state.remove_index(idx);
        true
    }

    /// Remove all cached entries.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.map.clear();
        state.nodes.clear();
        state.free.clear();
        state.head = NIL;
        state.tail = NIL;
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.state.lock().map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().map.is_empty()
    }

    /// Get the capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic() {
        let cache = LruCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = LruCache::new(2);

        cache.put("a", 1);
        cache.put("b", 2);

        // Access "a" to make it more recent
        cache.get("a");

        // Insert "c", should evict "b" (least recently used)
        cache.put("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None); // evicted
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_update() {
        let cache = LruCache::new(2);

        cache.put("a", 1);
        let old = cache.get_and_put("a", 10);

        assert_eq!(old, Some(1));
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_update_touches_recency() {
        let cache = LruCache::new(2);

        cache.put("a", 1);
        cache.put("b", 2);
        // Updating "a" makes "b" the eviction candidate
        cache.put("a", 10);
        cache.put("c", 3);

        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_put_if_absent() {
        let cache = LruCache::new(2);

        assert!(cache.put_if_absent("a", 1));
        assert!(!cache.put_if_absent("a", 2));
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn test_remove_variants() {
        let cache = LruCache::new(4);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert_eq!(cache.get_and_remove("b"), Some(2));
        assert_eq!(cache.get_and_remove("b"), None);

        assert!(!cache.remove_with_value("c", &99));
        assert_eq!(cache.get("c"), Some(3));
        assert!(cache.remove_with_value("c", &3));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_overflow_keeps_most_recent() {
        let cache = LruCache::new(5);

        for n in 0..25 {
            cache.put(n, n);
        }

        assert_eq!(cache.len(), 5);
        for n in 0..20 {
            assert_eq!(cache.get(&n), None);
        }
        for n in 20..25 {
            assert_eq!(cache.get(&n), Some(n));
        }
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let cache: LruCache<String, i32> = LruCache::new(0);
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_clear() {
        let cache = LruCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);

        // Reusable after clearing
        cache.put("c", 3);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_slot_reuse_after_removal() {
        let cache = LruCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.remove("a");
        cache.put("c", 3);
        cache.put("d", 4);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.get("d"), Some(4));
    }
}
