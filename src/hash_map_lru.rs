//! HashMapLru: a bounded HashMap that evicts the least recently used entry.
//!
//! Every successful `insert`, `get`, `get_mut` and `get_or_insert_default`
//! stamps the entry with the next tick of a logical clock. Eviction scans
//! all entries for the smallest stamp, which keeps the structure to a
//! single table at the cost of O(n) eviction.
//!
//! Clock wrap: when the `u32` clock is exhausted, entries are renumbered
//! `1..=len` in their current access order and the clock resumes from
//! `len`, so the relative order survives arbitrarily long runs.

use crate::error::CapacityError;
use crate::hash::{EqualTo, FastHash, KeyEq, KeyHasher};
use crate::hash_map::{HashMap, DEFAULT_INLINE};
use core::borrow::Borrow;
use core::fmt;

#[derive(Clone, Debug)]
struct Stamped<V> {
    value: V,
    last_access_time: u32,
}

pub struct HashMapLru<K, V, H = FastHash, E = EqualTo, const N: usize = DEFAULT_INLINE> {
    map: HashMap<K, Stamped<V>, H, E, N>,
    max_size: usize,
    current_time: u32,
}

impl<K, V> HashMapLru<K, V> {
    pub fn new(max_size: usize) -> Self {
        Self::with_hasher_and_eq(max_size, FastHash, EqualTo)
    }
}

impl<K, V, H, E, const N: usize> HashMapLru<K, V, H, E, N> {
    /// A bound of zero still admits the entry being inserted; it is evicted
    /// by the next insertion of a different key.
    pub fn with_hasher_and_eq(max_size: usize, hasher: H, eq: E) -> Self {
        Self {
            map: HashMap::with_hasher_and_eq(max_size, 0.7, hasher, eq),
            max_size,
            current_time: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries kept.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the bound. Shrinking evicts oldest entries until the map
    /// fits; growing keeps every entry.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.map.len() > self.max_size {
            if self.evict_oldest().is_none() {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Entries in table order; does not touch access times.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter().map(|(k, s)| (k, &s.value))
    }

    /// Remove the entry with the oldest access time.
    pub fn evict_oldest(&mut self) -> Option<(K, V)> {
        self.take_oldest().map(|(key, stamped)| (key, stamped.value))
    }

    fn take_oldest(&mut self) -> Option<(K, Stamped<V>)> {
        let (key, stamped) = self.map.remove_min_by_key(|s| s.last_access_time)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("lru evicts entry stamped {=u32}", stamped.last_access_time);
        Some((key, stamped))
    }

    fn tick(&mut self) -> u32 {
        if self.current_time == u32::MAX {
            self.renumber();
        }
        self.current_time += 1;
        self.current_time
    }

    fn renumber(&mut self) {
        let mut stamps: Vec<&mut u32> = self
            .map
            .values_mut()
            .map(|s| &mut s.last_access_time)
            .collect();
        stamps.sort_unstable_by_key(|t| **t);
        for (rank, stamp) in stamps.iter_mut().enumerate() {
            **stamp = rank as u32 + 1;
        }
        self.current_time = stamps.len() as u32;
    }

    #[cfg(test)]
    fn set_clock(&mut self, t: u32) {
        self.current_time = t;
    }
}

impl<K, V, H, E, const N: usize> HashMapLru<K, V, H, E, N>
where
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
    /// Insert or update `key`. A new key evicts the oldest entry first when
    /// the map is full; updating an existing key never evicts. If the
    /// table cannot take the new key, the evicted entry is put back.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, CapacityError> {
        if let Some(idx) = self.map.find_index(&key) {
            let now = self.tick();
            let slot = self.map.value_at_mut(idx);
            slot.last_access_time = now;
            return Ok(Some(core::mem::replace(&mut slot.value, value)));
        }
        let last_access_time = self.tick();
        self.insert_new(
            key,
            Stamped {
                value,
                last_access_time,
            },
        )?;
        Ok(None)
    }

    /// Look up `key`, inserting `V::default()` when absent; touches the entry.
    /// Eviction follows `insert`.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, CapacityError>
    where
        V: Default,
    {
        let now = self.tick();
        let idx = match self.map.find_index(&key) {
            Some(idx) => idx,
            None => self.insert_new(
                key,
                Stamped {
                    value: V::default(),
                    last_access_time: now,
                },
            )?,
        };
        let slot = self.map.value_at_mut(idx);
        slot.last_access_time = now;
        Ok(&mut slot.value)
    }

    fn insert_new(&mut self, key: K, stamped: Stamped<V>) -> Result<usize, CapacityError> {
        let evicted = if self.map.len() >= self.max_size {
            self.take_oldest()
        } else {
            None
        };
        self.map.insert_absent(key, stamped).map_err(|err| {
            self.put_back(evicted);
            err
        })
    }

    /// Reinstate an entry taken by `take_oldest`, keeping its stamp.
    fn put_back(&mut self, evicted: Option<(K, Stamped<V>)>) {
        if let Some((key, stamped)) = evicted {
            // Best effort: the failed insert left the table unchanged.
            let _ = self.map.insert_absent(key, stamped);
        }
    }
}

impl<K, V, H, E, const N: usize> HashMapLru<K, V, H, E, N> {
    /// Look up `key` and mark it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.get_mut(key).map(|v| &*v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let idx = self.map.find_index(key)?;
        let now = self.tick();
        let slot = self.map.value_at_mut(idx);
        slot.last_access_time = now;
        Some(&mut slot.value)
    }

    /// Look up `key` without changing its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.map.get(key).map(|s| &s.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.map.contains_key(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.map.remove(key).map(|s| s.value)
    }
}

impl<K, V, H, E, const N: usize> fmt::Debug for HashMapLru<K, V, H, E, N>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamps<K: Ord + Copy, V>(lru: &HashMapLru<K, V>) -> Vec<(K, u32)> {
        let mut out: Vec<(K, u32)> = lru
            .map
            .iter()
            .map(|(k, s)| (*k, s.last_access_time))
            .collect();
        out.sort_by_key(|(_, t)| *t);
        out
    }

    #[test]
    fn every_touch_advances_the_clock() {
        let mut lru: HashMapLru<u32, u32> = HashMapLru::new(4);
        lru.insert(1, 10).unwrap();
        lru.insert(2, 20).unwrap();
        assert_eq!(lru.get(&1), Some(&10));
        assert_eq!(stamps(&lru), vec![(2, 2), (1, 3)]);
        // A miss does not tick.
        assert_eq!(lru.get(&9), None);
        lru.insert(2, 21).unwrap();
        assert_eq!(stamps(&lru), vec![(1, 3), (2, 4)]);
    }

    #[test]
    fn peek_does_not_touch() {
        let mut lru: HashMapLru<u32, u32> = HashMapLru::new(2);
        lru.insert(1, 1).unwrap();
        lru.insert(2, 2).unwrap();
        assert_eq!(lru.peek(&1), Some(&1));
        lru.insert(3, 3).unwrap();
        assert!(!lru.contains_key(&1));
        assert!(lru.contains_key(&2));
    }

    #[test]
    fn clock_wrap_renumbers_in_access_order() {
        let mut lru: HashMapLru<u32, &'static str> = HashMapLru::new(3);
        lru.insert(1, "a").unwrap();
        lru.insert(2, "b").unwrap();
        lru.insert(3, "c").unwrap();
        lru.get(&1);
        lru.set_clock(u32::MAX);
        // Next tick renumbers 2,3,1 to 1,2,3 and stamps key 2 with 4.
        lru.get(&2);
        assert_eq!(stamps(&lru), vec![(3, 2), (1, 3), (2, 4)]);
        lru.insert(4, "d").unwrap();
        assert!(!lru.contains_key(&3));
        assert_eq!(lru.len(), 3);
    }

    #[test]
    fn new_key_at_capacity_evicts_exactly_one() {
        let mut lru: HashMapLru<u32, u32> = HashMapLru::new(3);
        for k in 1..=3 {
            lru.insert(k, k).unwrap();
        }
        *lru.get_or_insert_default(1).unwrap() += 1;
        assert_eq!(lru.len(), 3);
        *lru.get_or_insert_default(4).unwrap() += 1;
        assert_eq!(stamps(&lru), vec![(3, 3), (1, 4), (4, 5)]);
        assert_eq!(lru.peek(&4), Some(&1));
        lru.insert(5, 5).unwrap();
        assert_eq!(stamps(&lru), vec![(1, 4), (4, 5), (5, 6)]);
    }

    #[test]
    fn put_back_restores_the_taken_entry() {
        let mut lru: HashMapLru<u32, u32> = HashMapLru::new(2);
        lru.insert(1, 10).unwrap();
        lru.insert(2, 20).unwrap();
        let taken = lru.take_oldest();
        assert_eq!(lru.len(), 1);
        lru.put_back(taken);
        assert_eq!(stamps(&lru), vec![(1, 1), (2, 2)]);
        assert_eq!(lru.peek(&1), Some(&10));
        lru.map.assert_consistent();
    }

    #[test]
    fn zero_bound_keeps_only_the_latest_key() {
        let mut lru: HashMapLru<u32, u32> = HashMapLru::new(0);
        lru.insert(1, 1).unwrap();
        lru.insert(2, 2).unwrap();
        assert_eq!(lru.len(), 1);
        assert!(lru.contains_key(&2));
    }
}
