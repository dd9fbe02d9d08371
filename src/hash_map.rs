//! HashMap: open addressing with tombstones and in-place compaction.
//!
//! Buckets live in a `SmallVec` that stays inline up to `N` slots. Slot
//! state is tracked in [`SlotBits`]; a bucket holds `Some(entry)` exactly
//! when its occupied bit is set.
//!
//! Before each insertion the table checks
//! `(len + tombstones) * 256 > capacity * load_factor_byte`. When it trips
//! and tombstones outnumber live entries, the entries are redistributed
//! inside the current buckets; otherwise the bucket count doubles. A table
//! under insert/remove churn therefore stays at a fixed size.

use crate::error::CapacityError;
use crate::hash::{EqualTo, FastHash, KeyEq, KeyHasher};
use crate::slot_bits::{SlotBits, SlotState};
use bitvec::vec::BitVec;
use core::borrow::Borrow;
use core::fmt;
use core::ops::Index;
use smallvec::SmallVec;

/// Inline bucket count used when none is given.
pub const DEFAULT_INLINE: usize = 8;

const DEFAULT_LOAD_FACTOR: f32 = 0.7;

/// Probes done quadratically before falling back to linear probing.
const QUADRATIC_PROBES: usize = 8;

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

type Buckets<K, V, const N: usize> = SmallVec<[Option<Entry<K, V>>; N]>;

/// Result of probing for a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    /// The key lives at this index.
    Found(usize),
    /// The key is absent; it belongs at this index (a tombstone when one
    /// was passed on the way).
    Vacant(usize),
    /// Every probe hit a live entry.
    Full,
}

impl Slot {
    fn placement(self) -> Option<Placement> {
        match self {
            Slot::Found(idx) => Some(Placement::Existing(idx)),
            Slot::Vacant(idx) => Some(Placement::New(idx)),
            Slot::Full => None,
        }
    }
}

/// Where an insertion lands once a slot is secured.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Placement {
    Existing(usize),
    New(usize),
}

/// Probe sequence over a power-of-two table.
///
/// Tables of up to 8 slots probe linearly. Larger tables probe
/// `h + i + i*i` for the first 8 steps and then walk linearly from
/// `h + 8` across the whole table.
struct Probe {
    home: usize,
    mask: usize,
    step: usize,
    limit: usize,
    quadratic: bool,
}

impl Probe {
    fn new(hash: u32, capacity: usize) -> Self {
        let quadratic = capacity > QUADRATIC_PROBES;
        Self {
            home: hash as usize & (capacity - 1),
            mask: capacity - 1,
            step: 0,
            limit: if quadratic {
                capacity + QUADRATIC_PROBES
            } else {
                capacity
            },
            quadratic,
        }
    }
}

impl Iterator for Probe {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.step >= self.limit {
            return None;
        }
        let i = self.step;
        self.step += 1;
        let offset = if self.quadratic && i < QUADRATIC_PROBES {
            i + i * i
        } else {
            i
        };
        Some(self.home.wrapping_add(offset) & self.mask)
    }
}

fn empty_buckets<K, V, const N: usize>(capacity: usize) -> Buckets<K, V, N> {
    core::iter::repeat_with(|| None).take(capacity).collect()
}

/// Smallest stored load factor, 1/8. Below it every insert would grow.
const MIN_LOAD_FACTOR_BYTE: u8 = 32;

fn load_factor_byte(f: f32) -> u8 {
    // NaN clamps to 0 and then rises to the floor.
    ((f.clamp(0.0, 1.0) * 255.0) as u8).max(MIN_LOAD_FACTOR_BYTE)
}

pub struct HashMap<K, V, H = FastHash, E = EqualTo, const N: usize = DEFAULT_INLINE> {
    buckets: Buckets<K, V, N>,
    slots: SlotBits,
    size: usize,
    tombstones: usize,
    load_factor: u8,
    hasher: H,
    eq: E,
}

impl<K, V> HashMap<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INLINE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_load_factor(capacity, DEFAULT_LOAD_FACTOR)
    }

    /// `capacity` is rounded up to a power of two; `max_load` is clamped to
    /// `[1/8, 1.0]`.
    pub fn with_capacity_and_load_factor(capacity: usize, max_load: f32) -> Self {
        Self::with_hasher_and_eq(capacity, max_load, FastHash, EqualTo)
    }
}

impl<K, V, H, E, const N: usize> Default for HashMap<K, V, H, E, N>
where
    H: Default,
    E: Default,
{
    fn default() -> Self {
        Self::with_hasher_and_eq(N, DEFAULT_LOAD_FACTOR, H::default(), E::default())
    }
}

impl<K, V, H, E, const N: usize> HashMap<K, V, H, E, N> {
    pub fn with_hasher_and_eq(capacity: usize, max_load: f32, hasher: H, eq: E) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            buckets: empty_buckets(capacity),
            slots: SlotBits::new(capacity),
            size: 0,
            tombstones: 0,
            load_factor: load_factor_byte(max_load),
            hasher,
            eq,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Removed slots still holding a tombstone.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Whether the bucket array still lives inline.
    pub fn is_inline(&self) -> bool {
        !self.buckets.spilled()
    }

    pub fn load_factor(&self) -> f32 {
        f32::from(self.load_factor) / 255.0
    }

    /// Takes effect at the next insert; clamped like the constructor.
    pub fn set_load_factor(&mut self, max_load: f32) {
        self.load_factor = load_factor_byte(max_load);
    }

    /// Drop every entry and tombstone; the bucket count is kept.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = None);
        self.slots.reset();
        self.size = 0;
        self.tombstones = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.buckets.iter(),
            remaining: self.size,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.buckets.iter_mut(),
            remaining: self.size,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Keep only the entries for which `keep` returns true. Removed entries
    /// become tombstones.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for idx in 0..self.buckets.len() {
            let drop_it = match self.buckets[idx].as_mut() {
                Some(e) => !keep(&e.key, &mut e.value),
                None => false,
            };
            if drop_it {
                let _ = self.remove_at(idx);
            }
        }
    }

    fn needs_rehash(&self) -> bool {
        let used = (self.size + self.tombstones) as u128;
        let limit = self.capacity() as u128 * u128::from(self.load_factor);
        (used << 8) > limit
    }

    /// Take the entry at `idx`, leaving a tombstone.
    pub(crate) fn remove_at(&mut self, idx: usize) -> Option<(K, V)> {
        let entry = self.buckets[idx].take()?;
        self.slots.mark_deleted(idx);
        self.size -= 1;
        self.tombstones += 1;
        Some((entry.key, entry.value))
    }

    pub(crate) fn value_at_mut(&mut self, idx: usize) -> &mut V {
        &mut self.buckets[idx]
            .as_mut()
            .expect("occupied slot must hold an entry")
            .value
    }

    /// Remove the entry whose value minimises `f`.
    pub(crate) fn remove_min_by_key<T, F>(&mut self, mut f: F) -> Option<(K, V)>
    where
        T: Ord,
        F: FnMut(&V) -> T,
    {
        let idx = self
            .buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|e| (i, f(&e.value))))
            .min_by(|a, b| a.1.cmp(&b.1))
            .map(|(i, _)| i)?;
        self.remove_at(idx)
    }

    /// Place a new entry in a slot returned as `Vacant`.
    fn occupy(&mut self, idx: usize, key: K, value: V) {
        debug_assert!(!self.slots.is_occupied(idx), "vacant slot is occupied");
        if self.slots.state(idx) == SlotState::Deleted {
            self.tombstones -= 1;
        }
        self.slots.mark_occupied(idx);
        self.buckets[idx] = Some(Entry { key, value });
        self.size += 1;
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert!(!self.slots.overlaps(), "slot both occupied and deleted");
        assert_eq!(self.slots.occupied_count(), self.size);
        assert_eq!(self.slots.deleted_count(), self.tombstones);
        assert!(self.capacity().is_power_of_two());
        for (i, b) in self.buckets.iter().enumerate() {
            assert_eq!(b.is_some(), self.slots.is_occupied(i), "bucket {i}");
        }
    }
}

impl<K, V, H, E, const N: usize> HashMap<K, V, H, E, N>
where
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
    /// Insert or overwrite; returns the previous value for `key`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, CapacityError> {
        match self.prepare_slot(&key)? {
            Placement::Existing(idx) => {
                Ok(Some(core::mem::replace(self.value_at_mut(idx), value)))
            }
            Placement::New(idx) => {
                self.occupy(idx, key, value);
                Ok(None)
            }
        }
    }

    /// Look up `key`, inserting `make()` first when absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> Result<&mut V, CapacityError>
    where
        F: FnOnce() -> V,
    {
        if let Some(idx) = self.find_index(&key) {
            return Ok(self.value_at_mut(idx));
        }
        let idx = match self.prepare_slot(&key)? {
            Placement::Existing(idx) => idx,
            Placement::New(idx) => {
                self.occupy(idx, key, make());
                idx
            }
        };
        Ok(self.value_at_mut(idx))
    }

    /// Place `key`, already looked up and found absent, and return its slot.
    pub(crate) fn insert_absent(&mut self, key: K, value: V) -> Result<usize, CapacityError> {
        match self.prepare_slot(&key)? {
            Placement::Existing(idx) => {
                *self.value_at_mut(idx) = value;
                Ok(idx)
            }
            Placement::New(idx) => {
                self.occupy(idx, key, value);
                Ok(idx)
            }
        }
    }

    /// Indexing with default construction of missing values.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, CapacityError>
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Grow so that `additional` more keys fit under the load factor.
    pub fn reserve(&mut self, additional: usize) -> Result<(), CapacityError> {
        let wanted = self.size + self.tombstones + additional;
        let mut capacity = self.capacity();
        while (wanted as u128) << 8 > capacity as u128 * u128::from(self.load_factor) {
            capacity = capacity
                .checked_mul(2)
                .ok_or(CapacityError { capacity })?;
        }
        if capacity != self.capacity() {
            self.rehash(capacity)?;
        }
        Ok(())
    }

    /// Rehash check, then probe; retries once after doubling when the probe
    /// comes back `Full`.
    fn prepare_slot(&mut self, key: &K) -> Result<Placement, CapacityError> {
        if self.needs_rehash() {
            if self.tombstones > self.size {
                self.rehash_in_place();
            } else {
                self.grow()?;
            }
        }
        if let Some(placement) = self.find_slot(key).placement() {
            return Ok(placement);
        }
        self.grow()?;
        match self.find_slot(key).placement() {
            Some(placement) => Ok(placement),
            None => {
                debug_assert!(false, "no slot after growing to {}", self.capacity());
                Err(CapacityError {
                    capacity: self.capacity(),
                })
            }
        }
    }

    fn find_slot(&self, key: &K) -> Slot {
        let mut first_tomb = None;
        for idx in Probe::new(self.hasher.hash_key(key), self.capacity()) {
            match self.slots.state(idx) {
                SlotState::Empty => return Slot::Vacant(first_tomb.unwrap_or(idx)),
                SlotState::Deleted => {
                    first_tomb.get_or_insert(idx);
                }
                SlotState::Occupied => {
                    if let Some(e) = &self.buckets[idx] {
                        if self.eq.key_eq(&e.key, key) {
                            return Slot::Found(idx);
                        }
                    }
                }
            }
        }
        first_tomb.map_or(Slot::Full, Slot::Vacant)
    }

    fn grow(&mut self) -> Result<(), CapacityError> {
        let capacity = self.capacity();
        let doubled = capacity
            .checked_mul(2)
            .ok_or(CapacityError { capacity })?;
        self.rehash(doubled)
    }

    /// Move every live entry into a fresh table of `new_capacity` buckets.
    fn rehash(&mut self, new_capacity: usize) -> Result<(), CapacityError> {
        let new_capacity = new_capacity.max(1).next_power_of_two();
        let old = core::mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        self.slots = SlotBits::new(new_capacity);
        self.size = 0;
        self.tombstones = 0;

        #[cfg(feature = "defmt")]
        defmt::trace!("hash map grows to {=usize} buckets", new_capacity);

        for Entry { key, value } in old.into_iter().flatten() {
            match self.find_slot(&key) {
                Slot::Vacant(idx) => self.occupy(idx, key, value),
                Slot::Found(_) | Slot::Full => {
                    debug_assert!(false, "rehash could not place a live entry");
                    return Err(CapacityError {
                        capacity: new_capacity,
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop all tombstones without changing the bucket count.
    ///
    /// Live entries are first packed to the front, then each one is moved
    /// to the first slot of its probe sequence not yet claimed in the
    /// scratch bitset. Displaced entries are swapped out and placed in turn,
    /// so every entry moves at most once more.
    fn rehash_in_place(&mut self) {
        let capacity = self.capacity();

        let mut packed = 0;
        for idx in 0..capacity {
            if self.buckets[idx].is_some() {
                if idx != packed {
                    self.buckets.swap(idx, packed);
                }
                packed += 1;
            }
        }
        debug_assert_eq!(packed, self.size);
        self.slots.reset();

        let mut claimed: BitVec = BitVec::repeat(false, capacity);
        for idx in 0..packed {
            while !claimed[idx] {
                let hash = match &self.buckets[idx] {
                    Some(e) => self.hasher.hash_key(&e.key),
                    None => break,
                };
                let target = Probe::new(hash, capacity)
                    .find(|&slot| !claimed[slot])
                    .expect("a table with unclaimed slots has a free probe target");
                claimed.set(target, true);
                if target != idx {
                    // Whatever sat at `target` is unclaimed; it lands here
                    // and is placed on the next turn of the loop.
                    self.buckets.swap(idx, target);
                }
            }
        }

        self.tombstones = 0;
        self.slots.set_occupied(claimed);

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "hash map compacted in place: {=usize} live in {=usize} buckets",
            self.size,
            capacity
        );
    }
}

impl<K, V, H, E, const N: usize> HashMap<K, V, H, E, N> {
    pub(crate) fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        for idx in Probe::new(self.hasher.hash_key(key), self.capacity()) {
            match self.slots.state(idx) {
                SlotState::Empty => return None,
                SlotState::Deleted => {}
                SlotState::Occupied => {
                    if let Some(e) = &self.buckets[idx] {
                        if self.eq.key_eq(e.key.borrow(), key) {
                            return Some(idx);
                        }
                    }
                }
            }
        }
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let idx = self.find_index(key)?;
        self.buckets[idx].as_ref().map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let idx = self.find_index(key)?;
        self.buckets[idx].as_mut().map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.find_index(key).is_some()
    }

    /// Remove `key`, leaving a tombstone. Never shrinks the table.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        let idx = self.find_index(key)?;
        self.remove_at(idx)
    }

    /// Alias of [`remove`](Self::remove) reporting only whether the key was present.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.remove_entry(key).is_some()
    }
}

/// Copies hold live entries only: no tombstones and no spare buckets
/// beyond what the load factor needs.
impl<K, V, H, E, const N: usize> Clone for HashMap<K, V, H, E, N>
where
    K: Clone,
    V: Clone,
    H: KeyHasher<K> + Clone,
    E: KeyEq<K> + Clone,
{
    fn clone(&self) -> Self {
        let mut out = Self::with_hasher_and_eq(
            self.size,
            self.load_factor(),
            self.hasher.clone(),
            self.eq.clone(),
        );
        out.load_factor = self.load_factor;
        for (k, v) in self.iter() {
            if out.insert(k.clone(), v.clone()).is_err() {
                debug_assert!(false, "clone could not place a live entry");
            }
        }
        out
    }
}

impl<K, V, H, E, const N: usize> fmt::Debug for HashMap<K, V, H, E, N>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, H, E, const N: usize> Index<&Q> for HashMap<K, V, H, E, N>
where
    K: Borrow<Q>,
    Q: ?Sized,
    H: KeyHasher<Q>,
    E: KeyEq<Q>,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in HashMap")
    }
}

/// Iterator over `(&K, &V)`; walks every bucket.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Option<Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.it.by_ref() {
            if let Some(e) = bucket {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Option<Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for bucket in self.it.by_ref() {
            if let Some(e) = bucket {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator.
pub struct IntoIter<K, V, const N: usize> {
    it: smallvec::IntoIter<[Option<Entry<K, V>>; N]>,
}

impl<K, V, const N: usize> Iterator for IntoIter<K, V, N> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.it.next()? {
                return Some((e.key, e.value));
            }
        }
    }
}

impl<K, V, H, E, const N: usize> IntoIterator for HashMap<K, V, H, E, N> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, N>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.buckets.into_iter(),
        }
    }
}

impl<'a, K, V, H, E, const N: usize> IntoIterator for &'a HashMap<K, V, H, E, N> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
