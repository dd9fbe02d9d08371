//! RbMap: ordered map over [`RedBlackTree`] storing `(K, V)` pairs.
//!
//! The tree's comparator is wrapped in [`KeyCompare`], which orders pairs by
//! key alone, so a value never takes part in placement.

use crate::error::SlabExhausted;
use crate::rb_tree::{self, ordering, Compare, OrdLess, RbNode, RedBlackTree};
use crate::slab::{NodeId, SlabAllocator, SlotAllocator};
use core::cmp::Ordering;
use core::fmt;
use core::ops::{Index, RangeBounds};

/// Orders `(K, V)` pairs by their key with an inner key comparator.
#[derive(Copy, Clone, Debug, Default)]
pub struct KeyCompare<C>(pub C);

impl<K, V, C: Compare<K>> Compare<(K, V)> for KeyCompare<C> {
    #[inline]
    fn less(&self, a: &(K, V), b: &(K, V)) -> bool {
        self.0.less(&a.0, &b.0)
    }
}

#[doc(alias = "MapRedBlackTree")]
pub struct RbMap<K, V, C = OrdLess, A: SlabAllocator = SlotAllocator> {
    tree: RedBlackTree<(K, V), KeyCompare<C>, A>,
}

impl<K: Ord, V> RbMap<K, V> {
    pub fn new() -> Self {
        Self::with_compare(OrdLess)
    }
}

impl<K, V, C: Default, A: SlabAllocator> Default for RbMap<K, V, C, A> {
    fn default() -> Self {
        Self::with_compare(C::default())
    }
}

impl<K, V, C, A: SlabAllocator> RbMap<K, V, C, A> {
    pub fn with_compare(cmp: C) -> Self {
        Self {
            tree: RedBlackTree::with_compare(KeyCompare(cmp)),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, C, A> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Visit every entry in key order with mutable access to the value.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V),
    {
        let mut cur = self.tree.first();
        while let Some(id) = cur {
            cur = self.tree.next(id);
            if let Some((k, v)) = self.tree.get_mut(id) {
                f(k, v);
            }
        }
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tree.first())
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tree.last())
    }

    /// Entry stored under `id`, as returned by the inserting calls.
    pub fn entry_at(&self, id: Option<NodeId>) -> Option<(&K, &V)> {
        id.and_then(|id| self.tree.get(id)).map(|(k, v)| (k, v))
    }

    /// Erase the entry at `id`; yields the pair and the next entry's id.
    pub fn erase(&mut self, id: NodeId) -> Option<((K, V), Option<NodeId>)> {
        self.tree.erase(id)
    }

    fn value_mut_at(&mut self, id: NodeId) -> &mut V {
        let (_, v) = self
            .tree
            .get_mut(id)
            .expect("id returned by the tree must be live");
        v
    }
}

impl<K, V, C, A> RbMap<K, V, C, A>
where
    C: Compare<K>,
    A: SlabAllocator,
{
    fn key_order(&self) -> impl Fn(&(K, V), &K) -> Ordering + '_ {
        let cmp = &self.tree.compare().0;
        move |(k, _): &(K, V), key: &K| ordering(cmp, k, key)
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let order = self.key_order();
        self.tree.find_by(|entry| order(entry, key))
    }

    /// Insert when `key` is absent; an existing value is left untouched.
    /// Returns the entry's id and whether the pair was stored.
    pub fn insert(&mut self, key: K, value: V) -> Result<(NodeId, bool), SlabExhausted> {
        self.tree.insert((key, value))
    }

    /// Insert, or overwrite the value of an existing key.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Result<(NodeId, bool), SlabExhausted> {
        match self.find(&key) {
            Some(id) => {
                *self.value_mut_at(id) = value;
                Ok((id, false))
            }
            None => self.tree.insert((key, value)),
        }
    }

    /// Build a value with `make` only when `key` is absent.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> Result<(NodeId, bool), SlabExhausted>
    where
        F: FnOnce() -> V,
    {
        match self.find(&key) {
            Some(id) => Ok((id, false)),
            None => self.tree.insert((key, make())),
        }
    }

    /// Value for `key`, inserting `V::default()` first when absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, SlabExhausted>
    where
        V: Default,
    {
        let (id, _) = self.try_emplace(key, V::default)?;
        Ok(self.value_mut_at(id))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let id = self.find(key)?;
        self.tree.get(id).map(|(_, v)| v)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.entry_at(self.find(key))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find(key)?;
        Some(self.value_mut_at(id))
    }

    /// Checked access.
    ///
    /// # Panics
    /// Panics when `key` is absent.
    pub fn at(&self, key: &K) -> &V {
        self.get(key).expect("key not present in map")
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let id = self.find(key)?;
        self.tree.erase(id).map(|(pair, _)| pair)
    }

    /// Remove every entry whose key lies in `range`; returns how many went.
    pub fn remove_range<R: RangeBounds<K>>(&mut self, range: R) -> usize {
        let order = self.key_order();
        let Some((front, _, stop)) = self.tree.span(range.start_bound(), range.end_bound(), order)
        else {
            return 0;
        };
        let before = self.tree.len();
        self.tree.erase_range(Some(front), stop);
        before - self.tree.len()
    }

    /// First entry whose key is not less than `key`.
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        let order = self.key_order();
        self.entry_at(self.tree.lower_bound_by(|entry| order(entry, key)))
    }

    /// First entry whose key is greater than `key`.
    pub fn upper_bound(&self, key: &K) -> Option<(&K, &V)> {
        let order = self.key_order();
        self.entry_at(self.tree.upper_bound_by(|entry| order(entry, key)))
    }

    /// Entries equivalent to `key`: at most one.
    pub fn equal_range(&self, key: &K) -> Iter<'_, K, V, C, A> {
        self.range(key..=key)
    }

    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Iter<'_, K, V, C, A> {
        let order = self.key_order();
        let inner = match self.tree.span(range.start_bound(), range.end_bound(), order) {
            Some((front, back, _)) => self.tree.iter_span(Some(front), Some(back)),
            None => self.tree.iter_span(None, None),
        };
        Iter { inner }
    }
}

impl<K, V, C, A> Index<&K> for RbMap<K, V, C, A>
where
    C: Compare<K>,
    A: SlabAllocator,
{
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.at(key)
    }
}

impl<K, V, C, A> Clone for RbMap<K, V, C, A>
where
    C: Clone,
    A: SlabAllocator,
    A::Slab<RbNode<(K, V)>>: Clone,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, A: SlabAllocator> fmt::Debug for RbMap<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C, A: SlabAllocator> IntoIterator for &'a RbMap<K, V, C, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, K, V, C, A: SlabAllocator> {
    inner: rb_tree::Iter<'a, (K, V), KeyCompare<C>, A>,
}

impl<'a, K, V, C, A: SlabAllocator> Iterator for Iter<'a, K, V, C, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, C, A: SlabAllocator> DoubleEndedIterator for Iter<'a, K, V, C, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k, v))
    }
}
