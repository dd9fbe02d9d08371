//! RbSet: ordered set over [`RedBlackTree`].
//!
//! Elements are only reachable through shared references; changing one in
//! place could break the ordering, so replacing an element means removing
//! it and inserting the new value.

use crate::error::SlabExhausted;
use crate::rb_tree::{self, ordering, Compare, OrdLess, RbNode, RedBlackTree};
use crate::slab::{SlabAllocator, SlotAllocator};
use core::fmt;
use core::ops::RangeBounds;

#[doc(alias = "SetRedBlackTree")]
pub struct RbSet<T, C = OrdLess, A: SlabAllocator = SlotAllocator> {
    tree: RedBlackTree<T, C, A>,
}

impl<T: Ord> RbSet<T> {
    pub fn new() -> Self {
        Self::with_compare(OrdLess)
    }
}

impl<T, C: Default, A: SlabAllocator> Default for RbSet<T, C, A> {
    fn default() -> Self {
        Self::with_compare(C::default())
    }
}

impl<T, C, A: SlabAllocator> RbSet<T, C, A> {
    pub fn with_compare(cmp: C) -> Self {
        Self {
            tree: RedBlackTree::with_compare(cmp),
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

    pub fn iter(&self) -> rb_tree::Iter<'_, T, C, A> {
        self.tree.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.tree.first().and_then(|id| self.tree.get(id))
    }

    pub fn last(&self) -> Option<&T> {
        self.tree.last().and_then(|id| self.tree.get(id))
    }
}

impl<T, C, A> RbSet<T, C, A>
where
    C: Compare<T>,
    A: SlabAllocator,
{
    /// Returns whether `value` was added; an equivalent element is kept.
    pub fn insert(&mut self, value: T) -> Result<bool, SlabExhausted> {
        self.tree.insert(value).map(|(_, inserted)| inserted)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.tree.contains(value)
    }

    /// The stored element equivalent to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.tree.find(value).and_then(|id| self.tree.get(id))
    }

    pub fn remove(&mut self, value: &T) -> bool {
        self.tree.remove(value).is_some()
    }

    /// Remove and return the stored element equivalent to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.tree.remove(value)
    }

    pub fn lower_bound(&self, value: &T) -> Option<&T> {
        self.tree.lower_bound(value).and_then(|id| self.tree.get(id))
    }

    pub fn upper_bound(&self, value: &T) -> Option<&T> {
        self.tree.upper_bound(value).and_then(|id| self.tree.get(id))
    }

    pub fn equal_range(&self, value: &T) -> rb_tree::Iter<'_, T, C, A> {
        self.range(value..=value)
    }

    pub fn range<R: RangeBounds<T>>(&self, range: R) -> rb_tree::Iter<'_, T, C, A> {
        let cmp = self.tree.compare();
        let span = self
            .tree
            .span(range.start_bound(), range.end_bound(), |v: &T, q: &T| {
                ordering(cmp, v, q)
            });
        match span {
            Some((front, back, _)) => self.tree.iter_span(Some(front), Some(back)),
            None => self.tree.iter_span(None, None),
        }
    }
}

impl<T, C, A> Clone for RbSet<T, C, A>
where
    C: Clone,
    A: SlabAllocator,
    A::Slab<RbNode<T>>: Clone,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T: fmt::Debug, C, A: SlabAllocator> fmt::Debug for RbSet<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}

impl<'a, T, C, A: SlabAllocator> IntoIterator for &'a RbSet<T, C, A> {
    type Item = &'a T;
    type IntoIter = rb_tree::Iter<'a, T, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C, A> Extend<T> for RbSet<T, C, A>
where
    C: Compare<T>,
    A: SlabAllocator,
{
    /// Elements the slab refuses are dropped; use `insert` to observe
    /// exhaustion.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if self.insert(value).is_err() {
                break;
            }
        }
    }
}
