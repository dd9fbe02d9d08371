//! RedBlackTree: classic self-balancing binary search tree over a node slab.
//!
//! Nodes carry parent back-links as [`NodeId`]s rather than pointers; the
//! slab owns every node and a parent link is never used for destruction.
//! Insert and delete fixups follow the textbook case analysis with the
//! left/right mirror images folded into a [`Dir`] parameter.
//!
//! A `NodeId` returned by the tree behaves like an iterator position: it
//! stays valid across inserts and across erasure of other elements, and
//! `None` plays the role of `end()`.

use crate::error::{SlabExhausted, TreeInvariantError};
use crate::slab::{NodeId, NodeSlab, SlabAllocator, SlotAllocator};
use core::cmp::Ordering;
use core::fmt;
use core::ops::Bound;

/// Strict weak ordering used to arrange tree elements.
pub trait Compare<T: ?Sized> {
    fn less(&self, a: &T, b: &T) -> bool;
}

/// Orders by `Ord`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OrdLess;

impl<T: Ord + ?Sized> Compare<T> for OrdLess {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// Three-way comparison derived from a `less` predicate.
#[inline]
pub(crate) fn ordering<T: ?Sized, C: Compare<T>>(cmp: &C, a: &T, b: &T) -> Ordering {
    if cmp.less(a, b) {
        Ordering::Less
    } else if cmp.less(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    fn flip(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A tree node as stored in the slab.
#[derive(Clone, Debug)]
pub struct RbNode<T> {
    value: T,
    color: Color,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

impl<T> RbNode<T> {
    fn new(value: T, parent: Option<NodeId>) -> Self {
        Self {
            value,
            color: Color::Red,
            left: None,
            right: None,
            parent,
        }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Option<NodeId> {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    #[inline]
    fn child_mut(&mut self, dir: Dir) -> &mut Option<NodeId> {
        match dir {
            Dir::Left => &mut self.left,
            Dir::Right => &mut self.right,
        }
    }
}

pub struct RedBlackTree<T, C = OrdLess, A: SlabAllocator = SlotAllocator> {
    nodes: A::Slab<RbNode<T>>,
    root: Option<NodeId>,
    len: usize,
    cmp: C,
}

impl<T> RedBlackTree<T> {
    pub fn new() -> Self {
        Self::with_compare(OrdLess)
    }
}

impl<T, C: Default, A: SlabAllocator> Default for RedBlackTree<T, C, A> {
    fn default() -> Self {
        Self::with_compare(C::default())
    }
}

// Structural helpers and navigation; none of these consult the comparator.
impl<T, C, A: SlabAllocator> RedBlackTree<T, C, A> {
    pub fn with_compare(cmp: C) -> Self {
        Self {
            nodes: A::new_slab(),
            root: None,
            len: 0,
            cmp,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn compare(&self) -> &C {
        &self.cmp
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    #[inline]
    fn node(&self, id: NodeId) -> &RbNode<T> {
        self.nodes.get(id).expect("linked node id must be live")
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut RbNode<T> {
        self.nodes.get_mut(id).expect("linked node id must be live")
    }

    #[inline]
    fn color_of(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |id| self.node(id).color)
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    #[inline]
    fn child(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        self.node(id).child(dir)
    }

    #[inline]
    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Which side of `parent` holds `id`.
    #[inline]
    fn side_of(&self, id: NodeId, parent: NodeId) -> Dir {
        if self.node(parent).left == Some(id) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    /// Point whatever referenced `old` from `parent` (or the root) at `new`.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let dir = self.side_of(old, p);
                *self.node_mut(p).child_mut(dir) = new;
            }
        }
    }

    /// Rotate `x` towards `dir`: `Dir::Left` lifts the right child.
    fn rotate(&mut self, x: NodeId, dir: Dir) {
        let rising = dir.flip();
        let y = self
            .child(x, rising)
            .expect("rotation needs a child on the rising side");
        let inner = self.child(y, dir);
        *self.node_mut(x).child_mut(rising) = inner;
        if let Some(b) = inner {
            self.node_mut(b).parent = Some(x);
        }
        let xp = self.parent(x);
        self.node_mut(y).parent = xp;
        self.replace_child(xp, x, Some(y));
        *self.node_mut(y).child_mut(dir) = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    /// Put `v` where `u` hangs; `u` keeps its own links.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let up = self.parent(u);
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.node_mut(v).parent = up;
        }
    }

    fn extreme_from(&self, mut id: NodeId, dir: Dir) -> NodeId {
        while let Some(next) = self.child(id, dir) {
            id = next;
        }
        id
    }

    /// In-order neighbour of `id` towards `dir`.
    fn step(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        if let Some(c) = node.child(dir) {
            return Some(self.extreme_from(c, dir.flip()));
        }
        let mut cur = id;
        let mut parent = node.parent;
        while let Some(p) = parent {
            if self.child(p, dir) != Some(cur) {
                return Some(p);
            }
            cur = p;
            parent = self.parent(p);
        }
        None
    }

    /// Smallest element.
    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|r| self.extreme_from(r, Dir::Left))
    }

    /// Largest element; also what stepping back from `end()` reaches.
    pub fn last(&self) -> Option<NodeId> {
        self.root.map(|r| self.extreme_from(r, Dir::Right))
    }

    /// In-order successor; `None` is `end()`.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.step(id, Dir::Right)
    }

    /// In-order predecessor; `None` before the first element.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.step(id, Dir::Left)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.value)
    }

    /// Mutable access for adapters that only touch non-key parts.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|n| &mut n.value)
    }

    pub fn iter(&self) -> Iter<'_, T, C, A> {
        Iter::new(self, self.first(), self.last())
    }

    /// Iterate the inclusive id span `[front, back]`.
    pub(crate) fn iter_span(&self, front: Option<NodeId>, back: Option<NodeId>) -> Iter<'_, T, C, A> {
        Iter::new(self, front, back)
    }

    pub fn cursor_front(&self) -> Cursor<'_, T, C, A> {
        self.cursor_at(self.first())
    }

    pub fn cursor_end(&self) -> Cursor<'_, T, C, A> {
        self.cursor_at(None)
    }

    pub fn cursor_at(&self, pos: Option<NodeId>) -> Cursor<'_, T, C, A> {
        Cursor { tree: self, pos }
    }

    /// Remove the element at `id`. Returns its value and the id of the next
    /// element, or `None` when `id` is stale.
    pub fn erase(&mut self, z: NodeId) -> Option<(T, Option<NodeId>)> {
        self.nodes.get(z)?;
        let successor = self.next(z);

        let (zl, zr) = {
            let n = self.node(z);
            (n.left, n.right)
        };
        let mut removed_color = self.node(z).color;
        let x;
        let x_parent;
        match (zl, zr) {
            (None, _) => {
                x = zr;
                x_parent = self.parent(z);
                self.transplant(z, zr);
            }
            (Some(_), None) => {
                x = zl;
                x_parent = self.parent(z);
                self.transplant(z, zl);
            }
            (Some(l), Some(r)) => {
                let y = self.extreme_from(r, Dir::Left);
                removed_color = self.node(y).color;
                x = self.node(y).right;
                if self.parent(y) == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.parent(y);
                    self.transplant(y, x);
                    self.node_mut(y).right = Some(r);
                    self.node_mut(r).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(l);
                self.node_mut(l).parent = Some(y);
                let z_color = self.node(z).color;
                self.set_color(y, z_color);
            }
        }

        let removed = self
            .nodes
            .deallocate(z)
            .expect("erased node must still be in the slab");
        self.len -= 1;
        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
        Some((removed.value, successor))
    }

    /// Erase `[first, last)`; returns `last`.
    pub fn erase_range(&mut self, first: Option<NodeId>, last: Option<NodeId>) -> Option<NodeId> {
        let mut cur = first;
        while cur != last {
            let Some(id) = cur else { break };
            match self.erase(id) {
                Some((_, next)) => cur = next,
                None => break,
            }
        }
        last
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while let Some(p) = self.parent(z) {
            if self.node(p).color == Color::Black {
                break;
            }
            let g = self.parent(p).expect("red parent is never the root");
            let side = self.side_of(p, g);
            let uncle = self.child(g, side.flip());
            if self.color_of(uncle) == Color::Red {
                self.set_color(p, Color::Black);
                if let Some(u) = uncle {
                    self.set_color(u, Color::Black);
                }
                self.set_color(g, Color::Red);
                z = g;
            } else {
                let mut p = p;
                if self.child(p, side.flip()) == Some(z) {
                    z = p;
                    self.rotate(z, side);
                    p = self.parent(z).expect("rotated node has a parent");
                }
                self.set_color(p, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate(g, side.flip());
            }
        }
        if let Some(r) = self.root {
            self.set_color(r, Color::Black);
        }
    }

    /// Restore black height after removing a black node; `x` took its place
    /// under `parent` (both may be `None`).
    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && self.color_of(x) == Color::Black {
            let Some(p) = parent else { break };
            let side = if self.node(p).left == x {
                Dir::Left
            } else {
                Dir::Right
            };
            let mut w = self
                .child(p, side.flip())
                .expect("doubly black node has a sibling");
            if self.node(w).color == Color::Red {
                self.set_color(w, Color::Black);
                self.set_color(p, Color::Red);
                self.rotate(p, side);
                w = self
                    .child(p, side.flip())
                    .expect("doubly black node has a sibling");
            }
            let near = self.child(w, side);
            let far = self.child(w, side.flip());
            if self.color_of(near) == Color::Black && self.color_of(far) == Color::Black {
                self.set_color(w, Color::Red);
                x = Some(p);
                parent = self.parent(p);
            } else {
                if self.color_of(far) == Color::Black {
                    if let Some(n) = near {
                        self.set_color(n, Color::Black);
                    }
                    self.set_color(w, Color::Red);
                    self.rotate(w, side.flip());
                    w = self
                        .child(p, side.flip())
                        .expect("doubly black node has a sibling");
                }
                let p_color = self.node(p).color;
                self.set_color(w, p_color);
                self.set_color(p, Color::Black);
                if let Some(f) = self.child(w, side.flip()) {
                    self.set_color(f, Color::Black);
                }
                self.rotate(p, side);
                x = self.root;
                parent = None;
            }
        }
        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    /// First element for which `probe` is not `Less`.
    ///
    /// `probe` reports how an element orders relative to the sought key and
    /// must be consistent with the tree's ordering.
    pub fn lower_bound_by<F>(&self, mut probe: F) -> Option<NodeId>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let n = self.node(id);
            if probe(&n.value) == Ordering::Less {
                cur = n.right;
            } else {
                best = Some(id);
                cur = n.left;
            }
        }
        best
    }

    /// First element for which `probe` is `Greater`.
    pub fn upper_bound_by<F>(&self, mut probe: F) -> Option<NodeId>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let n = self.node(id);
            if probe(&n.value) == Ordering::Greater {
                best = Some(id);
                cur = n.left;
            } else {
                cur = n.right;
            }
        }
        best
    }

    pub fn find_by<F>(&self, mut probe: F) -> Option<NodeId>
    where
        F: FnMut(&T) -> Ordering,
    {
        let id = self.lower_bound_by(&mut probe)?;
        (probe(&self.node(id).value) == Ordering::Equal).then_some(id)
    }

    /// Resolve a key range to `(front, back, stop)`: the first and last
    /// element inside it and the element just past it. `None` when the
    /// range holds nothing, including reversed bounds.
    pub(crate) fn span<Q: ?Sized, F>(
        &self,
        start: Bound<&Q>,
        end: Bound<&Q>,
        order: F,
    ) -> Option<(NodeId, NodeId, Option<NodeId>)>
    where
        F: Fn(&T, &Q) -> Ordering,
    {
        let front = match start {
            Bound::Included(q) => self.lower_bound_by(|v| order(v, q)),
            Bound::Excluded(q) => self.upper_bound_by(|v| order(v, q)),
            Bound::Unbounded => self.first(),
        }?;
        let stop = match end {
            Bound::Included(q) => self.upper_bound_by(|v| order(v, q)),
            Bound::Excluded(q) => self.lower_bound_by(|v| order(v, q)),
            Bound::Unbounded => None,
        };
        let back = match stop {
            Some(s) => self.prev(s)?,
            None => self.last()?,
        };
        let back_value = &self.node(back).value;
        let inside = match start {
            Bound::Included(q) => order(back_value, q) != Ordering::Less,
            Bound::Excluded(q) => order(back_value, q) == Ordering::Greater,
            Bound::Unbounded => true,
        };
        inside.then_some((front, back, stop))
    }

    /// Check every structural invariant; intended for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), TreeInvariantError>
    where
        C: Compare<T>,
    {
        if let Some(r) = self.root {
            let root = self.nodes.get(r).ok_or(TreeInvariantError::ParentLink)?;
            if root.color == Color::Red {
                return Err(TreeInvariantError::RedRoot);
            }
            if root.parent.is_some() {
                return Err(TreeInvariantError::ParentLink);
            }
        }
        let (_, counted) = self.check_subtree(self.root)?;
        if counted != self.len || counted != self.nodes.len() {
            return Err(TreeInvariantError::Length {
                reported: self.len,
                counted,
            });
        }
        let mut prev: Option<&T> = None;
        for value in self.iter() {
            if let Some(p) = prev {
                if !self.cmp.less(p, value) {
                    return Err(TreeInvariantError::Order);
                }
            }
            prev = Some(value);
        }
        Ok(())
    }

    /// Black height (counting the null leaf) and node count of a subtree.
    fn check_subtree(&self, id: Option<NodeId>) -> Result<(usize, usize), TreeInvariantError> {
        let Some(id) = id else { return Ok((1, 0)) };
        let n = self.nodes.get(id).ok_or(TreeInvariantError::ParentLink)?;
        for child in [n.left, n.right].into_iter().flatten() {
            let c = self.nodes.get(child).ok_or(TreeInvariantError::ParentLink)?;
            if c.parent != Some(id) {
                return Err(TreeInvariantError::ParentLink);
            }
            if n.color == Color::Red && c.color == Color::Red {
                return Err(TreeInvariantError::RedRed);
            }
        }
        let (left, left_count) = self.check_subtree(n.left)?;
        let (right, right_count) = self.check_subtree(n.right)?;
        if left != right {
            return Err(TreeInvariantError::BlackHeight { left, right });
        }
        let own = usize::from(n.color == Color::Black);
        Ok((left + own, left_count + right_count + 1))
    }
}

impl<T, C, A> RedBlackTree<T, C, A>
where
    C: Compare<T>,
    A: SlabAllocator,
{
    /// Insert `value` unless an equivalent element exists.
    ///
    /// Returns the id of the element now holding the key and whether
    /// `value` was stored. A full slab is reported as `SlabExhausted` and
    /// leaves the tree untouched.
    pub fn insert(&mut self, value: T) -> Result<(NodeId, bool), SlabExhausted> {
        let mut parent = None;
        let mut dir = Dir::Left;
        let mut cur = self.root;
        while let Some(id) = cur {
            let n = self.node(id);
            parent = Some(id);
            if self.cmp.less(&value, &n.value) {
                dir = Dir::Left;
                cur = n.left;
            } else if self.cmp.less(&n.value, &value) {
                dir = Dir::Right;
                cur = n.right;
            } else {
                return Ok((id, false));
            }
        }

        let id = self
            .nodes
            .allocate(RbNode::new(value, parent))
            .map_err(|_| SlabExhausted)?;
        match parent {
            None => self.root = Some(id),
            Some(p) => *self.node_mut(p).child_mut(dir) = Some(id),
        }
        self.len += 1;
        self.insert_fixup(id);
        Ok((id, true))
    }

    /// Same as [`insert`](Self::insert); the value is built by the caller.
    #[inline]
    pub fn emplace(&mut self, value: T) -> Result<(NodeId, bool), SlabExhausted> {
        self.insert(value)
    }

    pub fn find(&self, value: &T) -> Option<NodeId> {
        self.find_by(|v| ordering(&self.cmp, v, value))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// First element not less than `value`.
    pub fn lower_bound(&self, value: &T) -> Option<NodeId> {
        self.lower_bound_by(|v| ordering(&self.cmp, v, value))
    }

    /// First element greater than `value`.
    pub fn upper_bound(&self, value: &T) -> Option<NodeId> {
        self.upper_bound_by(|v| ordering(&self.cmp, v, value))
    }

    pub fn equal_range(&self, value: &T) -> (Option<NodeId>, Option<NodeId>) {
        (self.lower_bound(value), self.upper_bound(value))
    }

    /// Erase the element equivalent to `value`.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let id = self.find(value)?;
        self.erase(id).map(|(v, _)| v)
    }
}

impl<T, C, A> Clone for RedBlackTree<T, C, A>
where
    C: Clone,
    A: SlabAllocator,
    A::Slab<RbNode<T>>: Clone,
{
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            len: self.len,
            cmp: self.cmp.clone(),
        }
    }
}

impl<T: fmt::Debug, C, A: SlabAllocator> fmt::Debug for RedBlackTree<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, C, A: SlabAllocator> IntoIterator for &'a RedBlackTree<T, C, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an inclusive span of nodes.
pub struct Iter<'a, T, C, A: SlabAllocator> {
    tree: &'a RedBlackTree<T, C, A>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    done: bool,
}

impl<'a, T, C, A: SlabAllocator> Iter<'a, T, C, A> {
    fn new(tree: &'a RedBlackTree<T, C, A>, front: Option<NodeId>, back: Option<NodeId>) -> Self {
        Self {
            tree,
            front,
            back,
            done: front.is_none() || back.is_none(),
        }
    }
}

impl<'a, T, C, A: SlabAllocator> Iterator for Iter<'a, T, C, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.done {
            return None;
        }
        let tree = self.tree;
        let id = self.front?;
        if self.front == self.back {
            self.done = true;
        } else {
            self.front = tree.next(id);
        }
        Some(&tree.node(id).value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (1, Some(self.tree.len()))
        }
    }
}

impl<'a, T, C, A: SlabAllocator> DoubleEndedIterator for Iter<'a, T, C, A> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.done {
            return None;
        }
        let tree = self.tree;
        let id = self.back?;
        if self.front == self.back {
            self.done = true;
        } else {
            self.back = tree.prev(id);
        }
        Some(&tree.node(id).value)
    }
}

/// Bidirectional position in a tree; `None` is the past-the-end position.
///
/// Stepping forward from the last element reaches the end; stepping back
/// from the end reaches the last element, and stepping back from the first
/// element also reaches the end.
pub struct Cursor<'a, T, C, A: SlabAllocator> {
    tree: &'a RedBlackTree<T, C, A>,
    pos: Option<NodeId>,
}

impl<'a, T, C, A: SlabAllocator> Cursor<'a, T, C, A> {
    pub fn id(&self) -> Option<NodeId> {
        self.pos
    }

    pub fn get(&self) -> Option<&'a T> {
        let tree = self.tree;
        self.pos.and_then(|id| tree.get(id))
    }

    pub fn move_next(&mut self) {
        self.pos = match self.pos {
            Some(id) => self.tree.next(id),
            None => self.tree.first(),
        };
    }

    pub fn move_prev(&mut self) {
        self.pos = match self.pos {
            Some(id) => self.tree.prev(id),
            None => self.tree.last(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slab::BoundedAllocator;

    fn build(values: &[i32]) -> RedBlackTree<i32> {
        let mut t = RedBlackTree::new();
        for &v in values {
            t.insert(v).unwrap();
            t.check_invariants().unwrap();
        }
        t
    }

    fn contents<C, A: SlabAllocator>(t: &RedBlackTree<i32, C, A>) -> Vec<i32> {
        t.iter().copied().collect()
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let t = build(&(0..256).collect::<Vec<_>>());
        assert_eq!(t.len(), 256);
        assert_eq!(contents(&t), (0..256).collect::<Vec<_>>());
        let (bh, _) = t.check_subtree(t.root).unwrap();
        // 256 nodes need at most 2*log2(257) levels; black height bounds it.
        assert!(bh <= 9, "black height {bh}");
    }

    #[test]
    fn duplicate_insert_returns_existing() {
        let mut t = build(&[5, 3, 8]);
        let (id, inserted) = t.insert(3).unwrap();
        assert!(!inserted);
        assert_eq!(t.get(id), Some(&3));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn erase_two_child_root_keeps_invariants() {
        let mut t = build(&[10, 5, 15, 3, 7, 12, 18, 1, 4, 6, 8, 11, 13, 17, 20]);
        let ten = t.find(&10).unwrap();
        let (value, next) = t.erase(ten).unwrap();
        assert_eq!(value, 10);
        assert_eq!(next.and_then(|id| t.get(id)), Some(&11));
        t.check_invariants().unwrap();
        assert_eq!(
            contents(&t),
            vec![1, 3, 4, 5, 6, 7, 8, 11, 12, 13, 15, 17, 18, 20]
        );
    }

    #[test]
    fn erase_every_element_in_mixed_order() {
        let values: Vec<i32> = (0..100).map(|i| (i * 37) % 100).collect();
        let mut t = build(&values);
        for (n, v) in values.iter().rev().enumerate() {
            assert_eq!(t.remove(v), Some(*v));
            t.check_invariants().unwrap();
            assert_eq!(t.len(), 99 - n);
        }
        assert!(t.is_empty());
        assert_eq!(t.first(), None);
    }

    #[test]
    fn stale_id_is_rejected() {
        let mut t = build(&[1, 2, 3]);
        let two = t.find(&2).unwrap();
        assert!(t.erase(two).is_some());
        assert!(t.erase(two).is_none());
        assert!(t.get(two).is_none());
        t.check_invariants().unwrap();
    }

    #[test]
    fn bounds_and_equal_range() {
        let t = build(&[10, 20, 30, 40]);
        let val = |id: Option<NodeId>| id.and_then(|id| t.get(id)).copied();
        assert_eq!(val(t.lower_bound(&20)), Some(20));
        assert_eq!(val(t.lower_bound(&21)), Some(30));
        assert_eq!(val(t.upper_bound(&20)), Some(30));
        assert_eq!(val(t.upper_bound(&40)), None);
        assert_eq!(val(t.lower_bound(&5)), Some(10));
        let (lo, hi) = t.equal_range(&30);
        assert_eq!((val(lo), val(hi)), (Some(30), Some(40)));
        let (lo, hi) = t.equal_range(&25);
        assert_eq!(lo, hi);
    }

    #[test]
    fn cursor_steps_back_from_end_to_maximum() {
        let t = build(&[2, 9, 4]);
        let mut c = t.cursor_end();
        assert_eq!(c.get(), None);
        c.move_prev();
        assert_eq!(c.get(), Some(&9));
        c.move_prev();
        assert_eq!(c.get(), Some(&4));
        c.move_next();
        c.move_next();
        assert_eq!(c.id(), None);
    }

    #[test]
    fn double_ended_iteration_meets_in_the_middle() {
        let t = build(&[1, 2, 3, 4, 5]);
        let mut it = t.iter();
        assert_eq!(it.next(), Some(&1));
        assert_eq!(it.next_back(), Some(&5));
        assert_eq!(it.next(), Some(&2));
        assert_eq!(it.next_back(), Some(&4));
        assert_eq!(it.next(), Some(&3));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
        assert_eq!(t.iter().rev().copied().collect::<Vec<_>>(), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn erase_range_removes_half_open_span() {
        let mut t = build(&(0..20).collect::<Vec<_>>());
        let first = t.find(&5);
        let last = t.find(&15);
        let after = t.erase_range(first, last);
        assert_eq!(after.and_then(|id| t.get(id)), Some(&15));
        t.check_invariants().unwrap();
        let expected: Vec<i32> = (0..5).chain(15..20).collect();
        assert_eq!(contents(&t), expected);
    }

    #[test]
    fn closure_comparator_orders_descending() {
        let mut t: RedBlackTree<i32, _> = RedBlackTree::with_compare(|a: &i32, b: &i32| a > b);
        for v in [3, 1, 4, 1, 5, 9, 2, 6] {
            t.insert(v).unwrap();
        }
        t.check_invariants().unwrap();
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![9, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn bounded_slab_reports_exhaustion_and_recovers() {
        let mut t: RedBlackTree<i32, OrdLess, BoundedAllocator<3>> = RedBlackTree::default();
        for v in [1, 2, 3] {
            t.insert(v).unwrap();
        }
        assert_eq!(t.insert(4), Err(SlabExhausted));
        // A duplicate needs no allocation.
        assert!(matches!(t.insert(2), Ok((_, false))));
        t.check_invariants().unwrap();
        assert_eq!(t.len(), 3);
        t.remove(&1);
        assert!(t.insert(4).unwrap().1);
        assert_eq!(contents(&t), vec![2, 3, 4]);
    }

    #[test]
    fn clone_is_independent() {
        let mut a = build(&[1, 2, 3]);
        let b = a.clone();
        a.remove(&2);
        assert_eq!(contents(&a), vec![1, 3]);
        assert_eq!(contents(&b), vec![1, 2, 3]);
        b.check_invariants().unwrap();
    }

    #[test]
    fn checker_flags_a_red_root() {
        let mut t = build(&[1, 2]);
        let r = t.root.unwrap();
        t.set_color(r, Color::Red);
        assert_eq!(t.check_invariants(), Err(TreeInvariantError::RedRoot));
    }
}
