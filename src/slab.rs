//! Node slabs for the red-black tree.
//!
//! A [`SlabAllocator`] names a family of slabs through a generic associated
//! type, so the tree can ask for storage of its own node type while callers
//! only pick the allocator. Nodes are addressed by [`NodeId`], a
//! generational `slotmap` key: a stale id never aliases a newer node.

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a tree node; valid until that node is erased.
    pub struct NodeId;
}

/// Fixed-element-size storage addressed by [`NodeId`].
pub trait NodeSlab<N> {
    /// Store `node`, or hand it back when the slab is full.
    fn allocate(&mut self, node: N) -> Result<NodeId, N>;
    fn deallocate(&mut self, id: NodeId) -> Option<N>;
    fn get(&self, id: NodeId) -> Option<&N>;
    fn get_mut(&mut self, id: NodeId) -> Option<&mut N>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&mut self);
}

/// Factory for slabs of any node type.
pub trait SlabAllocator {
    type Slab<N>: NodeSlab<N>;

    fn new_slab<N>() -> Self::Slab<N>;
}

/// Unbounded slab backed by a `SlotMap`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotAllocator;

#[derive(Clone, Debug)]
pub struct SlotSlab<N> {
    nodes: SlotMap<NodeId, N>,
}

impl<N> NodeSlab<N> for SlotSlab<N> {
    #[inline]
    fn allocate(&mut self, node: N) -> Result<NodeId, N> {
        Ok(self.nodes.insert(node))
    }

    #[inline]
    fn deallocate(&mut self, id: NodeId) -> Option<N> {
        self.nodes.remove(id)
    }

    #[inline]
    fn get(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(id)
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(id)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl SlabAllocator for SlotAllocator {
    type Slab<N> = SlotSlab<N>;

    fn new_slab<N>() -> SlotSlab<N> {
        SlotSlab {
            nodes: SlotMap::with_key(),
        }
    }
}

/// Slab holding at most `CAP` nodes, reserved up front; further
/// allocations are refused.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundedAllocator<const CAP: usize>;

#[derive(Clone, Debug)]
pub struct BoundedSlab<N, const CAP: usize> {
    nodes: SlotMap<NodeId, N>,
}

impl<N, const CAP: usize> NodeSlab<N> for BoundedSlab<N, CAP> {
    fn allocate(&mut self, node: N) -> Result<NodeId, N> {
        if self.nodes.len() >= CAP {
            return Err(node);
        }
        Ok(self.nodes.insert(node))
    }

    fn deallocate(&mut self, id: NodeId) -> Option<N> {
        self.nodes.remove(id)
    }

    fn get(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(id)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(id)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<const CAP: usize> SlabAllocator for BoundedAllocator<CAP> {
    type Slab<N> = BoundedSlab<N, CAP>;

    fn new_slab<N>() -> BoundedSlab<N, CAP> {
        BoundedSlab {
            nodes: SlotMap::with_capacity_and_key(CAP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_slab_round_trip_and_stale_ids() {
        let mut slab = SlotAllocator::new_slab::<&'static str>();
        let a = slab.allocate("a").unwrap();
        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab.deallocate(a), Some("a"));
        let b = slab.allocate("b").unwrap();
        assert_ne!(a, b);
        assert!(slab.get(a).is_none(), "stale id must not resolve");
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn bounded_slab_refuses_past_capacity() {
        let mut slab = BoundedAllocator::<2>::new_slab::<u32>();
        let a = slab.allocate(1).unwrap();
        slab.allocate(2).unwrap();
        assert_eq!(slab.allocate(3), Err(3));
        slab.deallocate(a);
        assert!(slab.allocate(3).is_ok());
        slab.clear();
        assert!(slab.is_empty());
    }
}
