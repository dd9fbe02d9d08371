//! Per-slot state for the open-addressing table, kept in two bit vectors.
//!
//! A slot is `Empty` (no bit), `Occupied` (occupied bit) or `Deleted`
//! (deleted bit, a tombstone). The two bits are never set together.

use bitvec::vec::BitVec;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SlotState {
    Empty,
    Occupied,
    Deleted,
}

#[derive(Clone, Debug)]
pub(crate) struct SlotBits {
    occupied: BitVec,
    deleted: BitVec,
}

impl SlotBits {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            occupied: BitVec::repeat(false, capacity),
            deleted: BitVec::repeat(false, capacity),
        }
    }

    #[inline]
    pub(crate) fn state(&self, idx: usize) -> SlotState {
        if self.occupied[idx] {
            SlotState::Occupied
        } else if self.deleted[idx] {
            SlotState::Deleted
        } else {
            SlotState::Empty
        }
    }

    #[inline]
    pub(crate) fn is_occupied(&self, idx: usize) -> bool {
        self.occupied[idx]
    }

    #[inline]
    pub(crate) fn mark_occupied(&mut self, idx: usize) {
        self.deleted.set(idx, false);
        self.occupied.set(idx, true);
    }

    #[inline]
    pub(crate) fn mark_deleted(&mut self, idx: usize) {
        self.occupied.set(idx, false);
        self.deleted.set(idx, true);
    }

    /// Every slot back to `Empty`, keeping the length.
    pub(crate) fn reset(&mut self) {
        self.occupied.fill(false);
        self.deleted.fill(false);
    }

    /// Replace the occupancy bits wholesale; the new vector must have the
    /// same length and no tombstones may remain.
    pub(crate) fn set_occupied(&mut self, occupied: BitVec) {
        debug_assert_eq!(occupied.len(), self.occupied.len());
        debug_assert!(self.deleted.not_any());
        self.occupied = occupied;
    }

    #[cfg(test)]
    pub(crate) fn occupied_count(&self) -> usize {
        self.occupied.count_ones()
    }

    #[cfg(test)]
    pub(crate) fn deleted_count(&self) -> usize {
        self.deleted.count_ones()
    }

    #[cfg(test)]
    pub(crate) fn overlaps(&self) -> bool {
        self.occupied
            .iter_ones()
            .any(|idx| self.deleted[idx])
    }
}
