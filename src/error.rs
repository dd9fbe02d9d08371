//! Error types shared by the containers.

use thiserror::Error;

/// The hash map could not find a slot for a key even after growing.
///
/// Unreachable while the load factor keeps free slots available; it is
/// surfaced instead of handing out a shared fallback value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("no free slot for key in a table of {capacity} buckets")]
pub struct CapacityError {
    pub capacity: usize,
}

/// A node slab refused to allocate another node.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("node slab exhausted")]
pub struct SlabExhausted;

/// A structural red-black invariant does not hold.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TreeInvariantError {
    #[error("root node is red")]
    RedRoot,
    #[error("red node has a red child")]
    RedRed,
    #[error("black height differs between paths ({left} vs {right})")]
    BlackHeight { left: usize, right: usize },
    #[error("child does not point back at its parent")]
    ParentLink,
    #[error("in-order traversal is not strictly increasing")]
    Order,
    #[error("tree reports {reported} elements but holds {counted}")]
    Length { reported: usize, counted: usize },
}
