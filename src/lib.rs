//! compact-containers: an open-addressing hash map, a bounded LRU map on
//! top of it, and a slab-backed red-black tree with map and set adapters,
//! sized for memory-constrained targets.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small set of associative containers whose memory use is
//!   predictable and whose small instances avoid the heap.
//! - Layers:
//!   - hash: 32/64-bit integer mixers, a pair combiner and MurmurHash3
//!     x86_32; `HashKey` routes each key type to the right one.
//!   - HashMap<K, V, H, E, N>: open addressing over an inline-first bucket
//!     array with tombstones and per-slot state bits.
//!   - HashMapLru<K, V, ...>: wraps HashMap values with a logical access
//!     stamp and evicts the stalest entry when full.
//!   - RedBlackTree<T, C, A>: nodes live in a slab chosen by the allocator
//!     `A`; RbMap and RbSet adapt it.
//!   - IdTracker<K>: a mutex around a HashMap handing out sequential ids.
//!
//! Constraints
//! - Single-threaded containers; no internal locking or atomics.
//! - No panics on the public paths except `Index`/`at` on a missing key.
//! - Small maps (capacity <= N buckets) never touch the heap for buckets.
//!
//! Probing and tombstones
//! - Capacity is a power of two. Tables of up to 8 buckets probe linearly.
//!   Larger tables try 8 quadratic offsets `h + i + i^2` first and then
//!   fall back to a linear sweep, so every bucket is reachable.
//! - Removal leaves a tombstone. Lookups probe past tombstones; inserts
//!   reuse the first tombstone seen when the key is absent.
//! - Before an insert the map rehashes: in place when tombstones outnumber
//!   live entries (capacity unchanged), otherwise into twice the capacity,
//!   once `(len + tombstones) * 256 > capacity * load_factor_byte`, where
//!   the load factor is stored as a byte in `32..=255` (at least 1/8).
//! - The in-place rehash packs live entries to the front and then swaps
//!   each into its home chain, so no second bucket array is allocated.
//!
//! LRU clock
//! - Every insert or successful lookup stamps the entry with the next tick
//!   of a `u32` clock. When the clock would wrap, stamps are renumbered in
//!   access order, which keeps eviction order intact.
//!
//! Tree storage
//! - Nodes are addressed by generational `NodeId`s from `slotmap`; parent
//!   links are plain ids, ownership stays with the slab.
//! - `SlabAllocator` exposes a generic associated slab type so the tree
//!   can request storage for its own node type. `BoundedAllocator<CAP>`
//!   refuses allocations past `CAP` and the tree reports `SlabExhausted`.
//!
//! Notes and non-goals
//! - No iterator invalidation tracking beyond generational ids.
//! - `HashMap::insert` returns `Result`: a failed slot search after growth
//!   is surfaced as `CapacityError` rather than a shared fallback value.
//! - Enable the `defmt` feature for trace records of rehash and eviction.

pub mod error;
pub mod hash;
pub mod hash_map;
mod hash_map_proptest;
pub mod hash_map_lru;
pub mod id_tracker;
pub mod rb_map;
pub mod rb_set;
pub mod rb_tree;
mod rb_tree_proptest;
pub mod slab;
mod slot_bits;

// Public surface
pub use error::{CapacityError, SlabExhausted, TreeInvariantError};
pub use hash::{
    fast_hash32, fast_hash64, hash_pair, murmur3_x86_32, EqualTo, FastHash, HashKey, KeyEq,
    KeyHasher, StdHash,
};
pub use hash_map::HashMap;
pub use hash_map_lru::HashMapLru;
pub use id_tracker::IdTracker;
pub use rb_map::RbMap;
pub use rb_set::RbSet;
pub use rb_tree::{Compare, OrdLess, RedBlackTree};
pub use slab::{BoundedAllocator, NodeId, SlabAllocator, SlotAllocator};
