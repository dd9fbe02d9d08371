// HashMapLru integration tests.
//
// Invariants exercised:
// - Eviction order: with no reads, the first-inserted key goes first.
// - Touching: a read makes a key the most recently used.
// - Bound changes: shrinking evicts oldest-first, growing keeps everything.
use compact_containers::HashMapLru;

fn filled(cap: usize) -> HashMapLru<u32, u32> {
    let mut lru = HashMapLru::new(cap);
    for k in 0..cap as u32 {
        lru.insert(k, k * 100).expect("insert ok");
    }
    lru
}

// Test: C+1 inserts with no reads.
// Verifies: the first-inserted key is the one evicted.
#[test]
fn overflow_evicts_first_inserted() {
    let mut lru = filled(4);
    lru.insert(99, 0).unwrap();
    assert_eq!(lru.len(), 4);
    assert!(!lru.contains_key(&0));
    for k in [1, 2, 3, 99] {
        assert!(lru.contains_key(&k), "key {k} should survive");
    }
}

// Test: a read protects the first key.
// Verifies: after reading key 0, the second-inserted key is evicted instead.
#[test]
fn read_moves_key_to_most_recent() {
    let mut lru = filled(4);
    assert_eq!(lru.get(&0), Some(&0));
    lru.insert(99, 0).unwrap();
    assert!(lru.contains_key(&0));
    assert!(!lru.contains_key(&1));
}

// Test: updates touch and never evict.
// Verifies: re-inserting an existing key at capacity keeps len and refreshes
// the key's recency.
#[test]
fn update_refreshes_without_evicting() {
    let mut lru = filled(3);
    assert_eq!(lru.insert(0, 7).unwrap(), Some(0));
    assert_eq!(lru.len(), 3);
    lru.insert(50, 50).unwrap();
    assert_eq!(lru.peek(&0), Some(&7));
    assert!(!lru.contains_key(&1));
}

// Test: operator[]-style access.
// Verifies: get_or_insert_default creates, touches and may evict.
#[test]
fn get_or_insert_default_touches_and_evicts() {
    let mut lru = filled(2);
    *lru.get_or_insert_default(0).unwrap() += 1;
    *lru.get_or_insert_default(5).unwrap() += 1;
    assert_eq!(lru.peek(&0), Some(&1));
    assert_eq!(lru.peek(&5), Some(&1));
    assert!(!lru.contains_key(&1));
}

// Test: shrinking the bound.
// Verifies: set_max_size evicts oldest entries until the map fits.
#[test]
fn shrinking_bound_evicts_oldest_first() {
    let mut lru = filled(6);
    lru.get(&0);
    lru.set_max_size(3);
    assert_eq!(lru.max_size(), 3);
    assert_eq!(lru.len(), 3);
    let mut kept: Vec<u32> = lru.iter().map(|(k, _)| *k).collect();
    kept.sort_unstable();
    assert_eq!(kept, vec![0, 4, 5]);
}

// Test: growing the bound.
// Verifies: no entry is evicted and later inserts fill the new room.
// Verifies: growth deliberately skips eviction, unlike a loop that evicts
// while len < max and would empty the map.
#[test]
fn growing_bound_keeps_entries() {
    let mut lru = filled(3);
    lru.set_max_size(5);
    assert_eq!(lru.len(), 3);
    assert!((0..3).all(|k| lru.contains_key(&k)));
    lru.insert(10, 1).unwrap();
    lru.insert(11, 1).unwrap();
    assert_eq!(lru.len(), 5);
    assert!(lru.contains_key(&0));
    lru.insert(12, 1).unwrap();
    assert!(!lru.contains_key(&0));
}

// Test: explicit eviction and removal.
// Verifies: evict_oldest returns the stalest pair; remove skips recency.
#[test]
fn evict_oldest_and_remove() {
    let mut lru = filled(3);
    assert_eq!(lru.remove(&1), Some(100));
    assert_eq!(lru.evict_oldest(), Some((0, 0)));
    assert_eq!(lru.evict_oldest(), Some((2, 200)));
    assert_eq!(lru.evict_oldest(), None);
    assert!(lru.is_empty());
}
