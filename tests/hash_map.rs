// HashMap integration tests.
//
// Each test documents what behavior is being verified. The core
// invariants exercised:
// - Round-trip: a lookup returns the value last inserted for the key.
// - Size: len() counts live keys only, whatever the tombstone count.
// - Churn: insert/erase cycles compact in place instead of doubling.
// - Rehash: growth and compaction keep every live entry and its value.
use compact_containers::{murmur3_x86_32, HashMap, KeyHasher, StdHash};
use std::collections::hash_map::RandomState;

// Test: last write wins.
// Verifies: insert returns the previous value; get sees the latest one.
#[test]
fn round_trip_returns_last_value() {
    let mut m: HashMap<u32, u32> = HashMap::new();
    for round in 0..3 {
        for k in 0..100 {
            let prev = m.insert(k, k * 10 + round).expect("insert ok");
            if round == 0 {
                assert_eq!(prev, None);
            } else {
                assert_eq!(prev, Some(k * 10 + round - 1));
            }
        }
    }
    for k in 0..100 {
        assert_eq!(m.get(&k), Some(&(k * 10 + 2)));
        assert_eq!(m[&k], k * 10 + 2);
    }
    assert_eq!(m.len(), 100);
}

// Test: size ignores tombstones.
// Assumes: erase leaves a tombstone behind.
// Verifies: len() equals the number of keys for which contains_key holds.
#[test]
fn size_counts_live_keys_only() {
    let mut m: HashMap<u32, ()> = HashMap::with_capacity(32);
    for k in 0..20 {
        m.insert(k, ()).unwrap();
    }
    for k in (0..20).filter(|k| k % 3 == 0) {
        assert!(m.erase(&k));
        assert!(!m.erase(&k));
    }
    let live = (0..40).filter(|k| m.contains_key(k)).count();
    assert_eq!(m.len(), live);
    assert_eq!(m.len(), 13);
    assert!(m.tombstones() > 0);
}

// Test: concrete tombstone-majority scenario.
// Assumes: capacity 8 with load 0.5 grows to 16 while filling 0..=7.
// Verifies: after erasing 0..=6 and reinserting them, everything is present
// and the table compacted in place rather than doubling again.
#[test]
fn reinsert_after_erasing_most_keys_compacts() {
    let mut m: HashMap<i32, i32> = HashMap::with_capacity_and_load_factor(8, 0.5);
    for k in 0..8 {
        m.insert(k, k).unwrap();
    }
    assert_eq!(m.len(), 8);
    let cap = m.capacity();
    for k in 0..7 {
        assert!(m.erase(&k));
    }
    assert_eq!(m.len(), 1);
    assert!(m.contains_key(&7));
    for k in 0..7 {
        m.insert(k, -k).unwrap();
    }
    assert_eq!(m.len(), 8);
    assert_eq!(m.capacity(), cap);
    for k in 0..7 {
        assert_eq!(m.get(&k), Some(&-k));
    }
    assert_eq!(m.get(&7), Some(&7));
}

// Test: no growth under churn.
// Verifies: cycling N inserts and N-1 erases leaves capacity bounded.
#[test]
fn churn_does_not_grow_capacity() {
    let mut m: HashMap<u64, u64> = HashMap::with_capacity_and_load_factor(64, 0.7);
    let mut next = 0u64;
    let mut keep = Vec::new();
    for _ in 0..500 {
        let batch: Vec<u64> = (next..next + 4).collect();
        next += 4;
        for &k in &batch {
            m.insert(k, k * 2).unwrap();
        }
        for &k in &batch[..3] {
            m.remove(&k);
        }
        keep.push(batch[3]);
        if keep.len() > 6 {
            let k = keep.remove(0);
            assert_eq!(m.remove(&k), Some(k * 2));
        }
    }
    assert_eq!(m.capacity(), 64);
    for k in &keep {
        assert_eq!(m.get(k), Some(&(k * 2)));
    }
}

// Test: rehash keeps entries.
// Verifies: every key present before a doubling is present after it.
#[test]
fn growth_preserves_entries() {
    let mut m: HashMap<String, usize> = HashMap::new();
    let mut cap = m.capacity();
    let mut grew = 0;
    for i in 0..300 {
        m.insert(format!("key-{i}"), i).unwrap();
        if m.capacity() != cap {
            grew += 1;
            cap = m.capacity();
            for j in 0..=i {
                assert_eq!(m.get(format!("key-{j}").as_str()), Some(&j));
            }
        }
    }
    assert!(grew >= 5);
    assert!(!m.is_inline());
}

// Test: std hasher adapter.
// Verifies: a map keyed through RandomState behaves like the default one.
#[test]
fn std_hasher_adapter_works() {
    let mut m: HashMap<&str, u8, StdHash<RandomState>, _> = HashMap::with_hasher_and_eq(
        0,
        0.75,
        StdHash(RandomState::new()),
        compact_containers::EqualTo,
    );
    m.insert("x", 1).unwrap();
    m.insert("y", 2).unwrap();
    assert_eq!(m.get(&"x"), Some(&1));
    assert_eq!(m.remove(&"y"), Some(2));
    assert_eq!(m.len(), 1);
}

// Test: custom hasher hook.
// Verifies: byte-slice keys can be hashed with Murmur and a chosen seed.
#[test]
fn custom_seeded_hasher() {
    struct Seeded(u32);
    impl KeyHasher<Vec<u8>> for Seeded {
        fn hash_key(&self, key: &Vec<u8>) -> u32 {
            murmur3_x86_32(key, self.0)
        }
    }
    let mut m: HashMap<Vec<u8>, usize, Seeded, _> =
        HashMap::with_hasher_and_eq(4, 0.7, Seeded(0x9747_b28c), compact_containers::EqualTo);
    for i in 0..50usize {
        m.insert(i.to_le_bytes().to_vec(), i).unwrap();
    }
    for i in 0..50usize {
        assert_eq!(m.get(&i.to_le_bytes().to_vec()), Some(&i));
    }
}
