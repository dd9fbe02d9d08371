// Red-black tree, RbMap and RbSet integration tests.
//
// Invariants exercised:
// - Ordering: in-order traversal is strictly increasing under the comparator.
// - Colouring: root black, no red-red edge, uniform black height, checked
//   with check_invariants after every mutation.
// - Positions: erase hands back the successor; stepping back from the end
//   reaches the maximum.
// - Bounded storage: an exhausted slab is reported, not corrupted.
use compact_containers::{
    BoundedAllocator, OrdLess, RbMap, RbSet, RedBlackTree, SlabExhausted,
};

fn values<C, A: compact_containers::SlabAllocator>(t: &RedBlackTree<i32, C, A>) -> Vec<i32> {
    t.iter().copied().collect()
}

// Test: two-child erase scenario.
// Verifies: erasing 10 from a full 15-node tree keeps order and colouring.
#[test]
fn erase_two_child_node_from_full_tree() {
    let mut t = RedBlackTree::new();
    for v in [10, 5, 15, 3, 7, 12, 18, 1, 4, 6, 8, 11, 13, 17, 20] {
        assert!(t.insert(v).unwrap().1);
        t.check_invariants().unwrap();
    }
    let id = t.find(&10).expect("10 present");
    let (removed, next) = t.erase(id).unwrap();
    assert_eq!(removed, 10);
    assert_eq!(next.and_then(|n| t.get(n)), Some(&11));
    t.check_invariants().unwrap();
    let got = values(&t);
    assert!(got.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(got.len(), 14);
}

// Test: mixed insert/erase workload.
// Verifies: colour invariants after every step and sorted traversal.
#[test]
fn pseudo_random_workload_keeps_invariants() {
    let mut t = RedBlackTree::new();
    let mut x: u32 = 12345;
    for step in 0..2000 {
        x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let v = (x >> 16) as i32 % 500;
        if step % 3 == 2 {
            t.remove(&v);
        } else {
            t.insert(v).unwrap();
        }
        t.check_invariants().unwrap();
    }
    let got = values(&t);
    assert!(got.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(got.len(), t.len());
}

// Test: end() stepping.
// Verifies: prev from the end cursor is the maximum; next past the max is end.
#[test]
fn cursor_end_steps_back_to_max() {
    let mut t = RedBlackTree::new();
    for v in [4, 8, 2, 6] {
        t.insert(v).unwrap();
    }
    let mut c = t.cursor_end();
    c.move_prev();
    assert_eq!(c.get(), Some(&8));
    let last = t.last().unwrap();
    assert_eq!(t.next(last), None);
    assert_eq!(t.prev(t.first().unwrap()), None);
}

// Test: bounded slab exhaustion.
// Verifies: SlabExhausted leaves the tree valid and unchanged.
#[test]
fn bounded_tree_reports_exhaustion() {
    let mut t: RedBlackTree<i32, OrdLess, BoundedAllocator<8>> = RedBlackTree::default();
    for v in 0..8 {
        t.insert(v).unwrap();
    }
    assert_eq!(t.insert(100), Err(SlabExhausted));
    t.check_invariants().unwrap();
    assert_eq!(values(&t), (0..8).collect::<Vec<_>>());
}

// Test: map surface.
// Verifies: insert vs insert_or_assign, indexing, ranges and range removal.
#[test]
fn map_ordered_operations() {
    let mut m: RbMap<String, usize> = RbMap::new();
    for w in ["pear", "apple", "fig", "kiwi", "banana"] {
        m.insert(w.to_string(), w.len()).unwrap();
    }
    assert_eq!(
        m.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["apple", "banana", "fig", "kiwi", "pear"]
    );
    m.insert("fig".to_string(), 0).unwrap();
    assert_eq!(m[&"fig".to_string()], 3);
    m.insert_or_assign("fig".to_string(), 0).unwrap();
    assert_eq!(m.get(&"fig".to_string()), Some(&0));

    let mid: Vec<&str> = m
        .range("b".to_string().."l".to_string())
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(mid, vec!["banana", "fig", "kiwi"]);

    assert_eq!(m.remove_range("c".to_string()..), 3);
    assert_eq!(m.len(), 2);
    assert_eq!(m.last_key_value().map(|(k, _)| k.as_str()), Some("banana"));
}

// Test: set surface.
// Verifies: membership, bounds and shared-only iteration.
#[test]
fn set_ordered_operations() {
    let mut s = RbSet::new();
    for v in [9, 3, 7, 1, 5] {
        s.insert(v).unwrap();
    }
    assert!(s.contains(&7));
    assert!(!s.contains(&4));
    assert_eq!(s.lower_bound(&4), Some(&5));
    assert_eq!(s.range(2..=7).copied().collect::<Vec<_>>(), vec![3, 5, 7]);
    assert!(s.remove(&3));
    assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![1, 5, 7, 9]);
    assert_eq!((s.first(), s.last()), (Some(&1), Some(&9)));
}
