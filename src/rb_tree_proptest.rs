#![cfg(test)]

// Property tests for RedBlackTree kept inside the crate so every step can
// run the structural checker.

use crate::rb_tree::{OrdLess, RedBlackTree};
use crate::slab::{BoundedAllocator, SlabAllocator};
use core::ops::Bound;
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16),
    Remove(i16),
    EraseFound(i16),
    EraseRange(i16, i16),
    Bounds(i16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (-64i16..64).prop_map(Op::Insert),
        3 => (-64i16..64).prop_map(Op::Remove),
        2 => (-64i16..64).prop_map(Op::EraseFound),
        1 => (-64i16..64, 0i16..12).prop_map(|(a, w)| Op::EraseRange(a, a + w)),
        2 => (-70i16..70).prop_map(Op::Bounds),
    ]
}

fn apply<A: SlabAllocator>(
    sut: &mut RedBlackTree<i16, OrdLess, A>,
    model: &mut BTreeSet<i16>,
    op: Op,
) -> Result<(), TestCaseError> {
    match op {
        Op::Insert(v) => {
            if let Ok((id, inserted)) = sut.insert(v) {
                prop_assert_eq!(inserted, model.insert(v));
                prop_assert_eq!(sut.get(id), Some(&v));
            }
        }
        Op::Remove(v) => {
            prop_assert_eq!(sut.remove(&v), model.take(&v));
        }
        Op::EraseFound(v) => {
            if let Some(id) = sut.find(&v) {
                let (value, next) = sut.erase(id).expect("found id is live");
                prop_assert_eq!(value, v);
                model.remove(&v);
                let expected = model.range(v..).next();
                prop_assert_eq!(next.and_then(|n| sut.get(n)), expected);
            } else {
                prop_assert!(!model.contains(&v));
            }
        }
        Op::EraseRange(lo, hi) => {
            let first = sut.lower_bound(&lo);
            let last = sut.lower_bound(&hi);
            sut.erase_range(first, last);
            model.retain(|v| *v < lo || *v >= hi);
        }
        Op::Bounds(v) => {
            let lower = sut.lower_bound(&v).and_then(|id| sut.get(id));
            prop_assert_eq!(lower, model.range(v..).next());
            let upper = sut.upper_bound(&v).and_then(|id| sut.get(id));
            let expected = model.range((Bound::Excluded(v), Bound::Unbounded)).next();
            prop_assert_eq!(upper, expected);
            let mut c = sut.cursor_end();
            c.move_prev();
            prop_assert_eq!(c.get(), model.iter().next_back());
        }
    }
    Ok(())
}

fn check<A: SlabAllocator>(
    sut: &RedBlackTree<i16, OrdLess, A>,
    model: &BTreeSet<i16>,
) -> Result<(), TestCaseError> {
    if let Err(e) = sut.check_invariants() {
        return Err(TestCaseError::fail(format!("invariant broken: {e}")));
    }
    prop_assert_eq!(sut.len(), model.len());
    prop_assert!(sut.iter().eq(model.iter()));
    prop_assert!(sut.iter().rev().eq(model.iter().rev()));
    Ok(())
}

// Property: state-machine equivalence against BTreeSet.
// Invariants exercised across random operation sequences:
// - red-black colouring, black height and parent links hold after every op.
// - in-order traversal equals the model in both directions.
// - erase returns the in-order successor of the erased element.
// - a bounded slab refuses inserts without disturbing the tree.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_btreeset(ops in proptest::collection::vec(arb_op(), 1..300)) {
        let mut sut = RedBlackTree::new();
        let mut model = BTreeSet::new();
        for op in ops {
            apply(&mut sut, &mut model, op)?;
            check(&sut, &model)?;
        }
    }

    #[test]
    fn prop_bounded_slab_never_exceeds_capacity(
        ops in proptest::collection::vec(arb_op(), 1..300),
    ) {
        let mut sut: RedBlackTree<i16, OrdLess, BoundedAllocator<16>> = RedBlackTree::default();
        let mut model = BTreeSet::new();
        for op in ops {
            apply(&mut sut, &mut model, op)?;
            check(&sut, &model)?;
            prop_assert!(sut.len() <= 16);
        }
    }
}
