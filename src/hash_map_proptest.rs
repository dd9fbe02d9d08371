#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can check the
// slot bookkeeping directly.

use crate::hash::{EqualTo, KeyHasher};
use crate::hash_map::HashMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    Remove(u16),
    Get(u16),
    Bump(u16),
    Retain(u16),
    Clear,
    Iterate,
}

fn arb_op(keys: u16) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..keys, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => (0..keys).prop_map(Op::Remove),
        2 => (0..keys).prop_map(Op::Get),
        1 => (0..keys).prop_map(Op::Bump),
        1 => (2..5u16).prop_map(Op::Retain),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
    ]
}

/// Squeezes every key into a few home buckets.
#[derive(Clone, Copy, Default)]
struct Clustered;
impl KeyHasher<u16> for Clustered {
    fn hash_key(&self, key: &u16) -> u32 {
        u32::from(*key % 3)
    }
}

fn check<Hs: KeyHasher<u16>>(
    sut: &HashMap<u16, i32, Hs, EqualTo>,
    model: &hashbrown::HashMap<u16, i32>,
) -> Result<(), TestCaseError> {
    sut.assert_consistent();
    prop_assert_eq!(sut.len(), model.len());
    for (k, v) in model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    let seen: BTreeMap<u16, i32> = sut.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(seen.len(), sut.len());
    Ok(())
}

fn apply<Hs: KeyHasher<u16>>(
    sut: &mut HashMap<u16, i32, Hs, EqualTo>,
    model: &mut hashbrown::HashMap<u16, i32>,
    op: Op,
) -> Result<(), TestCaseError> {
    match op {
        Op::Insert(k, v) => {
            let prev = sut.insert(k, v).expect("insert");
            prop_assert_eq!(prev, model.insert(k, v));
        }
        Op::Remove(k) => {
            prop_assert_eq!(sut.remove(&k), model.remove(&k));
            prop_assert!(!sut.contains_key(&k));
        }
        Op::Get(k) => {
            prop_assert_eq!(sut.get(&k), model.get(&k));
            prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
        }
        Op::Bump(k) => {
            let v = sut.get_or_insert_default(k).expect("slot");
            *v = v.wrapping_add(1);
            let m = model.entry(k).or_default();
            *m = m.wrapping_add(1);
        }
        Op::Retain(modulus) => {
            sut.retain(|k, _| k % modulus != 0);
            model.retain(|k, _| k % modulus != 0);
        }
        Op::Clear => {
            let cap = sut.capacity();
            sut.clear();
            model.clear();
            prop_assert_eq!(sut.capacity(), cap);
        }
        Op::Iterate => {
            let mut keys: Vec<u16> = sut.keys().copied().collect();
            keys.sort_unstable();
            let mut expected: Vec<u16> = model.keys().copied().collect();
            expected.sort_unstable();
            prop_assert_eq!(keys, expected);
        }
    }
    Ok(())
}

// Property: state-machine equivalence against hashbrown::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns the previous value; get after insert sees the last value.
// - len equals the number of model keys, independent of tombstones.
// - occupied/deleted bits never overlap and match len/tombstones.
// - every rehash (grow or in-place) keeps all live entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_model(
        initial in 0usize..20,
        load in 0.3f32..=1.0,
        ops in proptest::collection::vec(arb_op(48), 1..200),
    ) {
        let mut sut: HashMap<u16, i32> = HashMap::with_capacity_and_load_factor(initial, load);
        let mut model = hashbrown::HashMap::new();
        for op in ops {
            apply(&mut sut, &mut model, op)?;
            check(&sut, &model)?;
        }
    }

    #[test]
    fn prop_matches_model_under_collisions(
        ops in proptest::collection::vec(arb_op(24), 1..200),
    ) {
        let mut sut: HashMap<u16, i32, Clustered, EqualTo> =
            HashMap::with_hasher_and_eq(4, 0.9, Clustered, EqualTo);
        let mut model = hashbrown::HashMap::new();
        for op in ops {
            apply(&mut sut, &mut model, op)?;
            check(&sut, &model)?;
        }
    }

    // Churn with a bounded live set never grows the table past what the
    // live set alone needs.
    #[test]
    fn prop_churn_keeps_capacity_bounded(
        live in 1usize..6,
        rounds in 10usize..120,
    ) {
        let mut m: HashMap<u32, u32> = HashMap::with_capacity_and_load_factor(32, 0.7);
        let mut next = 0u32;
        for _ in 0..rounds {
            let batch: Vec<u32> = (0..live as u32).map(|i| next + i).collect();
            next += live as u32;
            for &k in &batch {
                m.insert(k, k).expect("insert");
            }
            for &k in &batch {
                prop_assert_eq!(m.remove(&k), Some(k));
            }
        }
        prop_assert_eq!(m.capacity(), 32);
        prop_assert!(m.is_empty());
    }
}
