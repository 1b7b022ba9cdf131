//! Invariants of the assignment function.
//!
//! For any quota set and any seed:
//! - walking `[0, N)` yields exactly `quota(c)` items per category,
//! - the `(category, rank)` pairs are pairwise distinct and ranks stay in range,
//! - the mapping is a pure function of the seed and the quotas.

use proptest::prelude::*;
use qreveal_core::{
    Assignment, CategoryId, CategoryRegistry, Collection, CollectionMeta, FixedEntropy,
    MintLedger, RevealEngine,
};
use std::collections::{BTreeMap, HashSet};

fn collection(quotas: &[u64]) -> Collection {
    let mut reg = CategoryRegistry::new();
    for (i, &q) in quotas.iter().enumerate() {
        reg.register(i as CategoryId, q, format!("c{i}"), format!("ipfs://c{i}/"))
            .unwrap();
    }
    reg.close(quotas.iter().sum()).unwrap()
}

fn seed_from(x: u64) -> [u8; 32] {
    let mut s = [0u8; 32];
    s[8..16].copy_from_slice(&x.to_le_bytes());
    s
}

/// All assignments over `[0, N)`.
fn walk(c: &Collection, seed: &[u8; 32]) -> Vec<Assignment> {
    let a = c.assigner(seed).unwrap();
    (0..c.size()).map(|i| a.category_of(i).unwrap()).collect()
}

#[test]
fn tiny_collections_exhaustive_over_seeds() {
    let sets: [&[u64]; 5] = [&[1], &[1, 1], &[2, 1], &[1, 1, 1, 1, 1], &[3, 5, 2]];
    for quotas in sets {
        let c = collection(quotas);
        for s in 0..32 {
            let got = walk(&c, &seed_from(s));
            let mut counts = vec![0u64; quotas.len()];
            for a in &got {
                counts[a.category as usize] += 1;
            }
            assert_eq!(counts, quotas);
        }
    }
}

#[test]
fn assignment_is_pure() {
    let c = collection(&[10, 20, 30]);
    let seed = seed_from(99);
    assert_eq!(walk(&c, &seed), walk(&c, &seed));
    assert_ne!(walk(&c, &seed), walk(&c, &seed_from(100)));
}

#[test]
fn engine_descriptors_are_deterministic() {
    let mut e = RevealEngine::new(CollectionMeta::new("t", "d", "ipfs://p"));
    e.register(0, 40, "A", "a/").unwrap();
    e.register(1, 24, "B", "b/").unwrap();
    e.close(64).unwrap();
    e.reveal(&mut FixedEntropy([1; 32])).unwrap();
    let minted = 64u64;
    for i in 0..minted {
        let a = e.descriptor_of(i, &minted).unwrap();
        let b = e.descriptor_of(i, &minted).unwrap();
        assert_eq!(a.to_json("Category").unwrap(), b.to_json("Category").unwrap());
    }
}

fn arb_quotas() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..=40, 1..=8)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn histogram_equals_quotas(quotas in arb_quotas(), s in any::<u64>()) {
        let c = collection(&quotas);
        let mut counts: BTreeMap<CategoryId, u64> = BTreeMap::new();
        for a in walk(&c, &seed_from(s)) {
            *counts.entry(a.category).or_default() += 1;
        }
        for (i, &q) in quotas.iter().enumerate() {
            prop_assert_eq!(counts.get(&(i as CategoryId)).copied(), Some(q));
        }
    }

    #[test]
    fn pairs_are_distinct_and_in_range(quotas in arb_quotas(), s in any::<u64>()) {
        let c = collection(&quotas);
        let got = walk(&c, &seed_from(s));
        let unique: HashSet<Assignment> = got.iter().copied().collect();
        prop_assert_eq!(unique.len() as u64, c.size());
        for a in got {
            prop_assert!(a.rank < quotas[a.category as usize]);
        }
    }

    #[test]
    fn full_audit_matches_quotas(quotas in arb_quotas(), raw in any::<[u8; 32]>()) {
        let mut e = RevealEngine::new(CollectionMeta::new("t", "d", "ipfs://p"));
        for (i, &q) in quotas.iter().enumerate() {
            e.register(i as CategoryId, q, format!("c{i}"), format!("ipfs://c{i}/{{rank}}.json")).unwrap();
        }
        let n: u64 = quotas.iter().sum();
        e.close(n).unwrap();
        let mut ledger = MintLedger::new(n);
        while ledger.mint().is_ok() {}
        e.reveal(&mut FixedEntropy(raw)).unwrap();

        let report = e.audit(&ledger).unwrap();
        prop_assert!(report.assets_unique());
        prop_assert!(report.matches_quotas(e.collection().unwrap()));
    }
}
