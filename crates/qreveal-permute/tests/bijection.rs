//! Bijectivity of the keyed permutation over exhaustive small domains.

use proptest::prelude::*;
use qreveal_permute::{permute, unpermute, FeistelPermutation, Seed};

fn seed_from(x: u64) -> Seed {
    let mut s = [0u8; 32];
    s[..8].copy_from_slice(&x.to_le_bytes());
    s[31] = 0xA5;
    s
}

/// Every n in 1..=130 under a fixed seed, covering both even and odd widths.
#[test]
fn exhaustive_small_domains() {
    let seed = seed_from(42);
    for n in 1..=130u64 {
        let p = FeistelPermutation::new(&seed, n).unwrap();
        let mut seen = vec![false; n as usize];
        for i in 0..n {
            let y = p.permute(i).unwrap();
            assert!(y < n, "n={n} i={i} → {y} out of range");
            assert!(!seen[y as usize], "n={n}: collision at {y}");
            seen[y as usize] = true;
            assert_eq!(p.unpermute(y).unwrap(), i);
        }
    }
}

#[test]
fn free_functions_agree_with_struct() {
    let seed = seed_from(7);
    let p = FeistelPermutation::new(&seed, 1000).unwrap();
    for i in (0..1000).step_by(37) {
        assert_eq!(permute(&seed, 1000, i).unwrap(), p.permute(i).unwrap());
        assert_eq!(unpermute(&seed, 1000, i).unwrap(), p.unpermute(i).unwrap());
    }
}

/// A keyed shuffle of 1000 elements should move most of them.
#[test]
fn not_close_to_identity() {
    let p = FeistelPermutation::new(&seed_from(1), 1000).unwrap();
    let fixed = (0..1000).filter(|&i| p.permute(i).unwrap() == i).count();
    assert!(fixed < 50, "{fixed} fixed points");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        .. ProptestConfig::default()
    })]

    #[test]
    fn bijection_for_arbitrary_seed(raw in any::<u64>(), n in 1u64..=600) {
        let p = FeistelPermutation::new(&seed_from(raw), n).unwrap();
        let mut seen = vec![false; n as usize];
        for i in 0..n {
            let y = p.permute(i).unwrap();
            prop_assert!(y < n);
            prop_assert!(!seen[y as usize]);
            seen[y as usize] = true;
        }
    }

    #[test]
    fn inverse_roundtrip_large_domain(raw in any::<u64>(), n in 1u64..=u64::MAX, i in any::<u64>()) {
        let p = FeistelPermutation::new(&seed_from(raw), n).unwrap();
        let i = i % n;
        let y = p.permute(i).unwrap();
        prop_assert!(y < n);
        prop_assert_eq!(p.unpermute(y).unwrap(), i);
    }
}
