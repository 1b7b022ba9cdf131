// crates/qreveal-permute/src/lib.rs

//! Keyed pseudorandom permutation of `[0, n)` for any `n ≥ 1`.
//!
//! - A Feistel network runs over the smallest power-of-two domain `[0, 2^k)`
//!   that covers `n`. The `k`-bit state is split into halves of widths
//!   `⌊k/2⌋` and `⌈k/2⌉`; each round maps `(L, R) → (R, L ⊕ F_i(R))` with
//!   `F_i` truncated to the width of `L`, so the halves trade widths every
//!   round and each round stays invertible even for odd `k`.
//! - Cycle-walking re-applies the network until the output lands inside
//!   `[0, n)`. Since `2^k < 2n`, fewer than two passes are expected.
//! - Round functions are BLAKE3 keyed by the seed; nothing is stored beyond
//!   the seed and the domain size.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use blake3::Hasher;
use qreveal_crypto::FEISTEL_DOMAIN;
use thiserror::Error;

/// Number of Feistel rounds. Must stay even so the half widths line up again.
pub const ROUNDS: u8 = 8;

/// 32-byte permutation key.
pub type Seed = [u8; 32];

/// Domain violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A permutation over zero elements was requested.
    #[error("permutation domain is empty")]
    Empty,
    /// The queried index does not belong to `[0, size)`.
    #[error("index {index} outside permutation domain [0, {size})")]
    OutOfRange {
        /// Offending index.
        index: u64,
        /// Domain size.
        size: u64,
    },
}

/// A keyed bijection on `[0, size)`.
#[derive(Clone, Debug)]
pub struct FeistelPermutation {
    size: u64,
    left_bits: u32,
    right_bits: u32,
    /// Keyed hasher with the domain tag and size already absorbed.
    base: Hasher,
}

impl FeistelPermutation {
    /// Build the permutation for `seed` over `[0, size)`.
    ///
    /// # Errors
    /// [`DomainError::Empty`] when `size == 0`.
    pub fn new(seed: &Seed, size: u64) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::Empty);
        }
        let bits = domain_bits(size);
        let left_bits = bits / 2;
        let right_bits = bits - left_bits;

        let mut base = Hasher::new_keyed(seed);
        base.update(FEISTEL_DOMAIN);
        base.update(&size.to_le_bytes());

        Ok(Self {
            size,
            left_bits,
            right_bits,
            base,
        })
    }

    /// Domain size `n`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Forward map `index → permuted index`.
    ///
    /// # Errors
    /// [`DomainError::OutOfRange`] when `index ≥ size`.
    pub fn permute(&self, index: u64) -> Result<u64, DomainError> {
        self.check(index)?;
        let mut x = index;
        loop {
            x = self.encrypt(x);
            if x < self.size {
                return Ok(x);
            }
        }
    }

    /// Inverse map, so `unpermute(permute(i)) == i`.
    ///
    /// # Errors
    /// [`DomainError::OutOfRange`] when `index ≥ size`.
    pub fn unpermute(&self, index: u64) -> Result<u64, DomainError> {
        self.check(index)?;
        let mut x = index;
        loop {
            x = self.decrypt(x);
            if x < self.size {
                return Ok(x);
            }
        }
    }

    #[inline]
    const fn check(&self, index: u64) -> Result<(), DomainError> {
        if index < self.size {
            Ok(())
        } else {
            Err(DomainError::OutOfRange {
                index,
                size: self.size,
            })
        }
    }

    /// One pass of the network over `[0, 2^k)`.
    fn encrypt(&self, x: u64) -> u64 {
        let (mut lw, mut rw) = (self.left_bits, self.right_bits);
        let mut l = x >> rw;
        let mut r = x & mask(rw);
        for round in 0..ROUNDS {
            let f = self.round_fn(round, r) & mask(lw);
            (l, r) = (r, l ^ f);
            (lw, rw) = (rw, lw);
        }
        (l << rw) | r
    }

    fn decrypt(&self, x: u64) -> u64 {
        let (mut lw, mut rw) = (self.left_bits, self.right_bits);
        let mut l = x >> rw;
        let mut r = x & mask(rw);
        for round in (0..ROUNDS).rev() {
            let f = self.round_fn(round, l) & mask(rw);
            (l, r) = (r ^ f, l);
            (lw, rw) = (rw, lw);
        }
        debug_assert_eq!((lw, rw), (self.left_bits, self.right_bits));
        (l << rw) | r
    }

    fn round_fn(&self, round: u8, half: u64) -> u64 {
        let mut h = self.base.clone();
        h.update(&[round]);
        h.update(&half.to_le_bytes());
        let mut out = [0u8; 8];
        h.finalize_xof().fill(&mut out);
        u64::from_le_bytes(out)
    }
}

/// Bits needed to index `[0, size)`; 0 for a single-element domain.
#[inline]
const fn domain_bits(size: u64) -> u32 {
    if size <= 1 {
        0
    } else {
        u64::BITS - (size - 1).leading_zeros()
    }
}

#[inline]
const fn mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// One-shot forward map: `(seed, size, index) → index`.
///
/// # Errors
/// See [`FeistelPermutation::new`] and [`FeistelPermutation::permute`].
pub fn permute(seed: &Seed, size: u64, index: u64) -> Result<u64, DomainError> {
    FeistelPermutation::new(seed, size)?.permute(index)
}

/// One-shot inverse map.
///
/// # Errors
/// See [`FeistelPermutation::new`] and [`FeistelPermutation::unpermute`].
pub fn unpermute(seed: &Seed, size: u64, index: u64) -> Result<u64, DomainError> {
    FeistelPermutation::new(seed, size)?.unpermute(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_bits_cover_size() {
        assert_eq!(domain_bits(1), 0);
        assert_eq!(domain_bits(2), 1);
        assert_eq!(domain_bits(3), 2);
        assert_eq!(domain_bits(4), 2);
        assert_eq!(domain_bits(5), 3);
        assert_eq!(domain_bits(1000), 10);
        assert_eq!(domain_bits(1024), 10);
        assert_eq!(domain_bits(u64::MAX), 64);
    }

    #[test]
    fn empty_domain_rejected() {
        assert_eq!(
            FeistelPermutation::new(&[0u8; 32], 0).unwrap_err(),
            DomainError::Empty
        );
    }

    #[test]
    fn out_of_range_rejected() {
        let p = FeistelPermutation::new(&[1u8; 32], 10).unwrap();
        assert_eq!(
            p.permute(10).unwrap_err(),
            DomainError::OutOfRange { index: 10, size: 10 }
        );
        assert!(p.unpermute(11).is_err());
    }

    #[test]
    fn singleton_domain_is_fixed() {
        assert_eq!(permute(&[9u8; 32], 1, 0).unwrap(), 0);
        assert_eq!(unpermute(&[9u8; 32], 1, 0).unwrap(), 0);
    }

    #[test]
    fn network_is_a_bijection_on_odd_width() {
        // 2^5 domain: halves of 2 and 3 bits.
        let p = FeistelPermutation::new(&[3u8; 32], 32).unwrap();
        let mut seen = [false; 32];
        for x in 0..32 {
            let y = p.encrypt(x);
            assert!(y < 32);
            assert!(!seen[y as usize]);
            seen[y as usize] = true;
            assert_eq!(p.decrypt(y), x);
        }
    }

    #[test]
    fn full_width_domain_roundtrips() {
        let p = FeistelPermutation::new(&[5u8; 32], u64::MAX).unwrap();
        for i in [0, 1, 12_345, u64::MAX / 2, u64::MAX - 2] {
            let y = p.permute(i).unwrap();
            assert_eq!(p.unpermute(y).unwrap(), i);
        }
    }

    #[test]
    fn seed_changes_mapping() {
        let a: Vec<u64> = (0..64).map(|i| permute(&[1u8; 32], 64, i).unwrap()).collect();
        let b: Vec<u64> = (0..64).map(|i| permute(&[2u8; 32], 64, i).unwrap()).collect();
        assert_ne!(a, b);
    }
}
