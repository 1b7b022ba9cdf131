//! One-shot reveal state machine.
//!
//! `Unrevealed → Revealed { seed }`, never back. The seed lives inside the
//! `Revealed` variant, so "seed exists iff revealed" holds by construction.
//! The committing write happens only after the randomness source succeeded;
//! a failed draw leaves the state untouched.

use crate::entropy::RandomnessSource;
use crate::error::StateError;
use crate::Seed;
use qreveal_crypto::derive_reveal_seed;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Reveal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RevealState {
    /// Initial state; no seed.
    #[default]
    Unrevealed,
    /// Terminal state holding the committed seed.
    Revealed {
        /// Committed seed.
        #[serde(with = "hex")]
        seed: Seed,
    },
}

impl RevealState {
    /// Whether the reveal happened.
    #[inline]
    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed { .. })
    }

    /// Committed seed.
    ///
    /// # Errors
    /// `NotRevealed` before reveal.
    pub fn seed(&self) -> Result<&Seed, StateError> {
        match self {
            Self::Revealed { seed } => Ok(seed),
            Self::Unrevealed => Err(StateError::NotRevealed),
        }
    }

    /// Draw one value from `source`, derive the seed for a collection of
    /// `total_items`, and commit it.
    ///
    /// # Errors
    /// `AlreadyRevealed` (state and seed unchanged) or `RandomnessUnavailable`
    /// (state stays `Unrevealed`).
    pub fn reveal<R: RandomnessSource + ?Sized>(
        &mut self,
        source: &mut R,
        total_items: u64,
    ) -> Result<Seed, StateError> {
        if self.is_revealed() {
            warn!("reveal rejected: already revealed");
            return Err(StateError::AlreadyRevealed);
        }
        let entropy = source
            .produce()
            .map_err(|e| StateError::RandomnessUnavailable(e.0))?;
        let seed = derive_reveal_seed(&entropy, total_items);
        *self = Self::Revealed { seed };
        info!(seed = %hex::encode(seed), total_items, "revealed");
        Ok(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{FixedEntropy, RandomnessError};

    struct Unavailable;

    impl RandomnessSource for Unavailable {
        fn produce(&mut self) -> Result<[u8; 32], RandomnessError> {
            Err(RandomnessError("oracle offline".into()))
        }
    }

    #[test]
    fn second_reveal_fails_and_keeps_seed() {
        let mut st = RevealState::default();
        assert_eq!(st.seed().unwrap_err(), StateError::NotRevealed);

        let seed = st.reveal(&mut FixedEntropy([1u8; 32]), 10).unwrap();
        assert!(st.is_revealed());
        assert_eq!(st.seed().unwrap(), &seed);

        let err = st.reveal(&mut FixedEntropy([2u8; 32]), 10).unwrap_err();
        assert_eq!(err, StateError::AlreadyRevealed);
        assert_eq!(st.seed().unwrap(), &seed);
    }

    #[test]
    fn failed_draw_keeps_unrevealed() {
        let mut st = RevealState::Unrevealed;
        let err = st.reveal(&mut Unavailable, 10).unwrap_err();
        assert_eq!(
            err,
            StateError::RandomnessUnavailable("oracle offline".into())
        );
        assert_eq!(st, RevealState::Unrevealed);
    }

    #[test]
    fn seed_is_domain_separated_from_raw_entropy() {
        let mut st = RevealState::Unrevealed;
        let seed = st.reveal(&mut FixedEntropy([9u8; 32]), 1000).unwrap();
        assert_ne!(seed, [9u8; 32]);
        assert_eq!(seed, derive_reveal_seed(&[9u8; 32], 1000));
    }

    #[test]
    fn serde_shape() {
        let st = RevealState::Revealed { seed: [0xab; 32] };
        let json = serde_json::to_value(st).unwrap();
        assert_eq!(json["state"], "revealed");
        assert_eq!(json["seed"], "ab".repeat(32));
        let back: RevealState = serde_json::from_value(json).unwrap();
        assert_eq!(back, st);

        let un = serde_json::to_value(RevealState::Unrevealed).unwrap();
        assert_eq!(un["state"], "unrevealed");
    }
}
