//! Randomness sources.
//!
//! The reveal transition pulls exactly one 32-byte value from a source and
//! treats it as opaque. How the value is produced is the source's business.

use rand::{rngs::StdRng, Rng as _, SeedableRng};
use thiserror::Error;

/// A source could not supply a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RandomnessError(pub String);

/// Capability to produce one unpredictable fixed-width value.
pub trait RandomnessSource {
    /// Produce the next value.
    ///
    /// # Errors
    /// When the underlying provider is unavailable.
    fn produce(&mut self) -> Result<[u8; 32], RandomnessError>;
}

/// Operating-system backed entropy via the thread RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl RandomnessSource for OsEntropy {
    fn produce(&mut self) -> Result<[u8; 32], RandomnessError> {
        let mut out = [0u8; 32];
        rand::rng().fill(&mut out);
        Ok(out)
    }
}

/// Reproducible entropy from a 64-bit seed (dry runs, tests).
#[derive(Clone, Debug)]
pub struct SeededEntropy {
    rng: StdRng,
}

impl SeededEntropy {
    /// Deterministic stream for `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomnessSource for SeededEntropy {
    fn produce(&mut self) -> Result<[u8; 32], RandomnessError> {
        let mut out = [0u8; 32];
        self.rng.fill(&mut out);
        Ok(out)
    }
}

/// Always yields the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedEntropy(pub [u8; 32]);

impl RandomnessSource for FixedEntropy {
    fn produce(&mut self) -> Result<[u8; 32], RandomnessError> {
        Ok(self.0)
    }
}

impl<S: RandomnessSource + ?Sized> RandomnessSource for &mut S {
    fn produce(&mut self) -> Result<[u8; 32], RandomnessError> {
        (**self).produce()
    }
}
