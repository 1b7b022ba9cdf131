//! Mint counter boundary.
//!
//! The engine only ever reads the minted count; incrementing it (and any
//! payment handling) belongs to the minting side. [`MintLedger`] is the plain
//! counter-and-cap reference implementation.

use crate::error::MintError;
use crate::ItemIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Read access to the monotonic mint counter.
pub trait MintCounter {
    /// Number of items minted so far; valid indices are `[0, minted)`.
    fn minted(&self) -> u64;
}

impl MintCounter for u64 {
    fn minted(&self) -> u64 {
        *self
    }
}

/// Counter with a hard supply cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintLedger {
    max_supply: u64,
    minted: u64,
}

impl MintLedger {
    /// Fresh ledger with nothing minted.
    #[must_use]
    pub const fn new(max_supply: u64) -> Self {
        Self {
            max_supply,
            minted: 0,
        }
    }

    /// Configured cap.
    #[must_use]
    pub const fn max_supply(&self) -> u64 {
        self.max_supply
    }

    /// Items still mintable.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.max_supply.saturating_sub(self.minted)
    }

    /// Mint the next item and return its index.
    ///
    /// # Errors
    /// `SupplyExhausted` once the cap is reached.
    pub fn mint(&mut self) -> Result<ItemIndex, MintError> {
        if self.minted >= self.max_supply {
            return Err(MintError::SupplyExhausted {
                max_supply: self.max_supply,
            });
        }
        let index = self.minted;
        self.minted += 1;
        debug!(index, "minted");
        Ok(index)
    }
}

impl MintCounter for MintLedger {
    fn minted(&self) -> u64 {
        self.minted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_is_enforced() {
        let mut l = MintLedger::new(2);
        assert_eq!(l.mint().unwrap(), 0);
        assert_eq!(l.mint().unwrap(), 1);
        assert_eq!(l.remaining(), 0);
        assert_eq!(
            l.mint().unwrap_err(),
            MintError::SupplyExhausted { max_supply: 2 }
        );
        assert_eq!(l.minted(), 2);
    }
}
