//! Error taxonomy.
//!
//! Every failure is synchronous and carries a stable reason code
//! ([`EngineError::code`]) suitable for machine consumption. Nothing inside the
//! engine is retryable: an operation is either a pure computation or a single
//! irreversible write.

use crate::{CategoryId, ItemIndex};
use thiserror::Error;

/// Configuration-time rejections (registry and collection invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The category id was already registered.
    #[error("category {0} is already registered")]
    DuplicateCategory(CategoryId),
    /// Registration attempted after the registry was closed or revealed.
    #[error("registration is closed")]
    RegistrationClosed,
    /// A category declared a zero quota.
    #[error("category {0} declares a zero quota")]
    ZeroQuota(CategoryId),
    /// No categories or a zero maximum item count.
    #[error("collection is empty")]
    EmptyCollection,
    /// Declared quotas do not sum to the maximum item count.
    #[error("declared quotas sum to {declared}, expected {expected}")]
    QuotaMismatch {
        /// Sum over registered quotas.
        declared: u64,
        /// Maximum item count the registry was closed against.
        expected: u64,
    },
    /// Quota sum does not fit in 64 bits.
    #[error("declared quotas overflow u64")]
    QuotaOverflow,
    /// Category ids are not the dense range `0..k`.
    #[error("category ids are not dense: {0} is missing")]
    SparseCategoryIds(CategoryId),
    /// Two asset templates could render the same reference.
    ///
    /// The check is conservative: it compares only the literal text before
    /// the rank, and rejects any pair where one prefix extends the other.
    /// `cdn/{rank}.png` and `cdn/a/{rank}` can never collide, yet are still
    /// rejected because `cdn/` is a prefix of `cdn/a/`. Give each category
    /// its own directory (`cdn/ape/`, `cdn/owl/`) to stay clear of it.
    #[error("asset templates of categories {0} and {1} overlap")]
    AmbiguousAssetTemplate(CategoryId, CategoryId),
    /// The operation needs a closed registry.
    #[error("registry is still open")]
    RegistryOpen,
    /// The external mint cap disagrees with the declared quota total.
    #[error("mint cap {cap} does not match declared quota total {declared}")]
    SupplyMismatch {
        /// Cap reported by the mint collaborator.
        cap: u64,
        /// Declared quota total.
        declared: u64,
    },
}

/// Reveal-state violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Reveal was already performed; the committed seed is unchanged.
    #[error("already revealed")]
    AlreadyRevealed,
    /// A reveal-dependent query was issued before reveal.
    #[error("not revealed yet")]
    NotRevealed,
    /// The randomness source could not supply a value; state is unchanged.
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(String),
}

/// Index range violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Index at or beyond the minted count.
    #[error("unknown item {index} (minted: {minted})")]
    UnknownItem {
        /// Requested index.
        index: ItemIndex,
        /// Items minted so far.
        minted: u64,
    },
    /// Index outside the collection domain.
    #[error("index {index} outside collection of {size} items")]
    OutsideCollection {
        /// Requested index.
        index: u64,
        /// Collection size.
        size: u64,
    },
    /// Category id not registered.
    #[error("unknown category {0}")]
    UnknownCategory(CategoryId),
    /// Rank beyond the category's quota.
    #[error("rank {rank} outside quota {quota} of category {category}")]
    RankOutOfQuota {
        /// Category queried.
        category: CategoryId,
        /// Requested rank.
        rank: u64,
        /// Category quota.
        quota: u64,
    },
}

/// Mint cap violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MintError {
    /// The cap has been reached.
    #[error("max supply reached ({max_supply})")]
    SupplyExhausted {
        /// Configured cap.
        max_supply: u64,
    },
}

/// Umbrella error returned by the engine façade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// State error.
    #[error(transparent)]
    State(#[from] StateError),
    /// Range error.
    #[error(transparent)]
    Range(#[from] RangeError),
    /// Mint error.
    #[error(transparent)]
    Mint(#[from] MintError),
}

impl EngineError {
    /// Stable, machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => match e {
                ConfigError::DuplicateCategory(_) => "duplicate_category",
                ConfigError::RegistrationClosed => "registration_closed",
                ConfigError::ZeroQuota(_) => "zero_quota",
                ConfigError::EmptyCollection => "empty_collection",
                ConfigError::QuotaMismatch { .. } => "quota_mismatch",
                ConfigError::QuotaOverflow => "quota_overflow",
                ConfigError::SparseCategoryIds(_) => "sparse_category_ids",
                ConfigError::AmbiguousAssetTemplate(..) => "ambiguous_asset_template",
                ConfigError::RegistryOpen => "registry_open",
                ConfigError::SupplyMismatch { .. } => "supply_mismatch",
            },
            Self::State(e) => match e {
                StateError::AlreadyRevealed => "already_revealed",
                StateError::NotRevealed => "not_revealed",
                StateError::RandomnessUnavailable(_) => "randomness_unavailable",
            },
            Self::Range(e) => match e {
                RangeError::UnknownItem { .. } => "unknown_item",
                RangeError::OutsideCollection { .. } => "outside_collection",
                RangeError::UnknownCategory(_) => "unknown_category",
                RangeError::RankOutOfQuota { .. } => "rank_out_of_quota",
            },
            Self::Mint(MintError::SupplyExhausted { .. }) => "supply_exhausted",
        }
    }

    /// Whether this is a configuration-time rejection.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            EngineError::from(StateError::AlreadyRevealed).code(),
            "already_revealed"
        );
        assert_eq!(
            EngineError::from(RangeError::UnknownItem { index: 3, minted: 2 }).code(),
            "unknown_item"
        );
        let e = EngineError::from(ConfigError::QuotaMismatch {
            declared: 999,
            expected: 1000,
        });
        assert_eq!(e.code(), "quota_mismatch");
        assert!(e.is_config());
        assert_eq!(e.to_string(), "declared quotas sum to 999, expected 1000");
    }
}
