//! Engine façade.
//!
//! Lifecycle: register categories → close against the maximum item count →
//! reveal once → query descriptors. Registration, closing and reveal take
//! `&mut self`, so the host serializes them; descriptor queries take `&self`
//! and are pure, so any number of readers may share the engine.

use crate::descriptor::Descriptor;
use crate::entropy::RandomnessSource;
use crate::error::{ConfigError, EngineError, RangeError};
use crate::ledger::MintCounter;
use crate::registry::{CategoryRegistry, Collection};
use crate::reveal::RevealState;
use crate::{AssetTemplate, Assignment, CategoryId, CollectionMeta, ItemIndex, Seed};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

#[derive(Clone, Debug)]
enum Phase {
    Open(CategoryRegistry),
    Closed(Collection),
}

/// Quota-exact reveal engine.
#[derive(Clone, Debug)]
pub struct RevealEngine {
    meta: CollectionMeta,
    phase: Phase,
    reveal: RevealState,
}

impl RevealEngine {
    /// Engine with an open, empty registry.
    #[must_use]
    pub fn new(meta: CollectionMeta) -> Self {
        Self {
            meta,
            phase: Phase::Open(CategoryRegistry::new()),
            reveal: RevealState::Unrevealed,
        }
    }

    /// Rebuild an engine from an already validated collection and state.
    #[must_use]
    pub fn from_parts(meta: CollectionMeta, collection: Collection, reveal: RevealState) -> Self {
        Self {
            meta,
            phase: Phase::Closed(collection),
            reveal,
        }
    }

    /// Collection-wide display settings.
    #[must_use]
    pub const fn meta(&self) -> &CollectionMeta {
        &self.meta
    }

    /// Register a category.
    ///
    /// # Errors
    /// `RegistrationClosed` once closed or revealed, `DuplicateCategory`,
    /// `ZeroQuota`.
    pub fn register(
        &mut self,
        id: CategoryId,
        quota: u64,
        name: impl Into<String>,
        asset_template: impl Into<String>,
    ) -> Result<(), EngineError> {
        if self.reveal.is_revealed() {
            return Err(ConfigError::RegistrationClosed.into());
        }
        match &mut self.phase {
            Phase::Open(reg) => Ok(reg.register(id, quota, name, asset_template)?),
            Phase::Closed(_) => Err(ConfigError::RegistrationClosed.into()),
        }
    }

    /// Freeze the registry against `max_items`.
    ///
    /// On error the registry stays open so the configuration can be fixed.
    ///
    /// # Errors
    /// `RegistrationClosed` if already closed; otherwise the first violated
    /// collection invariant.
    pub fn close(&mut self, max_items: u64) -> Result<&Collection, EngineError> {
        let collection = match &self.phase {
            Phase::Open(reg) => reg.close(max_items)?,
            Phase::Closed(_) => return Err(ConfigError::RegistrationClosed.into()),
        };
        self.phase = Phase::Closed(collection);
        self.collection()
    }

    /// Whether the registry is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.phase, Phase::Closed(_))
    }

    /// Frozen collection.
    ///
    /// # Errors
    /// `RegistryOpen` before [`Self::close`].
    pub fn collection(&self) -> Result<&Collection, EngineError> {
        match &self.phase {
            Phase::Closed(c) => Ok(c),
            Phase::Open(_) => Err(EngineError::Config(ConfigError::RegistryOpen)),
        }
    }

    /// Quota of `id`.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn quota_of(&self, id: CategoryId) -> Result<u64, EngineError> {
        match &self.phase {
            Phase::Open(reg) => reg
                .get(id)
                .map(|c| c.quota)
                .ok_or_else(|| RangeError::UnknownCategory(id).into()),
            Phase::Closed(c) => Ok(c.quota_of(id)?),
        }
    }

    /// Name of `id`.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn name_of(&self, id: CategoryId) -> Result<&str, EngineError> {
        match &self.phase {
            Phase::Open(reg) => reg
                .get(id)
                .map(|c| c.name.as_str())
                .ok_or_else(|| RangeError::UnknownCategory(id).into()),
            Phase::Closed(c) => Ok(c.name_of(id)?),
        }
    }

    /// Asset template of `id`.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn asset_template_of(&self, id: CategoryId) -> Result<&AssetTemplate, EngineError> {
        match &self.phase {
            Phase::Open(reg) => reg
                .get(id)
                .map(|c| &c.asset_template)
                .ok_or_else(|| RangeError::UnknownCategory(id).into()),
            Phase::Closed(c) => Ok(c.asset_template_of(id)?),
        }
    }

    /// Sum of all registered quotas.
    #[must_use]
    pub fn total_declared_quota(&self) -> u64 {
        match &self.phase {
            Phase::Open(reg) => reg.total_declared_quota(),
            Phase::Closed(c) => c.total_declared_quota(),
        }
    }

    /// Check that the mint cap matches the declared quota total.
    ///
    /// # Errors
    /// `SupplyMismatch`.
    pub fn ensure_supply(&self, cap: u64) -> Result<(), EngineError> {
        let declared = self.total_declared_quota();
        if cap == declared {
            Ok(())
        } else {
            Err(ConfigError::SupplyMismatch { cap, declared }.into())
        }
    }

    /// The one irreversible transition.
    ///
    /// # Errors
    /// `AlreadyRevealed` (seed unchanged), `RegistryOpen`, or
    /// `RandomnessUnavailable` (state unchanged).
    pub fn reveal<R: RandomnessSource + ?Sized>(
        &mut self,
        source: &mut R,
    ) -> Result<Seed, EngineError> {
        // A revealed engine is always closed, so `AlreadyRevealed` still wins.
        let total = self.collection()?.size();
        Ok(self.reveal.reveal(source, total)?)
    }

    /// Whether reveal happened.
    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        self.reveal.is_revealed()
    }

    /// Current reveal state.
    #[must_use]
    pub const fn reveal_state(&self) -> &RevealState {
        &self.reveal
    }

    /// Committed seed.
    ///
    /// # Errors
    /// `NotRevealed`.
    pub fn seed(&self) -> Result<&Seed, EngineError> {
        Ok(self.reveal.seed()?)
    }

    /// `(category, rank)` of `index`.
    ///
    /// # Errors
    /// `NotRevealed` or `OutsideCollection`.
    pub fn category_of(&self, index: ItemIndex) -> Result<Assignment, EngineError> {
        let seed = self.reveal.seed()?;
        let collection = self.collection()?;
        Ok(collection.assigner(seed)?.category_of(index)?)
    }

    /// Item index holding `assignment`.
    ///
    /// # Errors
    /// `NotRevealed`, `UnknownCategory` or `RankOutOfQuota`.
    pub fn item_of(&self, assignment: Assignment) -> Result<ItemIndex, EngineError> {
        let seed = self.reveal.seed()?;
        let collection = self.collection()?;
        Ok(collection.assigner(seed)?.item_of(assignment)?)
    }

    /// Descriptor of a minted item.
    ///
    /// # Errors
    /// `UnknownItem` if `index ≥ mints.minted()`.
    pub fn descriptor_of<M: MintCounter + ?Sized>(
        &self,
        index: ItemIndex,
        mints: &M,
    ) -> Result<Descriptor, EngineError> {
        let minted = mints.minted();
        if index >= minted {
            return Err(RangeError::UnknownItem { index, minted }.into());
        }
        let RevealState::Revealed { seed } = &self.reveal else {
            return Ok(Descriptor::placeholder(&self.meta));
        };
        let collection = self.collection()?;
        let assignment = collection.assigner(seed)?.category_of(index)?;
        let category = collection.category(assignment.category)?;
        Ok(Descriptor::revealed(&self.meta, index, category, assignment))
    }

    /// Walk every minted item once: category histogram and asset uniqueness.
    ///
    /// # Errors
    /// `NotRevealed`, or any per-item descriptor error.
    pub fn audit<M: MintCounter + ?Sized>(&self, mints: &M) -> Result<AuditReport, EngineError> {
        let seed = self.reveal.seed()?;
        let collection = self.collection()?;
        let assigner = collection.assigner(seed)?;

        let minted = mints.minted();
        let mut histogram: BTreeMap<CategoryId, u64> = BTreeMap::new();
        let mut assets = HashSet::new();
        let mut duplicate_assets = Vec::new();
        for index in 0..minted {
            let assignment = assigner.category_of(index)?;
            let category = collection.category(assignment.category)?;
            *histogram.entry(assignment.category).or_default() += 1;
            let asset = category.asset_template.render(assignment.rank);
            if !assets.insert(asset.clone()) {
                duplicate_assets.push(asset);
            }
        }
        info!(minted, categories = histogram.len(), "audit complete");
        Ok(AuditReport {
            minted,
            histogram,
            duplicate_assets,
        })
    }
}

/// Result of [`RevealEngine::audit`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Items walked.
    pub minted: u64,
    /// Items per category.
    pub histogram: BTreeMap<CategoryId, u64>,
    /// Asset references seen more than once.
    pub duplicate_assets: Vec<String>,
}

impl AuditReport {
    /// Whether every asset reference was distinct.
    #[must_use]
    pub fn assets_unique(&self) -> bool {
        self.duplicate_assets.is_empty()
    }

    /// Whether the histogram equals the declared quotas exactly.
    ///
    /// Only meaningful once the whole collection is minted.
    #[must_use]
    pub fn matches_quotas(&self, collection: &Collection) -> bool {
        self.minted == collection.size()
            && self.histogram.len() == collection.len()
            && collection
                .categories()
                .iter()
                .all(|c| self.histogram.get(&c.id) == Some(&c.quota))
    }
}
