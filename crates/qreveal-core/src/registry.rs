//! Category registry (open, mutable) and the frozen [`Collection`] it closes into.
//!
//! Closing validates every collection invariant up front, so configuration
//! mistakes surface here and never lazily at query time:
//! - at least one category and a non-zero maximum item count,
//! - dense ids `0..k`,
//! - quotas summing exactly to the maximum item count,
//! - asset templates with pairwise non-overlapping namespaces.

use crate::error::{ConfigError, RangeError};
use crate::quota::{Assigner, QuotaMap};
use crate::{AssetTemplate, Category, CategoryId, Seed};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Mutable registry used before the collection is frozen.
#[derive(Clone, Debug, Default)]
pub struct CategoryRegistry {
    categories: BTreeMap<CategoryId, Category>,
}

impl CategoryRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category.
    ///
    /// # Errors
    /// `DuplicateCategory` if `id` exists, `ZeroQuota` if `quota == 0`.
    pub fn register(
        &mut self,
        id: CategoryId,
        quota: u64,
        name: impl Into<String>,
        asset_template: impl Into<String>,
    ) -> Result<(), ConfigError> {
        if self.categories.contains_key(&id) {
            return Err(ConfigError::DuplicateCategory(id));
        }
        if quota == 0 {
            return Err(ConfigError::ZeroQuota(id));
        }
        let category = Category {
            id,
            name: name.into(),
            quota,
            asset_template: AssetTemplate::new(asset_template),
        };
        debug!(id, quota, name = %category.name, "registered category");
        self.categories.insert(id, category);
        Ok(())
    }

    /// Registered category, if any.
    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    /// Number of registered categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Sum of registered quotas (saturating).
    #[must_use]
    pub fn total_declared_quota(&self) -> u64 {
        self.categories
            .values()
            .fold(0u64, |acc, c| acc.saturating_add(c.quota))
    }

    /// Validate and freeze against `max_items`.
    ///
    /// # Errors
    /// Any [`ConfigError`] describing the first violated invariant.
    pub fn close(&self, max_items: u64) -> Result<Collection, ConfigError> {
        let collection = Collection::new(self.categories.values().cloned().collect(), max_items)?;
        info!(
            categories = collection.len(),
            max_items, "registry closed"
        );
        Ok(collection)
    }
}

/// Frozen category set with its quota map. Read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CollectionWire", try_from = "CollectionWire")]
pub struct Collection {
    categories: Vec<Category>,
    map: QuotaMap,
}

/// Serialized form: only the declared data, the map is rebuilt on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CollectionWire {
    max_items: u64,
    categories: Vec<Category>,
}

impl From<Collection> for CollectionWire {
    fn from(c: Collection) -> Self {
        Self {
            max_items: c.size(),
            categories: c.categories,
        }
    }
}

impl TryFrom<CollectionWire> for Collection {
    type Error = ConfigError;

    fn try_from(w: CollectionWire) -> Result<Self, Self::Error> {
        Self::new(w.categories, w.max_items)
    }
}

impl Collection {
    /// Validate `categories` (any order) against `max_items`.
    ///
    /// # Errors
    /// See the module docs.
    pub fn new(mut categories: Vec<Category>, max_items: u64) -> Result<Self, ConfigError> {
        if categories.is_empty() || max_items == 0 {
            return Err(ConfigError::EmptyCollection);
        }
        categories.sort_by_key(|c| c.id);
        for (expected, c) in categories.iter().enumerate() {
            let expected = CategoryId::try_from(expected).map_err(|_| ConfigError::QuotaOverflow)?;
            if c.id == expected {
                continue;
            }
            return Err(if c.id < expected {
                ConfigError::DuplicateCategory(c.id)
            } else {
                ConfigError::SparseCategoryIds(expected)
            });
        }

        let map = QuotaMap::new(&categories)?;
        if map.total() != max_items {
            return Err(ConfigError::QuotaMismatch {
                declared: map.total(),
                expected: max_items,
            });
        }
        check_templates(&categories)?;

        Ok(Self { categories, map })
    }

    /// Total item count `N`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.map.total()
    }

    /// Sum of quotas (equals [`Self::size`]).
    #[inline]
    #[must_use]
    pub const fn total_declared_quota(&self) -> u64 {
        self.map.total()
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always false for a constructed collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories in id order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category by id.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn category(&self, id: CategoryId) -> Result<&Category, RangeError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.categories.get(i))
            .ok_or(RangeError::UnknownCategory(id))
    }

    /// Quota of `id`.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn quota_of(&self, id: CategoryId) -> Result<u64, RangeError> {
        self.category(id).map(|c| c.quota)
    }

    /// Name of `id`.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn name_of(&self, id: CategoryId) -> Result<&str, RangeError> {
        self.category(id).map(|c| c.name.as_str())
    }

    /// Asset template of `id`.
    ///
    /// # Errors
    /// `UnknownCategory`.
    pub fn asset_template_of(&self, id: CategoryId) -> Result<&AssetTemplate, RangeError> {
        self.category(id).map(|c| &c.asset_template)
    }

    /// Underlying quota map.
    #[must_use]
    pub const fn quota_map(&self) -> &QuotaMap {
        &self.map
    }

    /// Bind the assignment function to `seed`.
    ///
    /// # Errors
    /// Never for a constructed collection; kept fallible for the map contract.
    pub fn assigner(&self, seed: &Seed) -> Result<Assigner<'_>, ConfigError> {
        Assigner::new(seed, &self.map)
    }
}

/// Reject template sets where one literal prefix extends another.
///
/// After sorting, a prefix relation always shows up between neighbours.
fn check_templates(categories: &[Category]) -> Result<(), ConfigError> {
    let mut prefixes: Vec<(&str, CategoryId)> = categories
        .iter()
        .map(|c| (c.asset_template.literal_prefix(), c.id))
        .collect();
    prefixes.sort_unstable();
    for pair in prefixes.windows(2) {
        let ((a, ia), (b, ib)) = (pair[0], pair[1]);
        if b.starts_with(a) {
            return Err(ConfigError::AmbiguousAssetTemplate(ia.min(ib), ia.max(ib)));
        }
    }
    Ok(())
}
