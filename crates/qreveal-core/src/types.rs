//! Core data types shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense, zero-based category identifier.
pub type CategoryId = u32;

/// Mint-order index of an item (0-based, never reused).
pub type ItemIndex = u64;

/// Committed 32-byte reveal seed.
pub type Seed = [u8; 32];

/// Placeholder substituted by the rank inside an asset template.
pub const RANK_PLACEHOLDER: &str = "{rank}";

/// Asset-location template parameterized by rank-within-category.
///
/// With a `{rank}` placeholder every occurrence is substituted; without one
/// the rank is appended, matching base-URI style locations such as
/// `ipfs://Qm.../`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AssetTemplate(String);

impl AssetTemplate {
    /// Wrap a template string (no validation).
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Raw template text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the asset reference for `rank`.
    #[must_use]
    pub fn render(&self, rank: u64) -> String {
        if self.0.contains(RANK_PLACEHOLDER) {
            self.0.replace(RANK_PLACEHOLDER, &rank.to_string())
        } else {
            format!("{}{rank}", self.0)
        }
    }

    /// Text preceding the first rank substitution.
    ///
    /// Two templates whose prefixes are not prefix-related can never render
    /// the same reference.
    #[must_use]
    pub fn literal_prefix(&self) -> &str {
        self.0
            .find(RANK_PLACEHOLDER)
            .map_or(self.0.as_str(), |at| &self.0[..at])
    }
}

impl fmt::Display for AssetTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered category.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Dense identifier.
    pub id: CategoryId,
    /// Display name (published as the category label).
    pub name: String,
    /// Exact number of items that end up in this category (> 0).
    pub quota: u64,
    /// Asset-location template.
    pub asset_template: AssetTemplate,
}

/// Collection-wide display settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionMeta {
    /// Collection name; items are labelled `"<name> #<index>"`.
    pub name: String,
    /// Shared description.
    pub description: String,
    /// Asset shown for every item before reveal.
    pub placeholder_asset: String,
    /// Attribute name under which the category label is published.
    #[serde(default = "default_trait_label")]
    pub trait_label: String,
}

fn default_trait_label() -> String {
    "Category".to_owned()
}

impl CollectionMeta {
    /// Meta with the default trait label.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        placeholder_asset: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            placeholder_asset: placeholder_asset.into(),
            trait_label: default_trait_label(),
        }
    }

    /// Override the trait label.
    #[must_use]
    pub fn with_trait_label(mut self, label: impl Into<String>) -> Self {
        self.trait_label = label.into();
        self
    }
}

/// `(category, rank)` assignment of a revealed item.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Assignment {
    /// Category the item belongs to.
    pub category: CategoryId,
    /// Position among the items of that category, in `[0, quota)`.
    pub rank: u64,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category {} rank {}", self.category, self.rank)
    }
}
