//! Descriptor records.
//!
//! A [`Descriptor`] is the externally visible view of one item. Before reveal
//! every item gets the same placeholder record, so nothing about the eventual
//! category leaks. After reveal the record carries the ordinal label, the
//! category name and the rank-derived asset reference.
//!
//! [`Descriptor::to_json`] renders the metadata document shape consumed by
//! marketplaces:
//!
//! ```json
//! {"name":"zkMon #5","description":"...","image":"ipfs://.../17",
//!  "attributes":[{"trait_type":"Creature","value":"Owl"}]}
//! ```
//!
//! [`Descriptor::to_data_uri`] wraps that document as a self-contained
//! `data:application/json;base64,...` URI.

use crate::{Assignment, Category, CollectionMeta, ItemIndex};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Media-type prefix of [`Descriptor::to_data_uri`].
pub const DATA_URI_PREFIX: &str = "data:application/json;base64,";

/// Structured descriptor of one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Display name.
    pub name: String,
    /// Category name; `None` before reveal.
    pub category_label: Option<String>,
    /// Unique asset reference (shared placeholder before reveal).
    pub asset_reference: String,
    /// Shared description.
    pub description: String,
}

#[derive(Serialize)]
struct Attribute<'a> {
    trait_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct Document<'a> {
    name: &'a str,
    description: &'a str,
    image: &'a str,
    attributes: Vec<Attribute<'a>>,
}

impl Descriptor {
    /// Placeholder shared by every item before reveal.
    #[must_use]
    pub fn placeholder(meta: &CollectionMeta) -> Self {
        Self {
            name: meta.name.clone(),
            category_label: None,
            asset_reference: meta.placeholder_asset.clone(),
            description: meta.description.clone(),
        }
    }

    /// Revealed record for `index` assigned to `assignment` in `category`.
    #[must_use]
    pub fn revealed(
        meta: &CollectionMeta,
        index: ItemIndex,
        category: &Category,
        assignment: Assignment,
    ) -> Self {
        debug_assert_eq!(category.id, assignment.category);
        Self {
            name: format!("{} #{index}", meta.name),
            category_label: Some(category.name.clone()),
            asset_reference: category.asset_template.render(assignment.rank),
            description: meta.description.clone(),
        }
    }

    /// Whether this is a revealed record.
    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        self.category_label.is_some()
    }

    /// Render the metadata document; the category is published under `trait_label`.
    ///
    /// # Errors
    /// Only if JSON serialization fails.
    pub fn to_json(&self, trait_label: &str) -> serde_json::Result<String> {
        let attributes = self
            .category_label
            .as_deref()
            .map(|value| Attribute {
                trait_type: trait_label,
                value,
            })
            .into_iter()
            .collect();
        serde_json::to_string(&Document {
            name: &self.name,
            description: &self.description,
            image: &self.asset_reference,
            attributes,
        })
    }

    /// [`Self::to_json`] as a base64 `data:` URI.
    ///
    /// # Errors
    /// Only if JSON serialization fails.
    pub fn to_data_uri(&self, trait_label: &str) -> serde_json::Result<String> {
        let doc = self.to_json(trait_label)?;
        Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(doc)))
    }
}
