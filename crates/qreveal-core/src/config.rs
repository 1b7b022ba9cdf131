//! TOML collection configuration.
//!
//! ```toml
//! name = "zkMon"
//! description = "TBD - Description to be defined"
//! placeholder_asset = "ipfs://QmUnrevealed"
//! trait_label = "Creature"
//! max_items = 1000
//!
//! [[category]]
//! id = 0
//! name = "Ape"
//! quota = 125
//! asset_template = "ipfs://QmApe/"
//! ```
//!
//! Categories are registered in file order and the registry is closed against
//! `max_items`, so every configuration error surfaces at load time.

use crate::engine::RevealEngine;
use crate::error::EngineError;
use crate::{CategoryId, CollectionMeta};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `[[category]]` table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Dense id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Exact item count.
    pub quota: u64,
    /// Asset-location template.
    pub asset_template: String,
}

/// Whole collection file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Display settings.
    #[serde(flatten)]
    pub meta: CollectionMeta,
    /// Maximum item count; must equal the quota sum.
    pub max_items: u64,
    /// Categories in registration order.
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryConfig>,
}

impl CollectionConfig {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse collection config")
    }

    /// Read a TOML file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read collection config {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("in collection config {}", path.display()))
    }

    /// Register every category and close the registry.
    pub fn build(&self) -> Result<RevealEngine, EngineError> {
        let mut engine = RevealEngine::new(self.meta.clone());
        for c in &self.categories {
            engine.register(c.id, c.quota, c.name.clone(), c.asset_template.clone())?;
        }
        engine.close(self.max_items)?;
        Ok(engine)
    }
}
