//! qreveal-core: quota-exact reveal engine.
//!
//! This crate holds everything between "categories were declared" and
//! "every item has exactly one category":
//! - the category registry and the frozen [`Collection`] it closes into,
//! - the one-shot [`RevealState`] machine fed by a [`RandomnessSource`],
//! - the quota map that turns a keyed permutation of `[0, N)` into
//!   `(category, rank)` pairs with exact per-category counts,
//! - the descriptor assembler, and
//! - JSON/CBOR snapshot I/O plus TOML collection configs.
//!
//! No per-item assignment table is ever stored; assignments are recomputed
//! from the committed seed on every query.
//!
//! ```no_run
//! use qreveal_core::prelude::*;
//! # fn main() -> Result<(), EngineError> {
//! let mut engine = RevealEngine::new(CollectionMeta::new("zkMon", "desc", "ipfs://placeholder"));
//! engine.register(0, 2, "Ape", "ipfs://ape/")?;
//! engine.register(1, 1, "Owl", "ipfs://owl/{rank}.json")?;
//! engine.close(3)?;
//!
//! let mut ledger = MintLedger::new(3);
//! for _ in 0..3 { ledger.mint()?; }
//!
//! engine.reveal(&mut SeededEntropy::new(7))?;
//! let d = engine.descriptor_of(0, &ledger)?;
//! # let _ = d;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// TOML collection configuration.
pub mod config;
/// Descriptor records and their JSON document rendering.
pub mod descriptor;
/// Engine façade tying registry, reveal state and assembler together.
pub mod engine;
/// Randomness sources consumed once by the reveal transition.
pub mod entropy;
/// Typed error taxonomy with stable reason codes.
pub mod error;
/// JSON/CBOR snapshot I/O with extension auto-detection.
pub mod io;
/// Mint counter boundary and a reference ledger.
pub mod ledger;
/// Quota map: permuted index → `(category, rank)`.
pub mod quota;
/// Category registry and the frozen collection.
pub mod registry;
/// One-shot reveal state machine.
pub mod reveal;
/// Core data types.
pub mod types;

pub use descriptor::*;
pub use engine::*;
pub use entropy::*;
pub use error::*;
pub use ledger::*;
pub use quota::*;
pub use registry::*;
pub use reveal::*;
pub use types::*;

/// Commonly-used items for quick imports.
pub mod prelude {
    pub use crate::{
        descriptor::Descriptor,
        engine::{AuditReport, RevealEngine},
        entropy::{FixedEntropy, OsEntropy, RandomnessSource, SeededEntropy},
        error::EngineError,
        ledger::{MintCounter, MintLedger},
        reveal::RevealState,
        types::*,
    };
}
