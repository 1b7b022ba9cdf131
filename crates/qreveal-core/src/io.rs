//! Snapshot I/O.
//!
//! A [`Snapshot`] is the full persisted state of a closed collection: display
//! settings, the declared categories, the reveal state and the mint ledger.
//! JSON and CBOR are supported with extension-based auto-detection; unknown
//! extensions are rejected for reads and default to JSON for writes.
//!
//! Loading re-validates the collection (the quota map is rebuilt, never
//! trusted from disk) and the ledger against it.

use crate::engine::RevealEngine;
use crate::ledger::{MintCounter, MintLedger};
use crate::registry::Collection;
use crate::reveal::RevealState;
use crate::CollectionMeta;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Format version for [`Snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted engine state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Schema version.
    pub version: u32,
    /// Display settings.
    pub meta: CollectionMeta,
    /// Frozen collection.
    pub collection: Collection,
    /// Reveal state.
    pub reveal: RevealState,
    /// Mint ledger.
    pub ledger: MintLedger,
}

impl Snapshot {
    /// Capture a closed engine and its ledger.
    pub fn capture(engine: &RevealEngine, ledger: &MintLedger) -> Result<Self> {
        let collection = engine
            .collection()
            .context("only closed collections can be persisted")?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            meta: engine.meta().clone(),
            collection: collection.clone(),
            reveal: *engine.reveal_state(),
            ledger: *ledger,
        })
    }

    /// Validate and split back into engine and ledger.
    pub fn restore(self) -> Result<(RevealEngine, MintLedger)> {
        if self.version != SNAPSHOT_VERSION {
            bail!(
                "unsupported snapshot version {} (expected {})",
                self.version,
                SNAPSHOT_VERSION
            );
        }
        if self.ledger.minted() > self.ledger.max_supply() {
            bail!(
                "ledger minted {} beyond its cap {}",
                self.ledger.minted(),
                self.ledger.max_supply()
            );
        }
        let engine = RevealEngine::from_parts(self.meta, self.collection, self.reveal);
        engine
            .ensure_supply(self.ledger.max_supply())
            .context("ledger disagrees with collection")?;
        Ok((engine, self.ledger))
    }
}

/// Ensure the parent directory for a file exists (no-op if none).
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", display(path)))?;
        }
    }
    Ok(())
}

/// Read a snapshot from **JSON**.
pub fn read_snapshot_json<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let rdr = BufReader::new(f);
    serde_json::from_reader(rdr).with_context(|| "deserialize JSON snapshot")
}

/// Write a snapshot to **JSON** (pretty).
pub fn write_snapshot_json<P: AsRef<Path>>(path: P, v: &Snapshot) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, v).with_context(|| "serialize JSON snapshot")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/// Read a snapshot from **CBOR**.
pub fn read_snapshot_cbor<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let mut rdr = BufReader::new(f);
    ciborium::de::from_reader(&mut rdr).with_context(|| "deserialize CBOR snapshot")
}

/// Write a snapshot to **CBOR**.
pub fn write_snapshot_cbor<P: AsRef<Path>>(path: P, v: &Snapshot) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(v, &mut w).with_context(|| "serialize CBOR snapshot")?;
    w.flush().with_context(|| "flush CBOR writer")?;
    Ok(())
}

/// Auto-detect read by extension `.json` / `.cbor` (case-insensitive).
pub fn read_snapshot_auto<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => read_snapshot_json(path),
        Some("cbor") => read_snapshot_cbor(path),
        Some(other) => Err(anyhow!(
            "unsupported snapshot extension: {} (supported: .json, .cbor)",
            other
        )),
        None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
    }
}

/// Auto-detect write (defaults to **JSON** if unknown or missing).
pub fn write_snapshot_auto<P: AsRef<Path>>(path: P, v: &Snapshot) -> Result<()> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("cbor") => write_snapshot_cbor(path, v),
        _ => write_snapshot_json(path, v),
    }
}

/// Load and restore in one step.
pub fn load_engine<P: AsRef<Path>>(path: P) -> Result<(RevealEngine, MintLedger)> {
    let path_ref = path.as_ref();
    read_snapshot_auto(path_ref)?
        .restore()
        .with_context(|| format!("restore snapshot {}", display(path_ref)))
}

/// Capture and write in one step.
pub fn save_engine<P: AsRef<Path>>(path: P, engine: &RevealEngine, ledger: &MintLedger) -> Result<()> {
    write_snapshot_auto(path, &Snapshot::capture(engine, ledger)?)
}

#[inline]
fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[inline]
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;

    fn closed() -> (RevealEngine, MintLedger) {
        let mut e = RevealEngine::new(CollectionMeta::new("t", "d", "ipfs://p"));
        e.register(0, 2, "A", "a/").unwrap();
        e.register(1, 2, "B", "b/").unwrap();
        e.close(4).unwrap();
        let mut l = MintLedger::new(4);
        l.mint().unwrap();
        (e, l)
    }

    #[test]
    fn json_and_cbor_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, l) = closed();
        e.reveal(&mut FixedEntropy([5; 32])).unwrap();

        for name in ["state.json", "state.cbor", "nested/state.CBOR"] {
            let path = dir.path().join(name);
            save_engine(&path, &e, &l).unwrap();
            let (back, ledger) = load_engine(&path).unwrap();
            assert_eq!(back.seed().unwrap(), e.seed().unwrap());
            assert_eq!(ledger, l);
            assert_eq!(back.category_of(3).unwrap(), e.category_of(3).unwrap());
        }
    }

    #[test]
    fn unknown_extension_rejected_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let (e, l) = closed();
        let path = dir.path().join("state.bin");
        save_engine(&path, &e, &l).unwrap();
        assert!(read_snapshot_auto(&path).is_err());
        assert!(read_snapshot_json(&path).is_ok());
    }

    #[test]
    fn open_registry_cannot_be_captured() {
        let e = RevealEngine::new(CollectionMeta::new("t", "d", "p"));
        assert!(Snapshot::capture(&e, &MintLedger::new(1)).is_err());
    }

    #[test]
    fn restore_rejects_mismatched_ledger() {
        let (e, _) = closed();
        let snap = Snapshot::capture(&e, &MintLedger::new(5)).unwrap();
        assert!(snap.restore().is_err());

        let mut snap = Snapshot::capture(&e, &MintLedger::new(4)).unwrap();
        snap.version = 99;
        assert!(snap.restore().is_err());
    }
}
