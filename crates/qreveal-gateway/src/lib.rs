// crates/qreveal-gateway/src/lib.rs

//! Proof admission gateway.
//!
//! Off-chain state is committed to a root (a Poseidon Merkle root in
//! production) and proven correct by an externally generated zk-SNARK. This
//! crate is the boundary that decides whether such a root becomes trusted:
//!
//! - [`ProofVerifier`] is the opaque verifier capability; the gateway never
//!   looks inside proofs, it only consumes the yes/no answer.
//! - [`AdmissionGateway`] admits a [`ProofBundle`] only if the verifier
//!   accepts it, then appends an [`AdmissionRecord`] to its trusted-root log.
//! - [`DigestVerifier`] is scaffolding that lets the boundary be exercised
//!   without a SNARK backend.
//!
//! The gateway is independent of the reveal engine; neither calls the other.
//!
//! ## Contracts verifiers should uphold
//! - Return `Ok(false)` for a well-formed proof that does not verify.
//! - Return `Err` only when verification could not be carried out.
//! - Never panic on malformed input.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::missing_errors_doc)]

use anyhow::{Context, Result};
use qreveal_crypto::bind_public_inputs;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// 32-byte state root claimed by a proof.
pub type Root = [u8; 32];

/// File names inside a proof bundle directory.
pub const PROOF_FILE: &str = "proof";
/// Public inputs (instance limbs) file name.
pub const INSTANCE_FILE: &str = "limbs_instance";
/// Claimed root file name (hex text).
pub const ROOT_FILE: &str = "root";

/// Admission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The verifier answered "no".
    #[error("proof rejected for root {0}")]
    ProofRejected(String),
    /// The verifier could not run.
    #[error("verifier failure: {0}")]
    Verifier(String),
    /// The claimed root is not 32 bytes of hex.
    #[error("malformed root: {0}")]
    MalformedRoot(String),
}

/// Opaque verifier capability.
pub trait ProofVerifier {
    /// Check `proof` against `public_inputs` and `claimed_root`.
    ///
    /// # Errors
    /// Only when verification could not be carried out.
    fn verify(
        &self,
        proof: &[u8],
        public_inputs: &[u8],
        claimed_root: &Root,
    ) -> Result<bool, AdmissionError>;
}

impl<V: ProofVerifier + ?Sized> ProofVerifier for &V {
    fn verify(
        &self,
        proof: &[u8],
        public_inputs: &[u8],
        claimed_root: &Root,
    ) -> Result<bool, AdmissionError> {
        (**self).verify(proof, public_inputs, claimed_root)
    }
}

/// Parse a root from hex, with or without a `0x` prefix.
pub fn parse_root(text: &str) -> Result<Root, AdmissionError> {
    let t = text.trim();
    let t = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    let mut out = [0u8; 32];
    hex::decode_to_slice(t, &mut out).map_err(|e| AdmissionError::MalformedRoot(e.to_string()))?;
    Ok(out)
}

/// Proof, public inputs and claimed root submitted together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofBundle {
    /// Opaque proof bytes.
    pub proof: Vec<u8>,
    /// Opaque public-input bytes.
    pub public_inputs: Vec<u8>,
    /// Root the proof claims to attest.
    pub claimed_root: Root,
}

impl ProofBundle {
    /// Load `proof`, `limbs_instance` (raw bytes) and `root` (hex text) from `dir`.
    pub fn read_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let p = dir.join(name);
            std::fs::read(&p).with_context(|| format!("read {}", p.display()))
        };
        let proof = read(PROOF_FILE)?;
        let public_inputs = read(INSTANCE_FILE)?;
        let root_text = String::from_utf8(read(ROOT_FILE)?).context("root file is not UTF-8")?;
        let claimed_root = parse_root(&root_text)?;
        Ok(Self {
            proof,
            public_inputs,
            claimed_root,
        })
    }

    /// Write the bundle in the layout [`Self::read_dir`] expects.
    pub fn write_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        std::fs::write(dir.join(PROOF_FILE), &self.proof)?;
        std::fs::write(dir.join(INSTANCE_FILE), &self.public_inputs)?;
        std::fs::write(
            dir.join(ROOT_FILE),
            format!("0x{}\n", hex::encode(self.claimed_root)),
        )?;
        Ok(())
    }
}

/// One admitted root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    /// Trusted root.
    #[serde(with = "hex")]
    pub root: Root,
    /// Position in the log (0-based).
    pub sequence: u64,
    /// BLAKE3 of the admitted proof bytes.
    #[serde(with = "hex")]
    pub proof_digest: [u8; 32],
}

/// Append-only log of trusted roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedRootLog {
    records: Vec<AdmissionRecord>,
}

impl TrustedRootLog {
    /// Record for `root`, if trusted.
    #[must_use]
    pub fn find(&self, root: &Root) -> Option<&AdmissionRecord> {
        self.records.iter().find(|r| &r.root == root)
    }

    /// All records in admission order.
    #[must_use]
    pub fn records(&self) -> &[AdmissionRecord] {
        &self.records
    }

    /// Number of trusted roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no root is trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn append(&mut self, root: Root, proof_digest: [u8; 32]) -> AdmissionRecord {
        let record = AdmissionRecord {
            root,
            sequence: self.records.len() as u64,
            proof_digest,
        };
        self.records.push(record.clone());
        record
    }

    /// Read from JSON; a missing file yields an empty log.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(f)).context("deserialize trusted-root log")
    }

    /// Write to JSON (pretty).
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self).context("serialize trusted-root log")?;
        w.flush().context("flush trusted-root log")?;
        Ok(())
    }
}

/// Verifier-gated admission of roots.
#[derive(Clone, Debug)]
pub struct AdmissionGateway<V> {
    verifier: V,
    log: TrustedRootLog,
}

impl<V: ProofVerifier> AdmissionGateway<V> {
    /// Gateway with an empty log.
    pub fn new(verifier: V) -> Self {
        Self::with_log(verifier, TrustedRootLog::default())
    }

    /// Gateway continuing an existing log.
    pub const fn with_log(verifier: V, log: TrustedRootLog) -> Self {
        Self { verifier, log }
    }

    /// Verify `bundle` and trust its root on success.
    ///
    /// Re-admitting an already trusted root returns the existing record and
    /// leaves the log unchanged.
    pub fn admit(&mut self, bundle: &ProofBundle) -> Result<AdmissionRecord, AdmissionError> {
        let root_hex = hex::encode(bundle.claimed_root);
        let ok = self
            .verifier
            .verify(&bundle.proof, &bundle.public_inputs, &bundle.claimed_root)?;
        if !ok {
            warn!(root = %root_hex, "proof rejected");
            return Err(AdmissionError::ProofRejected(root_hex));
        }
        if let Some(existing) = self.log.find(&bundle.claimed_root) {
            return Ok(existing.clone());
        }
        let record = self
            .log
            .append(bundle.claimed_root, *blake3::hash(&bundle.proof).as_bytes());
        info!(root = %root_hex, sequence = record.sequence, "root admitted");
        Ok(record)
    }

    /// Whether `root` was admitted.
    #[must_use]
    pub fn is_trusted(&self, root: &Root) -> bool {
        self.log.find(root).is_some()
    }

    /// Trusted-root log.
    #[must_use]
    pub const fn log(&self) -> &TrustedRootLog {
        &self.log
    }

    /// Consume the gateway, returning its log.
    #[must_use]
    pub fn into_log(self) -> TrustedRootLog {
        self.log
    }
}

/// Scaffolding verifier: accepts a proof equal to the BLAKE3 binding of the
/// public inputs to the claimed root.
///
/// ⚠️ Not a proof system. It exists so the admission path can be driven end
/// to end in tests and dry runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestVerifier;

impl DigestVerifier {
    /// Produce the proof this verifier accepts.
    #[must_use]
    pub fn prove(public_inputs: &[u8], claimed_root: &Root) -> Vec<u8> {
        bind_public_inputs(public_inputs, claimed_root).to_vec()
    }
}

impl ProofVerifier for DigestVerifier {
    fn verify(
        &self,
        proof: &[u8],
        public_inputs: &[u8],
        claimed_root: &Root,
    ) -> Result<bool, AdmissionError> {
        Ok(proof == bind_public_inputs(public_inputs, claimed_root).as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_root_accepts_prefix() {
        let hex_root = "0x1953ed8741d64c75595aec3373701ac79a4e21f40e211e62052c29bcc45df528";
        let r = parse_root(hex_root).unwrap();
        assert_eq!(r[0], 0x19);
        assert_eq!(r[31], 0x28);
        assert_eq!(parse_root(&hex_root[2..]).unwrap(), r);
        assert!(matches!(
            parse_root("0x1234"),
            Err(AdmissionError::MalformedRoot(_))
        ));
    }

    #[test]
    fn digest_verifier_binds_root() {
        let proof = DigestVerifier::prove(b"limbs", &[1u8; 32]);
        assert!(DigestVerifier.verify(&proof, b"limbs", &[1u8; 32]).unwrap());
        assert!(!DigestVerifier.verify(&proof, b"limbs", &[2u8; 32]).unwrap());
        assert!(!DigestVerifier.verify(&proof, b"other", &[1u8; 32]).unwrap());
    }
}
