// crates/qreveal-crypto/src/lib.rs

//! Crypto substrate: a BLAKE3 transcript with a simple absorb/challenge API.
//!
//! The reveal engine uses it to turn raw external entropy into a committed
//! seed. Every absorb is length-prefixed and labelled, so two transcripts only
//! agree when they absorbed the same labelled values in the same order.

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

use blake3::Hasher;

/// Fixed domain prefix to seed transcripts.
const TRANSCRIPT_PREFIX: &[u8] = b"qreveal.transcript.v1";

/// Domain string for the seed-derivation transcript.
pub const REVEAL_DOMAIN: &str = "qreveal.reveal.v1";

/// Domain string mixed into every Feistel round-function evaluation.
pub const FEISTEL_DOMAIN: &[u8] = b"qreveal.feistel.v1";

/// Transcript interface.
///
/// Implementations should apply domain separation for both absorbs and challenges.
pub trait Transcript {
    /// Add raw bytes under a label (domain-separated).
    fn absorb(&mut self, label: Label, bytes: &[u8]);

    /// Convenience: absorb an unsigned 64-bit value (LE).
    fn absorb_u64(&mut self, label: Label, x: u64) {
        self.absorb(label, &x.to_le_bytes());
    }

    /// Squeeze a 32-byte challenge under `label`.
    #[must_use]
    fn challenge32(&mut self, label: Label) -> [u8; 32];
}

/// BLAKE3-based transcript.
#[derive(Clone, Debug)]
pub struct Blake3Transcript {
    st: Hasher,
}

impl Blake3Transcript {
    /// Create a new transcript with a domain separation prefix.
    #[must_use]
    pub fn new(domain_sep: &str) -> Self {
        let mut st = Hasher::new();
        st.update(TRANSCRIPT_PREFIX);
        st.update(&len_prefix(domain_sep.len()));
        st.update(domain_sep.as_bytes());
        Self { st }
    }
}

impl Transcript for Blake3Transcript {
    fn absorb(&mut self, label: Label, bytes: &[u8]) {
        let label = label.as_str();
        self.st.update(b"absorb");
        self.st.update(&len_prefix(label.len()));
        self.st.update(label.as_bytes());
        self.st.update(&len_prefix(bytes.len()));
        self.st.update(bytes);
    }

    fn challenge32(&mut self, label: Label) -> [u8; 32] {
        let label = label.as_str();
        let mut st = self.st.clone();
        st.update(b"challenge");
        st.update(&len_prefix(label.len()));
        st.update(label.as_bytes());

        let mut out = [0u8; 32];
        st.finalize_xof().fill(&mut out);

        // Forward progress: a second challenge under the same label differs.
        self.st.update(b"after_challenge");
        self.st.update(&len_prefix(label.len()));
        self.st.update(label.as_bytes());

        out
    }
}

#[inline]
fn len_prefix(len: usize) -> [u8; 8] {
    (len as u64).to_le_bytes()
}

/// Derive the committed reveal seed from raw entropy and the collection size.
///
/// Binding the total item count keeps two deployments that happen to draw the
/// same raw entropy from sharing a seed unless they also share a size.
#[must_use]
pub fn derive_reveal_seed(entropy: &[u8; 32], total_items: u64) -> [u8; 32] {
    let mut t = Blake3Transcript::new(REVEAL_DOMAIN);
    t.absorb(Label::RevealEntropy, entropy);
    t.absorb_u64(Label::RevealTotal, total_items);
    t.challenge32(Label::RevealSeed)
}

/// Digest binding a set of public inputs to a claimed root.
///
/// Used by the scaffolding verifier at the proof-admission boundary.
#[must_use]
pub fn bind_public_inputs(public_inputs: &[u8], claimed_root: &[u8; 32]) -> [u8; 32] {
    let mut t = Blake3Transcript::new("qreveal.gateway.v1");
    t.absorb(Label::PublicInputs, public_inputs);
    t.absorb(Label::ClaimedRoot, claimed_root);
    t.challenge32(Label::Binding)
}

/// Canonical transcript labels.
/// Avoids stringly-typed mistakes in domain separation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Label {
    /// Raw entropy drawn from the randomness source.
    RevealEntropy,
    /// Total item count of the collection.
    RevealTotal,
    /// Committed seed challenge.
    RevealSeed,
    /// Public inputs of an admitted proof.
    PublicInputs,
    /// Root claimed by an admitted proof.
    ClaimedRoot,
    /// Proof binding challenge.
    Binding,
}

impl Label {
    /// Borrow the canonical string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RevealEntropy => "reveal/entropy",
            Self::RevealTotal => "reveal/total",
            Self::RevealSeed => "reveal/seed",
            Self::PublicInputs => "gateway/public_inputs",
            Self::ClaimedRoot => "gateway/claimed_root",
            Self::Binding => "gateway/binding",
        }
    }
}
