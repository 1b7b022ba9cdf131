// crates/qreveal-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use qreveal_core::{
    config::CollectionConfig,
    io::{load_engine, save_engine},
    Assignment, AuditReport, FixedEntropy, MintCounter, MintLedger, OsEntropy, RandomnessSource,
    RevealEngine, SeededEntropy,
};
use qreveal_gateway::{AdmissionGateway, DigestVerifier, ProofBundle, TrustedRootLog};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "qreveal",
    about = "Quota-exact reveal engine CLI",
    long_about = "Quota-exact reveal engine CLI.\n\nDeclare a collection, mint items, perform the one-shot reveal and inspect per-item descriptors.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a collection from a TOML config and write a fresh state snapshot
    Init {
        /// Collection config (TOML)
        #[arg(long)]
        config: PathBuf,

        /// State snapshot path (JSON/CBOR)
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Overwrite an existing snapshot
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Mint the next `count` items
    Mint {
        /// State snapshot path (JSON/CBOR)
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Items to mint (>0)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
    },

    /// Perform the one-shot reveal (OS entropy unless overridden)
    #[command(group(ArgGroup::new("entropy").args(["entropy_seed", "entropy_hex"])))]
    Reveal {
        /// State snapshot path (JSON/CBOR)
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Reproducible entropy from a 64-bit seed (dry runs)
        #[arg(long)]
        entropy_seed: Option<u64>,

        /// Fixed 32-byte entropy value as hex
        #[arg(long)]
        entropy_hex: Option<String>,
    },

    /// Print the descriptor of a minted item
    Describe {
        /// State snapshot path (JSON/CBOR)
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Item index
        #[arg(long)]
        index: u64,

        /// Emit the JSON metadata document instead of a summary
        #[arg(long, default_value_t = false, conflicts_with = "data_uri")]
        json: bool,

        /// Emit the document as a base64 `data:` URI
        #[arg(long, default_value_t = false)]
        data_uri: bool,
    },

    /// Find the item holding a given (category, rank) slot
    Locate {
        /// State snapshot path (JSON/CBOR)
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Category id
        #[arg(long)]
        category: u32,

        /// Rank within the category
        #[arg(long)]
        rank: u64,
    },

    /// Walk every minted item and check histogram and asset uniqueness
    Audit {
        /// State snapshot path (JSON/CBOR)
        #[arg(long, default_value = "state.json")]
        state: PathBuf,

        /// Print the audit report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Admit a proven state root into the trusted-root log
    Admit {
        /// Bundle directory holding `proof`, `limbs_instance` and `root`
        #[arg(long)]
        bundle: PathBuf,

        /// Trusted-root log (JSON); created if missing
        #[arg(long, default_value = "roots.json")]
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Init {
            config,
            state,
            force,
        } => init(&config, &state, force),
        Cmd::Mint { state, count } => mint(&state, count),
        Cmd::Reveal {
            state,
            entropy_seed,
            entropy_hex,
        } => reveal(&state, entropy_seed, entropy_hex.as_deref()),
        Cmd::Describe {
            state,
            index,
            json,
            data_uri,
        } => describe(&state, index, json, data_uri),
        Cmd::Locate {
            state,
            category,
            rank,
        } => locate(&state, category, rank),
        Cmd::Audit { state, json } => audit(&state, json),
        Cmd::Admit { bundle, log } => admit(&bundle, &log),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn init(config: &Path, state: &Path, force: bool) -> Result<()> {
    if state.exists() && !force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            state.display()
        );
    }
    info!(config=%config.display(), state=%state.display(), "building collection");
    let cfg = CollectionConfig::read(config)?;
    let engine = cfg
        .build()
        .with_context(|| format!("invalid collection in {}", config.display()))?;
    let ledger = MintLedger::new(cfg.max_items);

    save_engine(state, &engine, &ledger)
        .with_context(|| format!("writing state to {}", state.display()))?;

    println!(
        "Initialized {:?}: {} categories, {} items → {}",
        engine.meta().name,
        cfg.categories.len(),
        cfg.max_items,
        state.display()
    );
    Ok(())
}

fn mint(state: &Path, count: u64) -> Result<()> {
    let (engine, mut ledger) = load_engine(state)?;
    if ledger.remaining() < count {
        bail!(
            "cannot mint {count}: only {} of {} left",
            ledger.remaining(),
            ledger.max_supply()
        );
    }
    let first = ledger.minted();
    for _ in 0..count {
        ledger.mint()?;
    }
    save_engine(state, &engine, &ledger)?;

    println!(
        "Minted items {first}..{} ({} of {} minted)",
        ledger.minted(),
        ledger.minted(),
        ledger.max_supply()
    );
    Ok(())
}

fn parse_entropy_hex(text: &str) -> Result<[u8; 32]> {
    let t = text.trim();
    let t = t.strip_prefix("0x").unwrap_or(t);
    let mut out = [0u8; 32];
    hex::decode_to_slice(t, &mut out).context("--entropy-hex must be 32 bytes of hex")?;
    Ok(out)
}

fn reveal(state: &Path, entropy_seed: Option<u64>, entropy_hex: Option<&str>) -> Result<()> {
    let (mut engine, ledger) = load_engine(state)?;

    let mut source: Box<dyn RandomnessSource> = match (entropy_seed, entropy_hex) {
        (Some(s), _) => Box::new(SeededEntropy::new(s)),
        (None, Some(h)) => Box::new(FixedEntropy(parse_entropy_hex(h)?)),
        (None, None) => Box::new(OsEntropy),
    };

    info!(minted = ledger.minted(), cap = ledger.max_supply(), "revealing");
    let seed = engine.reveal(&mut *source).context("reveal failed")?;
    save_engine(state, &engine, &ledger)?;

    println!("Revealed: seed {}", hex::encode(seed));
    Ok(())
}

fn describe(state: &Path, index: u64, json: bool, data_uri: bool) -> Result<()> {
    let (engine, ledger) = load_engine(state)?;
    let d = engine.descriptor_of(index, &ledger)?;

    if data_uri {
        println!("{}", d.to_data_uri(&engine.meta().trait_label)?);
        return Ok(());
    }
    if json {
        println!("{}", d.to_json(&engine.meta().trait_label)?);
        return Ok(());
    }
    println!("name:        {}", d.name);
    println!(
        "{:<12} {}",
        format!("{}:", engine.meta().trait_label.to_ascii_lowercase()),
        d.category_label.as_deref().unwrap_or("(unrevealed)")
    );
    println!("asset:       {}", d.asset_reference);
    println!("description: {}", d.description);
    Ok(())
}

fn locate(state: &Path, category: u32, rank: u64) -> Result<()> {
    let (engine, ledger) = load_engine(state)?;
    let index = engine.item_of(Assignment { category, rank })?;
    let status = if index < ledger.minted() {
        "minted"
    } else {
        "not yet minted"
    };
    println!(
        "{} #{rank} → item {index} ({status})",
        engine.name_of(category)?
    );
    Ok(())
}

fn audit(state: &Path, json: bool) -> Result<()> {
    let (engine, ledger) = load_engine(state)?;
    let report = engine.audit(&ledger)?;
    let collection = engine.collection()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize audit report")?
        );
    } else {
        print_audit(&engine, &report)?;
    }

    if !report.assets_unique() {
        bail!(
            "{} duplicate asset references",
            report.duplicate_assets.len()
        );
    }
    if report.minted == collection.size() && !report.matches_quotas(collection) {
        bail!("histogram does not match declared quotas");
    }
    Ok(())
}

fn print_audit(engine: &RevealEngine, report: &AuditReport) -> Result<()> {
    let collection = engine.collection()?;
    for (id, n) in &report.histogram {
        println!(
            "{:>4}  {:<24} {n:>8} / {}",
            id,
            engine.name_of(*id)?,
            engine.quota_of(*id)?
        );
    }
    println!(
        "minted {} of {}; assets unique: {}; quotas exact: {}",
        report.minted,
        collection.size(),
        report.assets_unique(),
        report.matches_quotas(collection)
    );
    Ok(())
}

fn admit(bundle: &Path, log: &Path) -> Result<()> {
    info!(bundle=%bundle.display(), log=%log.display(), "admitting root");
    let b = ProofBundle::read_dir(bundle)
        .with_context(|| format!("reading proof bundle {}", bundle.display()))?;
    let mut gateway = AdmissionGateway::with_log(DigestVerifier, TrustedRootLog::read_json(log)?);

    let record = gateway.admit(&b)?;
    ensure_parent_dir(log)?;
    gateway.log().write_json(log)?;

    println!(
        "OK: root 0x{} trusted (sequence {})",
        hex::encode(record.root),
        record.sequence
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entropy_hex_accepts_prefix_and_rejects_short() {
        let h = "0x".to_string() + &"ab".repeat(32);
        assert_eq!(parse_entropy_hex(&h).unwrap(), [0xab; 32]);
        assert_eq!(parse_entropy_hex(&h[2..]).unwrap(), [0xab; 32]);
        assert!(parse_entropy_hex("abcd").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn describe_output_flags_conflict() {
        let r = Cli::try_parse_from([
            "qreveal", "describe", "--index", "0", "--json", "--data-uri",
        ]);
        assert!(r.is_err());
        let cli = Cli::try_parse_from(["qreveal", "describe", "--index", "0", "--data-uri"]).unwrap();
        assert!(matches!(cli.cmd, Cmd::Describe { data_uri: true, json: false, .. }));
    }

    #[test]
    fn audit_report_serializes_as_json() {
        let report = AuditReport {
            minted: 3,
            histogram: [(0, 2), (1, 1)].into_iter().collect(),
            duplicate_assets: Vec::new(),
        };
        let v: serde_json::Value =
            serde_json::from_str(&serde_json::to_string_pretty(&report).unwrap()).unwrap();
        assert_eq!(v["minted"], 3);
        assert_eq!(v["histogram"]["0"], 2);
        let cli = Cli::try_parse_from(["qreveal", "audit", "--json"]).unwrap();
        assert!(matches!(cli.cmd, Cmd::Audit { json: true, .. }));
    }

    #[test]
    fn entropy_flags_conflict() {
        let r = Cli::try_parse_from([
            "qreveal",
            "reveal",
            "--entropy-seed",
            "1",
            "--entropy-hex",
            "00",
        ]);
        assert!(r.is_err());
    }
}
