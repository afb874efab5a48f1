//! certx-node — the certificate service binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Connect the learning ledgers (HTTP, or an in-memory fixture file)
//!   3. Connect the minting network and optional chain explorer
//!   4. Start the JSON-RPC 2.0 server
//!   5. Serve the REST API until interrupted

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use certx_anchor::{
    AnchorConfig, ChainExplorer, HttpMintingNetwork, LedgerAnchorService, MintingNetwork,
    SimulatedMintingNetwork,
};
use certx_api::{run_server, ApiConfig, AppState};
use certx_core::constants::{DEFAULT_ANCHOR_IMAGE_URI, DEFAULT_LEDGER_TIMEOUT_MS, DEFAULT_MINT_TIMEOUT_MS};
use certx_eligibility::EligibilityEvaluator;
use certx_issuance::{CertificateStore, IssuanceConfig};
use certx_ledger::{CompletionLedger, Directory, HttpLedger, LedgerFixtures, MemoryLedger, QuizResultLedger};
use certx_rpc::{RpcServer, RpcServerState};
use certx_state::StateDb;
use certx_verify::VerificationService;

#[derive(Parser, Debug)]
#[command(
    name = "certx-node",
    version,
    about = "certx node — course certificates with on-chain anchoring"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.certx/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8546")]
    rpc_addr: SocketAddr,

    /// REST API listen host.
    #[arg(long, default_value = "127.0.0.1")]
    http_host: String,

    /// REST API listen port.
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Allow cross-origin requests to the REST API.
    #[arg(long)]
    cors: bool,

    /// Base URL of the learning platform (completions, quizzes, directory).
    #[arg(long, conflicts_with = "ledger_fixtures")]
    ledger_url: Option<String>,

    /// JSON fixture file served from memory instead of a learning platform.
    #[arg(long)]
    ledger_fixtures: Option<PathBuf>,

    /// Base URL of the minting service. Without it, mints are simulated.
    #[arg(long)]
    minting_url: Option<String>,

    /// Base URL of a chain explorer used to corroborate anchors.
    #[arg(long)]
    explorer_url: Option<String>,

    /// Timeout for each ledger read, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_LEDGER_TIMEOUT_MS)]
    ledger_timeout_ms: u64,

    /// Timeout for a single mint round trip, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_MINT_TIMEOUT_MS)]
    mint_timeout_ms: u64,

    /// Days a new certificate stays valid. Omit for certificates that never lapse.
    #[arg(long)]
    validity_days: Option<u32>,

    /// Artwork URI referenced by minted assets.
    #[arg(long, default_value = DEFAULT_ANCHOR_IMAGE_URI)]
    anchor_image_uri: String,
}

type Ledgers = (Arc<dyn CompletionLedger>, Arc<dyn QuizResultLedger>, Arc<dyn Directory>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,certx=debug")),
        )
        .init();

    let args = Args::parse();
    info!("certx node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    info!(
        certificates = db.certificate_count(),
        anchors = db.anchor_count(),
        "state database open"
    );

    // ── Learning ledgers ──────────────────────────────────────────────────────
    let ledger_timeout = Duration::from_millis(args.ledger_timeout_ms);
    let (completions, quizzes, directory) = connect_ledgers(&args, ledger_timeout)?;

    let issuance_config = IssuanceConfig {
        ledger_timeout,
        ..IssuanceConfig::default()
    }
    .with_validity_days(args.validity_days);
    let evaluator = EligibilityEvaluator::new(completions, quizzes);
    let store = Arc::new(CertificateStore::new(
        Arc::clone(&db),
        evaluator,
        directory,
        issuance_config,
    ));

    // ── Minting network ───────────────────────────────────────────────────────
    let mint_timeout = Duration::from_millis(args.mint_timeout_ms);
    let anchor_config = AnchorConfig {
        mint_timeout,
        image_uri: args.anchor_image_uri.clone(),
    };
    anchor_config.validate().context("invalid --mint-timeout-ms")?;
    let (network, fallback_explorer): (Arc<dyn MintingNetwork>, Option<Arc<dyn ChainExplorer>>) =
        match &args.minting_url {
            Some(url) => {
                info!(%url, "using minting service");
                let network = HttpMintingNetwork::new(url, mint_timeout)
                    .with_context(|| format!("configuring minting service {url}"))?;
                let network: Arc<dyn MintingNetwork> = Arc::new(network);
                (network, None)
            }
            None => {
                warn!("No --minting-url provided. Mints are simulated — DO NOT USE IN PRODUCTION.");
                let simulated = Arc::new(SimulatedMintingNetwork::new());
                let network: Arc<dyn MintingNetwork> = simulated.clone();
                let explorer: Arc<dyn ChainExplorer> = simulated;
                (network, Some(explorer))
            }
        };
    let anchors = Arc::new(
        LedgerAnchorService::new(Arc::clone(&db), network, anchor_config).context("configuring anchor service")?,
    );

    // ── Verification ──────────────────────────────────────────────────────────
    let explorer: Option<Arc<dyn ChainExplorer>> = match &args.explorer_url {
        Some(url) => {
            info!(%url, "corroborating anchors against chain explorer");
            let explorer = HttpMintingNetwork::new(url, ledger_timeout)
                .with_context(|| format!("configuring chain explorer {url}"))?;
            let explorer: Arc<dyn ChainExplorer> = Arc::new(explorer);
            Some(explorer)
        }
        None => fallback_explorer,
    };
    let mut verifier = VerificationService::new(Arc::clone(&db));
    if let Some(explorer) = explorer {
        verifier = verifier.with_explorer(explorer, ledger_timeout);
    }
    let verifier = Arc::new(verifier);

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        store: Arc::clone(&store),
        verifier: Arc::clone(&verifier),
        anchors: Arc::clone(&anchors),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── REST API ──────────────────────────────────────────────────────────────
    let api_config = ApiConfig {
        host: args.http_host.clone(),
        port: args.http_port,
        enable_cors: args.cors,
    };
    let app_state = AppState::new(Arc::clone(&db), store, verifier, anchors);

    info!("node ready");
    tokio::select! {
        res = run_server(&api_config, app_state) => {
            res.map_err(|e| anyhow::anyhow!("REST API server: {e}"))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    db.flush().context("flushing state database")?;
    Ok(())
}

/// Build the completion, quiz and directory clients from `--ledger-url` or
/// `--ledger-fixtures`. With neither, an empty in-memory ledger is used.
fn connect_ledgers(args: &Args, timeout: Duration) -> anyhow::Result<Ledgers> {
    if let Some(url) = &args.ledger_url {
        info!(%url, "using learning platform ledger");
        let ledger = Arc::new(
            HttpLedger::new(url, timeout).with_context(|| format!("configuring ledger {url}"))?,
        );
        return Ok(split(ledger));
    }

    let fixtures = match &args.ledger_fixtures {
        Some(path) => {
            let fixtures = LedgerFixtures::load(path)
                .with_context(|| format!("reading ledger fixtures from {}", path.display()))?;
            info!(
                path = %path.display(),
                students = fixtures.students.len(),
                courses = fixtures.courses.len(),
                "loaded ledger fixtures"
            );
            fixtures
        }
        None => {
            warn!("No --ledger-url or --ledger-fixtures provided. Serving an empty in-memory ledger.");
            LedgerFixtures::default()
        }
    };
    let ledger = Arc::new(MemoryLedger::from_fixtures(&fixtures));
    Ok(split(ledger))
}

/// One backend serving all three ledger roles.
fn split<L>(ledger: Arc<L>) -> Ledgers
where
    L: CompletionLedger + QuizResultLedger + Directory + 'static,
{
    let completions: Arc<dyn CompletionLedger> = ledger.clone();
    let quizzes: Arc<dyn QuizResultLedger> = ledger.clone();
    let directory: Arc<dyn Directory> = ledger;
    (completions, quizzes, directory)
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
