// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  egress-probe
//
//  Sends one request per URL through the outgoing-call pipeline
//  and writes the resulting records through `tracing`.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod probe;

use clap::Parser;
use egress_core::LoggingConfig;
use egress_enrich::EnricherRegistry;
use egress_observability::{ErasingRedactor, FormatRedactor, Redactor, TracingEmitter};
use egress_pipeline::{CallLogger, EnrichingCallLogger};
use probe::{Outcome, RequestPlan};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "egress-probe", version, about = "Probe URLs through the Egress call pipeline")]
struct Cli {
    /// Path to the logging configuration file
    #[arg(short, long, default_value = "egress.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs as JSON lines
    #[arg(long)]
    json: bool,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: http::Method,

    /// Route template used for path redaction, e.g. `/v1/users/{userId}`
    #[arg(long)]
    route: Option<String>,

    /// Logical request name recorded in the request metadata
    #[arg(long)]
    request_name: Option<String>,

    /// Dependency name recorded in the request metadata
    #[arg(long)]
    dependency: Option<String>,

    /// Extra request header, `name:value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Transport timeout per request in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Redaction format, `{0}` is replaced by the raw value; empty erases
    #[arg(long, default_value = "REDACTED:{0}")]
    redaction_format: String,

    /// URLs to probe
    #[arg(required = true)]
    urls: Vec<String>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name:value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "egress-probe starting");

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        LoggingConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        LoggingConfig::default()
    };

    // ── Enrichers ──
    let mut registry = EnricherRegistry::new();
    egress_enrichers::register_all(&mut registry);
    info!(enrichers = registry.len(), "Enrichers registered");

    // ── Pipeline ──
    let redactor: Arc<dyn Redactor> = if cli.redaction_format.is_empty() {
        Arc::new(ErasingRedactor)
    } else {
        Arc::new(FormatRedactor::new(cli.redaction_format.clone()))
    };
    let logger: Arc<dyn CallLogger> = Arc::new(EnrichingCallLogger::from_registry(
        &config,
        redactor,
        &registry,
        Arc::new(TracingEmitter),
    )?);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cli.timeout_ms))
        .build()?;

    // ── Ctrl+C cancels in-flight probes ──
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling probes");
                cancel.cancel();
            }
        });
    }

    let plan = RequestPlan {
        method: cli.method,
        route: cli.route,
        request_name: cli.request_name,
        dependency_name: cli.dependency,
        headers: cli.headers,
    };

    let mut tasks = tokio::task::JoinSet::new();
    for url in cli.urls {
        let request = probe::build_request(&plan, &url)?;
        let logger = Arc::clone(&logger);
        let client = client.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move { probe::run(logger.as_ref(), &client, request, &cancel).await });
    }

    let mut completed = 0usize;
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(Outcome::Completed(_)) => completed += 1,
            Ok(Outcome::Failed) => failed += 1,
            Err(e) => {
                tracing::error!(error = %e, "Pipeline rejected call");
                failed += 1;
            }
        }
    }

    info!(completed, failed, "egress-probe finished");
    if failed > 0 {
        anyhow::bail!("{failed} probe(s) failed");
    }
    Ok(())
}
