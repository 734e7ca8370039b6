use std::sync::Arc;

use analysis_core::DcfMode;
use analysis_orchestrator::{InMemoryResultCache, ScoringConfig, SnapshotProvider, ValuationOrchestrator};
use anyhow::{Context, Result};

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries the assessment JSON, logs go to stderr
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .init();
    }
}

fn flag_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  equity-scorer --snapshot FILE --ticker T [--ticker T2 ...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --mode simple|multi_stage   DCF horizon (default: DCF_MODE or simple)");
    eprintln!("  --no-peers                  Skip the peer comparison lookup");
    eprintln!("  --compact                   Single-line JSON output");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
    }
    let Some(snapshot_path) = flag_values(&args, "--snapshot").first().copied() else {
        usage();
    };
    let tickers = flag_values(&args, "--ticker");
    if tickers.is_empty() {
        usage();
    }

    let mut config = ScoringConfig::from_env().context("Invalid scoring configuration")?;
    if let Some(mode) = flag_values(&args, "--mode").first() {
        config.dcf_mode = mode
            .parse::<DcfMode>()
            .with_context(|| format!("Invalid --mode {mode}"))?;
    }
    if args.iter().any(|a| a == "--no-peers") {
        config.include_peers = false;
    }
    let compact = args.iter().any(|a| a == "--compact");
    tracing::info!(
        "Scoring {} ticker(s) from {} ({} DCF, peers {})",
        tickers.len(),
        snapshot_path,
        config.dcf_mode,
        if config.include_peers { "on" } else { "off" }
    );

    let provider = Arc::new(
        SnapshotProvider::load(snapshot_path)
            .await
            .with_context(|| format!("Failed to load snapshot {snapshot_path}"))?,
    );
    let orchestrator = ValuationOrchestrator::from_snapshot(config, provider.clone())
        .with_cache(Arc::new(InMemoryResultCache::new()));

    let mut assessments = Vec::with_capacity(tickers.len());
    for ticker in &tickers {
        let technical = provider.technical_data(ticker);
        let assessment = orchestrator
            .assess(ticker, technical)
            .await
            .with_context(|| format!("Assessment failed for {ticker}"))?;
        tracing::info!(
            "{}: {} ({:.1}, confidence {:.2})",
            assessment.ticker,
            assessment.score.label,
            assessment.score.total_score,
            assessment.score.confidence
        );
        assessments.push(assessment);
    }

    let output = if assessments.len() == 1 {
        serde_json::to_value(&assessments[0])?
    } else {
        serde_json::to_value(&assessments)?
    };
    let rendered = if compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{rendered}");

    Ok(())
}
