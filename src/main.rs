// =============================================================================
// Orac Bias — Command-Line Entry Point
// =============================================================================
//
//   orac-bias analyze <SYMBOL> [TIMEFRAME...]
//   orac-bias chart   <SYMBOL> [INTERVAL]
//
// Series are read from `$ORAC_DATA_DIR/<SYMBOL>_<timeframe>.json`. The verdict
// is printed as pretty JSON on stdout; logs go to stderr.
// =============================================================================

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orac_bias::htf_analysis::{analyze, chart_snapshot};
use orac_bias::market_data::JsonFileSource;
use orac_bias::runtime_config::AnalysisConfig;

const USAGE: &str = "usage: orac-bias analyze <SYMBOL> [TIMEFRAME...]\n       orac-bias chart <SYMBOL> [INTERVAL]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    // A missing .env is normal; the process environment still applies.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── 2. Config ────────────────────────────────────────────────────────
    let config_path =
        std::env::var("ORAC_CONFIG").unwrap_or_else(|_| "orac_config.json".into());
    let mut config = AnalysisConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let defaults = AnalysisConfig::default();
        if let Err(e) = defaults.save(&config_path) {
            warn!(error = %e, path = %config_path, "Failed to write default config");
        }
        defaults
    });

    // Override default timeframes from env if available.
    if let Ok(tfs) = std::env::var("ORAC_TIMEFRAMES") {
        let tfs: Vec<String> = tfs
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !tfs.is_empty() {
            config.default_timeframes = tfs;
        }
    }

    let data_dir = std::env::var("ORAC_DATA_DIR").unwrap_or_else(|_| "data".into());
    let source = JsonFileSource::new(&data_dir);
    info!(data_dir = %source.dir().display(), "Series source ready");

    // ── 3. Command ───────────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((cmd, rest)) => (cmd.as_str(), rest),
        None => bail!(USAGE),
    };
    let symbol = rest
        .first()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("missing symbol\n{USAGE}"))?;

    let output = match command {
        "analyze" => {
            let timeframes = if rest.len() > 1 {
                rest[1..].to_vec()
            } else {
                config.default_timeframes.clone()
            };
            let result = analyze(&source, &symbol, timeframes.as_slice(), &config).await;
            serde_json::to_string_pretty(&result).context("failed to serialise bias result")?
        }
        "chart" => {
            let interval = rest.get(1).map(String::as_str);
            let snapshot = chart_snapshot(&source, &symbol, interval, &config)
                .await
                .with_context(|| format!("chart data unavailable for {symbol}"))?;
            serde_json::to_string_pretty(&snapshot).context("failed to serialise chart data")?
        }
        other => bail!("unknown command: {other}\n{USAGE}"),
    };

    println!("{output}");
    Ok(())
}
