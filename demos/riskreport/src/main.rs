use ag_riskmetrics::{
    AssetProfile, MarketSimulator, MonteCarloResult, MonteCarloSimulator, PortfolioAnalyzer,
    PortfolioReport, PortfolioWeights, ReturnSeries, RiskAssessment, RiskMetricsEngine,
    RiskMetricsResult, RiskScore,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[clap(name = "riskreport", about = "Risk metrics report for simulated or recorded returns")]
struct Args {
    /// YAML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated symbols to simulate
    #[clap(short, long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Comma-separated portfolio weights, in symbol order
    #[clap(short, long, value_delimiter = ',')]
    weights: Option<Vec<f64>>,

    /// Number of simulated trading days
    #[clap(short, long)]
    days: Option<usize>,

    /// Simulation seed
    #[clap(long)]
    seed: Option<u64>,

    /// File with recorded returns (JSON array or one value per line)
    #[clap(short, long)]
    returns: Option<PathBuf>,

    /// Add a Monte Carlo projection of portfolio value
    #[clap(long)]
    monte_carlo: bool,

    /// Pretty-print the JSON output
    #[clap(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct Envelope {
    generated_at: DateTime<Utc>,
    report: Report,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Report {
    SingleAsset {
        metrics: RiskMetricsResult,
        assessment: RiskAssessment,
        score: RiskScore,
        #[serde(skip_serializing_if = "Option::is_none")]
        monte_carlo: Option<MonteCarloResult>,
    },
    Portfolio {
        portfolio: PortfolioReport,
        assets: Vec<RiskMetricsResult>,
        assessment: RiskAssessment,
        score: RiskScore,
        #[serde(skip_serializing_if = "Option::is_none")]
        monte_carlo: Option<MonteCarloResult>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::load(path).with_context(|| format!("Failed to load config {:?}", path))?
        }
        None => Config::default(),
    };

    let report = match &args.returns {
        Some(path) => report_from_file(&config, &args, path)?,
        None => report_from_simulation(&config, &args).await?,
    };

    let envelope = Envelope {
        generated_at: Utc::now(),
        report,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{}", json);

    Ok(())
}

fn report_from_file(config: &Config, args: &Args, path: &Path) -> Result<Report> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read returns file {:?}", path))?;
    let values = parse_returns(&contents)?;
    info!("Loaded {} returns from {:?}", values.len(), path);

    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "returns".to_string());
    let series = ReturnSeries::with_symbol(label, values)?;

    let weights = resolve_weights(
        std::slice::from_ref(&label_of(&series)),
        args.weights.as_deref(),
        config.engine.weight_tolerance,
    )?;
    let monte_carlo = project(config, args, std::slice::from_ref(&series), &weights)?;

    let engine = RiskMetricsEngine::new(config.engine.clone());
    let metrics = engine.compute_metrics(&series)?;
    let assessment = RiskAssessment::from_metrics(&metrics, &config.engine.assessment);
    let score = RiskScore::from_metrics(&metrics, &config.engine.assessment);

    Ok(Report::SingleAsset {
        metrics,
        assessment,
        score,
        monte_carlo,
    })
}

async fn report_from_simulation(config: &Config, args: &Args) -> Result<Report> {
    let symbols = args
        .symbols
        .clone()
        .unwrap_or_else(|| config.simulation.symbols.clone());
    if symbols.is_empty() {
        bail!("No symbols to simulate");
    }

    let days = args.days.unwrap_or(config.simulation.days);
    let seed = args.seed.unwrap_or(config.simulation.seed);
    info!("Simulating {} days for {:?} with seed {}", days, symbols, seed);

    let profiles: Vec<AssetProfile> = symbols.iter().map(|s| AssetProfile::lookup(s)).collect();
    let series = MarketSimulator::new(seed).generate_portfolio(&profiles, days)?;

    let weights = resolve_weights(
        &symbols,
        args.weights.as_deref().or(config.portfolio.weights.as_deref()),
        config.engine.weight_tolerance,
    )?;
    let monte_carlo = project(config, args, &series, &weights)?;

    let engine = RiskMetricsEngine::new(config.engine.clone());
    let bands = config.engine.assessment.clone();

    if series.len() == 1 {
        let metrics = engine.compute_metrics(&series[0])?;
        let assessment = RiskAssessment::from_metrics(&metrics, &bands);
        let score = RiskScore::from_metrics(&metrics, &bands);
        return Ok(Report::SingleAsset {
            metrics,
            assessment,
            score,
            monte_carlo,
        });
    }

    let assets = engine
        .compute_batch_async(series.clone())
        .await
        .into_iter()
        .collect::<ag_riskmetrics::Result<Vec<_>>>()?;

    let portfolio = PortfolioAnalyzer::with_engine(engine).analyze(&series, &weights)?;
    let assessment = RiskAssessment::from_metrics(&portfolio.metrics, &bands);
    let score = RiskScore::from_metrics(&portfolio.metrics, &bands);
    info!(
        "Portfolio volatility {:.2}%, Sharpe {:.3}, risk score {:.1}",
        portfolio.metrics.annualized_volatility * 100.0,
        portfolio.metrics.sharpe_ratio,
        score.score
    );

    Ok(Report::Portfolio {
        portfolio,
        assets,
        assessment,
        score,
        monte_carlo,
    })
}

/// Pair weights with symbols, defaulting to equal weights
///
/// Explicit weights must match the symbol count and sum to 1.0 within
/// `tolerance`, including for a single symbol.
fn resolve_weights(
    symbols: &[String],
    requested: Option<&[f64]>,
    tolerance: f64,
) -> Result<PortfolioWeights> {
    let weights = match requested {
        Some(values) => {
            if values.len() != symbols.len() {
                bail!("{} weights given for {} symbols", values.len(), symbols.len());
            }
            PortfolioWeights::new(symbols.iter().cloned().zip(values.iter().copied()))?
        }
        None => {
            let equal = 1.0 / symbols.len() as f64;
            PortfolioWeights::new(symbols.iter().map(|s| (s.clone(), equal)))?
        }
    };
    weights.validate_sum(tolerance)?;
    Ok(weights)
}

fn project(
    config: &Config,
    args: &Args,
    series: &[ReturnSeries],
    weights: &PortfolioWeights,
) -> Result<Option<MonteCarloResult>> {
    if !args.monte_carlo {
        return Ok(None);
    }

    let simulator = MonteCarloSimulator::new(config.monte_carlo.clone());
    let result = simulator
        .simulate(series, weights)
        .context("Monte Carlo projection failed")?;
    info!(
        "Monte Carlo: {} paths over {} days, expected return {:.2}%",
        result.simulations,
        result.horizon_days,
        result.expected_return * 100.0
    );
    Ok(Some(result))
}

fn label_of(series: &ReturnSeries) -> String {
    series.symbol().unwrap_or("returns").to_string()
}

/// Parse a JSON array of returns, or one return per line
fn parse_returns(contents: &str) -> Result<Vec<f64>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON returns array");
    }

    contents
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(i, line)| {
            line.parse::<f64>()
                .with_context(|| format!("Invalid return on line {}: {:?}", i + 1, line))
        })
        .collect()
}
