//! StratScan CLI — single backtests and parameter sweeps over CSV candles.
//!
//! Commands:
//! - `run` — backtest one strategy with one parameter set
//! - `sweep` — expand a TOML sweep config, run every combination on every timeframe, rank the results
//!
//! Logging goes to stderr; set `RUST_LOG` to change the level (default `info`).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stratscan_core::{SimulatorConfig, StrategyDefinition, StrategyKind};
use stratscan_runner::{
    load_candles_csv, run_backtest, BacktestResult, Scorer, StrategyScore, SweepConfig, SweepJob,
};

#[derive(Parser)]
#[command(name = "stratscan", about = "StratScan — strategy backtesting and scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy with one parameter set.
    Run {
        /// Candle CSV (timestamp, open, high, low, close, volume).
        #[arg(long)]
        data: PathBuf,

        /// Strategy kind: trend_crossover, oscillator, mean_reversion, breakout,
        /// momentum, momentum_oscillator_hybrid.
        #[arg(long)]
        strategy: String,

        /// Strategy parameter as name=value; repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,

        /// Timeframe label recorded in the result.
        #[arg(long, default_value = "1d")]
        timeframe: String,

        /// Starting capital.
        #[arg(long)]
        capital: Option<f64>,

        /// Long-only: short signals only close longs.
        #[arg(long, default_value_t = false)]
        long_only: bool,

        /// Write the full result as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a parameter sweep from a TOML config and rank the results.
    Sweep {
        /// Path to the sweep TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Candle CSV; overrides `data` in a single-timeframe config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Worker pool size; overrides `threads` in the config.
        #[arg(long)]
        threads: Option<usize>,

        /// Number of ranked strategies to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write ranked scores and failures as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            strategy,
            params,
            timeframe,
            capital,
            long_only,
            output,
        } => run_cmd(&data, &strategy, params, &timeframe, capital, long_only, output.as_deref()),
        Commands::Sweep {
            config,
            data,
            threads,
            top,
            output,
        } => sweep_cmd(&config, data, threads, top, output.as_deref()),
    }
}

fn parse_param(raw: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((name.trim().to_string(), value))
}

fn run_cmd(
    data: &Path,
    strategy: &str,
    params: Vec<(String, f64)>,
    timeframe: &str,
    capital: Option<f64>,
    long_only: bool,
    output: Option<&Path>,
) -> Result<()> {
    let kind: StrategyKind = strategy.parse()?;
    let params: BTreeMap<String, f64> = params.into_iter().collect();
    let definition = StrategyDefinition::new(kind, params);

    let loaded = load_candles_csv(data)?;
    if loaded.skipped > 0 {
        info!(skipped = loaded.skipped, "rejected candle rows");
    }

    let mut config = SimulatorConfig::default();
    if let Some(capital) = capital {
        config.initial_capital = capital;
    }
    config.allow_short = !long_only;

    let result = run_backtest(&loaded.candles, &definition, &config, timeframe)?;
    print_summary(&result);

    if let Some(path) = output {
        write_json(path, &result)?;
        println!("Result saved to: {}", path.display());
    }
    Ok(())
}

fn sweep_cmd(
    config_path: &Path,
    data: Option<PathBuf>,
    threads: Option<usize>,
    top: usize,
    output: Option<&Path>,
) -> Result<()> {
    if threads == Some(0) {
        bail!("--threads must be >= 1");
    }
    let config = SweepConfig::from_file(config_path)?;
    let mut job = SweepJob::new(config).with_threads(threads);
    if let Some(data) = data {
        job = job.with_data(data)?;
    }
    let config = job.config();
    let timeframes: Vec<String> = config.timeframe_configs().into_iter().map(|t| t.label).collect();
    info!(
        symbol = %config.symbol,
        strategies = config.grid_configs().len(),
        timeframes = timeframes.len(),
        combinations = job.combinations()?,
        "starting sweep job"
    );

    let outcome = job.run()?;
    if outcome.runs.is_empty() {
        bail!(
            "no timeframe could be swept: {}",
            outcome
                .skipped
                .iter()
                .map(|s| format!("{} ({})", s.timeframe, s.reason))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let scorer = Scorer::new(config.scoring.clone());
    let ranked = scorer.rank(outcome.results());
    print_leaderboard(&config.symbol, &timeframes, &ranked, top);
    for skipped in &outcome.skipped {
        println!("WARNING: timeframe {} skipped: {}", skipped.timeframe, skipped.reason);
    }
    let failures: Vec<_> = outcome.failures().collect();
    if !failures.is_empty() {
        println!();
        println!("{} combination(s) failed:", failures.len());
        for failure in &failures {
            println!("  {}: {}", failure.strategy, failure.error);
        }
    }

    if let Some(path) = output {
        let report = serde_json::json!({
            "symbol": config.symbol,
            "timeframes": timeframes,
            "strategies": config.grid_configs().iter().map(|g| g.kind.clone()).collect::<Vec<_>>(),
            "combinations": job.combinations()?,
            "skipped_timeframes": outcome.skipped,
            "cancelled": outcome.cancelled(),
            "scores": ranked,
            "failures": failures,
        });
        write_json(path, &report)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.strategy);
    println!("Id:             {}", result.strategy_id.short());
    println!("Timeframe:      {}", result.timeframe);
    println!("Bars:           {}", result.bar_count);
    println!("Signals:        {}", result.signal_count);
    println!("Trades:         {} ({} won, {} lost)", m.trade_count, m.winning_trades, m.losing_trades);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Expectancy:     {:.3}%", m.expectancy * 100.0);
    println!("Avg Win/Loss:   {:.2}% / {:.2}%", m.avg_win * 100.0, m.avg_loss * 100.0);
    if result.skipped_entries > 0 {
        println!();
        println!("WARNING: {} entry signal(s) could not be funded", result.skipped_entries);
    }
}

fn print_leaderboard(symbol: &str, timeframes: &[String], ranked: &[StrategyScore], top: usize) {
    println!();
    println!("=== Sweep: {symbol} [{}] ===", timeframes.join(", "));
    println!(
        "{:>4}  {:>6}  {:>8}  {:>7}  {:>7}  {:>6}  {:>6}  {:<6}  {:<5}  strategy",
        "rank", "score", "return", "sharpe", "max_dd", "win", "trades", "risk", "tf"
    );
    for s in ranked.iter().take(top) {
        println!(
            "{:>4}  {:>6.3}  {:>7.2}%  {:>7.3}  {:>6.2}%  {:>5.1}%  {:>6}  {:<6}  {:<5}  {}{}",
            s.rank,
            s.composite(),
            s.total_return * 100.0,
            s.sharpe,
            s.max_drawdown * 100.0,
            s.win_rate * 100.0,
            s.trade_count,
            s.risk_level,
            s.timeframe,
            s.strategy,
            if s.is_candidate { "  *" } else { "" }
        );
    }
    let candidates = ranked.iter().filter(|s| s.is_candidate).count();
    println!();
    println!("{candidates} of {} strategies pass the candidate gate (*)", ranked.len());
}
