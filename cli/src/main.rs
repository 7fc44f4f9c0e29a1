//! Moneta CLI
//!
//! Converts amounts through the LRU quote cache, lists table rates, shows
//! the pitfalls of primitive money types and simulates cache workloads.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moneta_common::{Currency, CurrencyPair, MoneyAmount};
use moneta_fx::{CurrencyConverter, ExchangeRateProvider, FixedRateTable, FxConfig};

mod metrics;
mod pitfalls;
mod simulation;

use simulation::{all_pairs, CacheSimulation};

/// Moneta CLI
#[derive(Parser, Debug)]
#[command(name = "moneta")]
#[command(about = "Money value types and exchange-rate quote cache")]
struct Args {
    /// Print machine-readable JSON and log as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an amount between currencies
    Convert {
        /// Amount, e.g. 125.50
        amount: String,
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
    },

    /// List table rates against a base currency
    Rates {
        #[arg(long, default_value = "USD")]
        base: String,
    },

    /// Show what goes wrong when money lives in primitive numbers
    Pitfalls,

    /// Run a random lookup workload against the cache
    Simulate {
        /// Number of lookups
        #[arg(long, default_value = "10000")]
        lookups: usize,

        /// Cache capacity (overrides MONETA_CACHE_CAPACITY)
        #[arg(long)]
        capacity: Option<usize>,

        /// Number of distinct pairs in the workload
        #[arg(long, default_value = "24")]
        pairs: usize,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quote max age in milliseconds (overrides MONETA_MAX_AGE_SECS)
        #[arg(long)]
        max_age_ms: Option<u64>,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_currency(code: &str) -> anyhow::Result<Currency> {
    Currency::from_code(code).with_context(|| format!("invalid currency {:?}", code))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn convert(config: &FxConfig, amount: &str, from: &str, to: &str, json: bool) -> anyhow::Result<()> {
    let from = parse_currency(from)?;
    let to = parse_currency(to)?;
    let amount = MoneyAmount::parse(amount, from).context("invalid amount")?;

    let cache = config.build_cache(Arc::new(FixedRateTable::with_defaults()))?;
    let converter = CurrencyConverter::new(Arc::new(cache));
    let conversion = converter.convert(&amount, to).await?;

    if json {
        return print_json(&conversion);
    }

    println!(
        "{} = {} (rate {}, effective {})",
        conversion.input,
        conversion.output,
        conversion.quote.rate(),
        conversion.effective_rate().round_dp(8)
    );
    Ok(())
}

async fn rates(base: &str, json: bool) -> anyhow::Result<()> {
    let base = parse_currency(base)?;
    let table = FixedRateTable::with_defaults();

    let mut rows = Vec::new();
    for currency in table.currencies() {
        if currency == base {
            continue;
        }
        let pair = CurrencyPair::new(base.clone(), currency);
        let rate = table.exchange_rate(&pair).await?;
        rows.push((pair.to_string(), rate));
    }

    if json {
        return print_json(&rows);
    }

    for (pair, rate) in rows {
        println!("{:<8} {:>14.6}", pair, rate);
    }
    Ok(())
}

fn show_pitfalls(json: bool) -> anyhow::Result<()> {
    let pitfalls = pitfalls::pitfalls()?;

    if json {
        return print_json(&pitfalls);
    }

    for pitfall in pitfalls {
        println!("{}", pitfall.title);
        println!("  primitive:   {}", pitfall.primitive);
        println!("  fixed-point: {}", pitfall.fixed_point);
    }
    Ok(())
}

async fn simulate(
    mut config: FxConfig,
    lookups: usize,
    capacity: Option<usize>,
    pairs: usize,
    seed: Option<u64>,
    max_age_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(capacity) = capacity {
        config.cache_capacity = capacity;
    }
    if let Some(ms) = max_age_ms {
        config.max_quote_age = (ms > 0).then(|| Duration::from_millis(ms));
    }

    let table = Arc::new(FixedRateTable::with_defaults());
    let universe = all_pairs(&table.currencies());
    let cache = Arc::new(config.build_cache(table)?);

    let mut simulation = CacheSimulation::new(cache, universe, pairs, seed);
    let report = simulation.run(lookups).await;

    if json {
        return print_json(&report);
    }

    println!("Lookups:          {}", report.lookups);
    println!("Failures:         {}", report.failures);
    println!("Distinct pairs:   {}", report.pairs);
    println!("Capacity:         {}", report.cache.capacity);
    println!("Hits:             {}", report.cache.hits);
    println!("Inverse hits:     {}", report.cache.inverse_hits);
    println!("Misses:           {}", report.cache.misses);
    println!("Refreshes:        {}", report.cache.refreshes);
    println!("Evictions:        {}", report.cache.evictions);
    println!("Hit ratio:        {:.2}%", report.hit_ratio * 100.0);
    println!("Average latency:  {}us", report.latency.average_us);
    println!("p50 latency:      {}us", report.latency.p50_us);
    println!("p99 latency:      {}us", report.latency.p99_us);
    println!("Max latency:      {}us", report.latency.max_us);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json);

    let config = FxConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        cache_capacity = config.cache_capacity,
        max_quote_age = ?config.max_quote_age,
        derive_from_inverse = config.derive_from_inverse,
        "Configuration loaded"
    );

    match args.command {
        Command::Convert { amount, from, to } => convert(&config, &amount, &from, &to, args.json).await,
        Command::Rates { base } => rates(&base, args.json).await,
        Command::Pitfalls => show_pitfalls(args.json),
        Command::Simulate {
            lookups,
            capacity,
            pairs,
            seed,
            max_age_ms,
        } => simulate(config, lookups, capacity, pairs, seed, max_age_ms, args.json).await,
    }
}
