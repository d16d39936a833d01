use std::{env, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use coinboard::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cfg = match env::args().nth(1) {
        Some(path) => DashboardConfig::from_json_file(&path)
            .with_context(|| format!("Failed to read config {path}"))?,
        None => fixture_config(),
    };
    let out_dir = PathBuf::from("demos/out");

    let load_start = Instant::now();
    let dataset = Dataset::load(&cfg).context("Failed to load dashboard inputs")?;
    let load_time = load_start.elapsed();

    // Sentiment bars, narrowed step by step like a user clicking through the selects.
    let mut bars = Session::new(
        &dataset,
        ViewRequest::SentimentPivot,
        JsonSurface::new(out_dir.join("sentiment.json")),
    )?;
    let panel = bars.controls()?;
    info!(sources = ?panel.source, subjects = ?panel.subject, "Controls ready");

    if let Some(source) = panel.source.get(1) {
        bars.dispatch(ControlChange::Source(Choice::only(source.as_str())))?;
    }
    bars.dispatch(ControlChange::Polarity(Some(ValueRange::new(-1.0, 1.0)?)))?;

    // Price scatter on the configured axes.
    let mut prices = Session::new(
        &dataset,
        ViewRequest::Scatter {
            source: ScatterSource::Prices,
            axes: cfg.scatter_axes.clone(),
        },
        JsonSurface::new(out_dir.join("prices.json")),
    )?;
    prices.dispatch(ControlChange::YAxis("close".to_string()))?;

    // Everything that happened on the same day.
    let joined = Session::new(
        &dataset,
        ViewRequest::scatter(ScatterSource::Joined, "date", "crypto_sentiment_polarity"),
        MemorySurface::new(),
    )?;

    println!("\n--- Dashboard ---");
    println!("Load time:          {load_time:?}");
    println!("Sentiment days:     {}", bars.view().height());
    println!("Price points:       {}", prices.view().height());
    println!("Same-day matches:   {}", joined.view().height());
    println!("Frames written to:  {}", out_dir.display());

    Ok(())
}

fn fixture_config() -> DashboardConfig {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    DashboardConfig::default()
        .with_prices(fixtures.join("coin_Bitcoin.csv"))
        .with_headlines(fixtures.join("Bitcoin.csv"))
        .with_crypto_news(fixtures.join("cryptonews.csv"))
        .with_description(fixtures.join("description.html"))
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NONE)
        .with_current_span(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}
