//! Fetch command - download chunked OHLCV data from Birdeye and save CSVs

use anyhow::{Context, Result};
use birdeye_ohlcv::pipeline::{RunSummary, SpecOutcome};
use birdeye_ohlcv::{
    chunk_time_range, format_timestamp, parse_range, BirdeyeClient, Config, Credentials,
    FixedInterval, Pipeline,
};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Arguments for a fetch run
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Start time (UTC), 'YYYY-MM-DD HH:MM:SS' or ISO 8601, e.g. '2025-04-13T18:00:00'
    pub start_time: String,

    /// End time (UTC), 'YYYY-MM-DD HH:MM:SS' or ISO 8601, e.g. '2025-04-13T19:00:00'
    pub end_time: String,

    /// Path to configuration file
    #[arg(long, default_value = "default_config.json")]
    pub config: PathBuf,

    /// Directory to save CSV files
    #[arg(long, default_value = "output_csv")]
    pub output_dir: PathBuf,

    /// Token address to fetch data for (overrides common_parameters.address)
    #[arg(long)]
    pub token: Option<String>,

    /// Maximum hours per API request chunk
    #[arg(long, default_value_t = 24, allow_hyphen_values = true)]
    pub chunk_hours: i64,

    /// Seconds to sleep between API requests
    #[arg(long, default_value_t = 1.0)]
    pub rate_limit_sleep: f64,

    /// File holding BIRDEYE_API_KEY
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

pub fn run(args: FetchArgs) -> Result<()> {
    info!("Starting Birdeye OHLCV fetch");

    // Setup: every failure here is fatal and happens before any request
    let credentials = Credentials::from_env_file(&args.env_file)?;
    info!("API key loaded");

    let config = Config::from_file(&args.config)?;
    info!("Configuration loaded from {}", args.config.display());

    let token_address = args
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| config.default_token_address().map(str::to_string));
    match &token_address {
        Some(address) if args.token.is_some() => info!("Using custom token address: {}", address),
        Some(address) => info!("Using default token address: {}", address),
        None => info!("No token address set, using request parameters as configured"),
    }

    let range = parse_range(&args.start_time, &args.end_time).with_context(|| {
        format!(
            "Invalid time range '{}' to '{}'",
            args.start_time, args.end_time
        )
    })?;
    let delay = FixedInterval::from_secs_f64(args.rate_limit_sleep)?;
    let plan = chunk_time_range(range, args.chunk_hours);

    let client = BirdeyeClient::new(&config.common_parameters, &credentials)?;

    println!("\n{}", "=".repeat(60));
    println!("FETCHING OHLCV DATA FROM BIRDEYE");
    println!("{}", "=".repeat(60));
    println!(
        "  Start:      {} UTC ({})",
        format_timestamp(range.start()),
        range.start()
    );
    println!(
        "  End:        {} UTC ({})",
        format_timestamp(range.end()),
        range.end()
    );
    println!("  Range:      {:.2} hours", range.duration_hours());
    println!(
        "  Chunks:     {} of at most {} hours",
        plan.len(),
        plan.max_chunk_hours()
    );
    println!("  Sleep:      {} seconds between requests", args.rate_limit_sleep);
    println!("  Requests:   {}", config.ohlcv_requests.len());
    println!("  Output:     {}", args.output_dir.display());
    println!("  API limit:  60 requests per minute");
    println!("{}\n", "=".repeat(60));

    let pipeline = Pipeline::with_fixed_delay(client, delay, plan, token_address, &args.output_dir);

    // Create a tokio runtime for the HTTP client
    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(pipeline.run(&config.ohlcv_requests));

    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "=".repeat(60));
    println!("FETCH COMPLETE");
    println!("{}", "=".repeat(60));

    for report in &summary.reports {
        let chunks = format!(
            "{}/{} chunks",
            report.chunks.chunks_ok, report.chunks.chunks_total
        );
        match &report.outcome {
            SpecOutcome::Saved { path, rows } => {
                println!(
                    "  ✓ {:<20} {:>8} rows  {:<12} {}",
                    report.name,
                    rows,
                    chunks,
                    path.display()
                );
            }
            SpecOutcome::Empty => {
                println!("  ✗ {:<20} {:>8}       {:<12} no data", report.name, 0, chunks);
            }
            SpecOutcome::PersistFailed { error } => {
                println!(
                    "  ✗ {:<20} {:>8}       {:<12} save failed: {}",
                    report.name, 0, chunks, error
                );
            }
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "  Saved: {}/{}   Rows: {}   Failed chunks: {}",
        summary.saved_count(),
        summary.reports.len(),
        summary.total_rows(),
        summary.failed_chunks()
    );
    println!("{}", "=".repeat(60));
}
