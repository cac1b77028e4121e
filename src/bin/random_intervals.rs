//! Random interval binary
//!
//! Prints random UTC time windows from the recent past, formatted as
//! `YYYY-MM-DD HH:MM:SS` so they can be passed straight to `birdeye-ohlcv`.

use anyhow::Result;
use birdeye_ohlcv::format_timestamp;
use chrono::Utc;
use clap::Parser;
use rand::Rng;

#[derive(Parser, Debug)]
#[command(name = "random-intervals")]
#[command(about = "Generate random time windows for sample fetches", long_about = None)]
struct Args {
    /// Number of windows to generate
    #[arg(short, long, default_value = "3")]
    count: usize,

    /// Length of each window in seconds
    #[arg(short, long, default_value = "86400")]
    duration: i64,

    /// Windows end somewhere within this many days before now
    #[arg(long, default_value = "30")]
    lookback_days: i64,
}

/// `(start, end)` pairs in unix seconds, each `duration` long, ending at a
/// random point in `[now - lookback, now]`
fn random_intervals<R: Rng>(
    rng: &mut R,
    now: i64,
    count: usize,
    duration: i64,
    lookback_secs: i64,
) -> Vec<(i64, i64)> {
    (0..count)
        .map(|_| {
            let end = now - rng.gen_range(0..=lookback_secs.max(0));
            (end - duration.max(0), end)
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.duration <= 0 {
        anyhow::bail!("duration must be positive, got {}", args.duration);
    }

    let mut rng = rand::thread_rng();
    let intervals = random_intervals(
        &mut rng,
        Utc::now().timestamp(),
        args.count,
        args.duration,
        args.lookback_days * 86_400,
    );

    for (start, end) in intervals {
        println!(
            "Start: {}, End: {}",
            format_timestamp(start),
            format_timestamp(end)
        );
    }

    Ok(())
}
