//! Chunk aggregation
//!
//! Runs every chunk of a plan through a [`ChunkFetcher`] in order, pausing
//! between requests, and concatenates whatever succeeded. A failed chunk is
//! logged and skipped; it never aborts the aggregation.

use tracing::{info, warn};

use crate::birdeye::{ChunkFetcher, Record};
use crate::chunk::ChunkPlan;
use crate::config::RequestSpec;
use crate::pacing::PacingPolicy;

/// Per-chunk tally for one aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub chunks_total: usize,
    pub chunks_ok: usize,
    pub chunks_failed: usize,
    pub records: usize,
}

/// Fetch every chunk and concatenate the records in chunk order
///
/// Returns `None` when no chunk produced a record.
pub async fn aggregate<F, P>(
    fetcher: &F,
    pacer: &P,
    spec: &RequestSpec,
    plan: &ChunkPlan,
    token_address: Option<&str>,
) -> Option<Vec<Record>>
where
    F: ChunkFetcher,
    P: PacingPolicy,
{
    aggregate_with_report(fetcher, pacer, spec, plan, token_address)
        .await
        .0
}

/// [`aggregate`], also returning the per-chunk tally
pub async fn aggregate_with_report<F, P>(
    fetcher: &F,
    pacer: &P,
    spec: &RequestSpec,
    plan: &ChunkPlan,
    token_address: Option<&str>,
) -> (Option<Vec<Record>>, AggregateReport)
where
    F: ChunkFetcher,
    P: PacingPolicy,
{
    let total = plan.len();
    let mut records: Vec<Record> = Vec::new();
    let mut report = AggregateReport {
        chunks_total: total,
        ..AggregateReport::default()
    };

    info!("Fetching data for {} in {} chunks", spec.name, total);

    for (i, range) in plan.iter().enumerate() {
        info!("Chunk {}/{}: {}", i + 1, total, range);

        if i > 0 {
            info!(
                "Sleeping for {:.2} seconds to respect API rate limits",
                pacer.interval().as_secs_f64()
            );
            pacer.pause().await;
        }

        match fetcher.fetch_chunk(spec, *range, token_address).await {
            Ok(items) if items.is_empty() => {
                report.chunks_ok += 1;
                info!("No items found in chunk {}", i + 1);
            }
            Ok(items) => {
                report.chunks_ok += 1;
                info!("Retrieved {} items from chunk {}", items.len(), i + 1);
                records.extend(items);
            }
            Err(e) => {
                report.chunks_failed += 1;
                warn!(
                    "Failed to fetch data for {} chunk {}/{}: {}",
                    spec.name,
                    i + 1,
                    total,
                    e
                );
            }
        }
    }

    report.records = records.len();

    if records.is_empty() {
        warn!("No items collected for {}", spec.name);
        return (None, report);
    }

    info!(
        "Total items collected for {}: {} ({}/{} chunks ok)",
        spec.name,
        records.len(),
        report.chunks_ok,
        total
    );
    (Some(records), report)
}
