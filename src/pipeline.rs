//! Top-level driver: every request spec over one chunk plan
//!
//! Specs run in configuration order. Each spec is aggregated, written to
//! `<output_dir>/<name>.csv` if anything came back, and followed by a longer
//! pause before the next spec. Nothing that happens to one spec stops the
//! others.

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::aggregate::{aggregate_with_report, AggregateReport};
use crate::birdeye::ChunkFetcher;
use crate::chunk::ChunkPlan;
use crate::config::RequestSpec;
use crate::output::{csv_path, write_csv};
use crate::pacing::{FixedInterval, PacingPolicy};

/// Multiplier applied to the chunk delay between request specs
pub const SPEC_DELAY_FACTOR: u32 = 2;

/// What happened to one request spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecOutcome {
    Saved { path: PathBuf, rows: usize },
    /// No chunk returned a record; no file written
    Empty,
    PersistFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReport {
    pub name: String,
    pub outcome: SpecOutcome,
    pub chunks: AggregateReport,
}

/// Result of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<SpecReport>,
}

impl RunSummary {
    pub fn saved_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, SpecOutcome::Saved { .. }))
            .count()
    }

    pub fn total_rows(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                SpecOutcome::Saved { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn failed_chunks(&self) -> usize {
        self.reports.iter().map(|r| r.chunks.chunks_failed).sum()
    }
}

/// Runs request specs through the aggregator and the CSV sink
pub struct Pipeline<F, P> {
    fetcher: F,
    chunk_pacer: P,
    spec_pacer: P,
    plan: ChunkPlan,
    token_address: Option<String>,
    output_dir: PathBuf,
}

impl<F: ChunkFetcher> Pipeline<F, FixedInterval> {
    /// Fixed delay between chunks, twice that between specs
    pub fn with_fixed_delay(
        fetcher: F,
        delay: FixedInterval,
        plan: ChunkPlan,
        token_address: Option<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            fetcher,
            delay,
            delay.scaled(SPEC_DELAY_FACTOR),
            plan,
            token_address,
            output_dir,
        )
    }
}

impl<F, P> Pipeline<F, P>
where
    F: ChunkFetcher,
    P: PacingPolicy,
{
    pub fn new(
        fetcher: F,
        chunk_pacer: P,
        spec_pacer: P,
        plan: ChunkPlan,
        token_address: Option<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            chunk_pacer,
            spec_pacer,
            plan,
            token_address,
            output_dir: output_dir.into(),
        }
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run every spec in order
    pub async fn run(&self, specs: &[RequestSpec]) -> RunSummary {
        let mut summary = RunSummary::default();

        for (i, spec) in specs.iter().enumerate() {
            if i > 0 {
                info!(
                    "Sleeping for {:.2} seconds before next request type",
                    self.spec_pacer.interval().as_secs_f64()
                );
                self.spec_pacer.pause().await;
            }

            summary.reports.push(self.run_spec(spec).await);
        }

        summary
    }

    async fn run_spec(&self, spec: &RequestSpec) -> SpecReport {
        let (records, chunks) = aggregate_with_report(
            &self.fetcher,
            &self.chunk_pacer,
            spec,
            &self.plan,
            self.token_address.as_deref(),
        )
        .await;

        let outcome = match records {
            None => {
                warn!("Failed to fetch data for {}. Skipping CSV save.", spec.name);
                SpecOutcome::Empty
            }
            Some(records) => {
                let path = csv_path(&self.output_dir, &spec.name);
                match write_csv(&records, &path) {
                    Ok(rows) => {
                        info!("Successfully saved {} data to {}", spec.name, path.display());
                        SpecOutcome::Saved { path, rows }
                    }
                    Err(e) => {
                        error!("Failed to save {} data: {}", spec.name, e);
                        SpecOutcome::PersistFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
        };

        SpecReport {
            name: spec.name.clone(),
            outcome,
            chunks,
        }
    }
}
