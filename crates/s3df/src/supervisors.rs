//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where loaders are bytes on a wire..."
//! 🎬 "One supervisor dared to hand them all out."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor — stands in for the host engine's scheduler. It walks the
//! partition map, serializes every loader, and throws the bytes over a bounded
//! channel to a pool of `LoaderWorker`s, exactly as if they lived in other processes.
//!
//! 🧠 Knowledge graph:
//! - discovery (here) ──Vec<u8>──▶ async_channel(queue_capacity) ──▶ N × LoaderWorker
//! - each worker: `deserialize_loader` → `load` → drain → `LoaderReport`
//! - first error wins: a worker failure or a discovery failure fails the scan
//!
//! ⚠️ Workers stay private to the supervisor. Like Fight Club, but for async tasks.

mod workers;

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{debug, info};

use crate::app_config::RuntimeConfig;
use crate::parsers::Parser;
use crate::progress::ScanProgress;
use crate::schema::Schema;
use crate::source::DataSource;
use workers::{LoaderWorker, Worker};

/// 📋 What one loader amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderReport {
    pub label: String,
    pub objects: usize,
    pub partitions: usize,
    pub rows: usize,
}

/// 📋 What the whole scan amounted to. Reports are sorted by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub loaders: usize,
    pub partitions: usize,
    pub rows: usize,
    pub reports: Vec<LoaderReport>,
}

impl ScanSummary {
    pub fn objects(&self) -> usize {
        self.reports.iter().map(|r| r.objects).sum()
    }
}

/// 📦 The Supervisor: hovers over the workers asking "is it done yet?"
#[derive(Debug, Clone)]
pub struct Supervisor {
    runtime: RuntimeConfig,
    progress: ScanProgress,
}

impl Supervisor {
    pub fn new(runtime: RuntimeConfig, progress: ScanProgress) -> Self {
        Self { runtime, progress }
    }

    /// 🧵 Discover, distribute, drain. Returns once every worker has gone home.
    pub async fn scan(
        &self,
        source: &DataSource,
        parser: Arc<dyn Parser>,
        widest_schema: Arc<Schema>,
    ) -> Result<ScanSummary> {
        let the_parallelism = self.runtime.loader_parallelism.max(1);
        let (tx, rx) = async_channel::bounded::<Vec<u8>>(self.runtime.queue_capacity.max(1));
        let (report_tx, report_rx) = async_channel::unbounded();

        let the_workers: Vec<_> = (0..the_parallelism)
            .map(|worker_id| {
                LoaderWorker::new(
                    worker_id,
                    rx.clone(),
                    report_tx.clone(),
                    source.clone(),
                    parser.clone(),
                    widest_schema.clone(),
                    self.progress.clone(),
                )
                .start()
            })
            .collect();
        // 🔌 only the workers hold these now; channel lifetimes follow theirs
        drop(rx);
        drop(report_tx);
        info!("🧵 {} loader workers started", the_parallelism);

        let the_discovery = async {
            let mut the_map = source.analyze().await?;
            while the_map.has_next() {
                let the_loader = the_map.next().await?;
                let the_bytes = the_loader.serialize()?;
                tx.send(the_bytes)
                    .await
                    .context("💀 every loader worker quit before discovery finished")?;
            }
            Ok::<usize, anyhow::Error>(the_map.loaders_issued())
        }
        .await;
        drop(tx);

        let mut the_first_worker_error = None;
        for the_outcome in join_all(the_workers).await {
            let the_outcome = the_outcome
                .context("💀 a LoaderWorker panicked")
                .and_then(|result| result);
            if let Err(error) = the_outcome {
                the_first_worker_error.get_or_insert(error);
            }
        }
        self.progress.finish();

        if let Some(error) = the_first_worker_error {
            return Err(error);
        }
        let the_loaders = the_discovery?;

        let mut the_reports = Vec::with_capacity(the_loaders);
        while let Ok(report) = report_rx.try_recv() {
            the_reports.push(report);
        }
        the_reports.sort_by(|a, b| a.label.cmp(&b.label));

        let the_summary = ScanSummary {
            loaders: the_loaders,
            partitions: the_reports.iter().map(|r| r.partitions).sum(),
            rows: the_reports.iter().map(|r| r.rows).sum(),
            reports: the_reports,
        };
        debug!("🏁 scan finished: {:?}", the_summary);
        Ok(the_summary)
    }
}
