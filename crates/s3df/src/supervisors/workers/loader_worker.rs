//! 🎬 *[a channel fills with serialized loaders. somewhere, a worker waits.]*
//! *[it has never met the bucket. it never will. it only knows bytes.]*
//!
//! 🚚 The LoaderWorker — pulls a loader's wire form off the channel, rehydrates it
//! through the data source, drains every partition, and files a report.
//!
//! ⚠️ One loader at a time per worker. Parallelism comes from running several workers.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::debug;

use super::Worker;
use crate::parsers::Parser;
use crate::partition::PartitionIterator;
use crate::progress::ScanProgress;
use crate::schema::Schema;
use crate::source::DataSource;
use crate::supervisors::LoaderReport;

/// 🚚 Drains loaders it receives as bytes. The remote executor of this repo.
#[derive(Debug)]
pub(crate) struct LoaderWorker {
    worker_id: usize,
    rx: Receiver<Vec<u8>>,
    reports: Sender<LoaderReport>,
    source: DataSource,
    parser: Arc<dyn Parser>,
    widest_schema: Arc<Schema>,
    progress: ScanProgress,
}

impl LoaderWorker {
    pub(crate) fn new(
        worker_id: usize,
        rx: Receiver<Vec<u8>>,
        reports: Sender<LoaderReport>,
        source: DataSource,
        parser: Arc<dyn Parser>,
        widest_schema: Arc<Schema>,
        progress: ScanProgress,
    ) -> Self {
        Self {
            worker_id,
            rx,
            reports,
            source,
            parser,
            widest_schema,
            progress,
        }
    }

    async fn drain_one(&self, wire_bytes: &[u8]) -> Result<LoaderReport> {
        let mut the_loader = self
            .source
            .deserialize_loader(wire_bytes)
            .context("💀 LoaderWorker could not rehydrate a loader from its wire form")?;
        let the_label = the_loader.to_string();
        debug!("🚚 worker {} picked up {}", self.worker_id, the_label);

        let mut the_iterator = the_loader
            .load(self.parser.clone(), self.widest_schema.clone())
            .context(format!("💀 LoaderWorker could not start {}", the_label))?;

        let mut the_report = LoaderReport {
            label: the_label,
            objects: 0,
            partitions: 0,
            rows: 0,
        };
        while let Some((the_partition, the_release)) = the_iterator
            .next_partition()
            .await
            .context(format!("💀 LoaderWorker failed while draining {}", the_report.label))?
        {
            the_report.partitions += 1;
            the_report.rows += the_partition.num_rows();
            self.progress.record_partition(the_partition.num_rows() as u64);
            if let Some(release) = the_release {
                release();
            }
        }
        the_report.objects = the_iterator.objects_parsed();

        self.progress.record_loader();
        debug!(
            "✅ worker {} drained {}: {} partitions, {} rows",
            self.worker_id, the_report.label, the_report.partitions, the_report.rows
        );
        Ok(the_report)
    }
}

impl Worker for LoaderWorker {
    fn start(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            debug!("📥 LoaderWorker {} started draining channel...", self.worker_id);
            loop {
                match self.rx.recv().await {
                    Ok(wire_bytes) => {
                        let the_report = self.drain_one(&wire_bytes).await?;
                        // 📬 the supervisor holds the report receiver until every worker joins
                        self.reports
                            .send(the_report)
                            .await
                            .context("💀 LoaderWorker's report channel closed early")?;
                    }
                    Err(_) => {
                        // Channel is empty and closed
                        debug!("🏁 LoaderWorker {}: channel closed. Shutting down.", self.worker_id);
                        return Ok(());
                    }
                }
            }
        })
    }
}
