// ai
//! 🪣 s3df — an object-storage bucket, served as partitions of rows.
//!
//! 🎬 *[a bucket. a prefix. ten thousand newline-delimited secrets. a dataframe engine,
//! hungry, tapping its fingers on the desk.]*
//!
//! 🧠 Knowledge graph:
//! - `backends`: `ObjectStore` (list + download) → `S3Store`, `InMemoryStore`, `StoreBackend`
//! - `source`: `DataSource` → `PartitionMap` → `PartitionLoader` → `ObjectPartitionIterator`
//! - `parsers`: bytes → rows (`NdjsonParser` ships in the box)
//! - `hooks`: decode (gzip) and key filter (regex)
//! - `supervisors`: the scan driver standing in for a host engine's scheduler
//! - `app_config`: figment, env + TOML
//!
//! 🦆 The duck reviewed the architecture diagram. The duck had notes. We ignored them.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

pub mod app_config;
pub mod backends;
pub mod error;
pub mod hooks;
pub mod parsers;
pub mod partition;
pub mod progress;
pub mod schema;
pub mod source;
pub mod supervisors;

pub use app_config::{AppConfig, RuntimeConfig, SourceSettings};
pub use backends::{ObjectStore, StoreBackend, StoreConfig};
pub use error::{ConfigError, SourceError};
pub use parsers::{NdjsonParser, ObjectOrigin, Parser};
pub use partition::{Partition, PartitionIterator, ReleaseFn, Row};
pub use progress::ScanProgress;
pub use schema::{Column, Schema};
pub use source::{DataSource, DataSourceConf, PartitionLoader, PartitionMap};
pub use supervisors::{LoaderReport, ScanSummary, Supervisor};

/// 🚀 Build the store, the source and the parser from config, then scan the whole prefix.
pub async fn run(app_config: AppConfig, progress: ScanProgress) -> Result<ScanSummary> {
    let the_store = StoreBackend::from_config(&app_config.store, &app_config.source.bucket)
        .await
        .context("💀 could not set up the object store")?;

    let the_conf = app_config
        .source
        .to_data_source_conf(Arc::new(the_store))
        .context("💀 the [source] section does not describe a usable data source")?;
    let the_source = DataSource::new(the_conf, app_config.schema.clone())
        .context("💀 the data source rejected its configuration")?;

    info!(
        "🪣 scanning s3://{}/{} with {} loader workers",
        app_config.source.bucket, app_config.source.prefix, app_config.runtime.loader_parallelism
    );

    Supervisor::new(app_config.runtime, progress)
        .scan(
            &the_source,
            Arc::new(app_config.parser),
            Arc::new(app_config.schema),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryStoreConfig;

    #[tokio::test]
    async fn the_one_where_a_fixture_folder_gets_scanned_end_to_end() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        std::fs::write(the_dir.path().join("a.jsonl"), "{\"x\":1}\n{\"x\":2}\n")?;
        std::fs::write(the_dir.path().join("b.jsonl"), "{\"x\":3}\n")?;
        std::fs::write(the_dir.path().join("notes.txt"), "not json at all\n")?;

        let the_config = AppConfig {
            source: SourceSettings {
                bucket: "testbucket".to_string(),
                prefix: "files".to_string(),
                filter: Some(r"\.jsonl$".to_string()),
                key_batch_size: 1,
                ..Default::default()
            },
            store: StoreConfig::InMemory(InMemoryStoreConfig {
                fixture_dir: the_dir.path().to_path_buf(),
                key_prefix: Some("files".to_string()),
            }),
            parser: NdjsonParser::new(10),
            runtime: RuntimeConfig::default(),
            schema: Schema::new().with_column("x", "int64"),
        };

        let the_summary = run(the_config, ScanProgress::hidden("test")).await?;

        assert_eq!(the_summary.loaders, 3);
        assert_eq!(the_summary.rows, 3);
        assert_eq!(the_summary.objects(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_fixture_folder_scans_to_nothing() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_config = AppConfig {
            source: SourceSettings {
                bucket: "testbucket".to_string(),
                prefix: "files".to_string(),
                ..Default::default()
            },
            store: StoreConfig::InMemory(InMemoryStoreConfig {
                fixture_dir: the_dir.path().to_path_buf(),
                key_prefix: Some("files".to_string()),
            }),
            parser: NdjsonParser::default(),
            runtime: RuntimeConfig::default(),
            schema: Schema::new(),
        };

        let the_summary = run(the_config, ScanProgress::hidden("test")).await?;

        assert_eq!(the_summary, ScanSummary::default());
        Ok(())
    }
}
