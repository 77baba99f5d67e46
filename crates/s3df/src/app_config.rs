// ai
//! 🔧 App Configuration — the sacred TOML-to-struct pipeline, now with buckets.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the bucket. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment: `S3DF_`-prefixed env vars as the base layer, an optional
//! TOML file merged on top. Nested keys in env use a double underscore
//! (`S3DF_SOURCE__BUCKET=testbucket`).
//!
//! 🧠 Knowledge graph:
//! - `[source]` → `SourceSettings` → `DataSourceConf` (via `to_data_source_conf`)
//! - `[store.S3]` / `[store.InMemory]` → `StoreConfig` → `StoreBackend::from_config`
//! - `[parser]` → `NdjsonParser`, `[runtime]` → `RuntimeConfig`, `[[schema.columns]]` → `Schema`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{ObjectStore, StoreConfig};
use crate::error::ConfigError;
use crate::hooks::{DecoderKind, KeyFilter, RegexKeyFilter};
use crate::parsers::NdjsonParser;
use crate::schema::Schema;
use crate::source::DataSourceConf;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub store: StoreConfig,
    #[serde(default)]
    pub parser: NdjsonParser,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub schema: Schema,
}

/// 🪣 Where to look and how greedily to fetch. Zeroes mean "pick the default".
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceSettings {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    /// 🔎 Regex; keys that don't match are never downloaded.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub key_batch_size: usize,
    #[serde(default)]
    pub prefetch_limit: usize,
    #[serde(default)]
    pub request_payer: Option<String>,
    #[serde(default)]
    pub decoder: DecoderKind,
}

impl SourceSettings {
    /// 🔧 Resolve into a `DataSourceConf` bound to `client`. Compiles the filter regex.
    pub fn to_data_source_conf(
        &self,
        client: Arc<dyn ObjectStore>,
    ) -> Result<DataSourceConf, ConfigError> {
        let filter = match &self.filter {
            Some(pattern) => Some(Arc::new(RegexKeyFilter::new(pattern)?) as Arc<dyn KeyFilter>),
            None => None,
        };
        Ok(DataSourceConf {
            client: Some(client),
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            filter,
            key_batch_size: self.key_batch_size,
            prefetch_limit: self.prefetch_limit,
            request_payer: self.request_payer.clone(),
            decoder: self.decoder.build(),
        })
    }
}

/// 🧵 How many loaders run at once, and how many serialized loaders may wait in line.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    #[serde(default = "default_loader_parallelism")]
    pub loader_parallelism: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loader_parallelism: default_loader_parallelism(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_loader_parallelism() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    4
}

/// 🚀 Load the config: env vars (`S3DF_*`), plus the TOML file if one was given.
///
/// 📐 `None` → env vars only. `Some(path)` → env + TOML merged, TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("S3DF_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (S3DF_*). \
             Is there a [source] with a bucket, and exactly one [store.*] table?",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (S3DF_*). \
                 No file was provided, so this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryStore;
    use std::fs;

    fn write_test_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let the_path = dir.path().join("s3df.toml");
        fs::write(&the_path, contents)
            .expect("💀 Failed to write test config. The filesystem said 'new phone who dis'.");
        the_path
    }

    #[test]
    fn the_one_where_every_table_lands_where_it_belongs() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = write_test_config(
            &the_dir,
            r#"
            [source]
            bucket = "testbucket"
            prefix = "files"
            filter = '\.jsonl$'
            key_batch_size = 2
            prefetch_limit = 3
            request_payer = "requester"
            decoder = "gzip"

            [store.S3]
            region = "eu-west-1"
            endpoint_url = "http://localhost:4566"
            force_path_style = true

            [parser]
            partition_size = 64

            [runtime]
            loader_parallelism = 3
            queue_capacity = 8

            [[schema.columns]]
            name = "coords.x"
            kind = "float64"

            [[schema.columns]]
            name = "date"
            kind = "time"
            "#,
        );

        let app_config = load_config(Some(the_path.as_path()))?;

        assert_eq!(app_config.source.bucket, "testbucket");
        assert_eq!(app_config.source.key_batch_size, 2);
        assert_eq!(app_config.source.decoder, DecoderKind::Gzip);
        assert_eq!(app_config.parser.partition_size, 64);
        assert_eq!(app_config.runtime.loader_parallelism, 3);
        assert_eq!(app_config.runtime.queue_capacity, 8);
        assert_eq!(app_config.schema.len(), 2);
        match app_config.store {
            StoreConfig::S3(s3) => {
                assert_eq!(s3.region, "eu-west-1");
                assert!(s3.force_path_style);
            }
            honestly_who_knows => panic!(
                "💀 Expected S3 store config, but serde took us to {:?}. Plot twist energy.",
                honestly_who_knows
            ),
        }
        Ok(())
    }

    #[test]
    fn the_one_where_defaults_show_up_uninvited_but_helpful() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = write_test_config(
            &the_dir,
            r#"
            [source]
            bucket = "testbucket"

            [store.InMemory]
            fixture_dir = "fixtures"
            "#,
        );

        let app_config = load_config(Some(the_path.as_path()))?;

        assert_eq!(app_config.source.prefix, "");
        assert!(app_config.source.filter.is_none());
        assert_eq!(app_config.source.decoder, DecoderKind::None);
        assert_eq!(app_config.parser.partition_size, 128);
        assert_eq!(app_config.runtime, RuntimeConfig::default());
        assert!(app_config.schema.is_empty());
        assert!(matches!(app_config.store, StoreConfig::InMemory(_)));
        Ok(())
    }

    #[test]
    fn the_one_where_a_missing_store_is_a_loud_failure() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = write_test_config(&the_dir, "[source]\nbucket = \"testbucket\"\n");
        assert!(load_config(Some(the_path.as_path())).is_err());
        Ok(())
    }

    #[test]
    fn the_one_where_settings_become_a_data_source_conf() -> anyhow::Result<()> {
        let the_settings = SourceSettings {
            bucket: "testbucket".to_string(),
            filter: Some(r"\.jsonl$".to_string()),
            decoder: DecoderKind::Gzip,
            ..Default::default()
        };
        let the_conf = the_settings.to_data_source_conf(Arc::new(InMemoryStore::new()))?;

        assert!(the_conf.client.is_some());
        assert!(the_conf.decoder.is_some());
        let the_filter = the_conf.filter.expect("💀 the filter should have compiled");
        assert!(the_filter.matches("files/a.jsonl"));
        Ok(())
    }

    #[test]
    fn the_one_where_a_broken_filter_never_reaches_the_source() {
        let the_settings = SourceSettings {
            bucket: "testbucket".to_string(),
            filter: Some("(".to_string()),
            ..Default::default()
        };
        let the_result = the_settings.to_data_source_conf(Arc::new(InMemoryStore::new()));
        assert!(matches!(the_result, Err(ConfigError::InvalidFilter { .. })));
    }
}
