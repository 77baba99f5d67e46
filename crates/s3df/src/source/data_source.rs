// ai
//! 🚪 DataSource — the front door. Validates the config once, then hands out
//! partition maps and rehydrates loaders that crossed a process boundary.
//!
//! 🧠 Knowledge graph:
//! - `DataSourceConf`: what the caller asked for (raw, unvalidated)
//! - `SourceContext`: what survived validation (defaults applied, client unwrapped),
//!   shared by `Arc` with every map, loader and iterator this source ever creates
//! - `DataSource::new` → `Result<_, ConfigError>`. No half-built sources. Ever.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::backends::{ObjectStore, PROVIDER_PAGE_LIMIT};
use crate::error::ConfigError;
use crate::hooks::{Decoder, KeyFilter};
use crate::schema::Schema;
use crate::source::{DetachedLoader, PartitionLoader, PartitionMap};

/// 📏 Keys per listing page (and therefore per loader) when the caller says 0.
pub const DEFAULT_KEY_BATCH_SIZE: usize = PROVIDER_PAGE_LIMIT;
/// 📦 Downloaded-but-unparsed objects a loader may hold when the caller says 0.
pub const DEFAULT_PREFETCH_LIMIT: usize = 2;

/// 🔧 Everything a data source needs to know about its bucket.
#[derive(Debug, Clone, Default)]
pub struct DataSourceConf {
    /// 🔌 The storage client. Required. `None` is a `ConfigError::MissingClient`.
    pub client: Option<Arc<dyn ObjectStore>>,
    pub bucket: String,
    /// 🏷️ Key prefix to list under. Empty lists the whole bucket.
    pub prefix: String,
    /// 🔎 Keys failing this filter are never downloaded.
    pub filter: Option<Arc<dyn KeyFilter>>,
    /// 📏 Page size of the listing, and the number of keys per loader. 0 → 1000.
    pub key_batch_size: usize,
    /// 📦 Bounded queue depth per loader. 0 → 2.
    pub prefetch_limit: usize,
    /// 💸 Forwarded verbatim to list and download calls (e.g. `"requester"`).
    pub request_payer: Option<String>,
    /// 🫁 Applied to every object's bytes before parsing.
    pub decoder: Option<Arc<dyn Decoder>>,
}

/// 🧬 The validated, shared state behind a `DataSource`.
#[derive(Debug)]
pub struct SourceContext {
    store: Arc<dyn ObjectStore>,
    config: DataSourceConf,
    schema: Schema,
}

impl SourceContext {
    pub(crate) fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &DataSourceConf {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// 🪣 A bucket prefix exposed as a partitioned, non-streaming data source.
#[derive(Debug, Clone)]
pub struct DataSource {
    context: Arc<SourceContext>,
}

impl DataSource {
    /// 🏗️ Validate and normalize `config`.
    ///
    /// - no client → [`ConfigError::MissingClient`]
    /// - empty bucket → [`ConfigError::MissingBucket`]
    /// - batch size 0 → 1000, above 1000 → [`ConfigError::BatchSizeTooLarge`]
    /// - prefetch limit 0 → 2
    pub fn new(mut config: DataSourceConf, schema: Schema) -> Result<Self, ConfigError> {
        let store = config.client.clone().ok_or(ConfigError::MissingClient)?;

        if config.bucket.is_empty() {
            return Err(ConfigError::MissingBucket);
        }

        config.key_batch_size = match config.key_batch_size {
            0 => DEFAULT_KEY_BATCH_SIZE,
            n if n > PROVIDER_PAGE_LIMIT => {
                return Err(ConfigError::BatchSizeTooLarge {
                    requested: n,
                    limit: PROVIDER_PAGE_LIMIT,
                });
            }
            n => n,
        };

        if config.prefetch_limit == 0 {
            config.prefetch_limit = DEFAULT_PREFETCH_LIMIT;
        }

        debug!(
            "🚪 data source ready: s3://{}/{} (batch {}, prefetch {}, filter: {}, decoder: {})",
            config.bucket,
            config.prefix,
            config.key_batch_size,
            config.prefetch_limit,
            config.filter.is_some(),
            config.decoder.is_some()
        );

        Ok(Self {
            context: Arc::new(SourceContext {
                store,
                config,
                schema,
            }),
        })
    }

    /// 🔭 Fetch the first listing page and return the map that walks the rest.
    pub async fn analyze(&self) -> Result<PartitionMap> {
        PartitionMap::start(self.context.clone()).await
    }

    /// 🧳 Rebuild a loader from its wire form, bound to this source's client and config.
    pub fn deserialize_loader(&self, bytes: &[u8]) -> Result<PartitionLoader> {
        Ok(DetachedLoader::from_bytes(bytes)?.attach(self.context.clone()))
    }

    /// 🧊 A bucket listing is a snapshot. This source is bounded.
    pub fn is_streaming(&self) -> bool {
        false
    }

    pub fn config(&self) -> &DataSourceConf {
        self.context.config()
    }

    pub fn schema(&self) -> &Schema {
        self.context.schema()
    }

    pub fn context(&self) -> Arc<SourceContext> {
        self.context.clone()
    }
}
