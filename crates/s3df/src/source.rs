// ai
//! 🪣➡️🧱 Source — the discovery-and-loading pipeline.
//!
//! 🎬 *[INT. BUCKET — a thousand keys in lexicographic order, waiting to be somebody's rows.]*
//!
//! 🧠 Knowledge graph:
//! ```text
//!   DataSource::analyze()
//!     └─▶ PartitionMap ── next() ──▶ PartitionLoader (one listing page of keys)
//!                                       │ serialize() ⇄ DetachedLoader::from_bytes() + attach()
//!                                       └─ load() ──▶ ObjectPartitionIterator
//!                                                      ▲ bounded queue (prefetch limit)
//!                                                      └─ downloader task (one per loader)
//! ```
//! - Per-loader object order and per-object partition order are preserved.
//!   Nothing is promised across loaders.
//! - The store handle is shared read-only; each loader owns its queue.

mod data_source;
mod partition_iterator;
mod partition_loader;
mod partition_map;

pub use data_source::{
    DEFAULT_KEY_BATCH_SIZE, DEFAULT_PREFETCH_LIMIT, DataSource, DataSourceConf, SourceContext,
};
pub use partition_iterator::ObjectPartitionIterator;
pub use partition_loader::{DetachedLoader, DownloadedObject, PartitionLoader};
pub use partition_map::PartitionMap;
