//! 🔌 Backends — where the real I/O happens.
//!
//! 🪣 An object store does exactly two things for us: it lists keys one page at a
//! time, and it hands over an object's bytes when asked nicely. Everything clever
//! (batching, prefetching, parsing) happens upstream in `source`. The backends are
//! the plumbing. Plumbing is honest work.
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait (`ObjectStore`) → concrete impls (`S3Store`, `InMemoryStore`) →
//!   `StoreBackend` enum dispatcher → `from_config` resolver. Same as it ever was.
//! - Configs live next to the backend that uses them (`S3StoreConfig` in `s3/`,
//!   `InMemoryStoreConfig` in `in_mem/`). No scavenger hunts at 2am.
//! - Each call either succeeds or fails. Retries belong to the SDK, not to us.
//!
//! 🦆 The duck is here because every file must have one. This is law.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

pub(crate) mod in_mem;
pub(crate) mod s3;

pub use in_mem::{InMemoryStore, InMemoryStoreConfig};
pub use s3::{S3Store, S3StoreConfig};

/// 📏 The most keys a provider will return in one listing page.
pub const PROVIDER_PAGE_LIMIT: usize = 1000;

/// 📜 One listing request: where to look, how many keys, and where we left off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub bucket: String,
    pub prefix: String,
    /// 🔖 Token from the previous page. `None` on the first call.
    pub continuation_token: Option<String>,
    pub max_keys: i32,
    pub request_payer: Option<String>,
}

/// 📜 One page of listed keys, plus the bookmark for the next page (if any).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// 🔖 `None` means there are no more pages. Not "maybe". None.
    pub next_continuation_token: Option<String>,
}

/// 🪣 A remote (or not so remote) bucket of objects.
///
/// # Contract 📜
/// - `list_objects` returns keys in the provider's listing order, at most `max_keys` of them.
/// - `download_object` returns the whole object in memory. Big objects are the
///   caller's memory budget problem, which is what the prefetch limit is for.
/// - Shared read-only behind an `Arc` by every loader of a source.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage>;

    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        request_payer: Option<&str>,
    ) -> Result<Vec<u8>>;
}

/// 🎛️ Which store to talk to. TOML: `[store.S3]` or `[store.InMemory]`.
#[derive(Debug, Deserialize, Clone)]
pub enum StoreConfig {
    S3(S3StoreConfig),
    InMemory(InMemoryStoreConfig),
}

/// 🎭 The many faces of an object store — a universal remote for buckets.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    S3(S3Store),
    InMemory(InMemoryStore),
}

impl StoreBackend {
    /// 🔧 Build the configured store. `bucket` is where in-memory fixtures get filed.
    pub async fn from_config(config: &StoreConfig, bucket: &str) -> Result<Self> {
        match config {
            StoreConfig::S3(s3_config) => Ok(Self::S3(S3Store::from_config(s3_config).await)),
            StoreConfig::InMemory(mem_config) => Ok(Self::InMemory(
                InMemoryStore::from_config(mem_config, bucket).await?,
            )),
        }
    }
}

#[async_trait]
impl ObjectStore for StoreBackend {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage> {
        match self {
            StoreBackend::S3(s) => s.list_objects(request).await,
            StoreBackend::InMemory(m) => m.list_objects(request).await,
        }
    }

    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        request_payer: Option<&str>,
    ) -> Result<Vec<u8>> {
        match self {
            StoreBackend::S3(s) => s.download_object(bucket, key, request_payer).await,
            StoreBackend::InMemory(m) => m.download_object(bucket, key, request_payer).await,
        }
    }
}
