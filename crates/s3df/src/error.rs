// ai
//! 💀 Errors: the typed ones. The ones you can actually `match` on at 3am.
//!
//! Everything else in this crate rides on `anyhow` with a context string attached,
//! the usual way. But some failures need a name tag, because the caller has to tell
//! "the config is broken" apart from "the bucket hung up on us" apart from "this one
//! gzip blob is cursed". Those live here, and they travel inside `anyhow::Error`
//! until someone calls `downcast_ref::<SourceError>()` to find out which one it was.
//!
//! 🧠 Knowledge graph:
//! - `ConfigError`: returned straight out of `DataSource::new` and config resolution.
//!   If you got one, you never got a `DataSource`. That's the whole guarantee.
//! - `SourceError`: runtime failures (listing, download, decode, wire format).
//! - End-of-data is NOT an error. It's `Ok(None)`. It does not live here. It never will. 🦆

use thiserror::Error;

/// 🔧 Configuration went sideways before a single byte left the bucket.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 🔌 No storage client was handed to the source. We can't list what we can't reach.
    #[error("💀 no object store client was configured for the data source")]
    MissingClient,
    /// 🪣 An empty bucket name. Not an empty bucket. An empty *name*. Worse.
    #[error("💀 the bucket name is empty; a data source needs somewhere to look")]
    MissingBucket,
    /// 📏 The provider pages at most 1000 keys. Asking for more is wishful thinking.
    #[error("💀 key batch size {requested} exceeds the provider page limit of {limit}")]
    BatchSizeTooLarge { requested: usize, limit: usize },
    /// 🔎 The name filter pattern did not compile.
    #[error("💀 name filter '{pattern}' is not a valid regex: {reason}")]
    InvalidFilter { pattern: String, reason: String },
}

/// 📡 Runtime failures of the discovery-and-loading pipeline.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 📜 The listing call failed. Discovery is over.
    #[error("💀 listing s3://{bucket}/{prefix} failed")]
    Listing {
        bucket: String,
        prefix: String,
        #[source]
        source: anyhow::Error,
    },
    /// 📥 A download failed. The loader that owned it stops here.
    #[error("💀 downloading object '{key}' failed")]
    Download {
        key: String,
        #[source]
        source: anyhow::Error,
    },
    /// 🫁 The decode hook rejected an object's bytes.
    #[error("💀 decoding object '{key}' failed")]
    Decode {
        key: String,
        #[source]
        source: anyhow::Error,
    },
    /// 🧳 A loader's wire form could not be packed or unpacked.
    #[error("💀 partition loader wire format: {0}")]
    Serialization(#[from] bincode::Error),
    /// 🏁 Someone asked an exhausted partition map for more.
    #[error("💀 the partition map is exhausted; check has_next() before next()")]
    Exhausted,
}
