// ai
//! 🧾 Parsers — bytes go in, partitions of rows come out.
//!
//! The connector does not know what a row looks like. It downloads, decodes, and
//! then hands the bytes to whatever [`Parser`] it was given, which returns its own
//! [`PartitionIterator`] over that one object. The connector drains it, then moves
//! on to the next object. Parsers never see the bucket, the queue, or each other.
//!
//! 🧠 Knowledge graph:
//! - `Parser::parse(bytes, origin, source_schema, target_schema, on_consumed)` → sub-iterator
//! - `NdjsonParser`: the built-in one. One JSON document per line.
//! - `on_partition_consumed` is the parser's hook into the release callback of every
//!   partition it produces. The connector passes it through untouched. 🦆

use std::sync::Arc;

use anyhow::Result;

use crate::partition::PartitionIterator;
use crate::schema::Schema;

mod ndjson;

pub use ndjson::NdjsonParser;

/// 📍 Where a blob of bytes came from. Parsers put this in their error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectOrigin {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ObjectOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// 🔔 Invoked each time a partition produced from an object is released by the consumer.
pub type ConsumedFn = Arc<dyn Fn() + Send + Sync>;

/// 🧾 Turns one decoded object into a sequence of row partitions.
///
/// # Contract 📜
/// - Called once per object, on the consumer's task. Keep it cheap; do the heavy
///   lifting lazily inside the returned iterator.
/// - `source_schema` is the data source's own schema; `target_schema` is the widest
///   schema the engine wants rows shaped as. Both are opaque to the connector.
pub trait Parser: Send + Sync + std::fmt::Debug {
    fn parse(
        &self,
        data: Vec<u8>,
        origin: &ObjectOrigin,
        source_schema: &Schema,
        target_schema: &Schema,
        on_partition_consumed: ConsumedFn,
    ) -> Result<Box<dyn PartitionIterator>>;
}
