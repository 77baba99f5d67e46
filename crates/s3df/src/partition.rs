// ai
//! 🧱 Partitions — the unit of rows the host engine actually eats.
//!
//! 🧠 Knowledge graph:
//! - `Partition`: rows produced by a parser from one decoded object (or a slice of it)
//! - `ReleaseFn`: optional "I'm done with this partition" callback, passed straight through
//! - `PartitionIterator`: the one contract shared by the connector's own iterator AND
//!   every parser-produced sub-iterator. Same shape, nested one level deep.
//! - Contract: `Ok(Some(..))` while data flows,
//!   `Ok(None)` when the tap runs dry, `Err(..)` when something actually broke.

use anyhow::Result;
use async_trait::async_trait;

/// 📄 One row: values in target-schema column order.
pub type Row = Vec<serde_json::Value>;

/// 🗑️ Called once the consumer has finished with a partition.
pub type ReleaseFn = Box<dyn FnOnce() + Send>;

/// 🧱 A batch of rows. The parser decides how big; the connector just ferries it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    rows: Vec<Row>,
}

impl Partition {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// 🔄 Something that hands out partitions one at a time.
///
/// # Contract 📜
/// - `has_next_partition` is a hint: `true` means "ask me again", not "I promise a partition".
///   Once it returns `false` it must never flip back to `true`.
/// - `next_partition` returns `Ok(Some((partition, release)))` while rows flow,
///   `Ok(None)` at end of data, `Err(..)` on a real failure.
#[async_trait]
pub trait PartitionIterator: Send {
    fn has_next_partition(&self) -> bool;

    async fn next_partition(&mut self) -> Result<Option<(Partition, Option<ReleaseFn>)>>;
}
