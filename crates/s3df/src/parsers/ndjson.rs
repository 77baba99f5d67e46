// ai
//! 🎬 *[NDJSON: one newline per doc. no commas. no brackets. just vibes and vertical whitespace.]*
//!
//! 📡 `NdjsonParser` — newline-delimited JSON into fixed-size row partitions.
//!
//! 🧠 Knowledge graph:
//! - Line splitting: `memchr` hunts `\n` so we don't walk bytes one at a time like animals
//! - `\r\n` tolerated, blank lines skipped, last line may lack its newline
//! - Projection: each target column name is a dotted path (`coords.x`) into the document;
//!   missing → `null`. Empty target schema → the whole document is the single column.
//! - Lazy: lines are parsed only when a partition is requested
//! - Bad line: the good rows before it come out first as a short partition, the error
//!   on the next call, and the call after that picks up at the following line

use anyhow::{Context, Result};
use async_trait::async_trait;
use memchr::memchr;
use serde::Deserialize;
use serde_json::Value;

use crate::parsers::{ConsumedFn, ObjectOrigin, Parser};
use crate::partition::{Partition, PartitionIterator, ReleaseFn, Row};
use crate::schema::Schema;

/// 📡 Newline-delimited JSON parser.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct NdjsonParser {
    /// 📦 Max rows per partition.
    #[serde(default = "default_partition_size")]
    pub partition_size: usize,
}

// 📦 128 rows. small enough to stream, big enough to not be silly.
fn default_partition_size() -> usize {
    128
}

impl Default for NdjsonParser {
    fn default() -> Self {
        Self {
            partition_size: default_partition_size(),
        }
    }
}

impl NdjsonParser {
    pub fn new(partition_size: usize) -> Self {
        Self { partition_size }
    }
}

impl Parser for NdjsonParser {
    fn parse(
        &self,
        data: Vec<u8>,
        origin: &ObjectOrigin,
        _source_schema: &Schema,
        target_schema: &Schema,
        on_partition_consumed: ConsumedFn,
    ) -> Result<Box<dyn PartitionIterator>> {
        let column_paths = target_schema
            .column_names()
            .map(|name| name.split('.').map(str::to_string).collect())
            .collect();

        Ok(Box::new(NdjsonPartitionIterator {
            data,
            cursor: 0,
            line_number: 0,
            partition_size: self.partition_size.max(1),
            column_paths,
            origin: origin.clone(),
            on_partition_consumed,
            pending_error: None,
        }))
    }
}

struct NdjsonPartitionIterator {
    data: Vec<u8>,
    cursor: usize,
    line_number: usize,
    partition_size: usize,
    column_paths: Vec<Vec<String>>,
    origin: ObjectOrigin,
    on_partition_consumed: ConsumedFn,
    // 💀 a bad line found after some good rows; surfaced on the next call
    pending_error: Option<anyhow::Error>,
}

impl NdjsonPartitionIterator {
    /// 🔪 Slice off the next line (sans `\n` / `\r\n`), or `None` at the end of the buffer.
    fn next_line(&mut self) -> Option<(usize, &[u8])> {
        if self.cursor >= self.data.len() {
            return None;
        }
        let the_rest = &self.data[self.cursor..];
        let (the_line, the_advance) = match memchr(b'\n', the_rest) {
            Some(newline_at) => (&the_rest[..newline_at], newline_at + 1),
            None => (the_rest, the_rest.len()),
        };
        self.cursor += the_advance;
        self.line_number += 1;
        let the_line = the_line.strip_suffix(b"\r").unwrap_or(the_line);
        Some((self.line_number, the_line))
    }

    fn project(column_paths: &[Vec<String>], document: Value) -> Row {
        if column_paths.is_empty() {
            return vec![document];
        }
        column_paths
            .iter()
            .map(|path| {
                path.iter()
                    .try_fold(&document, |node, segment| node.get(segment))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }
}

#[async_trait]
impl PartitionIterator for NdjsonPartitionIterator {
    fn has_next_partition(&self) -> bool {
        self.pending_error.is_some() || self.cursor < self.data.len()
    }

    async fn next_partition(&mut self) -> Result<Option<(Partition, Option<ReleaseFn>)>> {
        if let Some(the_error) = self.pending_error.take() {
            return Err(the_error);
        }
        let mut rows = Vec::with_capacity(self.partition_size);

        while rows.len() < self.partition_size {
            let Some((the_line_number, the_line)) = self.next_line() else {
                break;
            };
            if the_line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let the_parsed = serde_json::from_slice::<Value>(the_line).context(format!(
                "💀 line {} of {} is not valid JSON",
                the_line_number, self.origin
            ));
            match the_parsed {
                Ok(the_document) => rows.push(Self::project(&self.column_paths, the_document)),
                Err(the_error) if rows.is_empty() => return Err(the_error),
                Err(the_error) => {
                    self.pending_error = Some(the_error);
                    break;
                }
            }
        }

        if rows.is_empty() {
            return Ok(None);
        }

        let the_callback = self.on_partition_consumed.clone();
        let the_release: ReleaseFn = Box::new(move || the_callback());
        Ok(Some((Partition::new(rows), Some(the_release))))
    }
}
