// ai
//! 🔄 ObjectPartitionIterator — pulls downloaded objects off a loader's queue,
//! decodes them, and drains each through the parser's own sub-iterator.
//!
//! 🧠 Knowledge graph (the state machine, in one breath):
//! ```text
//!   draining sub-iterator ──(sub says None)──▶ awaiting next object
//!          ▲                                        │ recv()
//!          └──────────(decode + parse ok)───────────┤
//!                                                   └──(queue closed)──▶ exhausted
//! ```
//! - One sub-iterator at a time. Objects in enqueue order, partitions in parser order.
//! - Download error in the queue → `Err`. Decode error → `Err` for that object only;
//!   the next call carries on with the next object.
//! - Exhausted is forever. `has_next_partition()` never comes back from `false`.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::SourceError;
use crate::parsers::{ConsumedFn, ObjectOrigin, Parser};
use crate::partition::{Partition, PartitionIterator, ReleaseFn};
use crate::schema::Schema;
use crate::source::SourceContext;
use crate::source::partition_loader::PrefetchQueue;

/// 🔄 The connector's partition iterator over one loader's objects.
pub struct ObjectPartitionIterator {
    context: Arc<SourceContext>,
    queue: PrefetchQueue,
    parser: Arc<dyn Parser>,
    widest_schema: Arc<Schema>,
    on_partition_consumed: ConsumedFn,
    current: Option<Box<dyn PartitionIterator>>,
    exhausted: bool,
    objects_parsed: usize,
}

impl ObjectPartitionIterator {
    pub(crate) fn new(
        context: Arc<SourceContext>,
        queue: PrefetchQueue,
        parser: Arc<dyn Parser>,
        widest_schema: Arc<Schema>,
    ) -> Self {
        Self {
            context,
            queue,
            parser,
            widest_schema,
            on_partition_consumed: Arc::new(|| {}),
            current: None,
            exhausted: false,
            objects_parsed: 0,
        }
    }

    /// 🔔 Install the callback handed to the parser for every object from now on.
    pub fn with_on_partition_consumed(mut self, callback: ConsumedFn) -> Self {
        self.on_partition_consumed = callback;
        self
    }

    /// 🔢 Objects successfully decoded and handed to the parser so far.
    pub fn objects_parsed(&self) -> usize {
        self.objects_parsed
    }

    /// 📥 Next object off the queue, decoded and parsed into a fresh sub-iterator.
    /// `Ok(false)` when the queue is closed and empty.
    async fn advance_object(&mut self) -> Result<bool> {
        let Some(the_item) = self.queue.recv().await else {
            debug!("🏁 queue closed; iterator exhausted after {} objects", self.objects_parsed);
            self.exhausted = true;
            return Ok(false);
        };
        let the_object = the_item?;

        let the_config = self.context.config();
        let the_data = match &the_config.decoder {
            Some(decoder) => decoder
                .decode(the_object.data)
                .map_err(|source| SourceError::Decode {
                    key: the_object.key.clone(),
                    source,
                })?,
            None => the_object.data,
        };

        let the_origin = ObjectOrigin {
            bucket: the_config.bucket.clone(),
            key: the_object.key,
        };
        trace!("🧾 parsing {} ({} bytes)", the_origin, the_data.len());

        let the_sub_iterator = self
            .parser
            .parse(
                the_data,
                &the_origin,
                self.context.schema(),
                &self.widest_schema,
                self.on_partition_consumed.clone(),
            )
            .context(format!("💀 parser refused {}", the_origin))?;

        self.current = Some(the_sub_iterator);
        self.objects_parsed += 1;
        Ok(true)
    }
}

#[async_trait]
impl PartitionIterator for ObjectPartitionIterator {
    fn has_next_partition(&self) -> bool {
        !self.exhausted
    }

    async fn next_partition(&mut self) -> Result<Option<(Partition, Option<ReleaseFn>)>> {
        loop {
            if let Some(the_sub_iterator) = self.current.as_mut() {
                if let Some(the_partition) = the_sub_iterator.next_partition().await? {
                    return Ok(Some(the_partition));
                }
                self.current = None;
            }

            if self.exhausted || !self.advance_object().await? {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryStore;
    use crate::hooks::GzipDecoder;
    use crate::parsers::NdjsonParser;
    use crate::source::{DataSource, DataSourceConf};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gzipped(text: &str) -> Vec<u8> {
        let mut the_encoder = GzEncoder::new(Vec::new(), Compression::fast());
        the_encoder
            .write_all(text.as_bytes())
            .expect("💀 writing into a Vec cannot fail");
        the_encoder.finish().expect("💀 finishing a gzip stream into a Vec cannot fail")
    }

    async fn an_iterator(store: &InMemoryStore, conf: DataSourceConf, partition_size: usize) -> Result<ObjectPartitionIterator> {
        let the_source = DataSource::new(
            DataSourceConf {
                client: Some(Arc::new(store.clone())),
                bucket: "b".to_string(),
                prefix: "files".to_string(),
                ..conf
            },
            Schema::new(),
        )?;
        let mut the_loader = the_source.analyze().await?.next().await?;
        the_loader.load(
            Arc::new(NdjsonParser::new(partition_size)),
            Arc::new(Schema::new()),
        )
    }

    #[tokio::test]
    async fn the_one_where_partitions_chain_across_objects() -> Result<()> {
        let store = InMemoryStore::new()
            .with_object("b", "files/1.jsonl", "{}\n{}\n{}\n")
            .with_object("b", "files/2.jsonl", "")
            .with_object("b", "files/3.jsonl", "{}\n");
        let mut the_iterator = an_iterator(&store, DataSourceConf::default(), 2).await?;

        let mut the_sizes = Vec::new();
        while let Some((partition, _)) = the_iterator.next_partition().await? {
            the_sizes.push(partition.num_rows());
        }

        // 📭 the empty object is skipped without a trace
        assert_eq!(the_sizes, vec![2, 1, 1]);
        assert_eq!(the_iterator.objects_parsed(), 3);
        assert!(!the_iterator.has_next_partition());
        assert!(the_iterator.next_partition().await?.is_none());
        assert!(!the_iterator.has_next_partition());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_gzip_is_unwrapped_before_parsing() -> Result<()> {
        let store = InMemoryStore::new()
            .with_object("b", "files/1.jsonl.gz", gzipped("{\"a\":1}\n{\"a\":2}\n"));
        let mut the_iterator = an_iterator(
            &store,
            DataSourceConf {
                decoder: Some(Arc::new(GzipDecoder)),
                ..Default::default()
            },
            10,
        )
        .await?;

        let (the_partition, _) = the_iterator
            .next_partition()
            .await?
            .expect("💀 the decoded object should produce a partition");
        assert_eq!(the_partition.num_rows(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_one_cursed_blob_does_not_sink_the_rest() -> Result<()> {
        let store = InMemoryStore::new()
            .with_object("b", "files/1.gz", gzipped("{}\n"))
            .with_object("b", "files/2.gz", "definitely not gzip")
            .with_object("b", "files/3.gz", gzipped("{}\n{}\n"));
        let mut the_iterator = an_iterator(
            &store,
            DataSourceConf {
                decoder: Some(Arc::new(GzipDecoder)),
                ..Default::default()
            },
            10,
        )
        .await?;

        assert_eq!(
            the_iterator.next_partition().await?.map(|(p, _)| p.num_rows()),
            Some(1)
        );
        let the_error = the_iterator
            .next_partition()
            .await
            .err()
            .expect("💀 the cursed blob should fail to decode");
        match the_error.downcast_ref::<SourceError>() {
            Some(SourceError::Decode { key, .. }) => assert_eq!(key, "files/2.gz"),
            other => panic!("💀 expected a Decode error, got {:?}", other),
        }
        assert_eq!(
            the_iterator.next_partition().await?.map(|(p, _)| p.num_rows()),
            Some(2)
        );
        assert!(the_iterator.next_partition().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_release_reaches_the_installed_callback() -> Result<()> {
        let store = InMemoryStore::new()
            .with_object("b", "files/1.jsonl", "{}\n{}\n")
            .with_object("b", "files/2.jsonl", "{}\n");
        let the_released = Arc::new(AtomicUsize::new(0));
        let the_counter = the_released.clone();
        let mut the_iterator = an_iterator(&store, DataSourceConf::default(), 1)
            .await?
            .with_on_partition_consumed(Arc::new(move || {
                the_counter.fetch_add(1, Ordering::SeqCst);
            }));

        while let Some((_partition, release)) = the_iterator.next_partition().await? {
            if let Some(release) = release {
                release();
            }
        }
        assert_eq!(the_released.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_bucket_of_nothing_ends_cleanly() -> Result<()> {
        let store = InMemoryStore::new()
            .with_object("b", "files/skip.csv", "a,b\n")
            .with_object("b", "files/also.csv", "c,d\n");
        let mut the_iterator = an_iterator(
            &store,
            DataSourceConf {
                filter: Some(Arc::new(crate::hooks::RegexKeyFilter::new(r"\.jsonl$")?)),
                ..Default::default()
            },
            10,
        )
        .await?;

        assert!(the_iterator.has_next_partition());
        assert!(the_iterator.next_partition().await?.is_none());
        assert!(!the_iterator.has_next_partition());
        assert_eq!(store.download_count(), 0);
        Ok(())
    }
}
