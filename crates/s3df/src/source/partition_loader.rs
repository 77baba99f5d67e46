// ai
//! 🚚 PartitionLoader — one batch of keys, one background downloader, one bounded queue.
//!
//! 🎬 *[a delivery truck idles outside. it has five parcels. the porch fits two.
//! the driver waits. the driver always waits. the porch is the prefetch limit.]*
//!
//! 🧠 Knowledge graph:
//! - Wire form: only the ordered key list, bincode-encoded. Clients, filters and
//!   decoders are NOT serializable and never travel. `DetachedLoader` holds the keys
//!   until `attach` binds them to a live `SourceContext` again.
//! - `load()` spawns the downloader at most once per loader. Later calls clone the
//!   same multi-consumer receiver, so two iterators split the objects between them
//!   instead of downloading everything twice.
//! - Prefetch slots: a `Semaphore` with `prefetch_limit` permits. The downloader takes a
//!   slot BEFORE it downloads, the slot rides the queue with the object, and it is handed
//!   back when the iterator takes the object off the queue. No slot → no download.
//! - A download failure rides the queue as `SourceError::Download`, then the
//!   downloader stops. Every consumer handle gone → the slots close → the downloader stops too.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace, warn};

use crate::error::SourceError;
use crate::parsers::Parser;
use crate::schema::Schema;
use crate::source::{ObjectPartitionIterator, SourceContext};

/// 📥 One object's key and (still encoded) bytes, sitting in the prefetch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedObject {
    pub key: String,
    pub data: Vec<u8>,
}

/// 📬 What travels through the queue: an object, or the reason there won't be one.
pub(crate) type DownloadItem = Result<DownloadedObject>;

/// 🎟️ A queued item and the prefetch slot it was downloaded under.
struct Prefetched {
    item: DownloadItem,
    _slot: OwnedSemaphorePermit,
}

/// 🔌 Closes the prefetch slots once the last consumer handle is gone, which wakes a
/// downloader parked on `acquire_owned` and sends it home.
struct HangUp(Arc<Semaphore>);

impl Drop for HangUp {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// 📬 The consumer end of a loader's prefetch queue. Clones share the same queue.
#[derive(Clone)]
pub(crate) struct PrefetchQueue {
    receiver: Receiver<Prefetched>,
    _hang_up: Arc<HangUp>,
}

impl PrefetchQueue {
    /// 📥 Take the next item off the queue and give its slot back.
    /// `None` once the downloader is done and the queue is drained.
    pub(crate) async fn recv(&self) -> Option<DownloadItem> {
        self.receiver.recv().await.ok().map(|prefetched| prefetched.item)
    }

    fn len(&self) -> usize {
        self.receiver.len()
    }
}

#[derive(Serialize, Deserialize)]
struct LoaderWire {
    keys: Vec<String>,
}

/// 🚚 A batch of object keys plus the machinery to fetch them.
pub struct PartitionLoader {
    context: Arc<SourceContext>,
    keys: Vec<String>,
    queue: Option<PrefetchQueue>,
}

impl PartitionLoader {
    pub(crate) fn new(context: Arc<SourceContext>, keys: Vec<String>) -> Self {
        Self {
            context,
            keys,
            queue: None,
        }
    }

    /// 🚀 Start (or rejoin) the download pipeline and return an iterator over it.
    ///
    /// Must be called from inside a tokio runtime; the downloader is a spawned task.
    pub fn load(
        &mut self,
        parser: Arc<dyn Parser>,
        widest_schema: Arc<Schema>,
    ) -> Result<ObjectPartitionIterator> {
        let the_queue = match &self.queue {
            Some(queue) => queue.clone(),
            None => {
                let the_runtime = tokio::runtime::Handle::try_current()
                    .context("💀 PartitionLoader::load needs a tokio runtime to host its downloader")?;
                let the_prefetch_limit = self.context.config().prefetch_limit.max(1);
                let the_slots = Arc::new(Semaphore::new(the_prefetch_limit));
                // 📦 never fills up: every queued item holds one of the slots
                let (the_sender, the_receiver) = async_channel::bounded(the_prefetch_limit);
                debug!("🚚 starting downloader for {}", self);
                the_runtime.spawn(run_downloader(
                    self.context.clone(),
                    self.keys.clone(),
                    the_slots.clone(),
                    the_sender,
                ));
                let the_queue = PrefetchQueue {
                    receiver: the_receiver,
                    _hang_up: Arc::new(HangUp(the_slots)),
                };
                self.queue = Some(the_queue.clone());
                the_queue
            }
        };

        Ok(ObjectPartitionIterator::new(
            self.context.clone(),
            the_queue,
            parser,
            widest_schema,
        ))
    }

    /// 🧳 Pack the key list for the trip to another process.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let the_wire = LoaderWire {
            keys: self.keys.clone(),
        };
        Ok(bincode::serialize(&the_wire).map_err(SourceError::from)?)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 🔌 Has the downloader been started?
    pub fn is_loaded(&self) -> bool {
        self.queue.is_some()
    }

    /// 📦 Objects downloaded and waiting in the queue right now.
    pub fn queued_objects(&self) -> usize {
        self.queue.as_ref().map_or(0, PrefetchQueue::len)
    }
}

impl fmt::Display for PartitionLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let the_bucket = &self.context.config().bucket;
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) if self.keys.len() > 1 => write!(
                f,
                "s3://{}/{{{} .. {}}} ({} objects)",
                the_bucket,
                first,
                last,
                self.keys.len()
            ),
            (Some(only), _) => write!(f, "s3://{}/{} (1 object)", the_bucket, only),
            _ => write!(f, "s3://{} (0 objects)", the_bucket),
        }
    }
}

impl fmt::Debug for PartitionLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionLoader")
            .field("keys", &self.keys)
            .field("is_loaded", &self.is_loaded())
            .finish()
    }
}

/// 🧳 A loader that crossed the wire: keys only, not yet bound to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedLoader {
    keys: Vec<String>,
}

impl DetachedLoader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let the_wire: LoaderWire = bincode::deserialize(bytes).map_err(SourceError::from)?;
        Ok(Self {
            keys: the_wire.keys,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 🔌 Bind the keys to a live source context. Nothing starts until `load`.
    pub fn attach(self, context: Arc<SourceContext>) -> PartitionLoader {
        PartitionLoader::new(context, self.keys)
    }
}

/// 🚚 The background half: download every key in order and push it into the queue.
async fn run_downloader(
    context: Arc<SourceContext>,
    keys: Vec<String>,
    slots: Arc<Semaphore>,
    sender: Sender<Prefetched>,
) {
    let the_config = context.config();

    for the_key in keys {
        if let Some(filter) = &the_config.filter {
            if !filter.matches(&the_key) {
                trace!("🔎 skipping '{}': filtered out", the_key);
                continue;
            }
        }

        let Ok(the_slot) = slots.clone().acquire_owned().await else {
            debug!("🔌 every consumer hung up; downloader stops before '{}'", the_key);
            return;
        };

        let the_item = context
            .store()
            .download_object(&the_config.bucket, &the_key, the_config.request_payer.as_deref())
            .await
            .map(|data| DownloadedObject {
                key: the_key.clone(),
                data,
            })
            .map_err(|source| {
                anyhow::Error::from(SourceError::Download {
                    key: the_key.clone(),
                    source,
                })
            });
        let the_download_failed = the_item.is_err();

        trace!("📥 queueing '{}' (failed: {})", the_key, the_download_failed);
        let the_prefetched = Prefetched {
            item: the_item,
            _slot: the_slot,
        };
        if sender.send(the_prefetched).await.is_err() {
            debug!("🔌 every consumer hung up; downloader stops before '{}'", the_key);
            return;
        }
        if the_download_failed {
            warn!("💀 download of '{}' failed; abandoning the rest of its batch", the_key);
            return;
        }
    }

    debug!("🏁 downloader finished; closing the queue");
}
