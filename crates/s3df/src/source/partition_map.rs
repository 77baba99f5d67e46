// ai
//! 🗺️ PartitionMap — walks the bucket listing one page at a time and turns each
//! page into exactly one `PartitionLoader`.
//!
//! 🎬 *[a continuation token is passed hand to hand, like a baton, like a secret,
//! like a cursed VHS tape you must give to someone else before the listing ends.]*
//!
//! 🧠 Knowledge graph:
//! - One page → one loader. Page size = `key_batch_size`, sent as `max_keys`.
//! - The NEXT page is fetched eagerly inside `next()`, so `has_next()` is honest.
//! - Empty pages that still carry a token are stepped over (sparse providers exist).
//! - Exhausted + `next()` → `SourceError::Exhausted`. An error, not a panic.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace};

use crate::backends::{ListPage, ListRequest};
use crate::error::SourceError;
use crate::source::{PartitionLoader, SourceContext};

/// 🗺️ Lazy, page-at-a-time discovery of a source's objects.
#[derive(Debug)]
pub struct PartitionMap {
    context: Arc<SourceContext>,
    // 📜 the page the next loader is built from; `None` once the listing is done
    pending_page: Option<ListPage>,
    loaders_issued: usize,
}

impl PartitionMap {
    /// 🔭 Fetch the first page. A listing failure here means no map at all.
    pub(crate) async fn start(context: Arc<SourceContext>) -> Result<Self> {
        let pending_page = fetch_non_empty_page(&context, None).await?;
        debug!(
            "🗺️ partition map for s3://{}/{} opened ({})",
            context.config().bucket,
            context.config().prefix,
            if pending_page.is_some() { "objects found" } else { "nothing to read" }
        );
        Ok(Self {
            context,
            pending_page,
            loaders_issued: 0,
        })
    }

    /// 🔮 `true` while another loader can be produced.
    pub fn has_next(&self) -> bool {
        self.pending_page.is_some()
    }

    /// 📦 Materialize the current page into a loader, then fetch the page after it.
    pub async fn next(&mut self) -> Result<PartitionLoader> {
        let the_page = self.pending_page.take().ok_or(SourceError::Exhausted)?;

        let the_loader = PartitionLoader::new(self.context.clone(), the_page.keys);
        self.loaders_issued += 1;
        trace!("📦 loader #{} → {}", self.loaders_issued, the_loader);

        if let Some(the_token) = the_page.next_continuation_token {
            self.pending_page = fetch_non_empty_page(&self.context, Some(the_token)).await?;
        }
        if self.pending_page.is_none() {
            debug!(
                "🏁 partition map exhausted after {} loaders",
                self.loaders_issued
            );
        }

        Ok(the_loader)
    }

    /// 🔢 Loaders handed out so far.
    pub fn loaders_issued(&self) -> usize {
        self.loaders_issued
    }
}

/// 📜 List from `token` onward, stepping over empty pages that still carry a token.
/// `None` means the listing is finished.
async fn fetch_non_empty_page(
    context: &SourceContext,
    mut token: Option<String>,
) -> Result<Option<ListPage>> {
    let the_config = context.config();
    loop {
        let the_request = ListRequest {
            bucket: the_config.bucket.clone(),
            prefix: the_config.prefix.clone(),
            continuation_token: token.take(),
            max_keys: i32::try_from(the_config.key_batch_size).unwrap_or(i32::MAX),
            request_payer: the_config.request_payer.clone(),
        };

        let the_page = context
            .store()
            .list_objects(&the_request)
            .await
            .map_err(|source| SourceError::Listing {
                bucket: the_config.bucket.clone(),
                prefix: the_config.prefix.clone(),
                source,
            })?;

        if !the_page.keys.is_empty() {
            return Ok(Some(the_page));
        }
        match the_page.next_continuation_token {
            Some(next) => {
                trace!("📭 empty page with a token; following it");
                token = Some(next);
            }
            None => return Ok(None),
        }
    }
}
