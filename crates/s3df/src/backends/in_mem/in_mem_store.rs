use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backends::{ListPage, ListRequest, ObjectStore, PROVIDER_PAGE_LIMIT};

// -- 📂 InMemoryStoreConfig: "it's a bucket", said the folder, with a straight face.
#[derive(Debug, Deserialize, Clone)]
pub struct InMemoryStoreConfig {
    /// 📂 Every regular file under this directory becomes an object.
    pub fixture_dir: PathBuf,
    /// 🏷️ Prepended to each relative path, joined with `/`.
    #[serde(default)]
    pub key_prefix: Option<String>,
}

type Bucket = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default)]
struct Shelves {
    buckets: BTreeMap<String, Bucket>,
    failing_keys: HashSet<String>,
    // 📜 1-based listing call number that should blow up, if any
    failing_list_call: Option<usize>,
    download_log: Vec<String>,
}

/// 🪣 A bucket that lives in RAM.
///
/// Clone-able, and every clone shares the same shelves (an `Arc` inside), so a
/// test can keep a handle after giving one to a `DataSource` and later ask
/// "so, what did you download, and in what order?"
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shelves: Arc<Mutex<Shelves>>,
    list_calls: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🔧 Seed a store from a fixture directory, filing every object under `bucket`.
    /// An empty directory still makes a bucket, one that lists as nothing.
    pub async fn from_config(config: &InMemoryStoreConfig, bucket: &str) -> Result<Self> {
        let the_store = Self::new().with_bucket(bucket);
        let mut the_pending_dirs = vec![config.fixture_dir.clone()];

        while let Some(the_dir) = the_pending_dirs.pop() {
            let mut the_entries = tokio::fs::read_dir(&the_dir).await.context(format!(
                "💀 Could not read fixture directory '{}'. It was supposed to be a bucket. \
                 It is not even a directory, apparently.",
                the_dir.display()
            ))?;

            while let Some(the_entry) = the_entries.next_entry().await? {
                let the_path = the_entry.path();
                if the_entry.file_type().await?.is_dir() {
                    the_pending_dirs.push(the_path);
                    continue;
                }

                let the_relative = the_path
                    .strip_prefix(&config.fixture_dir)
                    .context("💀 fixture path escaped its own directory")?;
                let the_relative_key = the_relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let the_key = match &config.key_prefix {
                    Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), the_relative_key),
                    None => the_relative_key,
                };

                let the_bytes = tokio::fs::read(&the_path)
                    .await
                    .context(format!("💀 Failed to read fixture '{}'", the_path.display()))?;
                trace!("📂 fixture {} → s3://{}/{}", the_path.display(), bucket, the_key);
                the_store.put_object(bucket, the_key, the_bytes);
            }
        }

        debug!(
            "📂 in-memory bucket '{}' seeded with {} objects from {}",
            bucket,
            the_store.object_count(bucket),
            config.fixture_dir.display()
        );
        Ok(the_store)
    }

    // 🔒 a poisoned lock only means a test panicked mid-push; the data is still fine
    fn shelves(&self) -> MutexGuard<'_, Shelves> {
        self.shelves.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 🪣 Create an empty bucket. A no-op if it already exists.
    pub fn create_bucket(&self, bucket: &str) {
        self.shelves().buckets.entry(bucket.to_string()).or_default();
    }

    /// 🪣 Builder-flavored `create_bucket`.
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.create_bucket(bucket);
        self
    }

    /// 📥 Put (or overwrite) an object.
    pub fn put_object(&self, bucket: &str, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.shelves()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.into(), data.into());
    }

    /// 📥 Builder-flavored `put_object`.
    pub fn with_object(self, bucket: &str, key: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.put_object(bucket, key, data);
        self
    }

    /// 💣 Every download of `key` will fail from now on.
    pub fn fail_downloads_of(&self, key: impl Into<String>) {
        self.shelves().failing_keys.insert(key.into());
    }

    /// 💣 The `call_number`-th listing call (1-based) will fail.
    pub fn fail_list_call(&self, call_number: usize) {
        self.shelves().failing_list_call = Some(call_number);
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.shelves().buckets.get(bucket).map_or(0, BTreeMap::len)
    }

    /// 📜 Keys successfully downloaded so far, in download order.
    pub fn download_log(&self) -> Vec<String> {
        self.shelves().download_log.clone()
    }

    pub fn download_count(&self) -> usize {
        self.shelves().download_log.len()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    /// 📜 S3-flavored listing: lexicographic, prefix-filtered, token = last key handed out.
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage> {
        let the_call_number = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let shelves = self.shelves();

        if shelves.failing_list_call == Some(the_call_number) {
            bail!(
                "💀 injected listing failure on call #{} for s3://{}/{}",
                the_call_number,
                request.bucket,
                request.prefix
            );
        }

        let Some(the_bucket) = shelves.buckets.get(&request.bucket) else {
            bail!("💀 NoSuchBucket: '{}' was never filled", request.bucket);
        };

        let the_page_size = match request.max_keys {
            n if n <= 0 => PROVIDER_PAGE_LIMIT,
            n => (n as usize).min(PROVIDER_PAGE_LIMIT),
        };

        let mut the_matching = the_bucket
            .keys()
            .filter(|k| k.starts_with(&request.prefix))
            .filter(|k| match &request.continuation_token {
                Some(token) => k.as_str() > token.as_str(),
                None => true,
            });

        let keys: Vec<String> = the_matching.by_ref().take(the_page_size).cloned().collect();
        // 🔖 only hand out a bookmark if something is actually left to read
        let next_continuation_token = match the_matching.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };

        trace!(
            "📜 listed {} keys from s3://{}/{} (more: {})",
            keys.len(),
            request.bucket,
            request.prefix,
            next_continuation_token.is_some()
        );
        Ok(ListPage {
            keys,
            next_continuation_token,
        })
    }

    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        _request_payer: Option<&str>,
    ) -> Result<Vec<u8>> {
        let mut shelves = self.shelves();
        if shelves.failing_keys.contains(key) {
            bail!("💀 injected download failure for s3://{}/{}", bucket, key);
        }
        let the_data = shelves
            .buckets
            .get(bucket)
            .and_then(|b| b.get(key))
            .cloned()
            .context(format!("💀 NoSuchKey: s3://{}/{}", bucket, key))?;
        shelves.download_log.push(key.to_string());
        Ok(the_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn the_request(prefix: &str, max_keys: i32, token: Option<String>) -> ListRequest {
        ListRequest {
            bucket: "b".to_string(),
            prefix: prefix.to_string(),
            continuation_token: token,
            max_keys,
            request_payer: None,
        }
    }

    fn five_files() -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 1..=5 {
            store.put_object("b", format!("files/{i}.jsonl"), format!("{{\"i\":{i}}}\n"));
        }
        store.put_object("b", "other/x.jsonl", "{}\n");
        store
    }

    #[tokio::test]
    async fn the_one_where_pages_follow_the_token_trail() -> Result<()> {
        let store = five_files();

        let first = store.list_objects(&the_request("files", 2, None)).await?;
        assert_eq!(first.keys, vec!["files/1.jsonl", "files/2.jsonl"]);
        let second = store
            .list_objects(&the_request("files", 2, first.next_continuation_token))
            .await?;
        assert_eq!(second.keys, vec!["files/3.jsonl", "files/4.jsonl"]);
        let third = store
            .list_objects(&the_request("files", 2, second.next_continuation_token))
            .await?;
        assert_eq!(third.keys, vec!["files/5.jsonl"]);
        assert!(third.next_continuation_token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_exact_fit_leaves_no_token_behind() -> Result<()> {
        let store = InMemoryStore::new()
            .with_object("b", "a", "1")
            .with_object("b", "b", "2");
        let page = store.list_objects(&the_request("", 2, None)).await?;
        assert_eq!(page.keys.len(), 2);
        assert!(page.next_continuation_token.is_none());
        assert_eq!(store.list_call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_bucket_lists_as_nothing_but_a_missing_one_fails() -> Result<()> {
        let store = InMemoryStore::new().with_bucket("b");
        let page = store.list_objects(&the_request("files", 2, None)).await?;
        assert!(page.keys.is_empty());
        assert!(page.next_continuation_token.is_none());

        let the_error = store
            .list_objects(&ListRequest {
                bucket: "nope".to_string(),
                ..the_request("files", 2, None)
            })
            .await
            .err()
            .expect("💀 a bucket nobody created should not list");
        assert!(the_error.to_string().contains("NoSuchBucket"));
        assert_eq!(store.list_call_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_folder_is_still_a_bucket() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        let store = InMemoryStore::from_config(
            &InMemoryStoreConfig {
                fixture_dir: the_dir.path().to_path_buf(),
                key_prefix: None,
            },
            "testbucket",
        )
        .await?;

        assert_eq!(store.object_count("testbucket"), 0);
        let page = store
            .list_objects(&ListRequest {
                bucket: "testbucket".to_string(),
                ..the_request("", 10, None)
            })
            .await?;
        assert!(page.keys.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_injected_failures_actually_fail() {
        let store = five_files();
        store.fail_list_call(1);
        store.fail_downloads_of("files/2.jsonl");

        assert!(store.list_objects(&the_request("files", 2, None)).await.is_err());
        assert!(store.download_object("b", "files/2.jsonl", None).await.is_err());
        assert!(store.download_object("b", "files/1.jsonl", None).await.is_ok());
        assert_eq!(store.download_log(), vec!["files/1.jsonl"]);
    }

    #[tokio::test]
    async fn the_one_where_a_folder_cosplays_as_a_bucket() -> Result<()> {
        let the_dir = tempfile::tempdir()?;
        std::fs::create_dir(the_dir.path().join("nested"))?;
        std::fs::write(the_dir.path().join("a.jsonl"), "{}\n")?;
        std::fs::write(the_dir.path().join("nested").join("b.jsonl"), "{}\n{}\n")?;

        let store = InMemoryStore::from_config(
            &InMemoryStoreConfig {
                fixture_dir: the_dir.path().to_path_buf(),
                key_prefix: Some("files/".to_string()),
            },
            "testbucket",
        )
        .await?;

        let page = store
            .list_objects(&ListRequest {
                bucket: "testbucket".to_string(),
                prefix: "files".to_string(),
                continuation_token: None,
                max_keys: 10,
                request_payer: None,
            })
            .await?;
        assert_eq!(page.keys, vec!["files/a.jsonl", "files/nested/b.jsonl"]);
        Ok(())
    }
}
