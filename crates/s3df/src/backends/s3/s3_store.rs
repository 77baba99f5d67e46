// ai
//! 🪣📡 S3 Store — `ListObjectsV2` and `GetObject`, wrapped in just enough context
//! strings that the 3am version of you knows which one broke.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::types::RequestPayer;
use serde::Deserialize;
use tracing::trace;

use crate::backends::{ListPage, ListRequest, ObjectStore};

/// 🔧 Configuration for the S3 store backend.
///
/// 📐 `region` defaults to us-east-1. `endpoint_url` + `force_path_style` exist for
/// LocalStack / MinIO, where virtual-hosted bucket names go to die.
/// Credentials come from the environment chain. We don't do credentials.
#[derive(Debug, Deserialize, Clone)]
pub struct S3StoreConfig {
    #[serde(default = "default_s3_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for S3StoreConfig {
    fn default() -> Self {
        Self {
            region: default_s3_region(),
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

/// 🌎 us-east-1. The Florida of AWS regions. Everyone ends up there eventually.
fn default_s3_region() -> String {
    "us-east-1".to_string()
}

/// 🪣 A thin, clone-cheap wrapper over the SDK client.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// 🔌 Wrap an already-configured client. Handy when the caller owns the SDK setup.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// 🚀 Build a client from the environment (env vars → ~/.aws/config → IAM role → hope),
    /// then bend it toward a custom endpoint if one was configured.
    pub async fn from_config(config: &S3StoreConfig) -> Self {
        let the_aws_config = aws_config::from_env()
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut the_builder = aws_sdk_s3::config::Builder::from(&the_aws_config)
            .force_path_style(config.force_path_style);
        if let Some(ref endpoint_url) = config.endpoint_url {
            the_builder = the_builder.endpoint_url(endpoint_url);
        }

        Self::new(aws_sdk_s3::Client::from_conf(the_builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage> {
        let mut the_request = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix)
            .max_keys(request.max_keys);
        if let Some(ref token) = request.continuation_token {
            the_request = the_request.continuation_token(token);
        }
        if let Some(ref payer) = request.request_payer {
            the_request = the_request.request_payer(RequestPayer::from(payer.as_str()));
        }

        let the_response = the_request.send().await.context(format!(
            "💀 ListObjectsV2 failed for s3://{}/{}. The bucket ghosted us. \
             Check: bucket name, region, endpoint, and credentials.",
            request.bucket, request.prefix
        ))?;

        let keys: Vec<String> = the_response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        // 🔖 a token on a non-truncated response is a lie we refuse to believe
        let next_continuation_token = if the_response.is_truncated().unwrap_or(false) {
            the_response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        trace!(
            "📜 ListObjectsV2 s3://{}/{} → {} keys (more: {})",
            request.bucket,
            request.prefix,
            keys.len(),
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
        request_payer: Option<&str>,
    ) -> Result<Vec<u8>> {
        let the_response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_request_payer(request_payer.map(RequestPayer::from))
            .send()
            .await
            .context(format!(
                "💀 GetObject failed for s3://{}/{}. The listing said it was there. \
                 Check: IAM permissions, bucket policy, KMS key access.",
                bucket, key
            ))?;

        let the_bytes = the_response
            .body
            .collect()
            .await
            .context(format!(
                "💀 The byte stream for s3://{}/{} broke off mid-sentence",
                bucket, key
            ))?
            .into_bytes();

        Ok(the_bytes.to_vec())
    }
}
