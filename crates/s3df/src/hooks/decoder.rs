// ai
//! 🫁 Decoders — for when the bucket holds squished bytes.

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;

/// 🫁 A byte → byte transform applied to each downloaded object before parsing.
///
/// Takes ownership because some decoders (hi, identity) can hand the buffer right back.
pub trait Decoder: Send + Sync + std::fmt::Debug {
    fn decode(&self, data: Vec<u8>) -> Result<Vec<u8>>;
}

/// 🫁 Gzip, including concatenated multi-member files (`cat a.gz b.gz > c.gz` is legal, sadly).
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipDecoder;

impl Decoder for GzipDecoder {
    fn decode(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        // 📏 compressed text tends to inflate 4-10x, start somewhere plausible
        let mut the_inflated = Vec::with_capacity(data.len().saturating_mul(4));
        MultiGzDecoder::new(data.as_slice())
            .read_to_end(&mut the_inflated)
            .context("💀 gzip stream is corrupt or not gzip at all")?;
        Ok(the_inflated)
    }
}

/// 🎛️ Config-side decoder selector.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    #[default]
    None,
    Gzip,
}

impl DecoderKind {
    /// 🔧 Resolve to a shareable decoder, or `None` for raw passthrough.
    pub fn build(self) -> Option<Arc<dyn Decoder>> {
        match self {
            DecoderKind::None => None,
            DecoderKind::Gzip => Some(Arc::new(GzipDecoder)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut the_encoder = GzEncoder::new(Vec::new(), Compression::default());
        the_encoder.write_all(data).expect("💀 writing into a Vec failed");
        the_encoder.finish().expect("💀 finishing gzip into a Vec failed")
    }

    #[test]
    fn the_one_where_gzip_bytes_inflate_back_to_ndjson() {
        let the_original = b"{\"a\":1}\n{\"a\":2}\n".to_vec();
        let the_decoded = GzipDecoder
            .decode(gzip(&the_original))
            .expect("💀 valid gzip should decode");
        assert_eq!(the_decoded, the_original);
    }

    #[test]
    fn the_one_where_concatenated_members_are_all_read() {
        let mut the_blob = gzip(b"first\n");
        the_blob.extend(gzip(b"second\n"));
        let the_decoded = GzipDecoder.decode(the_blob).expect("💀 multi-member gzip");
        assert_eq!(the_decoded, b"first\nsecond\n".to_vec());
    }

    #[test]
    fn the_one_where_plain_text_is_not_gzip() {
        assert!(GzipDecoder.decode(b"definitely not gzip".to_vec()).is_err());
    }

    #[test]
    fn the_one_where_decoder_kind_resolves() {
        assert!(DecoderKind::None.build().is_none());
        assert!(DecoderKind::Gzip.build().is_some());
        let the_kind: DecoderKind =
            serde_json::from_str("\"gzip\"").expect("💀 gzip should deserialize");
        assert_eq!(the_kind, DecoderKind::Gzip);
    }
}
