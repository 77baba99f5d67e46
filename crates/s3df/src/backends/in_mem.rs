//! # Previously, on s3df...
//!
//! 🎬 The bucket was in us-east-1. The test runner was in a CI container with no
//! credentials and a strict no-network policy. Someone had to fake a bucket so
//! convincingly that the partition map couldn't tell the difference.
//!
//! That someone was this module.
//!
//! `in_mem` provides an [`InMemoryStore`]: S3-style lexicographic listing with
//! continuation tokens, whole-object downloads, and a couple of trapdoors for
//! tests (injected failures, a download log). It can also be seeded from a local
//! fixture directory, so the CLI can scan a folder as if it were a bucket.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. This is for tests and demos.

mod in_mem_store;

pub use in_mem_store::{InMemoryStore, InMemoryStoreConfig};
