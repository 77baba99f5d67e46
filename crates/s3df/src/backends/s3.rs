// ai
//! 🪣🚀🌐 S3 Backend — the cloud-to-ground data paratrooper.
//!
//! INT. AWS CONSOLE — NIGHT. A lone S3 bucket sits in us-east-1, bloated with
//! newline-delimited JSON. Someone typed `PUT` a few thousand times and walked away.
//! The data has been waiting. Patient. Ready to be listed a page at a time.
//!
//! 🧠 Knowledge graph:
//! - Config co-located: `S3StoreConfig` lives in `s3_store.rs`
//! - Trait impl: `impl ObjectStore for S3Store`
//! - Enum variant: `StoreBackend::S3(S3Store)`
//! - Transport: `ListObjectsV2` for discovery, `GetObject` → `ByteStream::collect()` for bytes
//!
//! 🦆 The duck has no clearance for AWS. It watches from the edge of the VPC.

mod s3_store;

pub use s3_store::{S3Store, S3StoreConfig};
