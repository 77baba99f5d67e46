// ai
//! 🪝 Hooks — the two tiny capabilities a data source can be handed.
//!
//! - [`Decoder`]: bytes in, different bytes out. Runs per object, right before parsing.
//! - [`KeyFilter`]: yes/no on an object key. Runs at download time, NOT at listing time,
//!   so a filtered key still occupies its slot in a loader's batch. It just never gets fetched.
//!
//! 🧠 Knowledge graph: trait → concrete impl (`GzipDecoder`, `RegexKeyFilter`) →
//! config-side selector (`DecoderKind`). Same shape as the backends, smaller stakes. 🦆

mod decoder;
mod filter;

pub use decoder::{Decoder, DecoderKind, GzipDecoder};
pub use filter::{KeyFilter, RegexKeyFilter};
