//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all
//! the credit in the sprint retro.
//!
//! 🚀 Right now there is exactly one kind: the `LoaderWorker`, which plays the part
//! of a remote executor. It only ever sees a loader as bytes, the way a worker on
//! another machine would. 🦆

use anyhow::Result;
use tokio::task::JoinHandle;

mod loader_worker;
pub(crate) use loader_worker::LoaderWorker;

/// 🏗️ A background worker, that does work. duh.
pub trait Worker {
    /// 🚀 Start the worker. Returns a JoinHandle because we trust
    /// but verify. Mostly verify.
    fn start(self) -> JoinHandle<Result<()>>;
}
