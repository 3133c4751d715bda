//! Core traits for producers and their cleanup.

mod dispose;
mod producer;

pub use dispose::{CleanupHandle, Dispose};
pub use producer::{Producer, SharedProducer};
