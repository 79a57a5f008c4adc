#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! Caches upstream responses for Postagg.

mod memory;

pub use crate::memory::Source as MemoryCacheSource;
