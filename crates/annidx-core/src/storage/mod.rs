//! Page-backed storage primitives shared by the HNSW and IVFFlat engines.
//!
//! - [`page`]: fixed 8192-byte pages with a slotted item array and opaque trailer
//! - [`buffer`]: the [`buffer::BufferManager`] abstraction a host's page cache sits behind
//! - [`wal`]: generic-WAL bracketing for crash-safe multi-page mutations
//! - [`meta`]: the HNSW and IVFFlat meta-page layouts

pub mod buffer;
pub mod meta;
#[cfg(feature = "persistence")]
pub mod mmap;
pub mod page;
pub mod wal;

#[cfg(test)]
mod tests;

pub use buffer::{BufferManager, InMemoryBufferManager};
pub use meta::{EntryPoint, HnswMeta, IvfMeta};
#[cfg(feature = "persistence")]
pub use mmap::MmapBufferManager;
pub use page::{BlockNumber, ItemPointer, OffsetNumber, Page, PageOpaque, PageType, INVALID_BLOCK, PAGE_SIZE};
pub use wal::{GenericWal, InMemoryWal, WalBracket};
