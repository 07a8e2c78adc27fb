//! # `annidx-core`
//!
//! Embeddable approximate nearest-neighbor index engines: HNSW and IVFFlat,
//! built on a page-addressed storage layer with write-ahead logging.
//!
//! `annidx-core` does not open files or own a relation itself; it models the
//! side of the boundary a host's index access method calls into ([`amapi`])
//! and leaves page I/O to a [`storage::BufferManager`] implementation the
//! host supplies. [`storage::InMemoryBufferManager`] is a reference
//! implementation used by this crate's own tests and benchmarks.
//!
//! ## Modules
//!
//! - [`vector`]: the `F32`/`F16`/`Bit` vector representation
//! - [`distance`]: opclasses (L2, inner product, cosine, Hamming) and the
//!   `kmeans_norm` spherical-normalization hook
//! - [`storage`]: fixed-size pages, the buffer manager and WAL traits, and
//!   meta-page layouts
//! - [`index::hnsw`]: the HNSW graph index (§4)
//! - [`index::ivfflat`]: the IVFFlat inverted-list index (§5)
//! - [`amapi`]: the host access-method dispatch contract (§6)
//! - [`config`]: layered configuration
//! - [`error`]: the shared coded error enum
//! - [`sync`]: loom-aware synchronization primitive aliases

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod amapi;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod distance;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod index;
pub mod storage;
pub mod sync;
pub mod vector;

pub use amapi::{
    CostEstimate, HnswIndexAccessMethod, HnswScan, IndexAccessMethod, IvfflatIndexAccessMethod, IvfflatScan,
    ScanResult,
};
pub use config::AnnidxConfig;
pub use distance::{DistanceKind, OpClass};
pub use error::{Error, Result};
pub use index::hnsw::{HnswBuildParams, SearchParams};
pub use vector::Vector;
