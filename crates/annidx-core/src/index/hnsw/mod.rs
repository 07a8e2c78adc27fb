//! HNSW (Hierarchical Navigable Small World) index (§4).
//!
//! - [`params`]: build and session parameters
//! - [`element`]: the persistent graph node
//! - [`graph`]: `SearchLayer`/`KnnSearch`
//! - [`neighbors`]: the neighbor-selection heuristic
//! - [`insert`]: insert and the concurrent insert protocol
//! - [`vacuum`]: the bulk-delete sweep
//! - [`cost`]: planner cost estimation

pub mod cost;
pub mod element;
pub mod graph;
pub mod insert;
pub mod neighbors;
pub mod params;
pub mod vacuum;

#[cfg(test)]
mod params_tests;

pub use element::Element;
pub use graph::HnswGraph;
pub use insert::{insert as insert_element, LockStripes};
pub use params::{HnswBuildParams, SearchParams};
pub use vacuum::{bulkdelete, DeletionCallback};
