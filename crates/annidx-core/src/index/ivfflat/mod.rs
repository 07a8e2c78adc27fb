//! IVFFlat (inverted file with flat posting lists) index (§5).
//!
//! - [`kmeans`]: k-means++ seeding and Lloyd refinement
//! - [`build`]: reservoir sampling, training, and batched posting load
//! - [`centroid`]: the centroid directory and posting-entry layout
//! - [`insert`]: single-row insert into a built index
//! - [`scan`]: probe-based nearest-neighbor scan
//! - [`cost`]: planner cost estimation

pub mod build;
pub mod centroid;
pub mod cost;
pub mod insert;
pub mod kmeans;
pub mod scan;

pub use build::{build as build_index, ParallelBuildCoordinator};
pub use centroid::{CentroidDirectory, CentroidEntry, PostingEntry};
pub use insert::insert as insert_row;
pub use scan::scan as scan_index;
