//! Planner cost estimation (§4.10).
//!
//! An approximation, not a contract: the host's planner only needs a
//! relative ordering between plans, not an exact visited-node count.

use crate::index::hnsw::params::HnswBuildParams;

/// Estimates the number of elements visited during a `KnnSearch` against an
/// index of `n` elements, for planner costing purposes.
///
/// `visited ≈ (entry_level + 2) × M`, with `entry_level ≈ -ln(1/N) × mL`.
#[must_use]
pub fn estimate_visited(n: usize, params: &HnswBuildParams) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let entry_level = -((1.0 / n as f64).ln()) * params.level_multiplier();
    (entry_level + 2.0) * params.m as f64
}

/// Estimates total page-access cost for a search, combining the visited-node
/// estimate with a fixed per-page random-access cost.
#[must_use]
pub fn estimate_page_cost(n: usize, params: &HnswBuildParams, random_page_cost: f64) -> f64 {
    estimate_visited(n, params) * random_page_cost
}
