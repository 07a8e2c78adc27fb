//! Planner cost estimation (§4.10), following `ivfflatcostestimate_internal`.

/// Estimates the number of rows visited scanning `probes` of `lists` lists
/// over `n` total rows: `visited ≈ n × (probes / lists)`.
#[must_use]
pub fn estimate_visited(n: usize, lists: usize, probes: usize) -> f64 {
    if lists == 0 {
        return 0.0;
    }
    n as f64 * (probes as f64 / lists as f64)
}

/// Estimates page-access cost, applying the same random/sequential
/// adjustment the reference planner uses: if the index has more pages than
/// the heap and the scan would touch less than half the index, charge a
/// sequential rate (small scans stay within a few posting lists, which the
/// planner treats as sequential prefetch); otherwise take a small discount
/// off the random rate to reflect posting-list locality.
#[must_use]
pub fn estimate_page_cost(
    index_pages: f64,
    heap_pages: f64,
    fraction_scanned: f64,
    random_page_cost: f64,
    seq_page_cost: f64,
) -> f64 {
    let pages_touched = index_pages * fraction_scanned;
    if index_pages > heap_pages && fraction_scanned < 0.5 {
        pages_touched * seq_page_cost
    } else {
        pages_touched * (random_page_cost - seq_page_cost * 0.5)
    }
}
