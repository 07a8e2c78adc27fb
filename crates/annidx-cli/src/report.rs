//! Terminal reporting helpers: build summaries and per-query result tables.

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use std::time::Duration;

/// One-line build summary, e.g. "HNSW: built 2000 rows (dim 64) in 310ms".
pub fn build_summary(engine: &str, rows: usize, dim: usize, elapsed: Duration) -> String {
    format!(
        "{}: built {} rows (dim {}) in {:.2?}",
        engine.bold().cyan(),
        rows,
        dim,
        elapsed
    )
}

/// Renders one query's top results as a table, with a header line giving
/// the query index and elapsed time.
pub fn query_table(query_index: usize, elapsed: Duration, results: &[(u64, f64)]) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["rank", "tid", "distance"]);

    for (rank, (tid, dist)) in results.iter().enumerate() {
        table.add_row(vec![(rank + 1).to_string(), tid.to_string(), format!("{dist:.4}")]);
    }

    format!(
        "\n{} {:.2?}\n{table}",
        format!("query #{query_index} in").green(),
        elapsed
    )
}
