//! Synthetic clustered dataset generation and JSONL loading for the demo commands.

use anyhow::{Context, Result};
use annidx_core::vector::Vector;
use rand::Rng;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of a JSONL vector dataset: `{"tid": 0, "vector": [0.1, 0.2]}`.
#[derive(Deserialize)]
struct JsonlRow {
    tid: u64,
    vector: Vec<f32>,
}

/// Loads rows from a newline-delimited JSON file, one `JsonlRow` per line.
///
/// # Errors
///
/// Returns an error if the file can't be opened, a line isn't valid JSON, or
/// row vectors have inconsistent dimensionality.
pub fn from_jsonl(path: &Path) -> Result<Vec<(u64, Vector)>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    let mut dim = None;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {} line {}", path.display(), lineno + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let row: JsonlRow = serde_json::from_str(&line)
            .with_context(|| format!("parsing {} line {}", path.display(), lineno + 1))?;
        let dim = *dim.get_or_insert(row.vector.len());
        anyhow::ensure!(
            row.vector.len() == dim,
            "row {} has {} dims, expected {}",
            row.tid,
            row.vector.len(),
            dim
        );
        rows.push((row.tid, Vector::F32(row.vector)));
    }
    Ok(rows)
}

/// Generates `rows` vectors of `dimension` dims drawn from `clusters`
/// well-separated blobs (uniform jitter around a random center), tagged
/// with sequential row ids.
pub fn clustered(dimension: usize, rows: usize, clusters: usize, rng: &mut impl Rng) -> Vec<(u64, Vector)> {
    let clusters = clusters.max(1);
    let centers: Vec<Vec<f32>> = (0..clusters)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-50.0f32..50.0)).collect())
        .collect();

    (0..rows)
        .map(|tid| {
            let center = &centers[tid % clusters];
            let vector: Vec<f32> = center.iter().map(|c| c + rng.gen_range(-1.0f32..1.0)).collect();
            (tid as u64, Vector::F32(vector))
        })
        .collect()
}
