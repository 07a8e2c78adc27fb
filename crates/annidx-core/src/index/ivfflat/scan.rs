//! Probe-based scan (§5.4): find the `probes` closest centroids, then scan
//! every entry in those lists' posting chains with a bounded max-heap of
//! size `k`.

use crate::distance::OpClass;
use crate::error::Result;
use crate::index::ivfflat::centroid::{CentroidDirectory, PostingEntry};
use crate::storage::{BufferManager, INVALID_BLOCK};
use crate::vector::Vector;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct Scored(f64, u64);

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits() && self.1 == other.1
    }
}
impl Eq for Scored {}
impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scored {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.total_cmp(&other.0)
    }
}

/// Scans `probes` nearest lists for the `k` closest rows to `query`.
///
/// # Errors
///
/// Propagates storage and opclass errors.
pub fn scan<B: BufferManager>(
    buffer: &B,
    opclass: &OpClass,
    directory: &CentroidDirectory,
    query: &Vector,
    k: usize,
    probes: usize,
) -> Result<Vec<(u64, f64)>> {
    let total_lists = directory.entries.len();
    if probes > total_lists {
        return Err(crate::error::Error::OptionOutOfRange {
            option: "probes",
            value: i64::try_from(probes).unwrap_or(i64::MAX),
            min: 1,
            max: i64::try_from(total_lists).unwrap_or(i64::MAX),
        });
    }

    let lists = directory.nearest_lists(opclass, query, probes)?;
    let mut heap: BinaryHeap<Scored> = BinaryHeap::new();

    for list in lists {
        let mut blkno = directory.entries[list].head_page;
        while let Some(b) = blkno {
            let page = buffer.read_page(b)?;
            for (_, bytes) in page.iter_items() {
                let entry: PostingEntry = bincode::deserialize(bytes)
                    .map_err(|e| crate::error::Error::Serialization(e.to_string()))?;
                let dist = opclass.distance(query, &entry.vector)?;
                if heap.len() < k {
                    heap.push(Scored(dist, entry.tid));
                } else if let Some(worst) = heap.peek() {
                    if dist < worst.0 {
                        heap.pop();
                        heap.push(Scored(dist, entry.tid));
                    }
                }
            }
            let next = page.opaque().next_blkno;
            blkno = if next == INVALID_BLOCK { None } else { Some(next) };
        }
    }

    let mut out: Vec<(u64, f64)> = heap.into_iter().map(|s| (s.1, s.0)).collect();
    out.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(out)
}
