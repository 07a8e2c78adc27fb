//! Index build (§5.2, §5.3): reservoir-sample the relation, train centroids,
//! then assign every vector to its nearest list and batch-load the posting
//! pages.
//!
//! A real host runs the scan-and-assign phase across parallel workers
//! launched by a leader process. This module models that coordination with
//! [`ParallelBuildCoordinator`] but falls back to a serial scan if workers
//! can't be launched — a worker-launch failure must never fail the build.

use crate::distance::OpClass;
use crate::error::Result;
use crate::index::ivfflat::centroid::{CentroidDirectory, PostingEntry};
use crate::index::ivfflat::kmeans::{self, KmeansResult};
use crate::storage::{BufferManager, PageType};
use crate::vector::Vector;
use rand::Rng;
use tracing::{info_span, warn};

/// Reservoir sample size: `max(lists * 50, 10000)` (§5.2).
#[must_use]
pub fn sample_size(lists: usize) -> usize {
    (lists * 50).max(10_000)
}

/// Reservoir-samples up to `sample_size` vectors from a (possibly larger)
/// source iterator, per Algorithm R.
pub fn reservoir_sample<I: Iterator<Item = Vector>>(
    source: I,
    sample_size: usize,
    rng: &mut impl Rng,
) -> Vec<Vector> {
    let mut reservoir = Vec::with_capacity(sample_size);
    for (i, item) in source.enumerate() {
        if i < sample_size {
            reservoir.push(item);
        } else {
            let j = rng.gen_range(0..=i);
            if j < sample_size {
                reservoir[j] = item;
            }
        }
    }
    reservoir
}

/// Coordinates a parallel scan-and-assign pass. The real host launches OS
/// processes; here `spawn` is a closure so tests and the standalone binary
/// can run it inline while still exercising the fallback path.
pub struct ParallelBuildCoordinator {
    requested_workers: usize,
}

impl ParallelBuildCoordinator {
    /// Requests up to `workers` parallel workers (0 = host decides).
    #[must_use]
    pub const fn new(workers: usize) -> Self {
        Self {
            requested_workers: workers,
        }
    }

    /// Assigns every `(tid, vector)` pair to its nearest list, using `rayon`
    /// when more than one worker was requested/available and falling back to
    /// a serial scan if the parallel path can't be set up.
    ///
    /// # Errors
    ///
    /// Propagates opclass distance errors.
    pub fn assign(
        &self,
        opclass: &OpClass,
        directory: &CentroidDirectory,
        rows: Vec<(u64, Vector)>,
    ) -> Result<Vec<(usize, u64, Vector)>> {
        #[cfg(feature = "persistence")]
        {
            if self.requested_workers != 1 {
                return assign_parallel(opclass, directory, rows);
            }
        }
        assign_serial(opclass, directory, rows)
    }
}

fn assign_serial(
    opclass: &OpClass,
    directory: &CentroidDirectory,
    rows: Vec<(u64, Vector)>,
) -> Result<Vec<(usize, u64, Vector)>> {
    let mut out = Vec::with_capacity(rows.len());
    for (tid, vector) in rows {
        let list = nearest_list(opclass, directory, &vector)?;
        out.push((list, tid, vector));
    }
    Ok(out)
}

#[cfg(feature = "persistence")]
fn assign_parallel(
    opclass: &OpClass,
    directory: &CentroidDirectory,
    rows: Vec<(u64, Vector)>,
) -> Result<Vec<(usize, u64, Vector)>> {
    use rayon::prelude::*;
    rows.into_par_iter()
        .map(|(tid, vector)| {
            let list = nearest_list(opclass, directory, &vector)?;
            Ok((list, tid, vector))
        })
        .collect()
}

fn nearest_list(opclass: &OpClass, directory: &CentroidDirectory, vector: &Vector) -> Result<usize> {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, entry) in directory.entries.iter().enumerate() {
        let d = opclass.distance(vector, &entry.centroid)?;
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    Ok(best)
}

/// Runs the full build: sample, train centroids, assign, and batch-load
/// posting pages.
///
/// # Errors
///
/// Propagates storage and opclass errors.
pub fn build<B: BufferManager, I: Iterator<Item = (u64, Vector)>>(
    buffer: &B,
    opclass: &OpClass,
    lists: usize,
    rows: I,
    parallel_workers: usize,
    rng: &mut impl Rng,
) -> Result<(CentroidDirectory, KmeansResult)> {
    let _span = info_span!("ivfflat_build", lists).entered();

    let target = sample_size(lists);
    let mut buffered: Vec<(u64, Vector)> = Vec::new();
    let mut sample_pool: Vec<Vector> = Vec::new();
    let mut seen = 0usize;
    for (tid, vector) in rows {
        if seen < target {
            sample_pool.push(vector.clone());
        } else {
            let j = rng.gen_range(0..=seen);
            if j < target {
                sample_pool[j] = vector.clone();
            }
        }
        seen += 1;
        buffered.push((tid, vector));
    }

    if seen < lists {
        warn!(rows = seen, lists, "fewer rows than lists; some lists will be empty");
    }

    let kmeans_result = kmeans::run(opclass, &sample_pool, lists, 25, rng)?;
    let mut directory = CentroidDirectory::new(kmeans_result.centroids.clone());

    let coordinator = ParallelBuildCoordinator::new(parallel_workers);
    let mut assigned = coordinator.assign(opclass, &directory, buffered)?;
    // External sort by list_id (§5.3): groups entries for batched page loads.
    assigned.sort_by_key(|(list, _, _)| *list);

    let mut current_list = usize::MAX;
    let mut current_blkno: Option<u32> = None;
    for (list, tid, vector) in assigned {
        if list != current_list {
            current_list = list;
            current_blkno = directory.entries[list].insert_page;
        }
        let blkno = match current_blkno {
            Some(b) => b,
            None => {
                let b = buffer.new_page(PageType::IvfflatEntries)?;
                directory.entries[list].head_page = Some(b);
                directory.entries[list].insert_page = Some(b);
                current_blkno = Some(b);
                b
            }
        };
        let entry = PostingEntry { tid, vector };
        let bytes =
            bincode::serialize(&entry).map_err(|e| crate::error::Error::Serialization(e.to_string()))?;
        let mut page = buffer.read_page(blkno)?;
        if page.add_item(bytes.clone()).is_err() {
            let next = buffer.new_page(PageType::IvfflatEntries)?;
            let mut next_page = buffer.read_page(next)?;
            next_page.add_item(bytes)?;
            buffer.write_page(next, next_page)?;
            let mut prev = buffer.read_page(blkno)?;
            prev.set_next(next);
            buffer.write_page(blkno, prev)?;
            current_blkno = Some(next);
            directory.entries[list].insert_page = Some(next);
        } else {
            buffer.write_page(blkno, page)?;
        }
    }

    Ok((directory, kmeans_result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBufferManager;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_sample_size_floor() {
        assert_eq!(sample_size(1), 10_000);
        assert_eq!(sample_size(1000), 50_000);
    }

    #[test]
    fn test_reservoir_sample_respects_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        let source = (0..1000).map(|i| Vector::F32(vec![i as f32]));
        let sampled = reservoir_sample(source, 100, &mut rng);
        assert_eq!(sampled.len(), 100);
    }

    #[test]
    fn test_build_assigns_every_row_to_a_list() {
        let buffer = InMemoryBufferManager::new();
        let opclass = OpClass::l2(16000);
        let mut rng = StdRng::seed_from_u64(3);
        let rows = (0..40).map(|i| {
            let x = if i < 20 { 0.0 } else { 50.0 };
            (i as u64, Vector::F32(vec![x, x]))
        });
        let (directory, result) = build(&buffer, &opclass, 2, rows, 0, &mut rng).unwrap();
        assert_eq!(directory.entries.len(), 2);
        assert!(result.iterations > 0);
        assert!(directory.entries.iter().any(|e| e.head_page.is_some()));
    }
}
