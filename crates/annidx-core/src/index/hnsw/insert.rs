//! Insert (§4.4) and the concurrent insert protocol (§4.5).
//!
//! A host serializes `build` but not `insert`: many backends can be
//! inserting into the same index concurrently. The protocol here follows
//! the same lock-ordering discipline the in-memory prototype settled on
//! after a deadlock was found between concurrent inserts and searches:
//! fetch every vector needed for a distance computation *before* taking any
//! page lock, take locks in ascending `(blkno, offno)` order, and promote
//! the entry point only as the last step.

use crate::distance::OpClass;
use crate::error::Result;
use crate::index::hnsw::element::Element;
use crate::index::hnsw::graph::HnswGraph;
use crate::index::hnsw::neighbors::{select_neighbors, Candidate};
use crate::index::hnsw::params::HnswBuildParams;
use crate::storage::{BufferManager, EntryPoint, GenericWal, HnswMeta, ItemPointer, PageType, WalBracket};
use crate::vector::Vector;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info_span};

/// Lock striping over block numbers, approximating per-element exclusive
/// locks without requiring the buffer manager to expose one lock per page.
/// Locks are always acquired in ascending stripe-index order, so two
/// inserts that touch an overlapping set of elements can never deadlock.
pub struct LockStripes {
    stripes: Vec<Mutex<()>>,
}

impl LockStripes {
    /// Creates `count` lock stripes.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe_for(&self, blkno: u32) -> usize {
        (blkno as usize) % self.stripes.len()
    }

    /// Locks every stripe touched by `pointers`, in ascending stripe order.
    /// Held for the scope of the returned guard set.
    #[must_use]
    pub fn lock_ordered(&self, pointers: &[ItemPointer]) -> Vec<parking_lot::MutexGuard<'_, ()>> {
        let mut indices: Vec<usize> = pointers.iter().map(|p| self.stripe_for(p.blkno)).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(|i| self.stripes[i].lock()).collect()
    }
}

/// Samples a level via `floor(-ln(U) * mL)`, the standard HNSW exponential
/// level assignment (§4.2).
fn random_level(level_multiplier: f64, rng: &mut impl Rng) -> usize {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    (-u.ln() * level_multiplier).floor() as usize
}

/// Inserts `vector` (tagged with `tid`) into the graph.
///
/// # Errors
///
/// Propagates storage errors, and [`crate::error::Error::DimensionMismatch`]
/// if `vector`'s dimension doesn't match `meta`.
#[allow(clippy::too_many_arguments)]
pub fn insert<B: BufferManager>(
    buffer: &B,
    wal: &dyn GenericWal,
    locks: &LockStripes,
    opclass: &OpClass,
    params: &HnswBuildParams,
    meta: &mut HnswMeta,
    tid: u64,
    vector: Vector,
    rng: &mut impl Rng,
) -> Result<ItemPointer> {
    let _span = info_span!("hnsw_insert", tid).entered();
    opclass.validate(&vector)?;
    let level = random_level(params.level_multiplier(), rng);

    let Some(entry) = meta.entry else {
        let blkno = buffer.new_page(PageType::HnswElement)?;
        let new_ptr = ItemPointer::new(blkno, 1);
        let element = Element::new(tid, vector.clone(), level);
        let mut page = buffer.read_page(blkno)?;
        page.add_item(element.to_bytes()?)?;
        let bracket = WalBracket::open(wal);
        bracket.register(blkno, &page);
        buffer.write_page(blkno, page)?;
        bracket.commit();
        meta.entry = Some(EntryPoint {
            blkno: new_ptr.blkno,
            offno: new_ptr.offno,
            level: u16::try_from(level).unwrap_or(u16::MAX),
        });
        debug!(tid, level, "first element becomes entry point");
        return Ok(new_ptr);
    };

    let graph = HnswGraph::new(buffer, opclass);
    let entry_ptr = ItemPointer::new(entry.blkno, entry.offno);
    let entry_level = usize::from(entry.level);

    let mut current = entry_ptr;
    for l in ((level + 1)..=entry_level).rev() {
        current = graph.search_layer_single(&vector, current, l)?;
    }

    // §4.4: an exact (tid, vector) match already present makes this insert a
    // no-op. Exact duplicates score a distance of exactly 0, so they always
    // surface in the base-layer candidate set.
    let base_candidates = graph.search_layer(&vector, &[current], params.ef_construction, 0)?;
    for (ptr, dist) in &base_candidates {
        if *dist == 0.0 {
            let candidate = graph.load(*ptr)?;
            if candidate.tid == tid && candidate.vector == vector {
                debug!(tid, "duplicate tid/vector observed, insert is a no-op");
                return Ok(*ptr);
            }
        }
    }

    let blkno = buffer.new_page(PageType::HnswElement)?;
    let new_ptr = ItemPointer::new(blkno, 1);
    let mut new_element = Element::new(tid, vector.clone(), level);
    let mut touched_pages = vec![new_ptr];

    for l in (0..=level.min(entry_level)).rev() {
        let max_conn = if l == 0 { params.m0 } else { params.m };
        let found = if l == 0 {
            base_candidates.clone()
        } else {
            graph.search_layer(&vector, &[current], params.ef_construction, l)?
        };

        let mut candidates = Vec::with_capacity(found.len());
        for (ptr, dist) in &found {
            let candidate_elem = graph.load(*ptr)?;
            candidates.push(Candidate {
                pointer: *ptr,
                vector: candidate_elem.vector,
                dist_to_query: *dist,
            });
        }
        let selected = select_neighbors(opclass, &candidates, max_conn);
        new_element.neighbors[l] = selected.clone();

        for &neighbor_ptr in &selected {
            touched_pages.push(neighbor_ptr);
            reconnect(buffer, &graph, opclass, neighbor_ptr, new_ptr, l, max_conn)?;
        }

        if let Some((closest, _)) = found.first() {
            current = *closest;
        }
    }

    touched_pages.sort();
    touched_pages.dedup();
    let _guards = locks.lock_ordered(&touched_pages);

    let bracket = WalBracket::open(wal);
    let mut page = buffer.read_page(blkno)?;
    page.set_item(1, new_element.to_bytes()?)?;
    bracket.register(blkno, &page);
    buffer.write_page(blkno, page)?;

    if level > entry_level {
        meta.entry = Some(EntryPoint {
            blkno: new_ptr.blkno,
            offno: new_ptr.offno,
            level: u16::try_from(level).unwrap_or(u16::MAX),
        });
        debug!(tid, level, "new element promoted to entry point");
    }
    bracket.commit();

    Ok(new_ptr)
}

/// Adds a back-link from `neighbor_ptr` to `new_ptr`, pruning to `max_conn`
/// with the same selection heuristic used for forward links (§4.4).
fn reconnect<B: BufferManager>(
    buffer: &B,
    graph: &HnswGraph<'_, B>,
    opclass: &OpClass,
    neighbor_ptr: ItemPointer,
    new_ptr: ItemPointer,
    level: usize,
    max_conn: usize,
) -> Result<()> {
    let mut neighbor_elem = graph.load(neighbor_ptr)?;
    let existing = neighbor_elem.neighbors.get(level).cloned().unwrap_or_default();

    if existing.len() < max_conn {
        let mut updated = existing;
        updated.push(new_ptr);
        while neighbor_elem.neighbors.len() <= level {
            neighbor_elem.neighbors.push(Vec::new());
        }
        neighbor_elem.neighbors[level] = updated;
    } else {
        let mut all = existing;
        all.push(new_ptr);
        let neighbor_vec = neighbor_elem.vector.clone();
        let mut candidates = Vec::with_capacity(all.len());
        for ptr in all {
            let elem = graph.load(ptr)?;
            let dist = opclass.distance(&neighbor_vec, &elem.vector)?;
            candidates.push(Candidate {
                pointer: ptr,
                vector: elem.vector,
                dist_to_query: dist,
            });
        }
        candidates.sort_by(|a, b| a.dist_to_query.total_cmp(&b.dist_to_query));
        let pruned = select_neighbors(opclass, &candidates, max_conn);
        while neighbor_elem.neighbors.len() <= level {
            neighbor_elem.neighbors.push(Vec::new());
        }
        neighbor_elem.neighbors[level] = pruned;
    }

    let mut page = buffer.read_page(neighbor_ptr.blkno)?;
    page.set_item(neighbor_ptr.offno, neighbor_elem.to_bytes()?)?;
    buffer.write_page(neighbor_ptr.blkno, page)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryBufferManager, InMemoryWal};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_first_insert_becomes_entry_point() {
        let buffer = InMemoryBufferManager::new();
        let wal = InMemoryWal::new();
        let locks = LockStripes::new(16);
        let opclass = OpClass::l2(16000);
        let params = HnswBuildParams::default();
        let mut meta = HnswMeta::new(2, 16, 64);
        let mut rng = StdRng::seed_from_u64(1);

        insert(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, 1,
            Vector::F32(vec![1.0, 2.0]), &mut rng,
        )
        .unwrap();

        assert!(meta.entry.is_some());
    }

    #[test]
    fn test_second_insert_links_to_first() {
        let buffer = InMemoryBufferManager::new();
        let wal = InMemoryWal::new();
        let locks = LockStripes::new(16);
        let opclass = OpClass::l2(16000);
        let params = HnswBuildParams::default();
        let mut meta = HnswMeta::new(2, 16, 64);
        let mut rng = StdRng::seed_from_u64(1);

        let first = insert(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, 1,
            Vector::F32(vec![1.0, 2.0]), &mut rng,
        )
        .unwrap();
        insert(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, 2,
            Vector::F32(vec![1.1, 2.1]), &mut rng,
        )
        .unwrap();

        let graph = HnswGraph::new(&buffer, &opclass);
        let first_elem = graph.load(first).unwrap();
        assert!(!first_elem.neighbors[0].is_empty());
    }

    #[test]
    fn test_duplicate_tid_and_vector_is_a_noop() {
        let buffer = InMemoryBufferManager::new();
        let wal = InMemoryWal::new();
        let locks = LockStripes::new(16);
        let opclass = OpClass::l2(16000);
        let params = HnswBuildParams::default();
        let mut meta = HnswMeta::new(2, 16, 64);
        let mut rng = StdRng::seed_from_u64(1);

        let first = insert(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, 1,
            Vector::F32(vec![1.0, 2.0]), &mut rng,
        )
        .unwrap();
        insert(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, 2,
            Vector::F32(vec![1.1, 2.1]), &mut rng,
        )
        .unwrap();

        let before_pages = buffer.page_count();
        let repeat = insert(
            &buffer, &wal, &locks, &opclass, &params, &mut meta, 1,
            Vector::F32(vec![1.0, 2.0]), &mut rng,
        )
        .unwrap();

        assert_eq!(repeat, first, "duplicate insert should return the existing element's pointer");
        assert_eq!(buffer.page_count(), before_pages, "duplicate insert must not allocate a new page");

        let graph = HnswGraph::new(&buffer, &opclass);
        let elem = graph.load(first).unwrap();
        assert_eq!(elem.tid, 1);
    }
}
