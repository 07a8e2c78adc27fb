//! SearchLayer and KnnSearch (§4.2), operating over page-backed elements.
//!
//! Each [`Element`] occupies exactly one page (`offno` is always 1); this
//! trades slotted multi-item packing for a simpler address scheme, since an
//! element's neighbor lists already dominate its page's size at realistic
//! `M`. Distance computation reads element vectors through the buffer
//! manager like any other access, so this module never special-cases a
//! resident cache — a host with its own buffer pool sees the same calls a
//! cold index would.

use crate::distance::OpClass;
use crate::error::Result;
use crate::index::hnsw::element::Element;
use crate::storage::{BufferManager, ItemPointer};
use crate::vector::Vector;
use rustc_hash::FxHashSet;
use std::cmp::Ordering as CmpOrdering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct Scored(f64, ItemPointer);

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
        // §4.2: equal distances break ascending by (blkno, offno), so result
        // order is deterministic regardless of visitation order.
        self.0.total_cmp(&other.0).then_with(|| self.1.cmp(&other.1))
    }
}

/// Read-only view over the graph for search and candidate scoring.
pub struct HnswGraph<'a, B: BufferManager> {
    buffer: &'a B,
    opclass: &'a OpClass,
}

impl<'a, B: BufferManager> HnswGraph<'a, B> {
    /// Builds a graph view over `buffer` using `opclass` for distance.
    #[must_use]
    pub fn new(buffer: &'a B, opclass: &'a OpClass) -> Self {
        Self { buffer, opclass }
    }

    /// Loads the element stored at `ptr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page doesn't exist or fails to deserialize.
    pub fn load(&self, ptr: ItemPointer) -> Result<Element> {
        let page = self.buffer.read_page(ptr.blkno)?;
        let bytes = page.get_item(ptr.offno)?;
        Element::from_bytes(bytes)
    }

    fn distance_to(&self, query: &Vector, ptr: ItemPointer) -> Result<f64> {
        let element = self.load(ptr)?;
        self.opclass.distance(query, &element.vector)
    }

    /// Greedy single-path descent used above the base layer (§4.2): follow
    /// the best-improving neighbor at `level` until no neighbor improves on
    /// `entry`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors encountered while loading elements.
    pub fn search_layer_single(
        &self,
        query: &Vector,
        entry: ItemPointer,
        level: usize,
    ) -> Result<ItemPointer> {
        let mut best = entry;
        let mut best_dist = self.distance_to(query, best)?;
        loop {
            let element = self.load(best)?;
            let Some(neighbors) = element.neighbors.get(level) else {
                break;
            };
            let mut improved = None;
            for &candidate in neighbors {
                let dist = self.distance_to(query, candidate)?;
                if dist < best_dist {
                    best_dist = dist;
                    improved = Some(candidate);
                }
            }
            match improved {
                Some(next) => best = next,
                None => break,
            }
        }
        Ok(best)
    }

    /// Beam search at `level` from `entry_points`, maintaining up to `ef`
    /// results (§4.2 `SearchLayer`). Returns results sorted ascending by
    /// distance.
    ///
    /// # Errors
    ///
    /// Propagates storage errors encountered while loading elements.
    pub fn search_layer(
        &self,
        query: &Vector,
        entry_points: &[ItemPointer],
        ef: usize,
        level: usize,
    ) -> Result<Vec<(ItemPointer, f64)>> {
        let mut visited: FxHashSet<ItemPointer> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();
        let mut results: BinaryHeap<Scored> = BinaryHeap::new();

        for &ep in entry_points {
            let dist = self.distance_to(query, ep)?;
            candidates.push(Reverse(Scored(dist, ep)));
            results.push(Scored(dist, ep));
            visited.insert(ep);
        }

        while let Some(Reverse(Scored(c_dist, c_ptr))) = candidates.pop() {
            let furthest = results.peek().map_or(f64::INFINITY, |s| s.0);
            if c_dist > furthest && results.len() >= ef {
                break;
            }

            let element = self.load(c_ptr)?;
            let Some(neighbors) = element.neighbors.get(level) else {
                continue;
            };
            for &candidate in neighbors {
                if visited.insert(candidate) {
                    let dist = self.distance_to(query, candidate)?;
                    let furthest = results.peek().map_or(f64::INFINITY, |s| s.0);
                    if dist < furthest || results.len() < ef {
                        candidates.push(Reverse(Scored(dist, candidate)));
                        results.push(Scored(dist, candidate));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        let mut out: Vec<(ItemPointer, f64)> = results.into_iter().map(|s| (s.1, s.0)).collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    /// Full `KnnSearch` (§4.2): greedy descent from the top layer to layer 1,
    /// then a beam search at layer 0 with `ef_search`, returning the top `k`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors encountered while loading elements.
    pub fn knn_search(
        &self,
        query: &Vector,
        k: usize,
        ef_search: usize,
        entry: ItemPointer,
        entry_level: usize,
    ) -> Result<Vec<(ItemPointer, f64)>> {
        let mut current = entry;
        for level in (1..=entry_level).rev() {
            current = self.search_layer_single(query, current, level)?;
        }
        let candidates = self.search_layer(query, &[current], ef_search.max(k), 0)?;
        let mut live = Vec::with_capacity(k);
        for (ptr, dist) in candidates {
            if live.len() >= k {
                break;
            }
            if !self.load(ptr)?.deleted {
                live.push((ptr, dist));
            }
        }
        Ok(live)
    }
}
