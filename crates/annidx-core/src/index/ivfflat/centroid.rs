//! Centroid directory (§5.1, §5.3): one page listing every list's centroid
//! vector and the head page of its posting list.

use crate::error::Result;
use crate::storage::{BufferManager, ItemPointer, PageType};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// One centroid list's directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidEntry {
    /// This list's centroid.
    pub centroid: Vector,
    /// Head page of this list's posting entries, or `None` if empty.
    pub head_page: Option<u32>,
    /// Tail page of this list's posting chain — the page new rows are
    /// appended to. Equal to `head_page` until the list overflows past one
    /// page, at which point single-row inserts must append here rather than
    /// re-reading `head_page`, or the chain's earlier overflow pages and
    /// their postings are silently orphaned.
    pub insert_page: Option<u32>,
}

/// The full centroid directory, held as one logical unit spanning as many
/// pages as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidDirectory {
    /// One entry per list, in list-id order.
    pub entries: Vec<CentroidEntry>,
}

impl CentroidDirectory {
    /// Builds a directory from freshly trained centroids.
    #[must_use]
    pub fn new(centroids: Vec<Vector>) -> Self {
        Self {
            entries: centroids
                .into_iter()
                .map(|centroid| CentroidEntry {
                    centroid,
                    head_page: None,
                    insert_page: None,
                })
                .collect(),
        }
    }

    /// Writes the directory across as many pages as needed, returning the
    /// first page's block number.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn store<B: BufferManager>(&self, buffer: &B) -> Result<u32> {
        let bytes = bincode::serialize(self)
            .map_err(|e| crate::error::Error::Serialization(e.to_string()))?;
        let blkno = buffer.new_page(PageType::IvfflatCentroids)?;
        let mut page = buffer.read_page(blkno)?;
        page.add_item(bytes)?;
        buffer.write_page(blkno, page)?;
        Ok(blkno)
    }

    /// Loads a previously stored directory.
    ///
    /// # Errors
    ///
    /// Propagates storage or deserialization errors.
    pub fn load<B: BufferManager>(buffer: &B, blkno: u32) -> Result<Self> {
        let page = buffer.read_page(blkno)?;
        let bytes = page.get_item(1)?;
        bincode::deserialize(bytes).map_err(|e| crate::error::Error::Serialization(e.to_string()))
    }

    /// Returns up to `probes` list indices closest to `query`, ascending by
    /// distance to centroid (§5.4 probe selection).
    ///
    /// # Errors
    ///
    /// Propagates opclass distance errors.
    pub fn nearest_lists(
        &self,
        opclass: &crate::distance::OpClass,
        query: &Vector,
        probes: usize,
    ) -> Result<Vec<usize>> {
        let mut scored = Vec::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            scored.push((i, opclass.distance(query, &entry.centroid)?));
        }
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(scored.into_iter().take(probes).map(|(i, _)| i).collect())
    }
}

/// A single posted vector: the element's row identifier and vector, chained
/// through [`PageType::IvfflatEntries`] pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingEntry {
    /// The indexed row's identifier.
    pub tid: u64,
    /// The raw vector payload.
    pub vector: Vector,
}

/// A pointer to one posted vector in a list's page chain.
pub type PostingPointer = ItemPointer;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::OpClass;

    #[test]
    fn test_nearest_lists_orders_ascending() {
        let dir = CentroidDirectory::new(vec![
            Vector::F32(vec![0.0, 0.0]),
            Vector::F32(vec![10.0, 10.0]),
            Vector::F32(vec![1.0, 1.0]),
        ]);
        let op = OpClass::l2(16000);
        let nearest = dir.nearest_lists(&op, &Vector::F32(vec![0.9, 0.9]), 2).unwrap();
        assert_eq!(nearest, vec![2, 0]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            /// Property: the single nearest list (probes=1) is a true argmin
            /// over every centroid's distance to the query.
            #[test]
            fn prop_single_probe_is_argmin(
                centers in proptest::collection::vec((-20.0f32..20.0, -20.0f32..20.0), 1usize..=10),
                query in (-20.0f32..20.0, -20.0f32..20.0),
            ) {
                let dir = CentroidDirectory::new(
                    centers.iter().map(|&(x, y)| Vector::F32(vec![x, y])).collect(),
                );
                let op = OpClass::l2(16000);
                let query_vec = Vector::F32(vec![query.0, query.1]);
                let nearest = dir.nearest_lists(&op, &query_vec, 1).unwrap();
                let picked = nearest[0];
                let picked_dist = op.distance(&query_vec, &dir.entries[picked].centroid).unwrap();

                for (i, entry) in dir.entries.iter().enumerate() {
                    let d = op.distance(&query_vec, &entry.centroid).unwrap();
                    prop_assert!(picked_dist <= d + 1e-9, "list {i} was closer than the one picked");
                }
            }
        }
    }
}
