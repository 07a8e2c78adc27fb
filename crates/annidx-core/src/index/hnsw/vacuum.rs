//! Bulk-delete sweep (§4.6).
//!
//! Removing a node's vector and unthreading every incoming edge would turn
//! one deleted row into an unbounded amount of graph surgery. Instead a
//! vacuum pass only clears the `tid`-to-row association: the vector and
//! neighbor lists stay put so other elements keep a valid route through
//! this node, and if it happened to be the entry point it stays the entry
//! point. The cost of a deleted node is paid once, at scan time, by
//! filtering it out of results (`HnswGraph::knn_search`).

use crate::error::Result;
use crate::index::hnsw::element::Element;
use crate::storage::{BufferManager, PageType};
use tracing::info_span;

/// Callback asked whether a given `tid` should be vacuumed away.
pub trait DeletionCallback {
    /// Returns `true` if the row for `tid` no longer exists.
    fn is_deleted(&self, tid: u64) -> bool;
}

/// Sweeps every element page, marking elements whose `tid` the host reports
/// as deleted. Returns the number of elements marked.
///
/// # Errors
///
/// Propagates storage errors encountered while reading or writing pages.
pub fn bulkdelete<B: BufferManager>(
    buffer: &B,
    callback: &dyn DeletionCallback,
) -> Result<usize> {
    let _span = info_span!("hnsw_bulkdelete").entered();
    let mut marked = 0;
    for blkno in 0..buffer.page_count() {
        let page = buffer.read_page(blkno)?;
        if page.opaque().page_type != PageType::HnswElement {
            continue;
        }
        let Ok(bytes) = page.get_item(1) else {
            continue;
        };
        let mut element: Element = Element::from_bytes(bytes)?;
        if element.deleted || !callback.is_deleted(element.tid) {
            continue;
        }
        element.deleted = true;
        let mut page = page;
        page.set_item(1, element.to_bytes()?)?;
        buffer.write_page(blkno, page)?;
        marked += 1;
    }
    Ok(marked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hnsw::element::Element;
    use crate::storage::InMemoryBufferManager;
    use crate::vector::Vector;
    use std::collections::HashSet;

    struct Deleted(HashSet<u64>);
    impl DeletionCallback for Deleted {
        fn is_deleted(&self, tid: u64) -> bool {
            self.0.contains(&tid)
        }
    }

    #[test]
    fn test_bulkdelete_marks_and_preserves_vector() {
        let buffer = InMemoryBufferManager::new();
        let blkno = buffer.new_page(PageType::HnswElement).unwrap();
        let mut page = buffer.read_page(blkno).unwrap();
        let element = Element::new(42, Vector::F32(vec![1.0, 2.0]), 0);
        page.add_item(element.to_bytes().unwrap()).unwrap();
        buffer.write_page(blkno, page).unwrap();

        let mut deleted = HashSet::new();
        deleted.insert(42u64);
        let marked = bulkdelete(&buffer, &Deleted(deleted)).unwrap();
        assert_eq!(marked, 1);

        let page = buffer.read_page(blkno).unwrap();
        let reread = Element::from_bytes(page.get_item(1).unwrap()).unwrap();
        assert!(reread.deleted);
        assert_eq!(reread.vector, Vector::F32(vec![1.0, 2.0]));
    }

    #[test]
    fn test_bulkdelete_skips_live_rows() {
        let buffer = InMemoryBufferManager::new();
        let blkno = buffer.new_page(PageType::HnswElement).unwrap();
        let mut page = buffer.read_page(blkno).unwrap();
        let element = Element::new(7, Vector::F32(vec![1.0]), 0);
        page.add_item(element.to_bytes().unwrap()).unwrap();
        buffer.write_page(blkno, page).unwrap();

        let marked = bulkdelete(&buffer, &Deleted(HashSet::new())).unwrap();
        assert_eq!(marked, 0);
    }
}
