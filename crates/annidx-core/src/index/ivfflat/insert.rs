//! Single-row insert into a built index (§5.3, §5.4): assign to the nearest
//! trained centroid and append to that list's posting chain.

use crate::distance::OpClass;
use crate::error::Result;
use crate::index::ivfflat::centroid::{CentroidDirectory, PostingEntry};
use crate::storage::{BufferManager, PageType};
use crate::vector::Vector;

/// Inserts one `(tid, vector)` row into the list nearest its centroid.
///
/// # Errors
///
/// Propagates opclass and storage errors.
pub fn insert<B: BufferManager>(
    buffer: &B,
    opclass: &OpClass,
    directory: &mut CentroidDirectory,
    tid: u64,
    vector: Vector,
) -> Result<usize> {
    opclass.validate(&vector)?;
    let mut best_list = 0;
    let mut best_dist = f64::INFINITY;
    for (i, entry) in directory.entries.iter().enumerate() {
        let d = opclass.distance(&vector, &entry.centroid)?;
        if d < best_dist {
            best_dist = d;
            best_list = i;
        }
    }

    let entry = PostingEntry { tid, vector };
    let bytes =
        bincode::serialize(&entry).map_err(|e| crate::error::Error::Serialization(e.to_string()))?;

    // Append at the list's true tail (`insert_page`), not its `head_page` —
    // reusing `head_page` here would re-target any existing overflow pages
    // and orphan them along with their postings.
    let blkno = match directory.entries[best_list].insert_page {
        Some(b) => b,
        None => {
            let b = buffer.new_page(PageType::IvfflatEntries)?;
            directory.entries[best_list].head_page = Some(b);
            directory.entries[best_list].insert_page = Some(b);
            b
        }
    };

    let mut page = buffer.read_page(blkno)?;
    if page.add_item(bytes.clone()).is_err() {
        let next = buffer.new_page(PageType::IvfflatEntries)?;
        let mut next_page = buffer.read_page(next)?;
        next_page.add_item(bytes)?;
        buffer.write_page(next, next_page)?;
        let mut prev = buffer.read_page(blkno)?;
        prev.set_next(next);
        buffer.write_page(blkno, prev)?;
        directory.entries[best_list].insert_page = Some(next);
    } else {
        buffer.write_page(blkno, page)?;
    }

    Ok(best_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBufferManager;

    #[test]
    fn test_insert_picks_nearest_list() {
        let buffer = InMemoryBufferManager::new();
        let opclass = OpClass::l2(16000);
        let mut directory = CentroidDirectory::new(vec![
            Vector::F32(vec![0.0, 0.0]),
            Vector::F32(vec![100.0, 100.0]),
        ]);
        let list = insert(&buffer, &opclass, &mut directory, 1, Vector::F32(vec![1.0, 1.0])).unwrap();
        assert_eq!(list, 0);
        assert!(directory.entries[0].head_page.is_some());
    }

    #[test]
    fn test_repeated_inserts_after_overflow_never_orphan_earlier_postings() {
        let buffer = InMemoryBufferManager::new();
        let opclass = OpClass::l2(2000);
        let mut directory = CentroidDirectory::new(vec![Vector::F32(vec![0.0; 1000])]);

        for tid in 0..6u64 {
            insert(&buffer, &opclass, &mut directory, tid, Vector::F32(vec![0.0; 1000])).unwrap();
        }

        let head = directory.entries[0].head_page.unwrap();
        let mut blkno = Some(head);
        let mut total = 0usize;
        let mut pages_visited = 0usize;
        while let Some(b) = blkno {
            let page = buffer.read_page(b).unwrap();
            total += page.iter_items().count();
            pages_visited += 1;
            let next = page.opaque().next_blkno;
            blkno = (next != crate::storage::INVALID_BLOCK).then_some(next);
        }

        assert!(pages_visited > 1, "test setup should force at least one overflow page");
        assert_eq!(total, 6, "every posted row must remain reachable from head_page, none orphaned");
    }
}
