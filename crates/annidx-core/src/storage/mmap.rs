//! Memory-mapped page file backing (§12 "Persistent Storage").
//!
//! Maps the whole page file as one growable [`MmapMut`]. Each page occupies
//! a fixed [`PAGE_SIZE`]-byte slot: a little-endian `u32` length prefix
//! followed by the page's bincode encoding, zero-padded to the slot
//! boundary. Growing the file remaps it; this only happens on `new_page`,
//! never on the read/write hot path.

use crate::error::{Error, Result};
use crate::storage::buffer::BufferManager;
use crate::storage::page::{BlockNumber, Page, PageType, INVALID_BLOCK, PAGE_SIZE};
use memmap2::MmapMut;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::debug;

const LEN_PREFIX: usize = 4;

struct Inner {
    file: File,
    mmap: MmapMut,
    page_count: u32,
}

/// A page file memory-mapped directly into the process's address space.
///
/// Grows the backing file as pages are allocated; never shrinks, since
/// neither engine frees a page once claimed.
pub struct MmapBufferManager {
    inner: Mutex<Inner>,
}

impl MmapBufferManager {
    /// Opens (creating if absent) a page file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened, extended, or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            file.set_len(PAGE_SIZE as u64)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        let page_count = u32::try_from((file.metadata()?.len() / PAGE_SIZE as u64).max(0)).unwrap_or(0);
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                mmap,
                page_count,
            }),
        })
    }

    fn write_slot(mmap: &mut MmapMut, blkno: BlockNumber, page: &Page) -> Result<()> {
        let bytes = bincode::serialize(page).map_err(|e| Error::Serialization(e.to_string()))?;
        if bytes.len() + LEN_PREFIX > PAGE_SIZE {
            return Err(Error::ResourceExhausted(
                "page image does not fit in a page slot".to_string(),
            ));
        }
        let start = blkno as usize * PAGE_SIZE;
        mmap[start..start + LEN_PREFIX].copy_from_slice(&(bytes.len() as u32).to_le_bytes());
        mmap[start + LEN_PREFIX..start + LEN_PREFIX + bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    fn read_slot(mmap: &MmapMut, blkno: BlockNumber) -> Result<Page> {
        let start = blkno as usize * PAGE_SIZE;
        let slot = &mmap[start..start + PAGE_SIZE];
        let len = u32::from_le_bytes(slot[..LEN_PREFIX].try_into().unwrap_or([0; 4])) as usize;
        if len == 0 || len > PAGE_SIZE - LEN_PREFIX {
            return Err(Error::Corrupt {
                relation: String::new(),
                detail: format!("page {blkno} has a corrupt length prefix"),
            });
        }
        bincode::deserialize(&slot[LEN_PREFIX..LEN_PREFIX + len])
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl BufferManager for MmapBufferManager {
    fn read_page(&self, blkno: BlockNumber) -> Result<Page> {
        let inner = self.inner.lock();
        if blkno >= inner.page_count {
            return Err(Error::Corrupt {
                relation: String::new(),
                detail: format!("block {blkno} does not exist"),
            });
        }
        Self::read_slot(&inner.mmap, blkno)
    }

    fn write_page(&self, blkno: BlockNumber, page: Page) -> Result<()> {
        let mut inner = self.inner.lock();
        if blkno >= inner.page_count {
            return Err(Error::Corrupt {
                relation: String::new(),
                detail: format!("block {blkno} does not exist"),
            });
        }
        Self::write_slot(&mut inner.mmap, blkno, &page)
    }

    fn new_page(&self, page_type: PageType) -> Result<BlockNumber> {
        let mut inner = self.inner.lock();
        if inner.page_count >= INVALID_BLOCK {
            return Err(Error::ResourceExhausted(
                "relation cannot be extended further".to_string(),
            ));
        }
        let blkno = inner.page_count;
        let new_len = (u64::from(blkno) + 1) * PAGE_SIZE as u64;
        inner.file.set_len(new_len)?;
        inner.mmap = unsafe { MmapMut::map_mut(&inner.file)? };
        inner.page_count += 1;
        let page = Page::new(page_type);
        Self::write_slot(&mut inner.mmap, blkno, &page)?;
        debug!(blkno, ?page_type, "allocated mapped page");
        Ok(blkno)
    }

    fn page_count(&self) -> u32 {
        self.inner.lock().page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrips_through_a_real_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.pages");
        let mgr = MmapBufferManager::open(&path).unwrap();
        let blkno = mgr.new_page(PageType::HnswElement).unwrap();
        let mut page = mgr.read_page(blkno).unwrap();
        page.add_item(vec![1, 2, 3]).unwrap();
        mgr.write_page(blkno, page).unwrap();

        drop(mgr);
        let reopened = MmapBufferManager::open(&path).unwrap();
        let page = reopened.read_page(blkno).unwrap();
        assert_eq!(page.get_item(1).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_grows_across_many_pages() {
        let dir = tempdir().unwrap();
        let mgr = MmapBufferManager::open(dir.path().join("grow.pages")).unwrap();
        for _ in 0..20 {
            mgr.new_page(PageType::IvfflatEntries).unwrap();
        }
        assert_eq!(mgr.page_count(), 20);
    }

    #[test]
    fn test_meta_page_round_trips_across_reopen() {
        use crate::storage::meta::HnswMeta;

        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.pages");
        let meta = HnswMeta::new(128, 16, 64);
        {
            let mgr = MmapBufferManager::open(&path).unwrap();
            let blkno = mgr.new_page(PageType::Meta).unwrap();
            let mut page = mgr.read_page(blkno).unwrap();
            let bytes = bincode::serialize(&meta).unwrap();
            page.add_item(bytes).unwrap();
            mgr.write_page(blkno, page).unwrap();
        }

        let mgr = MmapBufferManager::open(&path).unwrap();
        let page = mgr.read_page(0).unwrap();
        let reread: HnswMeta = bincode::deserialize(page.get_item(1).unwrap()).unwrap();
        assert_eq!(reread, meta);
    }

    /// Simulates a crash mid-write: truncates the file after a committed
    /// page but before a second page's write lands, then reopens. The
    /// committed page must survive intact; the never-written page must not
    /// be silently readable as a zeroed page.
    #[test]
    fn test_truncated_reopen_preserves_committed_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crash.pages");
        let mgr = MmapBufferManager::open(&path).unwrap();
        let committed = mgr.new_page(PageType::HnswElement).unwrap();
        let mut page = mgr.read_page(committed).unwrap();
        page.add_item(vec![7, 7, 7]).unwrap();
        mgr.write_page(committed, page).unwrap();
        drop(mgr);

        // Simulate the crash: truncate back to just the committed page,
        // as if the second page's allocation never reached disk.
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(PAGE_SIZE as u64).unwrap();
        drop(file);

        let reopened = MmapBufferManager::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 1);
        let page = reopened.read_page(committed).unwrap();
        assert_eq!(page.get_item(1).unwrap(), &[7, 7, 7]);
        assert!(reopened.read_page(1).is_err());
    }
}
