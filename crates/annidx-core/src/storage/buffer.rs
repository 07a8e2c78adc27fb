//! Buffer manager abstraction (§3, §6).
//!
//! The host owns page allocation, pinning, and eviction; this crate only
//! ever asks for pages through [`BufferManager`]. [`InMemoryBufferManager`]
//! is the reference implementation used by the standalone binary and every
//! test in this crate — it is not a cache, it keeps every page resident.

use crate::error::{Error, Result};
use crate::storage::page::{BlockNumber, Page, PageType, INVALID_BLOCK};
use parking_lot::RwLock;
use tracing::debug;

/// The page-level I/O surface a host index access method is given.
///
/// A real host (e.g. an embedding process with its own page cache) pins and
/// evicts pages behind this interface; callers here never see eviction, only
/// `read`/`write`/`new_page`.
pub trait BufferManager: Send + Sync {
    /// Reads a page by block number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] if `blkno` is out of range.
    fn read_page(&self, blkno: BlockNumber) -> Result<Page>;

    /// Writes a full page image back. Callers open a WAL bracket and
    /// register pages before calling this, per §4.5.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] if `blkno` is out of range.
    fn write_page(&self, blkno: BlockNumber, page: Page) -> Result<()>;

    /// Allocates a new page of the given type, returning its block number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the relation cannot be
    /// extended.
    fn new_page(&self, page_type: PageType) -> Result<BlockNumber>;

    /// Total number of pages currently allocated.
    fn page_count(&self) -> u32;
}

/// An entirely in-memory buffer manager: every page lives in a `Vec` guarded
/// by a single lock. Adequate for the standalone binary and for tests; a
/// real embedding host replaces this with its shared-buffer-pool client.
pub struct InMemoryBufferManager {
    pages: RwLock<Vec<Page>>,
}

impl InMemoryBufferManager {
    /// Creates an empty buffer manager with no pages allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryBufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferManager for InMemoryBufferManager {
    fn read_page(&self, blkno: BlockNumber) -> Result<Page> {
        self.pages
            .read()
            .get(blkno as usize)
            .cloned()
            .ok_or_else(|| Error::Corrupt {
                relation: String::new(),
                detail: format!("block {blkno} does not exist"),
            })
    }

    fn write_page(&self, blkno: BlockNumber, page: Page) -> Result<()> {
        let mut pages = self.pages.write();
        let slot = pages.get_mut(blkno as usize).ok_or_else(|| Error::Corrupt {
            relation: String::new(),
            detail: format!("block {blkno} does not exist"),
        })?;
        *slot = page;
        Ok(())
    }

    fn new_page(&self, page_type: PageType) -> Result<BlockNumber> {
        let mut pages = self.pages.write();
        if pages.len() >= INVALID_BLOCK as usize {
            return Err(Error::ResourceExhausted(
                "relation cannot be extended further".to_string(),
            ));
        }
        let blkno = u32::try_from(pages.len()).unwrap_or(INVALID_BLOCK - 1);
        pages.push(Page::new(page_type));
        debug!(blkno, ?page_type, "allocated page");
        Ok(blkno)
    }

    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.read().len()).unwrap_or(u32::MAX)
    }
}
