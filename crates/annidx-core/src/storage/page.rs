//! Fixed-size page layout shared by both index types (§3, §6).
//!
//! Every page is exactly [`PAGE_SIZE`] bytes: a header, a slotted array of
//! variable-length items growing from the front, and an opaque trailer
//! growing from the back that every access method reuses for its own
//! per-page bookkeeping (next-page pointer, page type).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Page size in bytes. Not configurable per-index; it is a property of the
/// host's page cache.
pub const PAGE_SIZE: usize = 8192;

/// Size reserved for [`PageOpaque`] at the tail of every page.
pub const OPAQUE_SIZE: usize = 16;

/// Identifies a page within a relation.
pub type BlockNumber = u32;

/// Identifies an item's slot within a page.
pub type OffsetNumber = u16;

/// A stable pointer to one item: `(page, slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemPointer {
    /// Page containing the item.
    pub blkno: BlockNumber,
    /// Slot within the page.
    pub offno: OffsetNumber,
}

impl ItemPointer {
    /// Builds a pointer from its parts.
    #[must_use]
    pub const fn new(blkno: BlockNumber, offno: OffsetNumber) -> Self {
        Self { blkno, offno }
    }
}

/// The sentinel used for "no such page yet".
pub const INVALID_BLOCK: BlockNumber = u32::MAX;

/// Page-type discriminant carried in the opaque trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    /// Index-specific metadata (page 0).
    Meta,
    /// HNSW graph element storage.
    HnswElement,
    /// HNSW neighbor-list overflow storage.
    HnswNeighbors,
    /// IVFFlat centroid list directory.
    IvfflatCentroids,
    /// IVFFlat posting-list entries for one list.
    IvfflatEntries,
}

/// Trailer present on every non-meta page, reused across access methods
/// (§3: "opaque trailer `{nextblkno,type,unused}`").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageOpaque {
    /// Next page in this page's chain, or [`INVALID_BLOCK`].
    pub next_blkno: BlockNumber,
    /// What this page holds.
    pub page_type: PageType,
}

/// One fixed-size page: a header-less slotted array of byte items plus an
/// opaque trailer. Items are stored as opaque blobs; callers serialize their
/// own element/centroid/posting representations into them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    items: Vec<Vec<u8>>,
    opaque: PageOpaque,
}

impl Page {
    /// Creates an empty page of the given type with no next page.
    #[must_use]
    pub const fn new(page_type: PageType) -> Self {
        Self {
            items: Vec::new(),
            opaque: PageOpaque {
                next_blkno: INVALID_BLOCK,
                page_type,
            },
        }
    }

    /// Returns this page's opaque trailer.
    #[must_use]
    pub const fn opaque(&self) -> PageOpaque {
        self.opaque
    }

    /// Sets the next-page pointer.
    pub fn set_next(&mut self, next_blkno: BlockNumber) {
        self.opaque.next_blkno = next_blkno;
    }

    /// Appends an item, returning its slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the page's approximate used
    /// space would exceed [`PAGE_SIZE`] minus [`OPAQUE_SIZE`].
    pub fn add_item(&mut self, item: Vec<u8>) -> Result<OffsetNumber> {
        let used: usize = self.items.iter().map(Vec::len).sum();
        if used + item.len() + OPAQUE_SIZE > PAGE_SIZE {
            return Err(Error::ResourceExhausted(
                "page has no room for this item".to_string(),
            ));
        }
        self.items.push(item);
        Ok(OffsetNumber::try_from(self.items.len()).unwrap_or(OffsetNumber::MAX))
    }

    /// Reads an item by slot (1-indexed, matching `offno` conventions).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] if `offno` does not name a live item.
    pub fn get_item(&self, offno: OffsetNumber) -> Result<&[u8]> {
        self.items
            .get(offno.checked_sub(1).map(usize::from).unwrap_or(usize::MAX))
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Corrupt {
                relation: String::new(),
                detail: format!("offno {offno} does not name a live item"),
            })
    }

    /// Overwrites an item in place. The new encoding must not grow the page
    /// past capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupt`] if `offno` is invalid, or
    /// [`Error::ResourceExhausted`] if the replacement doesn't fit.
    pub fn set_item(&mut self, offno: OffsetNumber, item: Vec<u8>) -> Result<()> {
        let idx = offno
            .checked_sub(1)
            .map(usize::from)
            .filter(|i| *i < self.items.len())
            .ok_or_else(|| Error::Corrupt {
                relation: String::new(),
                detail: format!("offno {offno} does not name a live item"),
            })?;
        let used: usize = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, v)| v.len())
            .sum();
        if used + item.len() + OPAQUE_SIZE > PAGE_SIZE {
            return Err(Error::ResourceExhausted(
                "replacement item does not fit in page".to_string(),
            ));
        }
        self.items[idx] = item;
        Ok(())
    }

    /// Number of live item slots.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Iterates over `(offno, bytes)` for every live item.
    pub fn iter_items(&self) -> impl Iterator<Item = (OffsetNumber, &[u8])> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (OffsetNumber::try_from(i + 1).unwrap_or(OffsetNumber::MAX), v.as_slice()))
    }
}
