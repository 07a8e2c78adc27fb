//! Index meta pages (page 0 of every relation, §3/§6).

use serde::{Deserialize, Serialize};

/// Magic number stamped on an HNSW meta page.
pub const HNSW_MAGIC: u32 = 0x484E_5357; // "HNSW"
/// Magic number stamped on an IVFFlat meta page.
pub const IVF_MAGIC: u32 = 0x4956_4631; // "IVF1"

/// On-disk format version. Bumped on any incompatible layout change.
pub const FORMAT_VERSION: u16 = 1;

/// HNSW meta page contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HnswMeta {
    /// Must equal [`HNSW_MAGIC`].
    pub magic: u32,
    /// Must equal [`FORMAT_VERSION`].
    pub version: u16,
    /// Vector dimensionality fixed at build time.
    pub dimensions: u32,
    /// M parameter.
    pub m: u16,
    /// `ef_construction` used at build time.
    pub ef_construction: u16,
    /// Entry point, or `None` before the first insert.
    pub entry: Option<EntryPoint>,
    /// Next free block for element allocation.
    pub insert_page: u32,
}

/// The current graph entry point and its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Page holding the entry element.
    pub blkno: u32,
    /// Slot within that page.
    pub offno: u16,
    /// The entry element's level.
    pub level: u16,
}

impl HnswMeta {
    /// Builds a fresh meta page for an empty index.
    #[must_use]
    pub const fn new(dimensions: u32, m: u16, ef_construction: u16) -> Self {
        Self {
            magic: HNSW_MAGIC,
            version: FORMAT_VERSION,
            dimensions,
            m,
            ef_construction,
            entry: None,
            insert_page: 1,
        }
    }

    /// `true` if `magic`/`version` indicate a well-formed meta page.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.magic == HNSW_MAGIC && self.version == FORMAT_VERSION
    }
}

/// IVFFlat meta page contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvfMeta {
    /// Must equal [`IVF_MAGIC`].
    pub magic: u32,
    /// Must equal [`FORMAT_VERSION`].
    pub version: u16,
    /// Vector dimensionality fixed at build time.
    pub dimensions: u32,
    /// Number of centroid lists.
    pub lists: u32,
    /// Page holding the centroid directory, or `None` before a build.
    pub centroids_page: Option<u32>,
}

impl IvfMeta {
    /// Builds a fresh meta page for an unbuilt index.
    #[must_use]
    pub const fn new(dimensions: u32, lists: u32) -> Self {
        Self {
            magic: IVF_MAGIC,
            version: FORMAT_VERSION,
            dimensions,
            lists,
            centroids_page: None,
        }
    }

    /// `true` if `magic`/`version` indicate a well-formed meta page.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.magic == IVF_MAGIC && self.version == FORMAT_VERSION
    }
}
