//! The persistent unit of an HNSW graph: one vector plus its per-level
//! neighbor lists (§4.2, §4.4).

use crate::storage::ItemPointer;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// A single HNSW graph node as stored on a page.
///
/// `neighbors[l]` holds the node's neighbor list at level `l`; levels above
/// the node's own assigned level are simply absent (`neighbors.len() - 1`
/// is the node's level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// The indexed row's external identifier (heap TID, in host terms).
    pub tid: u64,
    /// The raw vector payload.
    pub vector: Vector,
    /// Per-level neighbor pointers, `neighbors[0]` is the base layer.
    pub neighbors: Vec<Vec<ItemPointer>>,
    /// Set by vacuum (§4.6) when this element's row has been deleted. The
    /// vector and neighbor lists are kept — other elements may still route
    /// through this node — only its own `tid` stops being a valid result.
    #[serde(default)]
    pub deleted: bool,
}

impl Element {
    /// Creates a new element at the given level with empty neighbor lists.
    #[must_use]
    pub fn new(tid: u64, vector: Vector, level: usize) -> Self {
        Self {
            tid,
            vector,
            neighbors: vec![Vec::new(); level + 1],
            deleted: false,
        }
    }

    /// This element's level (0-indexed, same convention as `neighbors.len() - 1`).
    #[must_use]
    pub fn level(&self) -> usize {
        self.neighbors.len().saturating_sub(1)
    }

    /// Serializes the element for storage in a page item.
    ///
    /// # Errors
    ///
    /// Returns an error if `bincode` serialization fails.
    pub fn to_bytes(&self) -> crate::error::Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| crate::error::Error::Serialization(e.to_string()))
    }

    /// Deserializes an element from a page item's bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `bincode` deserialization fails.
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        bincode::deserialize(bytes).map_err(|e| crate::error::Error::Serialization(e.to_string()))
    }
}
