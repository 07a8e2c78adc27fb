//! HNSW build and session parameters (§4.2, §6).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Build-time parameters, fixed for the life of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswBuildParams {
    /// Bi-directional links per node above layer 0. Range `2..=100`.
    pub m: usize,
    /// `2 * m`: links per node at layer 0.
    pub m0: usize,
    /// Candidate list size during construction. Range `4..=1000`.
    pub ef_construction: usize,
}

impl HnswBuildParams {
    /// Validates and builds a set of parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionOutOfRange`] if `m` or `ef_construction` is out
    /// of its documented range.
    pub fn new(m: usize, ef_construction: usize) -> Result<Self> {
        if !(2..=100).contains(&m) {
            return Err(Error::OptionOutOfRange {
                option: "m",
                value: i64::try_from(m).unwrap_or(i64::MAX),
                min: 2,
                max: 100,
            });
        }
        if !(4..=1000).contains(&ef_construction) {
            return Err(Error::OptionOutOfRange {
                option: "ef_construction",
                value: i64::try_from(ef_construction).unwrap_or(i64::MAX),
                min: 4,
                max: 1000,
            });
        }
        Ok(Self {
            m,
            m0: m * 2,
            ef_construction,
        })
    }

    /// `mL = 1 / ln(M)`, the level-assignment multiplier (§4.2).
    #[must_use]
    pub fn level_multiplier(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }
}

impl Default for HnswBuildParams {
    fn default() -> Self {
        Self::new(16, 64).expect("defaults are always in range")
    }
}

/// Session-scoped search parameter, may vary per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Candidate list size during search. Range `1..=1000`.
    pub ef_search: usize,
}

impl SearchParams {
    /// Validates and builds search parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionOutOfRange`] if `ef_search` is out of range.
    pub fn new(ef_search: usize) -> Result<Self> {
        if !(1..=1000).contains(&ef_search) {
            return Err(Error::OptionOutOfRange {
                option: "ef_search",
                value: i64::try_from(ef_search).unwrap_or(i64::MAX),
                min: 1,
                max: 1000,
            });
        }
        Ok(Self { ef_search })
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new(40).expect("default is always in range")
    }
}
