//! Error types for the index engines.
//!
//! A single coded error enum shared by both HNSW and IVFFlat. Error codes
//! follow the pattern `ANNIDX-XXX` so a caller can match on a stable string
//! even across a `Debug`/`Display` rewrite.

use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, inserting into, or scanning an index.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector dimension does not match the index's declared dimensionality (ANNIDX-001).
    #[error("[ANNIDX-001] dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was opened with.
        expected: usize,
        /// Dimension of the vector that was rejected.
        actual: usize,
    },

    /// An opclass was asked to index a vector type it does not support (ANNIDX-002).
    #[error("[ANNIDX-002] unsupported vector type for this opclass: {0}")]
    UnsupportedVectorType(String),

    /// A zero vector was presented to a metric that cannot normalize it (ANNIDX-003).
    #[error("[ANNIDX-003] zero vector is not valid input for cosine/spherical operations")]
    ZeroVector,

    /// A vector's norm underflowed to zero or produced a non-finite value (ANNIDX-004).
    #[error("[ANNIDX-004] vector norm is zero or non-finite, cannot normalize")]
    NonFiniteNorm,

    /// A reloption or session parameter fell outside its documented range (ANNIDX-005).
    #[error("[ANNIDX-005] option '{option}' value {value} is out of range [{min}, {max}]")]
    OptionOutOfRange {
        /// Name of the option.
        option: &'static str,
        /// Value supplied.
        value: i64,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
    },

    /// Dimension is too low for a spherical (cosine-normalized) opclass (ANNIDX-006).
    #[error("[ANNIDX-006] dimension {dimension} is too low for a spherical opclass (need >= 2)")]
    DimensionTooLowForSpherical {
        /// The rejected dimension.
        dimension: usize,
    },

    /// The host could not extend the relation or allocate a working-memory context (ANNIDX-007).
    #[error("[ANNIDX-007] resource exhausted: {0}")]
    ResourceExhausted(String),

    /// On-disk structure failed an internal invariant: bad magic/version, failed
    /// item insertion, or a posting pointing at an unknown list (ANNIDX-008).
    #[error("[ANNIDX-008] corrupt on-disk structure in relation '{relation}': {detail}")]
    Corrupt {
        /// Name of the relation the corruption was found in.
        relation: String,
        /// What invariant failed.
        detail: String,
    },

    /// A parallel build worker could not be launched (ANNIDX-009).
    ///
    /// Never returned to a caller: the build path catches this internally and
    /// falls back to a serial scan (§7). Retained as a variant purely so the
    /// fallback path has something concrete to log at `warn`.
    #[error("[ANNIDX-009] worker launch failed: {0}")]
    WorkerLaunchFailed(String),

    /// The operation was cancelled at an interrupt checkpoint (ANNIDX-010).
    #[error("[ANNIDX-010] operation cancelled")]
    Cancelled,

    /// Underlying I/O failure (ANNIDX-011).
    #[error("[ANNIDX-011] I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Page (de)serialization failure (ANNIDX-012).
    #[error("[ANNIDX-012] serialization error: {0}")]
    Serialization(String),

    /// An invariant that should be impossible to violate was violated anyway (ANNIDX-013).
    #[error("[ANNIDX-013] internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code (e.g. `"ANNIDX-001"`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "ANNIDX-001",
            Self::UnsupportedVectorType(_) => "ANNIDX-002",
            Self::ZeroVector => "ANNIDX-003",
            Self::NonFiniteNorm => "ANNIDX-004",
            Self::OptionOutOfRange { .. } => "ANNIDX-005",
            Self::DimensionTooLowForSpherical { .. } => "ANNIDX-006",
            Self::ResourceExhausted(_) => "ANNIDX-007",
            Self::Corrupt { .. } => "ANNIDX-008",
            Self::WorkerLaunchFailed(_) => "ANNIDX-009",
            Self::Cancelled => "ANNIDX-010",
            Self::Io(_) => "ANNIDX-011",
            Self::Serialization(_) => "ANNIDX-012",
            Self::Internal(_) => "ANNIDX-013",
        }
    }

    /// Returns `true` if the index file remains loadable after this error.
    ///
    /// Only corruption and resource exhaustion are treated as fatal to the
    /// current operation's on-disk consistency; everything else aborts
    /// cleanly (§7).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corrupt { .. } | Self::ResourceExhausted(_))
    }
}
