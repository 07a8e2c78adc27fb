//! Per-opclass distance, norm and k-means normalization (§4.1, §9).
//!
//! Every index is opened against one [`OpClass`], which binds a
//! [`DistanceKind`] to the element type it accepts and its spherical
//! behavior. This mirrors the vtable dispatch a host would do per access
//! method: the index core never hard-codes a metric, it asks the opclass.

use crate::error::{Error, Result};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// The distance family computed between two vectors of the same opclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceKind {
    /// Squared Euclidean distance. No `sqrt`: ordering is preserved without it,
    /// and every caller here only needs relative order.
    L2,
    /// Negative inner product, so that "smaller is closer" holds uniformly.
    NegativeInnerProduct,
    /// `1 - cosine_similarity`. Undefined for a zero vector.
    Cosine,
    /// Hamming distance over packed bits.
    Hamming,
}

/// Binds a [`DistanceKind`] to the element type and dimensionality it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpClass {
    /// Which distance this opclass computes.
    pub kind: DistanceKind,
    /// `true` if this opclass normalizes vectors onto the unit sphere before
    /// indexing (cosine opclasses only).
    pub spherical: bool,
    /// Largest dimensionality this opclass will accept.
    pub max_dimensions: usize,
}

impl OpClass {
    /// The `l2` opclass: squared Euclidean, dense floats, up to 16000 dims.
    #[must_use]
    pub const fn l2(max_dimensions: usize) -> Self {
        Self {
            kind: DistanceKind::L2,
            spherical: false,
            max_dimensions,
        }
    }

    /// The `ip` opclass: negative inner product, for maximum inner product search.
    #[must_use]
    pub const fn inner_product(max_dimensions: usize) -> Self {
        Self {
            kind: DistanceKind::NegativeInnerProduct,
            spherical: false,
            max_dimensions,
        }
    }

    /// The `cosine` opclass: spherical, rejects zero vectors.
    #[must_use]
    pub const fn cosine(max_dimensions: usize) -> Self {
        Self {
            kind: DistanceKind::Cosine,
            spherical: true,
            max_dimensions,
        }
    }

    /// The `hamming` opclass: bit-vectors only.
    #[must_use]
    pub const fn hamming(max_dimensions: usize) -> Self {
        Self {
            kind: DistanceKind::Hamming,
            spherical: false,
            max_dimensions,
        }
    }

    /// Validates a vector against this opclass's dimension cap and element
    /// type before it is handed to `distance`/`kmeans_norm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVectorType`] if `kind` is `Hamming` but
    /// `vector` isn't a `Bit`, or vice versa, and [`Error::DimensionTooLowForSpherical`]
    /// if `spherical` is set and the dimension is below 2.
    pub fn validate(&self, vector: &Vector) -> Result<()> {
        match (self.kind, vector) {
            (DistanceKind::Hamming, Vector::Bit { .. }) => {}
            (DistanceKind::Hamming, other) => {
                return Err(Error::UnsupportedVectorType(format!(
                    "hamming opclass requires a bit vector, got {other:?}"
                )))
            }
            (_, Vector::Bit { .. }) => {
                return Err(Error::UnsupportedVectorType(
                    "bit vectors require the hamming opclass".to_string(),
                ))
            }
            _ => {}
        }
        if vector.dimension() > self.max_dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.max_dimensions,
                actual: vector.dimension(),
            });
        }
        if self.spherical && vector.dimension() < 2 {
            return Err(Error::DimensionTooLowForSpherical {
                dimension: vector.dimension(),
            });
        }
        Ok(())
    }

    /// Computes the distance between two vectors of matching dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `a` and `b` differ in length,
    /// or [`Error::ZeroVector`] if `kind` is `Cosine` and either input is zero.
    pub fn distance(&self, a: &Vector, b: &Vector) -> Result<f64> {
        if a.dimension() != b.dimension() {
            return Err(Error::DimensionMismatch {
                expected: a.dimension(),
                actual: b.dimension(),
            });
        }
        match self.kind {
            DistanceKind::L2 => {
                let (a, b) = as_f64_pair(a, b)?;
                Ok(a.iter().zip(&b).map(|(x, y)| (x - y).powi(2)).sum())
            }
            DistanceKind::NegativeInnerProduct => {
                let (a, b) = as_f64_pair(a, b)?;
                Ok(-a.iter().zip(&b).map(|(x, y)| x * y).sum::<f64>())
            }
            DistanceKind::Cosine => {
                if a.is_zero() || b.is_zero() {
                    return Err(Error::ZeroVector);
                }
                let (a, b) = as_f64_pair(a, b)?;
                let dot: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
                Ok(1.0 - dot / (norm_a * norm_b))
            }
            DistanceKind::Hamming => {
                let (Vector::Bit { dim, packed: pa }, Vector::Bit { packed: pb, .. }) = (a, b)
                else {
                    return Err(Error::UnsupportedVectorType(
                        "hamming distance requires bit vectors".to_string(),
                    ));
                };
                let mut bits_differing = 0u32;
                for (xa, xb) in pa.iter().zip(pb.iter()) {
                    bits_differing += (xa ^ xb).count_ones();
                }
                let _ = dim;
                Ok(f64::from(bits_differing))
            }
        }
    }

    /// Returns the L2 norm of `vector`, or `None` for opclasses (e.g.
    /// `Hamming`) that have no norm concept.
    #[must_use]
    pub fn norm(&self, vector: &Vector) -> Option<f64> {
        match self.kind {
            DistanceKind::Hamming => None,
            _ => vector
                .as_f64()
                .map(|v| v.iter().map(|x| x * x).sum::<f64>().sqrt()),
        }
    }

    /// Normalizes `vector` onto the unit sphere for spherical (cosine)
    /// opclasses. Non-spherical opclasses return the vector unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteNorm`] if the norm is zero, subnormal, or
    /// non-finite.
    pub fn kmeans_norm(&self, vector: &Vector) -> Result<Vector> {
        if !self.spherical {
            return Ok(vector.clone());
        }
        let values = vector
            .as_f64()
            .ok_or_else(|| Error::UnsupportedVectorType("spherical norm needs a float vector".to_string()))?;
        let norm = values.iter().map(|x| x * x).sum::<f64>().sqrt();
        if !norm.is_finite() || norm < f64::MIN_POSITIVE {
            return Err(Error::NonFiniteNorm);
        }
        let normalized: Vec<f32> = values.iter().map(|x| (x / norm) as f32).collect();
        Ok(Vector::F32(normalized))
    }

    /// On-disk item size in bytes for a vector of this opclass's dimension.
    #[must_use]
    pub const fn item_size(&self, dimensions: usize) -> usize {
        match self.kind {
            DistanceKind::Hamming => dimensions.div_ceil(8),
            _ => dimensions * 4,
        }
    }
}

fn as_f64_pair(a: &Vector, b: &Vector) -> Result<(Vec<f64>, Vec<f64>)> {
    let a = a
        .as_f64()
        .ok_or_else(|| Error::UnsupportedVectorType("expected a float vector".to_string()))?;
    let b = b
        .as_f64()
        .ok_or_else(|| Error::UnsupportedVectorType("expected a float vector".to_string()))?;
    Ok((a, b))
}
