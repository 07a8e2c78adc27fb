//! Concrete vector containers (§3).
//!
//! A [`Vector`] is an immutable, length-prefixed array of one concrete
//! element type. Dimensionality is fixed per index and carried alongside
//! the data rather than inferred, since a packed bit-vector's byte length
//! is not its dimension.

use half::f16;
use serde::{Deserialize, Serialize};

/// A vector's concrete on-disk representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Vector {
    /// Dense single-precision floats.
    F32(Vec<f32>),
    /// Dense half-precision floats.
    F16(Vec<f16>),
    /// Packed bits, most-significant-bit first within each byte.
    Bit {
        /// Declared dimension (may be less than `packed.len() * 8`).
        dim: usize,
        /// `ceil(dim / 8)` bytes.
        packed: Vec<u8>,
    },
}

impl Vector {
    /// Returns the declared dimensionality.
    #[must_use]
    pub fn dimension(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F16(v) => v.len(),
            Self::Bit { dim, .. } => *dim,
        }
    }

    /// Returns the on-disk item size in bytes for this vector's data.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self {
            Self::F32(v) => v.len() * 4,
            Self::F16(v) => v.len() * 2,
            Self::Bit { packed, .. } => packed.len(),
        }
    }

    /// `true` if every element is exactly zero (the cosine/spherical rejection case, §4.1).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::F32(v) => v.iter().all(|x| *x == 0.0),
            Self::F16(v) => v.iter().all(|x| *x == f16::ZERO),
            Self::Bit { packed, .. } => packed.iter().all(|b| *b == 0),
        }
    }

    /// Converts to an owned `f64` slice for metric computation. Not defined
    /// for bit-vectors, which compute Hamming distance directly on bytes.
    #[must_use]
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            Self::F32(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            Self::F16(v) => Some(v.iter().map(|x| f64::from(x.to_f32())).collect()),
            Self::Bit { .. } => None,
        }
    }

    /// Builds a bit-vector from a dimension and packed bytes.
    #[must_use]
    pub fn bit_from_packed(dim: usize, packed: Vec<u8>) -> Self {
        Self::Bit { dim, packed }
    }
}

/// Packs a boolean bit iterator into big-endian-within-byte bytes, as used by
/// the `Bit` vector's `packed` field.
#[must_use]
pub fn pack_bits<I: IntoIterator<Item = bool>>(bits: I) -> Vec<u8> {
    let mut out = Vec::new();
    let mut current = 0u8;
    let mut count = 0u8;
    for bit in bits {
        current = (current << 1) | u8::from(bit);
        count += 1;
        if count == 8 {
            out.push(current);
            current = 0;
            count = 0;
        }
    }
    if count > 0 {
        current <<= 8 - count;
        out.push(current);
    }
    out
}

/// Unpacks `dim` bits from packed bytes, most-significant-bit first.
#[must_use]
pub fn unpack_bits(dim: usize, packed: &[u8]) -> Vec<bool> {
    (0..dim)
        .map(|i| {
            let byte = packed[i / 8];
            let shift = 7 - (i % 8);
            (byte >> shift) & 1 == 1
        })
        .collect()
}
