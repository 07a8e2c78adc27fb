//! The two index engines: HNSW (§4) and IVFFlat (§5).

pub mod hnsw;
pub mod ivfflat;
