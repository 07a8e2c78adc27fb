//! The host dispatch contract (§6): the set of operations a host's access
//! method API calls into. A real host binds these to its own planner and
//! executor hooks; [`IndexAccessMethod`] models that boundary as a plain
//! Rust trait so this crate's engines can be exercised end-to-end without
//! one.

use crate::distance::OpClass;
use crate::error::{Error, Result};
use crate::vector::Vector;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One scan result: a row identifier and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanResult {
    /// The matched row's identifier.
    pub tid: u64,
    /// Distance to the query vector.
    pub distance: f64,
}

/// Planner-facing cost estimate for a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    /// Estimated number of rows visited.
    pub visited_rows: f64,
    /// Estimated total page-access cost.
    pub page_cost: f64,
}

/// The operations a host dispatches to an index access method (§6).
pub trait IndexAccessMethod {
    /// Opaque handle to an open scan.
    type Scan;

    /// Builds a new index over every row the host hands it.
    ///
    /// # Errors
    ///
    /// Propagates storage and opclass errors.
    fn build(&mut self, rows: Vec<(u64, Vector)>) -> Result<()>;

    /// Creates an empty index with no rows (used when the host defers the
    /// actual build, e.g. for an unlogged relation on crash recovery).
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    fn buildempty(&mut self) -> Result<()>;

    /// Inserts one row into an already-built index.
    ///
    /// # Errors
    ///
    /// Propagates storage and opclass errors.
    fn insert(&mut self, tid: u64, vector: Vector) -> Result<()>;

    /// Marks rows the host reports as deleted. Returns the number marked.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    fn bulkdelete(&mut self, is_deleted: &dyn Fn(u64) -> bool) -> Result<usize>;

    /// Post-bulkdelete cleanup hook. A no-op for these engines: neither
    /// reclaims page space after a delete sweep, since both keep deleted
    /// elements' pages live as graph/list infrastructure.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    fn vacuumcleanup(&mut self) -> Result<()>;

    /// Estimates scan cost for the planner (§4.10).
    fn costestimate(&self, estimated_rows: usize) -> CostEstimate;

    /// Validates a reloption map before `build` is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::OptionOutOfRange`] for the first
    /// invalid option found.
    fn validate(&self) -> Result<()>;

    /// Opens a new scan for `query`, requesting up to `k` results.
    ///
    /// # Errors
    ///
    /// Propagates storage and opclass errors.
    fn beginscan(&self, query: Vector, k: usize) -> Result<Self::Scan>;

    /// Re-positions an open scan for a new query (reusing the scan handle).
    ///
    /// # Errors
    ///
    /// Propagates storage and opclass errors.
    fn rescan(&self, scan: &mut Self::Scan, query: Vector, k: usize) -> Result<()>;

    /// Returns the next result from an open scan, or `None` when exhausted.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    fn gettuple(&self, scan: &mut Self::Scan) -> Result<Option<ScanResult>>;

    /// Closes a scan. Infallible: scans hold no resources the host needs
    /// notified of beyond dropping the handle.
    fn endscan(&self, scan: Self::Scan);
}

/// A fixed planner constant: the relative cost of a random page fetch vs. a
/// sequential one. Hardcoded here rather than threaded through every
/// `costestimate` call, matching how a host's planner config GUC would be
/// read once per session rather than per call.
const RANDOM_PAGE_COST: f64 = 4.0;
const SEQ_PAGE_COST: f64 = 1.0;

struct FnDeletionCallback<'a>(&'a dyn Fn(u64) -> bool);

impl crate::index::hnsw::DeletionCallback for FnDeletionCallback<'_> {
    fn is_deleted(&self, tid: u64) -> bool {
        (self.0)(tid)
    }
}

/// [`IndexAccessMethod`] over the HNSW engine (§4), holding the open scan
/// state a real host would keep in its scan descriptor: the buffer manager,
/// WAL, lock stripes, and the meta page's current entry point.
pub struct HnswIndexAccessMethod<B: crate::storage::BufferManager> {
    buffer: B,
    wal: Box<dyn crate::storage::GenericWal>,
    locks: crate::index::hnsw::LockStripes,
    opclass: OpClass,
    params: crate::index::hnsw::HnswBuildParams,
    search_params: crate::index::hnsw::SearchParams,
    meta: crate::storage::HnswMeta,
    rng: StdRng,
}

/// An HNSW scan's cursor: results are computed eagerly in `beginscan`, since
/// `KnnSearch` already bounds its own work to `ef_search`/`k` rather than
/// streaming results lazily from the graph.
pub struct HnswScan {
    results: Vec<ScanResult>,
    cursor: usize,
}

impl<B: crate::storage::BufferManager> HnswIndexAccessMethod<B> {
    /// Opens an access method over an empty index with the given opclass and
    /// parameters.
    #[must_use]
    pub fn new(
        buffer: B,
        opclass: OpClass,
        dimensions: u32,
        params: crate::index::hnsw::HnswBuildParams,
        search_params: crate::index::hnsw::SearchParams,
    ) -> Self {
        Self {
            buffer,
            wal: Box::new(crate::storage::InMemoryWal::new()),
            locks: crate::index::hnsw::LockStripes::new(64),
            meta: crate::storage::HnswMeta::new(
                dimensions,
                u16::try_from(params.m).unwrap_or(u16::MAX),
                u16::try_from(params.ef_construction).unwrap_or(u16::MAX),
            ),
            opclass,
            params,
            search_params,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<B: crate::storage::BufferManager> IndexAccessMethod for HnswIndexAccessMethod<B> {
    type Scan = HnswScan;

    fn build(&mut self, rows: Vec<(u64, Vector)>) -> Result<()> {
        for (tid, vector) in rows {
            self.insert(tid, vector)?;
        }
        Ok(())
    }

    fn buildempty(&mut self) -> Result<()> {
        Ok(())
    }

    fn insert(&mut self, tid: u64, vector: Vector) -> Result<()> {
        crate::index::hnsw::insert_element(
            &self.buffer,
            self.wal.as_ref(),
            &self.locks,
            &self.opclass,
            &self.params,
            &mut self.meta,
            tid,
            vector,
            &mut self.rng,
        )?;
        Ok(())
    }

    fn bulkdelete(&mut self, is_deleted: &dyn Fn(u64) -> bool) -> Result<usize> {
        crate::index::hnsw::bulkdelete(&self.buffer, &FnDeletionCallback(is_deleted))
    }

    fn vacuumcleanup(&mut self) -> Result<()> {
        Ok(())
    }

    fn costestimate(&self, estimated_rows: usize) -> CostEstimate {
        CostEstimate {
            visited_rows: crate::index::hnsw::cost::estimate_visited(estimated_rows, &self.params),
            page_cost: crate::index::hnsw::cost::estimate_page_cost(
                estimated_rows,
                &self.params,
                RANDOM_PAGE_COST,
            ),
        }
    }

    fn validate(&self) -> Result<()> {
        crate::index::hnsw::HnswBuildParams::new(self.params.m, self.params.ef_construction)?;
        crate::index::hnsw::SearchParams::new(self.search_params.ef_search)?;
        Ok(())
    }

    fn beginscan(&self, query: Vector, k: usize) -> Result<Self::Scan> {
        let Some(entry) = self.meta.entry else {
            return Ok(HnswScan {
                results: Vec::new(),
                cursor: 0,
            });
        };
        let graph = crate::index::hnsw::HnswGraph::new(&self.buffer, &self.opclass);
        let entry_ptr = crate::storage::ItemPointer::new(entry.blkno, entry.offno);
        let found = graph.knn_search(
            &query,
            k,
            self.search_params.ef_search,
            entry_ptr,
            usize::from(entry.level),
        )?;
        let mut results = Vec::with_capacity(found.len());
        for (ptr, dist) in found {
            let tid = graph.load(ptr)?.tid;
            results.push(ScanResult { tid, distance: dist });
        }
        Ok(HnswScan { results, cursor: 0 })
    }

    fn rescan(&self, scan: &mut Self::Scan, query: Vector, k: usize) -> Result<()> {
        *scan = self.beginscan(query, k)?;
        Ok(())
    }

    fn gettuple(&self, scan: &mut Self::Scan) -> Result<Option<ScanResult>> {
        let next = scan.results.get(scan.cursor).copied();
        if next.is_some() {
            scan.cursor += 1;
        }
        Ok(next)
    }

    fn endscan(&self, _scan: Self::Scan) {}
}

/// [`IndexAccessMethod`] over the IVFFlat engine (§5). `buildempty` can't
/// leave the index truly centroid-less — every scan needs a directory to
/// probe — so it trains `lists` degenerate zero-vector centroids with no
/// posted rows, which a later real `build` replaces.
pub struct IvfflatIndexAccessMethod<B: crate::storage::BufferManager> {
    buffer: B,
    opclass: OpClass,
    dimensions: usize,
    lists: usize,
    probes: usize,
    directory: Option<crate::index::ivfflat::CentroidDirectory>,
    rng: StdRng,
}

/// An IVFFlat scan's cursor, mirroring [`HnswScan`]'s eager-results design.
pub struct IvfflatScan {
    results: Vec<ScanResult>,
    cursor: usize,
}

impl<B: crate::storage::BufferManager> IvfflatIndexAccessMethod<B> {
    /// Opens an access method over an unbuilt index.
    #[must_use]
    pub fn new(buffer: B, opclass: OpClass, dimensions: usize, lists: usize, probes: usize) -> Self {
        Self {
            buffer,
            opclass,
            dimensions,
            lists,
            probes,
            directory: None,
            rng: StdRng::from_entropy(),
        }
    }

    fn directory(&self) -> Result<&crate::index::ivfflat::CentroidDirectory> {
        self.directory
            .as_ref()
            .ok_or_else(|| Error::Internal("ivfflat index scanned before build/buildempty".to_string()))
    }
}

impl<B: crate::storage::BufferManager> IndexAccessMethod for IvfflatIndexAccessMethod<B> {
    type Scan = IvfflatScan;

    fn build(&mut self, rows: Vec<(u64, Vector)>) -> Result<()> {
        let (directory, _) = crate::index::ivfflat::build_index(
            &self.buffer,
            &self.opclass,
            self.lists,
            rows.into_iter(),
            0,
            &mut self.rng,
        )?;
        self.directory = Some(directory);
        Ok(())
    }

    fn buildempty(&mut self) -> Result<()> {
        let placeholder = vec![Vector::F32(vec![0.0; self.dimensions]); self.lists];
        self.directory = Some(crate::index::ivfflat::CentroidDirectory::new(placeholder));
        Ok(())
    }

    fn insert(&mut self, tid: u64, vector: Vector) -> Result<()> {
        let directory = self
            .directory
            .as_mut()
            .ok_or_else(|| Error::Internal("ivfflat index inserted into before build/buildempty".to_string()))?;
        crate::index::ivfflat::insert_row(&self.buffer, &self.opclass, directory, tid, vector)?;
        Ok(())
    }

    fn bulkdelete(&mut self, _is_deleted: &dyn Fn(u64) -> bool) -> Result<usize> {
        // IVFFlat has no per-element tombstone: a deleted row's posting stays
        // in its list and is filtered by the host at the heap-fetch step, so
        // there is nothing for the index itself to mark (§5 carries no
        // vacuum step of its own, unlike HNSW's §4.6).
        Ok(0)
    }

    fn vacuumcleanup(&mut self) -> Result<()> {
        Ok(())
    }

    fn costestimate(&self, estimated_rows: usize) -> CostEstimate {
        let visited = crate::index::ivfflat::cost::estimate_visited(estimated_rows, self.lists, self.probes);
        let index_pages = self.buffer.page_count() as f64;
        let heap_pages = (estimated_rows as f64 / 100.0).max(1.0);
        let fraction_scanned = if self.lists == 0 {
            0.0
        } else {
            self.probes as f64 / self.lists as f64
        };
        let page_cost = crate::index::ivfflat::cost::estimate_page_cost(
            index_pages,
            heap_pages,
            fraction_scanned,
            RANDOM_PAGE_COST,
            SEQ_PAGE_COST,
        );
        CostEstimate {
            visited_rows: visited,
            page_cost,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(1..=32768).contains(&self.lists) {
            return Err(Error::OptionOutOfRange {
                option: "lists",
                value: i64::try_from(self.lists).unwrap_or(i64::MAX),
                min: 1,
                max: 32768,
            });
        }
        if self.probes < 1 || self.probes > self.lists {
            return Err(Error::OptionOutOfRange {
                option: "probes",
                value: i64::try_from(self.probes).unwrap_or(i64::MAX),
                min: 1,
                max: i64::try_from(self.lists).unwrap_or(i64::MAX),
            });
        }
        Ok(())
    }

    fn beginscan(&self, query: Vector, k: usize) -> Result<Self::Scan> {
        let directory = self.directory()?;
        let found = crate::index::ivfflat::scan_index(&self.buffer, &self.opclass, directory, &query, k, self.probes)?;
        let results = found
            .into_iter()
            .map(|(tid, distance)| ScanResult { tid, distance })
            .collect();
        Ok(IvfflatScan { results, cursor: 0 })
    }

    fn rescan(&self, scan: &mut Self::Scan, query: Vector, k: usize) -> Result<()> {
        *scan = self.beginscan(query, k)?;
        Ok(())
    }

    fn gettuple(&self, scan: &mut Self::Scan) -> Result<Option<ScanResult>> {
        let next = scan.results.get(scan.cursor).copied();
        if next.is_some() {
            scan.cursor += 1;
        }
        Ok(next)
    }

    fn endscan(&self, _scan: Self::Scan) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hnsw::{HnswBuildParams, SearchParams};
    use crate::storage::InMemoryBufferManager;

    #[test]
    fn test_hnsw_am_round_trips_build_scan_and_gettuple() {
        let mut am = HnswIndexAccessMethod::new(
            InMemoryBufferManager::new(),
            OpClass::l2(2),
            2,
            HnswBuildParams::new(8, 32).unwrap(),
            SearchParams::new(32).unwrap(),
        );
        am.validate().unwrap();

        let rows = vec![
            (0, Vector::F32(vec![0.0, 0.0])),
            (1, Vector::F32(vec![1.0, 0.0])),
            (2, Vector::F32(vec![0.0, 1.0])),
            (3, Vector::F32(vec![9.0, 9.0])),
        ];
        am.build(rows).unwrap();
        am.insert(4, Vector::F32(vec![0.1, 0.1])).unwrap();

        let mut scan = am.beginscan(Vector::F32(vec![0.0, 0.0]), 2).unwrap();
        let first = am.gettuple(&mut scan).unwrap().expect("scan should have a first result");
        assert!(first.tid == 0 || first.tid == 4, "nearest result should be one of the origin-cluster rows");
        assert!(am.gettuple(&mut scan).unwrap().is_some());
        assert!(am.gettuple(&mut scan).unwrap().is_none(), "scan should exhaust after k results");

        am.rescan(&mut scan, Vector::F32(vec![9.0, 9.0]), 1).unwrap();
        let after_rescan = am.gettuple(&mut scan).unwrap().unwrap();
        assert_eq!(after_rescan.tid, 3);

        let cost = am.costestimate(1000);
        assert!(cost.visited_rows > 0.0);
        assert!(cost.page_cost > 0.0);

        let marked = am.bulkdelete(&|tid| tid == 3).unwrap();
        assert_eq!(marked, 1);
        let closing = am.beginscan(Vector::F32(vec![9.0, 9.0]), 1).unwrap();
        am.endscan(closing);
    }

    #[test]
    fn test_ivfflat_am_round_trips_build_scan_and_gettuple() {
        let mut am = IvfflatIndexAccessMethod::new(InMemoryBufferManager::new(), OpClass::l2(2), 2, 2, 2);
        am.validate().unwrap();

        let rows: Vec<(u64, Vector)> = (0..30)
            .map(|i| {
                let x = if i < 15 { 0.0 } else { 20.0 };
                (i as u64, Vector::F32(vec![x, x]))
            })
            .collect();
        am.build(rows).unwrap();
        am.insert(30, Vector::F32(vec![0.1, 0.1])).unwrap();

        let mut scan = am.beginscan(Vector::F32(vec![0.0, 0.0]), 5).unwrap();
        let mut seen = 0;
        while am.gettuple(&mut scan).unwrap().is_some() {
            seen += 1;
        }
        assert_eq!(seen, 5);

        let cost = am.costestimate(30);
        assert!(cost.visited_rows > 0.0);
        am.endscan(scan);
    }

    #[test]
    fn test_ivfflat_am_buildempty_produces_a_scannable_placeholder() {
        let mut am = IvfflatIndexAccessMethod::new(InMemoryBufferManager::new(), OpClass::l2(2), 2, 4, 2);
        am.buildempty().unwrap();
        let mut scan = am.beginscan(Vector::F32(vec![0.0, 0.0]), 5).unwrap();
        assert!(am.gettuple(&mut scan).unwrap().is_none(), "an empty index has no postings to return");
    }

    #[test]
    fn test_ivfflat_am_validate_rejects_probes_above_lists() {
        let am = IvfflatIndexAccessMethod::new(InMemoryBufferManager::new(), OpClass::l2(2), 2, 2, 5);
        let err = am.validate().unwrap_err();
        assert_eq!(err.code(), "ANNIDX-005");
    }
}
