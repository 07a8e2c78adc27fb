//! Generic-WAL bracketing (§4.5, §4.9): every multi-page mutation is wrapped
//! in a bracket so a crash mid-mutation leaves the relation at either the
//! pre- or post-image, never a torn state.
//!
//! The real write-ahead log belongs to the host (it already has one); this
//! module models the bracket contract a host's generic-WAL API exposes, plus
//! an in-process implementation for the standalone harness and tests.

use crate::storage::page::{BlockNumber, Page};
use parking_lot::Mutex;
use tracing::debug;

/// One buffered page image registered inside a WAL bracket.
struct Registered {
    blkno: BlockNumber,
    image: Page,
}

/// A generic-WAL write-ahead log. The host provides the real thing; tests
/// and the standalone binary use [`InMemoryWal`].
pub trait GenericWal: Send + Sync {
    /// Opens a bracket. Returns an opaque bracket id used by `commit`.
    fn begin(&self) -> u64;
    /// Registers a page's full image as part of the bracket's redo record.
    fn register(&self, bracket: u64, blkno: BlockNumber, image: &Page);
    /// Commits the bracket, making it durable before any of its pages may be
    /// evicted.
    fn commit(&self, bracket: u64);
}

/// An in-memory WAL used by the standalone harness and tests. Keeps the last
/// `capacity` brackets' redo records so crash-recovery tests can replay them;
/// real durability is out of scope for this implementation.
pub struct InMemoryWal {
    next_bracket: Mutex<u64>,
    log: Mutex<Vec<(u64, Vec<(BlockNumber, Page)>)>>,
}

impl InMemoryWal {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_bracket: Mutex::new(1),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Returns the committed redo records, oldest first.
    #[must_use]
    pub fn committed_records(&self) -> Vec<(u64, Vec<(BlockNumber, Page)>)> {
        self.log.lock().clone()
    }
}

impl Default for InMemoryWal {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericWal for InMemoryWal {
    fn begin(&self) -> u64 {
        let mut next = self.next_bracket.lock();
        let id = *next;
        *next += 1;
        debug!(bracket = id, "wal bracket opened");
        id
    }

    fn register(&self, bracket: u64, blkno: BlockNumber, image: &Page) {
        let mut log = self.log.lock();
        match log.iter_mut().find(|(id, _)| *id == bracket) {
            Some((_, pages)) => pages.push((blkno, image.clone())),
            None => log.push((bracket, vec![(blkno, image.clone())])),
        }
    }

    fn commit(&self, bracket: u64) {
        debug!(bracket, "wal bracket committed");
    }
}

/// RAII-style bracket: opens on construction, commits on drop unless
/// explicitly aborted. Mirrors the "open bracket, perform mutations, commit
/// last" shape used by the concurrent insert protocol (§4.5).
pub struct WalBracket<'a> {
    wal: &'a dyn GenericWal,
    id: u64,
    committed: bool,
}

impl<'a> WalBracket<'a> {
    /// Opens a new bracket against `wal`.
    #[must_use]
    pub fn open(wal: &'a dyn GenericWal) -> Self {
        Self {
            wal,
            id: wal.begin(),
            committed: false,
        }
    }

    /// Registers a page image as part of this bracket.
    pub fn register(&self, blkno: BlockNumber, image: &Page) {
        self.wal.register(self.id, blkno, image);
    }

    /// Commits the bracket. Idempotent; a `Drop` after `commit` is a no-op.
    pub fn commit(mut self) {
        self.wal.commit(self.id);
        self.committed = true;
    }
}

impl Drop for WalBracket<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.wal.commit(self.id);
        }
    }
}
