//! Sharded concurrent set: decides, for each record, whether it is novel (store it) or a
//! duplicate (do nothing), with at-most-once insertion semantics under parallel workers.

use crate::error::DedupError;
use crate::store::Store;
use crate::types::Handle;
use crate::utils::config::SetConsts;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One bucket of the set: an insertion-ordered list of `(hash, handle)` pairs behind its
/// own mutex. Entries are never removed.
#[derive(Default)]
struct Chain {
    entries: Mutex<Vec<(u32, Handle)>>,
}

/// A fixed-width array of mutex-protected hash chains over a borrowed [`Store`]. The set
/// holds no bytes itself — only hashes and handles — so it never outlives the store it
/// borrows from.
pub struct Set<'store> {
    chains: Vec<Chain>,
    mask: usize,
    store: &'store Store,
    distinct: AtomicUsize,
}

impl<'store> Set<'store> {
    /// Build a set with [`SetConsts::SHARD_COUNT`] chains over `store`.
    pub fn new(store: &'store Store) -> Self {
        let shard_count = SetConsts::SHARD_COUNT;
        debug_assert!(shard_count.is_power_of_two());
        Self {
            chains: (0..shard_count).map(|_| Chain::default()).collect(),
            mask: shard_count - 1,
            store,
            distinct: AtomicUsize::new(0),
        }
    }

    /// Look up `bytes`; insert it if novel. Returns `true` if this call inserted it,
    /// `false` if it was already present (a duplicate).
    pub fn add(&self, bytes: &[u8]) -> Result<bool, DedupError> {
        let hash = crc32fast::hash(bytes);
        let chain = &self.chains[hash as usize & self.mask];
        let mut entries = chain.entries.lock().unwrap();

        for &(entry_hash, handle) in entries.iter() {
            if entry_hash == hash && self.store.record_eq(handle, bytes) {
                return Ok(false);
            }
        }

        let handle = self.store.store(bytes)?;
        entries.push((hash, handle));
        self.distinct.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Number of distinct records inserted so far.
    pub fn distinct_count(&self) -> usize {
        self.distinct.load(Ordering::Relaxed)
    }
}
