//! Append-only string store: owns the canonical bytes of every distinct record in
//! page-aligned, file-backed slabs, addressed by compact [`Handle`]s.

use crate::error::DedupError;
use crate::types::Handle;
use crate::utils::config::StoreConsts;
use crate::utils::tempdir::{ensure_dir, remove_dir_best_effort};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// One page-aligned, file-backed, fixed-size region. Records are appended as
/// `record-bytes, '\n'`; `used` is the bump pointer.
struct Slab {
    mmap: MmapMut,
    used: usize,
    path: PathBuf,
}

impl Slab {
    fn create(dir: &Path, index: u32, slab_bytes: usize) -> Result<Self, DedupError> {
        let path = dir.join(format!("{index:012}"));
        let mut open_opts = OpenOptions::new();
        open_opts.read(true).write(true).create(true).truncate(true);
        #[cfg(unix)]
        open_opts.mode(0o600);

        let file = open_opts
            .open(&path)
            .map_err(|source| DedupError::OpenFailed { path: path.clone(), source })?;
        file.set_len(slab_bytes as u64)
            .map_err(|source| DedupError::MapFailed { path: path.clone(), source })?;

        // SAFETY: this slab file is exclusively owned by this `Store` instance; no other
        // process or mapping touches it concurrently.
        let mmap = unsafe { MmapMut::map_mut(&file) }
            .map_err(|source| DedupError::MapFailed { path: path.clone(), source })?;
        // `file`'s descriptor is closed here; the mapping remains valid independent of it.

        Ok(Slab { mmap, used: 0, path })
    }
}

/// Owns every distinct record's canonical bytes across one or more slabs. New slabs are
/// created on demand; `store()` is the only mutating operation and is serialized by a
/// store-wide lock, while `get()`/`record_eq()` take a shared read lock so concurrent
/// duplicate checks across different shards never block on each other.
pub struct Store {
    dir: PathBuf,
    slab_bytes: usize,
    slabs: RwLock<Vec<Slab>>,
}

impl Store {
    /// Create (or reuse) `temp_dir` as this store's exclusive working directory.
    pub fn new(temp_dir: &Path) -> Result<Self, DedupError> {
        ensure_dir(temp_dir)?;
        let slab_bytes = StoreConsts::SLAB_PAGES * crate::utils::page_size();
        Ok(Self {
            dir: temp_dir.to_path_buf(),
            slab_bytes,
            slabs: RwLock::new(Vec::new()),
        })
    }

    /// Append `bytes` (plus a trailing `'\n'`) to the tail slab, creating a new one first
    /// if it doesn't fit. Fails with [`DedupError::TooLarge`] if `bytes` alone cannot fit
    /// in an empty slab.
    pub fn store(&self, bytes: &[u8]) -> Result<Handle, DedupError> {
        let len = bytes.len();
        if len + 1 > self.slab_bytes {
            return Err(DedupError::TooLarge { len, limit: self.slab_bytes - 1 });
        }

        let mut slabs = self.slabs.write().unwrap();
        let needs_new_slab = match slabs.last() {
            Some(tail) => tail.used + len + 1 > self.slab_bytes,
            None => true,
        };
        if needs_new_slab {
            let index = slabs.len() as u32;
            slabs.push(Slab::create(&self.dir, index, self.slab_bytes)?);
        }

        let slab_index = (slabs.len() - 1) as u32;
        let tail = slabs.last_mut().expect("slab just ensured to exist");
        let offset = tail.used;
        tail.mmap[offset..offset + len].copy_from_slice(bytes);
        tail.mmap[offset + len] = b'\n';
        tail.used += len + 1;

        Ok(Handle::new(slab_index, offset as u32))
    }

    /// Return a copy of the bytes addressed by `handle`, up to (not including) the next
    /// `'\n'`. O(record length). Prefer [`Store::record_eq`] on the hot path — it avoids
    /// the allocation this performs.
    pub fn get(&self, handle: Handle) -> Vec<u8> {
        let slabs = self.slabs.read().unwrap();
        let slab = &slabs[handle.slab_index as usize];
        let start = handle.byte_offset as usize;
        let region = &slab.mmap[start..slab.used];
        let end = region
            .iter()
            .position(|&b| b == b'\n')
            .expect("handle must address a stored record terminated by '\\n'");
        region[..end].to_vec()
    }

    /// Compare the record addressed by `handle` against `bytes` without allocating.
    pub fn record_eq(&self, handle: Handle, bytes: &[u8]) -> bool {
        let slabs = self.slabs.read().unwrap();
        let slab = &slabs[handle.slab_index as usize];
        let start = handle.byte_offset as usize;
        let end = start + bytes.len();
        if end >= slab.used {
            return false;
        }
        slab.mmap[start..end] == *bytes && slab.mmap[end] == b'\n'
    }

    /// Write every live record, in slab order then insertion order, to `writer`.
    pub fn dump<W: Write>(&self, writer: &mut W) -> Result<(), DedupError> {
        let slabs = self.slabs.read().unwrap();
        for slab in slabs.iter() {
            writer
                .write_all(&slab.mmap[..slab.used])
                .map_err(|source| DedupError::OpenFailed { path: slab.path.clone(), source })?;
        }
        Ok(())
    }

    /// Number of slabs currently allocated. Exposed for tests and diagnostics.
    pub fn slab_count(&self) -> usize {
        self.slabs.read().unwrap().len()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Slabs unmap themselves via `MmapMut`'s own `Drop`; only the directory tree (and
        // the now-unmapped slab files within it) remain to be reaped.
        self.slabs.write().unwrap().clear();
        remove_dir_best_effort(&self.dir);
    }
}
