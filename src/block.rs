//! Block stream: turns a list of input files into a mutex-serialized stream of
//! memory-mapped, line-aligned `Block` values that parallel workers pull from.

use crate::error::DedupError;
use memmap2::Mmap;
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A read-only, page-aligned mapping over a line-aligned sub-range of one input file.
///
/// `text()` is the sub-slice covering whole records only; the surrounding page-alignment
/// padding (if any) is never exposed. Dropping a `Block` releases its mapping; there is no
/// separate `unmap()` call to forget.
pub struct Block {
    mmap: Mmap,
    offset_diff: usize,
    len: usize,
}

impl Block {
    /// The line-aligned bytes this block covers.
    pub fn text(&self) -> &[u8] {
        &self.mmap[self.offset_diff..self.offset_diff + self.len]
    }
}

struct CurrentFile {
    file: File,
    path: PathBuf,
    ranges: VecDeque<(u64, u64)>,
}

struct StreamState {
    next_path_idx: usize,
    current: Option<CurrentFile>,
}

/// A thread-safe producer of [`Block`]s across one or more input files, in file-listed
/// order and increasing offset within each file. Call [`BlockStream::next_block`] from any
/// number of worker threads; each call is serialized by an internal mutex.
pub struct BlockStream {
    paths: Vec<PathBuf>,
    size_hint: u64,
    page_size: usize,
    state: Mutex<StreamState>,
}

impl BlockStream {
    /// Construct a stream over `paths` with the given `size_hint` (bytes). `size_hint` must
    /// be a whole multiple of the system page size.
    pub fn new(paths: Vec<PathBuf>, size_hint: u64) -> Result<Self, DedupError> {
        let page_size = crate::utils::page_size();
        if size_hint == 0 || size_hint % page_size as u64 != 0 {
            return Err(DedupError::BadSizeHintAlignment { size_hint, page_size });
        }
        Ok(Self {
            paths,
            size_hint,
            page_size,
            state: Mutex::new(StreamState { next_path_idx: 0, current: None }),
        })
    }

    /// Return the next block, or `None` once every input file is exhausted.
    pub fn next_block(&self) -> Result<Option<Block>, DedupError> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(cur) = state.current.as_mut() {
                if let Some((offset, len)) = cur.ranges.pop_front() {
                    let block = map_block(&cur.file, &cur.path, offset, len, self.page_size)?;
                    return Ok(Some(block));
                }
                state.current = None;
            }

            if state.next_path_idx >= self.paths.len() {
                return Ok(None);
            }
            let path = self.paths[state.next_path_idx].clone();
            state.next_path_idx += 1;

            let file = File::open(&path).map_err(|source| DedupError::OpenFailed {
                path: path.clone(),
                source,
            })?;
            let file_len = file
                .metadata()
                .map_err(|source| DedupError::OpenFailed { path: path.clone(), source })?
                .len();
            let ranges = scan_ranges(&file, &path, file_len, self.size_hint, self.page_size)?;
            state.current = Some(CurrentFile { file, path, ranges });
        }
    }
}

/// Map `[start, start+len)` of `file` read-only, rounding the start down to a page boundary,
/// and wrap it as a [`Block`] exposing only `text()`.
fn map_block(
    file: &File,
    path: &Path,
    start: u64,
    len: u64,
    page_size: usize,
) -> Result<Block, DedupError> {
    let offset_diff = (start % page_size as u64) as usize;
    let map_start = start - offset_diff as u64;
    let map_len = offset_diff + len as usize;

    // SAFETY: the mapped file is not concurrently truncated by this process; other
    // processes mutating it concurrently is outside this tool's contract (batch job over a
    // stable corpus).
    let mmap = unsafe {
        memmap2::MmapOptions::new()
            .offset(map_start)
            .len(map_len)
            .map(file)
    }
    .map_err(|source| DedupError::MapFailed { path: path.to_path_buf(), source })?;

    Ok(Block { mmap, offset_diff, len: len as usize })
}

/// Scan `file` (length `file_len`) into line-aligned `(offset, length)` ranges, each no
/// longer than `size_hint` unless a single line forces a range to grow past it: when no
/// newline is found within the current window, the window doubles and the scan retries
/// rather than failing.
fn scan_ranges(
    file: &File,
    path: &Path,
    file_len: u64,
    size_hint: u64,
    page_size: usize,
) -> Result<VecDeque<(u64, u64)>, DedupError> {
    let mut ranges = VecDeque::new();
    let mut start = 0u64;

    while start < file_len {
        let mut window_end = (start + size_hint).min(file_len);
        let range_end = loop {
            if window_end >= file_len {
                break file_len;
            }
            let probe_len = window_end - start;
            let probe = map_block(file, path, start, probe_len, page_size)?;
            if let Some(rel) = probe.text().iter().rposition(|&b| b == b'\n') {
                break start + rel as u64 + 1;
            }
            // No newline in this window: widen and retry (released when `probe` drops).
            window_end = (window_end + size_hint).min(file_len);
        };
        ranges.push_back((start, range_end - start));
        start = range_end;
    }

    Ok(ranges)
}
