//! Typed error taxonomy. Internal code returns `Result<T, DedupError>`; the process
//! boundary (`main`) converts into `anyhow::Result` for rich context chains and picks an
//! exit code from the error's kind.

use std::fmt;
use std::path::PathBuf;

/// The kinds of fatal error this crate can raise.
#[derive(Debug)]
pub enum DedupError {
    /// Wrong argument count or otherwise malformed invocation. Reserved: clap handles
    /// argument-count/usage errors itself before this crate is ever called, so nothing
    /// here constructs this variant today; it stays available for a library caller that
    /// wants to report a usage problem without going through clap.
    Usage(String),
    /// Could not open an input file, create the output file, or create a slab file.
    OpenFailed { path: PathBuf, source: std::io::Error },
    /// `mmap`/`ftruncate` (or the Windows/other-platform equivalent) failed.
    MapFailed { path: PathBuf, source: std::io::Error },
    /// A bookkeeping allocation (slab list, range list) failed. Reserved: no fallible-
    /// allocation path is wired up in this crate; a genuine allocation failure aborts
    /// the process like everywhere else here, so nothing constructs this variant today.
    AllocFailed(String),
    /// A single record exceeds `SLAB_BYTES - 1` bytes and cannot be stored.
    TooLarge { len: usize, limit: usize },
    /// `size_hint` is not a whole multiple of the system page size.
    BadSizeHintAlignment { size_hint: u64, page_size: usize },
    /// A record exceeds one block window with no newline found. Reserved: the block
    /// scanner widens its window instead of raising this, so it is never constructed
    /// today.
    LongLineInInput { path: PathBuf },
}

impl fmt::Display for DedupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupError::Usage(msg) => write!(f, "usage error: {msg}"),
            DedupError::OpenFailed { path, source } => {
                write!(f, "failed to open {}: {source}", path.display())
            }
            DedupError::MapFailed { path, source } => {
                write!(f, "failed to map {}: {source}", path.display())
            }
            DedupError::AllocFailed(what) => write!(f, "allocation failed: {what}"),
            DedupError::TooLarge { len, limit } => {
                write!(f, "record of {len} bytes exceeds the {limit}-byte slab limit")
            }
            DedupError::BadSizeHintAlignment { size_hint, page_size } => write!(
                f,
                "size_hint {size_hint} is not a multiple of the page size {page_size}"
            ),
            DedupError::LongLineInInput { path } => {
                write!(f, "line in {} exceeds one block window", path.display())
            }
        }
    }
}

impl std::error::Error for DedupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DedupError::OpenFailed { source, .. } | DedupError::MapFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl DedupError {
    /// Process exit code for this error kind: usage errors get 2, everything else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            DedupError::Usage(_) => 2,
            _ => 1,
        }
    }
}
