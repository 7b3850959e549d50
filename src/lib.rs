//! pw-dedup: parallel, memory-mapped deduplication of line-delimited records across one or
//! more large input files.
//!
//! Three subsystems do the hard work: [`block`] walks the inputs as mmap'd, line-aligned
//! windows; [`store`] owns the canonical bytes of every distinct record in page-aligned
//! slabs; [`set`] maps a record's hash to one of a fixed number of mutex-guarded chains and
//! performs lookup-or-insert. [`engine::driver::run`] ties them together: one worker thread
//! per logical CPU pulls blocks, tokenizes by newline, and feeds records to the set; after
//! all workers join, the store is dumped to the output file.
//!
//! [`dedup_paths`] is the library entry point; the `pw-dedup` binary is a thin CLI over it.

pub mod block;
pub mod engine;
pub mod error;
pub mod set;
pub mod store;
pub mod types;
pub mod utils;

pub use error::DedupError;
pub use types::{DedupOpts, RunStats};

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Deduplicate line-delimited records across `inputs`, writing the result to `output`.
///
/// This is the library-facing entry point; see `main.rs` for the CLI wrapper that adds
/// argument parsing, logging setup, and exit-code mapping.
pub fn dedup_paths(
    inputs: &[PathBuf],
    output: &Path,
    opts: &DedupOpts,
) -> anyhow::Result<RunStats> {
    engine::run(inputs, output, opts)
        .map_err(anyhow::Error::from)
        .with_context(|| format!("deduplicating into {}", output.display()))
}
