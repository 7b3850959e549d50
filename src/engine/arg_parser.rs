//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Deduplicate line-delimited records across one or more large input files.
#[derive(Clone, Parser)]
#[command(name = "pw-dedup")]
#[command(about = "Parallel, memory-mapped line deduplication.")]
pub struct Cli {
    /// Path to write the deduplicated output to.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// One or more input files to deduplicate across.
    #[arg(value_name = "INPUT", num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Worker thread count. Default: detected logical CPU count.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Block-stream size hint in bytes. Must be a multiple of the system page size.
    /// Default: 512 pages.
    #[arg(long, short = 's')]
    pub size_hint: Option<u64>,

    /// Directory for the string store's backing slab files. Default: `./.pw-dedup-temp`.
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Emit progress to stderr and raise the log level.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl From<&Cli> for crate::types::DedupOpts {
    fn from(cli: &Cli) -> Self {
        crate::types::DedupOpts {
            threads: cli.threads,
            size_hint: cli.size_hint,
            temp_dir: cli.temp_dir.clone(),
            verbose: cli.verbose,
        }
    }
}
