//! Tuning constants and package-derived paths, collected in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived paths: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    default_temp_dir_name: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache paths from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                default_temp_dir_name: format!("./.{pkg}-temp"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Default temp directory, relative to the process's current directory.
    pub fn default_temp_dir_name(&self) -> &str {
        &self.default_temp_dir_name
    }
}

// ---- Store / slab sizing ----

/// Store and slab tuning. `SLAB_BYTES` is expressed as a multiple of the system page size.
pub struct StoreConsts;

impl StoreConsts {
    /// Slab size in pages. Each slab is a page-aligned, file-backed region this many pages long.
    pub const SLAB_PAGES: usize = 64;
}

// ---- Sharded set sizing ----

/// Sharded-set tuning.
pub struct SetConsts;

impl SetConsts {
    /// Number of chains in the set. Must be a power of two; shard selection is `hash &
    /// (SHARD_COUNT - 1)`, a bitmask rather than a division.
    pub const SHARD_COUNT: usize = 1 << 20;
}

// ---- Block stream sizing ----

/// Block-stream tuning.
pub struct BlockStreamConsts;

impl BlockStreamConsts {
    /// Default `size_hint` in pages, used when `--size-hint` is not given.
    pub const DEFAULT_SIZE_HINT_PAGES: usize = 512;
    /// Hard ceiling on worker thread count regardless of detected CPU count.
    pub const MAX_WORKERS: usize = 256;
}

// ---- Progress ----

/// Progress-reporting tuning.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Records processed between progress-bar updates (amortizes lock contention).
    pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 4096;
}
