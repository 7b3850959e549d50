//! Dedup driver: spawns one worker per logical CPU, each pulling blocks from the block
//! stream, tokenizing by newline, and feeding records to the sharded set. Joins workers,
//! then streams the store to the output file.

use crate::block::BlockStream;
use crate::engine::progress::Progress;
use crate::engine::timing::Stopwatch;
use crate::error::DedupError;
use crate::set::Set;
use crate::store::Store;
use crate::types::{DedupOpts, RunStats};
use crate::utils::config::BlockStreamConsts;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Resolve the worker thread count: `opts.threads` if given, otherwise the detected
/// logical CPU count, always capped at [`BlockStreamConsts::MAX_WORKERS`].
fn resolve_thread_count(opts: &DedupOpts) -> usize {
    let detected = opts.threads.unwrap_or_else(|| {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    });
    detected.clamp(1, BlockStreamConsts::MAX_WORKERS)
}

/// Resolve the block-stream `size_hint` in bytes: `opts.size_hint` if given, otherwise
/// 512 pages.
fn resolve_size_hint(opts: &DedupOpts) -> u64 {
    opts.size_hint.unwrap_or_else(|| {
        (BlockStreamConsts::DEFAULT_SIZE_HINT_PAGES * crate::utils::page_size()) as u64
    })
}

/// One worker's loop body: pull blocks until the stream is exhausted, tokenizing each by
/// `'\n'` and feeding non-empty records to `set`. Returns on the first error.
fn worker_loop(
    stream: &BlockStream,
    set: &Set<'_>,
    progress: &Progress,
) -> Result<(), DedupError> {
    while let Some(block) = stream.next_block()? {
        for record in block.text().split(|&b| b == b'\n') {
            if record.is_empty() {
                continue;
            }
            set.add(record)?;
            progress.tick();
        }
    }
    Ok(())
}

/// Run the full dedup pipeline over `inputs`, writing the deduplicated result to `output`.
pub fn run(inputs: &[PathBuf], output: &Path, opts: &DedupOpts) -> Result<RunStats, DedupError> {
    let stopwatch = Stopwatch::start();

    let temp_dir = crate::utils::tempdir::resolve_temp_dir(opts.temp_dir.as_deref());
    log::debug!("using temp directory {}", temp_dir.display());
    let store = Store::new(&temp_dir)?;
    let set = Set::new(&store);

    let size_hint = resolve_size_hint(opts);
    let stream = BlockStream::new(inputs.to_vec(), size_hint)?;

    let num_workers = resolve_thread_count(opts);
    log::debug!("spawning {num_workers} worker(s), size_hint={size_hint} bytes");
    let progress = Progress::new(opts.verbose);
    let first_error: Mutex<Option<DedupError>> = Mutex::new(None);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..num_workers)
            .map(|_| {
                scope.spawn(|| {
                    if let Err(e) = worker_loop(&stream, &set, &progress) {
                        let mut slot = first_error.lock().unwrap();
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            let _ = h.join();
        }
    });

    progress.finish();

    if let Some(e) = first_error.into_inner().unwrap() {
        return Err(e);
    }

    log::debug!("dedup phase done, {} distinct records", set.distinct_count());

    let output_file = File::create(output)
        .map_err(|source| DedupError::OpenFailed { path: output.to_path_buf(), source })?;
    let mut writer = BufWriter::new(output_file);
    store.dump(&mut writer)?;
    std::io::Write::flush(&mut writer)
        .map_err(|source| DedupError::OpenFailed { path: output.to_path_buf(), source })?;

    let stats = RunStats { distinct: set.distinct_count(), elapsed_secs: stopwatch.elapsed_secs() };
    log::info!(
        "wrote {} distinct record(s) to {} in {:.2}s",
        stats.distinct,
        output.display(),
        stats.elapsed_secs
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts_with_temp(temp_dir: &Path) -> DedupOpts {
        DedupOpts {
            threads: Some(4),
            size_hint: None,
            temp_dir: Some(temp_dir.to_path_buf()),
            verbose: false,
        }
    }

    fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn read_output_lines(path: &Path) -> std::collections::BTreeSet<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn dedups_within_a_single_file() {
        let workdir = tempfile::tempdir().unwrap();
        let input = write_input(workdir.path(), "in.txt", "a\nb\na\n");
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let stats = run(&[input], &output, &opts_with_temp(&temp)).unwrap();
        assert_eq!(stats.distinct, 2);
        assert_eq!(
            read_output_lines(&output),
            ["a", "b"].iter().map(|s| s.to_string()).collect()
        );
        assert!(!temp.exists(), "store temp dir should be cleaned up");
    }

    #[test]
    fn dedups_across_multiple_files() {
        let workdir = tempfile::tempdir().unwrap();
        let a = write_input(workdir.path(), "a.txt", "a\nb\n");
        let b = write_input(workdir.path(), "b.txt", "b\nc\n");
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let stats = run(&[a, b], &output, &opts_with_temp(&temp)).unwrap();
        assert_eq!(stats.distinct, 3);
        assert_eq!(
            read_output_lines(&output),
            ["a", "b", "c"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let workdir = tempfile::tempdir().unwrap();
        let input = write_input(workdir.path(), "empty.txt", "");
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let stats = run(&[input], &output, &opts_with_temp(&temp)).unwrap();
        assert_eq!(stats.distinct, 0);
        assert_eq!(std::fs::read(&output).unwrap(), b"");
    }

    #[test]
    fn file_of_only_newlines_produces_empty_output() {
        let workdir = tempfile::tempdir().unwrap();
        let input = write_input(workdir.path(), "blank.txt", "\n\n\n");
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let stats = run(&[input], &output, &opts_with_temp(&temp)).unwrap();
        assert_eq!(stats.distinct, 0);
        assert_eq!(std::fs::read(&output).unwrap(), b"");
    }

    #[test]
    fn utf8_multibyte_lines_are_deduped_by_raw_bytes() {
        let workdir = tempfile::tempdir().unwrap();
        let input = write_input(workdir.path(), "utf8.txt", "\u{3b1}\u{3b2}\n\u{3b1}\u{3b2}\n");
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let stats = run(&[input], &output, &opts_with_temp(&temp)).unwrap();
        assert_eq!(stats.distinct, 1);
        assert_eq!(read_output_lines(&output), ["\u{3b1}\u{3b2}"].iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn high_volume_single_distinct_line_collapses_to_one() {
        let workdir = tempfile::tempdir().unwrap();
        let mut contents = String::new();
        for _ in 0..50_000 {
            contents.push_str("x\n");
        }
        let input = write_input(workdir.path(), "repeat.txt", &contents);
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let stats = run(&[input], &output, &opts_with_temp(&temp)).unwrap();
        assert_eq!(stats.distinct, 1);
        assert_eq!(std::fs::read(&output).unwrap(), b"x\n");
    }

    #[test]
    fn rerunning_with_the_same_inputs_yields_the_same_line_set() {
        let workdir = tempfile::tempdir().unwrap();
        let input = write_input(workdir.path(), "in.txt", "a\nb\na\nc\nb\n");
        let out1 = workdir.path().join("out1.txt");
        let out2 = workdir.path().join("out2.txt");
        run(&[input.clone()], &out1, &opts_with_temp(&workdir.path().join("t1"))).unwrap();
        run(&[input], &out2, &opts_with_temp(&workdir.path().join("t2"))).unwrap();
        assert_eq!(read_output_lines(&out1), read_output_lines(&out2));
    }

    #[test]
    fn feeding_output_back_in_is_a_fixed_point() {
        let workdir = tempfile::tempdir().unwrap();
        let input = write_input(workdir.path(), "in.txt", "a\nb\na\nc\n");
        let output = workdir.path().join("out.txt");
        run(&[input.clone()], &output, &opts_with_temp(&workdir.path().join("t1"))).unwrap();
        let first = read_output_lines(&output);

        let output2 = workdir.path().join("out2.txt");
        run(&[output.clone(), input], &output2, &opts_with_temp(&workdir.path().join("t2"))).unwrap();
        assert_eq!(read_output_lines(&output2), first);
    }

    #[test]
    fn subset_input_pair_matches_the_superset_alone() {
        let workdir = tempfile::tempdir().unwrap();
        let superset = write_input(workdir.path(), "b.txt", "a\nb\nc\na\n");
        let subset = write_input(workdir.path(), "a.txt", "a\nb\n");

        let out_pair = workdir.path().join("pair.txt");
        run(
            &[subset, superset.clone()],
            &out_pair,
            &opts_with_temp(&workdir.path().join("t1")),
        )
        .unwrap();

        let out_alone = workdir.path().join("alone.txt");
        run(&[superset], &out_alone, &opts_with_temp(&workdir.path().join("t2"))).unwrap();

        assert_eq!(read_output_lines(&out_pair), read_output_lines(&out_alone));
    }

    #[test]
    fn record_too_large_for_a_slab_is_a_fatal_error() {
        let workdir = tempfile::tempdir().unwrap();
        let slab_bytes = crate::utils::config::StoreConsts::SLAB_PAGES * crate::utils::page_size();
        let mut contents = "x".repeat(slab_bytes);
        contents.push('\n');
        let input = write_input(workdir.path(), "huge.txt", &contents);
        let output = workdir.path().join("out.txt");
        let temp = workdir.path().join("store-temp");
        let err = run(&[input], &output, &opts_with_temp(&temp)).unwrap_err();
        assert!(matches!(err, DedupError::TooLarge { .. }));
    }
}
