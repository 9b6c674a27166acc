//! Parallel compile lanes.
//!
//! The source list is split into contiguous slices, one long-running worker
//! thread per non-empty slice. A lane walks its slice in discovery order and
//! keeps its results in a local [`LaneReport`]; reports merge after the join
//! barrier, so only the cache map needs a lock on the hot path. Fail-fast is
//! a shared atomic counter every lane polls before starting the next file;
//! an in-flight compiler process is never killed, it just becomes the last
//! one its lane runs.

use super::deps::DependencyScanner;
use super::oracle::StalenessOracle;
use super::utils::{file_mtime, intermediate_path};
use crate::cache::BuildStateCache;
use colored::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Everything a lane reads or updates while it runs. All references, so the
/// borrow checker proves the run-level state outlives every worker.
pub struct LaneContext<'a> {
    pub compiler: &'a str,
    /// Std, include, compiler and extra flags, in final order.
    pub compile_args: &'a [String],
    pub intermediate_dir: &'a Path,
    pub scanner: &'a dyn DependencyScanner,
    pub cache: &'a Mutex<BuildStateCache>,
    pub failures: &'a AtomicUsize,
    pub console: &'a Mutex<()>,
    /// The run-scoped header-changed flag: when set, every staleness query
    /// also consults the dependency scanner.
    pub check_deps: bool,
}

/// What one lane accumulated; merged commutatively after the join.
#[derive(Debug, Default)]
pub struct LaneReport {
    pub built: usize,
    pub objects: Vec<PathBuf>,
}

/// Splits `items` into `lanes` contiguous slices, remainder spread over the
/// first slices. Trailing slices may be empty when there are more lanes than
/// items.
pub fn split_into_lanes<T: Clone>(items: &[T], lanes: usize) -> Vec<Vec<T>> {
    let lanes = lanes.max(1);
    let size = items.len() / lanes;
    let remainder = items.len() % lanes;

    let mut out = Vec::with_capacity(lanes);
    let mut start = 0;
    for lane in 0..lanes {
        let len = size + usize::from(lane < remainder);
        out.push(items[start..start + len].to_vec());
        start += len;
    }
    out
}

/// Fans the file list out over worker threads and joins them all before
/// returning, so the caller can link knowing no lane is still compiling.
pub fn run_lanes(files: &[PathBuf], lane_count: usize, ctx: &LaneContext) -> Vec<LaneReport> {
    let slices = split_into_lanes(files, lane_count);
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for (lane, slice) in slices.iter().enumerate() {
            if slice.is_empty() {
                continue;
            }
            handles.push(scope.spawn(move || run_lane(lane + 1, slice, ctx)));
        }
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    })
}

fn run_lane(lane: usize, files: &[PathBuf], ctx: &LaneContext) -> LaneReport {
    let oracle = StalenessOracle {
        cache: ctx.cache,
        scanner: ctx.scanner,
        intermediate_dir: ctx.intermediate_dir,
    };

    let mut report = LaneReport::default();
    for file in files {
        if ctx.failures.load(Ordering::SeqCst) > 0 {
            break;
        }

        let object = intermediate_path(ctx.intermediate_dir, file);
        // The linker needs every object, rebuilt this run or not.
        report.objects.push(object.clone());

        if !oracle.needs_building(file, true, ctx.check_deps) {
            continue;
        }

        {
            let _console = ctx.console.lock().unwrap();
            println!(
                "   [{}] -> {}",
                format!("lane {}", lane).dimmed(),
                file.display()
            );
        }

        match compile(ctx, file, &object) {
            Ok(()) => {
                // The mtime recorded is the source's mtime right now; an
                // edit racing the compile shows up as stale next run.
                if let Some(mtime) = file_mtime(file) {
                    ctx.cache.lock().unwrap().record(file, mtime);
                }
                report.built += 1;
            }
            Err(message) => {
                let _console = ctx.console.lock().unwrap();
                println!(
                    "   [{}][{}] {}",
                    format!("lane {}", lane).dimmed(),
                    " COMPILE ERROR ".red(),
                    file.display()
                );
                println!("{}", message);
                drop(_console);
                ctx.failures.fetch_add(1, Ordering::SeqCst);
                break;
            }
        }
    }
    report
}

/// Non-empty stderr is the failure signal; the exit code is not consulted.
/// That is the documented contract: compilers that route warnings to stderr
/// under default flags will fail the build, same as always.
fn compile(ctx: &LaneContext, source: &Path, object: &Path) -> Result<(), String> {
    let output = Command::new(ctx.compiler)
        .arg(source)
        .arg("-c")
        .arg("-o")
        .arg(object)
        .args(ctx.compile_args)
        .output();

    match output {
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if stderr.is_empty() {
                Ok(())
            } else {
                Err(stderr.into_owned())
            }
        }
        Err(e) => Err(format!("Failed to run compiler '{}': {}", ctx.compiler, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_distributes_remainder_to_first_lanes() {
        let items: Vec<u32> = (0..10).collect();
        let slices = split_into_lanes(&items, 4);
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0], vec![0, 1, 2]);
        assert_eq!(slices[1], vec![3, 4, 5]);
        assert_eq!(slices[2], vec![6, 7]);
        assert_eq!(slices[3], vec![8, 9]);
    }

    #[test]
    fn split_with_more_lanes_than_items_leaves_trailing_slices_empty() {
        let items = vec![1, 2];
        let slices = split_into_lanes(&items, 8);
        assert_eq!(slices.len(), 8);
        assert_eq!(slices[0], vec![1]);
        assert_eq!(slices[1], vec![2]);
        assert!(slices[2..].iter().all(|s| s.is_empty()));
    }

    #[test]
    fn split_preserves_discovery_order() {
        let items: Vec<u32> = (0..7).collect();
        let flattened: Vec<u32> = split_into_lanes(&items, 3).concat();
        assert_eq!(flattened, items);
    }

    #[test]
    fn split_of_empty_list() {
        let slices = split_into_lanes::<u32>(&[], 4);
        assert_eq!(slices.len(), 4);
        assert!(slices.iter().all(|s| s.is_empty()));
    }
}
