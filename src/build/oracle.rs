//! Staleness decisions.

use super::deps::DependencyScanner;
use super::utils::{file_mtime, intermediate_path};
use crate::cache::BuildStateCache;
use std::path::Path;
use std::sync::Mutex;

/// Decides whether a file must be (re)compiled.
///
/// Checks run cheapest first: an artifact stat, a cache lookup, an mtime
/// stat, and only then (when asked) a dependency extraction, which shells
/// out to the compiler and is by far the most expensive probe.
pub struct StalenessOracle<'a> {
    pub cache: &'a Mutex<BuildStateCache>,
    pub scanner: &'a dyn DependencyScanner,
    pub intermediate_dir: &'a Path,
}

impl StalenessOracle<'_> {
    pub fn needs_building(&self, file: &Path, check_artifact: bool, check_deps: bool) -> bool {
        if check_artifact && !intermediate_path(self.intermediate_dir, file).exists() {
            return true;
        }

        let recorded = self.cache.lock().unwrap().recorded_mtime(file);
        let Some(recorded) = recorded else {
            return true;
        };
        match file_mtime(file) {
            Some(current) if current <= recorded => {}
            // Newer than recorded, or the file vanished since it was cached.
            _ => return true,
        }

        if check_deps {
            // One level only: each header is judged by its own mtime, not by
            // headers-of-headers. The header pre-pass covers the transitive
            // case by forcing this check for every file in the run.
            for dep in self.scanner.scan(file) {
                if self.needs_building(&dep, false, false) {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct StaticScanner(Vec<PathBuf>);

    impl DependencyScanner for StaticScanner {
        fn scan(&self, _source: &Path) -> Vec<PathBuf> {
            self.0.clone()
        }
    }

    struct Fixture {
        dir: TempDir,
        intermediate: PathBuf,
        cache: Mutex<BuildStateCache>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let intermediate = dir.path().join("intermediate");
            fs::create_dir_all(&intermediate).unwrap();
            Fixture {
                dir,
                intermediate,
                cache: Mutex::new(BuildStateCache::default()),
            }
        }

        fn write_source(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, "int main() {}").unwrap();
            path
        }

        fn write_artifact(&self, source: &Path) {
            let obj = intermediate_path(&self.intermediate, source);
            fs::write(obj, "obj").unwrap();
        }

        fn cache_current_mtime(&self, path: &Path) {
            let mtime = file_mtime(path).unwrap();
            self.cache.lock().unwrap().record(path, mtime);
        }

        fn oracle<'a>(&'a self, scanner: &'a dyn DependencyScanner) -> StalenessOracle<'a> {
            StalenessOracle {
                cache: &self.cache,
                scanner,
                intermediate_dir: &self.intermediate,
            }
        }
    }

    fn no_deps() -> StaticScanner {
        StaticScanner(Vec::new())
    }

    #[test]
    fn missing_artifact_is_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        fx.cache_current_mtime(&src);

        let scanner = no_deps();
        let oracle = fx.oracle(&scanner);
        assert!(oracle.needs_building(&src, true, false));
        // Same file passes once the artifact check is disabled.
        assert!(!oracle.needs_building(&src, false, false));
    }

    #[test]
    fn missing_cache_entry_is_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        fx.write_artifact(&src);

        let scanner = no_deps();
        assert!(fx.oracle(&scanner).needs_building(&src, true, false));
    }

    #[test]
    fn newer_mtime_than_cached_is_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        fx.write_artifact(&src);
        let mtime = file_mtime(&src).unwrap();
        fx.cache.lock().unwrap().record(&src, mtime - 1);

        let scanner = no_deps();
        assert!(fx.oracle(&scanner).needs_building(&src, true, false));
    }

    #[test]
    fn up_to_date_file_is_not_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        fx.write_artifact(&src);
        fx.cache_current_mtime(&src);

        let scanner = no_deps();
        assert!(!fx.oracle(&scanner).needs_building(&src, true, true));
    }

    #[test]
    fn stale_header_dependency_is_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        let header = fx.write_source("app.h");
        fx.write_artifact(&src);
        fx.cache_current_mtime(&src);
        let header_mtime = file_mtime(&header).unwrap();
        fx.cache.lock().unwrap().record(&header, header_mtime - 1);

        let scanner = StaticScanner(vec![header.clone()]);
        let oracle = fx.oracle(&scanner);
        assert!(oracle.needs_building(&src, true, true));
        // Without the dependency check the same file counts as fresh.
        assert!(!oracle.needs_building(&src, true, false));
    }

    #[test]
    fn fresh_header_dependency_is_not_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        let header = fx.write_source("app.h");
        fx.write_artifact(&src);
        fx.cache_current_mtime(&src);
        fx.cache_current_mtime(&header);

        let scanner = StaticScanner(vec![header]);
        assert!(!fx.oracle(&scanner).needs_building(&src, true, true));
    }

    #[test]
    fn vanished_file_with_cache_entry_is_stale() {
        let fx = Fixture::new();
        let src = fx.write_source("main.cpp");
        fx.write_artifact(&src);
        fx.cache_current_mtime(&src);
        fs::remove_file(&src).unwrap();

        let scanner = no_deps();
        assert!(fx.oracle(&scanner).needs_building(&src, false, false));
    }
}
