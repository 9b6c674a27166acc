use crate::config::SmeltConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

// --- Helper: Load Config ---
pub fn load_config() -> Result<SmeltConfig> {
    if !Path::new("smelt.toml").exists() {
        return Err(anyhow::anyhow!(
            "smelt.toml not found in current directory.\n\n\
            💡 Tip: Create one with a [package] table and an optional [build] table."
        ));
    }
    let raw = fs::read_to_string("smelt.toml")
        .context("Failed to read smelt.toml - check file permissions")?;
    toml::from_str(&raw)
        .context("Failed to parse smelt.toml - check for syntax errors (missing quotes, brackets)")
}

/// `-std=` flag for the configured language standard.
pub fn std_flag(edition: &str) -> String {
    let edition = edition.strip_prefix("-std=").unwrap_or(edition);
    format!("-std={}", edition)
}

pub fn include_flags(dirs: &[PathBuf]) -> Vec<String> {
    dirs.iter()
        .map(|dir| format!("-I{}", dir.to_string_lossy().replace('\\', "/")))
        .collect()
}

/// Renders bare flag names (`Wall`, `pthread`) with a `-` prefix; flags that
/// already carry one pass through untouched.
pub fn dash_flags(flags: &[String]) -> Vec<String> {
    flags
        .iter()
        .map(|flag| {
            if flag.starts_with('-') {
                flag.clone()
            } else {
                format!("-{}", flag)
            }
        })
        .collect()
}

/// Renders library names (`ssl`, `crypto`) as `-l` flags.
pub fn lib_flags(libs: &[String]) -> Vec<String> {
    libs.iter()
        .map(|lib| {
            if lib.starts_with('-') {
                lib.clone()
            } else {
                format!("-l{}", lib)
            }
        })
        .collect()
}

/// Derives the object path for a source file: directory separators flatten
/// to `_` and the extension becomes `.o`, so `src/pages/page.cpp` lands at
/// `<intermediate>/src_pages_page.o` no matter how deep the tree is.
pub fn intermediate_path(intermediate_dir: &Path, source: &Path) -> PathBuf {
    let flat = source
        .to_string_lossy()
        .replace('\\', "/")
        .replace('/', "_");
    intermediate_dir.join(PathBuf::from(flat).with_extension("o"))
}

/// Modification time as nanoseconds since the Unix epoch. `None` when the
/// file is gone or the filesystem refuses to answer.
pub fn file_mtime(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_nanos() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_flag() {
        assert_eq!(std_flag("c++17"), "-std=c++17");
        assert_eq!(std_flag("c11"), "-std=c11");
        assert_eq!(std_flag("-std=c++20"), "-std=c++20");
    }

    #[test]
    fn test_include_flags() {
        let dirs = vec![PathBuf::from("src"), PathBuf::from("third_party/include")];
        assert_eq!(include_flags(&dirs), vec!["-Isrc", "-Ithird_party/include"]);
    }

    #[test]
    fn test_dash_flags_prefix_only_when_missing() {
        let flags = vec!["Wall".to_string(), "-O2".to_string()];
        assert_eq!(dash_flags(&flags), vec!["-Wall", "-O2"]);
    }

    #[test]
    fn test_lib_flags() {
        let libs = vec!["ssl".to_string(), "crypto".to_string()];
        assert_eq!(lib_flags(&libs), vec!["-lssl", "-lcrypto"]);
    }

    #[test]
    fn test_intermediate_path_flattens_separators() {
        let obj = intermediate_path(Path::new("bin/intermediate"), Path::new("src/pages/page.cpp"));
        assert_eq!(obj, PathBuf::from("bin/intermediate/src_pages_page.o"));
    }

    #[test]
    fn test_intermediate_path_is_unique_per_directory() {
        let dir = Path::new("bin/intermediate");
        let a = intermediate_path(dir, Path::new("src/a/util.cpp"));
        let b = intermediate_path(dir, Path::new("src/b/util.cpp"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_mtime_missing_file_is_none() {
        assert_eq!(file_mtime(Path::new("definitely/not/here.cpp")), None);
    }
}
