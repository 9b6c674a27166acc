//! Header dependency extraction.
//!
//! The compiler itself is the source of truth: `-MM` prints a makefile-style
//! dependency line listing every header a translation unit transitively
//! includes. Extraction failures are deliberately silent: an empty list only
//! costs staleness precision, it never aborts a build.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Lists the header files a source file depends on.
///
/// Kept as a one-operation trait so a structured dependency format (e.g.
/// `.d` files emitted during compilation) could replace the `-MM` shell-out
/// without touching the staleness logic.
pub trait DependencyScanner: Sync {
    fn scan(&self, source: &Path) -> Vec<PathBuf>;
}

/// Asks the configured compiler for the dependency line of one file.
pub struct CompilerScanner<'a> {
    pub compiler: &'a str,
    pub include_flags: &'a [String],
}

impl DependencyScanner for CompilerScanner<'_> {
    fn scan(&self, source: &Path) -> Vec<PathBuf> {
        let output = Command::new(self.compiler)
            .arg("-MM")
            .arg(source)
            .args(self.include_flags)
            .output();
        match output {
            Ok(out) => parse_dep_line(&String::from_utf8_lossy(&out.stdout)),
            Err(_) => Vec::new(),
        }
    }
}

/// Parses `main.o: src/main.cpp src/app.h \` -style output into paths.
///
/// The token list includes the source file itself, exactly as the compiler
/// prints it; callers only ever mtime-probe the entries, so that is harmless.
pub fn parse_dep_line(raw: &str) -> Vec<PathBuf> {
    // Handle line continuations
    let flat = raw.replace("\\\r\n", " ").replace("\\\n", " ");

    let Some((_, deps)) = flat.split_once(':') else {
        return Vec::new();
    };

    deps.split_whitespace()
        .filter(|token| *token != "\\")
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line() {
        let deps = parse_dep_line("main.o: src/main.cpp src/app.h\n");
        assert_eq!(
            deps,
            vec![
                PathBuf::from("src/main.cpp"),
                PathBuf::from("src/app.h"),
            ]
        );
    }

    #[test]
    fn parses_line_continuations() {
        let deps = parse_dep_line("page.o: src/page.cpp \\\n  src/page.h \\\n  src/data/serialization.h\n");
        assert_eq!(
            deps,
            vec![
                PathBuf::from("src/page.cpp"),
                PathBuf::from("src/page.h"),
                PathBuf::from("src/data/serialization.h"),
            ]
        );
    }

    #[test]
    fn malformed_output_yields_no_deps() {
        assert!(parse_dep_line("").is_empty());
        assert!(parse_dep_line("gibberish without separator").is_empty());
    }
}
