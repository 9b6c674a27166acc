//! Persisted build-state cache.
//!
//! Maps every processed file (source or header) to the modification time it
//! had the last time a run handled it, as integer nanoseconds since the Unix
//! epoch. The cache is loaded once at the start of a build, mutated in memory
//! while lanes compile, and rewritten wholesale at the end. There is no
//! incremental persistence, so a killed run simply leaves the previous file.

use anyhow::{Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildStateCache {
    entries: HashMap<PathBuf, u64>,
}

impl BuildStateCache {
    /// Reads the cache file. A missing or corrupt file is never fatal: it
    /// degrades to an empty cache, which forces everything without a valid
    /// entry to rebuild.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                println!(
                    "{} Failed to read {} - assuming a clean state.",
                    "!".yellow(),
                    path.display()
                );
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Self { entries },
            Err(_) => {
                println!(
                    "{} Failed to parse {} - assuming a clean state.",
                    "!".yellow(),
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn recorded_mtime(&self, path: &Path) -> Option<u64> {
        self.entries.get(path).copied()
    }

    pub fn record(&mut self, path: &Path, mtime: u64) {
        self.entries.insert(path.to_owned(), mtime);
    }

    /// Serializes the full mapping back to disk, replacing the previous file.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write build state to {}", path.display()))
    }
}
