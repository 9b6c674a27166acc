//! # smelt - Incremental C/C++ Build Orchestrator
//!
//! smelt discovers source files, decides which ones actually need the
//! compiler, fans the stale ones out over a fixed set of parallel lanes,
//! links the result, and remembers what it did so the next run skips
//! unchanged work.
//!
//! ## How staleness is decided
//!
//! - Missing object file, missing cache entry, or a source newer than its
//!   recorded modification time → recompile.
//! - When any header anywhere changed since the last run, every file is
//!   additionally checked against its own header list (compiler `-MM`).
//!
//! ## Quick Start
//!
//! ```bash
//! # Compile anything stale and link
//! sm build
//!
//! # Drop all artifacts and start over
//! sm rebuild
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Staleness oracle, compile lanes, linker stage
//! - [`cache`] - Persisted path → mtime build state
//! - [`config`] - Manifest parsing (`smelt.toml`) and the resolved [`config::BuildPlan`]

/// Core build engine: staleness decisions, compile lanes, linking.
pub mod build;

/// Persisted build-state cache.
pub mod cache;

/// Configuration parsing (`smelt.toml`).
pub mod config;
