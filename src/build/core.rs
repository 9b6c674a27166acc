use super::clean;
use super::deps::CompilerScanner;
use super::lanes::{self, LaneContext};
use super::oracle::StalenessOracle;
use super::utils::{dash_flags, file_mtime, include_flags, lib_flags, std_flag};
use crate::cache::BuildStateCache;
use crate::config::BuildPlan;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use walkdir::WalkDir;

const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc", "cxx"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh"];

// --- Helper: Collect files by extension ---
fn collect_files(dirs: &[PathBuf], extensions: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if let Some(ext) = path.extension()
                && extensions.contains(&ext.to_string_lossy().as_ref())
            {
                files.push(path.to_owned());
            }
        }
    }
    files
}

// --- CORE: Build Project ---
pub fn build_project(plan: &BuildPlan) -> Result<bool> {
    let start_time = Instant::now();
    println!(
        "{} Building {} ({})",
        "🔨".blue(),
        plan.output.bold(),
        plan.edition
    );

    // 1. Setup Directories
    let intermediate_dir = plan.intermediate_dir();
    let build_dir = plan.build_dir();
    fs::create_dir_all(&intermediate_dir)
        .with_context(|| format!("Failed to create {}", intermediate_dir.display()))?;
    fs::create_dir_all(&build_dir)
        .with_context(|| format!("Failed to create {}", build_dir.display()))?;

    // 2. Collect Source Files
    let sources = collect_files(&plan.source_dirs, SOURCE_EXTENSIONS);
    if sources.is_empty() {
        println!("{} No source files found.", "!".yellow());
        return Ok(false);
    }

    // 3. Prepare Flags
    let std = std_flag(&plan.edition);
    let includes = include_flags(&plan.include_dirs);
    let compiler_flags = dash_flags(&plan.flags);
    let extra_flags = dash_flags(&plan.extra_flags);
    let linker_flags = lib_flags(&plan.linker_flags);

    let mut compile_args = vec![std.clone()];
    compile_args.extend(includes.iter().cloned());
    compile_args.extend(compiler_flags.iter().cloned());
    compile_args.extend(extra_flags.iter().cloned());

    // 4. Previous Build State
    let cache_path = plan.cache_path();
    let had_previous_state = cache_path.exists();
    let cache = Mutex::new(BuildStateCache::load(&cache_path));

    let scanner = CompilerScanner {
        compiler: &plan.compiler,
        include_flags: &includes,
    };

    // Headers live under both source and include trees.
    let header_roots: Vec<PathBuf> = plan
        .source_dirs
        .iter()
        .chain(plan.include_dirs.iter())
        .cloned()
        .collect();

    // 5. Header Pre-Pass
    // One stale header anywhere forces dependency re-evaluation for every
    // file this run, so the scan stops at the first hit. Cheaper than a
    // reverse include graph, at the cost of some needless `-MM` calls.
    let mut any_header_changed = false;
    if had_previous_state {
        let oracle = StalenessOracle {
            cache: &cache,
            scanner: &scanner,
            intermediate_dir: &intermediate_dir,
        };
        for header in collect_files(&header_roots, HEADER_EXTENSIONS) {
            if oracle.needs_building(&header, false, false) {
                println!("   {} Changed header: {}", "!".yellow(), header.display());
                any_header_changed = true;
                break;
            }
        }
    }

    // 6. Parallel Compilation
    println!(
        "   {} Compiling {} file(s) on up to {} lanes...",
        "⚙".blue(),
        sources.len(),
        plan.jobs
    );
    let failures = AtomicUsize::new(0);
    let console = Mutex::new(());
    let ctx = LaneContext {
        compiler: &plan.compiler,
        compile_args: &compile_args,
        intermediate_dir: &intermediate_dir,
        scanner: &scanner,
        cache: &cache,
        failures: &failures,
        console: &console,
        check_deps: any_header_changed,
    };
    let reports = lanes::run_lanes(&sources, plan.jobs, &ctx);

    let built: usize = reports.iter().map(|r| r.built).sum();
    let objects: Vec<PathBuf> = reports.into_iter().flat_map(|r| r.objects).collect();

    let failed = failures.load(Ordering::SeqCst);
    if failed > 0 {
        // In-memory state is discarded; the previous cache file stays valid.
        println!("{} Build failed ({} error(s))", "x".red(), failed);
        return Ok(false);
    }

    // 7. Linking
    let output_path = plan.output_path();
    let mut link_failed = false;
    if built > 0 || !output_path.exists() {
        println!("   {} Linking...", "🔗".cyan());
        let output = Command::new(&plan.compiler)
            .args(&objects)
            .arg(&std)
            .args(&compiler_flags)
            .args(&linker_flags)
            .args(&extra_flags)
            .arg("-o")
            .arg(&output_path)
            .output();
        match output {
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                if !stderr.is_empty() {
                    println!("[{}]", " LINKER ERROR ".red());
                    println!("{}", stderr);
                    link_failed = true;
                }
            }
            Err(e) => {
                println!("{} Failed to run linker '{}': {}", "x".red(), plan.compiler, e);
                link_failed = true;
            }
        }
    } else {
        println!("{} Nothing new to be built", "⚡".green());
    }

    // 8. Refresh Header Mtimes
    // The next run's pre-pass must compare against this run's state, so
    // every header entry is updated whether or not the link succeeded.
    let mut cache = cache.into_inner().unwrap();
    for header in collect_files(&header_roots, HEADER_EXTENSIONS) {
        if let Some(mtime) = file_mtime(&header) {
            cache.record(&header, mtime);
        }
    }
    cache.persist(&cache_path)?;

    if link_failed {
        println!("{} Build failed", "x".red());
        return Ok(false);
    }

    println!(
        "{} Build finished in {:.2?} ({} compiled)",
        "✓".green(),
        start_time.elapsed(),
        built
    );
    Ok(true)
}

// --- COMMAND: Rebuild ---
pub fn rebuild_project(plan: &BuildPlan) -> Result<bool> {
    clean::clean_project(plan)?;
    build_project(plan)
}
