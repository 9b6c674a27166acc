use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_LANES: usize = 8;

#[derive(Deserialize, Debug, Default)]
pub struct SmeltConfig {
    pub package: PackageConfig,
    pub build: Option<BuildConfig>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PackageConfig {
    pub name: String,
    #[allow(dead_code)]
    pub version: String,
    #[serde(default = "default_edition")]
    pub edition: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct BuildConfig {
    pub compiler: Option<String>,
    pub flags: Option<Vec<String>>,
    pub linker_flags: Option<Vec<String>>,
    pub extra_flags: Option<Vec<String>>,
    pub source_dirs: Option<Vec<PathBuf>>,
    pub include_dirs: Option<Vec<PathBuf>>,
    pub bin_dir: Option<PathBuf>,
    pub output: Option<String>,
    pub jobs: Option<usize>,
}

fn default_edition() -> String {
    "c++17".to_string()
}

/// Fully resolved inputs for one build run.
///
/// The core never reads `smelt.toml` itself; it consumes this struct, so an
/// embedding caller can construct one directly and skip the manifest.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub compiler: String,
    pub edition: String,
    pub flags: Vec<String>,
    pub linker_flags: Vec<String>,
    pub extra_flags: Vec<String>,
    pub source_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub bin_dir: PathBuf,
    pub output: String,
    /// Number of compile lanes. Fixed for the run, not adaptive.
    pub jobs: usize,
}

impl BuildPlan {
    pub fn from_config(config: &SmeltConfig) -> Self {
        let build = config.build.as_ref();

        let output = build.and_then(|b| b.output.clone()).unwrap_or_else(|| {
            let base = if config.package.name.is_empty() {
                "a.out".to_string()
            } else {
                config.package.name.clone()
            };
            if cfg!(target_os = "windows") {
                format!("{}.exe", base)
            } else {
                base
            }
        });

        let edition = if config.package.edition.is_empty() {
            default_edition()
        } else {
            config.package.edition.clone()
        };

        BuildPlan {
            compiler: build
                .and_then(|b| b.compiler.clone())
                .unwrap_or_else(|| "g++".to_string()),
            edition,
            flags: build.and_then(|b| b.flags.clone()).unwrap_or_default(),
            linker_flags: build.and_then(|b| b.linker_flags.clone()).unwrap_or_default(),
            extra_flags: build.and_then(|b| b.extra_flags.clone()).unwrap_or_default(),
            source_dirs: build
                .and_then(|b| b.source_dirs.clone())
                .unwrap_or_else(|| vec![PathBuf::from("src")]),
            include_dirs: build.and_then(|b| b.include_dirs.clone()).unwrap_or_default(),
            bin_dir: build
                .and_then(|b| b.bin_dir.clone())
                .unwrap_or_else(|| PathBuf::from("bin")),
            output,
            jobs: build.and_then(|b| b.jobs).unwrap_or(DEFAULT_LANES).max(1),
        }
    }

    pub fn intermediate_dir(&self) -> PathBuf {
        self.bin_dir.join("intermediate")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.bin_dir.join("build")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.intermediate_dir().join("state.json")
    }

    pub fn output_path(&self) -> PathBuf {
        self.build_dir().join(&self.output)
    }
}
