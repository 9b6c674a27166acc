mod clean;
mod core;
mod deps;
mod lanes;
mod oracle;
mod utils;

pub use clean::clean_project;
pub use core::{build_project, rebuild_project};
pub use utils::load_config;
