//! Build artifact cleanup.

use crate::config::BuildPlan;
use anyhow::{Context, Result};
use colored::*;
use std::fs;

/// Removes the intermediate and build output directories, cache included.
pub fn clean_project(plan: &BuildPlan) -> Result<()> {
    let mut cleaned = false;
    for dir in [plan.intermediate_dir(), plan.build_dir()] {
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
            cleaned = true;
        }
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}
