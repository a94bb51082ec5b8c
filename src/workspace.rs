use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Paths;

/// Create the work and cache directories if needed, empty them, and make sure
/// the log file exists. Runs before logging is initialised, so removal
/// failures are returned as messages for the caller to log afterwards.
pub fn bootstrap(paths: &Paths) -> Result<Vec<String>> {
    let mut failures = Vec::new();
    for dir in [&paths.work, &paths.cache] {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        clear(dir, &mut failures);
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_file)
        .with_context(|| format!("creating {}", paths.log_file.display()))?;
    Ok(failures)
}

/// Remove everything inside `dir`, recursing into subdirectories. Entries
/// that cannot be removed are reported and skipped.
pub fn clear(dir: &Path, failures: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() {
            clear(&path, failures);
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        if removed.is_err() {
            failures.push(format!(
                "failed to remove {} from {}.",
                path.display(),
                dir.display()
            ));
        }
    }
}
