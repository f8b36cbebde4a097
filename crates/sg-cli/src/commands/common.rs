//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use sg_core::config::CONFIG_FILE_NAMES;
use sg_core::{Config, SourceFile};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Intentionally empty: ExitCode is control flow, not a user-facing
        // error, and must not print anything if it ever reaches stderr.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// File extensions recognised as extraction manifests
const MANIFEST_EXTENSIONS: &[&str] = &["json", "yml", "yaml"];

/// Load the config given by `--config`, or the one in the project directory.
///
/// A project without a config file runs with the defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => {
            Config::load(Path::new(path)).with_context(|| format!("Failed to load config: {path}"))
        }
        None => Config::load_or_default(Path::new(&global.project_dir))
            .context("Failed to load project config"),
    }
}

/// Manifest files to process.
///
/// Explicit `paths` may name files or directories, which are scanned
/// recursively. Without paths the config's `manifest_paths` globs are
/// matched relative to the project directory.
pub(crate) fn discover_manifests(
    paths: &[String],
    config: &Config,
    global: &GlobalArgs,
) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();

    if paths.is_empty() {
        let project_dir = Path::new(&global.project_dir);
        for pattern in &config.manifest_paths {
            let full_pattern = project_dir.join(pattern);
            let entries = glob::glob(&full_pattern.to_string_lossy())
                .with_context(|| format!("Invalid manifest pattern: {pattern}"))?;
            for entry in entries {
                let path = entry.context("Failed to read manifest path")?;
                if path.is_file() {
                    push_unique(&mut manifests, path);
                }
            }
        }
    } else {
        for path in paths.iter().map(PathBuf::from) {
            if path.is_dir() {
                collect_manifests_in_dir(&path, &mut manifests)?;
            } else if path.is_file() {
                push_unique(&mut manifests, path);
            } else {
                bail!("No such manifest file or directory: {}", path.display());
            }
        }
    }

    if global.verbose {
        eprintln!("[verbose] Found {} manifest(s)", manifests.len());
    }
    Ok(manifests)
}

fn push_unique(manifests: &mut Vec<PathBuf>, path: PathBuf) {
    if !manifests.contains(&path) {
        manifests.push(path);
    }
}

/// Whether `path` looks like a manifest; config files never are
fn is_manifest(path: &Path) -> bool {
    let is_config = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name));
    let has_manifest_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    has_manifest_extension && !is_config
}

fn collect_manifests_in_dir(dir: &Path, manifests: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_manifests_in_dir(&path, manifests)?;
        } else if is_manifest(&path) {
            push_unique(manifests, path);
        }
    }
    Ok(())
}

/// Load every manifest in order
pub(crate) fn load_manifests(paths: &[PathBuf], global: &GlobalArgs) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| {
            if global.verbose {
                eprintln!("[verbose] Loading manifest {}", path.display());
            }
            SourceFile::load(path)
                .with_context(|| format!("Failed to load manifest: {}", path.display()))
        })
        .collect()
}

/// Calculate column widths for a table given headers and row data.
///
/// For each column, returns the maximum width across the header and all
/// row values so that data aligns when printed with left-padding.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Prints a left-aligned header row, a separator line of dashes, and each
/// data row. Columns are separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    let format_row = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!(
        "{}",
        format_row(headers.iter().map(|h| h.to_string()).collect())
    );
    println!(
        "{}",
        format_row(widths.iter().map(|&w| "-".repeat(w)).collect())
    );
    for row in rows {
        println!("{}", format_row(row.clone()));
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
