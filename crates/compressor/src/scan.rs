use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use walkdir::WalkDir;
use crate::error::{Error, Result};

/// Result of looking at one directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    /// File should be converted
    Candidate(PathBuf),
    /// File was looked at and left alone (path, reason)
    Skipped(PathBuf, String),
}

/// Options that decide which entries qualify
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercase extensions without the dot
    pub extensions: Vec<String>,
}

/// List the direct children of `dir`, classifying each regular file.
///
/// Directories are never descended into, so an output subdirectory is never rescanned.
/// Results are sorted by path.
pub fn scan_dir(dir: &Path, opts: &ScanOptions) -> Result<Vec<ScanResult>> {
    let mut results = Vec::new();

    info!("Scanning directory: {}", dir.display());

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                return Err(Error::io(format!("Failed to read directory {}", dir.display()), source));
            }
            Err(e) => {
                warn!("Error reading directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if is_hidden(path) {
            results.push(ScanResult::Skipped(path.to_path_buf(), "hidden file".to_string()));
            continue;
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match ext {
            Some(ext) if opts.extensions.contains(&ext) => {
                debug!("Found image: {}", path.display());
                results.push(ScanResult::Candidate(path.to_path_buf()));
            }
            _ => {
                results.push(ScanResult::Skipped(path.to_path_buf(), "unsupported extension".to_string()));
            }
        }
    }

    let candidates = results.iter().filter(|r| matches!(r, ScanResult::Candidate(_))).count();
    info!("Scan complete: {} entries checked, {} candidates", results.len(), candidates);
    Ok(results)
}

/// Candidate paths only
pub fn candidates(results: Vec<ScanResult>) -> Vec<PathBuf> {
    results
        .into_iter()
        .filter_map(|r| match r {
            ScanResult::Candidate(p) => Some(p),
            ScanResult::Skipped(p, reason) => {
                debug!("Skipped {}: {}", p.display(), reason);
                None
            }
        })
        .collect()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
