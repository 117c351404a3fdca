use std::path::{Path, PathBuf};
use serde::Serialize;

/// Extension written by the encoder
pub const OUTPUT_EXTENSION: &str = "webp";

/// One source-file-to-destination-file conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl Job {
    /// Build a job whose output lands in `output_dir`, keeping the source stem
    pub fn into_dir(source: PathBuf, output_dir: &Path) -> Self {
        let destination = output_dir.join(webp_file_name(&source));
        Job { source, destination }
    }

    /// Build a job whose output sits next to the source
    pub fn in_place(source: PathBuf) -> Self {
        let destination = source.with_file_name(webp_file_name(&source));
        Job { source, destination }
    }
}

/// `photo.PNG` -> `photo.webp`, `photo.v2.png` -> `photo.v2.webp`
pub fn webp_file_name(source: &Path) -> PathBuf {
    let mut name = source
        .file_stem()
        .unwrap_or(source.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

/// File name for display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Recorded result of running one job
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Source size read before encoding; `None` if the stat failed
    pub original_size: Option<u64>,
    /// Destination size read after the encoder returned success
    pub converted_size: Option<u64>,
    pub success: bool,
    /// Trimmed encoder diagnostics for failed jobs
    pub error: Option<String>,
}

impl ConversionOutcome {
    /// Size reduction in percent, when both sizes are known and the original is non-empty
    pub fn reduction_percent(&self) -> Option<f64> {
        match (self.original_size, self.converted_size) {
            (Some(orig), Some(new)) => reduction_percent(orig, new),
            _ => None,
        }
    }
}

/// `(orig - new) / orig * 100`, `None` for an empty original
pub fn reduction_percent(orig: u64, new: u64) -> Option<f64> {
    if orig == 0 {
        return None;
    }
    Some((orig as f64 - new as f64) / orig as f64 * 100.0)
}
