use std::path::PathBuf;
use thiserror::Error;

/// Result alias for batch-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Process-level failures. Any of these aborts the run before (or instead of) dispatching jobs.
#[derive(Debug, Error)]
pub enum Error {
    /// Quality outside 1..=100
    #[error("quality must be between 1 and 100 (got {0})")]
    InvalidQuality(u32),

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The external encoder binary could not be located or failed its version check
    #[error("encoder not found: {program} (is it installed and on PATH?)")]
    EncoderNotFound { program: String },

    #[error("no images found in {} (png, jpg, jpeg, gif)", .0.display())]
    NoImages(PathBuf),

    /// Two sources map to one output while replacing originals; running both would lose an image
    #[error(
        "{} and {} would both be replaced by {}; rename one or convert without replacing",
        .first.display(),
        .second.display(),
        .destination.display()
    )]
    DestinationCollision {
        destination: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

/// Failure of a single encoder invocation. Recovered per job, never escalated.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder exited with {status}: {diagnostics}")]
    Failed { status: String, diagnostics: String },
}

impl EncodeError {
    /// Short human-readable detail, used in per-file failure lines
    pub fn detail(&self) -> String {
        match self {
            EncodeError::Spawn { source, .. } => source.to_string(),
            EncodeError::Failed {
                status,
                diagnostics,
            } if diagnostics.is_empty() => format!("encoder exited with {}", status),
            EncodeError::Failed { diagnostics, .. } => diagnostics.clone(),
        }
    }
}
