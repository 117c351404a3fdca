use std::path::{Path, PathBuf};
use std::process::Stdio;
use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;
use crate::config::{ConvertConfig, InvocationStyle, Quality};
use crate::error::{EncodeError, Error};

/// Number of trailing stderr lines kept as diagnostics
const DIAGNOSTIC_TAIL_LINES: usize = 8;

/// Capability to turn one source image into a WebP file.
///
/// Implementations run a single conversion per call and never parallelize internally.
/// Callers validate `quality` beforehand.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Verify the encoder can be used on this host
    async fn check_available(&self) -> Result<(), Error>;

    /// Convert `source` into `destination`, overwriting any existing file
    async fn encode(&self, source: &Path, destination: &Path, quality: Quality) -> Result<(), EncodeError>;
}

/// Encoder backed by an ffmpeg-compatible binary
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    pub program: PathBuf,
    pub style: InvocationStyle,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>, style: InvocationStyle) -> Self {
        FfmpegEncoder {
            program: program.into(),
            style,
        }
    }

    pub fn from_config(cfg: &ConvertConfig) -> Self {
        Self::new(cfg.encoder_bin.clone(), cfg.invocation)
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Arguments for one conversion, in invocation order
    pub fn build_args(&self, source: &Path, destination: &Path, quality: Quality) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            source.display().to_string(),
        ];

        match self.style {
            InvocationStyle::Qscale => {
                args.push("-qscale".to_string());
                args.push(quality.to_string());
            }
            InvocationStyle::Libwebp => {
                args.push("-c:v".to_string());
                args.push("libwebp".to_string());
                args.push("-quality".to_string());
                args.push(quality.to_string());
            }
        }

        args.push(destination.display().to_string());
        args
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn check_available(&self) -> Result<(), Error> {
        let not_found = || Error::EncoderNotFound {
            program: self.program_name(),
        };

        let resolved = which::which(&self.program).map_err(|e| {
            debug!("which {}: {}", self.program.display(), e);
            not_found()
        })?;

        let output = Command::new(&resolved)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                debug!("Failed to execute {} -version: {}", resolved.display(), e);
                not_found()
            })?;

        if !output.status.success() {
            debug!("{} -version exited with {}", resolved.display(), output.status);
            return Err(not_found());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = stdout.lines().next() {
            info!("Using encoder {}: {}", resolved.display(), first_line.trim());
        }
        Ok(())
    }

    async fn encode(&self, source: &Path, destination: &Path, quality: Quality) -> Result<(), EncodeError> {
        let args = self.build_args(source, destination, quality);
        debug!("encoder command: {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EncodeError::Spawn {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodeError::Failed {
                status: output.status.to_string(),
                diagnostics: trim_diagnostics(&stderr),
            });
        }

        Ok(())
    }
}

/// Keep the last few non-empty lines of encoder stderr, trimmed
pub fn trim_diagnostics(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}
