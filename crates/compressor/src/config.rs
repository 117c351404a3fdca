use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Lowest accepted quality value
pub const MIN_QUALITY: u32 = 1;
/// Highest accepted quality value
pub const MAX_QUALITY: u32 = 100;

/// Encoder quality, guaranteed to be within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Result<Self, Error> {
        if (MIN_QUALITY..=MAX_QUALITY).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(Error::InvalidQuality(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality(80)
    }
}

impl TryFrom<u32> for Quality {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0 as u32
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the quality parameter is handed to the encoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStyle {
    /// `-y -i SRC -qscale Q DST`
    #[default]
    Qscale,
    /// `-y -i SRC -c:v libwebp -quality Q DST`
    Libwebp,
}

/// Configuration for a batch conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Encoder binary, looked up on PATH unless absolute
    pub encoder_bin: PathBuf,
    pub invocation: InvocationStyle,
    pub quality: Quality,
    /// Subdirectory (inside the target directory) that receives outputs when not in place
    pub output_dir_name: String,
    /// Recognized source extensions, compared case-insensitively
    pub extensions: Vec<String>,
    /// Also pick up .avif sources
    pub include_avif: bool,
    /// Pool width override; host parallelism when unset
    pub workers: Option<usize>,
    /// Write outputs beside the sources and delete each source after a successful conversion
    pub in_place: bool,
    pub skip_preview: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl ConvertConfig {
    /// Create a default configuration with sensible values
    pub fn default_config() -> Self {
        Self {
            encoder_bin: PathBuf::from("ffmpeg"),
            invocation: InvocationStyle::default(),
            quality: Quality::default(),
            output_dir_name: "compressed".to_string(),
            extensions: ["png", "jpg", "jpeg", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            include_avif: false,
            workers: None,
            in_place: false,
            skip_preview: false,
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                } else {
                    config = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                }
            }
        }

        Ok(config)
    }

    /// Extensions that qualify a file for conversion, lowercased
    pub fn effective_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.extensions.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect();
        if self.include_avif && !exts.iter().any(|e| e == "avif") {
            exts.push("avif".to_string());
        }
        exts
    }

    /// Number of workers to spawn, never below 1
    pub fn pool_width(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}
