use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use crate::config::Quality;
use crate::encoder::Encoder;
use crate::error::{EncodeError, Error};

/// In-process encoder: writes a destination a quarter the size of the source
/// and fails for any source whose file name contains one of `fail_on`.
#[derive(Debug, Default)]
pub struct FakeEncoder {
    pub fail_on: Vec<String>,
    pub missing: bool,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl FakeEncoder {
    pub fn failing_on(names: &[&str]) -> Self {
        FakeEncoder {
            fail_on: names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn missing() -> Self {
        FakeEncoder {
            missing: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn check_available(&self) -> Result<(), Error> {
        if self.missing {
            return Err(Error::EncoderNotFound {
                program: "fake-encoder".to_string(),
            });
        }
        Ok(())
    }

    async fn encode(&self, source: &Path, destination: &Path, _quality: Quality) -> Result<(), EncodeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        let result = self.write_output(source, destination).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl FakeEncoder {
    async fn write_output(&self, source: &Path, destination: &Path) -> Result<(), EncodeError> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_on.iter().any(|f| name.contains(f.as_str())) {
            return Err(EncodeError::Failed {
                status: "exit status: 1".to_string(),
                diagnostics: format!("{}: Invalid data found when processing input", name),
            });
        }

        let len = tokio::fs::metadata(source)
            .await
            .map_err(|source| EncodeError::Spawn {
                program: "fake-encoder".to_string(),
                source,
            })?
            .len();
        tokio::fs::write(destination, vec![7u8; (len / 4) as usize])
            .await
            .map_err(|source| EncodeError::Spawn {
                program: "fake-encoder".to_string(),
                source,
            })
    }
}
