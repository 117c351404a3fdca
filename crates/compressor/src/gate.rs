use std::path::Path;
use log::debug;
use tokio::sync::Mutex;
use crate::config::Quality;
use crate::encoder::Encoder;
use crate::error::{EncodeError, Error};

/// Owns the encoder and admits at most one invocation at a time, however many workers call in.
pub struct SerializedEncoder<E> {
    encoder: E,
    lock: Mutex<()>,
}

impl<E: Encoder> SerializedEncoder<E> {
    pub fn new(encoder: E) -> Self {
        SerializedEncoder {
            encoder,
            lock: Mutex::new(()),
        }
    }

    /// Run one conversion while holding the gate. The guard drops on every exit path.
    pub async fn encode(&self, source: &Path, destination: &Path, quality: Quality) -> Result<(), EncodeError> {
        let _guard = self.lock.lock().await;
        debug!("encoder gate acquired for {}", source.display());
        self.encoder.encode(source, destination, quality).await
    }

    pub async fn check_available(&self) -> Result<(), Error> {
        self.encoder.check_available().await
    }

    pub fn inner(&self) -> &E {
        &self.encoder
    }
}
