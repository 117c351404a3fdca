pub mod batch;
pub mod config;
pub mod console;
pub mod encoder;
pub mod error;
pub mod gate;
pub mod job;
pub mod pool;
pub mod preview;
pub mod scan;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use batch::{BatchConverter, BatchOutcome, BatchReport};
pub use config::{ConvertConfig, InvocationStyle, Quality};
pub use encoder::{Encoder, FfmpegEncoder};
pub use error::{EncodeError, Error};
pub use job::{ConversionOutcome, Job};
pub use stats::StatsSnapshot;
