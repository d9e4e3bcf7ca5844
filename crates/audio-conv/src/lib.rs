//! PCM sample-format, channel and sample-rate conversion.
//!
//! Create a [`Conversion`] for a source/destination [`SoundParams`] pair and
//! feed it raw interleaved chunks; it returns newly allocated chunks in the
//! destination encoding.

pub mod buffer;
pub mod config;
pub mod conversion;
pub mod error;
pub mod format;
pub mod mixer;
pub mod narrow;
pub mod resample;
pub mod transcode;

pub use buffer::SampleBuffer;
pub use config::{ConversionConfig, ResampleBackend, ResampleMethod};
pub use conversion::Conversion;
pub use error::{ConversionError, Result};
pub use format::{Endianness, SampleFormat, SampleType, SoundParams};
pub use narrow::Narrowing;
