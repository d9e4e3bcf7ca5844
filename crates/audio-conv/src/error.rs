//! Recoverable conversion errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    /// Channel remap other than mono -> stereo or 5.1 -> stereo.
    #[error("can't change number of channels ({from} to {to})")]
    UnsupportedChannels { from: u16, to: u16 },

    #[error("resampling disabled, can't convert {from}Hz to {to}Hz")]
    ResamplingDisabled { from: u32, to: u32 },

    #[error("can't initialize {backend} resampler for {channels} channels: {reason}")]
    BackendInit {
        backend: &'static str,
        channels: u16,
        reason: String,
    },

    /// The backend failed while processing a chunk.
    #[error("{backend} resampler error: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },

    #[error("invalid sound parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
