//! Low-latency backend: rubato's synchronous FFT resampler.
//!
//! The block length grows with the quality setting: `quality * 8` input frames
//! per batch, so 128 frames at the lowest quality and 768 at the highest.

use rubato::{Fft, FixedSync};

use super::{RateBackend, process_rubato};
use crate::error::{ConversionError, Result};

const NAME: &str = "low-latency";

/// Input frames per batch for each unit of quality.
const FRAMES_PER_QUALITY: usize = 8;

pub struct FftBackend {
    inner: Box<dyn rubato::Resampler<f32> + Send>,
    channels: usize,
}

impl FftBackend {
    pub fn new(from_rate: u32, to_rate: u32, channels: u16, quality: u32) -> Result<Self> {
        let chunk_frames = quality as usize * FRAMES_PER_QUALITY;

        let inner = Fft::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            chunk_frames,
            1,
            channels as usize,
            FixedSync::Input,
        )
        .map_err(|e| {
            tracing::error!("resampler init error: {e:#}");
            ConversionError::BackendInit {
                backend: NAME,
                channels,
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(quality, chunk_frames, "low-latency resampler ready");
        Ok(Self {
            inner: Box::new(inner),
            channels: channels as usize,
        })
    }
}

impl RateBackend for FftBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_frames_next(&self) -> usize {
        self.inner.input_frames_next()
    }

    fn output_frames_max(&self) -> usize {
        self.inner.output_frames_max()
    }

    fn output_delay(&self) -> usize {
        self.inner.output_delay()
    }

    fn process(
        &mut self,
        input: &[f32],
        frames: usize,
        output: &mut [f32],
        partial: bool,
    ) -> Result<(usize, usize)> {
        process_rubato(
            self.inner.as_mut(),
            NAME,
            self.channels,
            input,
            frames,
            output,
            partial,
        )
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}
