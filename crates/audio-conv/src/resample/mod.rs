//! Sample rate conversion.
//!
//! [`Resampler`] adapts a batch-oriented [`RateBackend`] to arbitrary chunk
//! sizes. Backends only accept whole batches of frames, so every call appends
//! the new samples to a carryover buffer, runs as many whole batches as are
//! available and keeps the rest for the next call.
//!
//! ## Invariants
//! - After [`Resampler::process`] returns, the carryover holds fewer frames
//!   than the backend's next batch.
//! - An empty carryover owns no allocation.
//! - A backend failure discards the carryover; the next call starts clean.
//! - Leading output covering the backend's filter delay is dropped, and
//!   [`Resampler::drain`] pads with silence until the stream has produced
//!   `round(frames_in * ratio)` frames in total.

mod fft;
mod sinc;

pub use fft::FftBackend;
pub use sinc::SincBackend;

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::Indexing;

use crate::config::{ConversionConfig, ResampleBackend};
use crate::error::{ConversionError, Result};

/// A rate conversion algorithm working on interleaved `f32` batches.
pub trait RateBackend: Send {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Frames the next call to [`RateBackend::process`] consumes.
    fn input_frames_next(&self) -> usize;

    /// Upper bound on frames produced by a single call.
    fn output_frames_max(&self) -> usize;

    /// Output frames by which the first input frame is delayed.
    fn output_delay(&self) -> usize {
        0
    }

    /// Convert one batch.
    ///
    /// `input` holds at least [`input_frames_next`](RateBackend::input_frames_next)
    /// interleaved frames, of which the first `frames` are real audio. With
    /// `partial` set the rest is padding and the backend treats the batch as
    /// the end of the stream. Returns `(frames_consumed, frames_generated)`.
    fn process(
        &mut self,
        input: &[f32],
        frames: usize,
        output: &mut [f32],
        partial: bool,
    ) -> Result<(usize, usize)>;

    /// Forget all filter state.
    fn reset(&mut self);
}

/// Drive one batch through a rubato resampler.
fn process_rubato(
    inner: &mut dyn rubato::Resampler<f32>,
    backend: &'static str,
    channels: usize,
    input: &[f32],
    frames: usize,
    output: &mut [f32],
    partial: bool,
) -> Result<(usize, usize)> {
    let failed = |reason: String| ConversionError::Backend { backend, reason };

    let input_adapter = InterleavedSlice::new(input, channels, input.len() / channels)
        .map_err(|e| failed(format!("interleaved slice (input) error: {e:#}")))?;

    let out_capacity_frames = output.len() / channels;
    let mut output_adapter = InterleavedSlice::new_mut(output, channels, out_capacity_frames)
        .map_err(|e| failed(format!("interleaved slice (output) error: {e:#}")))?;

    let indexing = Indexing {
        input_offset: 0,
        output_offset: 0,
        active_channels_mask: None,
        partial_len: partial.then_some(frames),
    };

    inner
        .process_into_buffer(&input_adapter, &mut output_adapter, Some(&indexing))
        .map_err(|e| failed(format!("{e:#}")))
}

/// Carryover-managing front end over a [`RateBackend`].
pub struct Resampler {
    backend: Box<dyn RateBackend>,
    channels: usize,
    ratio: f64,
    /// Interleaved input not yet consumed by the backend.
    carryover: Vec<f32>,
    /// Output of the current batch, sized for the backend's worst case.
    scratch: Vec<f32>,
    /// Leading output frames still to drop for the filter delay.
    delay_left: usize,
    /// Input frames consumed since the stream started.
    frames_in: u64,
    /// Output frames returned since the stream started.
    frames_out: u64,
}

impl Resampler {
    /// Build the backend selected by `config` for `channels` interleaved
    /// channels converting `from_rate` to `to_rate`.
    pub fn new(
        from_rate: u32,
        to_rate: u32,
        channels: u16,
        config: &ConversionConfig,
    ) -> Result<Self> {
        let backend: Box<dyn RateBackend> = match config.resample_backend {
            ResampleBackend::General => Box::new(SincBackend::new(
                from_rate,
                to_rate,
                channels,
                config.resample_method,
                config.effective_chunk_frames(),
            )?),
            ResampleBackend::LowLatency => Box::new(FftBackend::new(
                from_rate,
                to_rate,
                channels,
                config.effective_low_latency_quality(),
            )?),
        };
        Ok(Self::with_backend(backend, from_rate, to_rate, channels))
    }

    pub fn with_backend(
        backend: Box<dyn RateBackend>,
        from_rate: u32,
        to_rate: u32,
        channels: u16,
    ) -> Self {
        let channels = channels.max(1) as usize;
        let scratch = vec![0.0; backend.output_frames_max() * channels];
        let delay_left = backend.output_delay();
        Self {
            backend,
            channels,
            ratio: to_rate as f64 / from_rate as f64,
            carryover: Vec::new(),
            scratch,
            delay_left,
            frames_in: 0,
            frames_out: 0,
        }
    }

    /// Output rate divided by input rate.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whole frames waiting for the next call.
    pub fn carryover_frames(&self) -> usize {
        self.carryover.len() / self.channels
    }

    /// Resample interleaved `input`, returning every frame the backend could
    /// produce from it plus the previous carryover.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let ch = self.channels;
        self.carryover.extend_from_slice(input);

        let available = self.carryover.len() / ch;
        let expected = (available as f64 * self.ratio).ceil() as usize + 1;
        let mut out = Vec::with_capacity(expected * ch);
        let mut pos = 0;

        loop {
            let needed = self.backend.input_frames_next();
            if needed == 0 || available - pos < needed {
                break;
            }

            let batch = &self.carryover[pos * ch..(pos + needed) * ch];
            let (consumed, generated) =
                match self.backend.process(batch, needed, &mut self.scratch, false) {
                    Ok(counts) => counts,
                    Err(e) => {
                        tracing::error!("resampler process error: {e}");
                        self.carryover = Vec::new();
                        return Err(e);
                    }
                };

            self.emit(generated, u64::MAX, &mut out);
            if consumed == 0 {
                break;
            }
            pos += consumed;
            self.frames_in += consumed as u64;
        }

        self.carryover.drain(..pos * ch);
        if self.carryover.is_empty() {
            self.carryover = Vec::new();
        }
        tracing::debug!(
            carryover_frames = self.carryover_frames(),
            produced_frames = out.len() / ch,
            "resampled chunk"
        );

        Ok(out)
    }

    /// Flush the carryover and the backend's filter delay at the end of a
    /// stream, then reset the backend for the next one.
    ///
    /// Silence is fed until the stream has produced `round(frames_in * ratio)`
    /// frames, counting everything [`Resampler::process`] already returned.
    pub fn drain(&mut self) -> Result<Vec<f32>> {
        let ch = self.channels;
        let carry = self.carryover_frames();
        let mut batch = std::mem::take(&mut self.carryover);
        if carry == 0 && self.frames_in == 0 {
            self.restart();
            return Ok(Vec::new());
        }

        let wanted = ((self.frames_in + carry as u64) as f64 * self.ratio).round() as u64;
        let missing = wanted.saturating_sub(self.frames_out) as usize;
        // Enough silence to push out the delay and anything the backend holds.
        let padding_limit = 2 * ((missing + self.delay_left + self.backend.output_frames_max())
            as f64
            / self.ratio)
            .ceil() as usize;

        let mut out = Vec::with_capacity(missing * ch);
        let mut real = carry;
        let mut padded = 0;
        let result = loop {
            if self.frames_out >= wanted || padded > padding_limit {
                break Ok(());
            }

            let needed = self.backend.input_frames_next().max(real).max(1);
            batch.truncate(real * ch);
            batch.resize(needed * ch, 0.0);
            match self.backend.process(&batch, real, &mut self.scratch, true) {
                Ok((_, generated)) => self.emit(generated, wanted, &mut out),
                Err(e) => break Err(e),
            }
            padded += needed - real;
            real = 0;
        };

        let frames_out = self.frames_out;
        self.restart();
        result.inspect_err(|e| {
            tracing::error!("resampler drain error: {e}");
        })?;

        if frames_out < wanted {
            tracing::warn!(frames_out, wanted, "resampler drained short");
        }
        tracing::debug!(carry, frames = out.len() / ch, "drained resampler");
        Ok(out)
    }

    /// Drop pending input and filter state.
    pub fn reset(&mut self) {
        self.carryover = Vec::new();
        self.restart();
    }

    /// Append the usable part of the last batch to `out`, dropping frames
    /// that fall inside the filter delay and anything past `limit` frames of
    /// total output.
    fn emit(&mut self, generated: usize, limit: u64, out: &mut Vec<f32>) {
        let ch = self.channels;
        let skip = generated.min(self.delay_left);
        self.delay_left -= skip;
        let room = limit.saturating_sub(self.frames_out);
        let keep = ((generated - skip) as u64).min(room) as usize;
        out.extend_from_slice(&self.scratch[skip * ch..(skip + keep) * ch]);
        self.frames_out += keep as u64;
    }

    fn restart(&mut self) {
        self.backend.reset();
        self.delay_left = self.backend.output_delay();
        self.frames_in = 0;
        self.frames_out = 0;
    }
}
