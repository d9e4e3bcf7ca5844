//! Per-stream conversion pipeline.
//!
//! A [`Conversion`] is created once for a (source, destination) pair and then
//! fed successive chunks. Each chunk runs through these stages, skipping the
//! ones that are not needed:
//!
//! 1. byte-swap to host order
//! 2. fast-path narrowing (same rate only)
//! 3. fixed -> float, when resampling, producing float, or changing width
//! 4. resampling
//! 5. float -> destination type, or a sign toggle when only signedness differs
//! 6. channel remix
//!
//! A 5.1 downmix into a type the mixer has no integer path for is done on the
//! float samples, between stages 4 and 5.
//! 7. byte-swap to the destination order
//!
//! The caller's input is never touched; the first stage works on a copy.

use crate::buffer::SampleBuffer;
use crate::config::{ConversionConfig, ResampleBackend};
use crate::error::{ConversionError, Result};
use crate::format::SoundParams;
use crate::mixer;
use crate::narrow::Narrowing;
use crate::resample::Resampler;
use crate::transcode::{fixed_to_float, float_to_fixed};

/// Samples between stages: still in a fixed-point encoding, or promoted to
/// host-order `f32`.
enum Samples {
    Fixed(SampleBuffer),
    Float(Vec<f32>),
}

/// Conversion state for one (source, destination) pair.
pub struct Conversion {
    from: SoundParams,
    /// Destination with its byte order resolved to a concrete value.
    to: SoundParams,
    narrowing: Option<Narrowing>,
    resampler: Option<Resampler>,
    /// Downmix on `f32` samples before the destination type is produced.
    float_downmix: bool,
}

impl Conversion {
    /// Validate the pair and set up any resampler it needs.
    ///
    /// Fails for channel remaps other than 1 -> 2 and 6 -> 2, and for a rate
    /// change when resampling is disabled or the backend can't be built.
    pub fn new(from: SoundParams, to: SoundParams, config: &ConversionConfig) -> Result<Self> {
        for params in [&from, &to] {
            if !params.is_valid() {
                tracing::error!(%params, "invalid sound parameters");
                return Err(ConversionError::InvalidParams(params.to_string()));
            }
        }

        let to = SoundParams {
            format: to.format.resolved(),
            ..to
        };

        if !mixer::is_supported_remap(from.channels, to.channels) {
            tracing::error!(
                from = from.channels,
                to = to.channels,
                "can't change number of channels"
            );
            return Err(ConversionError::UnsupportedChannels {
                from: from.channels,
                to: to.channels,
            });
        }

        let float_downmix = from.channels == 6
            && to.channels == 2
            && !mixer::supports_downmix(to.format.sample_type);
        if float_downmix {
            tracing::debug!(format = %to.format, "downmixing in float");
        }

        let resampler = if from.rate != to.rate {
            if !config.enable_resample {
                tracing::error!(
                    from = from.rate,
                    to = to.rate,
                    "resampling disabled, can't change sample rate"
                );
                return Err(ConversionError::ResamplingDisabled {
                    from: from.rate,
                    to: to.rate,
                });
            }

            let resampler = Resampler::new(from.rate, to.rate, from.channels, config)?;
            match config.resample_backend {
                ResampleBackend::General => tracing::info!(
                    from_hz = from.rate,
                    to_hz = to.rate,
                    method = %config.resample_method,
                    "resampling"
                ),
                ResampleBackend::LowLatency => tracing::info!(
                    from_hz = from.rate,
                    to_hz = to.rate,
                    quality = config.effective_low_latency_quality(),
                    "resampling with low-latency backend"
                ),
            }
            Some(resampler)
        } else {
            None
        };

        let narrowing = if from.rate == to.rate && !float_downmix {
            Narrowing::select(from.format.sample_type, to.format.sample_type)
        } else {
            None
        };
        if let Some(narrowing) = narrowing {
            tracing::info!("fast conversion: {narrowing}");
        }

        tracing::info!(from = %from, to = %to, "conversion created");
        Ok(Self {
            from,
            to,
            narrowing,
            resampler,
            float_downmix,
        })
    }

    pub fn from(&self) -> SoundParams {
        self.from
    }

    pub fn to(&self) -> SoundParams {
        self.to
    }

    pub fn is_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// The narrowing shortcut used for every chunk, if any.
    pub fn fast_path(&self) -> Option<Narrowing> {
        self.narrowing
    }

    /// Convert one chunk of source-format bytes into destination-format bytes.
    ///
    /// While resampling, part of the chunk may be held back until the next
    /// call; [`Conversion::flush`] releases it at the end of a stream. On a
    /// backend error the held-back frames are discarded and the chunk is lost.
    pub fn convert(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let to_format = self.to.format;
        let mut buf = SampleBuffer::copy_from(input, self.from.format);

        if !buf.format().is_native() {
            buf.make_native();
        }

        if let Some(narrowing) = self.narrowing {
            buf = narrowing.apply(&buf);
        }

        let current = buf.format();
        let samples = if current.sample_type.is_float() {
            Samples::Float(buf.to_floats())
        } else if self.from.rate != self.to.rate
            || self.float_downmix
            || to_format.sample_type.is_float()
            || !current.same_width(&to_format)
        {
            Samples::Float(fixed_to_float(&buf))
        } else {
            Samples::Fixed(buf)
        };

        let samples = match (&mut self.resampler, samples) {
            (Some(resampler), Samples::Float(floats)) => {
                Samples::Float(resampler.process(&floats)?)
            }
            (_, samples) => samples,
        };

        Ok(self.finish(samples))
    }

    /// Release whatever the resampler still holds at the end of a stream.
    ///
    /// Returns an empty buffer when nothing is pending or the conversion does
    /// not resample.
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(Vec::new());
        };

        let tail = resampler.drain()?;
        if tail.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.finish(Samples::Float(tail)))
    }

    /// Tear down the conversion, releasing the resampler and its carryover.
    pub fn destroy(self) {
        drop(self);
    }

    /// Stages 5 to 7: destination type, channels, byte order.
    fn finish(&self, samples: Samples) -> Vec<u8> {
        let to_format = self.to.format;
        let to_type = to_format.sample_type;

        let samples = match samples {
            Samples::Float(floats) if self.float_downmix => {
                let stereo = mixer::downmix_to_stereo(&SampleBuffer::from_floats(&floats));
                Samples::Float(stereo.to_floats())
            }
            samples => samples,
        };

        let mut buf = match samples {
            Samples::Float(floats) if to_type.is_float() => SampleBuffer::from_floats(&floats),
            Samples::Float(floats) => float_to_fixed(&floats, to_type),
            Samples::Fixed(mut buf) => {
                let current = buf.format().sample_type;
                if current.toggled_sign() == Some(to_type) {
                    buf.toggle_sign();
                } else if current != to_type {
                    // Same width but a different layout, e.g. S24 in a
                    // 4-byte container -> S32.
                    buf = float_to_fixed(&fixed_to_float(&buf), to_type);
                }
                buf
            }
        };

        if self.from.channels != self.to.channels && !self.float_downmix {
            buf = mixer::remix(&buf, self.from.channels, self.to.channels);
        }

        if buf.format().needs_swap_to(&to_format) {
            tracing::debug!(to = %to_format, "restoring destination byte order");
        }
        buf.swap_endianness(to_format.endianness);

        debug_assert_eq!(buf.format().sample_type, to_type);
        buf.into_bytes()
    }
}

impl Drop for Conversion {
    fn drop(&mut self) {
        if let Some(resampler) = &self.resampler {
            tracing::debug!(
                carryover_frames = resampler.carryover_frames(),
                "releasing resampler"
            );
        }
    }
}
