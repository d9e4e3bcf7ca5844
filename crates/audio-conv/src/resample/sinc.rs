//! General-purpose backend: rubato's asynchronous sinc and polynomial
//! resamplers.

use rubato::{
    Async, FixedAsync, PolynomialDegree, SincInterpolationParameters, SincInterpolationType,
    WindowFunction, calculate_cutoff,
};

use super::{RateBackend, process_rubato};
use crate::config::ResampleMethod;
use crate::error::{ConversionError, Result};

const NAME: &str = "general";

/// Largest allowed deviation from the nominal ratio.
const MAX_RESAMPLE_RATIO_RELATIVE: f64 = 1.1;

fn sinc_parameters(method: ResampleMethod) -> Option<SincInterpolationParameters> {
    let (sinc_len, oversampling_factor, interpolation, window) = match method {
        ResampleMethod::SincBestQuality => (
            256,
            256,
            SincInterpolationType::Cubic,
            WindowFunction::BlackmanHarris2,
        ),
        ResampleMethod::SincMediumQuality => (
            128,
            256,
            SincInterpolationType::Cubic,
            WindowFunction::BlackmanHarris2,
        ),
        ResampleMethod::SincFastest => {
            (64, 1024, SincInterpolationType::Linear, WindowFunction::Hann2)
        }
        ResampleMethod::ZeroOrderHold | ResampleMethod::Linear => return None,
    };

    Some(SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation,
        oversampling_factor,
        window,
    })
}

fn polynomial_degree(method: ResampleMethod) -> PolynomialDegree {
    match method {
        ResampleMethod::ZeroOrderHold => PolynomialDegree::Nearest,
        _ => PolynomialDegree::Linear,
    }
}

/// Sinc, linear or zero-order-hold interpolation with a fixed input batch.
pub struct SincBackend {
    inner: Box<dyn rubato::Resampler<f32> + Send>,
    channels: usize,
}

impl SincBackend {
    pub fn new(
        from_rate: u32,
        to_rate: u32,
        channels: u16,
        method: ResampleMethod,
        chunk_frames: usize,
    ) -> Result<Self> {
        let f_ratio = to_rate as f64 / from_rate as f64;
        let nch = channels as usize;

        let built = match sinc_parameters(method) {
            Some(params) => Async::<f32>::new_sinc(
                f_ratio,
                MAX_RESAMPLE_RATIO_RELATIVE,
                &params,
                chunk_frames,
                nch,
                FixedAsync::Input,
            )
            .map(|r| Box::new(r) as Box<dyn rubato::Resampler<f32> + Send>),
            None => Async::<f32>::new_poly(
                f_ratio,
                MAX_RESAMPLE_RATIO_RELATIVE,
                polynomial_degree(method),
                chunk_frames,
                nch,
                FixedAsync::Input,
            )
            .map(|r| Box::new(r) as Box<dyn rubato::Resampler<f32> + Send>),
        };

        let inner = built.map_err(|e| {
            tracing::error!("resampler init error: {e:#}");
            ConversionError::BackendInit {
                backend: NAME,
                channels,
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(%method, chunk_frames, f_ratio, "general resampler ready");
        Ok(Self {
            inner,
            channels: nch,
        })
    }
}

impl RateBackend for SincBackend {
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
