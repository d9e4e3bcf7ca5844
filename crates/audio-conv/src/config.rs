//! Conversion settings.
//!
//! Settings are plain values passed to [`Conversion::new`](crate::Conversion::new);
//! they can be built in code or loaded from a TOML file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

/// Accepted range of [`ConversionConfig::low_latency_quality`].
pub const LOW_LATENCY_QUALITY_RANGE: std::ops::RangeInclusive<u32> = 16..=96;

/// Algorithm used by the general resampling backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResampleMethod {
    SincBestQuality,
    SincMediumQuality,
    SincFastest,
    ZeroOrderHold,
    #[default]
    Linear,
}

impl ResampleMethod {
    pub fn name(self) -> &'static str {
        match self {
            ResampleMethod::SincBestQuality => "SincBestQuality",
            ResampleMethod::SincMediumQuality => "SincMediumQuality",
            ResampleMethod::SincFastest => "SincFastest",
            ResampleMethod::ZeroOrderHold => "ZeroOrderHold",
            ResampleMethod::Linear => "Linear",
        }
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResampleMethod {
    type Err = String;

    /// Names are matched case-insensitively.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let method = match s.to_ascii_lowercase().as_str() {
            "sincbestquality" => ResampleMethod::SincBestQuality,
            "sincmediumquality" => ResampleMethod::SincMediumQuality,
            "sincfastest" => ResampleMethod::SincFastest,
            "zeroorderhold" => ResampleMethod::ZeroOrderHold,
            "linear" => ResampleMethod::Linear,
            _ => return Err(format!("unknown resample method {s:?}")),
        };
        Ok(method)
    }
}

impl<'de> Deserialize<'de> for ResampleMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which resampling backend a conversion uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleBackend {
    /// Sinc/polynomial family selected by [`ResampleMethod`].
    #[default]
    General,
    /// Fixed-ratio FFT resampler tuned by `low_latency_quality`.
    LowLatency,
}

/// Settings consumed when a conversion is created.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Allow sample rate conversion at all.
    pub enable_resample: bool,
    pub resample_method: ResampleMethod,
    pub resample_backend: ResampleBackend,
    /// Quality of the low-latency backend, 16..=96.
    pub low_latency_quality: u32,
    /// Resampler batch size in frames for the general backend.
    pub chunk_frames: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            enable_resample: true,
            resample_method: ResampleMethod::default(),
            resample_backend: ResampleBackend::default(),
            low_latency_quality: 48,
            chunk_frames: 1024,
        }
    }
}

impl ConversionConfig {
    /// Load settings from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::from_toml_str(&raw).with_context(|| format!("parse config {:?}", path))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg = toml::from_str::<ConversionConfig>(raw).context("parse conversion config")?;
        Ok(cfg)
    }

    /// Low-latency quality clamped into its valid range.
    pub fn effective_low_latency_quality(&self) -> u32 {
        let quality = self.low_latency_quality;
        let clamped = quality.clamp(
            *LOW_LATENCY_QUALITY_RANGE.start(),
            *LOW_LATENCY_QUALITY_RANGE.end(),
        );
        if clamped != quality {
            tracing::warn!(quality, clamped, "low-latency resampler quality out of range");
        }
        clamped
    }

    pub fn effective_chunk_frames(&self) -> usize {
        self.chunk_frames.max(1)
    }
}
