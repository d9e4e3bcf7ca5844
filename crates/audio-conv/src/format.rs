//! Sample encodings and stream parameters.
//!
//! A [`SampleFormat`] describes how a single sample is laid out in memory:
//! - the numeric type and bit width ([`SampleType`])
//! - the byte order of multi-byte containers ([`Endianness`])
//!
//! [`SoundParams`] pairs a format with a sample rate and channel count and
//! describes one endpoint of a conversion.

use std::fmt;

/// Largest value of a signed 24-bit sample.
pub const S24_MAX: i32 = 8_388_607;
/// Smallest value of a signed 24-bit sample.
pub const S24_MIN: i32 = -8_388_608;
/// Largest value of an unsigned 24-bit sample.
pub const U24_MAX: u32 = 16_777_215;

/// Numeric type of a sample.
///
/// `U24`/`S24` use a 4-byte container with the value in the low 24 bits;
/// the `Packed` variants store exactly three bytes per sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    S8,
    U16,
    S16,
    U24,
    S24,
    U24Packed,
    S24Packed,
    U32,
    S32,
    F32,
}

impl SampleType {
    pub const ALL: [SampleType; 11] = [
        SampleType::U8,
        SampleType::S8,
        SampleType::U16,
        SampleType::S16,
        SampleType::U24,
        SampleType::S24,
        SampleType::U24Packed,
        SampleType::S24Packed,
        SampleType::U32,
        SampleType::S32,
        SampleType::F32,
    ];

    /// Bytes occupied by one sample of this type.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::U8 | SampleType::S8 => 1,
            SampleType::U16 | SampleType::S16 => 2,
            SampleType::U24Packed | SampleType::S24Packed => 3,
            SampleType::U24
            | SampleType::S24
            | SampleType::U32
            | SampleType::S32
            | SampleType::F32 => 4,
        }
    }

    /// Significant bits of the encoded value.
    pub fn bits(self) -> u32 {
        match self {
            SampleType::U8 | SampleType::S8 => 8,
            SampleType::U16 | SampleType::S16 => 16,
            SampleType::U24
            | SampleType::S24
            | SampleType::U24Packed
            | SampleType::S24Packed => 24,
            SampleType::U32 | SampleType::S32 | SampleType::F32 => 32,
        }
    }

    pub fn is_float(self) -> bool {
        self == SampleType::F32
    }

    /// `true` for signed integer types and for float.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            SampleType::S8
                | SampleType::S16
                | SampleType::S24
                | SampleType::S24Packed
                | SampleType::S32
                | SampleType::F32
        )
    }

    /// The same width with the opposite signedness.
    ///
    /// Returns `None` for float, which has no unsigned counterpart.
    pub fn toggled_sign(self) -> Option<SampleType> {
        let ty = match self {
            SampleType::U8 => SampleType::S8,
            SampleType::S8 => SampleType::U8,
            SampleType::U16 => SampleType::S16,
            SampleType::S16 => SampleType::U16,
            SampleType::U24 => SampleType::S24,
            SampleType::S24 => SampleType::U24,
            SampleType::U24Packed => SampleType::S24Packed,
            SampleType::S24Packed => SampleType::U24Packed,
            SampleType::U32 => SampleType::S32,
            SampleType::S32 => SampleType::U32,
            SampleType::F32 => return None,
        };
        Some(ty)
    }

    /// Whether byte order matters for this type.
    ///
    /// Single-byte samples have no byte order and float is always carried in
    /// host order.
    pub fn has_byte_order(self) -> bool {
        !matches!(self, SampleType::U8 | SampleType::S8 | SampleType::F32)
    }

    fn label(self) -> &'static str {
        match self {
            SampleType::U8 => "U8",
            SampleType::S8 => "S8",
            SampleType::U16 => "U16",
            SampleType::S16 => "S16",
            SampleType::U24 => "U24",
            SampleType::S24 => "S24",
            SampleType::U24Packed => "U24_3",
            SampleType::S24Packed => "S24_3",
            SampleType::U32 => "U32",
            SampleType::S32 => "S32",
            SampleType::F32 => "FLOAT",
        }
    }
}

/// Byte order of a sample container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
    /// Whatever the host uses; see [`Endianness::resolve`].
    Native,
}

impl Endianness {
    /// Byte order of the machine running the conversion.
    pub const fn host() -> Endianness {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// Replace [`Endianness::Native`] with the concrete host order.
    pub fn resolve(self) -> Endianness {
        match self {
            Endianness::Native => Endianness::host(),
            other => other,
        }
    }

    /// The other concrete byte order.
    pub fn opposite(self) -> Endianness {
        match self.resolve() {
            Endianness::Little => Endianness::Big,
            _ => Endianness::Little,
        }
    }
}

/// Full description of a sample encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleFormat {
    pub sample_type: SampleType,
    pub endianness: Endianness,
}

impl SampleFormat {
    pub fn new(sample_type: SampleType, endianness: Endianness) -> Self {
        Self {
            sample_type,
            endianness,
        }
    }

    /// Format in host byte order.
    pub fn native(sample_type: SampleType) -> Self {
        Self::new(sample_type, Endianness::Native)
    }

    pub fn with_type(self, sample_type: SampleType) -> Self {
        Self {
            sample_type,
            ..self
        }
    }

    pub fn with_endianness(self, endianness: Endianness) -> Self {
        Self { endianness, ..self }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.sample_type.bytes_per_sample()
    }

    /// Same container width, i.e. the samples can be reinterpreted without
    /// resizing the buffer.
    pub fn same_width(&self, other: &SampleFormat) -> bool {
        self.bytes_per_sample() == other.bytes_per_sample()
    }

    /// Copy of this format with a concrete byte order.
    pub fn resolved(self) -> Self {
        self.with_endianness(self.endianness.resolve())
    }

    /// `true` when the bytes are already in host order (or order is irrelevant).
    pub fn is_native(&self) -> bool {
        !self.sample_type.has_byte_order() || self.endianness.resolve() == Endianness::host()
    }

    /// Whether two formats disagree on byte order in a way that requires a swap.
    pub fn needs_swap_to(&self, other: &SampleFormat) -> bool {
        self.sample_type.has_byte_order()
            && self.endianness.resolve() != other.endianness.resolve()
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.sample_type.has_byte_order() {
            return f.write_str(self.sample_type.label());
        }
        let order = match self.endianness {
            Endianness::Little => "LE",
            Endianness::Big => "BE",
            Endianness::Native => "NE",
        };
        write!(f, "{} ({order})", self.sample_type.label())
    }
}

/// One endpoint of a conversion: rate, channel layout and encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoundParams {
    /// Sample rate in Hz.
    pub rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    pub format: SampleFormat,
}

impl SoundParams {
    pub fn new(rate: u32, channels: u16, format: SampleFormat) -> Self {
        Self {
            rate,
            channels,
            format,
        }
    }

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }

    pub fn is_valid(&self) -> bool {
        self.rate > 0 && self.channels > 0
    }
}

impl fmt::Display for SoundParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz {}ch {}", self.rate, self.channels, self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_sample_matches_container() {
        assert_eq!(SampleType::S8.bytes_per_sample(), 1);
        assert_eq!(SampleType::U16.bytes_per_sample(), 2);
        assert_eq!(SampleType::S24Packed.bytes_per_sample(), 3);
        assert_eq!(SampleType::S24.bytes_per_sample(), 4);
        assert_eq!(SampleType::F32.bytes_per_sample(), 4);
    }

    #[test]
    fn toggled_sign_is_an_involution() {
        for ty in SampleType::ALL.into_iter().filter(|ty| !ty.is_float()) {
            let toggled = ty.toggled_sign().unwrap();
            assert_ne!(toggled, ty);
            assert_eq!(toggled.toggled_sign(), Some(ty));
            assert_eq!(toggled.bytes_per_sample(), ty.bytes_per_sample());
        }
        assert!(SampleType::F32.toggled_sign().is_none());
    }

    #[test]
    fn native_resolves_to_host_order() {
        assert_eq!(Endianness::Native.resolve(), Endianness::host());
        assert_ne!(Endianness::Native.opposite(), Endianness::host());
        assert!(SampleFormat::native(SampleType::S16).is_native());
        let foreign = SampleFormat::new(SampleType::S16, Endianness::host().opposite());
        assert!(!foreign.is_native());
    }

    #[test]
    fn byte_order_is_irrelevant_for_bytes_and_float() {
        let opposite = Endianness::host().opposite();
        assert!(SampleFormat::new(SampleType::U8, opposite).is_native());
        assert!(SampleFormat::new(SampleType::F32, opposite).is_native());
        let a = SampleFormat::new(SampleType::S8, Endianness::Little);
        let b = SampleFormat::new(SampleType::S8, Endianness::Big);
        assert!(!a.needs_swap_to(&b));
    }

    #[test]
    fn same_width_groups_containers() {
        let s24 = SampleFormat::native(SampleType::S24);
        let s32 = SampleFormat::native(SampleType::S32);
        let s24_3 = SampleFormat::native(SampleType::S24Packed);
        assert!(s24.same_width(&s32));
        assert!(!s24.same_width(&s24_3));
    }

    #[test]
    fn display_includes_byte_order() {
        let fmt = SampleFormat::new(SampleType::S16, Endianness::Little);
        assert_eq!(fmt.to_string(), "S16 (LE)");
        assert_eq!(SampleFormat::native(SampleType::F32).to_string(), "FLOAT");
        let params = SoundParams::new(44_100, 2, fmt);
        assert_eq!(params.to_string(), "44100Hz 2ch S16 (LE)");
        assert_eq!(params.frame_bytes(), 4);
    }
}
