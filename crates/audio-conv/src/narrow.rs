//! Fixed -> fixed bit-depth shortcuts.
//!
//! When the rate does not change and the destination is narrower than the
//! source, samples are truncated by shifting instead of going through float.
//! Truncation discards the low bits, so results can differ by one count from
//! the float path, which rounds.
//!
//! The shortcut keeps the signedness of the source; a remaining
//! signed/unsigned mismatch is fixed by the later sign toggle.

use std::fmt;

use crate::buffer::SampleBuffer;
use crate::format::SampleType;
use crate::transcode::write_packed_24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Narrowing {
    /// 32-bit -> packed 24-bit.
    Bits32ToPacked24,
    /// 32-bit -> 16-bit.
    Bits32To16,
    /// 32-bit -> 24-bit in a 4-byte container.
    Bits32To24,
    /// 24-bit container -> 16-bit.
    Bits24To16,
}

impl Narrowing {
    /// Pick the shortcut for `current -> to`, checked in priority order.
    ///
    /// The caller is responsible for checking that the rates match.
    pub fn select(current: SampleType, to: SampleType) -> Option<Narrowing> {
        use SampleType::*;

        let from_32 = matches!(current, S32 | U32);
        let from_24 = matches!(current, S24 | U24);

        if from_32 && matches!(to, S24Packed | U24Packed) {
            Some(Narrowing::Bits32ToPacked24)
        } else if from_32 && matches!(to, S16 | U16) {
            Some(Narrowing::Bits32To16)
        } else if from_32 && matches!(to, S24 | U24) {
            Some(Narrowing::Bits32To24)
        } else if from_24 && matches!(to, S16 | U16) {
            Some(Narrowing::Bits24To16)
        } else {
            None
        }
    }

    /// Type produced from `current`, keeping its signedness.
    pub fn output_type(self, current: SampleType) -> SampleType {
        let signed = current.is_signed();
        match (self, signed) {
            (Narrowing::Bits32ToPacked24, true) => SampleType::S24Packed,
            (Narrowing::Bits32ToPacked24, false) => SampleType::U24Packed,
            (Narrowing::Bits32To16 | Narrowing::Bits24To16, true) => SampleType::S16,
            (Narrowing::Bits32To16 | Narrowing::Bits24To16, false) => SampleType::U16,
            (Narrowing::Bits32To24, true) => SampleType::S24,
            (Narrowing::Bits32To24, false) => SampleType::U24,
        }
    }

    /// Truncate every sample of a host-order buffer.
    pub fn apply(self, input: &SampleBuffer) -> SampleBuffer {
        let format = input.format();
        let ty = format.sample_type;
        let out_ty = self.output_type(ty);
        let signed = ty.is_signed();
        let words = input.as_bytes().chunks_exact(4).map(|b| [b[0], b[1], b[2], b[3]]);

        let mut out = Vec::with_capacity(input.samples() * out_ty.bytes_per_sample());
        match self {
            Narrowing::Bits32ToPacked24 => {
                for w in words {
                    // Either signedness keeps the top three bytes.
                    let v = u32::from_ne_bytes(w) >> 8;
                    let mut packed = [0u8; 3];
                    write_packed_24(v, &mut packed);
                    out.extend_from_slice(&packed);
                }
            }
            Narrowing::Bits32To16 => {
                for w in words {
                    let v = if signed {
                        (i32::from_ne_bytes(w) >> 16) as u16
                    } else {
                        (u32::from_ne_bytes(w) >> 16) as u16
                    };
                    out.extend_from_slice(&v.to_ne_bytes());
                }
            }
            Narrowing::Bits32To24 => {
                for w in words {
                    let v = if signed {
                        (i32::from_ne_bytes(w) >> 8) as u32
                    } else {
                        u32::from_ne_bytes(w) >> 8
                    };
                    out.extend_from_slice(&v.to_ne_bytes());
                }
            }
            Narrowing::Bits24To16 => {
                // The container's high byte is ignored; only bits 8..24 survive.
                for w in words {
                    let v = (u32::from_ne_bytes(w) >> 8) as u16;
                    out.extend_from_slice(&v.to_ne_bytes());
                }
            }
        }

        SampleBuffer::new(out, format.with_type(out_ty))
    }
}

impl fmt::Display for Narrowing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Narrowing::Bits32ToPacked24 => "32bit -> 24_3bit",
            Narrowing::Bits32To16 => "32bit -> 16bit",
            Narrowing::Bits32To24 => "32bit -> 24bit",
            Narrowing::Bits24To16 => "24bit -> 16bit",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Endianness, SampleFormat};
    use crate::transcode::{read_packed_24, sign_extend_24};

    fn native(ty: SampleType) -> SampleFormat {
        SampleFormat::new(ty, Endianness::host())
    }

    fn s32_buffer(values: &[i32]) -> SampleBuffer {
        let bytes = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        SampleBuffer::new(bytes, native(SampleType::S32))
    }

    const S32_VALUES: [i32; 7] = [0, 1, -1, 0x1234_5678, -0x1234_5678, i32::MAX, i32::MIN];

    #[test]
    fn selection_follows_priority() {
        use SampleType::*;
        assert_eq!(Narrowing::select(S32, S24Packed), Some(Narrowing::Bits32ToPacked24));
        assert_eq!(Narrowing::select(U32, S16), Some(Narrowing::Bits32To16));
        assert_eq!(Narrowing::select(S32, U24), Some(Narrowing::Bits32To24));
        assert_eq!(Narrowing::select(S24, S16), Some(Narrowing::Bits24To16));
        assert_eq!(Narrowing::select(S24Packed, S16), None);
        assert_eq!(Narrowing::select(S16, S8), None);
        assert_eq!(Narrowing::select(S32, S32), None);
        assert_eq!(Narrowing::select(F32, S16), None);
    }

    #[test]
    fn s32_to_s16_truncates() {
        let out = Narrowing::Bits32To16.apply(&s32_buffer(&S32_VALUES));
        assert_eq!(out.format().sample_type, SampleType::S16);
        let got: Vec<i16> = out
            .as_bytes()
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect();
        let expected: Vec<i16> = S32_VALUES.iter().map(|v| (v >> 16) as i16).collect();
        assert_eq!(got, expected);
        // -1 >> 16 stays -1: truncation toward negative infinity, not rounding.
        assert_eq!(got[2], -1);
    }

    #[test]
    fn u32_to_u16_is_logical_shift() {
        let bytes = [0xFFFF_0000u32, 0x8000_FFFF]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let input = SampleBuffer::new(bytes, native(SampleType::U32));
        let out = Narrowing::Bits32To16.apply(&input);
        assert_eq!(out.format().sample_type, SampleType::U16);
        let got: Vec<u16> = out
            .as_bytes()
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(got, vec![0xFFFF, 0x8000]);
    }

    #[test]
    fn s32_to_packed_keeps_top_bytes() {
        let out = Narrowing::Bits32ToPacked24.apply(&s32_buffer(&S32_VALUES));
        assert_eq!(out.format().sample_type, SampleType::S24Packed);
        assert_eq!(out.len(), S32_VALUES.len() * 3);
        let got: Vec<i32> = out
            .as_bytes()
            .chunks_exact(3)
            .map(|b| sign_extend_24(read_packed_24(b)))
            .collect();
        let expected: Vec<i32> = S32_VALUES.iter().map(|v| v >> 8).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn s32_to_s24_container_is_sign_extended() {
        let out = Narrowing::Bits32To24.apply(&s32_buffer(&S32_VALUES));
        assert_eq!(out.format().sample_type, SampleType::S24);
        assert_eq!(out.len(), S32_VALUES.len() * 4);
        let got: Vec<i32> = out
            .as_bytes()
            .chunks_exact(4)
            .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let expected: Vec<i32> = S32_VALUES.iter().map(|v| v >> 8).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn s24_to_s16_drops_low_byte() {
        let values = [0x0012_3456i32, -0x0012_3456, 0x007F_FFFF, -0x0080_0000];
        let bytes = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let input = SampleBuffer::new(bytes, native(SampleType::S24));
        let out = Narrowing::Bits24To16.apply(&input);
        let got: Vec<i16> = out
            .as_bytes()
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(got, vec![0x1234, -0x1235, i16::MAX, i16::MIN]);
    }

    #[test]
    fn display_names_widths() {
        assert_eq!(Narrowing::Bits32To16.to_string(), "32bit -> 16bit");
        assert_eq!(Narrowing::Bits32ToPacked24.to_string(), "32bit -> 24_3bit");
    }
}
