//! Channel count changes.
//!
//! Only two remaps exist: mono -> stereo duplication and a 5.1 -> stereo
//! downmix. Anything else is refused when a conversion is set up, so reaching
//! the mixer with another pair is a bug.

use crate::buffer::SampleBuffer;
use crate::format::SampleType;

/// Weights applied to the six input channels for each output channel.
const DOWNMIX: [[f32; 6]; 2] = [
    [1.0, 0.0, 0.707, 0.707, -0.8165, -0.5774],
    [0.0, 1.0, 0.707, 0.707, 0.5774, 0.8165],
];

/// Overall gain so a full-scale 5.1 frame does not clip.
const NORMALIZATION: f32 = 0.2626;

/// Whether `from -> to` channels can be remixed at all.
pub fn is_supported_remap(from: u16, to: u16) -> bool {
    from == to || (from == 1 && to == 2) || (from == 6 && to == 2)
}

/// Sample types the downmix can operate on in their own width.
pub fn supports_downmix(ty: SampleType) -> bool {
    matches!(ty, SampleType::S16 | SampleType::S32 | SampleType::F32)
}

/// Remix an interleaved host-order buffer from `from` to `to` channels.
///
/// # Panics
/// Panics for a channel pair other than 1 -> 2 or 6 -> 2, and for a 6 -> 2
/// downmix of a type rejected by [`supports_downmix`].
pub fn remix(input: &SampleBuffer, from: u16, to: u16) -> SampleBuffer {
    match (from, to) {
        (1, 2) => mono_to_stereo(input),
        (6, 2) => downmix_to_stereo(input),
        _ => {
            tracing::error!(from, to, "unsupported channel remap reached the mixer");
            panic!("can't remix {from} channels to {to}");
        }
    }
}

/// Duplicate every sample into a left/right pair. Output is twice the size.
pub fn mono_to_stereo(input: &SampleBuffer) -> SampleBuffer {
    let bps = input.format().bytes_per_sample();
    let mut out = Vec::with_capacity(input.len() * 2);
    for sample in input.as_bytes().chunks_exact(bps) {
        out.extend_from_slice(sample);
        out.extend_from_slice(sample);
    }
    SampleBuffer::new(out, input.format())
}

/// Fold 5.1 frames into stereo with the fixed downmix matrix.
///
/// Output is a third of the input size. Integer types accumulate in their own
/// width, converting each partial sum through `f32`, which saturates instead
/// of wrapping.
pub fn downmix_to_stereo(input: &SampleBuffer) -> SampleBuffer {
    let format = input.format();
    tracing::debug!(%format, "downmixing 5.1 to stereo");

    let bytes = input.as_bytes();
    let out = match format.sample_type {
        SampleType::S16 => downmix_frames(bytes, |b| i16::from_ne_bytes(b) as f32, add_s16),
        SampleType::S32 => downmix_frames(bytes, |b| i32::from_ne_bytes(b) as f32, add_s32),
        SampleType::F32 => downmix_frames(bytes, f32::from_ne_bytes, add_f32),
        _ => {
            tracing::error!(%format, "downmix requested for unsupported format");
            panic!("can't downmix {format} samples");
        }
    };

    SampleBuffer::new(out, format)
}

/// Run the matrix over whole 6-channel frames of `N`-byte samples.
///
/// `read` widens one input sample to `f32`; `add` folds one weighted term
/// into the accumulator held in the output representation.
fn downmix_frames<const N: usize>(
    bytes: &[u8],
    read: impl Fn([u8; N]) -> f32,
    add: impl Fn([u8; N], f32) -> [u8; N],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() / 3);
    for frame in bytes.chunks_exact(6 * N) {
        let mut samples = [0.0f32; 6];
        for (s, chunk) in samples.iter_mut().zip(frame.chunks_exact(N)) {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            *s = read(raw);
        }

        for row in &DOWNMIX {
            // All-zero bytes are zero for every supported type.
            let mut acc = [0u8; N];
            for (weight, sample) in row.iter().zip(&samples) {
                acc = add(acc, weight * sample * NORMALIZATION);
            }
            out.extend_from_slice(&acc);
        }
    }
    out
}

fn add_s16(acc: [u8; 2], term: f32) -> [u8; 2] {
    ((i16::from_ne_bytes(acc) as f32 + term) as i16).to_ne_bytes()
}

fn add_s32(acc: [u8; 4], term: f32) -> [u8; 4] {
    ((i32::from_ne_bytes(acc) as f32 + term) as i32).to_ne_bytes()
}

fn add_f32(acc: [u8; 4], term: f32) -> [u8; 4] {
    (f32::from_ne_bytes(acc) + term).to_ne_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Endianness, SampleFormat};

    fn native(ty: SampleType) -> SampleFormat {
        SampleFormat::new(ty, Endianness::host())
    }

    fn s16_buffer(values: &[i16]) -> SampleBuffer {
        let bytes = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        SampleBuffer::new(bytes, native(SampleType::S16))
    }

    fn read_s16(buf: &SampleBuffer) -> Vec<i16> {
        buf.as_bytes()
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn mono_to_stereo_duplicates_each_sample() {
        let out = mono_to_stereo(&s16_buffer(&[1, -2, 3]));
        assert_eq!(read_s16(&out), vec![1, 1, -2, -2, 3, 3]);

        let packed = SampleBuffer::new(vec![1, 2, 3, 4, 5, 6], native(SampleType::S24Packed));
        let out = mono_to_stereo(&packed);
        assert_eq!(out.as_bytes(), &[1, 2, 3, 1, 2, 3, 4, 5, 6, 4, 5, 6]);
    }

    #[test]
    fn mono_to_stereo_doubles_size() {
        for ty in [SampleType::U8, SampleType::S16, SampleType::S24Packed, SampleType::F32] {
            let bps = ty.bytes_per_sample();
            let input = SampleBuffer::new(vec![7; bps * 10], native(ty));
            assert_eq!(mono_to_stereo(&input).len(), input.len() * 2);
        }
    }

    #[test]
    fn downmix_is_a_third_of_the_input() {
        for ty in [SampleType::S16, SampleType::S32, SampleType::F32] {
            let bps = ty.bytes_per_sample();
            let input = SampleBuffer::new(vec![0; bps * 6 * 8], native(ty));
            let out = downmix_to_stereo(&input);
            assert_eq!(out.len(), input.len() / 3);
            assert_eq!(out.format(), input.format());
        }
    }

    #[test]
    fn downmix_float_applies_matrix() {
        let frame = [1.0f32, 0.5, 0.25, -0.25, 0.1, -0.1];
        let input = SampleBuffer::from_floats(&frame);
        let out = downmix_to_stereo(&input).to_floats();

        for (ch, row) in DOWNMIX.iter().enumerate() {
            let expected: f32 = row
                .iter()
                .zip(&frame)
                .map(|(a, s)| a * s * NORMALIZATION)
                .sum();
            assert!((out[ch] - expected).abs() < 1e-6, "channel {ch}");
        }
    }

    #[test]
    fn downmix_front_channels_only() {
        let input = s16_buffer(&[10_000, -10_000, 0, 0, 0, 0]);
        let out = read_s16(&downmix_to_stereo(&input));
        // 10000 * 0.2626 = 2626 on each side.
        assert_eq!(out, vec![2626, -2626]);
    }

    #[test]
    fn downmix_s32_accumulates_in_integer_width() {
        let frame: [i32; 6] = [1 << 30, 0, 1 << 28, 1 << 28, 0, 0];
        let bytes = frame.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let input = SampleBuffer::new(bytes, native(SampleType::S32));
        let out: Vec<i32> = downmix_to_stereo(&input)
            .as_bytes()
            .chunks_exact(4)
            .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let left = (1u64 << 30) as f64 * 0.2626 + 2.0 * (1u64 << 28) as f64 * 0.707 * 0.2626;
        assert!((out[0] as f64 - left).abs() < 256.0, "left {}", out[0]);
        assert!(out[1] > 0);
    }

    #[test]
    fn remap_support() {
        assert!(is_supported_remap(1, 2));
        assert!(is_supported_remap(6, 2));
        assert!(is_supported_remap(2, 2));
        assert!(!is_supported_remap(2, 1));
        assert!(!is_supported_remap(6, 1));
        assert!(supports_downmix(SampleType::S16));
        assert!(!supports_downmix(SampleType::U16));
    }

    #[test]
    #[should_panic]
    fn remix_rejects_other_pairs() {
        remix(&s16_buffer(&[0, 0]), 2, 1);
    }

    #[test]
    #[should_panic]
    fn downmix_rejects_unsigned() {
        let input = SampleBuffer::new(vec![0; 12], native(SampleType::U16));
        downmix_to_stereo(&input);
    }
}
