//! Fixed-point <-> `f32` sample conversion.
//!
//! All functions expect host byte order; callers normalise with
//! [`SampleBuffer::make_native`](crate::buffer::SampleBuffer::make_native) first.
//!
//! ## Numeric rules
//! - fixed -> float: re-centre unsigned values around zero, then divide by
//!   `max + 1` of the width, giving values in `[-1.0, 1.0)`.
//! - float -> fixed: scale, round half to even, then saturate. 8/16-bit
//!   targets are scaled to the 32-bit range and shifted down, 24-bit targets
//!   use [`S24_MAX`] directly.
//!
//! Converting to or from `F32` itself is not a transcode; asking for it means
//! the format negotiation upstream is broken and the call panics.

use crate::buffer::SampleBuffer;
use crate::format::{Endianness, S24_MAX, S24_MIN, SampleFormat, SampleType, U24_MAX};

const I32_SCALE: f32 = i32::MAX as f32;
const I32_FLOOR: f32 = i32::MIN as f32;
const S24_SCALE: f32 = S24_MAX as f32;
const S24_FLOOR: f32 = S24_MIN as f32;

/// Result of scaling a float sample into an integer range.
enum Scaled {
    AboveMax,
    BelowMin,
    Value(i64),
}

fn scale(x: f32, max: f32, min: f32) -> Scaled {
    let f = x * max;
    if f >= max {
        Scaled::AboveMax
    } else if f <= min {
        Scaled::BelowMin
    } else {
        Scaled::Value(f.round_ties_even() as i64)
    }
}

/// Read a packed 24-bit sample (host order) as its raw 24-bit pattern.
pub(crate) fn read_packed_24(b: &[u8]) -> u32 {
    if cfg!(target_endian = "big") {
        u32::from_be_bytes([0, b[0], b[1], b[2]])
    } else {
        u32::from_le_bytes([b[0], b[1], b[2], 0])
    }
}

/// Write the low 24 bits of `v` as a packed sample (host order).
pub(crate) fn write_packed_24(v: u32, out: &mut [u8]) {
    let bytes = v.to_ne_bytes();
    if cfg!(target_endian = "big") {
        out.copy_from_slice(&bytes[1..4]);
    } else {
        out.copy_from_slice(&bytes[0..3]);
    }
}

/// Sign-extend a 24-bit pattern held in the low bits of `raw`.
pub(crate) fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

fn u8_to_float(input: &[u8], out: &mut [f32]) {
    for (o, &b) in out.iter_mut().zip(input) {
        *o = (b as i32 + i8::MIN as i32) as f32 / (i8::MAX as f32 + 1.0);
    }
}

fn s8_to_float(input: &[u8], out: &mut [f32]) {
    for (o, &b) in out.iter_mut().zip(input) {
        *o = (b as i8) as f32 / (i8::MAX as f32 + 1.0);
    }
}

fn u16_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(2)) {
        let v = u16::from_ne_bytes([b[0], b[1]]);
        *o = (v as i32 + i16::MIN as i32) as f32 / (i16::MAX as f32 + 1.0);
    }
}

fn s16_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(2)) {
        let v = i16::from_ne_bytes([b[0], b[1]]);
        *o = v as f32 / (i16::MAX as f32 + 1.0);
    }
}

fn u24_raw_to_float(raw: u32) -> f32 {
    let centred = (raw & U24_MAX) as i64 + S24_MIN as i64;
    (centred as f64 / (S24_MAX as f64 + 1.0)) as f32
}

fn s24_raw_to_float(raw: u32) -> f32 {
    (sign_extend_24(raw) as f64 / (S24_MAX as f64 + 1.0)) as f32
}

fn u24_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(4)) {
        *o = u24_raw_to_float(u32::from_ne_bytes([b[0], b[1], b[2], b[3]]));
    }
}

fn s24_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(4)) {
        *o = s24_raw_to_float(u32::from_ne_bytes([b[0], b[1], b[2], b[3]]));
    }
}

fn u24_packed_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(3)) {
        *o = u24_raw_to_float(read_packed_24(b));
    }
}

fn s24_packed_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(3)) {
        *o = s24_raw_to_float(read_packed_24(b));
    }
}

fn u32_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(4)) {
        let v = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
        let centred = v as i64 + i32::MIN as i64;
        *o = (centred as f64 / (i32::MAX as f64 + 1.0)) as f32;
    }
}

fn s32_to_float(input: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(input.chunks_exact(4)) {
        let v = i32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
        *o = (v as f64 / (i32::MAX as f64 + 1.0)) as f32;
    }
}

fn float_to_u8(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.iter_mut().zip(input) {
        *o = match scale(x, I32_SCALE, I32_FLOOR) {
            Scaled::AboveMax => u8::MAX,
            Scaled::BelowMin => 0,
            Scaled::Value(v) => ((v >> 24) - i8::MIN as i64) as u8,
        };
    }
}

fn float_to_s8(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.iter_mut().zip(input) {
        let v = match scale(x, I32_SCALE, I32_FLOOR) {
            Scaled::AboveMax => i8::MAX,
            Scaled::BelowMin => i8::MIN,
            Scaled::Value(v) => (v >> 24) as i8,
        };
        *o = v as u8;
    }
}

fn float_to_u16(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(2).zip(input) {
        let v = match scale(x, I32_SCALE, I32_FLOOR) {
            Scaled::AboveMax => u16::MAX,
            Scaled::BelowMin => 0,
            Scaled::Value(v) => ((v >> 16) - i16::MIN as i64) as u16,
        };
        o.copy_from_slice(&v.to_ne_bytes());
    }
}

fn float_to_s16(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(2).zip(input) {
        let v = match scale(x, I32_SCALE, I32_FLOOR) {
            Scaled::AboveMax => i16::MAX,
            Scaled::BelowMin => i16::MIN,
            Scaled::Value(v) => (v >> 16) as i16,
        };
        o.copy_from_slice(&v.to_ne_bytes());
    }
}

fn float_to_u24_raw(x: f32) -> u32 {
    match scale(x, S24_SCALE, S24_FLOOR) {
        Scaled::AboveMax => U24_MAX,
        Scaled::BelowMin => 0,
        Scaled::Value(v) => (v - S24_MIN as i64) as u32,
    }
}

fn float_to_s24_value(x: f32) -> i32 {
    match scale(x, S24_SCALE, S24_FLOOR) {
        Scaled::AboveMax => S24_MAX,
        Scaled::BelowMin => S24_MIN,
        Scaled::Value(v) => v as i32,
    }
}

fn float_to_u24(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(4).zip(input) {
        o.copy_from_slice(&float_to_u24_raw(x).to_ne_bytes());
    }
}

fn float_to_s24(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(4).zip(input) {
        o.copy_from_slice(&float_to_s24_value(x).to_ne_bytes());
    }
}

fn float_to_u24_packed(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(3).zip(input) {
        write_packed_24(float_to_u24_raw(x), o);
    }
}

fn float_to_s24_packed(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(3).zip(input) {
        write_packed_24(float_to_s24_value(x) as u32, o);
    }
}

fn float_to_u32(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(4).zip(input) {
        let v = match scale(x, I32_SCALE, I32_FLOOR) {
            Scaled::AboveMax => u32::MAX,
            Scaled::BelowMin => 0,
            Scaled::Value(v) => (v - i32::MIN as i64) as u32,
        };
        o.copy_from_slice(&v.to_ne_bytes());
    }
}

fn float_to_s32(input: &[f32], out: &mut [u8]) {
    for (o, &x) in out.chunks_exact_mut(4).zip(input) {
        let v = match scale(x, I32_SCALE, I32_FLOOR) {
            Scaled::AboveMax => i32::MAX,
            Scaled::BelowMin => i32::MIN,
            Scaled::Value(v) => v as i32,
        };
        o.copy_from_slice(&v.to_ne_bytes());
    }
}

/// Convert host-order fixed-point samples to `f32`.
///
/// Trailing bytes that do not form a whole sample are ignored.
///
/// # Panics
/// Panics if `input` already holds float samples.
pub fn fixed_to_float(input: &SampleBuffer) -> Vec<f32> {
    let format = input.format();
    let bytes = input.as_bytes();
    let mut out = vec![0.0f32; input.samples()];

    match format.sample_type {
        SampleType::U8 => u8_to_float(bytes, &mut out),
        SampleType::S8 => s8_to_float(bytes, &mut out),
        SampleType::U16 => u16_to_float(bytes, &mut out),
        SampleType::S16 => s16_to_float(bytes, &mut out),
        SampleType::U24 => u24_to_float(bytes, &mut out),
        SampleType::S24 => s24_to_float(bytes, &mut out),
        SampleType::U24Packed => u24_packed_to_float(bytes, &mut out),
        SampleType::S24Packed => s24_packed_to_float(bytes, &mut out),
        SampleType::U32 => u32_to_float(bytes, &mut out),
        SampleType::S32 => s32_to_float(bytes, &mut out),
        SampleType::F32 => {
            tracing::error!(%format, "can't convert to float");
            panic!("can't convert from {format} to float");
        }
    }

    out
}

/// Convert `f32` samples to the fixed-point type `to`, in host byte order.
///
/// # Panics
/// Panics if `to` is the float type.
pub fn float_to_fixed(input: &[f32], to: SampleType) -> SampleBuffer {
    let mut out = vec![0u8; input.len() * to.bytes_per_sample()];

    match to {
        SampleType::U8 => float_to_u8(input, &mut out),
        SampleType::S8 => float_to_s8(input, &mut out),
        SampleType::U16 => float_to_u16(input, &mut out),
        SampleType::S16 => float_to_s16(input, &mut out),
        SampleType::U24 => float_to_u24(input, &mut out),
        SampleType::S24 => float_to_s24(input, &mut out),
        SampleType::U24Packed => float_to_u24_packed(input, &mut out),
        SampleType::S24Packed => float_to_s24_packed(input, &mut out),
        SampleType::U32 => float_to_u32(input, &mut out),
        SampleType::S32 => float_to_s32(input, &mut out),
        SampleType::F32 => {
            tracing::error!(format = %SampleFormat::native(to), "can't convert from float");
            panic!("can't convert from float to {to:?}");
        }
    }

    SampleBuffer::new(out, SampleFormat::new(to, Endianness::host()))
}
