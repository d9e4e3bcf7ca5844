//! Owned sample buffers.
//!
//! A [`SampleBuffer`] couples raw interleaved bytes with the [`SampleFormat`]
//! that describes them. Transformations that reinterpret the bytes in place
//! (sign toggling, byte swapping) are methods on the buffer so the bytes and
//! the descriptor are always updated together.

use crate::format::{Endianness, SampleFormat, SampleType};

/// Exclusively owned interleaved samples plus their encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleBuffer {
    data: Vec<u8>,
    format: SampleFormat,
}

impl SampleBuffer {
    pub fn new(data: Vec<u8>, format: SampleFormat) -> Self {
        Self { data, format }
    }

    /// Working copy of borrowed bytes.
    pub fn copy_from(data: &[u8], format: SampleFormat) -> Self {
        Self::new(data.to_vec(), format)
    }

    /// Host-order `F32` buffer holding `samples`.
    pub fn from_floats(samples: &[f32]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
        Self::new(data, SampleFormat::new(SampleType::F32, Endianness::host()))
    }

    /// Decode a host-order `F32` buffer back into samples.
    ///
    /// # Panics
    /// Panics if the buffer does not hold float samples.
    pub fn to_floats(&self) -> Vec<f32> {
        assert!(
            self.format.sample_type.is_float(),
            "to_floats on {} buffer",
            self.format
        );
        self.data
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of whole samples held.
    pub fn samples(&self) -> usize {
        self.data.len() / self.format.bytes_per_sample()
    }

    /// Flip signed <-> unsigned by XOR-ing the top bit of every sample.
    ///
    /// For the 4-byte 24-bit container the flipped bit is bit 23; the unused
    /// high byte is left untouched. Applying the toggle twice restores the
    /// original bytes.
    ///
    /// # Panics
    /// Panics for float samples, which have no unsigned form.
    pub fn toggle_sign(&mut self) {
        let ty = self.format.sample_type;
        let Some(toggled) = ty.toggled_sign() else {
            tracing::error!(format = %self.format, "sign change requested for unsupported format");
            panic!("can't change sign of {} samples", self.format);
        };

        let bps = ty.bytes_per_sample();
        let bit = ty.bits() - 1;
        let byte_from_lsb = (bit / 8) as usize;
        let index = match self.format.endianness.resolve() {
            Endianness::Big => bps - 1 - byte_from_lsb,
            _ => byte_from_lsb,
        };
        let mask = 1u8 << (bit % 8);

        for sample in self.data.chunks_exact_mut(bps) {
            sample[index] ^= mask;
        }
        self.format = self.format.with_type(toggled);
    }

    /// Reverse the byte order of every sample and record `to` as the new order.
    ///
    /// Single-byte and float samples are left as they are; only the
    /// descriptor changes.
    pub fn swap_endianness(&mut self, to: Endianness) {
        if self.format.sample_type.has_byte_order()
            && self.format.endianness.resolve() != to.resolve()
        {
            tracing::debug!(format = %self.format, "swapping endianness");
            let bps = self.format.bytes_per_sample();
            for sample in self.data.chunks_exact_mut(bps) {
                sample.reverse();
            }
        }
        self.format = self.format.with_endianness(to);
    }

    /// Bring the buffer into host byte order.
    pub fn make_native(&mut self) {
        self.swap_endianness(Endianness::host());
    }
}
