//! Silence generation for gap buffers.

use crate::format::{AudioFormat, Endianness};

/// Fill `dst` with silence in the given format.
///
/// Signed integer and float silence is all zero bytes. Unsigned integer
/// silence is the midpoint of the `depth`-bit range, stored in the format's
/// byte order. Trailing bytes that do not form a whole sample are zeroed.
pub fn fill_silence(format: &AudioFormat, dst: &mut [u8]) {
    if !format.is_int() || format.signed {
        dst.fill(0);
        return;
    }

    let width = format.width as u32;
    let depth = (format.depth as u32).clamp(1, width);
    let zero: u32 = (0x80u32 << (width - 8)) >> (width - depth);

    match width {
        8 => dst.fill(zero as u8),
        16 => write_repeated(dst, &(zero as u16).to_le_bytes(), format.endianness),
        24 => write_repeated(dst, &zero.to_le_bytes()[..3], format.endianness),
        32 => write_repeated(dst, &zero.to_le_bytes(), format.endianness),
        _ => {
            tracing::warn!(width, "no silence pattern for width");
            dst.fill(0);
        }
    }
}

/// Write `le_bytes` (one little-endian sample) over `dst`.
fn write_repeated(dst: &mut [u8], le_bytes: &[u8], endianness: Endianness) {
    let mut sample = [0u8; 4];
    let sample = &mut sample[..le_bytes.len()];
    sample.copy_from_slice(le_bytes);
    if endianness == Endianness::Big {
        sample.reverse();
    }

    let mut chunks = dst.chunks_exact_mut(sample.len());
    for chunk in &mut chunks {
        chunk.copy_from_slice(sample);
    }
    chunks.into_remainder().fill(0);
}
