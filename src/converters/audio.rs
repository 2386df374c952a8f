//! Reference sample format conversion.
//!
//! Samples go through a normalized f64 (-1.0 to 1.0) on the way from the
//! input format to the output format. When the channel layouts differ, each
//! frame is mixed by position in between.

use super::mix::ChannelMix;
use super::{DitherMode, NoiseShaping, SampleConverter};
use crate::error::{Error, Result};
use crate::format::{AudioFormat, Endianness, FormatKind};
use crate::negotiation::NegotiationError;

/// Converts between any supported integer and float formats.
///
/// Channel count changes are mixed by position: matching positions map
/// straight through, unmatched ones fold onto the same side. Unpositioned
/// audio can only keep its channel count. Dithering and noise shaping
/// settings are recorded in the context but not applied.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicConverter;

/// Stream state for [`BasicConverter`].
#[derive(Clone, Debug)]
pub struct BasicContext {
    input: SampleLayout,
    output: SampleLayout,
    in_channels: usize,
    out_channels: usize,
    /// `None` when every channel maps to itself.
    mix: Option<ChannelMix>,
    frame: Vec<f64>,
    mixed: Vec<f64>,
    dither: DitherMode,
    noise_shaping: NoiseShaping,
}

impl BasicContext {
    /// Whether input and output bytes are identical.
    pub fn is_passthrough(&self) -> bool {
        self.input == self.output && self.mix.is_none()
    }

    /// Whether channels are mixed.
    pub fn is_mixing(&self) -> bool {
        self.mix.is_some()
    }

    /// Dither mode the stream was prepared with.
    pub fn dither(&self) -> DitherMode {
        self.dither
    }

    /// Noise shaping the stream was prepared with.
    pub fn noise_shaping(&self) -> NoiseShaping {
        self.noise_shaping
    }
}

/// How one sample is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SampleLayout {
    kind: FormatKind,
    bytes: usize,
    depth: u32,
    signed: bool,
    endianness: Endianness,
}

impl SampleLayout {
    fn new(format: &AudioFormat) -> Option<Self> {
        let supported = match format.kind {
            FormatKind::Int => {
                matches!(format.width, 8 | 16 | 24 | 32)
                    && (1..=format.width).contains(&format.depth)
            }
            FormatKind::Float => matches!(format.width, 32 | 64),
        };
        supported.then(|| Self {
            kind: format.kind,
            bytes: format.bytes_per_sample(),
            depth: format.depth as u32,
            signed: format.signed,
            endianness: format.endianness,
        })
    }

    /// Read a sample as normalized f64 (-1.0 to 1.0).
    fn read_normalized(&self, data: &[u8]) -> f64 {
        match self.kind {
            FormatKind::Float if self.bytes == 4 => {
                let bytes = [data[0], data[1], data[2], data[3]];
                match self.endianness {
                    Endianness::Little => f32::from_le_bytes(bytes) as f64,
                    Endianness::Big => f32::from_be_bytes(bytes) as f64,
                }
            }
            FormatKind::Float => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&data[..8]);
                match self.endianness {
                    Endianness::Little => f64::from_le_bytes(bytes),
                    Endianness::Big => f64::from_be_bytes(bytes),
                }
            }
            FormatKind::Int => {
                let raw = self.read_raw(data);
                let scale = (1u64 << (self.depth - 1)) as f64;
                let value = if self.signed {
                    // sign-extend from depth bits
                    let shift = 64 - self.depth;
                    (((raw as u64) << shift) as i64 >> shift) as f64
                } else {
                    (raw as u64 & mask(self.depth)) as f64 - scale
                };
                value / scale
            }
        }
    }

    /// Write a normalized f64 (-1.0 to 1.0) in this layout.
    fn write_normalized(&self, data: &mut [u8], value: f64) {
        // Clamp to valid range
        let value = value.clamp(-1.0, 1.0);

        match self.kind {
            FormatKind::Float if self.bytes == 4 => {
                let bytes = match self.endianness {
                    Endianness::Little => (value as f32).to_le_bytes(),
                    Endianness::Big => (value as f32).to_be_bytes(),
                };
                data[..4].copy_from_slice(&bytes);
            }
            FormatKind::Float => {
                let bytes = match self.endianness {
                    Endianness::Little => value.to_le_bytes(),
                    Endianness::Big => value.to_be_bytes(),
                };
                data[..8].copy_from_slice(&bytes);
            }
            FormatKind::Int => {
                let scale = (1i64 << (self.depth - 1)) as f64;
                let v = (value * scale).round().clamp(-scale, scale - 1.0) as i64;
                let raw = if self.signed {
                    v as u64 & mask(self.bytes as u32 * 8)
                } else {
                    (v + scale as i64) as u64
                };
                self.write_raw(data, raw as u32);
            }
        }
    }

    fn read_raw(&self, data: &[u8]) -> u32 {
        let mut le = [0u8; 4];
        le[..self.bytes].copy_from_slice(&data[..self.bytes]);
        if self.endianness == Endianness::Big {
            le[..self.bytes].reverse();
        }
        u32::from_le_bytes(le)
    }

    fn write_raw(&self, data: &mut [u8], raw: u32) {
        let le = raw.to_le_bytes();
        let out = &mut data[..self.bytes];
        out.copy_from_slice(&le[..self.bytes]);
        if self.endianness == Endianness::Big {
            out.reverse();
        }
    }
}

#[inline]
fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

impl SampleConverter for BasicConverter {
    type Context = BasicContext;

    fn prepare(
        &self,
        input: &AudioFormat,
        output: &AudioFormat,
        dither: DitherMode,
        noise_shaping: NoiseShaping,
    ) -> Result<BasicContext> {
        let no_converter = || NegotiationError::NoConverter {
            from_format: input.to_caps().to_string(),
            to_format: output.to_caps().to_string(),
        };
        let Some(mix) = ChannelMix::new(&input.layout, &output.layout) else {
            tracing::debug!(
                in_channels = input.channels,
                out_channels = output.channels,
                "no channel positions to mix by"
            );
            return Err(no_converter().into());
        };
        let (Some(in_layout), Some(out_layout)) =
            (SampleLayout::new(input), SampleLayout::new(output))
        else {
            return Err(no_converter().into());
        };

        let (in_channels, out_channels) = (input.channels as usize, output.channels as usize);
        let ctx = BasicContext {
            input: in_layout,
            output: out_layout,
            in_channels,
            out_channels,
            mix: (!mix.is_identity()).then_some(mix),
            frame: vec![0.0; in_channels],
            mixed: vec![0.0; out_channels],
            dither,
            noise_shaping,
        };
        tracing::debug!(
            passthrough = ctx.is_passthrough(),
            mixing = ctx.is_mixing(),
            %dither,
            %noise_shaping,
            "prepared conversion"
        );
        Ok(ctx)
    }

    fn sizes(&self, ctx: &BasicContext, samples: usize) -> Result<(usize, usize)> {
        let overflow = || Error::Conversion(format!("sample count {samples} overflows"));
        let in_size = samples
            .checked_mul(ctx.in_channels * ctx.input.bytes)
            .ok_or_else(overflow)?;
        let out_size = samples
            .checked_mul(ctx.out_channels * ctx.output.bytes)
            .ok_or_else(overflow)?;
        Ok((in_size, out_size))
    }

    fn convert(
        &self,
        ctx: &mut BasicContext,
        src: &[u8],
        dst: &mut [u8],
        samples: usize,
        _src_writable: bool,
    ) -> Result<()> {
        let (in_required, out_required) = self.sizes(ctx, samples)?;
        if src.len() < in_required || dst.len() < out_required {
            return Err(Error::BufferSize {
                in_len: src.len(),
                in_required,
                out_len: dst.len(),
                out_required,
            });
        }

        // Same layout - just copy
        if ctx.is_passthrough() {
            dst[..out_required].copy_from_slice(&src[..in_required]);
            return Ok(());
        }

        let Some(mix) = &ctx.mix else {
            let src_chunks = src[..in_required].chunks_exact(ctx.input.bytes);
            let dst_chunks = dst[..out_required].chunks_exact_mut(ctx.output.bytes);
            for (input, output) in src_chunks.zip(dst_chunks) {
                let normalized = ctx.input.read_normalized(input);
                ctx.output.write_normalized(output, normalized);
            }
            return Ok(());
        };

        let in_frame = ctx.in_channels * ctx.input.bytes;
        let out_frame = ctx.out_channels * ctx.output.bytes;
        let src_frames = src[..in_required].chunks_exact(in_frame);
        let dst_frames = dst[..out_required].chunks_exact_mut(out_frame);
        for (input, output) in src_frames.zip(dst_frames) {
            let samples_in = input.chunks_exact(ctx.input.bytes);
            for (value, sample) in ctx.frame.iter_mut().zip(samples_in) {
                *value = ctx.input.read_normalized(sample);
            }
            mix.apply(&ctx.frame, &mut ctx.mixed);
            let samples_out = output.chunks_exact_mut(ctx.output.bytes);
            for (value, sample) in ctx.mixed.iter().zip(samples_out) {
                ctx.output.write_normalized(sample, *value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::AudioCaps;

    fn format(caps: AudioCaps) -> AudioFormat {
        AudioFormat::from_caps(&caps).unwrap()
    }

    fn prepare(input: AudioCaps, output: AudioCaps) -> BasicContext {
        BasicConverter
            .prepare(
                &format(input),
                &format(output),
                DitherMode::None,
                NoiseShaping::None,
            )
            .unwrap()
    }

    fn s16le(rate: i32) -> AudioCaps {
        AudioCaps::int(rate, 1, 16, 16, true).with_endianness(Endianness::Little)
    }

    #[test]
    fn test_s16_to_f32_conversion() {
        let mut ctx = prepare(
            s16le(44100),
            AudioCaps::float(44100, 1, 32).with_endianness(Endianness::Little),
        );

        // -32768, 0, 32767
        let input = [0x00u8, 0x80, 0x00, 0x00, 0xFF, 0x7F];
        let mut output = vec![0u8; 12];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 3, false)
            .unwrap();

        let f0 = f32::from_le_bytes([output[0], output[1], output[2], output[3]]);
        let f1 = f32::from_le_bytes([output[4], output[5], output[6], output[7]]);
        let f2 = f32::from_le_bytes([output[8], output[9], output[10], output[11]]);

        assert!((f0 - (-1.0)).abs() < 0.001, "min should be -1.0, got {}", f0);
        assert!(f1.abs() < 0.001, "zero should be 0.0, got {}", f1);
        assert!((f2 - 0.99997).abs() < 0.001, "max should be ~1.0, got {}", f2);
    }

    #[test]
    fn test_f32_to_s16_clamps() {
        let mut ctx = prepare(
            AudioCaps::float(44100, 1, 32).with_endianness(Endianness::Little),
            s16le(44100),
        );

        let mut input = vec![0u8; 12];
        input[0..4].copy_from_slice(&(-1.0f32).to_le_bytes());
        input[4..8].copy_from_slice(&(0.0f32).to_le_bytes());
        input[8..12].copy_from_slice(&(2.0f32).to_le_bytes());

        let mut output = vec![0u8; 6];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 3, false)
            .unwrap();

        assert_eq!(i16::from_le_bytes([output[0], output[1]]), -32768);
        assert_eq!(i16::from_le_bytes([output[2], output[3]]), 0);
        assert_eq!(i16::from_le_bytes([output[4], output[5]]), 32767);
    }

    #[test]
    fn test_byte_order_swap() {
        let mut ctx = prepare(
            s16le(44100),
            AudioCaps::int(44100, 1, 16, 16, true).with_endianness(Endianness::Big),
        );
        let input = 0x1234i16.to_le_bytes();
        let mut output = [0u8; 2];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 1, false)
            .unwrap();
        assert_eq!(output, 0x1234i16.to_be_bytes());
    }

    #[test]
    fn test_signed_to_unsigned_8_bit() {
        let mut ctx = prepare(s16le(8000), AudioCaps::int(8000, 1, 8, 8, false));
        let mut input = Vec::new();
        for v in [i16::MIN, 0, 0x4000] {
            input.extend_from_slice(&v.to_le_bytes());
        }
        let mut output = [0u8; 3];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 3, false)
            .unwrap();
        assert_eq!(output, [0x00, 0x80, 0xC0]);
    }

    #[test]
    fn test_24_bit_in_32_roundtrip() {
        let s24_32 = AudioCaps::int(48000, 1, 32, 24, true).with_endianness(Endianness::Little);
        let s24 = AudioCaps::int(48000, 1, 24, 24, true).with_endianness(Endianness::Big);
        let mut there = prepare(s24_32.clone(), s24.clone());
        let mut back = prepare(s24, s24_32);

        let original: Vec<i32> = vec![-(1 << 23), -1, 0, 1, (1 << 23) - 1];
        let input: Vec<u8> = original.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut packed = vec![0u8; original.len() * 3];
        let mut result = vec![0u8; original.len() * 4];

        BasicConverter
            .convert(&mut there, &input, &mut packed, original.len(), false)
            .unwrap();
        BasicConverter
            .convert(&mut back, &packed, &mut result, original.len(), false)
            .unwrap();

        let decoded: Vec<i32> = result
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_passthrough_copies() {
        let mut ctx = prepare(s16le(44100), s16le(44100));
        assert!(ctx.is_passthrough());
        let input = [1u8, 2, 3, 4];
        let mut output = [0u8; 4];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 2, false)
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_sizes_and_short_buffers() {
        let mut ctx = prepare(
            AudioCaps::int(44100, 2, 16, 16, true),
            AudioCaps::float(44100, 2, 64),
        );
        assert_eq!(BasicConverter.sizes(&ctx, 10).unwrap(), (40, 160));

        let mut output = [0u8; 100];
        let err = BasicConverter
            .convert(&mut ctx, &[0u8; 40], &mut output, 10, false)
            .unwrap_err();
        assert!(matches!(err, Error::BufferSize { out_required: 160, .. }));
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let mut ctx = prepare(s16le(44100), AudioCaps::int(44100, 2, 16, 16, true));
        assert!(ctx.is_mixing());
        assert!(!ctx.is_passthrough());
        assert_eq!(BasicConverter.sizes(&ctx, 3).unwrap(), (6, 12));

        let mut input = Vec::new();
        for v in [0i16, 0x4000, -0x4000] {
            input.extend_from_slice(&v.to_le_bytes());
        }
        let mut output = [0u8; 12];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 3, false)
            .unwrap();
        let decoded: Vec<i16> = output
            .chunks_exact(2)
            .map(|c| i16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(decoded, vec![0, 0, 0x4000, 0x4000, -0x4000, -0x4000]);
    }

    #[test]
    fn test_stereo_to_mono_averages() {
        let stereo = AudioCaps::float(48000, 2, 32).with_endianness(Endianness::Little);
        let mono = AudioCaps::float(48000, 1, 32).with_endianness(Endianness::Little);
        let mut ctx = prepare(stereo, mono);

        let mut input = Vec::new();
        for v in [0.5f32, -0.5, 1.0, 0.0] {
            input.extend_from_slice(&v.to_le_bytes());
        }
        let mut output = [0u8; 8];
        BasicConverter
            .convert(&mut ctx, &input, &mut output, 2, false)
            .unwrap();
        assert_eq!(f32::from_le_bytes([output[0], output[1], output[2], output[3]]), 0.0);
        assert_eq!(f32::from_le_bytes([output[4], output[5], output[6], output[7]]), 0.5);
    }

    #[test]
    fn test_unpositioned_channel_change_has_no_converter() {
        let err = BasicConverter
            .prepare(
                &format(AudioCaps::int(44100, 10, 16, 16, true)),
                &format(AudioCaps::int(44100, 2, 16, 16, true)),
                DitherMode::default(),
                NoiseShaping::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Negotiation(NegotiationError::NoConverter { .. })
        ));
    }
}
