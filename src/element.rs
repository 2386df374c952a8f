//! Audio format conversion element.
//!
//! Glues negotiation, sizing and a [`SampleConverter`] together the way a
//! pipeline host drives a transform element: caps queries go through
//! [`AudioConvert::transform_caps`] and [`AudioConvert::fixate_caps`], the
//! agreed pair is installed with [`AudioConvert::set_caps`], then buffers
//! flow through [`AudioConvert::transform`].

use crate::config::ConvertConfig;
use crate::converters::{BasicConverter, SampleConverter, fill_silence};
use crate::error::{Error, Result};
use crate::format::{AudioCaps, AudioFormat, FormatSet, template_caps};
use crate::metadata::BufferFlags;
use crate::negotiation;
use crate::observability::{Direction, instrument_negotiation, span_transform};

/// Audio format conversion element.
///
/// # Example
///
/// ```rust
/// use parallax_audioconvert::element::AudioConvert;
/// use parallax_audioconvert::format::{AudioCaps, FormatSet};
/// use parallax_audioconvert::metadata::BufferFlags;
/// use parallax_audioconvert::observability::Direction;
///
/// let mut convert = AudioConvert::new();
/// let input = AudioCaps::int(44100, 2, 16, 16, true);
///
/// let candidates =
///     convert.transform_caps(Direction::Src, &FormatSet::single(input.clone()), None);
/// let output = convert.fixate_caps(Direction::Src, &input, &candidates).unwrap();
/// convert.set_caps(&input, &output).unwrap();
///
/// let src = [0u8; 8];
/// let mut dst = [0xffu8; 8];
/// let written = convert.transform(&src, BufferFlags::default(), &mut dst).unwrap();
/// assert_eq!(written, 8);
/// ```
pub struct AudioConvert<C: SampleConverter = BasicConverter> {
    name: String,
    engine: C,
    config: ConvertConfig,
    negotiated: Option<Negotiated<C::Context>>,
}

struct Negotiated<Ctx> {
    input: AudioFormat,
    output: AudioFormat,
    ctx: Ctx,
}

impl AudioConvert<BasicConverter> {
    /// Create a converter backed by [`BasicConverter`].
    ///
    /// Channel count changes are mixed by position, so any pair the
    /// negotiation offers can be installed, except a count change on
    /// unpositioned audio.
    pub fn new() -> Self {
        Self::with_engine(BasicConverter)
    }
}

impl Default for AudioConvert<BasicConverter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SampleConverter> AudioConvert<C> {
    /// Create a converter backed by a custom engine.
    pub fn with_engine(engine: C) -> Self {
        Self {
            name: "audioconvert".to_string(),
            engine,
            config: ConvertConfig::default(),
            negotiated: None,
        }
    }

    /// Set a custom name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the conversion options.
    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current options.
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Set an option by property name. Takes effect on the next
    /// [`set_caps`](Self::set_caps).
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<()> {
        self.config.set_property(name, value)
    }

    /// Formats accepted on either side.
    pub fn template_caps(&self) -> FormatSet {
        template_caps()
    }

    // ========================================================================
    // Negotiation
    // ========================================================================

    /// Formats the other side can use, given the formats on one side.
    ///
    /// Conversion is symmetric, so `direction` only labels the trace span.
    pub fn transform_caps(
        &self,
        direction: Direction,
        caps: &FormatSet,
        filter: Option<&FormatSet>,
    ) -> FormatSet {
        let _guard = instrument_negotiation(&self.name, direction);
        negotiation::transform_caps(caps, filter)
    }

    /// Pick one concrete format from `candidates`, closest to `input`.
    pub fn fixate_caps(
        &self,
        direction: Direction,
        input: &AudioCaps,
        candidates: &FormatSet,
    ) -> Result<AudioCaps> {
        let _guard = instrument_negotiation(&self.name, direction);
        negotiation::fixate(input, candidates)
    }

    /// Install the negotiated formats and prepare the engine.
    ///
    /// On failure the element is left unnegotiated.
    pub fn set_caps(&mut self, incaps: &AudioCaps, outcaps: &AudioCaps) -> Result<()> {
        tracing::debug!(%incaps, %outcaps, "set caps");
        self.negotiated = None;

        let input = AudioFormat::from_caps(incaps)?;
        let output = AudioFormat::from_caps(outcaps)?;
        let ctx = self.engine.prepare(
            &input,
            &output,
            self.config.dither,
            self.config.noise_shaping,
        )?;

        self.negotiated = Some(Negotiated { input, output, ctx });
        Ok(())
    }

    /// Bytes per unit of fixed caps.
    pub fn unit_size(&self, caps: &AudioCaps) -> Result<usize> {
        crate::format::unit_size(caps)
    }

    /// Negotiated input format.
    pub fn input_format(&self) -> Option<&AudioFormat> {
        self.negotiated.as_ref().map(|n| &n.input)
    }

    /// Negotiated output format.
    pub fn output_format(&self) -> Option<&AudioFormat> {
        self.negotiated.as_ref().map(|n| &n.output)
    }

    /// Whether input and output formats are identical.
    pub fn is_passthrough(&self) -> bool {
        self.negotiated
            .as_ref()
            .is_some_and(|n| n.input == n.output)
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Convert one buffer. Returns the number of bytes written to `output`.
    ///
    /// Whole units of `input` are converted; trailing bytes are ignored.
    /// Gap buffers produce silence in the output format.
    pub fn transform(
        &mut self,
        input: &[u8],
        flags: BufferFlags,
        output: &mut [u8],
    ) -> Result<usize> {
        let negotiated = self
            .negotiated
            .as_mut()
            .ok_or_else(|| Error::Conversion("not negotiated".into()))?;

        let samples = negotiated.input.samples_in(input.len());
        let span = span_transform(&self.name, samples);
        let _entered = span.enter();

        let (in_required, out_required) = self.engine.sizes(&negotiated.ctx, samples)?;
        if in_required == 0 || out_required == 0 {
            return Ok(0);
        }

        if input.len() < in_required || output.len() < out_required {
            tracing::error!(
                in_len = input.len(),
                in_required,
                out_len = output.len(),
                out_required,
                "buffers of wrong size"
            );
            return Err(Error::BufferSize {
                in_len: input.len(),
                in_required,
                out_len: output.len(),
                out_required,
            });
        }

        if flags.is_gap() {
            fill_silence(&negotiated.output, &mut output[..out_required]);
        } else {
            self.engine.convert(
                &mut negotiated.ctx,
                &input[..in_required],
                &mut output[..out_required],
                samples,
                flags.writable,
            )?;
        }
        Ok(out_required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{DitherMode, NoiseShaping};
    use crate::format::{CapsValue, Endianness, FormatKind, IntField};
    use crate::negotiation::NegotiationError;

    fn s16_stereo() -> AudioCaps {
        AudioCaps::int(44100, 2, 16, 16, true)
    }

    #[test]
    fn test_not_negotiated() {
        let mut convert = AudioConvert::new();
        let err = convert
            .transform(&[0; 4], BufferFlags::default(), &mut [0; 4])
            .unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
        assert!(!convert.is_passthrough());
    }

    #[test]
    fn test_passthrough_negotiation() {
        let mut convert = AudioConvert::new().with_name("convert0");
        let input = s16_stereo();
        let candidates =
            convert.transform_caps(Direction::Src, &FormatSet::single(input.clone()), None);
        let output = convert
            .fixate_caps(Direction::Src, &input, &candidates)
            .unwrap();
        convert.set_caps(&input, &output).unwrap();
        assert!(convert.is_passthrough());
        assert_eq!(convert.name(), "convert0");
    }

    #[test]
    fn test_int_to_float_through_peer() {
        let mut convert = AudioConvert::new();
        let input = s16_stereo().with_endianness(Endianness::Little);
        let mut peer = AudioCaps::new(FormatKind::Float);
        peer.set_values(IntField::Width, [32]);
        let peer = FormatSet::single(peer);

        let candidates =
            convert.transform_caps(Direction::Src, &FormatSet::single(input.clone()), Some(&peer));
        let output = convert
            .fixate_caps(Direction::Src, &input, &candidates)
            .unwrap();
        assert_eq!(output.kind, FormatKind::Float);
        assert_eq!(output.endianness, CapsValue::Fixed(Endianness::Little));
        convert.set_caps(&input, &output).unwrap();
        assert!(!convert.is_passthrough());

        let mut src = Vec::new();
        for v in [16384i16, -16384] {
            src.extend_from_slice(&v.to_le_bytes());
        }
        let mut dst = [0u8; 8];
        assert_eq!(
            convert
                .transform(&src, BufferFlags::default(), &mut dst)
                .unwrap(),
            8
        );
        let left = f32::from_le_bytes([dst[0], dst[1], dst[2], dst[3]]);
        let right = f32::from_le_bytes([dst[4], dst[5], dst[6], dst[7]]);
        assert!((left - 0.5).abs() < 1e-6);
        assert!((right + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_gap_produces_silence() {
        let mut convert = AudioConvert::new();
        let output = AudioCaps::int(44100, 2, 16, 16, false).with_endianness(Endianness::Big);
        convert.set_caps(&s16_stereo(), &output).unwrap();

        let src = [0x55u8; 8];
        let mut dst = [0u8; 8];
        convert
            .transform(&src, BufferFlags::gap(), &mut dst)
            .unwrap();
        assert_eq!(dst, [0x80, 0x00, 0x80, 0x00, 0x80, 0x00, 0x80, 0x00]);
    }

    #[test]
    fn test_trailing_bytes_and_empty_input() {
        let mut convert = AudioConvert::new();
        convert.set_caps(&s16_stereo(), &s16_stereo()).unwrap();

        // 10 bytes is 2 whole units of 4 bytes
        let mut dst = [0u8; 8];
        assert_eq!(
            convert
                .transform(&[1u8; 10], BufferFlags::default(), &mut dst)
                .unwrap(),
            8
        );
        assert_eq!(
            convert
                .transform(&[1u8; 3], BufferFlags::default(), &mut dst)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_output_too_small() {
        let mut convert = AudioConvert::new();
        convert
            .set_caps(&s16_stereo(), &AudioCaps::float(44100, 2, 32))
            .unwrap();
        let err = convert
            .transform(&[0u8; 8], BufferFlags::default(), &mut [0u8; 8])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BufferSize {
                in_required: 8,
                out_required: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_set_caps_failure_clears_state() {
        let mut convert = AudioConvert::new();
        convert.set_caps(&s16_stereo(), &s16_stereo()).unwrap();

        // ten channels without positions cannot be mixed from stereo
        let unpositioned = AudioCaps::int(44100, 10, 16, 16, true);
        let err = convert.set_caps(&s16_stereo(), &unpositioned).unwrap_err();
        assert!(matches!(
            err,
            Error::Negotiation(NegotiationError::NoConverter { .. })
        ));
        assert!(convert.input_format().is_none());

        let mut unfixed = s16_stereo();
        unfixed.set_range(IntField::Rate, 8000, 48000);
        assert!(matches!(
            convert.set_caps(&unfixed, &s16_stereo()),
            Err(Error::NotFixed(_))
        ));
    }

    #[test]
    fn test_properties() {
        let mut convert = AudioConvert::new();
        convert.set_property("dithering", "none").unwrap();
        convert.set_property("noise-shaping", "medium").unwrap();
        assert_eq!(convert.config().dither, DitherMode::None);
        assert_eq!(convert.config().noise_shaping, NoiseShaping::Medium);
        assert!(convert.set_property("bogus", "x").is_err());
    }

    #[test]
    fn test_unit_size() {
        let convert = AudioConvert::new();
        assert_eq!(convert.unit_size(&s16_stereo()).unwrap(), 4);
        assert_eq!(convert.template_caps().len(), 6);
    }

    #[test]
    fn test_upmix_to_six_channels() {
        let mut convert = AudioConvert::new();
        let input = s16_stereo().with_endianness(Endianness::Little);
        let peer: FormatSet = "audio/x-raw-int, channels=(int)6".parse().unwrap();
        let candidates =
            convert.transform_caps(Direction::Src, &FormatSet::single(input.clone()), Some(&peer));
        let output = convert.fixate_caps(Direction::Src, &input, &candidates).unwrap();
        assert_eq!(output.channels, CapsValue::Fixed(6));

        convert.set_caps(&input, &output).unwrap();
        assert!(!convert.is_passthrough());

        // one stereo frame in, one 5.1 frame out
        let mut src = Vec::new();
        src.extend_from_slice(&0x1000i16.to_le_bytes());
        src.extend_from_slice(&(-0x1000i16).to_le_bytes());
        let mut dst = [0xffu8; 12];
        let written = convert
            .transform(&src, BufferFlags::default(), &mut dst)
            .unwrap();
        assert_eq!(written, 12);

        let out_format = convert.output_format().unwrap();
        let decoded: Vec<i16> = dst
            .chunks_exact(2)
            .map(|c| match out_format.endianness {
                Endianness::Little => i16::from_le_bytes([c[0], c[1]]),
                Endianness::Big => i16::from_be_bytes([c[0], c[1]]),
            })
            .collect();
        assert_eq!(decoded, vec![0x1000, -0x1000, 0, 0, 0, 0]);
    }
}
