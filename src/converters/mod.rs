//! Sample conversion engines.
//!
//! Negotiation only decides the formats; moving samples is the job of a
//! [`SampleConverter`]. The element drives it in three steps:
//!
//! 1. [`SampleConverter::prepare`] once per negotiated format pair
//! 2. [`SampleConverter::sizes`] per buffer, to check buffer lengths
//! 3. [`SampleConverter::convert`] per buffer
//!
//! [`BasicConverter`] is a reference engine that handles every sample format
//! the converter advertises, and mixes channels by position when the layouts
//! differ.
//!
//! # Example
//!
//! ```rust
//! use parallax_audioconvert::converters::{
//!     BasicConverter, DitherMode, NoiseShaping, SampleConverter,
//! };
//! use parallax_audioconvert::format::{AudioCaps, AudioFormat};
//!
//! let input = AudioFormat::from_caps(&AudioCaps::int(44100, 1, 16, 16, true)).unwrap();
//! let output = AudioFormat::from_caps(&AudioCaps::float(44100, 1, 32)).unwrap();
//!
//! let engine = BasicConverter;
//! let mut ctx = engine.prepare(&input, &output, DitherMode::Tpdf, NoiseShaping::None).unwrap();
//! assert_eq!(engine.sizes(&ctx, 10).unwrap(), (20, 40));
//!
//! let src = vec![0u8; 20];
//! let mut dst = vec![0u8; 40];
//! engine.convert(&mut ctx, &src, &mut dst, 10, false).unwrap();
//! ```

mod audio;
mod mix;
mod silence;

pub use audio::{BasicContext, BasicConverter};
pub use silence::fill_silence;

use crate::error::{Error, Result};
use crate::format::AudioFormat;
use std::fmt;
use std::str::FromStr;

/// A sample conversion engine.
///
/// Implementations carry no per-stream state themselves; everything a
/// stream needs lives in the [`Context`](SampleConverter::Context).
pub trait SampleConverter {
    /// Per-stream state produced by [`prepare`](Self::prepare).
    type Context;

    /// Prepare a conversion between two fixed formats.
    fn prepare(
        &self,
        input: &AudioFormat,
        output: &AudioFormat,
        dither: DitherMode,
        noise_shaping: NoiseShaping,
    ) -> Result<Self::Context>;

    /// Input and output byte counts for `samples` units.
    fn sizes(&self, ctx: &Self::Context, samples: usize) -> Result<(usize, usize)>;

    /// Convert `samples` units from `src` into `dst`.
    ///
    /// `src_writable` tells the engine it may use `src` as scratch space.
    fn convert(
        &self,
        ctx: &mut Self::Context,
        src: &[u8],
        dst: &mut [u8],
        samples: usize,
        src_writable: bool,
    ) -> Result<()>;
}

// ============================================================================
// Options
// ============================================================================

/// Dithering applied when reducing integer precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DitherMode {
    /// No dithering.
    None,
    /// Rectangular probability density function.
    Rpdf,
    /// Triangular probability density function.
    #[default]
    Tpdf,
    /// High-frequency triangular probability density function.
    TpdfHf,
}

impl DitherMode {
    /// Short name used for the `dithering` property.
    pub const fn nick(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rpdf => "rpdf",
            Self::Tpdf => "tpdf",
            Self::TpdfHf => "tpdf-hf",
        }
    }
}

impl fmt::Display for DitherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl FromStr for DitherMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "rpdf" => Ok(Self::Rpdf),
            "tpdf" => Ok(Self::Tpdf),
            "tpdf-hf" => Ok(Self::TpdfHf),
            other => Err(Error::Config(format!("unknown dither mode: {other}"))),
        }
    }
}

/// Noise shaping applied when reducing integer precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoiseShaping {
    /// No noise shaping.
    #[default]
    None,
    /// Error feedback.
    ErrorFeedback,
    /// Simple 2-pole noise shaping.
    Simple,
    /// Medium 5-pole noise shaping.
    Medium,
    /// High 8-pole noise shaping.
    High,
}

impl NoiseShaping {
    /// Short name used for the `noise-shaping` property.
    pub const fn nick(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ErrorFeedback => "error-feedback",
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for NoiseShaping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl FromStr for NoiseShaping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "error-feedback" => Ok(Self::ErrorFeedback),
            "simple" => Ok(Self::Simple),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::Config(format!("unknown noise shaping: {other}"))),
        }
    }
}
