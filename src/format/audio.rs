//! Fixed raw audio formats, as consumed by the sample conversion engine.

use super::caps::{AudioCaps, Endianness, FormatKind};
use super::layout::{ChannelLayout, LayoutConstraint, MAX_DEFAULT_LAYOUT_CHANNELS};
use crate::error::{Error, Result};

/// Highest channel count a format may carry.
pub const MAX_CHANNELS: i32 = 64;

/// A fully fixed, validated raw audio format.
///
/// Produced from fixed [`AudioCaps`] by [`AudioFormat::from_caps`]. For
/// float formats `depth` equals `width` and `signed` is `true`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    /// Integer or float.
    pub kind: FormatKind,
    /// Sample rate in Hz.
    pub rate: i32,
    /// Number of channels.
    pub channels: i32,
    /// Bits per sample container.
    pub width: i32,
    /// Significant bits per sample.
    pub depth: i32,
    /// Byte order.
    pub endianness: Endianness,
    /// Signed samples (integer only).
    pub signed: bool,
    /// Channel positions, one per channel.
    pub layout: ChannelLayout,
    /// Whether the layout has no defined positions.
    pub unpositioned_layout: bool,
}

impl AudioFormat {
    /// Parse fixed caps into a format.
    ///
    /// Rejects caps that still have freedom or miss a required field. Integer
    /// widths must be 8, 16, 24 or 32 with depth in `[1, width]`; float widths
    /// must be 32 or 64. Rate must be positive and channels in
    /// `[1, MAX_CHANNELS]`.
    pub fn from_caps(caps: &AudioCaps) -> Result<Self> {
        if !caps.is_fixed() {
            return Err(Error::NotFixed(caps.to_string()));
        }

        let missing = |field: &str| Error::InvalidCaps(format!("missing {field} in {caps}"));

        let channels = caps.channels.as_fixed().ok_or_else(|| missing("channels"))?;
        if !(1..=MAX_CHANNELS).contains(&channels) {
            return Err(Error::InvalidCaps(format!(
                "channel count must be in [1, {MAX_CHANNELS}], got {channels}"
            )));
        }
        let (layout, unpositioned_layout) = Self::parse_layout(caps, channels)?;

        let width = caps.width.as_fixed().ok_or_else(|| missing("width"))?;
        let valid_width = match caps.kind {
            FormatKind::Int => matches!(width, 8 | 16 | 24 | 32),
            FormatKind::Float => matches!(width, 32 | 64),
        };
        if !valid_width {
            tracing::debug!(width, kind = %caps.kind, "unsupported width");
            return Err(Error::InvalidCaps(format!(
                "width {width} is not valid for {}",
                caps.kind
            )));
        }

        let rate = caps.rate.as_fixed().ok_or_else(|| missing("rate"))?;
        if rate < 1 {
            return Err(Error::InvalidCaps(format!("rate must be positive, got {rate}")));
        }

        // only 8-bit samples may leave the byte order out
        let endianness = match caps.endianness.as_fixed() {
            Some(e) => e,
            None if width == 8 => Endianness::NATIVE,
            None => return Err(missing("endianness")),
        };

        let (depth, signed) = match caps.kind {
            FormatKind::Int => {
                let signed = caps.signed.as_fixed().ok_or_else(|| missing("signed"))?;
                let depth = caps.depth.as_fixed().ok_or_else(|| missing("depth"))?;
                if depth > width {
                    tracing::debug!(depth, width, "depth > width, not allowed");
                    return Err(Error::InvalidCaps(format!(
                        "depth {depth} exceeds width {width}"
                    )));
                }
                if depth < 1 {
                    return Err(Error::InvalidCaps(format!(
                        "depth must be positive, got {depth}"
                    )));
                }
                (depth, signed)
            }
            FormatKind::Float => (width, true),
        };

        Ok(Self {
            kind: caps.kind,
            rate,
            channels,
            width,
            depth,
            endianness,
            signed,
            layout,
            unpositioned_layout,
        })
    }

    fn parse_layout(caps: &AudioCaps, channels: i32) -> Result<(ChannelLayout, bool)> {
        match &caps.channel_positions {
            Some(LayoutConstraint::Concrete(layout)) => {
                if layout.len() != channels as usize {
                    return Err(Error::InvalidCaps(format!(
                        "{} channel positions for {} channels",
                        layout.len(),
                        channels
                    )));
                }
                Ok((layout.clone(), layout.is_unpositioned()))
            }
            Some(LayoutConstraint::OneOf(_)) => Err(Error::NotFixed(caps.to_string())),
            // mono and stereo have an implied layout
            None if channels <= 2 => {
                let layout = ChannelLayout::default_for(channels)
                    .unwrap_or_else(|| ChannelLayout::unpositioned(channels as usize));
                Ok((layout, false))
            }
            None if channels > MAX_DEFAULT_LAYOUT_CHANNELS => {
                Ok((ChannelLayout::unpositioned(channels as usize), true))
            }
            None => Err(Error::InvalidCaps(format!(
                "no channel positions for {channels} channels"
            ))),
        }
    }

    /// Whether samples are integers.
    #[inline]
    pub fn is_int(&self) -> bool {
        self.kind == FormatKind::Int
    }

    /// Bytes per sample for one channel.
    #[inline]
    pub const fn bytes_per_sample(&self) -> usize {
        (self.width / 8) as usize
    }

    /// Bytes per unit (one sample across all channels).
    #[inline]
    pub const fn unit_size(&self) -> usize {
        (self.width as usize * self.channels as usize) / 8
    }

    /// Whole units in a buffer of `len` bytes. Trailing bytes are ignored.
    #[inline]
    pub const fn samples_in(&self, len: usize) -> usize {
        match self.unit_size() {
            0 => 0,
            unit => len / unit,
        }
    }

    /// Fixed caps describing this format.
    pub fn to_caps(&self) -> AudioCaps {
        let caps = AudioCaps::new(self.kind)
            .with_rate(self.rate)
            .with_channels(self.channels)
            .with_width(self.width)
            .with_endianness(self.endianness)
            .with_layout(self.layout.clone());
        match self.kind {
            FormatKind::Int => caps.with_depth(self.depth).with_signed(self.signed),
            FormatKind::Float => caps,
        }
    }
}

/// Unit size of fixed caps, in bytes.
pub fn unit_size(caps: &AudioCaps) -> Result<usize> {
    let format = AudioFormat::from_caps(caps)?;
    tracing::info!(unit_size = format.unit_size(), "unit size");
    Ok(format.unit_size())
}
