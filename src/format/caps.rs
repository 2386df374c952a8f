//! Raw audio format descriptors and ordered sets of them.

use super::layout::{ChannelLayout, LayoutConstraint};
use super::value::{CapsScalar, CapsValue};
use smallvec::SmallVec;
use std::fmt;

// ============================================================================
// Field vocabulary
// ============================================================================

/// Kind of raw audio a descriptor describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Integer PCM (`audio/x-raw-int`).
    Int,
    /// Floating-point PCM (`audio/x-raw-float`).
    Float,
}

impl FormatKind {
    /// Media type name used in caps strings.
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::Int => "audio/x-raw-int",
            Self::Float => "audio/x-raw-float",
        }
    }

    /// The other kind (int <-> float).
    pub const fn other(&self) -> Self {
        match self {
            Self::Int => Self::Float,
            Self::Float => Self::Int,
        }
    }

    /// Parse a media type name.
    pub fn from_media_type(name: &str) -> Option<Self> {
        match name {
            "audio/x-raw-int" => Some(Self::Int),
            "audio/x-raw-float" => Some(Self::Float),
            _ => None,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

/// Byte order of samples.
///
/// Discriminants are the conventional `1234`/`4321` values; nearest-value
/// fixation works on them directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum Endianness {
    /// Least significant byte first.
    Little = 1234,
    /// Most significant byte first.
    Big = 4321,
}

impl Endianness {
    /// Byte order of the running machine.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// Byte order of the running machine.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Numeric value (`1234` or `4321`).
    pub const fn value(&self) -> i32 {
        *self as i32
    }

    /// Parse the numeric value.
    pub const fn from_value(value: i32) -> Option<Self> {
        match value {
            1234 => Some(Self::Little),
            4321 => Some(Self::Big),
            _ => None,
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl CapsScalar for Endianness {
    const TYPE_NAME: &'static str = "int";

    #[inline]
    fn to_i64(self) -> i64 {
        self.value() as i64
    }
}

/// Name of a descriptor field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// Sample rate in Hz.
    Rate,
    /// Channel count.
    Channels,
    /// Bits per sample container.
    Width,
    /// Significant bits per sample (integer only).
    Depth,
    /// Byte order.
    Endianness,
    /// Signedness (integer only).
    Signed,
    /// Channel layout.
    ChannelPositions,
}

impl Field {
    /// Field name as written in caps strings.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rate => "rate",
            Self::Channels => "channels",
            Self::Width => "width",
            Self::Depth => "depth",
            Self::Endianness => "endianness",
            Self::Signed => "signed",
            Self::ChannelPositions => "channel-positions",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The integer-valued fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntField {
    /// Sample rate.
    Rate,
    /// Channel count.
    Channels,
    /// Sample width.
    Width,
    /// Sample depth.
    Depth,
}

impl From<IntField> for Field {
    fn from(field: IntField) -> Self {
        match field {
            IntField::Rate => Field::Rate,
            IntField::Channels => Field::Channels,
            IntField::Width => Field::Width,
            IntField::Depth => Field::Depth,
        }
    }
}

// ============================================================================
// AudioCaps - one format descriptor
// ============================================================================

/// Raw audio format with constraints for negotiation.
///
/// One structure of a caps set: a format kind plus a constraint per field.
/// All mutation is copy-then-mutate; descriptors never share state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioCaps {
    /// Integer or floating point.
    pub kind: FormatKind,
    /// Sample rate constraint.
    pub rate: CapsValue<i32>,
    /// Channel count constraint.
    pub channels: CapsValue<i32>,
    /// Width constraint.
    pub width: CapsValue<i32>,
    /// Depth constraint.
    pub depth: CapsValue<i32>,
    /// Byte order constraint.
    pub endianness: CapsValue<Endianness>,
    /// Signedness constraint.
    pub signed: CapsValue<bool>,
    /// Channel layout constraint.
    pub channel_positions: Option<LayoutConstraint>,
}

impl AudioCaps {
    /// A descriptor of the given kind with no fields set.
    pub fn new(kind: FormatKind) -> Self {
        Self {
            kind,
            rate: CapsValue::Absent,
            channels: CapsValue::Absent,
            width: CapsValue::Absent,
            depth: CapsValue::Absent,
            endianness: CapsValue::Absent,
            signed: CapsValue::Absent,
            channel_positions: None,
        }
    }

    /// Fixed integer format.
    pub fn int(rate: i32, channels: i32, width: i32, depth: i32, signed: bool) -> Self {
        Self::new(FormatKind::Int)
            .with_rate(rate)
            .with_channels(channels)
            .with_width(width)
            .with_depth(depth)
            .with_signed(signed)
            .with_endianness(Endianness::NATIVE)
    }

    /// Fixed floating-point format.
    pub fn float(rate: i32, channels: i32, width: i32) -> Self {
        Self::new(FormatKind::Float)
            .with_rate(rate)
            .with_channels(channels)
            .with_width(width)
            .with_endianness(Endianness::NATIVE)
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Set a fixed sample rate.
    pub fn with_rate(mut self, rate: i32) -> Self {
        self.rate = CapsValue::Fixed(rate);
        self
    }

    /// Set a fixed channel count.
    pub fn with_channels(mut self, channels: i32) -> Self {
        self.channels = CapsValue::Fixed(channels);
        self
    }

    /// Set a fixed width.
    pub fn with_width(mut self, width: i32) -> Self {
        self.width = CapsValue::Fixed(width);
        self
    }

    /// Set a fixed depth.
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = CapsValue::Fixed(depth);
        self
    }

    /// Set a fixed byte order.
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = CapsValue::Fixed(endianness);
        self
    }

    /// Set a fixed signedness.
    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = CapsValue::Fixed(signed);
        self
    }

    /// Set a concrete channel layout.
    pub fn with_layout(mut self, layout: ChannelLayout) -> Self {
        self.channel_positions = Some(LayoutConstraint::Concrete(layout));
        self
    }

    /// Set a layout constraint.
    pub fn with_layout_constraint(mut self, constraint: LayoutConstraint) -> Self {
        self.channel_positions = Some(constraint);
        self
    }

    // ========================================================================
    // Field access and mutation
    // ========================================================================

    /// Constraint of an integer field.
    pub fn int_field(&self, field: IntField) -> &CapsValue<i32> {
        match field {
            IntField::Rate => &self.rate,
            IntField::Channels => &self.channels,
            IntField::Width => &self.width,
            IntField::Depth => &self.depth,
        }
    }

    fn int_field_mut(&mut self, field: IntField) -> &mut CapsValue<i32> {
        match field {
            IntField::Rate => &mut self.rate,
            IntField::Channels => &mut self.channels,
            IntField::Width => &mut self.width,
            IntField::Depth => &mut self.depth,
        }
    }

    /// Fixed value of an integer field, if it is fixed.
    pub fn get_int(&self, field: IntField) -> Option<i32> {
        self.int_field(field).as_fixed()
    }

    /// Restrict an integer field to a list of values (one value: fixed).
    pub fn set_values(&mut self, field: IntField, values: impl IntoIterator<Item = i32>) {
        *self.int_field_mut(field) = CapsValue::from_values(values);
    }

    /// Restrict an integer field to `[lo, hi]`.
    pub fn set_range(&mut self, field: IntField, lo: i32, hi: i32) {
        *self.int_field_mut(field) = CapsValue::range(lo, hi);
    }

    /// Widths that are multiples of 8 in `[min, max]`.
    pub fn set_widths(&mut self, min: i32, max: i32) {
        self.set_values(IntField::Width, (min..=max).step_by(8));
    }

    /// The float widths, 32 and 64.
    pub fn set_widths_32_and_64(&mut self) {
        self.set_values(IntField::Width, [32, 64]);
    }

    /// Whether a field is present.
    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::Rate => self.rate.is_present(),
            Field::Channels => self.channels.is_present(),
            Field::Width => self.width.is_present(),
            Field::Depth => self.depth.is_present(),
            Field::Endianness => self.endianness.is_present(),
            Field::Signed => self.signed.is_present(),
            Field::ChannelPositions => self.channel_positions.is_some(),
        }
    }

    /// Remove a field.
    pub fn remove_field(&mut self, field: Field) {
        match field {
            Field::Rate => self.rate = CapsValue::Absent,
            Field::Channels => self.channels = CapsValue::Absent,
            Field::Width => self.width = CapsValue::Absent,
            Field::Depth => self.depth = CapsValue::Absent,
            Field::Endianness => self.endianness = CapsValue::Absent,
            Field::Signed => self.signed = CapsValue::Absent,
            Field::ChannelPositions => self.channel_positions = None,
        }
    }

    /// Copy with only the negotiable sample fields kept.
    ///
    /// Drops the channel layout; everything else is already a negotiable
    /// field.
    pub fn negotiable_fields(&self) -> Self {
        let mut s = self.clone();
        s.remove_field(Field::ChannelPositions);
        s
    }

    /// Fields present but not fixed.
    pub fn unfixed_fields(&self) -> Vec<Field> {
        let mut out = Vec::new();
        let mut check = |present: bool, fixed: bool, field: Field| {
            if present && !fixed {
                out.push(field);
            }
        };
        check(self.rate.is_present(), self.rate.is_fixed(), Field::Rate);
        check(
            self.channels.is_present(),
            self.channels.is_fixed(),
            Field::Channels,
        );
        check(self.width.is_present(), self.width.is_fixed(), Field::Width);
        check(self.depth.is_present(), self.depth.is_fixed(), Field::Depth);
        check(
            self.endianness.is_present(),
            self.endianness.is_fixed(),
            Field::Endianness,
        );
        check(
            self.signed.is_present(),
            self.signed.is_fixed(),
            Field::Signed,
        );
        if let Some(layout) = &self.channel_positions {
            check(true, layout.is_fixed(), Field::ChannelPositions);
        }
        out
    }

    /// Check if every present field is fixed.
    pub fn is_fixed(&self) -> bool {
        self.unfixed_fields().is_empty()
    }

    // ========================================================================
    // Set operations
    // ========================================================================

    /// Intersect with another descriptor.
    ///
    /// Kinds must match; each field intersects independently.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.kind != other.kind {
            return None;
        }
        let channel_positions = match (&self.channel_positions, &other.channel_positions) {
            (None, other) => other.clone(),
            (this, None) => this.clone(),
            (Some(a), Some(b)) => Some(a.intersect(b)?),
        };
        Some(Self {
            kind: self.kind,
            rate: self.rate.intersect(&other.rate)?,
            channels: self.channels.intersect(&other.channels)?,
            width: self.width.intersect(&other.width)?,
            depth: self.depth.intersect(&other.depth)?,
            endianness: self.endianness.intersect(&other.endianness)?,
            signed: self.signed.intersect(&other.signed)?,
            channel_positions,
        })
    }

    /// Check whether every format `self` accepts is accepted by `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        let layout_subset = match (&self.channel_positions, &other.channel_positions) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a.is_subset_of(b),
        };
        self.kind == other.kind
            && layout_subset
            && self.rate.is_subset_of(&other.rate)
            && self.channels.is_subset_of(&other.channels)
            && self.width.is_subset_of(&other.width)
            && self.depth.is_subset_of(&other.depth)
            && self.endianness.is_subset_of(&other.endianness)
            && self.signed.is_subset_of(&other.signed)
    }
}

fn write_field<T: CapsScalar>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    value: &CapsValue<T>,
) -> fmt::Result {
    if value.is_present() {
        write!(f, ", {name}={value}")?;
    }
    Ok(())
}

/// Serializes in caps-string syntax, e.g.
/// `audio/x-raw-int, rate=(int)44100, channels=(int)2, ...`.
impl fmt::Display for AudioCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.media_type())?;
        write_field(f, "rate", &self.rate)?;
        write_field(f, "channels", &self.channels)?;
        write_field(f, "endianness", &self.endianness)?;
        write_field(f, "width", &self.width)?;
        write_field(f, "depth", &self.depth)?;
        write_field(f, "signed", &self.signed)?;
        if let Some(layout) = &self.channel_positions {
            write!(f, ", channel-positions={layout}")?;
        }
        Ok(())
    }
}

// ============================================================================
// FormatSet - ordered set of descriptors
// ============================================================================

/// Ordered set of descriptors: "any one of these", earlier is preferred.
///
/// # Example
///
/// ```rust
/// use parallax_audioconvert::format::{AudioCaps, FormatSet};
///
/// let mut set = FormatSet::new();
/// set.merge(AudioCaps::int(44100, 2, 16, 16, true));
/// set.merge(AudioCaps::int(44100, 2, 16, 16, true));
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FormatSet(SmallVec<[AudioCaps; 4]>);

impl FormatSet {
    /// An empty set (matches nothing).
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// A set with one descriptor.
    pub fn single(caps: AudioCaps) -> Self {
        let mut set = Self::new();
        set.push(caps);
        set
    }

    /// Append unconditionally.
    pub fn push(&mut self, caps: AudioCaps) {
        self.0.push(caps);
    }

    /// Append unless an existing entry already covers `caps`.
    pub fn merge(&mut self, caps: AudioCaps) {
        if !self.is_subset_structure(&caps) {
            self.0.push(caps);
        }
    }

    /// Whether some entry accepts everything `caps` accepts.
    pub fn is_subset_structure(&self, caps: &AudioCaps) -> bool {
        self.0.iter().any(|s| caps.is_subset_of(s))
    }

    /// Intersect, keeping the order of `self`.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Self::new();
        for a in &self.0 {
            for b in &other.0 {
                if let Some(common) = a.intersect(b) {
                    out.merge(common);
                }
            }
        }
        out
    }

    /// Whether every entry is fixed (and there is exactly one).
    pub fn is_fixed(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_fixed()
    }

    /// Number of descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Descriptor at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&AudioCaps> {
        self.0.get(index)
    }

    /// The preferred descriptor.
    #[inline]
    pub fn first(&self) -> Option<&AudioCaps> {
        self.0.first()
    }

    /// Iterate in preference order.
    pub fn iter(&self) -> std::slice::Iter<'_, AudioCaps> {
        self.0.iter()
    }
}

impl From<AudioCaps> for FormatSet {
    fn from(caps: AudioCaps) -> Self {
        Self::single(caps)
    }
}

impl FromIterator<AudioCaps> for FormatSet {
    fn from_iter<I: IntoIterator<Item = AudioCaps>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FormatSet {
    type Item = &'a AudioCaps;
    type IntoIter = std::slice::Iter<'a, AudioCaps>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FormatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("EMPTY");
        }
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}
