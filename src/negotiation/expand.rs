//! Capability expansion: every output format reachable from an input format.
//!
//! The converter can do any conversion except resampling, but some are
//! preferred over others. Changing the sample format (int/float, byte order,
//! signedness) is lossless; growing width, depth or channel count is cheap;
//! reducing precision is worse; dropping channels is worst. The expanded set
//! lists candidates in that order so fixation and peer intersection pick the
//! least lossy conversion available.

use crate::format::{
    AudioCaps, CapsValue, Endianness, Field, FormatKind, FormatSet, IntField,
    MAX_DEFAULT_LAYOUT_CHANNELS,
};

/// Highest channel count the converter expands to.
pub const MAX_NEGOTIABLE_CHANNELS: i32 = 11;

/// Widest integer sample the converter handles.
const MAX_INT_WIDTH: i32 = 32;

/// Lowest width precision is reduced to before dropping channels.
const MIN_REDUCED_WIDTH: i32 = 16;

/// Expand every structure of `caps` into the formats it can be converted to.
///
/// Structures after the first that are already covered by the accumulated
/// result are skipped, since they would expand to the same formats.
pub fn expand(caps: &FormatSet) -> FormatSet {
    let mut ret = FormatSet::new();

    for (j, structure) in caps.iter().enumerate() {
        if j > 0 && ret.is_subset_structure(structure) {
            tracing::trace!(%structure, "skipping structure already covered");
            continue;
        }
        expand_structure(structure, &mut ret);
    }

    tracing::debug!(caps = %ret, "caps transformed");
    ret
}

/// Append the ranked expansion of one structure to `ret`.
pub fn expand_structure(structure: &AudioCaps, ret: &mut FormatSet) {
    let is_float = structure.kind == FormatKind::Float;

    let mut s = structure.negotiable_fields();
    if !is_float && !s.has_field(Field::Depth) {
        // depth is commonly left out
        if let Some(width) = s.get_int(IntField::Width) {
            s.set_values(IntField::Depth, [width]);
        }
    }

    // Tier A: lossless changes, then the same with int <-> float
    make_lossless_changes(&mut s);
    ret.merge(s.clone());
    ret.merge(with_other_format(&s));
    tracing::trace!(len = ret.len(), "lossless variants added");

    // Tier B: growing width/depth/channels is fine, reducing them is not
    if !is_float {
        if let Some(width) = structure.get_int(IntField::Width) {
            if width <= MAX_INT_WIDTH {
                s.set_widths(width, MAX_INT_WIDTH);
            }
        }
        if let Some(depth) = structure.get_int(IntField::Depth) {
            if depth >= MAX_INT_WIDTH {
                s.set_values(IntField::Depth, [depth]);
            } else {
                s.set_range(IntField::Depth, depth, MAX_INT_WIDTH);
            }
        }
    }

    let channels = structure.get_int(IntField::Channels).unwrap_or(0);
    let allow_mixing = allows_mixing(structure);

    if allow_mixing {
        match channels {
            c if c <= 0 => s.set_range(IntField::Channels, 1, MAX_NEGOTIABLE_CHANNELS),
            c if c >= MAX_NEGOTIABLE_CHANNELS => s.set_values(IntField::Channels, [c]),
            c => s.set_range(IntField::Channels, c, MAX_NEGOTIABLE_CHANNELS),
        }
        s.remove_field(Field::ChannelPositions);
    } else {
        pin_channels(&mut s, structure, channels);
    }
    ret.merge(s.clone());
    ret.merge(with_other_format(&s));
    tracing::trace!(len = ret.len(), allow_mixing, "precision/channel growth added");

    // Tier C: reduce precision, but not below 16 bits. Going lower is worse
    // than dropping channels.
    if structure
        .get_int(IntField::Width)
        .is_none_or(|width| width > MIN_REDUCED_WIDTH)
    {
        let mut s2 = s.clone();
        if is_float {
            s2.set_widths_32_and_64();
            ret.merge(with_other_format(&s2));
        } else {
            s2.set_widths(MIN_REDUCED_WIDTH, MAX_INT_WIDTH);
            s2.set_range(IntField::Depth, MIN_REDUCED_WIDTH, MAX_INT_WIDTH);
            ret.merge(s2);
        }
    }

    // Tier D: fewer channels, only when nothing else works
    if allow_mixing {
        s.set_range(IntField::Channels, 1, MAX_NEGOTIABLE_CHANNELS);
        s.remove_field(Field::ChannelPositions);
    } else {
        pin_channels(&mut s, structure, channels);
    }
    ret.merge(s.clone());
    ret.merge(with_other_format(&s));
    tracing::trace!(len = ret.len(), "channel reduction added");

    // Tier E: any integer width/depth. Float input gets here through the
    // int conversion only; the float widths were covered above.
    s.set_widths(8, MAX_INT_WIDTH);
    s.set_range(IntField::Depth, 1, MAX_INT_WIDTH);
    if is_float {
        ret.merge(with_other_format(&s));
    } else {
        ret.merge(s);
    }
}

/// Whether the channel count of `structure` may be changed.
///
/// Mixing needs defined channel positions: a fixed unpositioned layout
/// blocks it, and so does a fixed count above the default-layout table with
/// no fixed layout at all. A count that is not fixed, or not positive,
/// always allows it, whatever layout comes with it.
pub fn allows_mixing(structure: &AudioCaps) -> bool {
    let Some(channels) = structure.get_int(IntField::Channels) else {
        return true;
    };
    if channels <= 0 {
        tracing::trace!(channels, "no usable channel count");
        return true;
    }
    let layout = structure
        .channel_positions
        .as_ref()
        .and_then(|c| c.as_concrete());

    match layout {
        None if channels <= MAX_DEFAULT_LAYOUT_CHANNELS => {
            tracing::trace!(channels, "no or unfixed channel-positions");
            true
        }
        None => {
            tracing::trace!(channels, "implicit undefined channel-positions");
            false
        }
        Some(layout) => !layout.is_unpositioned(),
    }
}

/// Pin the channel count (and layout, if any) to the input's.
fn pin_channels(s: &mut AudioCaps, structure: &AudioCaps, channels: i32) {
    s.set_values(IntField::Channels, [channels]);
    if let Some(layout) = &structure.channel_positions {
        s.channel_positions = Some(layout.clone());
    }
}

/// Relax fields that convert losslessly, and pin the float-only ones.
///
/// Both byte orders are always fine. Float has no depth or signedness and
/// comes in 32 and 64 bits; integer may be signed or unsigned.
fn make_lossless_changes(s: &mut AudioCaps) {
    s.endianness = CapsValue::from_values([Endianness::Little, Endianness::Big]);
    match s.kind {
        FormatKind::Float => {
            s.remove_field(Field::Depth);
            s.remove_field(Field::Signed);
            s.set_widths_32_and_64();
        }
        FormatKind::Int => {
            s.signed = CapsValue::from_values([true, false]);
        }
    }
}

/// Integer samples are at most 32 bits wide.
fn strip_width_64(s: &mut AudioCaps) {
    if let CapsValue::List(widths) = &s.width {
        s.width = CapsValue::from_values(widths.iter().copied().filter(|w| *w != 64));
    }
}

/// The same structure in the other kind, with the lossless relaxations.
fn with_other_format(s: &AudioCaps) -> AudioCaps {
    let mut s2 = s.clone();
    s2.kind = s.kind.other();
    make_lossless_changes(&mut s2);
    if s.kind == FormatKind::Float {
        strip_width_64(&mut s2);
    }
    s2
}
