//! Fixation: collapse a candidate format to one concrete format, staying as
//! close to the input as the candidate allows.

use super::error::NegotiationError;
use crate::error::{Error, Result};
use crate::format::{
    AudioCaps, AudioFormat, CapsScalar, CapsValue, ChannelLayout, Field, FormatSet, IntField,
    LayoutConstraint,
};

/// Fixate the preferred candidate against a fixed input format.
///
/// The first entry of `candidates` is used. Rate, byte order, width, depth,
/// signedness and channel count are pulled toward the input's values; any
/// freedom left after that resolves to the first listed value or the lowest
/// value of a range. The result is validated as a complete format.
pub fn fixate(input: &AudioCaps, candidates: &FormatSet) -> Result<AudioCaps> {
    if !input.is_fixed() {
        return Err(Error::NotFixed(input.to_string()));
    }
    let Some(first) = candidates.first() else {
        return Err(NegotiationError::exhausted(&input.to_string(), "EMPTY").into());
    };
    let mut outs = first.clone();
    tracing::debug!(input = %input, candidate = %outs, "fixating");

    fixate_channels(input, &mut outs)?;

    if let Some(rate) = input.get_int(IntField::Rate) {
        fixate_field(&mut outs.rate, rate, Field::Rate)?;
    }
    if let Some(endianness) = input.endianness.as_fixed() {
        fixate_field(&mut outs.endianness, endianness, Field::Endianness)?;
    }
    if let Some(width) = input.get_int(IntField::Width) {
        fixate_field(&mut outs.width, width, Field::Width)?;
    }

    if outs.depth.is_present() {
        // a depth wider than the chosen container is never valid
        if let Some(width) = outs.get_int(IntField::Width) {
            let fits = (width >= 1)
                .then(|| outs.depth.intersect(&CapsValue::range(1, width)))
                .flatten();
            outs.depth = fits.ok_or_else(|| {
                NegotiationError::cannot_fixate(
                    Field::Depth,
                    format!("no depth in {} fits width {width}", outs.depth),
                )
            })?;
        }
        let target = input
            .get_int(IntField::Depth)
            .or_else(|| outs.get_int(IntField::Width))
            .or_else(|| input.get_int(IntField::Width));
        if let Some(target) = target {
            fixate_field(&mut outs.depth, target, Field::Depth)?;
        }
    }

    if let Some(signed) = input.signed.as_fixed() {
        if outs.signed.is_present() && !outs.signed.is_fixed() {
            let value = if outs.signed.accepts(signed) {
                signed
            } else {
                outs.signed.fixate_first().unwrap_or(signed)
            };
            outs.signed = CapsValue::Fixed(value);
        }
    }

    fixate_remaining(&mut outs)?;
    tracing::debug!(caps = %outs, "fixated");

    AudioFormat::from_caps(&outs)?;
    Ok(outs)
}

/// Fixate the channel count and pick a matching layout.
///
/// Preference for the layout: the candidate's own concrete layout, then the
/// input layout when the count is unchanged and the candidate allows it,
/// then the first candidate layout of the right size, then the default
/// layout for the count.
fn fixate_channels(input: &AudioCaps, outs: &mut AudioCaps) -> Result<()> {
    let Some(in_chans) = input.get_int(IntField::Channels) else {
        return Ok(());
    };
    if !outs.channels.is_present() {
        // nothing to do, no channels field
        outs.remove_field(Field::ChannelPositions);
        return Ok(());
    }
    fixate_field(&mut outs.channels, in_chans, Field::Channels)?;
    let Some(out_chans) = outs.get_int(IntField::Channels) else {
        outs.remove_field(Field::ChannelPositions);
        return Ok(());
    };

    let in_layout = input.channel_positions.as_ref().and_then(|c| c.as_concrete());
    let mut out_layout = outs.channel_positions.clone();

    if out_layout.is_none() {
        // mono and stereo without positions are fine
        if out_chans <= 2 && (in_chans != out_chans || in_layout.is_none()) {
            return Ok(());
        }
        tracing::warn!(channels = out_chans, "downstream caps contain no channel layout");
    }

    if in_chans == out_chans {
        if let Some(in_layout) = in_layout {
            match &out_layout {
                None => {
                    outs.channel_positions = Some(LayoutConstraint::Concrete(in_layout.clone()));
                    return Ok(());
                }
                Some(LayoutConstraint::Concrete(layout)) if layout.len() == out_chans as usize => {
                    return Ok(());
                }
                Some(constraint) => {
                    if constraint.contains(in_layout) {
                        outs.channel_positions =
                            Some(LayoutConstraint::Concrete(in_layout.clone()));
                        return Ok(());
                    }
                    if let Some(found) = constraint.find_suitable(out_chans as usize) {
                        outs.channel_positions = Some(LayoutConstraint::Concrete(found.clone()));
                        return Ok(());
                    }
                    tracing::warn!(layout = %constraint, "unexpected output channel layout");
                    out_layout = None;
                }
            }
        }
    }

    if let Some(constraint) = &out_layout {
        if let Some(found) = constraint.find_suitable(out_chans as usize) {
            outs.channel_positions = Some(LayoutConstraint::Concrete(found.clone()));
            return Ok(());
        }
        tracing::warn!(
            layout = %constraint,
            channels = out_chans,
            "invalid or unexpected channel-positions"
        );
    }

    match ChannelLayout::default_for(out_chans) {
        Some(layout) => {
            tracing::debug!(
                channels = out_chans,
                %layout,
                "using default channel layout as fallback"
            );
            outs.channel_positions = Some(LayoutConstraint::Concrete(layout));
        }
        None => outs.remove_field(Field::ChannelPositions),
    }
    Ok(())
}

/// Pull `value` toward `target`. Absent fields are left alone.
fn fixate_field<T: CapsScalar>(value: &mut CapsValue<T>, target: T, field: Field) -> Result<()> {
    if value.is_empty() {
        let reason = format!("no value allowed by {value}");
        return Err(NegotiationError::cannot_fixate(field, reason).into());
    }
    if let Some(v) = value.fixate_nearest(target) {
        *value = CapsValue::Fixed(v);
    }
    Ok(())
}

fn fixate_first<T: CapsScalar>(value: &mut CapsValue<T>, field: Field) -> Result<()> {
    if value.is_present() && !value.is_fixed() {
        let v = value
            .fixate_first()
            .ok_or_else(|| NegotiationError::cannot_fixate(field, "no allowed value"))?;
        *value = CapsValue::Fixed(v);
    }
    Ok(())
}

fn fixate_remaining(outs: &mut AudioCaps) -> Result<()> {
    fixate_first(&mut outs.rate, Field::Rate)?;
    fixate_first(&mut outs.channels, Field::Channels)?;
    fixate_first(&mut outs.width, Field::Width)?;
    fixate_first(&mut outs.depth, Field::Depth)?;
    fixate_first(&mut outs.endianness, Field::Endianness)?;
    fixate_first(&mut outs.signed, Field::Signed)?;

    if matches!(outs.channel_positions, Some(LayoutConstraint::OneOf(_))) {
        let chosen = match (&outs.channel_positions, outs.get_int(IntField::Channels)) {
            (Some(c), Some(chans)) => c.find_suitable(chans as usize).cloned(),
            (Some(c), None) => c.layouts().first().map(|l| (*l).clone()),
            _ => None,
        };
        let layout = chosen.ok_or_else(|| {
            NegotiationError::cannot_fixate(
                Field::ChannelPositions,
                "no layout matches the channel count",
            )
        })?;
        outs.channel_positions = Some(LayoutConstraint::Concrete(layout));
    }

    let unfixed = outs.unfixed_fields();
    if let Some(field) = unfixed.first() {
        let reason = format!("still unfixed in {outs}");
        return Err(NegotiationError::cannot_fixate(*field, reason).into());
    }
    Ok(())
}
