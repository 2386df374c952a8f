//! Integration tests for caps negotiation.
//!
//! These tests drive the full flow a pipeline host would: expand the input,
//! intersect with a peer, fixate, and install the result.

use parallax_audioconvert::element::AudioConvert;
use parallax_audioconvert::format::{
    AudioCaps, AudioFormat, CapsValue, ChannelLayout, Field, FormatKind, FormatSet, IntField,
    LayoutConstraint,
};
use parallax_audioconvert::negotiation::{
    MAX_NEGOTIABLE_CHANNELS, allows_mixing, expand, fixate, transform_caps,
};
use parallax_audioconvert::metadata::BufferFlags;
use parallax_audioconvert::observability::Direction;

fn caps(s: &str) -> AudioCaps {
    s.parse().unwrap()
}

fn expand_one(input: &AudioCaps) -> FormatSet {
    expand(&FormatSet::single(input.clone()))
}

/// Index of the first expanded entry accepting `caps`.
fn rank(expanded: &FormatSet, caps: &AudioCaps) -> Option<usize> {
    expanded.iter().position(|s| caps.is_subset_of(s))
}

// ============================================================================
// Expansion Properties
// ============================================================================

/// The first two entries differ from the input only in lossless fields.
#[test]
fn test_lossless_tier_soundness() {
    for input in [
        AudioCaps::int(44100, 2, 16, 16, true),
        AudioCaps::int(8000, 1, 8, 8, false),
        AudioCaps::float(48000, 6, 32).with_layout(ChannelLayout::default_for(6).unwrap()),
    ] {
        let expanded = expand_one(&input);
        for s in expanded.iter().take(2) {
            assert_eq!(s.rate, input.rate);
            assert_eq!(s.channels, input.channels);
            if s.kind == input.kind && input.kind == FormatKind::Int {
                assert_eq!(s.width, input.width);
                assert_eq!(s.depth, input.depth);
            }
            assert_eq!(
                s.endianness,
                CapsValue::from_values([
                    parallax_audioconvert::format::Endianness::Little,
                    parallax_audioconvert::format::Endianness::Big
                ])
            );
        }
    }
}

/// A wider output is ranked no later than a narrower one.
#[test]
fn test_monotonic_precision() {
    let input = AudioCaps::int(44100, 2, 16, 16, true);
    let expanded = expand_one(&input);

    let s24 = AudioCaps::int(44100, 2, 24, 16, true);
    let s8 = AudioCaps::int(44100, 2, 8, 8, true);
    let wider = rank(&expanded, &s24).unwrap();
    let narrower = rank(&expanded, &s8).unwrap();
    assert!(wider < narrower, "24 bit at {wider}, 8 bit at {narrower}");
}

/// More channels are ranked before fewer channels.
#[test]
fn test_channel_growth_before_reduction() {
    let input = AudioCaps::int(44100, 2, 16, 16, true);
    let expanded = expand_one(&input);

    let more = AudioCaps::int(44100, 4, 16, 16, true);
    let fewer = AudioCaps::int(44100, 1, 16, 16, true);
    assert!(rank(&expanded, &more).unwrap() < rank(&expanded, &fewer).unwrap());

    for s in expanded.iter() {
        if let CapsValue::Range { max, .. } = s.channels {
            assert!(max <= MAX_NEGOTIABLE_CHANNELS);
        }
    }
}

/// Descriptors with both width and depth fixed never have depth > width.
#[test]
fn test_depth_never_exceeds_width() {
    for input in [
        AudioCaps::int(44100, 2, 8, 8, true),
        AudioCaps::int(44100, 2, 16, 12, false),
        AudioCaps::int(44100, 2, 24, 24, true),
        AudioCaps::int(44100, 2, 32, 32, true),
        AudioCaps::float(44100, 2, 64),
    ] {
        for s in expand_one(&input).iter() {
            if let (Some(w), Some(d)) = (s.get_int(IntField::Width), s.get_int(IntField::Depth)) {
                assert!(d <= w, "{s}");
            }
        }
    }
}

/// Float input can reach every integer width, and integer input can reach
/// float.
#[test]
fn test_cross_kind_symmetry() {
    let float = expand_one(&AudioCaps::float(44100, 2, 32));
    for width in [8, 16, 24, 32] {
        let target = AudioCaps::int(44100, 2, width, width, true);
        assert!(rank(&float, &target).is_some(), "no int{width} from float");
    }

    let int = expand_one(&AudioCaps::int(44100, 2, 16, 16, true));
    assert!(int.iter().any(|s| s.kind == FormatKind::Float));
    assert!(rank(&int, &AudioCaps::float(44100, 2, 64)).is_some());
}

/// An unpositioned layout pins the channel count in every entry.
#[test]
fn test_unpositioned_blocks_mixing() {
    let input = AudioCaps::int(44100, 4, 16, 16, true)
        .with_layout(ChannelLayout::unpositioned(4));
    for s in expand_one(&input).iter() {
        assert_eq!(s.channels, CapsValue::Fixed(4));
    }
}

/// Unknown channel count is free to take any negotiable count.
#[test]
fn test_missing_channels_are_mixable() {
    let mut input = AudioCaps::int(44100, 2, 16, 16, true);
    input.remove_field(Field::Channels);
    let expanded = expand_one(&input);
    assert!(
        expanded
            .iter()
            .any(|s| s.channels == CapsValue::range(1, MAX_NEGOTIABLE_CHANNELS))
    );
}

/// A zero channel count is mixable even when a layout comes with it.
#[test]
fn test_zero_channels_ignore_layout() {
    for layout in [ChannelLayout::default_for(2).unwrap(), ChannelLayout::unpositioned(2)] {
        let input = AudioCaps::int(44100, 0, 16, 16, true).with_layout(layout);
        assert!(allows_mixing(&input));

        let expanded = expand_one(&input);
        let any_count = CapsValue::range(1, MAX_NEGOTIABLE_CHANNELS);
        // growth, reduction and any-width entries all offer every count
        assert!(expanded.len() > 2);
        for s in expanded.iter().skip(2) {
            assert_eq!(s.channels, any_count, "{s}");
        }
        assert!(expanded.iter().all(|s| s.channel_positions.is_none()));
    }
}

// ============================================================================
// Fixation Properties
// ============================================================================

/// The rate passes through unchanged; a peer without it leaves nothing.
#[test]
fn test_rate_is_kept() {
    let input = caps(
        "audio/x-raw-int, rate=(int)44100, channels=(int)2, endianness=(int)1234, \
         width=(int)16, depth=(int)16, signed=(boolean)true",
    );
    let peer: FormatSet = "audio/x-raw-int, rate=(int){ 8000, 48000, 96000 }".parse().unwrap();
    let out = fixate(&input, &transform_caps(&FormatSet::single(input.clone()), Some(&peer)));
    // resampling is not a conversion this element does
    assert!(matches!(
        out,
        Err(parallax_audioconvert::Error::Negotiation(
            parallax_audioconvert::negotiation::NegotiationError::Exhausted { .. }
        ))
    ));

    let peer: FormatSet = "audio/x-raw-int, rate=(int)[ 8000, 96000 ]".parse().unwrap();
    let out = fixate(&input, &transform_caps(&FormatSet::single(input.clone()), Some(&peer)))
        .unwrap();
    assert_eq!(out.rate, CapsValue::Fixed(44100));
}

/// Upmixing stereo to six channels yields the default 5.1 layout, and the
/// element accepts the pair.
#[test]
fn test_default_layout_for_six_channels() {
    let input = AudioCaps::int(48000, 2, 16, 16, true);
    let peer: FormatSet = "audio/x-raw-int, channels=(int)6".parse().unwrap();
    let candidates = transform_caps(&FormatSet::single(input.clone()), Some(&peer));
    let out = fixate(&input, &candidates).unwrap();

    assert_eq!(out.channels, CapsValue::Fixed(6));
    assert_eq!(
        out.channel_positions,
        Some(LayoutConstraint::Concrete(ChannelLayout::default_for(6).unwrap()))
    );
    assert_eq!(
        out.channel_positions.as_ref().unwrap().to_string(),
        "< front-left, front-right, rear-left, rear-right, front-center, lfe >"
    );

    let mut convert = AudioConvert::new();
    convert.set_caps(&input, &out).unwrap();
    let mut dst = [0u8; 12];
    assert_eq!(
        convert
            .transform(&[0u8; 4], BufferFlags::default(), &mut dst)
            .unwrap(),
        12
    );
}

/// Fixating a fixed result against itself changes nothing.
#[test]
fn test_refixation_is_idempotent() {
    let input = AudioCaps::int(44100, 2, 24, 20, false);
    let peer: FormatSet = "audio/x-raw-float".parse().unwrap();
    let once = fixate(
        &input,
        &transform_caps(&FormatSet::single(input.clone()), Some(&peer)),
    )
    .unwrap();
    let twice = fixate(&input, &FormatSet::single(once.clone())).unwrap();
    assert_eq!(once, twice);
}

/// A 10-byte buffer of 16-bit stereo holds 2 whole samples.
#[test]
fn test_unit_size_and_sample_count() {
    let format = AudioFormat::from_caps(&AudioCaps::int(44100, 2, 16, 16, true)).unwrap();
    assert_eq!(format.unit_size(), 4);
    assert_eq!(format.samples_in(10), 2);
}

// ============================================================================
// Element Flow
// ============================================================================

/// Both directions of a link negotiate the same pair.
#[test]
fn test_element_negotiates_both_directions() {
    let convert = AudioConvert::new();
    let upstream = AudioCaps::float(48000, 2, 32);
    let downstream = AudioCaps::int(48000, 2, 16, 16, true);

    let src = convert.transform_caps(
        Direction::Src,
        &FormatSet::single(upstream.clone()),
        Some(&FormatSet::single(downstream.clone())),
    );
    assert_eq!(
        convert.fixate_caps(Direction::Src, &upstream, &src).unwrap(),
        downstream
    );

    let sink = convert.transform_caps(
        Direction::Sink,
        &FormatSet::single(downstream.clone()),
        Some(&FormatSet::single(upstream.clone())),
    );
    assert_eq!(
        convert.fixate_caps(Direction::Sink, &downstream, &sink).unwrap(),
        upstream
    );
}

/// Caps strings survive printing and parsing.
#[test]
fn test_caps_string_round_trip() {
    let text = "audio/x-raw-int, rate=(int)[ 1, 2147483647 ], channels=(int){ 1, 2 }, \
                endianness=(int){ 1234, 4321 }, width=(int)16, depth=(int)[ 1, 16 ], \
                signed=(boolean){ true, false }";
    let parsed = caps(text);
    assert_eq!(parsed.to_string(), text);
    assert_eq!(caps(&parsed.to_string()), parsed);
}
