//! Raw audio format descriptors and caps.
//!
//! This module provides the type-safe description of raw audio formats used
//! for negotiation between two stream endpoints.
//!
//! # Design Principles
//!
//! - **Type safety**: Field names are an enum, values are typed per field
//! - **Explicit**: Every field is `Fixed`, a `Range`, a `List`, or `Absent`
//! - **Owned values**: Descriptors are cloned and then mutated, never shared
//!
//! # Caps Negotiation
//!
//! - [`CapsValue<T>`]: A single field constraint
//! - [`AudioCaps`]: One descriptor (kind + field constraints)
//! - [`FormatSet`]: Ordered descriptors, earlier is preferred
//! - [`LayoutConstraint`]: Channel layout, or a choice of layouts
//! - [`AudioFormat`]: A fixed, validated format
//!
//! ```rust
//! use parallax_audioconvert::format::{AudioCaps, AudioFormat};
//!
//! let caps: AudioCaps = "audio/x-raw-int, rate=(int)44100, channels=(int)2, \
//!                        endianness=(int)1234, width=(int)16, depth=(int)16, \
//!                        signed=(boolean)true"
//!     .parse()
//!     .unwrap();
//! let format = AudioFormat::from_caps(&caps).unwrap();
//! assert_eq!(format.unit_size(), 4);
//! ```

mod audio;
mod caps;
mod layout;
mod parser;
mod value;

pub use audio::{AudioFormat, MAX_CHANNELS, unit_size};
pub use caps::{AudioCaps, Endianness, Field, FormatKind, FormatSet, IntField};
pub use layout::{ChannelLayout, ChannelPosition, LayoutConstraint, MAX_DEFAULT_LAYOUT_CHANNELS};
pub use parser::{parse_caps, parse_structure};
pub use value::{CapsScalar, CapsValue};

/// Every raw audio format the converter can handle, most precise first.
pub fn template_caps() -> FormatSet {
    let mut set = FormatSet::new();
    for width in [64, 32] {
        let mut s = AudioCaps::new(FormatKind::Float);
        s.set_range(IntField::Rate, 1, i32::MAX);
        s.set_range(IntField::Channels, 1, i32::MAX);
        s.endianness = CapsValue::from_values([Endianness::Little, Endianness::Big]);
        s.set_values(IntField::Width, [width]);
        set.push(s);
    }
    for width in [32, 24, 16, 8] {
        let mut s = AudioCaps::new(FormatKind::Int);
        s.set_range(IntField::Rate, 1, i32::MAX);
        s.set_range(IntField::Channels, 1, i32::MAX);
        s.endianness = CapsValue::from_values([Endianness::Little, Endianness::Big]);
        s.set_values(IntField::Width, [width]);
        s.set_range(IntField::Depth, 1, width);
        s.signed = CapsValue::from_values([true, false]);
        set.push(s);
    }
    set
}
