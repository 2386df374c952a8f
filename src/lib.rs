//! # Parallax Audioconvert
//!
//! Caps negotiation and sample conversion for raw audio.
//!
//! Given the format an upstream produces, the converter lists every format
//! it can turn that into, ranked from lossless to lossy, then picks the one
//! closest to the input among those a downstream accepts.
//!
//! ## Features
//!
//! - **Typed caps**: integer and float descriptors with fixed, range, list
//!   and absent field values, plus channel-layout constraints
//! - **Ranked expansion**: lossless changes first, dropping channels last
//! - **Nearest fixation**: rate, width, depth, byte order and signedness
//!   stay as close to the input as allowed
//! - **Caps strings**: parse and print `audio/x-raw-int, rate=(int)44100, ...`
//! - **Pluggable engines**: sample conversion behind [`converters::SampleConverter`]
//!
//! ## Quick Start
//!
//! ```rust
//! use parallax_audioconvert::prelude::*;
//!
//! let input: AudioCaps = "audio/x-raw-int, rate=(int)48000, channels=(int)2, \
//!                         endianness=(int)1234, width=(int)16, depth=(int)16, \
//!                         signed=(boolean)true"
//!     .parse()?;
//! let peer: FormatSet = "audio/x-raw-float, width=(int)32".parse()?;
//!
//! let candidates = transform_caps(&FormatSet::single(input.clone()), Some(&peer));
//! let output = fixate(&input, &candidates)?;
//! assert_eq!(output.to_string(),
//!     "audio/x-raw-float, rate=(int)48000, channels=(int)2, endianness=(int)1234, width=(int)32");
//! # Ok::<(), parallax_audioconvert::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod converters;
pub mod element;
pub mod error;
pub mod format;
pub mod metadata;
pub mod negotiation;
pub mod observability;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ConvertConfig;
    pub use crate::converters::{BasicConverter, DitherMode, NoiseShaping, SampleConverter};
    pub use crate::element::AudioConvert;
    pub use crate::error::{Error, Result};
    pub use crate::format::{AudioCaps, AudioFormat, CapsValue, FormatKind, FormatSet};
    pub use crate::metadata::BufferFlags;
    pub use crate::negotiation::{NegotiationError, expand, fixate, transform_caps};
}

pub use error::{Error, Result};
