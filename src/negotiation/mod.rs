//! Caps negotiation for the audio converter.
//!
//! Negotiation runs in two steps, one per direction of a link:
//!
//! ```text
//! ┌──────────────┐  expand   ┌───────────────────┐  ∩ peer   ┌────────────┐
//! │ fixed input  │ ────────▶ │ ranked candidates │ ────────▶ │  fixate    │
//! └──────────────┘           └───────────────────┘           └────────────┘
//! ```
//!
//! 1. [`expand`] lists every format reachable from the input, best first:
//!    lossless changes, growth in precision and channels, reduced
//!    precision, fewer channels, and finally any integer width.
//! 2. The host intersects that list with what the peer accepts
//!    ([`transform_caps`] does this with the peer list first).
//! 3. [`fixate`] collapses the first surviving candidate to one concrete
//!    format as close to the input as possible.
//!
//! # Example
//!
//! ```rust
//! use parallax_audioconvert::format::{AudioCaps, CapsValue, FormatSet};
//! use parallax_audioconvert::negotiation::{expand, fixate};
//!
//! let input = AudioCaps::int(44100, 2, 16, 16, true);
//! let candidates = expand(&FormatSet::single(input.clone()));
//!
//! let out = fixate(&input, &candidates).unwrap();
//! assert_eq!(out.width, CapsValue::Fixed(16));
//! ```

mod error;
mod expand;
mod fixate;

pub use error::NegotiationError;
pub use expand::{MAX_NEGOTIABLE_CHANNELS, allows_mixing, expand, expand_structure};
pub use fixate::fixate;

use crate::format::FormatSet;

/// Expand `caps` and optionally restrict the result to `filter`.
///
/// The filter's order wins, so a peer's preference survives the
/// intersection.
pub fn transform_caps(caps: &FormatSet, filter: Option<&FormatSet>) -> FormatSet {
    let expanded = expand(caps);
    match filter {
        Some(filter) => {
            let ret = filter.intersect(&expanded);
            tracing::debug!(caps = %ret, "intersected with filter");
            ret
        }
        None => expanded,
    }
}
