//! Tracing integration for structured logging and spans.
//!
//! The converter logs through `tracing` and never installs a subscriber;
//! that is up to the application. Spans group the events of one
//! negotiation step or one buffer.
//!
//! ## Example
//!
//! ```rust
//! use parallax_audioconvert::observability::{Direction, instrument_negotiation};
//!
//! let _guard = instrument_negotiation("audioconvert0", Direction::Src);
//! // negotiation events are recorded inside the span
//! ```

use std::fmt;
use tracing::{Level, Span, span};

/// Which side of the converter a negotiation step is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Input caps are known, output caps are being chosen.
    Src,
    /// Output caps are known, input caps are being chosen.
    Sink,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Src => f.write_str("src"),
            Self::Sink => f.write_str("sink"),
        }
    }
}

/// Create a span for one negotiation step.
#[inline]
pub fn span_negotiation(element: &str, direction: Direction) -> Span {
    span!(Level::DEBUG, "negotiation", element = %element, direction = %direction)
}

/// Create a span for converting one buffer.
#[inline]
pub fn span_transform(element: &str, samples: usize) -> Span {
    span!(Level::TRACE, "transform", element = %element, samples)
}

/// Enter a negotiation span and return the guard.
pub fn instrument_negotiation(element: &str, direction: Direction) -> tracing::span::EnteredSpan {
    span_negotiation(element, direction).entered()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_without_subscriber() {
        let _guard = instrument_negotiation("convert", Direction::Sink);
        let span = span_transform("convert", 128);
        let _entered = span.enter();
        assert_eq!(Direction::Src.to_string(), "src");
    }
}
