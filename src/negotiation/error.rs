//! Negotiation error types.

use crate::format::Field;
use thiserror::Error;

/// Error during caps negotiation.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Intersecting the expanded caps with the peer left nothing.
    #[error("No common format:\n  {explanation}")]
    Exhausted {
        /// Detailed explanation.
        explanation: String,
    },

    /// A field could not be collapsed to a single value.
    #[error("Cannot fixate field {field}: {reason}")]
    CannotFixate {
        /// Field that still has freedom.
        field: Field,
        /// Reason for failure.
        reason: String,
    },

    /// The conversion engine rejected the negotiated format pair.
    #[error("No converter from {from_format} to {to_format}")]
    NoConverter {
        /// Source format description.
        from_format: String,
        /// Target format description.
        to_format: String,
    },
}

impl NegotiationError {
    /// Create an "exhausted" error describing both sides.
    pub fn exhausted(ours: &str, peer: &str) -> Self {
        Self::Exhausted {
            explanation: format!(
                "We can produce: {}\nPeer accepts: {}\n\
                 Suggestion: Insert a resampler or relax the peer caps",
                ours, peer
            ),
        }
    }

    /// Create a "cannot fixate" error.
    pub fn cannot_fixate(field: Field, reason: impl Into<String>) -> Self {
        Self::CannotFixate {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_mentions_both_sides() {
        let err = NegotiationError::exhausted("audio/x-raw-int", "audio/x-raw-float");
        let msg = err.to_string();
        assert!(msg.contains("We can produce: audio/x-raw-int"));
        assert!(msg.contains("Peer accepts: audio/x-raw-float"));
    }

    #[test]
    fn test_cannot_fixate_names_field() {
        let err = NegotiationError::cannot_fixate(Field::Depth, "no value");
        assert_eq!(err.to_string(), "Cannot fixate field depth: no value");
    }
}
