//! Buffer metadata types.

/// Flags indicating buffer properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFlags {
    /// Buffer is a gap: its contents should be treated as silence.
    pub gap: bool,
    /// The input buffer may be reused as scratch space.
    pub writable: bool,
}

impl BufferFlags {
    /// Flags for a gap buffer.
    pub fn gap() -> Self {
        Self {
            gap: true,
            ..Self::default()
        }
    }

    /// Set the gap flag.
    pub fn set_gap(&mut self, value: bool) {
        self.gap = value;
    }

    /// Check if gap flag is set.
    pub fn is_gap(&self) -> bool {
        self.gap
    }

    /// Set the writable flag.
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }
}
