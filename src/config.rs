//! Codec configuration.
//!
//! [`BoxLimits`] bounds the key and value lengths accepted by the codec. The
//! defaults are the protocol maxima; a configuration may tighten them but never
//! widen them, because longer frames cannot be represented on the wire.

use crate::ampbox::{MAX_KEY_LENGTH, MAX_VALUE_LENGTH};

/// Key and value length bounds applied when encoding and decoding boxes.
///
/// # Examples
///
/// ```
/// use ampframe::config::BoxLimits;
///
/// let limits = BoxLimits::default().with_max_value_len(1024);
/// assert_eq!(limits.max_key_len(), 255);
/// assert_eq!(limits.max_value_len(), 1024);
///
/// // Values above the protocol maximum are clamped.
/// let limits = BoxLimits::default().with_max_value_len(1_000_000);
/// assert_eq!(limits.max_value_len(), 65_535);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxLimits {
    max_key_len: usize,
    max_value_len: usize,
}

impl BoxLimits {
    /// The limits imposed by the wire format itself.
    pub const PROTOCOL: Self = Self {
        max_key_len: MAX_KEY_LENGTH,
        max_value_len: MAX_VALUE_LENGTH,
    };

    /// Set the longest accepted key, clamped to `1..=255`.
    ///
    /// Keys cannot be empty since a zero-length key frame terminates a box.
    #[must_use]
    pub fn with_max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = len.clamp(1, MAX_KEY_LENGTH);
        self
    }

    /// Set the longest accepted value, clamped to `0..=65535`.
    #[must_use]
    pub fn with_max_value_len(mut self, len: usize) -> Self {
        self.max_value_len = len.min(MAX_VALUE_LENGTH);
        self
    }

    /// Longest accepted key in bytes.
    #[must_use]
    pub fn max_key_len(&self) -> usize { self.max_key_len }

    /// Longest accepted value in bytes.
    #[must_use]
    pub fn max_value_len(&self) -> usize { self.max_value_len }
}

impl Default for BoxLimits {
    fn default() -> Self { Self::PROTOCOL }
}
