//! Size limits applied to every parsed email.

use serde::{Deserialize, Serialize};

/// Marker appended to a body that was cut at [`Limits::max_body_chars`].
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Caps enforced while building a [`ParsedEmail`](super::email::ParsedEmail).
///
/// All lengths are counted in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest input file accepted, in bytes (default: 10 MiB).
    pub max_file_size: u64,
    /// Maximum number of headers kept; later ones are dropped.
    pub max_headers: usize,
    /// Maximum header name length.
    pub max_header_name_chars: usize,
    /// Maximum header value length.
    pub max_header_value_chars: usize,
    /// Maximum body length before the truncation marker is appended.
    pub max_body_chars: usize,
    pub max_subject_chars: usize,
    pub max_from_chars: usize,
    pub max_to_chars: usize,
    pub max_date_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_headers: 1000,
            max_header_name_chars: 500,
            max_header_value_chars: 2000,
            max_body_chars: 1_000_000,
            max_subject_chars: 500,
            max_from_chars: 200,
            max_to_chars: 200,
            max_date_chars: 100,
        }
    }
}

impl Limits {
    /// Each cap lowered to at most its default. Configuration may tighten
    /// the limits but never loosen them.
    pub fn clamped(self) -> Self {
        let max = Self::default();
        Self {
            max_file_size: self.max_file_size.min(max.max_file_size),
            max_headers: self.max_headers.min(max.max_headers),
            max_header_name_chars: self.max_header_name_chars.min(max.max_header_name_chars),
            max_header_value_chars: self.max_header_value_chars.min(max.max_header_value_chars),
            max_body_chars: self.max_body_chars.min(max.max_body_chars),
            max_subject_chars: self.max_subject_chars.min(max.max_subject_chars),
            max_from_chars: self.max_from_chars.min(max.max_from_chars),
            max_to_chars: self.max_to_chars.min(max.max_to_chars),
            max_date_chars: self.max_date_chars.min(max.max_date_chars),
        }
    }
}

/// Return the prefix of `s` holding at most `max` characters.
pub fn cap_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
