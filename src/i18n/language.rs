//! Track type: one language variant of a multilingual field.
//!
//! A `Track` is identified by its locale code (e.g. "tr", "en"). Tracks are
//! never hardcoded; they are built from the active-languages configuration
//! and handed around as part of a [`TrackSet`](crate::i18n::TrackSet).

use anyhow::{bail, Result};
use std::fmt;

/// A validated language track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Track {
    /// Normalized locale code (trimmed, lowercase)
    code: String,

    /// Whether this is the default track of its set
    is_default: bool,
}

impl Track {
    /// Create a track from a locale code.
    ///
    /// # Arguments
    /// * `code` - The locale code (e.g., "tr", "en"); surrounding whitespace is
    ///   ignored and the code is lowercased
    /// * `is_default` - Whether this track is the default one
    ///
    /// # Returns
    /// * `Ok(Track)` if the code is non-empty after normalization
    /// * `Err` otherwise
    pub fn new(code: &str, is_default: bool) -> Result<Track> {
        let code = normalize_code(code);
        if code.is_empty() {
            bail!("Language code must not be empty");
        }

        Ok(Track { code, is_default })
    }

    /// Get the locale code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Check if this is the default track.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub(crate) fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Normalize a locale code the way tracks store it.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}
