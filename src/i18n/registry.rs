//! Track set: the explicit collection of active language tracks.
//!
//! The set is built from the configuration served by the active-languages
//! collaborator and is passed explicitly to the codec, the validator and the
//! editor. Nothing in the crate assumes a fixed number of tracks.

use crate::i18n::language::{normalize_code, Track};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Configuration for a language as served by the active-languages endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    /// Locale code (e.g., "tr", "en")
    pub code: String,

    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether this language is enabled for content
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Whether this is the default language (only one should be true)
    #[serde(default)]
    pub is_default: bool,
}

fn default_true() -> bool {
    true
}

/// Failure building a track set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackSetError {
    /// No active language with a usable code was configured
    #[error("no active languages configured")]
    NoActiveLanguages,
}

/// Ordered set of active tracks with exactly one default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    /// Build a track set from the active-languages configuration.
    ///
    /// Inactive languages and blank codes are dropped, duplicate codes keep
    /// their first occurrence. The first language flagged default becomes the
    /// default track; when none is flagged, the first track is promoted.
    pub fn from_configs(configs: &[LanguageConfig]) -> Result<Self, TrackSetError> {
        let mut tracks: Vec<Track> = Vec::new();
        let mut default_seen = false;

        for config in configs.iter().filter(|c| c.is_active) {
            let code = normalize_code(&config.code);
            if tracks.iter().any(|t| t.code() == code) {
                warn!("Duplicate language code '{}' ignored", code);
                continue;
            }

            let wants_default = config.is_default && !default_seen;
            if config.is_default && default_seen {
                warn!(
                    "Language '{}' is also flagged default, keeping the first one",
                    code
                );
            }

            match Track::new(&code, wants_default) {
                Ok(track) => {
                    default_seen |= wants_default;
                    tracks.push(track);
                }
                Err(e) => warn!("Skipping language entry: {}", e),
            }
        }

        if tracks.is_empty() {
            return Err(TrackSetError::NoActiveLanguages);
        }

        if !default_seen {
            warn!(
                "No default language configured, using '{}'",
                tracks[0].code()
            );
            tracks[0].set_default(true);
        }

        Ok(Self { tracks })
    }

    /// Convenience constructor from codes; the first code is the default.
    pub fn from_codes(codes: &[&str]) -> Result<Self, TrackSetError> {
        let configs: Vec<LanguageConfig> = codes
            .iter()
            .enumerate()
            .map(|(i, code)| LanguageConfig {
                code: code.to_string(),
                name: None,
                is_active: true,
                is_default: i == 0,
            })
            .collect();
        Self::from_configs(&configs)
    }

    /// Iterate over the tracks in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Locale codes in configuration order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.code())
    }

    /// The default track.
    pub fn default_track(&self) -> &Track {
        // from_configs guarantees exactly one default
        self.tracks
            .iter()
            .find(|t| t.is_default())
            .unwrap_or(&self.tracks[0])
    }

    /// Check if a code belongs to the set.
    pub fn contains(&self, code: &str) -> bool {
        self.tracks.iter().any(|t| t.code() == code)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
