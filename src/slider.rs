use crate::i18n::{
    decode, decode_list, encode, encode_list, Button, LocalizedMap, Statistic, TrackSet, UiStrings,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// A slide shows at most this many statistics.
pub const MAX_STATISTICS: usize = 4;

/// Slider record exactly as the store returns it.
///
/// Localized fields are kept as raw JSON: they may be track-keyed objects,
/// strings holding such objects, or flat legacy strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSlider {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub subtitle: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub badge: Value,
    #[serde(default)]
    pub primary_button: Value,
    #[serde(default)]
    pub secondary_button: Value,
    #[serde(default)]
    pub statistics: Value,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Ids come back as numbers from some store versions and as strings from others
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// The localized content of one slide, in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderContent {
    pub title: LocalizedMap<String>,
    pub subtitle: LocalizedMap<String>,
    pub description: LocalizedMap<String>,
    pub badge: LocalizedMap<String>,
    pub primary_button: LocalizedMap<Button>,
    pub secondary_button: LocalizedMap<Button>,
    pub statistics: Vec<LocalizedMap<Statistic>>,
}

impl SliderContent {
    /// Content with every field empty for every track.
    pub fn blank(tracks: &TrackSet) -> Self {
        Self {
            title: LocalizedMap::empty(tracks),
            subtitle: LocalizedMap::empty(tracks),
            description: LocalizedMap::empty(tracks),
            badge: LocalizedMap::empty(tracks),
            primary_button: LocalizedMap::empty(tracks),
            secondary_button: LocalizedMap::empty(tracks),
            statistics: Vec::new(),
        }
    }

    fn from_wire(wire: &WireSlider, tracks: &TrackSet) -> Self {
        let mut statistics = decode_list(&wire.statistics, tracks);
        if statistics.len() > MAX_STATISTICS {
            debug!(
                "Slider {} has {} statistics, keeping the first {}",
                wire.id,
                statistics.len(),
                MAX_STATISTICS
            );
            statistics.truncate(MAX_STATISTICS);
        }

        Self {
            title: decode(&wire.title, tracks),
            subtitle: decode(&wire.subtitle, tracks),
            description: decode(&wire.description, tracks),
            badge: decode(&wire.badge, tracks),
            primary_button: decode(&wire.primary_button, tracks),
            secondary_button: decode(&wire.secondary_button, tracks),
            statistics,
        }
    }
}

/// A decoded slider entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub id: String,
    pub order: i64,
    pub is_active: bool,
    /// Store-assigned revision, sent back as `expectedVersion` on writes
    pub version: Option<u64>,
    pub content: SliderContent,
    pub background_image: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Slider {
    /// Decode a stored record against the current track set.
    pub fn from_wire(wire: &WireSlider, tracks: &TrackSet) -> Self {
        Self {
            id: wire.id.clone(),
            order: wire.order,
            is_active: wire.is_active,
            version: wire.version,
            content: SliderContent::from_wire(wire, tracks),
            background_image: wire.background_image.clone().unwrap_or_default(),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

/// Decode a whole collection and sort it by order.
///
/// The sort is stable, so entries sharing an order keep the store's sequence.
pub fn decode_collection(wires: &[WireSlider], tracks: &TrackSet) -> Vec<Slider> {
    let mut sliders: Vec<Slider> = wires.iter().map(|w| Slider::from_wire(w, tracks)).collect();
    sliders.sort_by_key(|s| s.order);
    sliders
}

/// Default order for a new entry: one past the highest existing order.
pub fn next_order(sliders: &[Slider]) -> i64 {
    sliders.iter().map(|s| s.order).max().map_or(1, |max| max + 1)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("a slide can show at most {max} statistics")]
    StatisticsLimit { max: usize },
}

impl DraftError {
    /// Display text in the interface language.
    pub fn message(&self, strings: &UiStrings) -> String {
        match self {
            DraftError::StatisticsLimit { .. } => strings.statistics_limit.to_string(),
        }
    }
}

/// Client-local editable copy of a slider; discarded on cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderDraft {
    /// `None` for an entry that has not been created yet
    pub id: Option<String>,
    pub order: i64,
    pub is_active: bool,
    pub version: Option<u64>,
    pub content: SliderContent,
    pub background_image: String,
}

impl SliderDraft {
    /// Draft for a new entry.
    pub fn blank(tracks: &TrackSet, order: i64) -> Self {
        Self {
            id: None,
            order,
            is_active: true,
            version: None,
            content: SliderContent::blank(tracks),
            background_image: String::new(),
        }
    }

    /// Draft for editing an existing entry.
    pub fn from_slider(slider: &Slider) -> Self {
        Self {
            id: Some(slider.id.clone()),
            order: slider.order,
            is_active: slider.is_active,
            version: slider.version,
            content: slider.content.clone(),
            background_image: slider.background_image.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Append an empty statistic row and return its index.
    pub fn add_statistic(&mut self, tracks: &TrackSet) -> Result<usize, DraftError> {
        if self.content.statistics.len() >= MAX_STATISTICS {
            return Err(DraftError::StatisticsLimit {
                max: MAX_STATISTICS,
            });
        }
        self.content.statistics.push(LocalizedMap::empty(tracks));
        Ok(self.content.statistics.len() - 1)
    }

    pub fn remove_statistic(&mut self, index: usize) -> Option<LocalizedMap<Statistic>> {
        if index < self.content.statistics.len() {
            Some(self.content.statistics.remove(index))
        } else {
            None
        }
    }

    /// Encode the draft for a create or full update.
    ///
    /// Statistic rows left entirely blank are not persisted.
    pub fn to_payload(&self) -> SliderPayload {
        let statistics: Vec<LocalizedMap<Statistic>> = self
            .content
            .statistics
            .iter()
            .filter(|s| !s.is_zero())
            .cloned()
            .collect();

        SliderPayload {
            title: encode(&self.content.title),
            subtitle: encode(&self.content.subtitle),
            description: encode(&self.content.description),
            badge: encode(&self.content.badge),
            primary_button: encode(&self.content.primary_button),
            secondary_button: encode(&self.content.secondary_button),
            statistics: encode_list(&statistics),
            background_image: self.background_image.trim().to_string(),
            is_active: self.is_active,
            order: self.order,
            expected_version: self.version,
        }
    }
}

/// Body of a create or full-replace request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderPayload {
    pub title: Value,
    pub subtitle: Value,
    pub description: Value,
    pub badge: Value,
    pub primary_button: Value,
    pub secondary_button: Value,
    pub statistics: Value,
    pub background_image: String,
    pub is_active: bool,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// Body of a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

impl SliderPatch {
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    pub fn with_expected_version(mut self, version: Option<u64>) -> Self {
        self.expected_version = version;
        self
    }
}
