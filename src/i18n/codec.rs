//! Localized field codec.
//!
//! Persisted localized fields arrive in several historical shapes: a JSON
//! object keyed by track code, a string holding such an object, or a flat
//! string written before the content was localized. `decode` collapses all of
//! them into a [`LocalizedMap`] holding exactly one value per active track.
//! `encode` always emits the fully keyed object form, so a decode/encode pass
//! converges any input on the canonical shape.
//!
//! Decoding never fails. Malformed input degrades to zero values (or to the
//! flat legacy interpretation) and is only logged and counted.

use crate::i18n::language::normalize_code;
use crate::i18n::{ConsoleMetrics, TrackSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// A value type that can be stored per track.
pub trait Localizable: Clone + PartialEq + std::fmt::Debug {
    /// The empty value a missing track receives.
    fn zero() -> Self;

    /// Parse the value stored under one track key.
    ///
    /// Returns `None` when the JSON value has a shape this type cannot hold.
    fn from_track_value(value: &Value) -> Option<Self>;

    /// Lift a flat, pre-localization string into a value.
    fn from_legacy(text: &str) -> Self;

    /// Interpret an object without any track keys as a single bare value.
    fn from_bare_object(_object: &Map<String, Value>) -> Option<Self> {
        None
    }

    /// Emit the value for the canonical wire form.
    fn to_value(&self) -> Value;
}

impl Localizable for String {
    fn zero() -> Self {
        String::new()
    }

    fn from_track_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some(String::new()),
            _ => None,
        }
    }

    fn from_legacy(text: &str) -> Self {
        text.to_string()
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

/// Call-to-action button shown on a slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
}

impl Button {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

impl Localizable for Button {
    fn zero() -> Self {
        Button::default()
    }

    fn from_track_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Button {
                text: string_field(object, "text"),
                url: string_field(object, "url"),
            }),
            // Older records stored only the button label per track
            Value::String(text) => Some(Button::new(text.clone(), "")),
            Value::Null => Some(Button::default()),
            _ => None,
        }
    }

    fn from_legacy(text: &str) -> Self {
        Button::new(text, "")
    }

    fn from_bare_object(object: &Map<String, Value>) -> Option<Self> {
        if object.contains_key("text") || object.contains_key("url") {
            Self::from_track_value(&Value::Object(object.clone()))
        } else {
            None
        }
    }

    fn to_value(&self) -> Value {
        serde_json::json!({ "text": self.text, "url": self.url })
    }
}

/// One headline figure shown on a slide (e.g. "25+" / "Years of experience").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl Statistic {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl Localizable for Statistic {
    fn zero() -> Self {
        Statistic::default()
    }

    fn from_track_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Statistic {
                value: string_field(object, "value"),
                label: string_field(object, "label"),
            }),
            Value::String(label) => Some(Statistic::new("", label.clone())),
            Value::Null => Some(Statistic::default()),
            _ => None,
        }
    }

    fn from_legacy(text: &str) -> Self {
        Statistic::new("", text)
    }

    fn from_bare_object(object: &Map<String, Value>) -> Option<Self> {
        if object.contains_key("value") || object.contains_key("label") {
            Self::from_track_value(&Value::Object(object.clone()))
        } else {
            None
        }
    }

    fn to_value(&self) -> Value {
        serde_json::json!({ "value": self.value, "label": self.label })
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(String::from_track_value)
        .unwrap_or_default()
}

/// Canonical per-track values: exactly one entry per track of the set it was
/// built for, kept in the track set's configuration order (default first when
/// it is configured first).
///
/// The encoded JSON object is a `serde_json::Map`, so its key order on the wire
/// is serde_json's (sorted). Only the in-memory iteration order follows the
/// track set.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedMap<T> {
    values: Vec<(String, T)>,
}

impl<T: Localizable> LocalizedMap<T> {
    /// Every track set to the zero value.
    pub fn empty(tracks: &TrackSet) -> Self {
        Self::uniform(tracks, T::zero())
    }

    /// Every track set to the same value.
    pub fn uniform(tracks: &TrackSet, value: T) -> Self {
        Self {
            values: tracks
                .codes()
                .map(|code| (code.to_string(), value.clone()))
                .collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&T> {
        self.values.iter().find(|(c, _)| c == code).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut T> {
        self.values
            .iter_mut()
            .find(|(c, _)| c == code)
            .map(|(_, v)| v)
    }

    /// Replace the value of a known track.
    ///
    /// Returns `false` (and leaves the map untouched) for an unknown track.
    pub fn set(&mut self, code: &str, value: T) -> bool {
        match self.get_mut(code) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Builder-style `set` for tests and fixtures.
    pub fn with(mut self, code: &str, value: T) -> Self {
        self.set(code, value);
        self
    }

    /// Values in track order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.values.iter().map(|(code, value)| (code.as_str(), value))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(code, _)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every track holds the zero value.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|(_, value)| *value == T::zero())
    }
}

/// Decode a raw wire value into canonical per-track form.
///
/// Rules, in priority order:
/// 1. an object keyed by track codes keeps the known keys, missing tracks get
///    the zero value;
/// 2. a string is parsed as JSON and, if it holds an object, handled by rule 1;
/// 3. any other string is a flat legacy value applied to every track;
/// 4. null gives the zero value for every track.
pub fn decode<T: Localizable>(raw: &Value, tracks: &TrackSet) -> LocalizedMap<T> {
    match raw {
        Value::Null => LocalizedMap::empty(tracks),
        Value::Object(object) => decode_object(object, tracks),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => decode_object(&object, tracks),
            _ => decode_legacy(text, tracks),
        },
        other => match T::from_track_value(other) {
            Some(value) => {
                debug!("Scalar localized value {} applied to every track", other);
                ConsoleMetrics::global().record_legacy_fallback();
                LocalizedMap::uniform(tracks, value)
            }
            None => {
                debug!("Unsupported localized value {}, using zero values", other);
                ConsoleMetrics::global().record_degraded_value();
                LocalizedMap::empty(tracks)
            }
        },
    }
}

fn decode_legacy<T: Localizable>(text: &str, tracks: &TrackSet) -> LocalizedMap<T> {
    if !text.is_empty() {
        debug!("Flat legacy value applied to every track");
        ConsoleMetrics::global().record_legacy_fallback();
    }
    LocalizedMap::uniform(tracks, T::from_legacy(text))
}

fn decode_object<T: Localizable>(object: &Map<String, Value>, tracks: &TrackSet) -> LocalizedMap<T> {
    let mut keyed: BTreeMap<String, &Value> = BTreeMap::new();
    for (key, value) in object {
        let code = normalize_code(key);
        if tracks.contains(&code) {
            keyed.entry(code).or_insert(value);
        } else {
            debug!("Dropping value for unknown track '{}'", key);
        }
    }

    if keyed.is_empty() {
        if let Some(value) = T::from_bare_object(object) {
            debug!("Non-localized object applied to every track");
            ConsoleMetrics::global().record_legacy_fallback();
            return LocalizedMap::uniform(tracks, value);
        }
        if !object.is_empty() {
            ConsoleMetrics::global().record_degraded_value();
        }
        return LocalizedMap::empty(tracks);
    }

    let mut map = LocalizedMap::empty(tracks);
    for (code, raw) in keyed {
        let value = T::from_track_value(raw).unwrap_or_else(|| {
            debug!("Malformed value for track '{}', using zero value", code);
            ConsoleMetrics::global().record_degraded_value();
            T::zero()
        });
        map.set(&code, value);
    }
    map
}

/// Decode a list-valued field, element by element.
///
/// A string is parsed as JSON first. Anything that does not yield a list
/// falls back to a single zero-valued element.
pub fn decode_list<T: Localizable>(raw: &Value, tracks: &TrackSet) -> Vec<LocalizedMap<T>> {
    let parsed;
    let items = match raw {
        Value::Array(items) => items,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => {
                parsed = items;
                &parsed
            }
            _ => return default_list(raw, tracks),
        },
        _ => return default_list(raw, tracks),
    };

    items.iter().map(|item| decode(item, tracks)).collect()
}

fn default_list<T: Localizable>(raw: &Value, tracks: &TrackSet) -> Vec<LocalizedMap<T>> {
    if !raw.is_null() {
        debug!("List field is not a list, using a single default element");
        ConsoleMetrics::global().record_degraded_value();
    }
    vec![LocalizedMap::empty(tracks)]
}

/// Encode a canonical map into the fully keyed wire object.
pub fn encode<T: Localizable>(map: &LocalizedMap<T>) -> Value {
    Value::Object(
        map.iter()
            .map(|(code, value)| (code.to_string(), value.to_value()))
            .collect(),
    )
}

/// Encode a list-valued field.
pub fn encode_list<T: Localizable>(items: &[LocalizedMap<T>]) -> Value {
    Value::Array(items.iter().map(encode).collect())
}
