//! Localized content support for slider entries.
//!
//! # Architecture
//!
//! - `language`: a single language track
//! - `registry`: the explicit set of active tracks, built from configuration
//! - `codec`: decoding of historical wire shapes into canonical per-track maps
//! - `validator`: per-track completeness rules
//! - `strings`: user-facing messages per interface language
//! - `metrics`: counters for decode degradation and resyncs
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::i18n::{decode, LocalizedMap, TrackSet};
//!
//! let tracks = TrackSet::from_configs(&languages)?;
//! let title: LocalizedMap<String> = decode(&raw_title, &tracks);
//! ```

mod codec;
mod language;
mod metrics;
mod registry;
pub mod strings;
mod validator;

pub use codec::{
    decode, decode_list, encode, encode_list, Button, Localizable, LocalizedMap, Statistic,
};
pub use language::Track;
pub use metrics::{ConsoleMetrics, MetricsReport};
pub use registry::{LanguageConfig, TrackSet, TrackSetError};
pub use strings::UiStrings;
pub use validator::{ErrorScope, SliderValidator, ValidationIssue, ValidationReport};
