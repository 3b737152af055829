//! Hero slider administration: localized content decoding, per-language
//! completeness validation and order reconciliation against the slider store.

pub mod board;
pub mod config;
pub mod editor;
pub mod i18n;
pub mod retry;
pub mod slider;
pub mod store;
