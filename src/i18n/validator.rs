//! Per-language completeness validation for slider content.
//!
//! A track is validated only when it carries content (title, description,
//! primary button text or badge). Tracks without content are skipped, so a
//! partially translated slide is publishable. When no track carries content
//! at all, the report holds a single general error and nothing else.

use crate::i18n::strings::{with_language, UiStrings};
use crate::i18n::{Button, LocalizedMap, TrackSet};
use crate::slider::{SliderContent, SliderDraft};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Where an issue applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorScope {
    General,
    Track(String),
}

impl ErrorScope {
    /// Key used when issues are rendered for display ("general" or the code).
    pub fn key(&self) -> &str {
        match self {
            ErrorScope::General => "general",
            ErrorScope::Track(code) => code,
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    NoContent,
    TitleRequired,
    DescriptionRequired,
    PrimaryButtonTextRequired,
    PrimaryButtonUrlRequired,
    SecondaryButtonUrlMissing,
    ButtonUrlSuspicious,
}

impl ValidationIssue {
    /// Render the issue for a track (ignored for general issues).
    pub fn message(&self, code: &str, strings: &UiStrings) -> String {
        let template = match self {
            ValidationIssue::NoContent => strings.no_content,
            ValidationIssue::TitleRequired => strings.title_required,
            ValidationIssue::DescriptionRequired => strings.description_required,
            ValidationIssue::PrimaryButtonTextRequired => strings.primary_button_text_required,
            ValidationIssue::PrimaryButtonUrlRequired => strings.primary_button_url_required,
            ValidationIssue::SecondaryButtonUrlMissing => strings.secondary_button_url_missing,
            ValidationIssue::ButtonUrlSuspicious => strings.button_url_suspicious,
        };
        with_language(template, code)
    }
}

/// Validation report with errors and warnings per scope.
///
/// `errors` holds a (possibly empty) list for the general scope and for every
/// track that was checked against. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub errors: BTreeMap<ErrorScope, Vec<ValidationIssue>>,
    pub warnings: BTreeMap<ErrorScope, Vec<ValidationIssue>>,
}

impl ValidationReport {
    fn for_tracks(tracks: &TrackSet) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(ErrorScope::General, Vec::new());
        for code in tracks.codes() {
            errors.insert(ErrorScope::Track(code.to_string()), Vec::new());
        }
        Self {
            errors,
            warnings: BTreeMap::new(),
        }
    }

    /// True when no scope holds an error.
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    pub fn general_errors(&self) -> &[ValidationIssue] {
        self.errors
            .get(&ErrorScope::General)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn track_errors(&self, code: &str) -> &[ValidationIssue] {
        self.errors
            .get(&ErrorScope::Track(code.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn track_warnings(&self, code: &str) -> &[ValidationIssue] {
        self.warnings
            .get(&ErrorScope::Track(code.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings.values().any(|w| !w.is_empty())
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Render every error as display text, keyed by "general" or track code.
    pub fn error_messages(&self, strings: &UiStrings) -> BTreeMap<String, Vec<String>> {
        render(&self.errors, strings)
    }

    pub fn warning_messages(&self, strings: &UiStrings) -> BTreeMap<String, Vec<String>> {
        render(&self.warnings, strings)
    }

    fn error(&mut self, scope: ErrorScope, issue: ValidationIssue) {
        self.errors.entry(scope).or_default().push(issue);
    }

    fn warning(&mut self, scope: ErrorScope, issue: ValidationIssue) {
        self.warnings.entry(scope).or_default().push(issue);
    }
}

fn render(
    issues: &BTreeMap<ErrorScope, Vec<ValidationIssue>>,
    strings: &UiStrings,
) -> BTreeMap<String, Vec<String>> {
    issues
        .iter()
        .map(|(scope, list)| {
            let key = scope.key().to_string();
            let messages = list.iter().map(|i| i.message(&key, strings)).collect();
            (key, messages)
        })
        .collect()
}

/// Validator for slider completeness.
pub struct SliderValidator;

static LINK_REGEX: OnceLock<Regex> = OnceLock::new();

impl SliderValidator {
    /// Validate a draft against the active tracks.
    pub fn validate(draft: &SliderDraft, tracks: &TrackSet) -> ValidationReport {
        Self::validate_content(&draft.content, tracks)
    }

    /// Validate slider content against the active tracks.
    ///
    /// Rules for every track that has content:
    /// - title, description and primary button text are required
    /// - a primary button with text needs a url (a url alone is not content)
    ///
    /// Every failing track is reported; validation does not stop early.
    pub fn validate_content(content: &SliderContent, tracks: &TrackSet) -> ValidationReport {
        let mut report = ValidationReport::for_tracks(tracks);

        let with_content: Vec<&str> = tracks
            .codes()
            .filter(|code| Self::has_content(content, code))
            .collect();

        if with_content.is_empty() {
            report.error(ErrorScope::General, ValidationIssue::NoContent);
            return report;
        }

        for code in with_content {
            let scope = ErrorScope::Track(code.to_string());

            if is_blank(&content.title, code) {
                report.error(scope.clone(), ValidationIssue::TitleRequired);
            }
            if is_blank(&content.description, code) {
                report.error(scope.clone(), ValidationIssue::DescriptionRequired);
            }

            let primary = button(&content.primary_button, code);
            if primary.text.trim().is_empty() {
                report.error(scope.clone(), ValidationIssue::PrimaryButtonTextRequired);
            } else if primary.url.trim().is_empty() {
                report.error(scope.clone(), ValidationIssue::PrimaryButtonUrlRequired);
            }

            let secondary = button(&content.secondary_button, code);
            if !secondary.text.trim().is_empty() && secondary.url.trim().is_empty() {
                report.warning(scope.clone(), ValidationIssue::SecondaryButtonUrlMissing);
            }

            if [primary.url.trim(), secondary.url.trim()]
                .iter()
                .any(|url| !url.is_empty() && !Self::looks_like_link(url))
            {
                report.warning(scope, ValidationIssue::ButtonUrlSuspicious);
            }
        }

        report
    }

    /// Whether a track carries any content of its own.
    pub fn has_content(content: &SliderContent, code: &str) -> bool {
        !is_blank(&content.title, code)
            || !is_blank(&content.description, code)
            || !button(&content.primary_button, code).text.trim().is_empty()
            || !is_blank(&content.badge, code)
    }

    /// Absolute http(s) links, site-relative paths, anchors, mailto and tel.
    fn looks_like_link(url: &str) -> bool {
        let regex = LINK_REGEX.get_or_init(|| {
            Regex::new(r"^(?:https?://[^\s/]+[^\s]*|/[^\s]*|#[^\s]*|mailto:[^\s]+|tel:[^\s]+)$")
                .unwrap()
        });
        regex.is_match(url)
    }
}

fn is_blank(map: &LocalizedMap<String>, code: &str) -> bool {
    map.get(code).map_or(true, |value| value.trim().is_empty())
}

fn button<'a>(map: &'a LocalizedMap<Button>, code: &str) -> &'a Button {
    static EMPTY: Button = Button {
        text: String::new(),
        url: String::new(),
    };
    map.get(code).unwrap_or(&EMPTY)
}
