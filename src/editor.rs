//! Create/edit workflow for a single slider entry.

use crate::i18n::{SliderValidator, TrackSet, UiStrings, ValidationReport};
use crate::slider::{next_order, Slider, SliderDraft};
use crate::store::{SliderStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Slider content is incomplete ({} problem(s))", .0.error_count())]
    Invalid(ValidationReport),

    #[error("A background image is required")]
    MissingBackgroundImage,

    #[error("A save is already in progress")]
    Busy,

    #[error("No slider is open for editing")]
    NoDraft,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitError {
    /// Display text in the interface language, one line per problem.
    pub fn messages(&self, strings: &UiStrings) -> Vec<String> {
        match self {
            SubmitError::Invalid(report) => report
                .error_messages(strings)
                .into_values()
                .flatten()
                .collect(),
            SubmitError::MissingBackgroundImage => {
                vec![strings.background_image_required.to_string()]
            }
            other => vec![other.to_string()],
        }
    }
}

/// Holds the draft being edited, if any.
///
/// The draft is a local copy: nothing reaches the store until
/// [`submit`](Self::submit) succeeds, and [`cancel`](Self::cancel) drops it.
#[derive(Debug, Default)]
pub struct SliderEditor {
    draft: Option<SliderDraft>,
    loading: bool,
}

impl SliderEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new entry placed after the existing ones.
    pub fn open_new(&mut self, existing: &[Slider], tracks: &TrackSet) -> &mut SliderDraft {
        self.draft
            .insert(SliderDraft::blank(tracks, next_order(existing)))
    }

    pub fn open_existing(&mut self, slider: &Slider) -> &mut SliderDraft {
        self.draft.insert(SliderDraft::from_slider(slider))
    }

    pub fn draft(&self) -> Option<&SliderDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut SliderDraft> {
        self.draft.as_mut()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Discard the draft without touching the store.
    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Validate the draft and persist it.
    ///
    /// On success the draft is closed and the stored entry returned. On any
    /// failure the draft stays open so the user can fix it.
    pub async fn submit<S: SliderStore + ?Sized>(
        &mut self,
        store: &S,
        tracks: &TrackSet,
    ) -> Result<Slider, SubmitError> {
        if self.loading {
            return Err(SubmitError::Busy);
        }
        let draft = self.draft.as_ref().ok_or(SubmitError::NoDraft)?;

        let report = SliderValidator::validate(draft, tracks);
        if !report.is_valid() {
            return Err(SubmitError::Invalid(report));
        }
        if draft.background_image.trim().is_empty() {
            return Err(SubmitError::MissingBackgroundImage);
        }

        let payload = draft.to_payload();
        let loading = LoadingGuard::hold(&mut self.loading);
        let result = match &draft.id {
            Some(id) => store.update_slider(id, &payload).await,
            None => store.create_slider(&payload).await,
        };
        drop(loading);

        match result {
            Ok(wire) => {
                let saved = Slider::from_wire(&wire, tracks);
                info!("Saved slider {}", saved.id);
                self.draft = None;
                Ok(saved)
            }
            Err(e) => {
                warn!("Failed to save slider: {}", e);
                Err(e.into())
            }
        }
    }
}

/// Keeps the loading flag set while a store call is in flight.
///
/// Cleared on drop, so a submit future abandoned mid-call (timeout, teardown)
/// does not leave the editor stuck in `Busy`.
struct LoadingGuard<'a>(&'a mut bool);

impl<'a> LoadingGuard<'a> {
    fn hold(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
