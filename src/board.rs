//! Order reconciliation for the slider collection.
//!
//! The collection is a small state machine. User actions are applied to the
//! local state immediately (the optimistic update) by the pure [`reduce`]
//! function, which also returns the writes that have to reach the store.
//! [`SliderBoard`] owns the state and the store handle and runs those writes.
//! Any failed write leads to a full reload of the collection:
//!
//! ```text
//! Idle -> Reordering | Saving -> Idle               (store confirmed)
//!                             -> Resyncing -> Idle  (any write failed)
//! ```
//!
//! Callers only see the aggregate result of an operation, never a
//! half-applied intermediate state.

use crate::i18n::{ConsoleMetrics, TrackSet};
use crate::slider::{decode_collection, Slider, SliderPatch, WireSlider};
use crate::store::{SliderStore, StoreError, StoreResult};
use futures::future::join_all;
use std::collections::VecDeque;
use tracing::{info, warn};

/// What the collection is currently waiting for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// A reorder was applied locally and its order writes are in flight
    Reordering,
    /// A single-entry change (toggle, delete) is in flight
    Saving,
    /// A write failed and the collection is being reloaded
    Resyncing,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    /// Entries in display order
    pub entries: Vec<Slider>,
    pub phase: Phase,
    /// Set when a reload after a failed write also failed; the entries may
    /// not match the store and edits stay blocked until a reload succeeds.
    pub stale: bool,
}

impl BoardState {
    pub fn new(entries: Vec<Slider>) -> Self {
        Self {
            entries: sorted(entries),
            phase: Phase::Idle,
            stale: false,
        }
    }

    fn accepts_edits(&self) -> bool {
        self.phase == Phase::Idle && !self.stale
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Drag gesture: move the entry at `from` to position `to`
    Move { from: usize, to: usize },
    ToggleActive { id: String },
    Remove { id: String },
    /// A created or edited entry came back from the store
    Saved(Slider),
    /// All writes of the pending change succeeded; carries the versions the
    /// store reported back
    Confirmed { versions: Vec<(String, Option<u64>)> },
    /// At least one write of the pending change failed
    Failed,
    /// Authoritative collection read from the store
    Loaded(Vec<Slider>),
    ReloadFailed,
}

/// New order of one entry, as sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: String,
    pub order: i64,
    pub expected_version: Option<u64>,
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PersistOrders(Vec<OrderUpdate>),
    PersistActive {
        id: String,
        is_active: bool,
        expected_version: Option<u64>,
    },
    PersistDelete {
        id: String,
    },
    Reload,
}

/// Apply an action to the collection state.
///
/// Edits arriving while a change is pending, with indices out of range or
/// for unknown ids are ignored: they come from stale or repeated UI events.
pub fn reduce(mut state: BoardState, action: Action) -> (BoardState, Vec<Effect>) {
    match action {
        Action::Move { from, to } => {
            let len = state.entries.len();
            if !state.accepts_edits() || from >= len || to >= len || from == to {
                return (state, Vec::new());
            }

            let moved = state.entries.remove(from);
            state.entries.insert(to, moved);

            let mut updates = Vec::new();
            for (index, entry) in state.entries.iter_mut().enumerate() {
                let order = index as i64 + 1;
                if entry.order != order {
                    entry.order = order;
                    updates.push(OrderUpdate {
                        id: entry.id.clone(),
                        order,
                        expected_version: entry.version,
                    });
                }
            }

            if updates.is_empty() {
                return (state, Vec::new());
            }
            state.phase = Phase::Reordering;
            (state, vec![Effect::PersistOrders(updates)])
        }
        Action::ToggleActive { id } => {
            if !state.accepts_edits() {
                return (state, Vec::new());
            }
            let Some(index) = state.position(&id) else {
                return (state, Vec::new());
            };

            let entry = &mut state.entries[index];
            entry.is_active = !entry.is_active;
            let effect = Effect::PersistActive {
                id,
                is_active: entry.is_active,
                expected_version: entry.version,
            };
            state.phase = Phase::Saving;
            (state, vec![effect])
        }
        Action::Remove { id } => {
            if !state.accepts_edits() {
                return (state, Vec::new());
            }
            let Some(index) = state.position(&id) else {
                return (state, Vec::new());
            };

            // Remaining orders are left as they are
            state.entries.remove(index);
            state.phase = Phase::Saving;
            (state, vec![Effect::PersistDelete { id }])
        }
        Action::Saved(slider) => {
            match state.position(&slider.id) {
                Some(index) => state.entries[index] = slider,
                None => state.entries.push(slider),
            }
            state.entries = sorted(std::mem::take(&mut state.entries));
            (state, Vec::new())
        }
        Action::Confirmed { versions } => {
            for (id, version) in versions {
                if let (Some(index), Some(_)) = (state.position(&id), version) {
                    state.entries[index].version = version;
                }
            }
            state.phase = Phase::Idle;
            (state, Vec::new())
        }
        Action::Failed => {
            state.phase = Phase::Resyncing;
            (state, vec![Effect::Reload])
        }
        Action::Loaded(entries) => (BoardState::new(entries), Vec::new()),
        Action::ReloadFailed => {
            state.phase = Phase::Idle;
            state.stale = true;
            (state, Vec::new())
        }
    }
}

fn sorted(mut entries: Vec<Slider>) -> Vec<Slider> {
    entries.sort_by_key(|e| e.order);
    entries
}

/// One write of a change that the store did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub id: String,
    pub error: String,
    /// The store reported a version conflict
    pub conflict: bool,
}

impl WriteFailure {
    fn new(id: &str, error: &StoreError) -> Self {
        Self {
            id: id.to_string(),
            error: error.to_string(),
            conflict: error.is_conflict(),
        }
    }
}

/// Aggregate result of a batch of concurrent order writes.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    AllOk(Vec<WireSlider>),
    PartialFailure {
        written: Vec<WireSlider>,
        failures: Vec<WriteFailure>,
    },
}

/// Result of a collection operation as seen by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// Nothing to do (stale event, pending change, unknown entry)
    Unchanged,
    /// The optimistic change was confirmed by the store
    Applied,
    /// A write failed; the collection was reloaded from the store
    Resynced { failures: Vec<WriteFailure> },
}

/// Issue every order write at once and wait for all of them.
pub async fn persist_orders<S: SliderStore + ?Sized>(
    store: &S,
    updates: &[OrderUpdate],
) -> BatchOutcome {
    let results = join_all(updates.iter().map(|update| async move {
        let patch = SliderPatch::order(update.order).with_expected_version(update.expected_version);
        (update, store.patch_slider(&update.id, &patch).await)
    }))
    .await;

    let mut written = Vec::new();
    let mut failures = Vec::new();
    for (update, result) in results {
        match result {
            Ok(wire) => written.push(wire),
            Err(e) => failures.push(WriteFailure::new(&update.id, &e)),
        }
    }

    if failures.is_empty() {
        BatchOutcome::AllOk(written)
    } else {
        BatchOutcome::PartialFailure { written, failures }
    }
}

/// The slider collection bound to its store.
pub struct SliderBoard<S> {
    store: S,
    tracks: TrackSet,
    state: BoardState,
}

impl<S: SliderStore> SliderBoard<S> {
    /// An empty board; call [`refresh`](Self::refresh) to load entries.
    pub fn new(store: S, tracks: TrackSet) -> Self {
        Self {
            store,
            tracks,
            state: BoardState::default(),
        }
    }

    /// Create a board and load the collection.
    pub async fn load(store: S, tracks: TrackSet) -> StoreResult<Self> {
        let mut board = Self::new(store, tracks);
        board.refresh().await?;
        Ok(board)
    }

    pub fn entries(&self) -> &[Slider] {
        &self.state.entries
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: &str) -> Option<&Slider> {
        self.state.entries.iter().find(|e| e.id == id)
    }

    /// Replace the track set (languages changed) and reload.
    pub async fn set_tracks(&mut self, tracks: TrackSet) -> StoreResult<()> {
        self.tracks = tracks;
        self.refresh().await
    }

    /// Replace the local collection with the store's.
    pub async fn refresh(&mut self) -> StoreResult<()> {
        match self.fetch_entries().await {
            Ok(entries) => {
                info!("Loaded {} sliders", entries.len());
                self.apply(Action::Loaded(entries));
                Ok(())
            }
            Err(e) => {
                self.apply(Action::ReloadFailed);
                Err(e)
            }
        }
    }

    /// Move the entry at `from` to `to` and persist the new orders.
    pub async fn move_entry(&mut self, from: usize, to: usize) -> StoreResult<OperationOutcome> {
        self.dispatch(Action::Move { from, to }).await
    }

    pub async fn toggle_active(&mut self, id: &str) -> StoreResult<OperationOutcome> {
        self.dispatch(Action::ToggleActive { id: id.to_string() })
            .await
    }

    /// Delete an entry. Remaining entries keep their orders.
    pub async fn remove(&mut self, id: &str) -> StoreResult<OperationOutcome> {
        self.dispatch(Action::Remove { id: id.to_string() }).await
    }

    /// Merge an entry the editor saved into the collection.
    pub fn record_saved(&mut self, slider: Slider) {
        self.apply(Action::Saved(slider));
    }

    /// Replace an unconfirmed optimistic state with the store's collection.
    async fn recover_abandoned(&mut self) -> StoreResult<()> {
        warn!(
            "Previous change was abandoned while {:?}, reloading sliders",
            self.state.phase
        );
        ConsoleMetrics::global().record_resync();
        self.refresh().await
    }

    fn apply(&mut self, action: Action) -> Vec<Effect> {
        let (next, effects) = reduce(std::mem::take(&mut self.state), action);
        self.state = next;
        effects
    }

    async fn fetch_entries(&self) -> StoreResult<Vec<Slider>> {
        let wires = self.store.list_sliders().await?;
        Ok(decode_collection(&wires, &self.tracks))
    }

    /// Run an action and every effect it leads to.
    async fn dispatch(&mut self, action: Action) -> StoreResult<OperationOutcome> {
        // `&mut self` rules out a dispatch still running, so a pending phase
        // means the previous operation was dropped before the store answered.
        if self.state.phase != Phase::Idle {
            self.recover_abandoned().await?;
        }

        let mut queue: VecDeque<Effect> = self.apply(action).into();
        if queue.is_empty() {
            return Ok(OperationOutcome::Unchanged);
        }

        let mut failures: Vec<WriteFailure> = Vec::new();
        while let Some(effect) = queue.pop_front() {
            let follow_up = match effect {
                Effect::Reload => {
                    ConsoleMetrics::global().record_resync();
                    warn!("Reloading sliders after {} failed write(s)", failures.len());
                    match self.fetch_entries().await {
                        Ok(entries) => self.apply(Action::Loaded(entries)),
                        Err(e) => {
                            warn!("Reload after failed write also failed: {}", e);
                            self.apply(Action::ReloadFailed);
                            return Err(e);
                        }
                    }
                }
                write => match self.perform(write).await {
                    Ok(written) => {
                        let versions = written.into_iter().map(|w| (w.id, w.version)).collect();
                        self.apply(Action::Confirmed { versions })
                    }
                    Err(failed) => {
                        for failure in &failed {
                            ConsoleMetrics::global().record_persistence_failure();
                            warn!("Write for slider {} failed: {}", failure.id, failure.error);
                        }
                        failures.extend(failed);
                        self.apply(Action::Failed)
                    }
                },
            };
            queue.extend(follow_up);
        }

        if failures.is_empty() {
            Ok(OperationOutcome::Applied)
        } else {
            Ok(OperationOutcome::Resynced { failures })
        }
    }

    async fn perform(&self, effect: Effect) -> Result<Vec<WireSlider>, Vec<WriteFailure>> {
        match effect {
            Effect::PersistOrders(updates) => {
                info!("Saving new order for {} sliders", updates.len());
                match persist_orders(&self.store, &updates).await {
                    BatchOutcome::AllOk(written) => Ok(written),
                    BatchOutcome::PartialFailure { written, failures } => {
                        warn!(
                            "Order save incomplete: {} written, {} failed",
                            written.len(),
                            failures.len()
                        );
                        Err(failures)
                    }
                }
            }
            Effect::PersistActive {
                id,
                is_active,
                expected_version,
            } => {
                let patch = SliderPatch::active(is_active).with_expected_version(expected_version);
                self.store
                    .patch_slider(&id, &patch)
                    .await
                    .map(|wire| vec![wire])
                    .map_err(|e| vec![WriteFailure::new(&id, &e)])
            }
            Effect::PersistDelete { id } => self
                .store
                .delete_slider(&id)
                .await
                .map(|_| Vec::new())
                .map_err(|e| vec![WriteFailure::new(&id, &e)]),
            Effect::Reload => Ok(Vec::new()),
        }
    }
}
