//! Order reconciliation tests against an in-memory store.

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{json, Value};
use slider_admin::board::{OperationOutcome, Phase, SliderBoard};
use slider_admin::editor::SliderEditor;
use slider_admin::i18n::{Button, LanguageConfig, TrackSet};
use slider_admin::slider::{SliderPatch, SliderPayload, WireSlider};
use slider_admin::store::{SliderStore, StoreError, StoreResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==================== Test Helpers ====================

/// Versioned in-memory store with failure injection.
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<WireSlider>>,
    /// Patches for these ids fail with a server error
    failing_patches: Mutex<HashSet<String>>,
    fail_reads: Mutex<bool>,
    /// Patches never answer while set
    stall_patches: AtomicBool,
    patch_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    fn with_entries(count: usize) -> Self {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().unwrap();
            for i in 1..=count {
                rows.push(wire(&i.to_string(), i as i64));
            }
        }
        store
    }

    fn fail_patch_for(&self, id: &str) {
        self.failing_patches.lock().unwrap().insert(id.to_string());
    }

    fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    /// Bump an entry's version behind the board's back.
    fn touch(&self, id: &str) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.version = row.version.map(|v| v + 1);
        }
    }

    fn stored_orders(&self) -> Vec<(String, i64)> {
        let mut rows: Vec<(String, i64)> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.id.clone(), r.order))
            .collect();
        rows.sort_by_key(|(_, order)| *order);
        rows
    }
}

fn wire(id: &str, order: i64) -> WireSlider {
    WireSlider {
        id: id.to_string(),
        order,
        is_active: true,
        version: Some(1),
        title: json!({ "tr": format!("Slayt {}", id), "en": format!("Slide {}", id) }),
        subtitle: Value::Null,
        description: json!("Legacy text"),
        badge: Value::Null,
        primary_button: Value::Null,
        secondary_button: Value::Null,
        statistics: Value::Null,
        background_image: Some(format!("/img/{}.jpg", id)),
        created_at: None,
        updated_at: None,
    }
}

fn server_error() -> StoreError {
    StoreError::Api {
        status: 500,
        code: None,
        message: "write failed".to_string(),
    }
}

#[async_trait]
impl SliderStore for MemoryStore {
    async fn list_sliders(&self) -> StoreResult<Vec<WireSlider>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_reads.lock().unwrap() {
            return Err(server_error());
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn create_slider(&self, payload: &SliderPayload) -> StoreResult<WireSlider> {
        let mut rows = self.rows.lock().unwrap();
        let mut row = wire(&(rows.len() + 100).to_string(), payload.order);
        row.title = payload.title.clone();
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_slider(&self, id: &str, _payload: &SliderPayload) -> StoreResult<WireSlider> {
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn patch_slider(&self, id: &str, patch: &SliderPatch) -> StoreResult<WireSlider> {
        self.patch_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_patches.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing_patches.lock().unwrap().contains(id) {
            return Err(server_error());
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if patch.expected_version.is_some() && patch.expected_version != row.version {
            return Err(StoreError::Conflict(format!("slider {}", id)));
        }
        if let Some(order) = patch.order {
            row.order = order;
        }
        if let Some(is_active) = patch.is_active {
            row.is_active = is_active;
        }
        row.version = row.version.map(|v| v + 1);
        Ok(row.clone())
    }

    async fn delete_slider(&self, id: &str) -> StoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_languages(&self) -> StoreResult<Vec<LanguageConfig>> {
        Ok(vec![])
    }
}

fn tracks() -> TrackSet {
    TrackSet::from_codes(&["tr", "en"]).unwrap()
}

fn ids<S: SliderStore>(board: &SliderBoard<S>) -> Vec<&str> {
    board.entries().iter().map(|e| e.id.as_str()).collect()
}

fn orders<S: SliderStore>(board: &SliderBoard<S>) -> Vec<i64> {
    board.entries().iter().map(|e| e.order).collect()
}

// ==================== Move Tests ====================

#[tokio::test]
async fn test_move_last_to_first_persists_all_orders() {
    let store = Arc::new(MemoryStore::with_entries(4));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();

    let outcome = board.move_entry(3, 0).await.unwrap();

    assert_eq!(outcome, OperationOutcome::Applied);
    assert_eq!(ids(&board), vec!["4", "1", "2", "3"]);
    assert_eq!(orders(&board), vec![1, 2, 3, 4]);
    assert_eq!(store.patch_calls.load(Ordering::SeqCst), 4);
    assert_eq!(
        store.stored_orders(),
        vec![
            ("4".to_string(), 1),
            ("1".to_string(), 2),
            ("2".to_string(), 3),
            ("3".to_string(), 4)
        ]
    );
    // Versions reported by the store are picked up for the next write
    assert!(board.entries().iter().all(|e| e.version == Some(2)));
    assert_eq!(board.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_noop_move_writes_nothing() {
    let store = Arc::new(MemoryStore::with_entries(3));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();

    assert_eq!(board.move_entry(1, 1).await.unwrap(), OperationOutcome::Unchanged);
    assert_eq!(board.move_entry(0, 9).await.unwrap(), OperationOutcome::Unchanged);
    assert_eq!(store.patch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_partial_failure_resyncs_to_store_state() {
    let store = Arc::new(MemoryStore::with_entries(4));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();
    store.fail_patch_for("2");

    let outcome = board.move_entry(3, 0).await.unwrap();

    let OperationOutcome::Resynced { failures } = outcome else {
        panic!("expected a resync");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "2");
    assert!(!failures[0].conflict);

    // The board shows exactly what the store holds, not the optimistic order
    let stored: Vec<(String, i64)> = store.stored_orders();
    let shown: Vec<(String, i64)> = board
        .entries()
        .iter()
        .map(|e| (e.id.clone(), e.order))
        .collect();
    assert_eq!(shown, stored);
    assert_eq!(board.state().phase, Phase::Idle);
    assert!(!board.state().stale);
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_version_conflict_resyncs() {
    let store = Arc::new(MemoryStore::with_entries(3));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();
    store.touch("3");

    let outcome = board.move_entry(2, 0).await.unwrap();

    let OperationOutcome::Resynced { failures } = outcome else {
        panic!("expected a resync");
    };
    assert!(failures.iter().any(|f| f.id == "3" && f.conflict));
    let reloaded = board.get("3").unwrap();
    assert_eq!(reloaded.version, Some(2));
}

#[tokio::test]
async fn test_failed_reload_marks_board_stale() {
    let store = Arc::new(MemoryStore::with_entries(3));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();
    store.fail_patch_for("1");
    store.set_fail_reads(true);

    assert!(board.move_entry(0, 2).await.is_err());
    assert!(board.state().stale);

    // Edits stay blocked until a reload succeeds
    assert_eq!(board.move_entry(0, 1).await.unwrap(), OperationOutcome::Unchanged);

    store.set_fail_reads(false);
    board.refresh().await.unwrap();
    assert!(!board.state().stale);
}

#[tokio::test]
async fn test_abandoned_move_is_recovered_on_next_edit() {
    let store = Arc::new(MemoryStore::with_entries(3));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();
    store.stall_patches.store(true, Ordering::SeqCst);

    let abandoned = tokio::time::timeout(Duration::from_millis(20), board.move_entry(2, 0)).await;
    assert!(abandoned.is_err());
    assert_eq!(board.state().phase, Phase::Reordering);

    store.stall_patches.store(false, Ordering::SeqCst);
    assert_eq!(board.toggle_active("1").await.unwrap(), OperationOutcome::Applied);

    // The unconfirmed order was replaced by the store's before the toggle
    assert_eq!(ids(&board), vec!["1", "2", "3"]);
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    assert_eq!(board.state().phase, Phase::Idle);
    assert!(!store.rows.lock().unwrap()[0].is_active);
}

// ==================== Toggle / Remove Tests ====================

#[tokio::test]
async fn test_toggle_active_persists() {
    let store = Arc::new(MemoryStore::with_entries(2));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();

    assert_eq!(board.toggle_active("2").await.unwrap(), OperationOutcome::Applied);
    assert!(!board.get("2").unwrap().is_active);
    assert!(!store.rows.lock().unwrap()[1].is_active);
}

#[tokio::test]
async fn test_remove_keeps_orders_of_remaining_entries() {
    let store = Arc::new(MemoryStore::with_entries(3));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();

    assert_eq!(board.remove("2").await.unwrap(), OperationOutcome::Applied);
    assert_eq!(ids(&board), vec!["1", "3"]);
    assert_eq!(orders(&board), vec![1, 3]);
}

#[tokio::test]
async fn test_remove_missing_entry_resyncs() {
    let store = Arc::new(MemoryStore::with_entries(2));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();
    store.rows.lock().unwrap().retain(|r| r.id != "1");

    let outcome = board.remove("1").await.unwrap();
    assert!(matches!(outcome, OperationOutcome::Resynced { .. }));
    assert_eq!(ids(&board), vec!["2"]);
}

#[tokio::test]
async fn test_loaded_entries_are_decoded_per_track() {
    let store = Arc::new(MemoryStore::with_entries(1));
    let board = SliderBoard::load(store, tracks()).await.unwrap();

    let slider = &board.entries()[0];
    assert_eq!(slider.content.title.get("en").map(String::as_str), Some("Slide 1"));
    assert_eq!(
        slider.content.description.get("tr").map(String::as_str),
        Some("Legacy text")
    );
    assert_eq!(slider.content.statistics.len(), 1);
}

// ==================== Editor / Track Tests ====================

#[tokio::test]
async fn test_created_entry_joins_the_collection() {
    let store = Arc::new(MemoryStore::with_entries(2));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();

    let mut editor = SliderEditor::new();
    let draft = editor.open_new(board.entries(), board.tracks());
    assert_eq!(draft.order, 3);
    draft.content.title.set("tr", "Yeni".to_string());
    draft.content.description.set("tr", "Açıklama".to_string());
    draft
        .content
        .primary_button
        .set("tr", Button::new("Keşfet", "/kesfet"));
    draft.background_image = "/img/new.jpg".to_string();
    draft.order = 0;

    let saved = editor.submit(board.store(), board.tracks()).await.unwrap();
    assert_eq!(saved.id, "102");
    board.record_saved(saved);

    assert_eq!(ids(&board), vec!["102", "1", "2"]);
    assert_eq!(
        board.get("102").unwrap().content.title.get("tr").map(String::as_str),
        Some("Yeni")
    );
    assert!(editor.draft().is_none());
}

#[tokio::test]
async fn test_new_track_is_filled_on_reload() {
    let store = Arc::new(MemoryStore::with_entries(2));
    let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();

    board
        .set_tracks(TrackSet::from_codes(&["tr", "en", "de"]).unwrap())
        .await
        .unwrap();

    assert_eq!(board.tracks().codes().collect::<Vec<_>>(), vec!["tr", "en", "de"]);
    let content = &board.get("1").unwrap().content;
    assert_eq!(content.title.get("de").map(String::as_str), Some(""));
    assert_eq!(content.description.get("de").map(String::as_str), Some("Legacy text"));
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
}

// ==================== Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn moves_keep_orders_contiguous(
        count in 1usize..8,
        moves in prop::collection::vec((0usize..10, 0usize..10), 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = Arc::new(MemoryStore::with_entries(count));
            let mut board = SliderBoard::load(store.clone(), tracks()).await.unwrap();
            let mut expected: Vec<String> = (1..=count).map(|i| i.to_string()).collect();

            for (from, to) in moves {
                board.move_entry(from, to).await.unwrap();
                if from < count && to < count && from != to {
                    let moved = expected.remove(from);
                    expected.insert(to, moved);
                }
            }

            let shown: Vec<String> = board.entries().iter().map(|e| e.id.clone()).collect();
            assert_eq!(shown, expected);

            let stored = store.stored_orders();
            let stored_ids: Vec<String> = stored.iter().map(|(id, _)| id.clone()).collect();
            assert_eq!(stored_ids, expected);
            // Seeded as 1..N and every successful move renumbers to 1..N
            let stored_orders: Vec<i64> = stored.iter().map(|(_, o)| *o).collect();
            assert_eq!(stored_orders, (1..=count as i64).collect::<Vec<_>>());
        });
    }
}
