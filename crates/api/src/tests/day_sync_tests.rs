// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shiftdesk::{DayPhase, DayState, ReconcileOutcome};
use shiftdesk_domain::{
    DayRequest, DocPath, ShiftEntry, ShiftWindow, SpanParseResult, entries_from_spans,
    parse_span_input,
};
use shiftdesk_persistence::{DocumentChange, DocumentStore, MemoryStore};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::tests::helpers::{
    CountingStore, FailingStore, GatedStore, date, entry, june, read, seed, seed_window, shared,
};
use crate::{ApiError, DayRequestSync, SaveOutcome, ShiftWindowGate};

fn create_test_sync(store: Arc<dyn DocumentStore>) -> DayRequestSync {
    DayRequestSync::new(store, String::from("u1"), june())
}

fn day_path(value: &str) -> DocPath {
    DocPath::day_request("u1", june(), date(value)).unwrap()
}

fn remote_change(value: &str, entries: Vec<ShiftEntry>, version: u64) -> DocumentChange {
    let request: DayRequest = DayRequest {
        user_id: String::from("u1"),
        date: date(value),
        entries,
        updated_at: None,
    };
    DocumentChange {
        path: day_path(value),
        data: Some(serde_json::to_value(&request).unwrap()),
        version,
    }
}

async fn wait_for_phase(sync: &DayRequestSync, value: &str, phase: DayPhase) {
    for _ in 0..200 {
        if sync
            .snapshot(date(value))
            .await
            .is_some_and(|day| day.phase == phase)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("day {value} never reached {phase:?}");
}

#[tokio::test]
async fn test_load_day_without_document_is_loaded_empty() {
    let sync: DayRequestSync = create_test_sync(Arc::new(MemoryStore::new()));

    let loaded: Option<DayRequest> = sync.load_day(date("2024-06-10")).await.unwrap();

    assert!(loaded.is_none());
    let day: DayState = sync.snapshot(date("2024-06-10")).await.unwrap();
    assert_eq!(day.phase, DayPhase::Loaded);
    assert!(day.entries.is_empty());
}

#[tokio::test]
async fn test_save_unchanged_entries_performs_zero_writes() {
    let store: Arc<CountingStore> = Arc::new(CountingStore::default());
    let sync: DayRequestSync = create_test_sync(shared(&store));
    let shift: ShiftEntry = entry("s1", "10:00", "18:00");

    let first: SaveOutcome = sync
        .save_day_diff(date("2024-06-10"), &[shift.clone()])
        .await
        .unwrap();
    assert!(matches!(first, SaveOutcome::Written { .. }));
    assert_eq!(store.commits(), 1);

    let again: SaveOutcome = sync
        .save_day_diff(date("2024-06-10"), &[shift.clone()])
        .await
        .unwrap();
    let duplicated: SaveOutcome = sync
        .save_day_diff(date("2024-06-10"), &[shift.clone(), shift])
        .await
        .unwrap();

    assert_eq!(again, SaveOutcome::Unchanged);
    assert_eq!(duplicated, SaveOutcome::Unchanged);
    assert_eq!(store.commits(), 1);
}

#[tokio::test]
async fn test_first_save_loads_the_day() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let sync: DayRequestSync = create_test_sync(shared(&store));

    sync.save_day_diff(date("2024-06-10"), &[entry("s1", "09:00", "12:00")])
        .await
        .unwrap();

    let stored: DayRequest = read(store.as_ref(), &day_path("2024-06-10"))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.entries, vec![entry("s1", "09:00", "12:00")]);
    assert!(stored.updated_at.is_some());
}

#[tokio::test]
async fn test_removing_a_day_deletes_its_document() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let sync: DayRequestSync = create_test_sync(shared(&store));
    sync.save_day_diff(date("2024-06-10"), &[entry("s1", "10:00", "18:00")])
        .await
        .unwrap();

    let removed: SaveOutcome = sync.remove_day(date("2024-06-10")).await.unwrap();

    assert!(matches!(removed, SaveOutcome::Written { .. }));
    assert!(read(store.as_ref(), &day_path("2024-06-10")).await.is_none());
    let day: DayState = sync.snapshot(date("2024-06-10")).await.unwrap();
    assert!(day.entries.is_empty());
    assert_eq!(day.updated_at, None);
}

#[tokio::test]
async fn test_failed_save_rolls_back_local_entries() {
    let store: Arc<FailingStore> = Arc::new(FailingStore::default());
    let sync: DayRequestSync = create_test_sync(shared(&store));
    let kept: ShiftEntry = entry("s1", "10:00", "18:00");
    sync.save_day_diff(date("2024-06-10"), &[kept.clone()])
        .await
        .unwrap();

    store.fail_commits.store(true, Ordering::SeqCst);
    let err: ApiError = sync
        .save_day_diff(date("2024-06-10"), &[entry("s1", "12:00", "20:00")])
        .await
        .unwrap_err();

    assert_eq!(err.code(), "IO_ERROR");
    let day: DayState = sync.snapshot(date("2024-06-10")).await.unwrap();
    assert_eq!(day.entries, vec![kept]);
    assert!(!day.is_pending());
    assert!(day.error.is_some());
    assert!(!sync.is_saving());
    assert!(sync.last_error().await.is_some());
}

#[tokio::test]
async fn test_failed_load_leaves_day_in_error() {
    let store: Arc<FailingStore> = Arc::new(FailingStore::default());
    store.fail_reads.store(true, Ordering::SeqCst);
    let sync: DayRequestSync = create_test_sync(shared(&store));

    let err: ApiError = sync.load_day(date("2024-06-10")).await.unwrap_err();

    assert_eq!(err.code(), "IO_ERROR");
    let day: DayState = sync.snapshot(date("2024-06-10")).await.unwrap();
    assert_eq!(day.phase, DayPhase::Error);
}

#[tokio::test]
async fn test_date_outside_month_is_rejected() {
    let sync: DayRequestSync = create_test_sync(Arc::new(MemoryStore::new()));

    let err: ApiError = sync
        .save_day_diff(date("2024-07-01"), &[entry("s1", "10:00", "18:00")])
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_INPUT");
}

#[tokio::test]
async fn test_pending_day_holds_newer_snapshot_until_save_settles() {
    let store: Arc<GatedStore> = Arc::new(GatedStore::new());
    let sync: Arc<DayRequestSync> = Arc::new(create_test_sync(shared(&store)));
    let intent: ShiftEntry = entry("s1", "10:00", "18:00");
    sync.load_day(date("2024-06-10")).await.unwrap();

    let saving = tokio::spawn({
        let sync: Arc<DayRequestSync> = Arc::clone(&sync);
        let intent: ShiftEntry = intent.clone();
        async move { sync.save_day_diff(date("2024-06-10"), &[intent]).await }
    });
    wait_for_phase(&sync, "2024-06-10", DayPhase::Pending).await;
    assert!(sync.is_saving());

    let outcome: Option<ReconcileOutcome> = sync
        .apply_change(&remote_change(
            "2024-06-10",
            vec![entry("s1", "06:00", "09:00")],
            42,
        ))
        .await
        .unwrap();
    assert_eq!(outcome, Some(ReconcileOutcome::IgnoredPending));
    assert_eq!(
        sync.snapshot(date("2024-06-10")).await.unwrap().entries,
        vec![intent.clone()]
    );

    store.release();
    let saved: SaveOutcome = saving.await.unwrap().unwrap();
    assert!(matches!(saved, SaveOutcome::Written { .. }));
    let day: DayState = sync.snapshot(date("2024-06-10")).await.unwrap();
    assert_eq!(day.phase, DayPhase::Loaded);
    assert_eq!(day.entries, vec![entry("s1", "06:00", "09:00")]);
    assert_eq!(day.version, Some(42));
    assert!(!sync.is_saving());
}

#[tokio::test]
async fn test_dropped_save_still_settles_the_day() {
    let store: Arc<GatedStore> = Arc::new(GatedStore::new());
    let sync: Arc<DayRequestSync> = Arc::new(create_test_sync(shared(&store)));
    let intent: ShiftEntry = entry("s1", "10:00", "18:00");
    sync.load_day(date("2024-06-10")).await.unwrap();

    let saving = tokio::spawn({
        let sync: Arc<DayRequestSync> = Arc::clone(&sync);
        let intent: ShiftEntry = intent.clone();
        async move { sync.save_day_diff(date("2024-06-10"), &[intent]).await }
    });
    wait_for_phase(&sync, "2024-06-10", DayPhase::Pending).await;
    saving.abort();
    assert!(saving.await.unwrap_err().is_cancelled());

    store.release();
    wait_for_phase(&sync, "2024-06-10", DayPhase::Loaded).await;
    for _ in 0..200 {
        if !sync.is_saving() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!sync.is_saving());

    let stored: DayRequest = read(&store.inner, &day_path("2024-06-10"))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.entries, vec![intent]);

    store.release();
    let next: SaveOutcome = sync
        .save_day_diff(date("2024-06-10"), &[entry("s1", "12:00", "20:00")])
        .await
        .unwrap();
    assert!(matches!(next, SaveOutcome::Written { .. }));
}

#[tokio::test]
async fn test_saves_for_one_date_run_one_at_a_time() {
    let store: Arc<GatedStore> = Arc::new(GatedStore::new());
    let sync: Arc<DayRequestSync> = Arc::new(create_test_sync(shared(&store)));
    sync.load_day(date("2024-06-10")).await.unwrap();

    let first = tokio::spawn({
        let sync: Arc<DayRequestSync> = Arc::clone(&sync);
        async move {
            sync.save_day_diff(date("2024-06-10"), &[entry("s1", "10:00", "18:00")])
                .await
        }
    });
    wait_for_phase(&sync, "2024-06-10", DayPhase::Pending).await;
    let second = tokio::spawn({
        let sync: Arc<DayRequestSync> = Arc::clone(&sync);
        async move {
            sync.save_day_diff(date("2024-06-10"), &[entry("s1", "12:00", "20:00")])
                .await
        }
    });

    store.release();
    store.release();
    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());

    let stored: DayRequest = read(&store.inner, &day_path("2024-06-10"))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.entries, vec![entry("s1", "12:00", "20:00")]);
}

#[tokio::test]
async fn test_idle_day_accepts_remote_change() {
    let sync: DayRequestSync = create_test_sync(Arc::new(MemoryStore::new()));
    sync.load_day(date("2024-06-12")).await.unwrap();

    let outcome: Option<ReconcileOutcome> = sync
        .apply_change(&remote_change(
            "2024-06-12",
            vec![entry("s2", "08:00", "16:00")],
            7,
        ))
        .await
        .unwrap();

    assert_eq!(outcome, Some(ReconcileOutcome::Applied));
    let day: DayState = sync.snapshot(date("2024-06-12")).await.unwrap();
    assert_eq!(day.entries, vec![entry("s2", "08:00", "16:00")]);
    assert_eq!(day.version, Some(7));
}

#[tokio::test]
async fn test_changes_outside_the_month_are_ignored() {
    let sync: DayRequestSync = create_test_sync(Arc::new(MemoryStore::new()));
    let change: DocumentChange = DocumentChange {
        path: DocPath::day_request("u2", june(), date("2024-06-10")).unwrap(),
        data: None,
        version: 3,
    };

    assert_eq!(sync.apply_change(&change).await.unwrap(), None);
}

#[tokio::test]
async fn test_month_subscription_reconciles_other_writers() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let sync: DayRequestSync = create_test_sync(shared(&store));
    sync.load_day(date("2024-06-11")).await.unwrap();
    let subscription = sync.subscribe_month();

    let request: DayRequest = DayRequest {
        user_id: String::from("u1"),
        date: date("2024-06-11"),
        entries: vec![entry("s1", "13:00", "17:00")],
        updated_at: None,
    };
    seed(
        store.as_ref(),
        &day_path("2024-06-11"),
        serde_json::to_value(&request).unwrap(),
    )
    .await;

    let mut reconciled: bool = false;
    for _ in 0..200 {
        let day: DayState = sync.snapshot(date("2024-06-11")).await.unwrap();
        if day.entries == request.entries {
            reconciled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(reconciled);
    assert!(!subscription.is_finished());
}

#[tokio::test]
async fn test_load_month_populates_every_day() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let request: DayRequest = DayRequest {
        user_id: String::from("u1"),
        date: date("2024-06-03"),
        entries: vec![entry("s1", "10:00", "14:00")],
        updated_at: None,
    };
    seed(
        store.as_ref(),
        &day_path("2024-06-03"),
        serde_json::to_value(&request).unwrap(),
    )
    .await;
    let sync: DayRequestSync = create_test_sync(shared(&store));

    sync.load_month().await.unwrap();

    let days: Vec<DayState> = sync.days().await;
    assert_eq!(days.len(), 30);
    assert!(days.iter().all(|day| day.phase == DayPhase::Loaded));
    let third: DayState = sync.snapshot(date("2024-06-03")).await.unwrap();
    assert_eq!(third.entries, request.entries);
}

#[tokio::test]
async fn test_locked_window_refuses_save_without_writing() {
    let store: Arc<CountingStore> = Arc::new(CountingStore::default());
    seed_window(
        &store.inner,
        june(),
        &ShiftWindow::new(None, None, true, "closed").unwrap(),
    )
    .await;
    let sync: DayRequestSync = create_test_sync(shared(&store))
        .with_window_gate(ShiftWindowGate::new(shared(&store)));

    let err: ApiError = sync
        .save_day_diff(date("2024-06-10"), &[entry("s1", "10:00", "18:00")])
        .await
        .unwrap_err();

    assert_eq!(err.code(), "WINDOW_LOCKED");
    assert_eq!(store.commits(), 0);
    let day: DayState = sync.snapshot(date("2024-06-10")).await.unwrap();
    assert_eq!(day.phase, DayPhase::Loaded);
    assert!(day.entries.is_empty());
}

#[tokio::test]
async fn test_date_outside_window_refuses_save() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_window(
        store.as_ref(),
        june(),
        &ShiftWindow::new(Some(date("2024-06-15")), None, false, "").unwrap(),
    )
    .await;
    let sync: DayRequestSync = create_test_sync(shared(&store))
        .with_window_gate(ShiftWindowGate::new(shared(&store)));

    let early: ApiError = sync
        .save_day_diff(date("2024-06-10"), &[entry("s1", "10:00", "18:00")])
        .await
        .unwrap_err();
    let inside: SaveOutcome = sync
        .save_day_diff(date("2024-06-20"), &[entry("s1", "10:00", "18:00")])
        .await
        .unwrap();

    assert_eq!(early.code(), "DATE_OUTSIDE_WINDOW");
    assert!(matches!(inside, SaveOutcome::Written { .. }));
}

#[tokio::test]
async fn test_unchanged_save_does_not_consult_window() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    seed_window(
        store.as_ref(),
        june(),
        &ShiftWindow::new(None, None, true, "").unwrap(),
    )
    .await;
    let sync: DayRequestSync = create_test_sync(shared(&store))
        .with_window_gate(ShiftWindowGate::new(shared(&store)));

    let outcome: SaveOutcome = sync.remove_day(date("2024-06-10")).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Unchanged);
}

#[tokio::test]
async fn test_submit_lock_then_resubmit_keeps_existing_entry() {
    let store: Arc<CountingStore> = Arc::new(CountingStore::default());
    let sync: DayRequestSync = create_test_sync(shared(&store))
        .with_window_gate(ShiftWindowGate::new(shared(&store)));
    let parsed: SpanParseResult = parse_span_input("10-18");
    assert!(!parsed.has_errors());
    let entries: Vec<ShiftEntry> = entries_from_spans("s1", &parsed.spans);

    sync.save_day_diff(date("2024-06-10"), &entries)
        .await
        .unwrap();
    let stored: DayRequest = read(&store.inner, &day_path("2024-06-10"))
        .await
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(stored.entries.len(), 1);
    assert_eq!(stored.entries[0].span().unwrap().to_string(), "10:00-18:00");

    seed_window(
        &store.inner,
        june(),
        &ShiftWindow::new(None, None, true, "locked for payroll").unwrap(),
    )
    .await;
    let commits_before: usize = store.commits();
    let resubmit: Vec<ShiftEntry> =
        entries_from_spans("s1", &parse_span_input("10-19").spans);
    let err: ApiError = sync
        .save_day_diff(date("2024-06-10"), &resubmit)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "WINDOW_LOCKED");
    assert_eq!(store.commits(), commits_before);
    let reloaded: DayRequest = sync.load_day(date("2024-06-10")).await.unwrap().unwrap();
    assert_eq!(reloaded.entries, entries);
}
