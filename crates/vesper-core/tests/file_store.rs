use chrono::{TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;

use vesper_core::clock::{Calendar, FixedClock};
use vesper_core::persistence::{BADGES_KEY, CHECKLIST_KEY, LEDGER_KEY};
use vesper_core::store::{FileStore, KeyValueStore};
use vesper_core::ProgressEngine;

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 10, 21, 0, 0).unwrap())
}

#[test]
fn engine_persists_snapshots_as_json_files() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path().join("data");
    let clock = clock();

    let mut engine = ProgressEngine::open(FileStore::new(&dir), clock.clone(), Calendar::utc());
    let ids: Vec<String> = engine.checklist().tasks.iter().map(|t| t.id.clone()).collect();
    for id in &ids {
        engine.complete_task(id);
    }
    drop(engine);

    for key in [LEDGER_KEY, CHECKLIST_KEY, BADGES_KEY] {
        assert!(dir.join(format!("{key}.json")).is_file(), "missing {key}");
    }
    let raw = std::fs::read(dir.join("streak_ledger.json")).expect("read ledger");
    let ledger: Value = serde_json::from_slice(&raw).expect("json");
    assert_eq!(ledger["current_streak"], 1);
    assert_eq!(ledger["last_completed_date"], "2026-02-10");

    let reopened = ProgressEngine::open(FileStore::new(&dir), clock, Calendar::utc());
    assert_eq!(reopened.ledger().current_streak, 1);
    assert!(reopened.checklist().completed_at.is_some());
    assert_eq!(reopened.unlocked_badges().len(), 1);
}

#[test]
fn corrupt_files_fall_back_to_fresh_state() {
    let temp = TempDir::new().expect("tempdir");
    let mut store = FileStore::new(temp.path());
    store.set(LEDGER_KEY, b"\x00garbage").expect("write");
    store.set(CHECKLIST_KEY, b"[]").expect("write");

    let engine = ProgressEngine::open(store, clock(), Calendar::utc());
    assert_eq!(engine.ledger().current_streak, 0);
    assert_eq!(engine.ledger().total_days_completed, 0);
    assert_eq!(engine.checklist().streak_day, 1);
    assert_eq!(engine.checklist().tasks.len(), 4);

    // Opening rewrote the unreadable keys with valid snapshots.
    let raw = std::fs::read(temp.path().join("streak_ledger.json")).expect("read");
    assert!(serde_json::from_slice::<Value>(&raw).is_ok());
}

#[test]
fn calendar_offset_decides_the_day() {
    let temp = TempDir::new().expect("tempdir");
    // 21:00 UTC is already the next morning at UTC+9.
    let tokyo = Calendar::with_offset_minutes(9 * 60).expect("offset");
    let engine = ProgressEngine::open(FileStore::new(temp.path()), clock(), tokyo);
    assert_eq!(
        engine.checklist().date,
        chrono::NaiveDate::from_ymd_opt(2026, 2, 11).unwrap()
    );
}
