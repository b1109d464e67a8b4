use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::badge::BadgeSet;
use crate::checklist::DailyChecklist;
use crate::ledger::StreakLedger;
use crate::store::{KeyValueStore, StoreError};

pub const LEDGER_KEY: &str = "streak_ledger";
pub const CHECKLIST_KEY: &str = "daily_checklist";
pub const BADGES_KEY: &str = "unlocked_badges";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub ledger: StreakLedger,
    /// `None` when nothing usable was stored; callers build a fresh day.
    pub checklist: Option<DailyChecklist>,
    pub badges: BadgeSet,
    /// Keys that were stored but could not be read back.
    pub discarded: Vec<&'static str>,
}

impl Snapshot {
    pub fn was_discarded(&self, key: &str) -> bool {
        self.discarded.iter().any(|discarded| *discarded == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub failed_keys: Vec<&'static str>,
}

impl SaveReport {
    pub fn is_ok(&self) -> bool {
        self.failed_keys.is_empty()
    }
}

/// Reads and writes the three snapshots as independent keys.
///
/// Failures never propagate: saves are best-effort and loads fall back to
/// defaults per key, so a crash between writes leaves each key readable on
/// its own.
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    store: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn save(
        &mut self,
        ledger: &StreakLedger,
        checklist: &DailyChecklist,
        badges: &BadgeSet,
    ) -> SaveReport {
        let mut report = SaveReport::default();
        self.save_key(LEDGER_KEY, ledger, &mut report);
        self.save_key(CHECKLIST_KEY, checklist, &mut report);
        self.save_key(BADGES_KEY, badges, &mut report);
        report
    }

    pub fn load(&self) -> Snapshot {
        let mut discarded = Vec::new();
        Snapshot {
            ledger: self
                .load_key(LEDGER_KEY, &mut discarded)
                .unwrap_or_default(),
            checklist: self.load_key(CHECKLIST_KEY, &mut discarded),
            badges: self
                .load_key(BADGES_KEY, &mut discarded)
                .unwrap_or_default(),
            discarded,
        }
    }

    fn save_key<T: Serialize>(&mut self, key: &'static str, value: &T, report: &mut SaveReport) {
        if let Err(err) = self.write(key, value) {
            warn!(key, error = %err, "failed to persist snapshot");
            report.failed_keys.push(key);
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(PersistError::Encode)?;
        self.store.set(key, &bytes)?;
        Ok(())
    }

    fn load_key<T: DeserializeOwned>(
        &self,
        key: &'static str,
        discarded: &mut Vec<&'static str>,
    ) -> Option<T> {
        match self.read(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "discarding unreadable snapshot");
                discarded.push(key);
                None
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistError> {
        let Some(bytes) = self.store.get(key)? else {
            debug!(key, "no stored snapshot");
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes).map_err(PersistError::Decode)?;
        Ok(Some(value))
    }
}
