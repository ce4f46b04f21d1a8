//! Process-lifetime history store.
//!
//! Readings and dose records live in memory for the lifetime of the process;
//! persistence is out of scope for the mock service. All lists are newest
//! first. Concurrent handler access is serialised by a tokio `RwLock`.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::reading::{SensorReading, SoilVariables, StoredReading};
use crate::recommend::{Dosage, DoseRequest};

/// One canonical recommendation, kept so the dashboard can show past advice
/// together with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseRecord {
    pub input: DoseRequest,
    pub recommendation: Dosage,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct StoreInner {
    raw: VecDeque<StoredReading>,
    calibrated: VecDeque<StoredReading>,
    doses: VecDeque<DoseRecord>,
}

/// In-memory store for readings and dose records.
pub struct HistoryStore {
    inner: RwLock<StoreInner>,
}

fn insert(list: &mut VecDeque<StoredReading>, reading: SensorReading) -> StoredReading {
    let stored = StoredReading::new(reading);
    list.push_front(stored);
    stored
}

fn remove(list: &mut VecDeque<StoredReading>, id: Uuid) -> Option<StoredReading> {
    let index = list.iter().position(|r| r.id == id)?;
    list.remove(index)
}

fn take(list: &VecDeque<StoredReading>, limit: usize) -> Vec<StoredReading> {
    list.iter().take(limit).copied().collect()
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Store seeded with the two bench readings every fresh deployment
    /// shows before a station reports in.
    pub fn with_mock_readings() -> Self {
        let now = Utc::now();
        let mut raw = VecDeque::new();
        raw.push_back(StoredReading::new(SensorReading {
            timestamp: now,
            variables: SoilVariables {
                ph: 6.8,
                temperature: 28.0,
                moisture: 65.0,
                nitrogen: 45.0,
                phosphorus: 20.0,
                potassium: 35.0,
                conductivity: 1.2,
            },
        }));
        raw.push_back(StoredReading::new(SensorReading {
            timestamp: now - Duration::hours(1),
            variables: SoilVariables {
                ph: 6.9,
                temperature: 27.0,
                moisture: 63.0,
                nitrogen: 44.0,
                phosphorus: 21.0,
                potassium: 34.0,
                conductivity: 1.1,
            },
        }));

        Self {
            inner: RwLock::new(StoreInner {
                raw,
                ..StoreInner::default()
            }),
        }
    }

    // ── Raw readings ─────────────────────────────────────────────────────

    pub async fn latest_raw(&self) -> Option<StoredReading> {
        self.inner.read().await.raw.front().copied()
    }

    pub async fn insert_raw(&self, reading: SensorReading) -> StoredReading {
        insert(&mut self.inner.write().await.raw, reading)
    }

    pub async fn raw_history(&self, limit: usize) -> Vec<StoredReading> {
        take(&self.inner.read().await.raw, limit)
    }

    pub async fn all_raw(&self) -> Vec<StoredReading> {
        self.inner.read().await.raw.iter().copied().collect()
    }

    pub async fn remove_raw(&self, id: Uuid) -> Option<StoredReading> {
        remove(&mut self.inner.write().await.raw, id)
    }

    /// Drop every raw reading; returns how many were removed.
    pub async fn clear_raw(&self) -> usize {
        let mut inner = self.inner.write().await;
        let deleted = inner.raw.len();
        inner.raw.clear();
        deleted
    }

    pub async fn raw_count(&self) -> usize {
        self.inner.read().await.raw.len()
    }

    // ── Calibrated readings ──────────────────────────────────────────────

    pub async fn latest_calibrated(&self) -> Option<StoredReading> {
        self.inner.read().await.calibrated.front().copied()
    }

    pub async fn insert_calibrated(&self, reading: SensorReading) -> StoredReading {
        insert(&mut self.inner.write().await.calibrated, reading)
    }

    pub async fn calibrated_history(&self, limit: usize) -> Vec<StoredReading> {
        take(&self.inner.read().await.calibrated, limit)
    }

    pub async fn remove_calibrated(&self, id: Uuid) -> Option<StoredReading> {
        remove(&mut self.inner.write().await.calibrated, id)
    }

    pub async fn clear_calibrated(&self) -> usize {
        let mut inner = self.inner.write().await;
        let deleted = inner.calibrated.len();
        inner.calibrated.clear();
        deleted
    }

    // ── Dose records ─────────────────────────────────────────────────────

    pub async fn push_dose(&self, record: DoseRecord) {
        self.inner.write().await.doses.push_front(record);
    }

    pub async fn dose_history(&self, limit: usize) -> Vec<DoseRecord> {
        self.inner.read().await.doses.iter().take(limit).copied().collect()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
