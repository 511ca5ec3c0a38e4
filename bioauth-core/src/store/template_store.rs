use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::models::error::BioError;
use crate::models::identity::{EnrolledIdentity, FeatureData, IdentitySummary};

/// One entry of the durable snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotRecord {
    display_name: String,
    external_ref: String,
    feature: FeatureData,
    enrolled_at: DateTime<Utc>,
}

struct StoreInner {
    /// Insertion-ordered. Iteration order is a documented policy: the
    /// matcher's tie-break depends on it. Overwriting an id keeps the
    /// record's original position.
    records: Vec<EnrolledIdentity>,
    /// Set when a snapshot write fails; the store keeps serving from
    /// memory only.
    degraded: bool,
}

/// Durable, in-memory keyed store of enrolled identities.
///
/// The full record set is mirrored to a single JSON snapshot document,
/// rewritten synchronously on every mutation. Mutations take the write
/// lock, so readers never observe a half-applied change. Snapshot write
/// failure is fail-soft: the in-memory mutation stands, the store is
/// marked degraded, and the failure is logged.
pub struct TemplateStore {
    snapshot_path: PathBuf,
    inner: RwLock<StoreInner>,
}

impl TemplateStore {
    /// Open a store backed by the snapshot at `snapshot_path`, loading any
    /// existing snapshot. A missing or unreadable snapshot yields an empty
    /// store, never an error.
    pub fn open(snapshot_path: impl Into<PathBuf>) -> Self {
        let snapshot_path = snapshot_path.into();
        let records = read_snapshot(&snapshot_path);
        log::info!(
            "template store opened: {} identities from {}",
            records.len(),
            snapshot_path.display()
        );
        Self {
            snapshot_path,
            inner: RwLock::new(StoreInner {
                records,
                degraded: false,
            }),
        }
    }

    /// Insert or overwrite by id, then persist the snapshot.
    ///
    /// Last-write-wins: re-enrollment replaces the previous record in
    /// place. Persist failure does not roll back the in-memory mutation.
    pub fn put(&self, identity: EnrolledIdentity) -> Result<(), BioError> {
        let mut inner = self.inner.write();
        match inner.records.iter_mut().find(|r| r.id == identity.id) {
            Some(existing) => *existing = identity,
            None => inner.records.push(identity),
        }
        self.persist(&mut inner);
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<EnrolledIdentity> {
        self.inner.read().records.iter().find(|r| r.id == id).cloned()
    }

    /// Delete if present (no-op otherwise), then persist the snapshot.
    pub fn remove(&self, id: u64) -> Result<(), BioError> {
        let mut inner = self.inner.write();
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        if inner.records.len() != before {
            self.persist(&mut inner);
        }
        Ok(())
    }

    /// Public metadata for every enrolled identity, in insertion order.
    /// Raw feature data is never exposed here.
    pub fn list(&self) -> Vec<IdentitySummary> {
        self.inner
            .read()
            .records
            .iter()
            .map(IdentitySummary::from)
            .collect()
    }

    /// Discard in-memory state and rebuild it from the durable snapshot,
    /// picking up out-of-band changes to the file. Read or parse failure
    /// falls back to an empty store.
    ///
    /// The snapshot is read under the write lock so a concurrent `put` or
    /// `remove` cannot land between the file read and the in-memory swap.
    pub fn reload(&self) {
        let mut inner = self.inner.write();
        let records = read_snapshot(&self.snapshot_path);
        log::info!(
            "template store reloaded: {} identities",
            records.len()
        );
        inner.records = records;
        inner.degraded = false;
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Whether the store is running in-memory-only after a snapshot
    /// write failure.
    pub fn is_degraded(&self) -> bool {
        self.inner.read().degraded
    }

    /// Run `f` against the record slice under the read lock. Used by the
    /// matcher to scan candidates without cloning feature data.
    pub fn with_records<R>(&self, f: impl FnOnce(&[EnrolledIdentity]) -> R) -> R {
        f(&self.inner.read().records)
    }

    fn persist(&self, inner: &mut StoreInner) {
        match write_snapshot(&self.snapshot_path, &inner.records) {
            Ok(()) => inner.degraded = false,
            Err(e) => {
                log::error!(
                    "snapshot write failed, store degraded to in-memory only: {}",
                    e
                );
                inner.degraded = true;
            }
        }
    }
}

/// Serialize the whole record set as one `id (string) -> record` document.
fn write_snapshot(path: &Path, records: &[EnrolledIdentity]) -> Result<(), BioError> {
    let document: BTreeMap<String, SnapshotRecord> = records
        .iter()
        .map(|r| {
            (
                r.id.to_string(),
                SnapshotRecord {
                    display_name: r.display_name.clone(),
                    external_ref: r.external_ref.clone(),
                    feature: r.feature.clone(),
                    enrolled_at: r.enrolled_at,
                },
            )
        })
        .collect();

    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| BioError::Persistence(format!("serialize snapshot: {}", e)))?;
    fs::write(path, json)
        .map_err(|e| BioError::Persistence(format!("write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Read the snapshot, tolerating a missing or corrupt file.
///
/// The document is keyed by id, so insertion order is not stored;
/// records are ordered by (`enrolled_at`, `id`), which reproduces
/// enrollment order and keeps the matcher's tie-break deterministic
/// across restarts.
fn read_snapshot(path: &Path) -> Vec<EnrolledIdentity> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("snapshot unreadable, starting empty: {}", e);
            }
            return Vec::new();
        }
    };

    let document: BTreeMap<String, SnapshotRecord> = match serde_json::from_str(&json) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("snapshot corrupt, starting empty: {}", e);
            return Vec::new();
        }
    };

    let mut records: Vec<EnrolledIdentity> = document
        .into_iter()
        .filter_map(|(id, record)| {
            let id = match id.parse::<u64>() {
                Ok(id) => id,
                Err(_) => {
                    log::warn!("skipping snapshot entry with non-numeric id {:?}", id);
                    return None;
                }
            };
            Some(EnrolledIdentity {
                id,
                display_name: record.display_name,
                external_ref: record.external_ref,
                feature: record.feature,
                enrolled_at: record.enrolled_at,
            })
        })
        .collect();
    records.sort_by_key(|r| (r.enrolled_at, r.id));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity(id: u64, name: &str, vector: Vec<f32>) -> EnrolledIdentity {
        EnrolledIdentity {
            id,
            display_name: name.into(),
            external_ref: format!("ref-{}", id),
            feature: FeatureData::Embedding(vector),
            enrolled_at: Utc::now(),
        }
    }

    fn temp_store() -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::open(dir.path().join("identities.json"));
        (dir, store)
    }

    #[test]
    fn put_then_get_roundtrip() {
        let (_dir, store) = temp_store();
        store.put(identity(7, "Ana", vec![1.0, 0.0])).unwrap();

        let fetched = store.get(7).unwrap();
        assert_eq!(fetched.display_name, "Ana");
        assert_eq!(fetched.feature, FeatureData::Embedding(vec![1.0, 0.0]));
        assert!(store.get(8).is_none());
    }

    #[test]
    fn put_same_id_overwrites_in_place() {
        let (_dir, store) = temp_store();
        store.put(identity(1, "first", vec![1.0])).unwrap();
        store.put(identity(2, "second", vec![2.0])).unwrap();
        store.put(identity(1, "replaced", vec![9.0])).unwrap();

        assert_eq!(store.len(), 2);
        let order: Vec<u64> = store.list().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(store.get(1).unwrap().display_name, "replaced");
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let (_dir, store) = temp_store();
        store.put(identity(1, "a", vec![1.0])).unwrap();
        store.remove(42).unwrap();
        assert_eq!(store.len(), 1);
        store.remove(1).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn list_excludes_feature_data() {
        let (_dir, store) = temp_store();
        store.put(identity(3, "Bea", vec![0.5; 128])).unwrap();

        let summaries = store.list();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, 3);
        assert_eq!(summaries[0].external_ref, "ref-3");
    }

    #[test]
    fn reload_roundtrips_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.json");

        let store = TemplateStore::open(&path);
        store.put(identity(1, "a", vec![1.0, 2.0])).unwrap();
        store.put(identity(2, "b", vec![3.0])).unwrap();
        let before = store.list();

        store.reload();
        assert_eq!(store.list(), before);

        // A second store over the same snapshot sees identical state.
        let reopened = TemplateStore::open(&path);
        assert_eq!(reopened.list(), before);
        assert_eq!(reopened.get(1).unwrap().feature, FeatureData::Embedding(vec![1.0, 2.0]));
    }

    #[test]
    fn reload_falls_back_to_empty_on_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.json");
        fs::write(&path, "{ not json").unwrap();

        let store = TemplateStore::open(&path);
        assert!(store.is_empty());

        store.put(identity(1, "a", vec![1.0])).unwrap();
        fs::write(&path, "still not json").unwrap();
        store.reload();
        assert!(store.is_empty());
    }

    #[test]
    fn reload_racing_puts_never_loses_a_persisted_record() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TemplateStore::open(dir.path().join("identities.json")));

        // put and reload serialize on the write lock, so whichever order
        // they land in, a record that made it to the snapshot must survive
        // the reload.
        for i in 0..200u64 {
            let reloader = {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.reload())
            };
            store.put(identity(i, "racer", vec![1.0])).unwrap();
            reloader.join().unwrap();

            assert!(
                store.get(i).is_some(),
                "snapshot contains id {} but memory lost it after reload",
                i
            );
        }
    }

    #[test]
    fn persist_failure_degrades_but_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        // Snapshot path is a directory: every write fails.
        let store = TemplateStore::open(dir.path());

        store.put(identity(1, "a", vec![1.0])).unwrap();
        assert!(store.is_degraded());
        assert_eq!(store.get(1).unwrap().display_name, "a");
    }

    #[test]
    fn template_features_roundtrip_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.json");

        let store = TemplateStore::open(&path);
        store
            .put(EnrolledIdentity {
                id: 5,
                display_name: "print".into(),
                external_ref: "x".into(),
                feature: FeatureData::Template(vec![0xDE, 0xAD, 0xBE, 0xEF]),
                enrolled_at: Utc::now(),
            })
            .unwrap();

        let reopened = TemplateStore::open(&path);
        assert_eq!(
            reopened.get(5).unwrap().feature,
            FeatureData::Template(vec![0xDE, 0xAD, 0xBE, 0xEF])
        );
    }
}
