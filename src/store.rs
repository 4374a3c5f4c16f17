//! store.rs: in-memory order storage with the uniqueness rules of the
//! persistent schema, plus an optional JSON snapshot on disk.
//!
//! `order_id` is the key; `order_mrid` and `order_refid` are unique too.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::ingest::types::OrderRecord;

/// What happens when an incoming record reuses an existing `order_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Surface the clash as `StoreError::Duplicate`.
    #[default]
    Reject,
    /// Replace the stored record with the same `order_id`.
    Upsert,
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ConflictPolicy::Reject),
            "upsert" | "overwrite" => Ok(ConflictPolicy::Upsert),
            other => Err(format!("unknown conflict policy '{other}' (reject|upsert)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveOutcome {
    Created,
    Replaced,
}

/// Destination of built records.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn save(&self, record: OrderRecord) -> Result<SaveOutcome, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    by_id: BTreeMap<String, OrderRecord>,
    // unique value -> owning order_id
    mrid: HashMap<String, String>,
    refid: HashMap<String, String>,
}

impl Inner {
    /// Key presence and unique-column check, ignoring the record currently
    /// keyed `except`.
    fn check_unique(&self, rec: &OrderRecord, except: Option<&str>) -> Result<(), StoreError> {
        if rec.order_id.is_empty() {
            return Err(StoreError::MissingKey);
        }
        let clash = |owner: Option<&String>| owner.is_some_and(|o| Some(o.as_str()) != except);

        if self.by_id.contains_key(&rec.order_id) && except != Some(rec.order_id.as_str()) {
            return Err(StoreError::Duplicate {
                field: "order_id",
                value: rec.order_id.clone(),
            });
        }
        if clash(self.mrid.get(&rec.order_mrid)) {
            return Err(StoreError::Duplicate {
                field: "order_mrid",
                value: rec.order_mrid.clone(),
            });
        }
        if clash(self.refid.get(&rec.order_refid)) {
            return Err(StoreError::Duplicate {
                field: "order_refid",
                value: rec.order_refid.clone(),
            });
        }
        Ok(())
    }

    fn remove(&mut self, order_id: &str) -> Option<OrderRecord> {
        let old = self.by_id.remove(order_id)?;
        self.mrid.remove(&old.order_mrid);
        self.refid.remove(&old.order_refid);
        Some(old)
    }

    fn put(&mut self, rec: OrderRecord) {
        self.mrid
            .insert(rec.order_mrid.clone(), rec.order_id.clone());
        self.refid
            .insert(rec.order_refid.clone(), rec.order_id.clone());
        self.by_id.insert(rec.order_id.clone(), rec);
    }
}

#[derive(Debug)]
pub struct OrderStore {
    inner: Mutex<Inner>,
    policy: ConflictPolicy,
    path: Option<PathBuf>,
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new(ConflictPolicy::default())
    }
}

impl OrderStore {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            policy,
            path: None,
        }
    }

    /// Open a store backed by a JSON snapshot. A missing file is an empty store.
    pub fn load_from_file<P: AsRef<Path>>(path: P, policy: ConflictPolicy) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut inner = Inner::default();
        if path.exists() {
            let data = fs::read_to_string(&path)?;
            let records: Vec<OrderRecord> = serde_json::from_str(&data)?;
            for rec in records {
                inner.check_unique(&rec, None)?;
                inner.put(rec);
            }
        }
        tracing::debug!(path = %path.display(), orders = inner.by_id.len(), "order store opened");
        Ok(Self {
            inner: Mutex::new(inner),
            policy,
            path: Some(path),
        })
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot file (no-op for a purely in-memory store).
    ///
    /// The store stays locked from serialization to the final rename.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let inner = self.lock();
        let records: Vec<&OrderRecord> = inner.by_id.values().collect();
        let json = serde_json::to_vec_pretty(&records)?;

        let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("order store mutex poisoned")
    }

    /// Add a new record; any clash on a unique column is an error.
    pub fn insert(&self, rec: OrderRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_unique(&rec, None)?;
        inner.put(rec);
        Ok(())
    }

    /// Store a record under the given conflict policy.
    pub fn save_with(&self, rec: OrderRecord, policy: ConflictPolicy) -> Result<SaveOutcome, StoreError> {
        let mut inner = self.lock();
        let exists = inner.by_id.contains_key(&rec.order_id);
        match (exists, policy) {
            (true, ConflictPolicy::Upsert) => {
                let id = rec.order_id.clone();
                inner.check_unique(&rec, Some(&id))?;
                inner.remove(&id);
                inner.put(rec);
                Ok(SaveOutcome::Replaced)
            }
            _ => {
                inner.check_unique(&rec, None)?;
                inner.put(rec);
                Ok(SaveOutcome::Created)
            }
        }
    }

    pub fn get(&self, order_id: &str) -> Option<OrderRecord> {
        self.lock().by_id.get(order_id).cloned()
    }

    /// All records, ordered by `order_id`.
    pub fn list(&self) -> Vec<OrderRecord> {
        self.lock().by_id.values().cloned().collect()
    }

    /// Replace the record stored under `order_id` (which must exist).
    pub fn update(&self, order_id: &str, rec: OrderRecord) -> Result<OrderRecord, StoreError> {
        let mut inner = self.lock();
        if !inner.by_id.contains_key(order_id) {
            return Err(StoreError::NotFound(order_id.to_string()));
        }
        inner.check_unique(&rec, Some(order_id))?;
        inner.remove(order_id);
        inner.put(rec.clone());
        Ok(rec)
    }

    pub fn delete(&self, order_id: &str) -> Result<OrderRecord, StoreError> {
        self.lock()
            .remove(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderSink for OrderStore {
    async fn save(&self, record: OrderRecord) -> Result<SaveOutcome, StoreError> {
        self.save_with(record, self.policy)
    }
}
