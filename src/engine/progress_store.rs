use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::engine::record::{
    ItemId, ItemStatus, ProgressRecord, storage_key, validate_category, validate_item_id,
};
use crate::engine::summary::{self, AggregateSummary};
use crate::error::{EngineError, PersistenceError, Result};
use crate::store::kv::KeyValueStore;
use crate::store::schema::{EXPORT_VERSION, ExportData};

/// Demonstration progress written the first time a category with no saved
/// data is loaded.
#[derive(Clone, Debug, Default)]
pub struct SeedTable {
    /// Keyed by storage key, so categories differing only in case share a seed.
    seeds: HashMap<String, BTreeMap<ItemId, ItemStatus>>,
}

impl SeedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(
        mut self,
        category: &str,
        items: impl IntoIterator<Item = (ItemId, ItemStatus)>,
    ) -> Self {
        self.insert(category, items);
        self
    }

    pub fn insert(&mut self, category: &str, items: impl IntoIterator<Item = (ItemId, ItemStatus)>) {
        let record = ProgressRecord::with_items(category, items);
        self.seeds.insert(storage_key(category), record.items().clone());
    }

    pub fn record_for(&self, category: &str) -> Option<ProgressRecord> {
        self.seeds
            .get(&storage_key(category))
            .map(|items| ProgressRecord::with_items(category, items.iter().map(|(k, v)| (*k, *v))))
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

enum Stored {
    Present(ProgressRecord),
    Absent,
    /// Blob exists but does not parse.
    Corrupt,
    ReadFailed(PersistenceError),
}

/// Durable per-category item status tracking on top of an injected key-value store.
///
/// Every operation on a category holds that category's lock for its whole
/// read-modify-write, so full-record overwrites land in issue order.
pub struct ProgressStore<S: KeyValueStore> {
    kv: S,
    seeds: SeedTable,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(kv: S) -> Self {
        Self::with_seeds(kv, SeedTable::new())
    }

    pub fn with_seeds(kv: S, seeds: SeedTable) -> Self {
        Self {
            kv,
            seeds,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn seeds(&self) -> &SeedTable {
        &self.seeds
    }

    fn category_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    fn guard(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
        lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_locked(&self, category: &str) -> Stored {
        let key = storage_key(category);
        match self.kv.get(&key) {
            Ok(Some(json)) => match ProgressRecord::from_json(category, &json) {
                Ok(record) => Stored::Present(record),
                Err(e) => {
                    warn!(%key, error = %e, "corrupt progress record; treating as not attempted");
                    Stored::Corrupt
                }
            },
            Ok(None) => Stored::Absent,
            Err(e) => Stored::ReadFailed(e),
        }
    }

    fn write_locked(&self, record: &ProgressRecord) -> Result<(), PersistenceError> {
        let key = storage_key(&record.category);
        let json = record.to_json()?;
        self.kv.set(&key, &json)?;
        debug!(%key, items = record.items().len(), "progress record written");
        Ok(())
    }

    /// Current record for `category`. Missing or unreadable data yields an empty
    /// record; a configured seed is persisted while no record exists yet.
    pub fn load(&self, category: &str) -> Result<ProgressRecord> {
        validate_category(category)?;
        let lock = self.category_lock(&storage_key(category));
        let _guard = Self::guard(&lock);

        let record = match self.read_locked(category) {
            Stored::Present(record) => record,
            Stored::Corrupt => ProgressRecord::new(category),
            Stored::ReadFailed(e) => {
                warn!(category, error = %e, "progress read failed; treating as not attempted");
                ProgressRecord::new(category)
            }
            Stored::Absent => match self.seeds.record_for(category) {
                Some(seed) => {
                    match self.write_locked(&seed) {
                        Ok(()) => info!(category, "seeded default progress"),
                        Err(e) => warn!(category, error = %e, "failed to persist seed; will retry on next load"),
                    }
                    seed
                }
                None => ProgressRecord::new(category),
            },
        };
        Ok(record)
    }

    /// Records `status` for one item and persists the whole record in a single
    /// write. On error nothing is committed and the stored record is unchanged.
    /// A failed read is returned as an error rather than overwriting data it
    /// could not see.
    pub fn record_status(
        &self,
        category: &str,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<ProgressRecord> {
        validate_category(category)?;
        validate_item_id(item_id)?;
        let lock = self.category_lock(&storage_key(category));
        let _guard = Self::guard(&lock);

        let mut record = match self.read_locked(category) {
            Stored::Present(record) => record,
            Stored::Corrupt => ProgressRecord::new(category),
            Stored::ReadFailed(e) => return Err(e.into()),
            Stored::Absent => self
                .seeds
                .record_for(category)
                .unwrap_or_else(|| ProgressRecord::new(category)),
        };
        record.set(item_id, status);
        self.write_locked(&record)?;
        Ok(record)
    }

    pub fn record_status_str(
        &self,
        category: &str,
        item_id: ItemId,
        status: &str,
    ) -> Result<ProgressRecord> {
        let status = status.parse::<ItemStatus>()?;
        self.record_status(category, item_id, status)
    }

    pub fn stats(&self, record: &ProgressRecord, total_items: u32) -> AggregateSummary {
        summary::stats(record, total_items)
    }

    /// Snapshot of the listed categories that have a persisted record. Never seeds.
    pub fn export(&self, categories: &[String]) -> Result<ExportData> {
        let mut out = BTreeMap::new();
        for category in categories {
            validate_category(category)?;
            let lock = self.category_lock(&storage_key(category));
            let _guard = Self::guard(&lock);
            match self.read_locked(category) {
                Stored::Present(record) => {
                    out.insert(category.clone(), record.items().clone());
                }
                Stored::ReadFailed(e) => return Err(e.into()),
                Stored::Absent | Stored::Corrupt => {}
            }
        }
        Ok(ExportData::new(out))
    }

    /// Writes every category in `data`. Everything is serialized before the first
    /// write; if a write fails, keys already written are restored to their
    /// previous values.
    pub fn import(&self, data: &ExportData) -> Result<()> {
        if data.lingo_export_version != EXPORT_VERSION {
            return Err(EngineError::InvalidArgument(format!(
                "unsupported export version: {} (expected {})",
                data.lingo_export_version, EXPORT_VERSION
            )));
        }

        let mut staged: BTreeMap<String, String> = BTreeMap::new();
        for (category, items) in &data.categories {
            validate_category(category)?;
            for id in items.keys() {
                validate_item_id(*id)?;
            }
            let record = ProgressRecord::with_items(category, items.iter().map(|(k, v)| (*k, *v)));
            let json = record.to_json().map_err(PersistenceError::from)?;
            staged.insert(storage_key(category), json);
        }

        // Keys are visited in sorted order, so concurrent imports cannot deadlock.
        let locks: Vec<Arc<Mutex<()>>> = staged.keys().map(|key| self.category_lock(key)).collect();
        let _guards: Vec<MutexGuard<'_, ()>> = locks.iter().map(|lock| Self::guard(lock)).collect();

        let mut previous: Vec<(&str, Option<String>)> = Vec::with_capacity(staged.len());
        for key in staged.keys() {
            previous.push((key.as_str(), self.kv.get(key)?));
        }

        for (i, (key, json)) in staged.iter().enumerate() {
            if let Err(e) = self.kv.set(key, json) {
                for (committed_key, old) in previous[..i].iter().rev() {
                    let restored = match old {
                        Some(value) => self.kv.set(committed_key, value),
                        None => self.kv.remove(committed_key),
                    };
                    if let Err(rollback_err) = restored {
                        warn!(key = %committed_key, error = %rollback_err, "import rollback failed");
                    }
                }
                return Err(e.into());
            }
        }

        info!(
            categories = staged.len(),
            items = data.item_count(),
            "imported progress"
        );
        Ok(())
    }
}
