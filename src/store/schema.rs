use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::record::{ItemId, ItemStatus};

pub const EXPORT_VERSION: u32 = 1;

/// Portable snapshot of every persisted category. Per-category blobs carry no
/// version of their own, so the export envelope is where format changes are detected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub lingo_export_version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: BTreeMap<String, BTreeMap<ItemId, ItemStatus>>,
}

impl ExportData {
    pub fn new(categories: BTreeMap<String, BTreeMap<ItemId, ItemStatus>>) -> Self {
        Self {
            lingo_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            categories,
        }
    }

    pub fn item_count(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }
}
