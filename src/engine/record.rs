use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub type ItemId = u32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    NotAttempted,
    Completed,
    Wrong,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::NotAttempted => "not_attempted",
            ItemStatus::Completed => "completed",
            ItemStatus::Wrong => "wrong",
            ItemStatus::Skipped => "skipped",
        }
    }

    pub fn all() -> &'static [ItemStatus] {
        &[
            ItemStatus::NotAttempted,
            ItemStatus::Completed,
            ItemStatus::Wrong,
            ItemStatus::Skipped,
        ]
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown item status `{s}`")))
    }
}

/// Persisted key for a category's record.
pub fn storage_key(category: &str) -> String {
    format!("{}PuzzleStatus", category.to_lowercase())
}

pub fn validate_category(category: &str) -> Result<(), EngineError> {
    if category.trim().is_empty() {
        return Err(EngineError::InvalidArgument(
            "category must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_item_id(item_id: ItemId) -> Result<(), EngineError> {
    if item_id == 0 {
        return Err(EngineError::InvalidArgument(
            "item id must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// One category's item statuses. Absent items are `NotAttempted`; the map
/// never holds an explicit `NotAttempted` entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub category: String,
    items: BTreeMap<ItemId, ItemStatus>,
}

impl ProgressRecord {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            items: BTreeMap::new(),
        }
    }

    /// Builds a record, dropping `NotAttempted` entries and the invalid id 0.
    pub fn with_items(category: &str, items: impl IntoIterator<Item = (ItemId, ItemStatus)>) -> Self {
        let mut record = Self::new(category);
        for (id, status) in items {
            if id > 0 {
                record.set(id, status);
            }
        }
        record
    }

    pub fn status(&self, item_id: ItemId) -> ItemStatus {
        self.items.get(&item_id).copied().unwrap_or_default()
    }

    pub fn items(&self) -> &BTreeMap<ItemId, ItemStatus> {
        &self.items
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.values().filter(|s| **s == status).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn set(&mut self, item_id: ItemId, status: ItemStatus) {
        if status == ItemStatus::NotAttempted {
            self.items.remove(&item_id);
        } else {
            self.items.insert(item_id, status);
        }
    }

    /// Flat `{"<id>": "<status>"}` object as persisted.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    pub fn from_json(category: &str, json: &str) -> Result<Self, serde_json::Error> {
        let items: BTreeMap<ItemId, ItemStatus> = serde_json::from_str(json)?;
        Ok(Self::with_items(category, items))
    }
}
