use serde::Serialize;

use crate::engine::progress_store::ProgressStore;
use crate::engine::summary::AggregateSummary;
use crate::error::Result;
use crate::store::kv::KeyValueStore;

/// A category to include in a report and its fixed number of items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategorySpec {
    pub id: String,
    pub total_items: u32,
}

impl CategorySpec {
    pub fn new(id: impl Into<String>, total_items: u32) -> Self {
        Self {
            id: id.into(),
            total_items,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProgressReport {
    pub overall: AggregateSummary,
    /// Same order as the categories the report was built from.
    pub per_category: Vec<(String, AggregateSummary)>,
}

impl ProgressReport {
    pub fn get(&self, category: &str) -> Option<&AggregateSummary> {
        self.per_category
            .iter()
            .find(|(id, _)| id == category)
            .map(|(_, summary)| summary)
    }
}

/// Dashboard bucket for a completion percentage. Anything from 70% up counts
/// as `Complete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CompletionTier {
    None,
    Low,
    Mid,
    Complete,
}

impl CompletionTier {
    pub fn label(self) -> &'static str {
        match self {
            CompletionTier::None => "not started",
            CompletionTier::Low => "low",
            CompletionTier::Mid => "mid",
            CompletionTier::Complete => "complete",
        }
    }
}

pub fn classify(percentage: u32) -> CompletionTier {
    match percentage {
        0 => CompletionTier::None,
        1..30 => CompletionTier::Low,
        30..70 => CompletionTier::Mid,
        _ => CompletionTier::Complete,
    }
}

/// Snapshot of every listed category's progress, loaded through the store.
pub fn build<S: KeyValueStore>(
    store: &ProgressStore<S>,
    categories: &[CategorySpec],
) -> Result<ProgressReport> {
    let mut report = ProgressReport::default();
    for spec in categories {
        let record = store.load(&spec.id)?;
        let summary = record.stats(spec.total_items);
        report.overall.merge(&summary);
        report.per_category.push((spec.id.clone(), summary));
    }
    Ok(report)
}
