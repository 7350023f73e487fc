use serde::Serialize;
use tracing::warn;

use crate::engine::record::{ItemStatus, ProgressRecord};

/// Status totals for one category or a whole dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub total_completed: u32,
    pub total_wrong: u32,
    pub total_skipped: u32,
    pub total_not_attempted: u32,
    pub total_items: u32,
    pub completion_percentage: u32,
}

impl AggregateSummary {
    /// Adds another summary's counts; the percentage is recomputed from the sums.
    pub fn merge(&mut self, other: &AggregateSummary) {
        self.total_completed += other.total_completed;
        self.total_wrong += other.total_wrong;
        self.total_skipped += other.total_skipped;
        self.total_not_attempted += other.total_not_attempted;
        self.total_items += other.total_items;
        self.completion_percentage = completion_percentage(self.total_completed, self.total_items);
    }

    pub fn attempted(&self) -> u32 {
        self.total_completed + self.total_wrong + self.total_skipped
    }
}

pub fn completion_percentage(completed: u32, total_items: u32) -> u32 {
    if total_items == 0 {
        return 0;
    }
    let pct = (100.0 * completed as f64 / total_items as f64).round() as u32;
    pct.min(100)
}

/// Single-category statistics against the category's fixed item count.
pub fn stats(record: &ProgressRecord, total_items: u32) -> AggregateSummary {
    let completed = record.count(ItemStatus::Completed) as u32;
    let wrong = record.count(ItemStatus::Wrong) as u32;
    let skipped = record.count(ItemStatus::Skipped) as u32;
    let attempted = completed + wrong + skipped;

    if attempted > total_items {
        warn!(
            category = %record.category,
            attempted,
            total_items,
            "stored statuses exceed category size; clamping not-attempted to 0"
        );
    }

    AggregateSummary {
        total_completed: completed,
        total_wrong: wrong,
        total_skipped: skipped,
        total_not_attempted: total_items.saturating_sub(attempted),
        total_items,
        completion_percentage: completion_percentage(completed, total_items),
    }
}

impl ProgressRecord {
    pub fn stats(&self, total_items: u32) -> AggregateSummary {
        stats(self, total_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_a() -> ProgressRecord {
        ProgressRecord::with_items(
            "A",
            [
                (1, ItemStatus::Completed),
                (2, ItemStatus::Completed),
                (3, ItemStatus::Wrong),
                (4, ItemStatus::Skipped),
                (5, ItemStatus::Completed),
            ],
        )
    }

    #[test]
    fn test_stats_of_seed_record() {
        let summary = stats(&seeded_a(), 5);
        assert_eq!(summary.total_completed, 3);
        assert_eq!(summary.total_wrong, 1);
        assert_eq!(summary.total_skipped, 1);
        assert_eq!(summary.total_not_attempted, 0);
        assert_eq!(summary.completion_percentage, 60);
    }

    #[test]
    fn test_counts_add_up_to_total() {
        let record = ProgressRecord::with_items("B", [(2, ItemStatus::Wrong)]);
        let summary = record.stats(5);
        assert_eq!(summary.attempted() + summary.total_not_attempted, 5);
        assert_eq!(summary.total_not_attempted, 4);
        assert_eq!(summary.completion_percentage, 0);
    }

    #[test]
    fn test_inconsistent_data_clamps_instead_of_going_negative() {
        let summary = stats(&seeded_a(), 2);
        assert_eq!(summary.total_not_attempted, 0);
        assert_eq!(summary.completion_percentage, 100);
    }

    #[test]
    fn test_zero_items_means_zero_percent() {
        let summary = stats(&ProgressRecord::new("C"), 0);
        assert_eq!(summary.completion_percentage, 0);
        assert_eq!(summary.total_not_attempted, 0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(completion_percentage(1, 8), 13); // 12.5
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
    }

    #[test]
    fn test_merge_recomputes_percentage() {
        let mut overall = AggregateSummary::default();
        overall.merge(&stats(&seeded_a(), 5));
        overall.merge(&stats(&ProgressRecord::new("B"), 5));
        assert_eq!(overall.total_items, 10);
        assert_eq!(overall.total_completed, 3);
        assert_eq!(overall.total_not_attempted, 5);
        assert_eq!(overall.completion_percentage, 30);
    }
}
