pub mod progress_store;
pub mod record;
pub mod report;
pub mod summary;

pub use progress_store::{ProgressStore, SeedTable};
pub use record::{ItemId, ItemStatus, ProgressRecord};
pub use report::{CategorySpec, CompletionTier, ProgressReport, classify};
pub use summary::AggregateSummary;
