pub mod models;
pub mod predicate;

pub use models::{QueueId, QueuePage, QueueRecord, QueueStatus};
pub use predicate::{RemovalReason, removal_reason, should_remove};
