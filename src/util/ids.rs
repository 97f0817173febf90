//! Identifier types shared across the crate.

/// Identifier assigned to a task at admission. Unique per executor instance.
pub type TaskId = u64;

/// Handle returned by event subscriptions, used to unsubscribe.
pub type SubscriptionId = u64;
