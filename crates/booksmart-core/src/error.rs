//! Error types for core operations.

use thiserror::Error;

/// Errors raised while expanding a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// The rule's interval cannot move the cursor forward.
    #[error("recurrence rule {recurrence_id} does not advance (interval {interval})")]
    NonAdvancingRule { recurrence_id: i64, interval: i64 },
}

impl ExpansionError {
    /// Creates a non-advancing rule error.
    pub fn non_advancing(recurrence_id: i64, interval: i64) -> Self {
        Self::NonAdvancingRule {
            recurrence_id,
            interval,
        }
    }
}

/// Errors raised while resolving participants by email.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// One or more emails are not known to the store.
    #[error("unknown participant(s): {}", emails.join(", "))]
    UnknownParticipant { emails: Vec<String> },
}
