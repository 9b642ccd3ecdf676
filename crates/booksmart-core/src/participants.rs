//! Participant visibility and email lookup.
//!
//! - [`filter_for_user`] keeps the events a user takes part in
//! - [`ParticipantDirectory`] resolves emails to store ids, for callers that
//!   create recurring meetings

use std::collections::HashMap;

use crate::error::DirectoryError;
use crate::event::{CalendarEvent, Participant, Participants, normalize_email};

/// Keeps the events in which `user_email` appears as a participant.
///
/// Email comparison ignores case. Events without participants are never
/// visible, and a blank email sees nothing.
pub fn filter_for_user(events: Vec<CalendarEvent>, user_email: &str) -> Vec<CalendarEvent> {
    if normalize_email(user_email).is_empty() {
        return Vec::new();
    }
    events
        .into_iter()
        .filter(|event| event.is_visible_to(user_email))
        .collect()
}

/// Lookup table from email to participant.
#[derive(Debug, Clone, Default)]
pub struct ParticipantDirectory {
    by_email: HashMap<String, Participant>,
}

impl ParticipantDirectory {
    /// Builds a directory. When two participants share an email the first wins.
    pub fn new(participants: impl IntoIterator<Item = Participant>) -> Self {
        let mut by_email = HashMap::new();
        for participant in participants {
            by_email
                .entry(normalize_email(&participant.email))
                .or_insert(participant);
        }
        Self { by_email }
    }

    /// Looks up a participant by email (case-insensitive).
    pub fn lookup(&self, email: &str) -> Option<&Participant> {
        self.by_email.get(&normalize_email(email))
    }

    /// Resolves emails to participants, preserving order and skipping blanks.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::UnknownParticipant`] listing every email
    /// that is not in the directory.
    pub fn resolve<S: AsRef<str>>(&self, emails: &[S]) -> Result<Participants, DirectoryError> {
        let mut resolved = Participants::new();
        let mut unknown = Vec::new();

        for email in emails.iter().map(AsRef::as_ref) {
            if normalize_email(email).is_empty() {
                continue;
            }
            match self.lookup(email) {
                Some(participant) => {
                    resolved.insert(participant.clone());
                }
                None => unknown.push(email.trim().to_string()),
            }
        }

        if unknown.is_empty() {
            Ok(resolved)
        } else {
            Err(DirectoryError::UnknownParticipant { emails: unknown })
        }
    }

    /// Resolves emails to participant ids.
    ///
    /// # Errors
    ///
    /// See [`ParticipantDirectory::resolve`].
    pub fn resolve_ids<S: AsRef<str>>(&self, emails: &[S]) -> Result<Vec<i64>, DirectoryError> {
        Ok(self.resolve(emails)?.iter().map(|p| p.id).collect())
    }

    /// Returns the number of distinct emails.
    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    /// Returns true if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}
