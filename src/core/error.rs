use chrono::NaiveDate;
use thiserror::Error;

use crate::models::ProfileField;
use crate::services::StoreError;

/// Errors surfaced by the matching and admission rules
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Email '{0}' does not belong to the institutional domain")]
    InvalidEmailDomain(String),

    #[error("A session already exists for this pair on {date}")]
    AlreadyMatched { date: NaiveDate },

    #[error("Profile is incomplete ({completion}% done), missing: {}", format_fields(.missing))]
    ProfileIncomplete {
        missing: Vec<ProfileField>,
        completion: u8,
    },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User {user_id} is not a participant of session {session_id}")]
    NotParticipant { user_id: String, session_id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn format_fields(fields: &[ProfileField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl MatchingError {
    /// Convert a store error, keeping "not found" distinct from I/O failures
    pub fn from_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => MatchingError::NotFound(what),
            other => MatchingError::PersistenceFailure(other),
        }
    }
}
