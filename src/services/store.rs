use async_trait::async_trait;
use thiserror::Error;

use crate::core::ConflictRule;
use crate::models::{NewSession, Profile, Session, SessionPatch};
use crate::services::{postgres::PostgresError, supabase::SupabaseError};

/// Errors reported by a persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Hosted backend error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("Database error: {0}")]
    Postgres(#[from] PostgresError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A conflicting session was stored concurrently")]
    Conflict,
}

/// Profile records
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All profiles, newest first
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    async fn get_profile(&self, id: &str) -> Result<Profile, StoreError>;

    /// Insert or replace the profile keyed by `profile.id`
    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, StoreError>;
}

/// Session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Sessions where any of `user_ids` is participant1 or participant2,
    /// ordered by date then time, both descending
    async fn sessions_for(&self, user_ids: &[&str]) -> Result<Vec<Session>, StoreError>;

    /// Every stored session
    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;

    async fn get_session(&self, id: &str) -> Result<Session, StoreError>;

    async fn insert_session(&self, session: &NewSession) -> Result<Session, StoreError>;

    /// Insert a session with both participants set
    ///
    /// Stores able to re-run the conflict check atomically with the insert
    /// override this and return [`StoreError::Conflict`] when it fails. The
    /// default is a plain insert.
    async fn insert_paired_session(
        &self,
        session: &NewSession,
        _rule: ConflictRule,
    ) -> Result<Session, StoreError> {
        self.insert_session(session).await
    }

    async fn update_session(&self, id: &str, patch: &SessionPatch) -> Result<Session, StoreError>;

    async fn delete_session(&self, id: &str) -> Result<(), StoreError>;

    /// Whether the backing service answers; stores without a health check report healthy
    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Order sessions the way `sessions_for` promises
pub fn sort_sessions_desc(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.time.cmp(&a.time)));
}
