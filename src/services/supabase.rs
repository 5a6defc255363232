use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::models::{NewSession, Profile, Session, SessionPatch};
use crate::services::store::{ProfileStore, SessionStore, StoreError};

/// Errors that can occur when interacting with the hosted backend
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the hosted database
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub profiles: String,
    pub sessions: String,
}

impl Default for SupabaseTables {
    fn default() -> Self {
        Self {
            profiles: "profiles".to_string(),
            sessions: "sessions".to_string(),
        }
    }
}

/// REST client for the hosted backend's row API
///
/// Handles all row storage calls:
/// - Listing, fetching and upserting profiles
/// - Fetching sessions by participant membership
/// - Inserting, updating and deleting sessions
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
}

impl SupabaseClient {
    /// Create a new client for the project at `base_url`
    pub fn new(
        base_url: String,
        api_key: String,
        tables: SupabaseTables,
        timeout_secs: u64,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn check(response: Response, action: &str) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to {}: {} - {}", action, status, body);
            return Err(SupabaseError::ApiError(format!(
                "Failed to {}: {}",
                action, status
            )));
        }
        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(response: Response, what: &str) -> Result<Vec<T>, SupabaseError> {
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    /// First row of a representation response, or `NotFound`
    fn single<T>(rows: Vec<T>, what: String) -> Result<T, StoreError> {
        rows.into_iter().next().ok_or(StoreError::NotFound(what))
    }

    /// PostgREST `or` filter matching sessions that involve any of `user_ids`
    fn membership_filter(user_ids: &[&str]) -> String {
        let list = user_ids
            .iter()
            .map(|id| format!("\"{}\"", id.replace('"', "")))
            .collect::<Vec<_>>()
            .join(",");
        format!("(participant1.in.({list}),participant2.in.({list}))")
    }

    /// Health check against the REST endpoint
    pub async fn health_check(&self) -> bool {
        let url = format!("{}?select=id&limit=1", self.table_url(&self.tables.profiles));
        match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Hosted backend health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let url = format!(
            "{}?select=*&order=created_at.desc",
            self.table_url(&self.tables.profiles)
        );

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "list profiles").await?;
        let profiles: Vec<Profile> = Self::rows(response, "profiles").await?;

        tracing::debug!("Fetched {} profiles", profiles.len());

        Ok(profiles)
    }

    async fn get_profile(&self, id: &str) -> Result<Profile, StoreError> {
        let url = format!(
            "{}?select=*&id=eq.{}",
            self.table_url(&self.tables.profiles),
            urlencoding::encode(id)
        );

        tracing::debug!("Fetching profile for user: {}", id);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "fetch profile").await?;
        let rows: Vec<Profile> = Self::rows(response, "profile").await?;

        Self::single(rows, format!("profile {}", id))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let url = self.table_url(&self.tables.profiles);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(profile)
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "upsert profile").await?;
        let rows: Vec<Profile> = Self::rows(response, "profile").await?;

        tracing::debug!("Upserted profile {}", profile.id);

        Self::single(rows, format!("profile {}", profile.id))
    }
}

#[async_trait]
impl SessionStore for SupabaseClient {
    async fn is_healthy(&self) -> bool {
        self.health_check().await
    }

    async fn sessions_for(&self, user_ids: &[&str]) -> Result<Vec<Session>, StoreError> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        let url = format!(
            "{}?select=*&or={}&order=date.desc,time.desc",
            self.table_url(&self.tables.sessions),
            urlencoding::encode(&Self::membership_filter(user_ids))
        );

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "fetch sessions").await?;
        let sessions: Vec<Session> = Self::rows(response, "sessions").await?;

        tracing::debug!("Fetched {} sessions for {:?}", sessions.len(), user_ids);

        Ok(sessions)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let url = format!(
            "{}?select=*&order=date.desc,time.desc",
            self.table_url(&self.tables.sessions)
        );

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "list sessions").await?;

        Ok(Self::rows(response, "sessions").await?)
    }

    async fn get_session(&self, id: &str) -> Result<Session, StoreError> {
        let url = format!(
            "{}?select=*&id=eq.{}",
            self.table_url(&self.tables.sessions),
            urlencoding::encode(id)
        );

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "fetch session").await?;
        let rows: Vec<Session> = Self::rows(response, "session").await?;

        Self::single(rows, format!("session {}", id))
    }

    async fn insert_session(&self, session: &NewSession) -> Result<Session, StoreError> {
        let url = self.table_url(&self.tables.sessions);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(session)
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "insert session").await?;
        let rows: Vec<Session> = Self::rows(response, "session").await?;

        let stored = rows.into_iter().next().ok_or_else(|| {
            SupabaseError::InvalidResponse("Insert returned no representation".to_string())
        })?;

        tracing::debug!("Inserted session {} on {}", stored.id, stored.date);

        Ok(stored)
    }

    async fn update_session(&self, id: &str, patch: &SessionPatch) -> Result<Session, StoreError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(&self.tables.sessions),
            urlencoding::encode(id)
        );

        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "update session").await?;
        let rows: Vec<Session> = Self::rows(response, "session").await?;

        Self::single(rows, format!("session {}", id))
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(&self.tables.sessions),
            urlencoding::encode(id)
        );

        let response = self
            .authorized(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response, "delete session").await?;
        let rows: Vec<Session> = Self::rows(response, "session").await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("session {}", id)));
        }

        tracing::debug!("Deleted session {}", id);

        Ok(())
    }
}
