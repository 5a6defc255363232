use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use thiserror::Error;

use crate::core::ConflictRule;
use crate::models::{NewSession, Session, SessionFormat, SessionPatch, TimeSlot};
use crate::services::store::{SessionStore, StoreError};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Postgres(PostgresError::SqlxError(value))
    }
}

/// SQLSTATE raised when a SERIALIZABLE transaction loses to a concurrent one
const SERIALIZATION_FAILURE: &str = "40001";

/// Map a statement error raised inside an admission transaction
///
/// Postgres may report a serialization failure on any statement, not only on
/// commit; each one means a concurrent admission got there first.
fn admission_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(SERIALIZATION_FAILURE) {
            tracing::warn!("Serialization failure during admission: {}", db.message());
            return StoreError::Conflict;
        }
    }
    err.into()
}

const SESSION_COLUMNS: &str = r#"
    id::text AS id, date, time, format, topic,
    participant1, participant2, meet_link, created_at
"#;

/// Direct PostgreSQL session store
///
/// Talks to the same `sessions` table the hosted REST API exposes, but
/// runs the duplicate check and the insert of a paired session inside one
/// SERIALIZABLE transaction, so two concurrent admissions for the same
/// users and date cannot both succeed.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL session store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
        )
        .await
    }

    fn session_from_row(row: &PgRow) -> Result<Session, PostgresError> {
        let time: String = row.try_get("time")?;
        let format: String = row.try_get("format")?;

        Ok(Session {
            id: row.try_get("id")?,
            date: row.try_get::<NaiveDate, _>("date")?,
            time: time.parse::<TimeSlot>().map_err(PostgresError::InvalidRow)?,
            format: format.parse::<SessionFormat>().map_err(PostgresError::InvalidRow)?,
            topic: row.try_get("topic")?,
            participant1: row.try_get("participant1")?,
            participant2: row.try_get("participant2")?,
            meet_link: row.try_get("meet_link")?,
            created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
        })
    }

    fn sessions_from_rows(rows: &[PgRow]) -> Result<Vec<Session>, StoreError> {
        rows.iter()
            .map(|row| Self::session_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn insert_in<'c>(
        tx: &mut Transaction<'c, Postgres>,
        session: &NewSession,
    ) -> Result<Session, StoreError> {
        let query = format!(
            r#"
            INSERT INTO sessions (date, time, format, topic, participant1, participant2, meet_link)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(session.date)
            .bind(session.time.as_str())
            .bind(session.format.as_str())
            .bind(&session.topic)
            .bind(&session.participant1)
            .bind(&session.participant2)
            .bind(&session.meet_link)
            .fetch_one(&mut **tx)
            .await
            .map_err(admission_error)?;

        Ok(Self::session_from_row(&row)?)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl SessionStore for PostgresClient {
    async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    async fn sessions_for(&self, user_ids: &[&str]) -> Result<Vec<Session>, StoreError> {
        let ids: Vec<String> = user_ids.iter().map(|id| id.to_string()).collect();
        let query = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE participant1 = ANY($1) OR participant2 = ANY($1)
            ORDER BY date DESC, time DESC
            "#
        );

        let rows = sqlx::query(&query).bind(&ids).fetch_all(&self.pool).await?;

        tracing::debug!("Fetched {} sessions for {:?}", rows.len(), user_ids);

        Self::sessions_from_rows(&rows)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY date DESC, time DESC");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Self::sessions_from_rows(&rows)
    }

    async fn get_session(&self, id: &str) -> Result<Session, StoreError> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id::text = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))?;

        Ok(Self::session_from_row(&row)?)
    }

    async fn insert_session(&self, session: &NewSession) -> Result<Session, StoreError> {
        let mut tx = self.pool.begin().await?;
        let stored = Self::insert_in(&mut tx, session).await?;
        tx.commit().await?;

        tracing::debug!("Inserted session {} on {}", stored.id, stored.date);

        Ok(stored)
    }

    /// Re-check conflicts and insert in a single SERIALIZABLE transaction
    ///
    /// A serialization failure from a concurrent admission is reported as
    /// [`StoreError::Conflict`].
    async fn insert_paired_session(
        &self,
        session: &NewSession,
        rule: ConflictRule,
    ) -> Result<Session, StoreError> {
        let (Some(a), Some(b)) = (session.participant1.as_deref(), session.participant2.as_deref()) else {
            return self.insert_session(session).await;
        };

        let mut tx = self.pool.begin().await.map_err(admission_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(admission_error)?;

        let query = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE date = $1
              AND (participant1 IN ($2, $3) OR participant2 IN ($2, $3))
            "#
        );
        let rows = sqlx::query(&query)
            .bind(session.date)
            .bind(a)
            .bind(b)
            .fetch_all(&mut *tx)
            .await
            .map_err(admission_error)?;
        let same_day = Self::sessions_from_rows(&rows)?;

        if crate::core::has_conflict(&same_day, a, b, session.date, rule) {
            tx.rollback().await.map_err(admission_error)?;
            return Err(StoreError::Conflict);
        }

        let stored = Self::insert_in(&mut tx, session).await?;
        tx.commit().await.map_err(admission_error)?;

        Ok(stored)
    }

    async fn update_session(&self, id: &str, patch: &SessionPatch) -> Result<Session, StoreError> {
        let query = format!(
            r#"
            UPDATE sessions SET
                time = COALESCE($2, time),
                format = COALESCE($3, format),
                topic = CASE WHEN $4 THEN $5 ELSE topic END,
                meet_link = CASE WHEN $6 THEN $7 ELSE meet_link END
            WHERE id::text = $1
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(patch.time.map(|t| t.as_str()))
            .bind(patch.format.map(|f| f.as_str()))
            .bind(patch.topic.is_some())
            .bind(patch.topic.clone().flatten())
            .bind(patch.meet_link.is_some())
            .bind(patch.meet_link.clone().flatten())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))?;

        Ok(Self::session_from_row(&row)?)
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id::text = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("session {}", id)));
        }

        tracing::debug!("Deleted session {}", id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("database error {code}")]
    struct CodedDbError {
        code: &'static str,
    }

    impl sqlx::error::DatabaseError for CodedDbError {
        fn message(&self) -> &str {
            "could not serialize access due to read/write dependencies among transactions"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(CodedDbError { code }))
    }

    #[test]
    fn test_session_columns_cast_id() {
        assert!(SESSION_COLUMNS.contains("id::text AS id"));
    }

    #[test]
    fn test_serialization_failure_is_conflict() {
        assert!(matches!(admission_error(db_error("40001")), StoreError::Conflict));
    }

    #[test]
    fn test_other_errors_stay_persistence_failures() {
        assert!(matches!(
            admission_error(db_error("23505")),
            StoreError::Postgres(PostgresError::SqlxError(sqlx::Error::Database(_)))
        ));
        assert!(matches!(
            admission_error(sqlx::Error::RowNotFound),
            StoreError::Postgres(PostgresError::SqlxError(sqlx::Error::RowNotFound))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_paired_insert_rejects_conflict() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let client = PostgresClient::new(&url, 2, 1, 5, 60).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let session = NewSession::paired(
            "pg-a",
            "pg-b",
            date,
            TimeSlot::default(),
            SessionFormat::InPerson,
            None,
            None,
        );

        let first = client
            .insert_paired_session(&session, ConflictRule::EitherParticipant)
            .await
            .unwrap();
        let second = client
            .insert_paired_session(&session, ConflictRule::EitherParticipant)
            .await;
        assert!(matches!(second, Err(StoreError::Conflict)));

        client.delete_session(&first.id).await.unwrap();
    }
}
