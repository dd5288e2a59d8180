use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{RecommendationEntry, RecommendationRecord};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// PostgreSQL store for per-user recommendation records
///
/// Regeneration writes a whole record (last writer wins between
/// regenerations). A stale mark newer than the regeneration's start survives
/// the write. View and feedback events are single UPDATE statements so they
/// never overwrite a concurrent regeneration with a stale in-memory copy.
pub struct RecommendationStore {
    pool: PgPool,
}

impl RecommendationStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Load a user's record, if one exists
    pub async fn get_record(&self, user_id: &str) -> Result<Option<RecommendationRecord>, PostgresError> {
        let query = r#"
            SELECT user_id, entries, algorithm_version, refreshed_at, is_stale,
                   helpful_count, not_helpful_count, created_at
            FROM recommendation_records
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query).bind(user_id).fetch_optional(&self.pool).await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    /// Persist a regenerated record
    ///
    /// Replaces the entry list, version and refresh time. `refreshed_at` must
    /// be the time the regeneration started, before preferences were read: a
    /// [`Self::mark_stale`] after that point keeps the record stale. Feedback
    /// counters are only ever changed by [`Self::record_feedback`].
    pub async fn save_record(&self, record: &RecommendationRecord) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO recommendation_records
                (user_id, entries, algorithm_version, refreshed_at, is_stale, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id)
            DO UPDATE SET
                entries = EXCLUDED.entries,
                algorithm_version = EXCLUDED.algorithm_version,
                refreshed_at = EXCLUDED.refreshed_at,
                is_stale = EXCLUDED.is_stale
                    OR COALESCE(recommendation_records.stale_marked_at > EXCLUDED.refreshed_at, FALSE)
        "#;

        sqlx::query(query)
            .bind(&record.user_id)
            .bind(Json(&record.entries))
            .bind(&record.algorithm_version)
            .bind(record.refreshed_at)
            .bind(record.is_stale)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Saved {} recommendations for user {}",
            record.entries.len(),
            record.user_id
        );

        Ok(())
    }

    /// Set the viewed flag on one entry in place
    ///
    /// Returns false if the user has no record or the listing is not in it.
    pub async fn mark_viewed(&self, user_id: &str, listing_id: &str) -> Result<bool, PostgresError> {
        if listing_id.is_empty() {
            return Err(PostgresError::InvalidInput("listing id must not be empty".into()));
        }

        let query = r#"
            UPDATE recommendation_records
            SET entries = (
                SELECT jsonb_agg(
                    CASE WHEN elem->>'listingId' = $2
                         THEN jsonb_set(elem, '{viewed}', 'true'::jsonb)
                         ELSE elem
                    END
                    ORDER BY position
                )
                FROM jsonb_array_elements(entries) WITH ORDINALITY AS t(elem, position)
            )
            WHERE user_id = $1
              AND entries @> jsonb_build_array(jsonb_build_object('listingId', $2::text))
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increment the helpful or not-helpful counter
    ///
    /// Creates an empty record if the user has none yet; an empty record is
    /// regenerated on the next read.
    pub async fn record_feedback(&self, user_id: &str, helpful: bool) -> Result<(), PostgresError> {
        let (helpful_delta, not_helpful_delta) = if helpful { (1, 0) } else { (0, 1) };

        let query = r#"
            INSERT INTO recommendation_records (user_id, helpful_count, not_helpful_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET
                helpful_count = recommendation_records.helpful_count + EXCLUDED.helpful_count,
                not_helpful_count = recommendation_records.not_helpful_count + EXCLUDED.not_helpful_count
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(helpful_delta as i32)
            .bind(not_helpful_delta as i32)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Recorded feedback for user {} (helpful: {})", user_id, helpful);

        Ok(())
    }

    /// Flag a user's record for regeneration as of `now`
    pub async fn mark_stale(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO recommendation_records (user_id, is_stale, stale_marked_at)
            VALUES ($1, TRUE, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET is_stale = TRUE, stale_marked_at = EXCLUDED.stale_marked_at
        "#;

        sqlx::query(query).bind(user_id).bind(now).execute(&self.pool).await?;

        tracing::info!("Marked recommendations stale for user {}", user_id);

        Ok(())
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

fn record_from_row(row: &PgRow) -> Result<RecommendationRecord, PostgresError> {
    let Json(entries): Json<Vec<RecommendationEntry>> = row.try_get("entries")?;
    let helpful_count: i32 = row.try_get("helpful_count")?;
    let not_helpful_count: i32 = row.try_get("not_helpful_count")?;

    Ok(RecommendationRecord {
        user_id: row.try_get("user_id")?,
        entries,
        algorithm_version: row.try_get("algorithm_version")?,
        refreshed_at: row.try_get("refreshed_at")?,
        is_stale: row.try_get("is_stale")?,
        helpful_count: helpful_count.max(0) as u32,
        not_helpful_count: not_helpful_count.max(0) as u32,
        created_at: row.try_get("created_at")?,
    })
}
