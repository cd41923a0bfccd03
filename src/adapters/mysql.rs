//! MySQL Submission Store Adapter
//!
//! Implements the `SubmissionStore` port over the submission service's
//! MySQL schema (`submissions` and `milestones` tables).

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{debug, instrument};

use crate::domain::ports::{MilestoneTally, StatusCount, SubmissionStore, SubmissionTotals};
use crate::error::{Error, Result};

const SUBMISSION_TOTALS_SQL: &str = r#"
    SELECT
        CAST(COUNT(*) AS SIGNED) AS total,
        CAST(COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0) AS SIGNED) AS graduated
    FROM submissions
"#;

const MILESTONE_TALLIES_SQL: &str = r#"
    SELECT
        CAST(s.id AS SIGNED) AS submission_id,
        CAST(COUNT(CASE WHEN m.status = ? THEN 1 END) AS SIGNED) AS approved,
        CAST(COUNT(m.id) AS SIGNED) AS total
    FROM submissions s
    LEFT JOIN milestones m ON s.id = m.submission_id
    GROUP BY s.id
"#;

const STATUS_COUNTS_SQL: &str = r#"
    SELECT
        CAST(status AS CHAR) AS status,
        CAST(COUNT(*) AS SIGNED) AS count
    FROM submissions
    GROUP BY status
"#;

/// Connection parameters for the submission database.
#[derive(Debug, Clone)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "submission_db".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// MySQL-backed submission store.
///
/// Connections are opened lazily and acquired for the duration of a single
/// query; the pooled connection is released when it drops, whether the query
/// succeeded or not.
pub struct MySqlSubmissionStore {
    pool: MySqlPool,
}

impl MySqlSubmissionStore {
    /// Create a store whose pool connects on first use.
    pub fn connect_lazy(config: &MySqlConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        Self { pool }
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for MySqlSubmissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSubmissionStore")
            .field("pool_size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl SubmissionStore for MySqlSubmissionStore {
    #[instrument(skip(self))]
    async fn submission_totals(&self, graduated_status: &str) -> Result<SubmissionTotals> {
        let mut conn = self.pool.acquire().await.map_err(relational_error)?;

        let (total, graduated): (i64, i64) = sqlx::query_as(SUBMISSION_TOTALS_SQL)
            .bind(graduated_status)
            .fetch_one(&mut *conn)
            .await
            .map_err(relational_error)?;

        debug!(total, graduated, "Fetched submission totals");

        Ok(SubmissionTotals {
            total: non_negative(total),
            graduated: non_negative(graduated),
        })
    }

    #[instrument(skip(self))]
    async fn milestone_tallies(&self, approved_status: &str) -> Result<Vec<MilestoneTally>> {
        let mut conn = self.pool.acquire().await.map_err(relational_error)?;

        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(MILESTONE_TALLIES_SQL)
            .bind(approved_status)
            .fetch_all(&mut *conn)
            .await
            .map_err(relational_error)?;

        debug!(submissions = rows.len(), "Fetched milestone tallies");

        Ok(rows
            .into_iter()
            .map(|(submission_id, approved, total)| {
                MilestoneTally::new(submission_id, non_negative(approved), non_negative(total))
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn status_counts(&self) -> Result<Vec<StatusCount>> {
        let mut conn = self.pool.acquire().await.map_err(relational_error)?;

        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(STATUS_COUNTS_SQL)
            .fetch_all(&mut *conn)
            .await
            .map_err(relational_error)?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount::new(status.unwrap_or_default(), non_negative(count)))
            .collect())
    }
}

fn relational_error(e: sqlx::Error) -> Error {
    Error::Relational(e.to_string())
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
