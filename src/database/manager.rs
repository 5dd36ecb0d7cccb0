use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::database::store::{StoreError, StoreResult};

/// Table and index definitions, applied in order at startup. Each statement
/// is idempotent.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS tasks (
        id          UUID PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        due_date    TIMESTAMPTZ NOT NULL,
        priority    TEXT NOT NULL DEFAULT 'Low' CHECK (priority IN ('Low', 'Medium', 'High')),
        status      TEXT NOT NULL DEFAULT 'Pending' CHECK (status IN ('Pending', 'Completed')),
        owner       UUID NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS tasks_owner_updated_idx ON tasks (owner, updated_at DESC)",
    "CREATE INDEX IF NOT EXISTS tasks_owner_due_idx ON tasks (owner, due_date)",
    r#"CREATE TABLE IF NOT EXISTS contacts (
        id          UUID PRIMARY KEY,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        email       TEXT NOT NULL UNIQUE,
        phone       TEXT NOT NULL,
        company     TEXT,
        notes       TEXT,
        owner       UUID NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS contacts_owner_updated_idx ON contacts (owner, updated_at DESC)",
    r#"CREATE TABLE IF NOT EXISTS sales_opportunities (
        id                  UUID PRIMARY KEY,
        title               TEXT NOT NULL,
        description         TEXT,
        stage               TEXT NOT NULL CHECK (stage IN ('Prospect', 'Qualified', 'Negotiation', 'Closed Won', 'Closed Lost')),
        value               NUMERIC NOT NULL,
        expected_close_date TIMESTAMPTZ NOT NULL,
        priority            TEXT NOT NULL CHECK (priority IN ('High', 'Medium', 'Low')),
        created_by          UUID NOT NULL,
        owner               UUID NOT NULL,
        created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS sales_owner_close_idx ON sales_opportunities (owner, expected_close_date)",
];

/// Postgres-backed store. Opened once at startup and shared by every request.
pub struct PgStore {
    pub(crate) pool: PgPool,
    query_timeout: Duration,
    slow_query_threshold: Option<Duration>,
}

impl PgStore {
    /// Open the connection pool. Fails if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Created database pool for: {}", redacted(url));

        Ok(Self {
            pool,
            query_timeout: Duration::from_millis(config.query_timeout_ms),
            slow_query_threshold: config
                .enable_slow_query_warning
                .then(|| Duration::from_millis(config.slow_query_threshold_ms)),
        })
    }

    /// Create tables and indexes that do not exist yet
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationError(e.to_string()))?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    pub(crate) async fn ping(&self) -> StoreResult<()> {
        self.guarded("ping", sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }

    pub(crate) async fn shutdown(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Run one storage call under the configured timeout, translating
    /// driver errors and flagging slow calls.
    pub(crate) async fn guarded<T, F>(&self, label: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(query = label, timeout_ms = self.query_timeout.as_millis() as u64, "Storage call timed out");
                return Err(StoreError::Timeout(self.query_timeout));
            }
        };

        let elapsed = started.elapsed();
        if self.slow_query_threshold.is_some_and(|t| elapsed > t) {
            warn!(query = label, elapsed_ms = elapsed.as_millis() as u64, "Slow query");
        }

        outcome.map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Sqlx(other),
        })
    }
}

/// Connection string with the password removed, for logs
fn redacted(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.into()
        }
        Err(_) => "<unparseable DATABASE_URL>".to_string(),
    }
}
