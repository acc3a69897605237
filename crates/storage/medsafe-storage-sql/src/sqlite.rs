//! SQLite fallback store
//!
//! Owns the `drug_interactions` table, seeds it once from the bundled
//! dataset, and answers bidirectional pair lookups.

use async_trait::async_trait;
use medsafe_core::{
    InteractionRecord, InteractionStore, Logger, MedSafeError, Readiness, RecordSource, Result,
    SeedDataset, Severity, StoreConfig, StoreState,
};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What initialization did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// Table already held enough rows; the dataset was not read
    AlreadySeeded {
        /// Rows present
        rows: i64,
    },
    /// Table was (re)populated from the dataset
    Seeded {
        /// Rows inserted by this run
        inserted: u64,
        /// Rows present afterwards
        total: i64,
    },
}

/// SQLite-backed [`InteractionStore`]
pub struct SqliteInteractionStore {
    pool: SqlitePool,
    config: StoreConfig,
    readiness: Readiness,
}

impl SqliteInteractionStore {
    /// Open (creating if missing) the database at `database_url`
    pub async fn connect(database_url: &str, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let pool = connect_sqlite(database_url).await?;
        Ok(Self::with_pool(pool, config))
    }

    /// Wrap an existing pool. The pool handle is shared, not copied.
    pub fn with_pool(pool: SqlitePool, config: StoreConfig) -> Self {
        Self {
            pool,
            config,
            readiness: Readiness::new(),
        }
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run initialization on a background task
    pub fn spawn_initialization(self: Arc<Self>, seed: Vec<u8>) -> JoinHandle<Result<SeedOutcome>> {
        tokio::spawn(async move { self.initialize(&seed).await })
    }

    /// Create the schema and seed it when it holds fewer than
    /// `min_seed_rows` rows. Safe to run from several processes against
    /// the same file: the check and the reseed share one write transaction.
    ///
    /// Only the first call on a given store does the work; later calls wait
    /// for it and report the row count.
    pub async fn initialize(&self, seed: &[u8]) -> Result<SeedOutcome> {
        if !self.readiness.try_begin() {
            debug!("Store initialization already claimed, waiting");
            self.readiness.wait_ready(self.config.wait_timeout).await?;
            return Ok(SeedOutcome::AlreadySeeded {
                rows: self.count_interactions().await?,
            });
        }

        let claim = InitClaim::new(&self.readiness);
        let result = self.run_initialization(seed).await;
        claim.settle();

        match result {
            Ok(outcome) => {
                self.readiness.mark_ready();
                Ok(outcome)
            }
            Err(e) => {
                self.readiness.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_initialization(&self, seed: &[u8]) -> Result<SeedOutcome> {
        self.init_schema().await?;

        // Rolled back and returned to the pool if dropped before commit
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let outcome = self.seed_locked(&mut tx, seed).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Runs inside the write transaction opened by `run_initialization`
    async fn seed_locked(&self, conn: &mut SqliteConnection, seed: &[u8]) -> Result<SeedOutcome> {
        let log = Logger::new("seed");
        let rows = count_rows(conn).await?;
        if rows >= self.config.min_seed_rows {
            log.info(&format!("{} interactions present, skipping seed", rows));
            return Ok(SeedOutcome::AlreadySeeded { rows });
        }

        let dataset = SeedDataset::from_json_bytes(seed)?;
        if rows > 0 {
            log.warn(&format!(
                "Only {} interactions present (< {}), reseeding",
                rows, self.config.min_seed_rows
            ));
        }
        sqlx::query("DELETE FROM drug_interactions")
            .execute(&mut *conn)
            .await?;

        let mut inserted = 0u64;
        for chunk in dataset.records.chunks(self.config.batch_size) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO drug_interactions (drug_a, drug_b, severity, category, \
                 mechanism, recommendation, evidence_level, source) ",
            );
            builder.push_values(chunk, |mut b, record| {
                b.push_bind(&record.drug_a)
                    .push_bind(&record.drug_b)
                    .push_bind(record.severity.as_str())
                    .push_bind(&record.category)
                    .push_bind(&record.mechanism)
                    .push_bind(&record.recommendation)
                    .push_bind(&record.evidence_level)
                    .push_bind(&record.reference);
            });
            builder.push(" ON CONFLICT(drug_a, drug_b) DO NOTHING");
            inserted += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        let total = count_rows(conn).await?;
        log.info(&format!(
            "Seeded {} interactions ({} skipped, {} total)",
            inserted, dataset.skipped, total
        ));
        Ok(SeedOutcome::Seeded { inserted, total })
    }

    /// Create the table and its lookup indexes
    async fn init_schema(&self) -> Result<()> {
        debug!("Initializing SQLite schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drug_interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                drug_a TEXT NOT NULL,
                drug_b TEXT NOT NULL,
                severity TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                mechanism TEXT NOT NULL DEFAULT '',
                recommendation TEXT NOT NULL DEFAULT '',
                evidence_level TEXT NOT NULL DEFAULT '',
                source TEXT,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                UNIQUE (drug_a, drug_b),
                CHECK (drug_a <= drug_b)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_drug_interactions_pair \
             ON drug_interactions(drug_a, drug_b)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_drug_interactions_reverse \
             ON drug_interactions(drug_b, drug_a)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of stored interactions
    pub async fn count_interactions(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        count_rows(&mut conn).await
    }
}

#[async_trait]
impl InteractionStore for SqliteInteractionStore {
    async fn query_interaction(
        &self,
        drug_a: &str,
        drug_b: &str,
    ) -> Result<Option<InteractionRecord>> {
        self.readiness.wait_ready(self.config.wait_timeout).await?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| MedSafeError::query(format!("acquire connection: {}", e)))?;

        let row = sqlx::query(
            r#"
            SELECT drug_a, drug_b, severity, category, mechanism, recommendation,
                   evidence_level, source
            FROM drug_interactions
            WHERE (drug_a = ? AND drug_b = ?) OR (drug_a = ? AND drug_b = ?)
            LIMIT 1
        "#,
        )
        .bind(drug_a)
        .bind(drug_b)
        .bind(drug_b)
        .bind(drug_a)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| MedSafeError::query(e.to_string()))?;

        Ok(row.map(|row| row_to_record(&row)))
    }

    fn state(&self) -> StoreState {
        self.readiness.state()
    }
}

/// Marks the store failed if a claimed initialization is dropped before it
/// reports an outcome, so readers stop waiting on it.
struct InitClaim<'a> {
    readiness: &'a Readiness,
    settled: bool,
}

impl<'a> InitClaim<'a> {
    fn new(readiness: &'a Readiness) -> Self {
        Self {
            readiness,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InitClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.readiness.mark_failed("initialization cancelled");
        }
    }
}

/// Open a pool. In-memory databases get a single long-lived connection so
/// every query sees the same database.
pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database at: {}", database_url);

    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| MedSafeError::database(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?
    };
    Ok(pool)
}

async fn count_rows(conn: &mut SqliteConnection) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM drug_interactions")
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.get("count"))
}

fn row_to_record(row: &SqliteRow) -> InteractionRecord {
    let severity: String = row.get("severity");
    InteractionRecord {
        drug_a: row.get("drug_a"),
        drug_b: row.get("drug_b"),
        severity: Severity::parse_lenient(&severity),
        category: row.get("category"),
        mechanism: row.get("mechanism"),
        recommendation: row.get("recommendation"),
        evidence_level: row.get("evidence_level"),
        source: RecordSource::FallbackStore,
        reference: row.get("source"),
    }
}
