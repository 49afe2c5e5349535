//! Alarm storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    AlarmId, AlarmStorage, StoredAlarm,
};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use tracing::debug;

const CREATE_ALARMS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS alarms (
        id INTEGER PRIMARY KEY,
        date_time TEXT NOT NULL,
        settings TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

fn db_error(context: &str, e: impl std::fmt::Display) -> BridgeError {
    BridgeError::DatabaseError(format!("{}: {}", context, e))
}

/// SQLite-backed alarm schedule store.
///
/// One row per alarm id; `save_alarm` replaces an existing row.
pub struct SqliteAlarmStorage {
    pool: SqlitePool,
}

impl SqliteAlarmStorage {
    /// Open (or create) the store at `db_path`.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to DB", e))?;

        Self::create_schema(&pool).await?;

        debug!(path = ?db_path, "Initialized alarm storage");

        Ok(Self { pool })
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self> {
        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| db_error("Failed to connect to DB", e))?;

        Self::create_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// `<data dir>/alarm-ring/alarms.db`, falling back to the temp dir.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("alarm-ring")
            .join("alarms.db")
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_ALARMS_TABLE)
            .execute(pool)
            .await
            .map_err(|e| db_error("Failed to create table", e))?;
        Ok(())
    }

    fn row_to_alarm(row: &sqlx::sqlite::SqliteRow) -> Result<StoredAlarm> {
        let id: i64 = row.get(0);
        let date_time: String = row.get(1);
        let settings: String = row.get(2);

        let id = i32::try_from(id)
            .map_err(|_| BridgeError::DatabaseError(format!("Alarm id out of range: {}", id)))?;
        let date_time = DateTime::parse_from_rfc3339(&date_time)
            .map_err(|e| db_error("Invalid stored date_time", e))?
            .with_timezone(&Utc);
        let settings =
            serde_json::from_str(&settings).map_err(|e| db_error("Invalid stored settings", e))?;

        Ok(StoredAlarm::new(AlarmId(id), date_time, settings))
    }
}

#[async_trait]
impl AlarmStorage for SqliteAlarmStorage {
    async fn save_alarm(&self, alarm: &StoredAlarm) -> Result<()> {
        let settings = serde_json::to_string(&alarm.settings)
            .map_err(|e| db_error("Failed to encode settings", e))?;

        sqlx::query(
            r#"
            INSERT INTO alarms (id, date_time, settings, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                date_time = excluded.date_time,
                settings = excluded.settings,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(alarm.id.value())
        .bind(alarm.date_time.to_rfc3339())
        .bind(settings)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save alarm", e))?;

        debug!(alarm_id = %alarm.id, "Saved alarm");
        Ok(())
    }

    async fn unsave_alarm(&self, id: AlarmId) -> Result<()> {
        let result = sqlx::query("DELETE FROM alarms WHERE id = ?")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete alarm", e))?;

        debug!(alarm_id = %id, removed = result.rows_affected(), "Unsaved alarm");
        Ok(())
    }

    async fn list_alarms(&self) -> Result<Vec<StoredAlarm>> {
        let rows = sqlx::query("SELECT id, date_time, settings FROM alarms ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list alarms", e))?;

        rows.iter().map(Self::row_to_alarm).collect()
    }

    async fn contains(&self, id: AlarmId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM alarms WHERE id = ?")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to check alarm", e))?;

        Ok(row.is_some())
    }
}
