// SQLite backend: raw_records, alerts and devices tables in one database file.

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

use super::{AlertStore, DeviceDirectory, RecordStore, default_alert_levels, validate_alert};
use crate::error::{MonitorError, MonitorResult};
use crate::models::{
    AlertInfo, AlertLevel, AlertRecord, DeviceStatusSnapshot, MeasurementRecord, SubjectKey,
    SubjectKind,
};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS raw_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                subject TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                value INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_raw_records_subject ON raw_records(kind, subject)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                device TEXT NOT NULL,
                level TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS devices (id TEXT PRIMARY KEY, status TEXT NOT NULL, updated_at INTEGER NOT NULL)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_alerts(&self) -> anyhow::Result<Vec<AlertRecord>> {
        let rows = sqlx::query("SELECT id, device, level, email FROM alerts ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let level: String = row.try_get("level")?;
            let level = AlertLevel::parse(&level)
                .ok_or_else(|| anyhow::anyhow!("unknown alert level in store: {:?}", level))?;
            out.push(AlertRecord {
                id: row.try_get("id")?,
                device: row.try_get("device")?,
                level,
                email: row.try_get("email")?,
                last_activated: None,
            });
        }
        Ok(out)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl RecordStore for SqliteStore {
    #[instrument(skip(self, subject), fields(repo = "sqlite", operation = "fetch_raw_records", subject = %subject))]
    async fn fetch_raw_records(
        &self,
        subject: &SubjectKey,
    ) -> MonitorResult<Vec<MeasurementRecord>> {
        let rows = sqlx::query(
            "SELECT timestamp, value FROM raw_records WHERE kind = $1 AND subject = $2 ORDER BY id ASC",
        )
        .bind(subject.kind.as_str())
        .bind(&subject.id)
        .fetch_all(&self.pool)
        .await
        .map_err(MonitorError::repository)?;

        rows.iter()
            .map(|row| -> Result<MeasurementRecord, sqlx::Error> {
                Ok(MeasurementRecord {
                    timestamp: row.try_get("timestamp")?,
                    value: row.try_get("value")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(MonitorError::repository)
    }

    #[instrument(skip(self, subject, record), fields(repo = "sqlite", operation = "append_record", subject = %subject))]
    async fn append_record(
        &self,
        subject: &SubjectKey,
        record: MeasurementRecord,
    ) -> MonitorResult<()> {
        sqlx::query(
            "INSERT INTO raw_records (kind, subject, timestamp, value) VALUES ($1, $2, $3, $4)",
        )
        .bind(subject.kind.as_str())
        .bind(&subject.id)
        .bind(&record.timestamp)
        .bind(record.value)
        .execute(&self.pool)
        .await
        .map_err(MonitorError::repository)?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "sqlite", operation = "list_subjects"))]
    async fn list_subjects(&self, kind: SubjectKind) -> MonitorResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT subject FROM raw_records WHERE kind = $1 ORDER BY subject ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(MonitorError::repository)
    }
}

#[async_trait]
impl AlertStore for SqliteStore {
    #[instrument(skip(self), fields(repo = "sqlite", operation = "list_alerts"))]
    async fn list_alerts(&self) -> MonitorResult<AlertInfo> {
        let alerts = self.query_alerts().await.map_err(MonitorError::repository)?;
        Ok(AlertInfo {
            alert_levels: default_alert_levels(),
            alerts,
        })
    }

    #[instrument(skip_all, fields(repo = "sqlite", operation = "add_alert", alert_id = %alert.id))]
    async fn add_alert(&self, alert: &AlertRecord) -> MonitorResult<()> {
        validate_alert(alert)?;
        sqlx::query(
            "INSERT INTO alerts (id, device, level, email, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&alert.id)
        .bind(&alert.device)
        .bind(alert.level.as_str())
        .bind(&alert.email)
        .bind(now_ms())
        .execute(&self.pool)
        .await
        .map_err(MonitorError::repository)?;
        Ok(())
    }
}

#[async_trait]
impl DeviceDirectory for SqliteStore {
    async fn list_device_statuses(&self, silent: bool) -> MonitorResult<DeviceStatusSnapshot> {
        let rows = sqlx::query("SELECT id, status FROM devices")
            .fetch_all(&self.pool)
            .await
            .map_err(MonitorError::repository)?;
        let mut snapshot = DeviceStatusSnapshot::new();
        for row in rows {
            let id: String = row.try_get("id").map_err(MonitorError::repository)?;
            let status: String = row.try_get("status").map_err(MonitorError::repository)?;
            snapshot.insert(id, status);
        }
        if silent {
            tracing::trace!(devices = snapshot.len(), "sqlite device list");
        } else {
            tracing::debug!(devices = snapshot.len(), "sqlite device list");
        }
        Ok(snapshot)
    }

    #[instrument(skip(self), fields(repo = "sqlite", operation = "set_device_status"))]
    async fn set_device_status(&self, device: &str, status: &str) -> MonitorResult<()> {
        sqlx::query(
            "INSERT INTO devices (id, status, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(id) DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at",
        )
        .bind(device)
        .bind(status)
        .bind(now_ms())
        .execute(&self.pool)
        .await
        .map_err(MonitorError::repository)?;
        Ok(())
    }
}
