// Storage collaborators behind narrow traits: raw records, alerts, device statuses.
// The backend (in-memory or SQLite) is chosen once at startup.

mod memory;
mod sqlite;

pub use memory::{MemoryAlertStore, MemoryDeviceDirectory, MemoryRecordStore};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{MonitorError, MonitorResult};
use crate::models::{
    AlertInfo, AlertRecord, DeviceStatusSnapshot, MeasurementRecord, SubjectKey, SubjectKind,
};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All raw records stored for the subject, in insertion order.
    async fn fetch_raw_records(&self, subject: &SubjectKey)
    -> MonitorResult<Vec<MeasurementRecord>>;

    async fn append_record(&self, subject: &SubjectKey, record: MeasurementRecord)
    -> MonitorResult<()>;

    /// Ids of every subject of `kind` with at least one record, sorted.
    async fn list_subjects(&self, kind: SubjectKind) -> MonitorResult<Vec<String>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn list_alerts(&self) -> MonitorResult<AlertInfo>;

    async fn add_alert(&self, alert: &AlertRecord) -> MonitorResult<()>;
}

#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Current status of every known device. `silent` only lowers log verbosity.
    async fn list_device_statuses(&self, silent: bool) -> MonitorResult<DeviceStatusSnapshot>;

    async fn set_device_status(&self, device: &str, status: &str) -> MonitorResult<()>;
}

/// Store-level validation shared by both backends.
pub(crate) fn validate_alert(alert: &AlertRecord) -> MonitorResult<()> {
    if alert.id.trim().is_empty() {
        return Err(MonitorError::InvalidAlert("id must be non-empty".into()));
    }
    if alert.device.trim().is_empty() {
        return Err(MonitorError::InvalidAlert("device must be non-empty".into()));
    }
    Ok(())
}

/// Level names offered to the dashboard.
pub(crate) fn default_alert_levels() -> Vec<String> {
    crate::models::AlertLevel::ALL
        .iter()
        .map(|l| l.as_str().to_string())
        .collect()
}

/// The three collaborators, resolved once from config.
#[derive(Clone)]
pub struct Backend {
    pub records: Arc<dyn RecordStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub devices: Arc<dyn DeviceDirectory>,
}

impl Backend {
    pub fn in_memory() -> Self {
        Self {
            records: Arc::new(MemoryRecordStore::new()),
            alerts: Arc::new(MemoryAlertStore::new()),
            devices: Arc::new(MemoryDeviceDirectory::new()),
        }
    }

    pub fn sqlite(store: SqliteStore) -> Self {
        let store = Arc::new(store);
        Self {
            records: store.clone(),
            alerts: store.clone(),
            devices: store,
        }
    }

    pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        match config.backend {
            StorageBackend::Memory => {
                tracing::info!(backend = "memory", "using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Sqlite => {
                let store = SqliteStore::connect(&config.path, config.max_pool_size).await?;
                store.init().await?;
                tracing::info!(backend = "sqlite", path = %config.path, "using SQLite storage");
                Ok(Self::sqlite(store))
            }
        }
    }
}
