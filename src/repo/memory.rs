// In-memory implementations, used for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AlertStore, DeviceDirectory, RecordStore, default_alert_levels, validate_alert};
use crate::error::{MonitorError, MonitorResult};
use crate::models::{
    AlertInfo, AlertRecord, DeviceStatusSnapshot, MeasurementRecord, SubjectKey, SubjectKind,
};

#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<SubjectKey, Vec<MeasurementRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_raw_records(
        &self,
        subject: &SubjectKey,
    ) -> MonitorResult<Vec<MeasurementRecord>> {
        let r = self.records.read().await;
        Ok(r.get(subject).cloned().unwrap_or_default())
    }

    async fn append_record(
        &self,
        subject: &SubjectKey,
        record: MeasurementRecord,
    ) -> MonitorResult<()> {
        let mut w = self.records.write().await;
        w.entry(subject.clone()).or_default().push(record);
        Ok(())
    }

    async fn list_subjects(&self, kind: SubjectKind) -> MonitorResult<Vec<String>> {
        let r = self.records.read().await;
        let mut ids: Vec<String> = r
            .keys()
            .filter(|k| k.kind == kind)
            .map(|k| k.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

pub struct MemoryAlertStore {
    data: RwLock<AlertInfo>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::with_alerts(Vec::new())
    }

    /// Store pre-seeded with alerts (e.g. one per known device).
    pub fn with_alerts(alerts: Vec<AlertRecord>) -> Self {
        Self {
            data: RwLock::new(AlertInfo {
                alert_levels: default_alert_levels(),
                alerts,
            }),
        }
    }
}

impl Default for MemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn list_alerts(&self) -> MonitorResult<AlertInfo> {
        Ok(self.data.read().await.clone())
    }

    async fn add_alert(&self, alert: &AlertRecord) -> MonitorResult<()> {
        validate_alert(alert)?;
        let mut w = self.data.write().await;
        if w.alerts.iter().any(|a| a.id == alert.id) {
            return Err(MonitorError::repository(anyhow::anyhow!(
                "alert {} already exists",
                alert.id
            )));
        }
        let mut stored = alert.clone();
        stored.last_activated = None;
        w.alerts.push(stored);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDeviceDirectory {
    statuses: RwLock<DeviceStatusSnapshot>,
}

impl MemoryDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceDirectory for MemoryDeviceDirectory {
    async fn list_device_statuses(&self, silent: bool) -> MonitorResult<DeviceStatusSnapshot> {
        let snapshot = self.statuses.read().await.clone();
        if silent {
            tracing::trace!(devices = snapshot.len(), "memory device list");
        } else {
            tracing::debug!(devices = snapshot.len(), "memory device list");
        }
        Ok(snapshot)
    }

    async fn set_device_status(&self, device: &str, status: &str) -> MonitorResult<()> {
        self.statuses
            .write()
            .await
            .insert(device.to_string(), status.to_string());
        Ok(())
    }
}
