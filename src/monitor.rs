// Alert monitor: in-memory alert state machine driven by periodic device scans.
//
// Every alert is either dormant (last_activated = None) or active. A scan moves
// dormant alerts of failed devices to active and sends one notification per
// transition; recovered devices return their alerts to dormant silently.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{MonitorError, MonitorResult};
use crate::models::{
    AlertInfo, AlertLevel, AlertRecord, AlertRegistration, AlertsOverview, is_failed_status,
};
use crate::notify::NotificationSink;
use crate::repo::{AlertStore, DeviceDirectory};
use crate::scheduler::PeriodicTask;

/// Nanosecond stamp of the last generated alert id; keeps generated ids unique.
static LAST_GENERATED_ID: AtomicI64 = AtomicI64::new(0);

fn generate_alert_id() -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let prev = LAST_GENERATED_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    format!("alert-{}", now.max(prev + 1))
}

/// What one scan changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Ids of alerts that went dormant -> active.
    pub activated: Vec<String>,
    /// Ids of alerts that went active -> dormant.
    pub recovered: Vec<String>,
    /// Notifications that failed or timed out.
    pub failed_notifications: usize,
}

pub struct AlertMonitor {
    alerts: Mutex<Vec<AlertRecord>>,
    store: Arc<dyn AlertStore>,
    directory: Arc<dyn DeviceDirectory>,
    sink: Arc<dyn NotificationSink>,
    notify_timeout: Duration,
}

impl AlertMonitor {
    pub fn new(
        store: Arc<dyn AlertStore>,
        directory: Arc<dyn DeviceDirectory>,
        sink: Arc<dyn NotificationSink>,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            store,
            directory,
            sink,
            notify_timeout,
        }
    }

    /// Replaces the in-memory alerts with the persisted ones. Returns how many were loaded.
    #[instrument(skip(self), fields(operation = "load_alerts"))]
    pub async fn load(&self) -> MonitorResult<usize> {
        let info = self.store.list_alerts().await?;
        let n = info.alerts.len();
        *self.alerts.lock().await = info.alerts;
        info!(alerts = n, "alerts loaded");
        Ok(n)
    }

    /// Persisted alert configuration (levels + alerts).
    pub async fn list(&self) -> MonitorResult<AlertInfo> {
        self.store.list_alerts().await
    }

    /// Copy of the in-memory alerts, including their activation state.
    pub async fn registered(&self) -> Vec<AlertRecord> {
        self.alerts.lock().await.clone()
    }

    #[instrument(skip(self, registration), fields(operation = "register_alert", device = %registration.device))]
    pub async fn register(&self, registration: AlertRegistration) -> MonitorResult<AlertRecord> {
        let alert = validate_registration(registration)?;
        self.store.add_alert(&alert).await?;
        self.alerts.lock().await.push(alert.clone());
        info!(alert_id = %alert.id, level = alert.level.as_str(), "alert registered");
        Ok(alert)
    }

    /// Alerts whose device currently reports a failed status. Does not change state.
    pub async fn active_alerts(&self) -> MonitorResult<Vec<AlertRecord>> {
        let statuses = self.directory.list_device_statuses(false).await?;
        let alerts = self.alerts.lock().await;
        Ok(alerts
            .iter()
            .filter(|a| statuses.get(&a.device).is_some_and(|s| is_failed_status(s)))
            .cloned()
            .collect())
    }

    /// Known devices together with the alert configuration.
    pub async fn overview(&self) -> MonitorResult<AlertsOverview> {
        let statuses = self.directory.list_device_statuses(false).await?;
        let info = self.store.list_alerts().await?;
        Ok(AlertsOverview {
            devices: statuses.into_keys().collect(),
            alert_levels: info.alert_levels,
            alerts: info.alerts,
        })
    }

    /// Advances every alert against a fresh status snapshot, then delivers the
    /// notifications for new activations. All transitions are applied before any
    /// delivery starts; delivery outcome never changes alert state.
    pub async fn scan(&self) -> MonitorResult<ScanReport> {
        let statuses = self.directory.list_device_statuses(true).await?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut report = ScanReport::default();
        let mut to_notify: Vec<AlertRecord> = Vec::new();

        {
            let mut alerts = self.alerts.lock().await;
            for alert in alerts.iter_mut() {
                let Some(status) = statuses.get(&alert.device) else {
                    continue;
                };
                if is_failed_status(status) {
                    if alert.last_activated.is_none() {
                        info!(alert_id = %alert.id, device = %alert.device, status = %status, "device is down");
                        alert.last_activated = Some(now.clone());
                        report.activated.push(alert.id.clone());
                        to_notify.push(alert.clone());
                    }
                } else if alert.last_activated.take().is_some() {
                    info!(alert_id = %alert.id, device = %alert.device, status = %status, "device recovered");
                    report.recovered.push(alert.id.clone());
                }
            }
        }

        report.failed_notifications = self.notify_all(&to_notify).await;
        Ok(report)
    }

    /// Sends all activation notifications concurrently, each bounded by notify_timeout.
    /// Returns the number of failed deliveries.
    async fn notify_all(&self, alerts: &[AlertRecord]) -> usize {
        let deliveries = alerts.iter().map(|alert| async move {
            let body = format!("device {} is down", alert.device);
            let outcome =
                tokio::time::timeout(self.notify_timeout, self.sink.send(&alert.email, "Device down", &body))
                    .await
                    .unwrap_or_else(|_| {
                        Err(MonitorError::Delivery(format!(
                            "timed out after {:?}",
                            self.notify_timeout
                        )))
                    });
            if let Err(e) = &outcome {
                warn!(
                    error = %e,
                    alert_id = %alert.id,
                    device = %alert.device,
                    sink = self.sink.name(),
                    "alert notification failed"
                );
            }
            outcome.is_err()
        });
        join_all(deliveries).await.into_iter().filter(|failed| *failed).count()
    }
}

/// Checks device and level, fills in a generated id when none was given.
fn validate_registration(r: AlertRegistration) -> MonitorResult<AlertRecord> {
    if r.device.trim().is_empty() {
        return Err(MonitorError::InvalidAlert("device must be non-empty".into()));
    }
    if r.level.trim().is_empty() {
        return Err(MonitorError::InvalidAlert("level must be non-empty".into()));
    }
    let level = AlertLevel::parse(&r.level)
        .ok_or_else(|| MonitorError::InvalidAlert(format!("unknown level {:?}", r.level)))?;
    let id = if r.id.trim().is_empty() {
        generate_alert_id()
    } else {
        r.id
    };
    Ok(AlertRecord {
        id,
        device: r.device,
        level,
        email: r.email,
        last_activated: None,
    })
}

#[async_trait]
impl PeriodicTask for AlertMonitor {
    fn name(&self) -> &'static str {
        "alert_scan"
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let report = self.scan().await?;
        if !report.activated.is_empty() || !report.recovered.is_empty() {
            tracing::debug!(
                activated = report.activated.len(),
                recovered = report.recovered.len(),
                failed_notifications = report.failed_notifications,
                "alert scan"
            );
        }
        Ok(())
    }
}
