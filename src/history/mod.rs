// Dashboard history: feeds raw records from the record store through the
// aggregator, and records incoming node / app reports.

pub mod aggregation;

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{MonitorError, MonitorResult};
use crate::models::{
    AppSummary, AppUsage, DeviceOverview, HistoryEntry, MeasurementRecord, NodeReport, SubjectKey,
    SubjectKind,
};
use crate::repo::{DeviceDirectory, RecordStore};
use aggregation::{Reducer, aggregate, parse_timestamp};

/// Entries returned for app consumption history when the caller gives no positive limit.
pub const DEFAULT_CONSUMPTION_LIMIT: usize = 10;

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Empty or missing bounds are open; anything else must be RFC 3339.
fn parse_bound(
    name: &str,
    bound: Option<&str>,
) -> MonitorResult<Option<chrono::DateTime<chrono::FixedOffset>>> {
    match bound.map(str::trim).filter(|b| !b.is_empty()) {
        None => Ok(None),
        Some(b) => parse_timestamp(b).map(Some).ok_or_else(|| {
            MonitorError::InvalidQuery(format!("{} is not an RFC 3339 timestamp: {:?}", name, b))
        }),
    }
}

pub struct HistoryService {
    records: Arc<dyn RecordStore>,
    devices: Arc<dyn DeviceDirectory>,
}

impl HistoryService {
    pub fn new(records: Arc<dyn RecordStore>, devices: Arc<dyn DeviceDirectory>) -> Self {
        Self { records, devices }
    }

    /// Summarized key-rate history of a device. Zero-rate samples are ignored.
    pub async fn key_rate_history(
        &self,
        device: &str,
        limit: usize,
    ) -> MonitorResult<Vec<HistoryEntry>> {
        let mut records = self
            .records
            .fetch_raw_records(&SubjectKey::device(device))
            .await?;
        records.retain(|r| r.value != 0);
        Ok(aggregate(&records, limit, Reducer::Rate))
    }

    /// Summarized key consumption of an application. `limit <= 0` means the default.
    pub async fn key_consumption_history(
        &self,
        app: &str,
        limit: i64,
    ) -> MonitorResult<Vec<HistoryEntry>> {
        let limit = if limit > 0 {
            limit as usize
        } else {
            DEFAULT_CONSUMPTION_LIMIT
        };
        let records = self.records.fetch_raw_records(&SubjectKey::app(app)).await?;
        Ok(aggregate(&records, limit, Reducer::Count))
    }

    /// Every application with recorded usage and its default-length consumption history.
    #[instrument(skip(self), fields(operation = "list_apps"))]
    pub async fn list_apps(&self) -> MonitorResult<Vec<AppSummary>> {
        let names = self.records.list_subjects(SubjectKind::App).await?;
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let history = self.key_consumption_history(&name, 0).await?;
            out.push(AppSummary {
                name,
                key_consumption_history: history,
            });
        }
        Ok(out)
    }

    /// Full consumption history of every application, restricted to records inside
    /// `[start, end]` (both inclusive, either optional) before bucketing.
    #[instrument(skip(self), fields(operation = "app_timeline"))]
    pub async fn app_timeline(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> MonitorResult<Vec<AppSummary>> {
        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;
        let names = self.records.list_subjects(SubjectKind::App).await?;
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let mut records = self.records.fetch_raw_records(&SubjectKey::app(&name)).await?;
            records.retain(|r| {
                parse_timestamp(&r.timestamp).is_some_and(|ts| {
                    start.is_none_or(|s| ts >= s) && end.is_none_or(|e| ts <= e)
                })
            });
            out.push(AppSummary {
                name,
                key_consumption_history: aggregate(&records, 0, Reducer::Count),
            });
        }
        Ok(out)
    }

    /// Status and key-rate summary of every known device.
    #[instrument(skip(self), fields(operation = "device_overview"))]
    pub async fn device_overview(&self, limit: usize) -> MonitorResult<Vec<DeviceOverview>> {
        let statuses = self.devices.list_device_statuses(false).await?;
        let mut out = Vec::with_capacity(statuses.len());
        for (id, status) in statuses {
            let history = match self.key_rate_history(&id, limit).await {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(error = %e, device = %id, "key rate history failed");
                    Vec::new()
                }
            };
            let max_key_rate = history.iter().map(|e| e.value).max().unwrap_or(0);
            let gen_rate = history.last().map(|e| e.value).unwrap_or(0);
            out.push(DeviceOverview {
                id,
                status,
                key_rate_history: history,
                max_key_rate,
                gen_rate,
            });
        }
        Ok(out)
    }

    /// Stores one key-rate sample per report and updates the reporting device's status.
    #[instrument(skip(self, reports), fields(operation = "record_node_reports", reports = reports.len()))]
    pub async fn record_node_reports(&self, reports: Vec<NodeReport>) -> MonitorResult<()> {
        let now = now_rfc3339();
        for report in reports {
            if report.name.trim().is_empty() {
                return Err(MonitorError::InvalidReport(
                    "node report name must be non-empty".into(),
                ));
            }
            let timestamp = report
                .timestamp
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| now.clone());
            self.records
                .append_record(
                    &SubjectKey::device(&report.name),
                    MeasurementRecord::new(timestamp, report.current_key_rate),
                )
                .await?;
            if !report.status.is_empty() {
                self.devices
                    .set_device_status(&report.name, &report.status)
                    .await?;
            }
        }
        Ok(())
    }

    /// Stores one key consumption sample for an application.
    pub async fn record_app_usage(&self, usage: AppUsage) -> MonitorResult<()> {
        if usage.name.trim().is_empty() {
            return Err(MonitorError::InvalidReport("app name must be non-empty".into()));
        }
        let timestamp = usage
            .timestamp
            .filter(|t| !t.is_empty())
            .unwrap_or_else(now_rfc3339);
        self.records
            .append_record(
                &SubjectKey::app(&usage.name),
                MeasurementRecord::new(timestamp, usage.number_of_keys),
            )
            .await
    }
}
