// Device status and report models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::HistoryEntry;

/// Device id -> status string ("online", "offline", "down", ...). Rebuilt on every read.
pub type DeviceStatusSnapshot = BTreeMap<String, String>;

/// Statuses that put a device's alerts into the active state.
pub fn is_failed_status(status: &str) -> bool {
    matches!(status, "down" | "offline")
}

/// GET /api/devices entry: status plus summarized key-rate history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOverview {
    pub id: String,
    pub status: String,
    pub key_rate_history: Vec<HistoryEntry>,
    pub max_key_rate: i64,
    pub gen_rate: i64,
}

/// Periodic report pushed by a node for one of its devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub current_key_rate: i64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One application and its summarized key consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    pub name: String,
    pub key_consumption_history: Vec<HistoryEntry>,
}

/// Key consumption update pushed by an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUsage {
    pub name: String,
    #[serde(default)]
    pub number_of_keys: i64,
    #[serde(default)]
    pub timestamp: Option<String>,
}
