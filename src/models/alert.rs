// Alert registrations and the views returned to the dashboard

use serde::{Deserialize, Serialize};

/// Severity chosen by the operator when registering an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 3] = [AlertLevel::Low, AlertLevel::Medium, AlertLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Low => "low",
            AlertLevel::Medium => "medium",
            AlertLevel::High => "high",
        }
    }

    /// Parse a level name (case-insensitive). Empty or unknown names yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(AlertLevel::Low),
            "medium" => Some(AlertLevel::Medium),
            "high" => Some(AlertLevel::High),
            _ => None,
        }
    }
}

/// A registered alert. `last_activated` is the alert's state: set while the
/// device is failed, cleared once it recovers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: String,
    pub device: String,
    pub level: AlertLevel,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activated: Option<String>,
}

impl AlertRecord {
    pub fn is_active(&self) -> bool {
        self.last_activated.is_some()
    }
}

/// Registration payload as received from callers; validated into an AlertRecord.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRegistration {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub email: String,
}

/// Alert configuration as persisted by the alert store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInfo {
    pub alert_levels: Vec<String>,
    pub alerts: Vec<AlertRecord>,
}

/// GET /api/alerts response: known devices plus the alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsOverview {
    pub devices: Vec<String>,
    pub alert_levels: Vec<String>,
    pub alerts: Vec<AlertRecord>,
}
