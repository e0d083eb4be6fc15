// Raw measurement samples and the summarized history produced from them

use serde::{Deserialize, Serialize};

/// One raw sample as reported by a device or application.
/// `timestamp` is kept as the reported RFC 3339 string; parsing happens during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub timestamp: String,
    pub value: i64,
}

impl MeasurementRecord {
    pub fn new(timestamp: impl Into<String>, value: i64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// One summarized bucket: timestamp of the bucket's first record, reduced value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// Key generation rate samples of a device.
    Device,
    /// Key consumption counts of an application.
    App,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Device => "device",
            SubjectKind::App => "app",
        }
    }
}

/// Identifies whose raw records are stored or fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectKey {
    pub kind: SubjectKind,
    pub id: String,
}

impl SubjectKey {
    pub fn device(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Device,
            id: id.into(),
        }
    }

    pub fn app(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::App,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}
