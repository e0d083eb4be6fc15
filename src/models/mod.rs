// Domain models shared by the aggregator, the alert monitor and the HTTP layer

mod alert;
mod device;
mod measurement;

pub use alert::{AlertInfo, AlertLevel, AlertRecord, AlertRegistration, AlertsOverview};
pub use device::{
    AppSummary, AppUsage, DeviceOverview, DeviceStatusSnapshot, NodeReport,
    is_failed_status,
};
pub use measurement::{HistoryEntry, MeasurementRecord, SubjectKey, SubjectKind};
