// Store tests: in-memory and SQLite implementations of the collaborator traits

use mondash::error::MonitorError;
use mondash::models::{AlertLevel, AlertRecord, MeasurementRecord, SubjectKey, SubjectKind};
use mondash::repo::{
    AlertStore, Backend, DeviceDirectory, MemoryAlertStore, MemoryDeviceDirectory,
    MemoryRecordStore, RecordStore, SqliteStore,
};
use tempfile::TempDir;

fn alert(id: &str, device: &str) -> AlertRecord {
    AlertRecord {
        id: id.into(),
        device: device.into(),
        level: AlertLevel::Medium,
        email: "ops@example.org".into(),
        last_activated: None,
    }
}

async fn sqlite_store(dir: &TempDir) -> SqliteStore {
    let path = dir.path().join("mondash.db");
    let store = SqliteStore::connect(path.to_str().unwrap(), 2).await.unwrap();
    store.init().await.unwrap();
    store
}

async fn check_records(store: &dyn RecordStore) {
    let d1 = SubjectKey::device("d1");
    let app = SubjectKey::app("d1");
    assert!(store.fetch_raw_records(&d1).await.unwrap().is_empty());

    store
        .append_record(&d1, MeasurementRecord::new("2024-01-01T00:00:00Z", 5))
        .await
        .unwrap();
    store
        .append_record(&d1, MeasurementRecord::new("not-a-date", 7))
        .await
        .unwrap();
    store
        .append_record(&app, MeasurementRecord::new("2024-01-01T00:00:00Z", 1))
        .await
        .unwrap();

    let got = store.fetch_raw_records(&d1).await.unwrap();
    assert_eq!(
        got,
        vec![
            MeasurementRecord::new("2024-01-01T00:00:00Z", 5),
            MeasurementRecord::new("not-a-date", 7),
        ]
    );
    // Device and app subjects with the same id are kept apart.
    assert_eq!(store.fetch_raw_records(&app).await.unwrap().len(), 1);

    store
        .append_record(&SubjectKey::app("backup"), MeasurementRecord::new("2024-01-01T00:00:01Z", 2))
        .await
        .unwrap();
    assert_eq!(
        store.list_subjects(SubjectKind::App).await.unwrap(),
        vec!["backup", "d1"]
    );
    assert_eq!(store.list_subjects(SubjectKind::Device).await.unwrap(), vec!["d1"]);
}

async fn check_alerts(store: &dyn AlertStore) {
    let info = store.list_alerts().await.unwrap();
    assert_eq!(info.alert_levels, vec!["low", "medium", "high"]);
    assert!(info.alerts.is_empty());

    store.add_alert(&alert("a1", "d1")).await.unwrap();
    store.add_alert(&alert("a2", "d2")).await.unwrap();
    let err = store.add_alert(&alert("", "d3")).await.unwrap_err();
    assert!(matches!(err, MonitorError::InvalidAlert(_)));
    let err = store.add_alert(&alert("a1", "d1")).await.unwrap_err();
    assert!(matches!(err, MonitorError::Repository(_)));

    let ids: Vec<String> = store
        .list_alerts()
        .await
        .unwrap()
        .alerts
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
}

async fn check_devices(directory: &dyn DeviceDirectory) {
    assert!(directory.list_device_statuses(false).await.unwrap().is_empty());
    directory.set_device_status("d1", "online").await.unwrap();
    directory.set_device_status("d2", "down").await.unwrap();
    directory.set_device_status("d1", "offline").await.unwrap();

    let loud = directory.list_device_statuses(false).await.unwrap();
    let silent = directory.list_device_statuses(true).await.unwrap();
    assert_eq!(loud, silent);
    assert_eq!(loud.get("d1").map(String::as_str), Some("offline"));
    assert_eq!(loud.get("d2").map(String::as_str), Some("down"));
    assert_eq!(loud.len(), 2);
}

#[tokio::test]
async fn memory_record_store() {
    check_records(&MemoryRecordStore::new()).await;
}

#[tokio::test]
async fn memory_alert_store() {
    check_alerts(&MemoryAlertStore::new()).await;
}

#[tokio::test]
async fn memory_device_directory() {
    check_devices(&MemoryDeviceDirectory::new()).await;
}

#[tokio::test]
async fn sqlite_connect_and_init_twice() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    // Second init is no-op (IF NOT EXISTS)
    store.init().await.unwrap();
}

#[tokio::test]
async fn sqlite_record_store() {
    let dir = TempDir::new().unwrap();
    check_records(&sqlite_store(&dir).await).await;
}

#[tokio::test]
async fn sqlite_alert_store() {
    let dir = TempDir::new().unwrap();
    check_alerts(&sqlite_store(&dir).await).await;
}

#[tokio::test]
async fn sqlite_device_directory() {
    let dir = TempDir::new().unwrap();
    check_devices(&sqlite_store(&dir).await).await;
}

#[tokio::test]
async fn sqlite_data_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    {
        let store = sqlite_store(&dir).await;
        store.add_alert(&alert("a1", "d1")).await.unwrap();
        store.set_device_status("d1", "down").await.unwrap();
    }
    let store = sqlite_store(&dir).await;
    let info = store.list_alerts().await.unwrap();
    assert_eq!(info.alerts, vec![alert("a1", "d1")]);
    let statuses = store.list_device_statuses(true).await.unwrap();
    assert_eq!(statuses.get("d1").map(String::as_str), Some("down"));
}

#[tokio::test]
async fn sqlite_backend_shares_one_store() {
    let dir = TempDir::new().unwrap();
    let backend = Backend::sqlite(sqlite_store(&dir).await);
    backend.devices.set_device_status("d1", "online").await.unwrap();
    backend.alerts.add_alert(&alert("a1", "d1")).await.unwrap();
    assert_eq!(backend.alerts.list_alerts().await.unwrap().alerts.len(), 1);
    assert_eq!(
        backend.devices.list_device_statuses(false).await.unwrap().len(),
        1
    );
}
