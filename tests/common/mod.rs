// Shared test helpers: scriptable device directory and recording notification sink

#![allow(dead_code)]

use async_trait::async_trait;
use mondash::error::{MonitorError, MonitorResult};
use mondash::models::DeviceStatusSnapshot;
use mondash::notify::NotificationSink;
use mondash::repo::DeviceDirectory;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Directory whose statuses are set by the test; can be told to fail.
#[derive(Default)]
pub struct FakeDirectory {
    statuses: Mutex<DeviceStatusSnapshot>,
    failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, device: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(device.to_string(), status.to_string());
    }

    pub fn remove(&self, device: &str) {
        self.statuses.lock().unwrap().remove(device);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceDirectory for FakeDirectory {
    async fn list_device_statuses(&self, _silent: bool) -> MonitorResult<DeviceStatusSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MonitorError::repository(anyhow::anyhow!(
                "directory unreachable"
            )));
        }
        Ok(self.statuses.lock().unwrap().clone())
    }

    async fn set_device_status(&self, device: &str, status: &str) -> MonitorResult<()> {
        self.set(device, status);
        Ok(())
    }
}

/// Sink that records every attempt. Can fail or stall on demand.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn stalling(delay: Duration) -> Self {
        let sink = Self::default();
        *sink.delay.lock().unwrap() = Some(delay);
        sink
    }

    pub fn attempts(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MonitorResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MonitorError::Delivery("smtp refused".into()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
