//! Statistics store boundary.
//!
//! The engine never owns telemetry storage. It reads through
//! [`StatisticsStore`], which must hand back an internally consistent view
//! per call. [`InMemoryStore`] backs the CLI and tests with a JSON fleet
//! snapshot.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use dr_common::{DeviceId, Error, Metric, MetricSnapshot, MetricValues, Result, RiskState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::Device;

/// Read access to device telemetry.
///
/// Absence is reported as `None` or an empty collection, never as an error;
/// errors are reserved for genuine storage failures.
pub trait StatisticsStore {
    /// All device ids, in a stable store order.
    fn device_ids(&self) -> Result<Vec<DeviceId>>;

    /// Current metric values of a device; `None` if the device is unknown
    /// or has never reported.
    fn current_values(&self, device_id: &DeviceId) -> Result<Option<MetricValues>>;

    /// Every present current value of `metric` across the fleet.
    fn population_values(&self, metric: Metric) -> Result<Vec<f64>>;

    /// Up to `limit` snapshots of a device, most recent first.
    fn history(&self, device_id: &DeviceId, limit: usize) -> Result<Vec<MetricSnapshot>>;

    /// Current risk state; `None` if the device is unknown.
    fn risk_state(&self, device_id: &DeviceId) -> Result<Option<RiskState>>;
}

/// Serialized fleet: the on-disk form of an [`InMemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub devices: Vec<Device>,
}

impl FleetSnapshot {
    /// Load a fleet snapshot from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_json(&content)
    }

    /// Parse a fleet snapshot from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fleet held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    devices: Vec<Device>,
    index: HashMap<DeviceId, usize>,
}

impl InMemoryStore {
    /// Build a store, normalizing every history to most-recent-first.
    ///
    /// # Errors
    /// [`Error::Store`] if two devices share an id.
    pub fn new(devices: Vec<Device>) -> Result<Self> {
        let mut store = Self::default();
        for device in devices {
            store.insert(device)?;
        }
        Ok(store)
    }

    pub fn from_snapshot(snapshot: FleetSnapshot) -> Result<Self> {
        Self::new(snapshot.devices)
    }

    /// Load a store from a JSON fleet snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let store = Self::from_snapshot(FleetSnapshot::from_file(path)?)?;
        debug!(path = %path.display(), devices = store.len(), "loaded fleet snapshot");
        Ok(store)
    }

    /// Add a device.
    pub fn insert(&mut self, mut device: Device) -> Result<()> {
        if self.index.contains_key(&device.id) {
            return Err(Error::Store(format!("duplicate device id {}", device.id)));
        }
        device.sort_history();
        self.index.insert(device.id.clone(), self.devices.len());
        self.devices.push(device);
        Ok(())
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, device_id: &DeviceId) -> Option<&Device> {
        self.index.get(device_id).map(|&i| &self.devices[i])
    }

    pub fn device_mut(&mut self, device_id: &DeviceId) -> Option<&mut Device> {
        let i = *self.index.get(device_id)?;
        Some(&mut self.devices[i])
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Snapshot of the current fleet, stamped with `generated_at`.
    pub fn to_snapshot(&self, generated_at: DateTime<Utc>) -> FleetSnapshot {
        FleetSnapshot {
            generated_at: Some(generated_at),
            devices: self.devices.clone(),
        }
    }

    /// Write the fleet back to a JSON file.
    pub fn save(&self, path: &Path, generated_at: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_snapshot(generated_at))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl StatisticsStore for InMemoryStore {
    fn device_ids(&self) -> Result<Vec<DeviceId>> {
        Ok(self.devices.iter().map(|d| d.id.clone()).collect())
    }

    fn current_values(&self, device_id: &DeviceId) -> Result<Option<MetricValues>> {
        Ok(self.device(device_id).and_then(|d| d.metrics.clone()))
    }

    fn population_values(&self, metric: Metric) -> Result<Vec<f64>> {
        Ok(self
            .devices
            .iter()
            .filter_map(|d| d.metrics.as_ref().and_then(|m| m.get(metric)))
            .collect())
    }

    fn history(&self, device_id: &DeviceId, limit: usize) -> Result<Vec<MetricSnapshot>> {
        Ok(self
            .device(device_id)
            .map(|d| d.history.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn risk_state(&self, device_id: &DeviceId) -> Result<Option<RiskState>> {
        Ok(self.device(device_id).map(Device::risk_state))
    }
}
