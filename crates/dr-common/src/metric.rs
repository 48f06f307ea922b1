//! Metric identifiers and validated metric mappings.
//!
//! A device reports a value per [`Metric`]. A missing value is a missing
//! key, never `NaN` or 0: [`MetricValues`] refuses non-finite values at
//! construction and on deserialization, and a JSON `null` is read as absent.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Telemetry signal reported by a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CpuUsage,
    MemoryUsage,
    DiskUsage,
    VulnerabilityScore,
    NetworkUsage,
    Temperature,
}

impl Metric {
    /// Every known metric.
    pub const ALL: [Metric; 6] = [
        Metric::CpuUsage,
        Metric::MemoryUsage,
        Metric::DiskUsage,
        Metric::VulnerabilityScore,
        Metric::NetworkUsage,
        Metric::Temperature,
    ];

    /// Metrics tracked for anomaly detection unless configured otherwise.
    pub const CORE: [Metric; 4] = [
        Metric::CpuUsage,
        Metric::MemoryUsage,
        Metric::DiskUsage,
        Metric::VulnerabilityScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::CpuUsage => "cpu_usage",
            Metric::MemoryUsage => "memory_usage",
            Metric::DiskUsage => "disk_usage",
            Metric::VulnerabilityScore => "vulnerability_score",
            Metric::NetworkUsage => "network_usage",
            Metric::Temperature => "temperature",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == token)
            .ok_or_else(|| Error::UnknownMetric(s.to_string()))
    }
}

/// Mapping from metric to a finite value.
///
/// Absent metrics are absent keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Metric, Option<f64>>",
    into = "BTreeMap<Metric, f64>"
)]
pub struct MetricValues(BTreeMap<Metric, f64>);

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(metric, value)` pairs, rejecting non-finite values.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Metric, f64)>) -> Result<Self> {
        let mut values = Self::new();
        for (metric, value) in pairs {
            values.insert(metric, value)?;
        }
        Ok(values)
    }

    /// Insert a value, returning the previous one.
    ///
    /// # Errors
    /// [`Error::InvalidTelemetry`] if `value` is `NaN` or infinite.
    pub fn insert(&mut self, metric: Metric, value: f64) -> Result<Option<f64>> {
        if !value.is_finite() {
            return Err(Error::InvalidTelemetry {
                metric: metric.to_string(),
                value,
            });
        }
        Ok(self.0.insert(metric, value))
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.0.contains_key(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<Metric, f64> {
        &self.0
    }
}

impl TryFrom<BTreeMap<Metric, Option<f64>>> for MetricValues {
    type Error = Error;

    fn try_from(raw: BTreeMap<Metric, Option<f64>>) -> Result<Self> {
        Self::from_pairs(
            raw.into_iter()
                .filter_map(|(metric, value)| value.map(|v| (metric, v))),
        )
    }
}

impl From<MetricValues> for BTreeMap<Metric, f64> {
    fn from(values: MetricValues) -> Self {
        values.0
    }
}

/// Metric values observed at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub values: MetricValues,
}

impl MetricSnapshot {
    pub fn new(timestamp: DateTime<Utc>, values: MetricValues) -> Self {
        Self { timestamp, values }
    }
}
