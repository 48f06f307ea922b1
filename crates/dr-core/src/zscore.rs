//! Z-score anomaly detection over the device fleet.
//!
//! Every score is taken against the fleet's *current* population statistics.
//! History records are re-scored against those same statistics, not against
//! the population as it was when the record was taken.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dr_common::{DeviceId, Metric, MetricValues, Result};
use dr_config::EngineConfig;
use dr_math::{mean, zscore, MathError, PopulationStats, Status};
use serde::Serialize;
use tracing::{debug, trace};

use crate::population::{PopulationSnapshot, PopulationStatistics};
use crate::store::StatisticsStore;

/// Score of one metric against its population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricScore {
    pub value: f64,
    pub population_mean: f64,
    pub population_std: f64,
    pub zscore: f64,
    pub status: Status,
}

impl MetricScore {
    fn new(value: f64, stats: &PopulationStats) -> Self {
        let score = zscore(value, stats.mean, stats.std_dev);
        Self {
            value,
            population_mean: stats.mean,
            population_std: stats.std_dev,
            zscore: score,
            status: Status::from_zscore(score),
        }
    }
}

/// Average of the retained per-metric scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreMean {
    pub zscore: f64,
    pub status: Status,
    /// Retained scores in metric order.
    pub component_scores: Vec<f64>,
    pub metric_count: usize,
}

impl ZScoreMean {
    /// `None` when no metric was retained.
    fn from_components(component_scores: Vec<f64>) -> Option<Self> {
        let score = mean(&component_scores)?;
        Some(Self {
            zscore: score,
            status: Status::from_zscore(score),
            metric_count: component_scores.len(),
            component_scores,
        })
    }
}

/// Per-device analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreResult {
    pub device_id: DeviceId,
    pub metrics: BTreeMap<Metric, MetricScore>,
    pub zscore_mean: Option<ZScoreMean>,
}

/// Metric that pushed a device over the anomaly threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyDetail {
    pub value: f64,
    pub zscore: f64,
    pub status: Status,
}

/// Device with at least one metric beyond the anomaly threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalousDevice {
    pub device_id: DeviceId,
    pub anomalous_metrics: BTreeMap<Metric, AnomalyDetail>,
}

/// One entry of a per-metric ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDevice {
    pub device_id: DeviceId,
    pub value: f64,
    pub zscore: f64,
    pub status: Status,
}

/// A historical snapshot re-scored against the current population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub metrics: BTreeMap<Metric, AnomalyDetail>,
}

/// `(value - mean) / std`, or 0 against a flat population.
pub fn single_zscore(value: f64, mean: f64, std_dev: f64) -> f64 {
    zscore(value, mean, std_dev)
}

/// Severity band of a score: `|z| <= 1` normal, `<= 2` warning,
/// `<= 3` critical, beyond that extreme.
pub fn status_from_zscore(score: f64) -> Status {
    Status::from_zscore(score)
}

/// Tracked metrics that both the device and the population have values for.
fn scored_metrics<'p>(
    tracked: &'p [Metric],
    values: &'p MetricValues,
    population: &'p PopulationSnapshot,
) -> impl Iterator<Item = (Metric, f64, &'p PopulationStats)> + 'p {
    tracked.iter().filter_map(move |&metric| {
        let value = values.get(metric)?;
        let stats = population.get(metric)?;
        Some((metric, value, stats))
    })
}

fn detail(value: f64, stats: &PopulationStats) -> AnomalyDetail {
    let score = zscore(value, stats.mean, stats.std_dev);
    AnomalyDetail {
        value,
        zscore: score,
        status: Status::from_zscore(score),
    }
}

/// Z-score analysis over a statistics store.
pub struct ZScoreEngine<'a, S: ?Sized> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: StatisticsStore + ?Sized> ZScoreEngine<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    fn population(&self) -> Result<PopulationSnapshot> {
        PopulationStatistics::new(self.store).snapshot(&self.config.tracked_metrics)
    }

    /// Score every tracked metric of a device.
    ///
    /// Returns `Ok(None)` when the device is unknown or has never reported.
    /// Metrics with no population statistics, and metrics the device does not
    /// report, are left out.
    pub fn analyze_device(&self, device_id: &DeviceId) -> Result<Option<ZScoreResult>> {
        let Some(values) = self.store.current_values(device_id)? else {
            debug!(%device_id, "no current metrics; nothing to analyze");
            return Ok(None);
        };
        let population = self.population()?;
        Ok(Some(self.score_device(device_id, &values, &population)))
    }

    fn score_device(
        &self,
        device_id: &DeviceId,
        values: &MetricValues,
        population: &PopulationSnapshot,
    ) -> ZScoreResult {
        let scored: Vec<(Metric, MetricScore)> =
            scored_metrics(&self.config.tracked_metrics, values, population)
                .map(|(metric, value, stats)| (metric, MetricScore::new(value, stats)))
                .collect();
        let zscore_mean =
            ZScoreMean::from_components(scored.iter().map(|(_, s)| s.zscore).collect());
        let metrics: BTreeMap<Metric, MetricScore> = scored.into_iter().collect();
        trace!(%device_id, retained = metrics.len(), "scored device");
        ZScoreResult {
            device_id: device_id.clone(),
            metrics,
            zscore_mean,
        }
    }

    /// Devices where any tracked metric has `|z|` strictly above `threshold`.
    ///
    /// The averaged score does not count. Devices are returned in store order.
    ///
    /// # Errors
    /// [`MathError::InvalidParameter`] (as an analytics error) for a negative
    /// or non-finite threshold.
    pub fn anomalous_devices(&self, threshold: f64) -> Result<Vec<AnomalousDevice>> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(MathError::InvalidParameter {
                name: "threshold",
                value: threshold,
                expected: "finite threshold >= 0",
            }
            .into());
        }
        let population = self.population()?;
        let mut anomalous = Vec::new();

        for device_id in self.store.device_ids()? {
            let Some(values) = self.store.current_values(&device_id)? else {
                continue;
            };
            let anomalous_metrics: BTreeMap<Metric, AnomalyDetail> =
                scored_metrics(&self.config.tracked_metrics, &values, &population)
                    .map(|(metric, value, stats)| (metric, detail(value, stats)))
                    .filter(|(_, d)| d.zscore.abs() > threshold)
                    .collect();
            if !anomalous_metrics.is_empty() {
                anomalous.push(AnomalousDevice {
                    device_id,
                    anomalous_metrics,
                });
            }
        }

        debug!(threshold, count = anomalous.len(), "anomaly scan complete");
        Ok(anomalous)
    }

    /// Anomalies at the configured threshold.
    pub fn anomalies(&self) -> Result<Vec<AnomalousDevice>> {
        self.anomalous_devices(self.config.anomaly_threshold)
    }

    /// Devices ranked per tracked metric by descending `|z|`.
    ///
    /// Every tracked metric is a key, empty when nothing could be scored.
    /// Ties keep store order.
    pub fn metric_rankings(&self) -> Result<BTreeMap<Metric, Vec<RankedDevice>>> {
        let population = self.population()?;
        let mut rankings: BTreeMap<Metric, Vec<RankedDevice>> = self
            .config
            .tracked_metrics
            .iter()
            .map(|m| (*m, Vec::new()))
            .collect();

        for device_id in self.store.device_ids()? {
            let Some(values) = self.store.current_values(&device_id)? else {
                continue;
            };
            for (metric, value, stats) in
                scored_metrics(&self.config.tracked_metrics, &values, &population)
            {
                if let Some(ranking) = rankings.get_mut(&metric) {
                    let scored = detail(value, stats);
                    ranking.push(RankedDevice {
                        device_id: device_id.clone(),
                        value,
                        zscore: scored.zscore,
                        status: scored.status,
                    });
                }
            }
        }

        for ranking in rankings.values_mut() {
            ranking.sort_by(|a, b| b.zscore.abs().total_cmp(&a.zscore.abs()));
        }
        Ok(rankings)
    }

    /// History of a device, most recent first, re-scored against the
    /// current population.
    ///
    /// `limit` defaults to the configured history limit. Metrics a record
    /// lacks, or that have no current population, are omitted from it.
    pub fn device_history(
        &self,
        device_id: &DeviceId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>> {
        let limit = limit.unwrap_or(self.config.history_limit);
        let snapshots = self.store.history(device_id, limit)?;
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }
        let population = self.population()?;

        Ok(snapshots
            .into_iter()
            .map(|snapshot| HistoryRecord {
                timestamp: snapshot.timestamp,
                metrics: scored_metrics(
                    &self.config.tracked_metrics,
                    &snapshot.values,
                    &population,
                )
                .map(|(metric, value, stats)| (metric, detail(value, stats)))
                .collect(),
            })
            .collect())
    }
}
