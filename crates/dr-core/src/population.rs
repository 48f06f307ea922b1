//! Fleet-wide population statistics per metric.

use std::collections::BTreeMap;

use dr_common::{Metric, Result};
use dr_math::{
    mutual_information, pearson_correlation, population_stats, zscore, PopulationStats, Status,
};
use serde::Serialize;
use tracing::warn;

use crate::store::StatisticsStore;

/// Population statistics over a store's current values.
pub struct PopulationStatistics<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: StatisticsStore + ?Sized> PopulationStatistics<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Mean and standard deviation of `metric` across the fleet.
    ///
    /// `None` when no device currently reports the metric: the metric is not
    /// analyzable, which callers skip rather than score against a zero mean.
    pub fn for_metric(&self, metric: Metric) -> Result<Option<PopulationStats>> {
        let values = self.store.population_values(metric)?;
        let stats = population_stats(&values);
        if stats.is_none() {
            warn!(%metric, "no population values; metric not analyzable");
        }
        Ok(stats)
    }

    /// Statistics for several metrics at once, read from one store pass per metric.
    pub fn snapshot(&self, metrics: &[Metric]) -> Result<PopulationSnapshot> {
        let mut stats = BTreeMap::new();
        for &metric in metrics {
            if let Some(s) = self.for_metric(metric)? {
                stats.insert(metric, s);
            }
        }
        Ok(PopulationSnapshot { stats })
    }

    /// Dependence between two metrics across devices reporting both.
    ///
    /// Pearson correlation over the raw values, and mutual information over
    /// the status bands each value falls in against its own population.
    /// `None` when fewer than two devices report both metrics.
    pub fn correlation(
        &self,
        metric_a: Metric,
        metric_b: Metric,
    ) -> Result<Option<MetricCorrelation>> {
        let mut a_values = Vec::new();
        let mut b_values = Vec::new();
        for device_id in self.store.device_ids()? {
            let Some(values) = self.store.current_values(&device_id)? else {
                continue;
            };
            if let (Some(a), Some(b)) = (values.get(metric_a), values.get(metric_b)) {
                a_values.push(a);
                b_values.push(b);
            }
        }
        if a_values.len() < 2 {
            return Ok(None);
        }
        let (Some(a_stats), Some(b_stats)) =
            (self.for_metric(metric_a)?, self.for_metric(metric_b)?)
        else {
            return Ok(None);
        };
        let bands = |values: &[f64], stats: &PopulationStats| -> Vec<Status> {
            values
                .iter()
                .map(|v| Status::from_zscore(zscore(*v, stats.mean, stats.std_dev)))
                .collect()
        };
        Ok(Some(MetricCorrelation {
            metric_a,
            metric_b,
            devices: a_values.len(),
            pearson: pearson_correlation(&a_values, &b_values)?,
            mutual_information: mutual_information(
                &bands(&a_values, &a_stats),
                &bands(&b_values, &b_stats),
            )?,
        }))
    }
}

/// Fleet-wide dependence between two metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCorrelation {
    pub metric_a: Metric,
    pub metric_b: Metric,
    /// Devices that report both metrics.
    pub devices: usize,
    pub pearson: f64,
    /// In nats, over status bands.
    pub mutual_information: f64,
}

/// Population statistics for a set of metrics, taken at one point in time.
///
/// Metrics with no population values are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PopulationSnapshot {
    stats: BTreeMap<Metric, PopulationStats>,
}

impl PopulationSnapshot {
    pub fn get(&self, metric: Metric) -> Option<&PopulationStats> {
        self.stats.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &PopulationStats)> {
        self.stats.iter().map(|(m, s)| (*m, s))
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
