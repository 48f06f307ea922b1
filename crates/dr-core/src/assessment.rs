//! Per-device risk assessment pipeline.
//!
//! 1. Score the device against the fleet (z-scores).
//! 2. Map each retained score to a risk component `min(|z| / 3, 1)`.
//! 3. Smooth each tracked metric over the device's history with an EMA.
//! 4. Bound the components with the weighted sigmoid, and take their
//!    weighted composite.
//! 5. Decay the bounded risk by the hours since the newest observation.
//! 6. Feed the decayed risk, as the `anomaly_risk` factor, together with the
//!    caller's external factors into the risk state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dr_common::{AdminAction, DeviceId, Error, Metric, MetricSnapshot, Result};
use dr_config::EngineConfig;
use dr_math::{
    composite_risk_score, ema_series, sigmoid_modified, DecayedValue, CRITICAL_BAND,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::state_machine::{RiskStateMachine, RiskThresholds, Transition};
use crate::store::StatisticsStore;
use crate::zscore::{ZScoreEngine, ZScoreResult};

/// Factor name under which the decayed anomaly risk enters the state machine.
pub const ANOMALY_RISK_FACTOR: &str = "anomaly_risk";

/// Everything the pipeline derived for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceAssessment {
    pub device_id: DeviceId,
    pub analysis: ZScoreResult,
    /// Normalized `[0, 1]` risk per retained metric.
    pub risk_components: BTreeMap<Metric, f64>,
    /// EMA of each tracked metric over the device's history.
    pub smoothed_metrics: BTreeMap<Metric, f64>,
    /// Weighted sigmoid of the components; 0 when nothing was scored.
    pub risk_probability: f64,
    /// Weighted sum of the components.
    pub composite_score: f64,
    pub hours_since_last_observation: f64,
    pub decayed_risk: DecayedValue,
    pub transition: Transition,
}

/// Holt-Winters forecast of one metric of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricForecast {
    pub device_id: DeviceId,
    pub metric: Metric,
    pub observations: usize,
    pub season_length: usize,
    pub forecast: Vec<f64>,
}

/// Map a z-score to a risk component in `[0, 1]`, saturating at the
/// extreme band.
pub fn risk_component(zscore: f64) -> f64 {
    (zscore.abs() / CRITICAL_BAND).min(1.0)
}

fn hours_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - earlier).num_milliseconds() as f64 / 3_600_000.0;
    hours.max(0.0)
}

/// Oldest-to-newest series of one metric, skipping records that lack it.
fn metric_series(history: &[MetricSnapshot], metric: Metric) -> Vec<f64> {
    history
        .iter()
        .rev()
        .filter_map(|snapshot| snapshot.values.get(metric))
        .collect()
}

/// Risk assessment over a statistics store.
pub struct RiskAssessor<'a, S: ?Sized> {
    store: &'a S,
    config: &'a EngineConfig,
    machine: RiskStateMachine,
}

impl<'a, S: StatisticsStore + ?Sized> RiskAssessor<'a, S> {
    /// # Errors
    /// [`Error::InvalidThresholds`] if the configured state thresholds are invalid.
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Result<Self> {
        let thresholds = RiskThresholds::try_from(&config.state_thresholds)?;
        Ok(Self {
            store,
            config,
            machine: RiskStateMachine::new(thresholds),
        })
    }

    /// Run the full pipeline for one device.
    ///
    /// Returns `Ok(None)` for an unknown or never-reporting device. The
    /// computed transition is returned, not applied.
    ///
    /// # Errors
    /// [`Error::ReservedFactor`] if `external_factors` already contains
    /// `anomaly_risk`; analytics errors from the transforms.
    pub fn assess(
        &self,
        device_id: &DeviceId,
        admin_action: AdminAction,
        external_factors: &BTreeMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Result<Option<DeviceAssessment>> {
        if external_factors.contains_key(ANOMALY_RISK_FACTOR) {
            return Err(Error::ReservedFactor(ANOMALY_RISK_FACTOR.to_string()));
        }
        let Some(analysis) = ZScoreEngine::new(self.store, self.config).analyze_device(device_id)?
        else {
            return Ok(None);
        };

        let risk_components: BTreeMap<Metric, f64> = analysis
            .metrics
            .iter()
            .map(|(metric, score)| (*metric, risk_component(score.zscore)))
            .collect();

        let history = self.store.history(device_id, self.config.history_limit)?;
        let smoothed_metrics = self.smooth(&history)?;

        let (risk_probability, composite_score) = if risk_components.is_empty() {
            warn!(%device_id, "no analyzable metrics; risk probability left at 0");
            (0.0, 0.0)
        } else {
            let weights = self.config.weights_for(risk_components.keys());
            let sigmoid = &self.config.sigmoid;
            (
                sigmoid_modified(&risk_components, &weights, sigmoid.k, sigmoid.x0)?,
                composite_risk_score(&risk_components, &weights)?,
            )
        };

        let hours_since_last_observation = history
            .first()
            .map(|newest| hours_between(newest.timestamp, now))
            .unwrap_or(0.0);
        let decayed_risk = DecayedValue::new(
            risk_probability,
            self.config.decay.rate_per_hour,
            hours_since_last_observation,
        )?;

        let mut factors = external_factors.clone();
        factors.insert(ANOMALY_RISK_FACTOR.to_string(), decayed_risk.value);
        let current = self.store.risk_state(device_id)?.unwrap_or_default();
        let transition = self.machine.transition(current, admin_action, &factors)?;

        debug!(
            %device_id,
            risk_probability,
            decayed = decayed_risk.value,
            from = %transition.from_state(),
            to = %transition.to_state(),
            "assessed device"
        );

        Ok(Some(DeviceAssessment {
            device_id: device_id.clone(),
            analysis,
            risk_components,
            smoothed_metrics,
            risk_probability,
            composite_score,
            hours_since_last_observation,
            decayed_risk,
            transition,
        }))
    }

    /// Assess every device in store order, skipping devices with no metrics.
    pub fn assess_fleet(
        &self,
        admin_action: AdminAction,
        external_factors: &BTreeMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeviceAssessment>> {
        let mut assessments = Vec::new();
        for device_id in self.store.device_ids()? {
            if let Some(assessment) = self.assess(&device_id, admin_action, external_factors, now)? {
                assessments.push(assessment);
            }
        }
        Ok(assessments)
    }

    fn smooth(&self, history: &[MetricSnapshot]) -> Result<BTreeMap<Metric, f64>> {
        let mut smoothed = BTreeMap::new();
        for &metric in &self.config.tracked_metrics {
            let series = metric_series(history, metric);
            if let Some(value) = ema_series(&series, self.config.smoothing.ema_alpha)? {
                smoothed.insert(metric, value);
            }
        }
        Ok(smoothed)
    }

    /// Forecast `horizon` future values of a metric from the device's history.
    ///
    /// Returns `Ok(None)` for an unknown device.
    ///
    /// # Errors
    /// An analytics error when the history holds fewer than two seasons of
    /// the metric.
    pub fn forecast(
        &self,
        device_id: &DeviceId,
        metric: Metric,
        horizon: usize,
    ) -> Result<Option<MetricForecast>> {
        if self.store.risk_state(device_id)?.is_none() {
            return Ok(None);
        }
        let history = self.store.history(device_id, self.config.history_limit)?;
        let series = metric_series(&history, metric);
        let params = self.config.smoothing.holt_winters.params();
        let forecast = params.forecast(&series, horizon)?;
        Ok(Some(MetricForecast {
            device_id: device_id.clone(),
            metric,
            observations: series.len(),
            season_length: params.season_length,
            forecast,
        }))
    }
}
