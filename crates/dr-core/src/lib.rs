//! Device Risk core library.
//!
//! - Statistics store boundary and an in-memory fleet store
//! - Fleet population statistics and z-score anomaly analysis
//! - Risk state machine
//! - Per-device risk assessment pipeline and metric forecasting
//! - Logging setup and exit codes for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod assessment;
pub mod device;
pub mod exit_codes;
pub mod logging;
pub mod population;
pub mod state_machine;
pub mod store;
pub mod zscore;

pub use assessment::{DeviceAssessment, MetricForecast, RiskAssessor, ANOMALY_RISK_FACTOR};
pub use device::Device;
pub use population::{MetricCorrelation, PopulationSnapshot, PopulationStatistics};
pub use state_machine::{transition, RiskStateMachine, RiskThresholds, Transition};
pub use store::{FleetSnapshot, InMemoryStore, StatisticsStore};
pub use zscore::{
    AnomalousDevice, AnomalyDetail, HistoryRecord, MetricScore, RankedDevice, ZScoreEngine,
    ZScoreMean, ZScoreResult,
};
