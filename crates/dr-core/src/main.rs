//! Device Risk Core - fleet anomaly analysis and risk assessment CLI.
//!
//! Reads an engine configuration and a JSON fleet snapshot, and prints
//! one JSON envelope (or short summary lines) per command on stdout.
//! Logs and errors go to stderr.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dr_common::error::format_error_human;
use dr_common::{
    AdminAction, DeviceId, Error, ErrorReport, Metric, OutputFormat, RiskState, SCHEMA_VERSION,
};
use dr_config::preset::list_presets;
use dr_config::{
    get_preset, load_config, validate_config, ConfigSource, EngineConfig, LoadedConfig,
    PresetName, ValidationError,
};
use dr_core::exit_codes::ExitCode;
use dr_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use dr_core::{
    InMemoryStore, PopulationStatistics, RiskAssessor, RiskStateMachine, RiskThresholds,
    StatisticsStore, ZScoreEngine,
};
use serde::Serialize;
use tracing::{debug, info};

/// Device Risk Core - fleet anomaly analysis and risk assessment
#[derive(Parser)]
#[command(name = "dr-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Engine configuration file (engine.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a built-in preset instead of a configuration file
    #[arg(long, global = true, conflicts_with = "config")]
    preset: Option<PresetName>,

    /// Fleet snapshot (JSON)
    #[arg(long, global = true, env = "DEVICE_RISK_FLEET")]
    fleet: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one device against the fleet
    Analyze {
        device: String,
    },

    /// List devices with any metric beyond the anomaly threshold
    Anomalies {
        /// Override the configured threshold (|z| strictly above it)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Rank devices per metric by |z|
    Rankings,

    /// Re-score a device's history against the current fleet
    History {
        device: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Forecast a device metric with Holt-Winters
    Forecast {
        device: String,

        metric: Metric,

        #[arg(long, default_value_t = 24)]
        horizon: usize,
    },

    /// Compute one risk state transition from explicit inputs
    Transition(TransitionArgs),

    /// Run the full risk assessment for one device or the whole fleet
    Assess(AssessArgs),

    /// Correlation between two metrics across the fleet
    Correlate {
        metric_a: Metric,
        metric_b: Metric,
    },

    /// Validate the engine configuration
    Check,

    /// Print the engine configuration JSON schema
    Schema,

    /// List built-in presets
    Presets,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct TransitionArgs {
    #[arg(long, default_value = "normal")]
    state: RiskState,

    #[arg(long, default_value = "none")]
    action: AdminAction,

    /// External risk factor as name=value (repeatable)
    #[arg(long = "factor", value_parser = parse_factor)]
    factors: Vec<(String, f64)>,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Device to assess (default: every device)
    device: Option<String>,

    #[arg(long, default_value = "none")]
    action: AdminAction,

    /// External risk factor as name=value (repeatable)
    #[arg(long = "factor", value_parser = parse_factor)]
    factors: Vec<(String, f64)>,

    /// Assessment time (RFC 3339); defaults to now
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Apply the computed transitions and write the fleet snapshot back
    #[arg(long)]
    save: bool,
}

fn parse_factor(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty factor name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number in '{s}'"))?;
    if !value.is_finite() {
        return Err(format!("factor {name} must be finite"));
    }
    Ok((name.to_string(), value))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else if cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose))
    } else {
        None
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let ctx = Context::new(&cli.global);
    debug!(run_id = %ctx.run_id, "starting");

    let exit_code = match &cli.command {
        Commands::Analyze { device } => ctx.execute("analyze", |ctx| run_analyze(ctx, device)),
        Commands::Anomalies { threshold } => {
            ctx.execute("anomalies", |ctx| run_anomalies(ctx, *threshold))
        }
        Commands::Rankings => ctx.execute("rankings", run_rankings),
        Commands::History { device, limit } => {
            ctx.execute("history", |ctx| run_history(ctx, device, *limit))
        }
        Commands::Forecast {
            device,
            metric,
            horizon,
        } => ctx.execute("forecast", |ctx| run_forecast(ctx, device, *metric, *horizon)),
        Commands::Transition(args) => ctx.execute("transition", |ctx| run_transition(ctx, args)),
        Commands::Assess(args) => ctx.execute("assess", |ctx| run_assess(ctx, args)),
        Commands::Correlate { metric_a, metric_b } => {
            ctx.execute("correlate", |ctx| run_correlate(ctx, *metric_a, *metric_b))
        }
        Commands::Check => ctx.execute("check", run_check),
        Commands::Schema => ctx.execute("schema", run_schema),
        Commands::Presets => ctx.execute("presets", run_presets),
        Commands::Version => ctx.execute("version", run_version),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command plumbing
// ============================================================================

/// Why a command failed.
enum CliError {
    /// Missing or inconsistent arguments.
    Usage(String),
    Engine(Error),
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Engine(e)
    }
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        CliError::Engine(e.into())
    }
}

/// Successful command result.
struct Outcome<T> {
    data: T,
    summary: Vec<String>,
    code: ExitCode,
}

impl<T> Outcome<T> {
    fn new(data: T, summary: Vec<String>) -> Self {
        Self {
            data,
            summary,
            code: ExitCode::Clean,
        }
    }

    fn with_code(mut self, code: ExitCode) -> Self {
        self.code = code;
        self
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    schema_version: &'static str,
    run_id: &'a str,
    generated_at: String,
    command: &'a str,
    exit_code: &'static str,
    data: T,
}

struct Context<'a> {
    global: &'a GlobalOpts,
    run_id: String,
}

impl<'a> Context<'a> {
    fn new(global: &'a GlobalOpts) -> Self {
        Self {
            global,
            run_id: generate_run_id(),
        }
    }

    fn load_config(&self) -> Result<LoadedConfig, CliError> {
        if let Some(preset) = self.global.preset {
            let config = get_preset(preset);
            validate_config(&config)?;
            return Ok(LoadedConfig {
                config,
                path: None,
                source: ConfigSource::Preset,
            });
        }
        let loaded = load_config(self.global.config.as_deref())?;
        debug!(source = %loaded.source, path = ?loaded.path, "engine config loaded");
        Ok(loaded)
    }

    fn config(&self) -> Result<EngineConfig, CliError> {
        Ok(self.load_config()?.config)
    }

    fn fleet_path(&self) -> Result<&'a PathBuf, CliError> {
        self.global.fleet.as_ref().ok_or_else(|| {
            CliError::Usage(
                "no fleet snapshot given; pass --fleet or set DEVICE_RISK_FLEET".to_string(),
            )
        })
    }

    fn fleet(&self) -> Result<InMemoryStore, CliError> {
        Ok(InMemoryStore::load(self.fleet_path()?)?)
    }

    fn execute<T, F>(&self, command: &str, run: F) -> ExitCode
    where
        T: Serialize,
        F: FnOnce(&Self) -> Result<Outcome<T>, CliError>,
    {
        match run(self) {
            Ok(outcome) => self.emit(command, outcome),
            Err(CliError::Usage(message)) => {
                eprintln!("error: {message}");
                ExitCode::ArgsError
            }
            Err(CliError::Engine(error)) => self.fail(command, &error),
        }
    }

    fn emit<T: Serialize>(&self, command: &str, outcome: Outcome<T>) -> ExitCode {
        match self.global.format {
            OutputFormat::Json => {
                let envelope = Envelope {
                    schema_version: SCHEMA_VERSION,
                    run_id: &self.run_id,
                    generated_at: Utc::now().to_rfc3339(),
                    command,
                    exit_code: outcome.code.code_name(),
                    data: outcome.data,
                };
                match serde_json::to_string_pretty(&envelope) {
                    Ok(json) => println!("{json}"),
                    Err(e) => return self.fail(command, &Error::Json(e)),
                }
            }
            OutputFormat::Summary => {
                for line in &outcome.summary {
                    println!("{line}");
                }
            }
        }
        outcome.code
    }

    fn fail(&self, command: &str, error: &Error) -> ExitCode {
        let code = ExitCode::from_error(error);
        match self.global.format {
            OutputFormat::Json => {
                let report = ErrorReport::from(error)
                    .with_context("command", command)
                    .with_context("run_id", &self.run_id)
                    .with_context("exit_code", code.code_name());
                eprintln!("{}", report.to_json());
            }
            OutputFormat::Summary => eprintln!("{}", format_error_human(error)),
        }
        code
    }
}

/// Factor map from repeated `--factor` flags. A name may appear once.
fn factor_map(pairs: &[(String, f64)]) -> Result<BTreeMap<String, f64>, CliError> {
    let mut factors = BTreeMap::new();
    for (name, value) in pairs {
        if factors.insert(name.clone(), *value).is_some() {
            return Err(CliError::Usage(format!("factor {name} given more than once")));
        }
    }
    Ok(factors)
}

fn fmt_z(z: f64) -> String {
    format!("{z:+.3}")
}

// ============================================================================
// Commands
// ============================================================================

fn run_analyze(ctx: &Context, device: &str) -> Result<Outcome<dr_core::ZScoreResult>, CliError> {
    let config = ctx.config()?;
    let store = ctx.fleet()?;
    let device_id = DeviceId::from(device);
    let engine = ZScoreEngine::new(&store, &config);
    let result = engine
        .analyze_device(&device_id)?
        .ok_or_else(|| Error::DeviceNotFound {
            device_id: device.to_string(),
        })?;

    let mut summary: Vec<String> = result
        .metrics
        .iter()
        .map(|(metric, s)| {
            format!(
                "{device_id} {metric}: value={} z={} {}",
                s.value,
                fmt_z(s.zscore),
                s.status
            )
        })
        .collect();
    if let Some(mean) = &result.zscore_mean {
        summary.push(format!(
            "{device_id} mean: z={} {} over {} metrics",
            fmt_z(mean.zscore),
            mean.status,
            mean.metric_count
        ));
    }

    let anomalous = result
        .metrics
        .values()
        .any(|s| s.zscore.abs() > config.anomaly_threshold);
    let code = if anomalous {
        ExitCode::AnomaliesFound
    } else {
        ExitCode::Clean
    };
    Ok(Outcome::new(result, summary).with_code(code))
}

#[derive(Serialize)]
struct AnomaliesData {
    threshold: f64,
    devices: Vec<dr_core::AnomalousDevice>,
}

fn run_anomalies(ctx: &Context, threshold: Option<f64>) -> Result<Outcome<AnomaliesData>, CliError> {
    let config = ctx.config()?;
    let store = ctx.fleet()?;
    let threshold = threshold.unwrap_or(config.anomaly_threshold);
    let devices = ZScoreEngine::new(&store, &config).anomalous_devices(threshold)?;

    let mut summary = Vec::new();
    for device in &devices {
        for (metric, detail) in &device.anomalous_metrics {
            summary.push(format!(
                "{} {metric}: value={} z={} {}",
                device.device_id,
                detail.value,
                fmt_z(detail.zscore),
                detail.status
            ));
        }
    }
    summary.push(format!(
        "{} anomalous device(s) at |z| > {threshold}",
        devices.len()
    ));

    let code = if devices.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::AnomaliesFound
    };
    Ok(Outcome::new(AnomaliesData { threshold, devices }, summary).with_code(code))
}

fn run_rankings(
    ctx: &Context,
) -> Result<Outcome<BTreeMap<Metric, Vec<dr_core::RankedDevice>>>, CliError> {
    let config = ctx.config()?;
    let store = ctx.fleet()?;
    let rankings = ZScoreEngine::new(&store, &config).metric_rankings()?;

    let summary = rankings
        .iter()
        .map(|(metric, ranked)| {
            let top: Vec<String> = ranked
                .iter()
                .take(5)
                .map(|r| format!("{}({})", r.device_id, fmt_z(r.zscore)))
                .collect();
            format!("{metric}: {}", top.join(" "))
        })
        .collect();
    Ok(Outcome::new(rankings, summary))
}

#[derive(Serialize)]
struct HistoryData {
    device_id: DeviceId,
    records: Vec<dr_core::HistoryRecord>,
}

fn run_history(
    ctx: &Context,
    device: &str,
    limit: Option<usize>,
) -> Result<Outcome<HistoryData>, CliError> {
    let config = ctx.config()?;
    let store = ctx.fleet()?;
    let device_id = DeviceId::from(device);
    if store.device(&device_id).is_none() {
        return Err(Error::DeviceNotFound {
            device_id: device.to_string(),
        }
        .into());
    }
    let records = ZScoreEngine::new(&store, &config).device_history(&device_id, limit)?;

    let summary = records
        .iter()
        .map(|r| {
            let metrics: Vec<String> = r
                .metrics
                .iter()
                .map(|(m, d)| format!("{m}={}", fmt_z(d.zscore)))
                .collect();
            format!("{} {}", r.timestamp.to_rfc3339(), metrics.join(" "))
        })
        .collect();
    Ok(Outcome::new(HistoryData { device_id, records }, summary))
}

fn run_forecast(
    ctx: &Context,
    device: &str,
    metric: Metric,
    horizon: usize,
) -> Result<Outcome<dr_core::MetricForecast>, CliError> {
    let config = ctx.config()?;
    let store = ctx.fleet()?;
    let device_id = DeviceId::from(device);
    let forecast = RiskAssessor::new(&store, &config)?
        .forecast(&device_id, metric, horizon)?
        .ok_or_else(|| Error::DeviceNotFound {
            device_id: device.to_string(),
        })?;

    let values: Vec<String> = forecast.forecast.iter().map(|v| format!("{v:.3}")).collect();
    let summary = vec![format!(
        "{device_id} {metric} (+{horizon}): {}",
        values.join(" ")
    )];
    Ok(Outcome::new(forecast, summary))
}

fn run_transition(
    ctx: &Context,
    args: &TransitionArgs,
) -> Result<Outcome<dr_core::Transition>, CliError> {
    let config = ctx.config()?;
    let machine = RiskStateMachine::new(RiskThresholds::try_from(&config.state_thresholds)?);
    let step = machine.transition(args.state, args.action, &factor_map(&args.factors)?)?;

    let summary = vec![format!(
        "{} -> {} (composite {:.3}, action {})",
        step.from_state(),
        step.to_state(),
        step.composite(),
        step.admin_action()
    )];
    let code = if step.to_state() == RiskState::Normal {
        ExitCode::Clean
    } else {
        ExitCode::AnomaliesFound
    };
    Ok(Outcome::new(step, summary).with_code(code))
}

#[derive(Serialize)]
struct AssessData {
    assessed_at: DateTime<Utc>,
    saved: bool,
    assessments: Vec<dr_core::DeviceAssessment>,
}

fn run_assess(ctx: &Context, args: &AssessArgs) -> Result<Outcome<AssessData>, CliError> {
    let config = ctx.config()?;
    let mut store = ctx.fleet()?;
    let now = args.now.unwrap_or_else(Utc::now);
    let factors = factor_map(&args.factors)?;

    let assessments = {
        let assessor = RiskAssessor::new(&store, &config)?;
        match &args.device {
            Some(device) => {
                let device_id = DeviceId::from(device.as_str());
                let assessment = assessor
                    .assess(&device_id, args.action, &factors, now)?
                    .ok_or_else(|| Error::DeviceNotFound {
                        device_id: device.clone(),
                    })?;
                vec![assessment]
            }
            None => assessor.assess_fleet(args.action, &factors, now)?,
        }
    };

    if args.save {
        for assessment in &assessments {
            let device = store
                .device_mut(&assessment.device_id)
                .ok_or_else(|| Error::DeviceNotFound {
                    device_id: assessment.device_id.to_string(),
                })?;
            if device.apply(&assessment.transition)? {
                info!(
                    device_id = %assessment.device_id,
                    from = %assessment.transition.from_state(),
                    to = %assessment.transition.to_state(),
                    "risk state changed"
                );
            }
        }
        store.save(ctx.fleet_path()?, now)?;
    }

    let summary = assessments
        .iter()
        .map(|a| {
            format!(
                "{}: risk={:.3} decayed={:.3} {} -> {}",
                a.device_id,
                a.risk_probability,
                a.decayed_risk.value,
                a.transition.from_state(),
                a.transition.to_state()
            )
        })
        .collect();
    let escalated = assessments
        .iter()
        .any(|a| a.transition.to_state() != RiskState::Normal);
    let code = if escalated {
        ExitCode::AnomaliesFound
    } else {
        ExitCode::Clean
    };
    let data = AssessData {
        assessed_at: now,
        saved: args.save,
        assessments,
    };
    Ok(Outcome::new(data, summary).with_code(code))
}

fn run_correlate(
    ctx: &Context,
    metric_a: Metric,
    metric_b: Metric,
) -> Result<Outcome<Option<dr_core::MetricCorrelation>>, CliError> {
    let store = ctx.fleet()?;
    let correlation = PopulationStatistics::new(&store).correlation(metric_a, metric_b)?;
    let summary = vec![match &correlation {
        Some(c) => format!(
            "{metric_a} ~ {metric_b}: pearson={:.3} mi={:.3} over {} devices",
            c.pearson, c.mutual_information, c.devices
        ),
        None => format!("{metric_a} ~ {metric_b}: fewer than two devices report both"),
    }];
    Ok(Outcome::new(correlation, summary))
}

#[derive(Serialize)]
struct CheckData {
    source: String,
    path: Option<PathBuf>,
    config: EngineConfig,
}

fn run_check(ctx: &Context) -> Result<Outcome<CheckData>, CliError> {
    let loaded = ctx.load_config()?;
    let source = match ctx.global.preset {
        Some(preset) => format!("preset {preset}"),
        None => loaded.source.to_string(),
    };
    let mut summary = vec![format!("config ok ({source})")];
    if let Some(path) = &loaded.path {
        summary.push(format!("path: {}", path.display()));
    }
    if let Some(fleet) = &ctx.global.fleet {
        let store = InMemoryStore::load(fleet)?;
        summary.push(format!("fleet ok: {} devices", store.device_ids()?.len()));
    }
    let data = CheckData {
        source,
        path: loaded.path,
        config: loaded.config,
    };
    Ok(Outcome::new(data, summary))
}

fn run_schema(_ctx: &Context) -> Result<Outcome<schemars::Schema>, CliError> {
    let schema = EngineConfig::json_schema();
    let summary = vec!["engine.json schema (use -f json to print it)".to_string()];
    Ok(Outcome::new(schema, summary))
}

#[derive(Serialize)]
struct PresetInfo {
    name: PresetName,
    description: &'static str,
}

fn run_presets(_ctx: &Context) -> Result<Outcome<Vec<PresetInfo>>, CliError> {
    let presets: Vec<PresetInfo> = list_presets()
        .into_iter()
        .map(|(name, description)| PresetInfo { name, description })
        .collect();
    let summary = presets
        .iter()
        .map(|p| format!("{:<10} {}", p.name.as_str(), p.description))
        .collect();
    Ok(Outcome::new(presets, summary))
}

#[derive(Serialize)]
struct VersionInfo {
    dr_core_version: &'static str,
    rust_version: &'static str,
}

fn run_version(_ctx: &Context) -> Result<Outcome<VersionInfo>, CliError> {
    let info = VersionInfo {
        dr_core_version: env!("CARGO_PKG_VERSION"),
        rust_version: env!("CARGO_PKG_RUST_VERSION"),
    };
    let summary = vec![
        format!("dr-core {}", info.dr_core_version),
        format!("schema version: {SCHEMA_VERSION}"),
    ];
    Ok(Outcome::new(info, summary))
}
