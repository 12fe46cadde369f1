// # zonesyncd - zone reconciliation runner
//
// This binary is a thin integration layer over zonesync-core:
// 1. Reading configuration from environment variables and a zones file
// 2. Initializing logging and the runtime
// 3. Building the DNS provider
// 4. Running one reconciliation pass and reporting the outcome
//
// No DNS logic lives here.
//
// ## Configuration
//
// ### DNS Provider
// - `ZONESYNC_PROVIDER_API_TOKEN`: BinaryLane API token (required)
// - `ZONESYNC_API_URL`: API base URL override (optional)
//
// ### Zones
// - `ZONESYNC_ZONES_FILE`: JSON file with the desired zones, required for
//   `plan` and `apply`:
//
//   ```json
//   {
//     "zones": [
//       {"name": "example.com", "records": [
//         {"label": "www", "ttl": 600, "type": "A", "target": "192.0.2.10"},
//         {"label": "@", "ttl": 3600, "type": "MX", "preference": 10, "target": "mail.example.com."}
//       ]}
//     ],
//     "engine": {"report_unchanged": true}
//   }
//   ```
//
// ### Run
// - `ZONESYNC_MODE`: `plan` (default, nothing is changed), `apply` or `list-zones`
// - `ZONESYNC_ON_ERROR`: `continue` (default) or `abort`
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export ZONESYNC_PROVIDER_API_TOKEN=your_token
// export ZONESYNC_ZONES_FILE=/etc/zonesync/zones.json
// export ZONESYNC_MODE=apply
//
// zonesyncd
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::{EngineConfig, ExecutionPolicy, ProviderConfig, ZoneConfig, ZoneSyncConfig};
use zonesync_core::engine::{ReconcileEvent, ZoneReconciler};
use zonesync_core::traits::DnsProvider;

/// Exit codes for different termination scenarios
///
/// - 0: Every zone planned (and applied) cleanly
/// - 1: Configuration or startup error
/// - 2: A zone failed to plan or a correction failed
#[derive(Debug, Clone, Copy)]
enum ZoneSyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ZoneSyncExitCode> for ExitCode {
    fn from(code: ZoneSyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What a run does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Plan every zone and print the corrections
    Plan,
    /// Plan and execute
    Apply,
    /// Print the zones on the account
    ListZones,
}

impl Mode {
    fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "plan" | "dry-run" => Ok(Mode::Plan),
            "apply" => Ok(Mode::Apply),
            "list-zones" => Ok(Mode::ListZones),
            other => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not valid. Valid modes: plan, apply, list-zones",
                other
            ),
        }
    }
}

/// Application configuration
struct Config {
    mode: Mode,
    api_token: String,
    api_url: Option<String>,
    zones_file: Option<String>,
    on_error: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            mode: Mode::parse(&env::var("ZONESYNC_MODE").unwrap_or_else(|_| "plan".to_string()))?,
            api_token: env::var("ZONESYNC_PROVIDER_API_TOKEN").unwrap_or_default(),
            api_url: env::var("ZONESYNC_API_URL").ok().filter(|s| !s.is_empty()),
            zones_file: env::var("ZONESYNC_ZONES_FILE").ok().filter(|s| !s.is_empty()),
            on_error: env::var("ZONESYNC_ON_ERROR").unwrap_or_else(|_| "continue".to_string()),
            log_level: env::var("ZONESYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "ZONESYNC_PROVIDER_API_TOKEN is required. \
                Set it via: export ZONESYNC_PROVIDER_API_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "ZONESYNC_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from BinaryLane."
            );
        }

        if self.mode != Mode::ListZones && self.zones_file.is_none() {
            anyhow::bail!(
                "ZONESYNC_ZONES_FILE is required for plan and apply. \
                Set it via: export ZONESYNC_ZONES_FILE=/etc/zonesync/zones.json"
            );
        }

        self.execution_policy()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn execution_policy(&self) -> Result<ExecutionPolicy> {
        match self.on_error.to_lowercase().as_str() {
            "continue" => Ok(ExecutionPolicy::ContinueOnError),
            "abort" => Ok(ExecutionPolicy::AbortOnFirstError),
            other => anyhow::bail!(
                "ZONESYNC_ON_ERROR '{}' is not valid. Valid values: continue, abort",
                other
            ),
        }
    }

    fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::BinaryLane {
            api_token: self.api_token.clone(),
            base_url: self.api_url.clone(),
            min_ttl: None,
            nameserver_suffix: None,
        }
    }

    /// Build the full configuration from the environment and the zones file
    fn load_zonesync_config(&self) -> Result<ZoneSyncConfig> {
        let mut zones: Vec<ZoneConfig> = Vec::new();
        let mut engine = EngineConfig::default();

        if let Some(path) = &self.zones_file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read ZONESYNC_ZONES_FILE {}", path))?;
            let mut file: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path))?;

            let zones_value = file
                .get_mut("zones")
                .map(serde_json::Value::take)
                .unwrap_or_default();
            zones = serde_json::from_value(zones_value)
                .with_context(|| format!("Invalid \"zones\" in {}", path))?;

            if let Some(engine_value) = file.get_mut("engine").map(serde_json::Value::take)
                && !engine_value.is_null()
            {
                engine = serde_json::from_value(engine_value)
                    .with_context(|| format!("Invalid \"engine\" in {}", path))?;
            }
        }

        engine.dry_run = self.mode == Mode::Plan;
        engine.execution_policy = self.execution_policy()?;

        let config = ZoneSyncConfig {
            provider: self.provider_config(),
            zones,
            engine,
        };
        if self.mode != Mode::ListZones {
            config.validate()?;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    let zonesync_config = match config.load_zonesync_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    let provider = match build_provider(&zonesync_config) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create provider: {:#}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    info!(
        "Starting zonesyncd ({:?}, provider: {}, {} zone(s))",
        config.mode,
        provider.provider_name(),
        zonesync_config.zones.len()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZoneSyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        tokio::select! {
            result = run(config.mode, provider, zonesync_config) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, corrections already executed are not rolled back");
                Ok(false)
            }
        }
    });

    match result {
        Ok(true) => ZoneSyncExitCode::Success.into(),
        Ok(false) => ZoneSyncExitCode::RuntimeError.into(),
        Err(e) => {
            error!("Run failed: {:#}", e);
            ZoneSyncExitCode::RuntimeError.into()
        }
    }
}

#[cfg(feature = "binarylane")]
fn build_provider(config: &ZoneSyncConfig) -> Result<Box<dyn DnsProvider>> {
    let provider = zonesync_provider_binarylane::BinaryLaneProvider::from_config(
        &config.provider,
        &config.engine,
    )?;
    Ok(Box::new(provider))
}

#[cfg(not(feature = "binarylane"))]
fn build_provider(config: &ZoneSyncConfig) -> Result<Box<dyn DnsProvider>> {
    anyhow::bail!(
        "Provider '{}' is not compiled in. Rebuild with --features binarylane",
        config.provider.type_name()
    )
}

/// Run one pass
///
/// Returns `Ok(true)` if every zone converged (or planned cleanly in plan
/// mode), `Ok(false)` if any zone or correction failed.
async fn run(mode: Mode, provider: Box<dyn DnsProvider>, config: ZoneSyncConfig) -> Result<bool> {
    if mode == Mode::ListZones {
        let zones = provider.list_zones().await?;
        for zone in zones {
            let nameservers = provider.get_nameservers(&zone).await?;
            println!("{}\t{}", zone, nameservers.join(","));
        }
        return Ok(true);
    }

    let (reconciler, mut events) = ZoneReconciler::new(provider, config.engine.clone())?;

    // Drain events so the bounded channel never fills up
    let monitor = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ReconcileEvent::PlanFailed { zone, error } => {
                    debug!("event: zone {} failed to plan: {}", zone, error)
                }
                other => debug!("event: {:?}", other),
            }
        }
    });

    let results = reconciler.reconcile_all(&config.zones).await;
    drop(reconciler);
    if let Err(e) = monitor.await {
        warn!("Event monitor stopped abnormally: {}", e);
    }

    let mut ok = true;
    for (zone, result) in config.zones.iter().zip(results) {
        match result {
            Ok(report) if report.dry_run => {
                info!("Zone {}: {} change(s) planned, nothing applied", zone.name, report.planned);
            }
            Ok(report) if report.is_converged() => {
                info!("Zone {}: {} change(s) applied", zone.name, report.applied);
            }
            Ok(report) => {
                ok = false;
                error!(
                    "Zone {}: {} applied, {} failed, {} skipped",
                    zone.name,
                    report.applied,
                    report.failures.len(),
                    report.skipped
                );
                for failure in &report.failures {
                    error!("  {}", failure);
                }
            }
            Err(e) => {
                ok = false;
                error!("{}", e);
            }
        }
    }

    Ok(ok)
}
