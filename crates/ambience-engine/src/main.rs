//! Host binary for the Ambience sound engine.
//!
//! Wires the engine to a deterministic simulated world and drives it at a
//! fixed rate, so rule files can be exercised without a game. Sound and
//! particle commands are written to the log.
//!
//! # Startup Sequence
//!
//! 1. Load the engine and host configuration from `ambience-config.yaml`
//! 2. Initialize structured logging (tracing) from the `logging` section
//! 3. Load rules from `ambience-rules.yaml`
//! 4. Create the scheduler (seeded, the seed is logged) and register the
//!    rules
//! 5. Add one simulated actor per configured slot
//! 6. Run the tick loop until Ctrl-C or `host.max_ticks`
//! 7. Log the totals
//!
//! `AMBIENCE_CONFIG` and `AMBIENCE_RULES` override the two file paths.

mod error;
mod host;
mod world;

use std::path::{Path, PathBuf};
use std::time::Duration;

use ambience_core::config::LoggingConfig;
use ambience_core::{EngineConfig, RuleSetDefinition, Scheduler, TickSummary};
use ambience_types::ActorId;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::host::HostConfig;
use crate::world::SimulatedWorld;

/// Environment variable overriding the config file path.
const CONFIG_ENV: &str = "AMBIENCE_CONFIG";

/// Environment variable overriding the rules file path.
const RULES_ENV: &str = "AMBIENCE_RULES";

const DEFAULT_CONFIG_PATH: &str = "ambience-config.yaml";
const DEFAULT_RULES_PATH: &str = "ambience-rules.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or rule loading fails, or
/// if the scheduler reports an error mid-run.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = path_from_env(CONFIG_ENV, DEFAULT_CONFIG_PATH);
    let config = load_config(&config_path)?;
    let host = HostConfig::from_file(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("ambience-engine starting");
    info!(
        path = %config_path.display(),
        scan_interval = config.scanner.interval,
        stop_sounds = config.ambient_events.stop_sounds,
        effects = config.effects.enabled,
        footsteps = config.footsteps.enabled,
        tick_interval_ms = host.tick_interval_ms,
        actors = host.actors,
        "Configuration loaded"
    );

    // 3. Load rules.
    let rules_path = path_from_env(RULES_ENV, DEFAULT_RULES_PATH);
    let definitions = load_rules(&rules_path)?;

    // 4. Create the scheduler.
    let seed = host.engine_seed.unwrap_or_else(rand::random);
    let mut scheduler = Scheduler::with_seed(config, seed);
    info!(seed, "Scheduler created");
    let report = scheduler.load_rules(definitions);
    info!(
        path = %rules_path.display(),
        loaded = report.loaded,
        rejected = report.rejected.len(),
        "Rules loaded"
    );

    // 5. Add simulated actors.
    let mut actors = Vec::new();
    for index in 0..host.actors {
        let id = ActorId::new();
        let seed = host.actor_seed(index);
        scheduler.add_actor(id, Box::new(SimulatedWorld::new(format!("sim-{index}"), seed)))?;
        actors.push((id, seed));
    }

    // 6. Run the tick loop.
    let totals = run(&mut scheduler, &host, &actors).await?;

    // 7. Log results.
    info!(
        ticks = totals.ticks,
        events_triggered = totals.events_triggered,
        events_stopped = totals.events_stopped,
        triggered_sounds = totals.triggered_sounds,
        particles = totals.particles,
        "ambience-engine shutdown complete"
    );
    Ok(())
}

/// Running sums over every tick of a run.
#[derive(Debug, Default, Clone, Copy)]
struct RunTotals {
    ticks: u64,
    events_triggered: u64,
    events_stopped: u64,
    triggered_sounds: u64,
    particles: u64,
}

impl RunTotals {
    fn add(&mut self, summary: &TickSummary) {
        self.ticks = summary.tick;
        self.events_triggered = self
            .events_triggered
            .saturating_add(u64::from(summary.events_triggered));
        self.events_stopped = self
            .events_stopped
            .saturating_add(u64::from(summary.events_stopped));
        self.triggered_sounds = self
            .triggered_sounds
            .saturating_add(u64::from(summary.triggered_sounds));
        self.particles = self.particles.saturating_add(u64::from(summary.particles));
    }
}

/// Drive the scheduler at the configured rate until Ctrl-C or the tick
/// limit. Missed ticks are skipped rather than replayed in a burst.
async fn run(
    scheduler: &mut Scheduler,
    host: &HostConfig,
    actors: &[(ActorId, u64)],
) -> Result<RunTotals, EngineError> {
    let mut interval = tokio::time::interval(Duration::from_millis(host.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut totals = RunTotals::default();
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
                } else {
                    info!("Shutdown requested");
                }
                break;
            }
            _ = interval.tick() => {}
        }

        let next = scheduler.tick().saturating_add(1);
        for (id, seed) in actors {
            if let Some(trigger) = world::scripted_trigger(*seed, next) {
                scheduler.trigger(*id, trigger)?;
            }
        }

        let summary = scheduler.run_tick()?;
        totals.add(&summary);

        if summary.tick.checked_rem(host.report_interval) == Some(0) {
            info!(
                tick = summary.tick,
                actors = summary.actors_ticked,
                events_triggered = totals.events_triggered,
                triggered_sounds = totals.triggered_sounds,
                particles = totals.particles,
                "Progress"
            );
        }
        if host.max_ticks.is_some_and(|max| summary.tick >= max) {
            info!(tick = summary.tick, "Tick limit reached");
            break;
        }
    }
    Ok(totals)
}

/// Path from an environment variable, or the default.
fn path_from_env(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var).map_or_else(|| PathBuf::from(default), PathBuf::from)
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log filter: {e}"),
        })?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: format!("{e}"),
    })
}

/// Load the engine configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path) -> Result<EngineConfig, EngineError> {
    if path.exists() {
        Ok(EngineConfig::from_file(path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

/// Load rule definitions, starting with none when the file does not exist.
fn load_rules(path: &Path) -> Result<RuleSetDefinition, EngineError> {
    if path.exists() {
        Ok(RuleSetDefinition::from_file(path)?)
    } else {
        info!(path = %path.display(), "Rules file not found, starting with no rules");
        Ok(RuleSetDefinition::default())
    }
}
