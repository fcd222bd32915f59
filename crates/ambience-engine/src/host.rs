//! Settings for the host binary itself.
//!
//! These live in the `host` section of `ambience-config.yaml`, next to the
//! engine sections. The engine ignores the section; this module reads it on
//! its own so the core config stays free of host concerns.

use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// Tick pacing and simulated population.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Milliseconds between ticks (50 ms is 20 Hz).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of simulated actors.
    #[serde(default = "default_actors")]
    pub actors: u32,

    /// Seed of the simulated world. Actor `n` uses `world_seed + n`.
    #[serde(default = "default_world_seed")]
    pub world_seed: u64,

    /// Fixed seed for the engine's random cooldowns and effect sampling.
    /// `None` seeds from the operating system.
    #[serde(default)]
    pub engine_seed: Option<u64>,

    /// Stop after this many ticks. `None` runs until Ctrl-C.
    #[serde(default)]
    pub max_ticks: Option<u64>,

    /// Ticks between progress reports.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            actors: default_actors(),
            world_seed: default_world_seed(),
            engine_seed: None,
            max_ticks: None,
            report_interval: default_report_interval(),
        }
    }
}

impl HostConfig {
    /// Read the `host` section of a config file.
    ///
    /// A missing file or a file without the section yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Host {
            message: format!("failed to read config file: {e}"),
        })?;
        Self::parse(&contents)
    }

    /// Read the `host` section from YAML text.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Host {
            message: format!("failed to parse config YAML: {e}"),
        })?;
        let Some(section) = raw.get("host") else {
            return Ok(Self::default());
        };
        let config: Self =
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Host {
                message: format!("failed to parse host config: {e}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.tick_interval_ms == 0 {
            return Err(EngineError::Host {
                message: "host.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.report_interval == 0 {
            return Err(EngineError::Host {
                message: "host.report_interval must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// World seed for the actor at `index`.
    pub fn actor_seed(&self, index: u32) -> u64 {
        self.world_seed.wrapping_add(u64::from(index))
    }
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_actors() -> u32 {
    1
}

const fn default_world_seed() -> u64 {
    42
}

const fn default_report_interval() -> u64 {
    200
}
