//! Configuration loading and typed config structures for the engine.
//!
//! The canonical configuration lives in `ambience-config.yaml` at the
//! project root. This module defines strongly-typed structs mirroring the
//! YAML structure and a loader that reads, parses, and validates it. Every
//! field has a default, so an empty file (or no file at all) is a valid
//! configuration.
//!
//! The config is an explicit value handed to the [`Scheduler`]; nothing in
//! the engine reads it from global state.
//!
//! [`Scheduler`]: crate::scheduler::Scheduler

use std::collections::BTreeSet;
use std::path::Path;

use ambience_types::Extent;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its valid range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Spatial sampling settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Cooldown-driven ambient event settings.
    #[serde(default)]
    pub ambient_events: AmbientEventsConfig,

    /// Block particle effect settings.
    #[serde(default)]
    pub effects: EffectsConfig,

    /// Movement-derived trigger settings.
    #[serde(default)]
    pub footsteps: FootstepConfig,

    /// Logging settings (consumed by the host binary).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// An empty string yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scanner = &self.scanner;
        for (name, value) in [
            ("scanner.size_x", scanner.size_x),
            ("scanner.size_y", scanner.size_y),
            ("scanner.size_z", scanner.size_z),
            ("scanner.entity_size_x", scanner.entity_size_x),
            ("scanner.entity_size_y", scanner.entity_size_y),
            ("scanner.entity_size_z", scanner.entity_size_z),
            ("effects.size_x", self.effects.size_x),
            ("effects.size_y", self.effects.size_y),
            ("effects.size_z", self.effects.size_z),
        ] {
            if value == 0 {
                return Err(invalid(format!("{name} must be at least 1")));
            }
        }
        if scanner.interval == 0 {
            return Err(invalid("scanner.interval must be at least 1".to_owned()));
        }
        for (name, value) in [
            ("ambient_events.volume", self.ambient_events.volume),
            ("footsteps.volume", self.footsteps.volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if !(self.footsteps.stride.is_finite() && self.footsteps.stride > 0.0) {
            return Err(invalid(format!(
                "footsteps.stride must be positive, got {}",
                self.footsteps.stride
            )));
        }
        Ok(())
    }
}

const fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// Scanner region sizes and refresh interval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScannerConfig {
    /// Block region size along x.
    #[serde(default = "default_block_size_xz")]
    pub size_x: u32,

    /// Block region size along y.
    #[serde(default = "default_block_size_y")]
    pub size_y: u32,

    /// Block region size along z.
    #[serde(default = "default_block_size_xz")]
    pub size_z: u32,

    /// Ticks between two samples.
    #[serde(default = "default_scan_interval")]
    pub interval: u64,

    /// Entity region size along x.
    #[serde(default = "default_entity_size_xz")]
    pub entity_size_x: u32,

    /// Entity region size along y.
    #[serde(default = "default_entity_size_y")]
    pub entity_size_y: u32,

    /// Entity region size along z.
    #[serde(default = "default_entity_size_xz")]
    pub entity_size_z: u32,
}

impl ScannerConfig {
    /// Extent of the block sampling region.
    pub const fn block_extent(&self) -> Extent {
        Extent::new(self.size_x, self.size_y, self.size_z)
    }

    /// Extent of the entity sampling region.
    pub const fn entity_extent(&self) -> Extent {
        Extent::new(self.entity_size_x, self.entity_size_y, self.entity_size_z)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            size_x: default_block_size_xz(),
            size_y: default_block_size_y(),
            size_z: default_block_size_xz(),
            interval: default_scan_interval(),
            entity_size_x: default_entity_size_xz(),
            entity_size_y: default_entity_size_y(),
            entity_size_z: default_entity_size_xz(),
        }
    }
}

/// Ambient event policies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AmbientEventsConfig {
    /// Whether ambient events are evaluated at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Global volume multiplier for ambient event sounds.
    #[serde(default = "default_ambient_volume")]
    pub volume: f32,

    /// Stop a rule's sounds when one of its restrictions starts matching.
    ///
    /// Off by default: the stop is abrupt because hosts offer no fade-out.
    #[serde(default)]
    pub stop_sounds: bool,

    /// Let `variable_changed` conditions react to held item changes.
    #[serde(default = "default_true")]
    pub trigger_held_item_sounds: bool,

    /// Arm every event with a random cooldown when an actor joins, so
    /// nothing fires on the very first tick.
    #[serde(default)]
    pub prime_cooldowns_on_join: bool,

    /// Event ids that are never evaluated.
    #[serde(default)]
    pub disabled_events: BTreeSet<String>,
}

impl Default for AmbientEventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_ambient_volume(),
            stop_sounds: false,
            trigger_held_item_sounds: true,
            prime_cooldowns_on_join: false,
            disabled_events: BTreeSet::new(),
        }
    }
}

/// Block particle effect settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EffectsConfig {
    /// Whether block effects run.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Effect region size along x.
    #[serde(default = "default_effect_size_xz")]
    pub size_x: u32,

    /// Effect region size along y.
    #[serde(default = "default_effect_size_y")]
    pub size_y: u32,

    /// Effect region size along z.
    #[serde(default = "default_effect_size_xz")]
    pub size_z: u32,

    /// Random cells sampled per actor per tick.
    #[serde(default = "default_random_ticks")]
    pub random_ticks: u32,
}

impl EffectsConfig {
    /// Extent of the effect sampling region.
    pub const fn extent(&self) -> Extent {
        Extent::new(self.size_x, self.size_y, self.size_z)
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_x: default_effect_size_xz(),
            size_y: default_effect_size_y(),
            size_z: default_effect_size_xz(),
            random_ticks: default_random_ticks(),
        }
    }
}

/// Movement trigger settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FootstepConfig {
    /// Whether footstep, land, and jump triggers fire.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Volume multiplier for movement-triggered sounds.
    #[serde(default = "default_footstep_volume")]
    pub volume: f32,

    /// Horizontal blocks walked per footstep (doubled while sneaking).
    #[serde(default = "default_stride")]
    pub stride: f64,
}

impl Default for FootstepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_footstep_volume(),
            stride: default_stride(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is
    /// not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_block_size_xz() -> u32 {
    11
}

const fn default_block_size_y() -> u32 {
    9
}

const fn default_scan_interval() -> u64 {
    20
}

const fn default_entity_size_xz() -> u32 {
    33
}

const fn default_entity_size_y() -> u32 {
    17
}

const fn default_ambient_volume() -> f32 {
    0.4
}

const fn default_effect_size_xz() -> u32 {
    36
}

const fn default_effect_size_y() -> u32 {
    18
}

const fn default_random_ticks() -> u32 {
    384
}

const fn default_footstep_volume() -> f32 {
    0.3
}

const fn default_stride() -> f64 {
    1.6
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.block_extent(), Extent::new(11, 9, 11));
        assert_eq!(config.scanner.entity_extent(), Extent::new(33, 17, 33));
        assert_eq!(config.scanner.interval, 20);
        assert!(!config.ambient_events.stop_sounds);
        assert_eq!(config.effects.random_ticks, 384);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
scanner:
  size_x: 7
  size_y: 5
  size_z: 7
  interval: 10
  entity_size_x: 21
  entity_size_y: 9
  entity_size_z: 21

ambient_events:
  enabled: true
  volume: 0.8
  stop_sounds: true
  trigger_held_item_sounds: false
  prime_cooldowns_on_join: true
  disabled_events:
    - wind_high
    - wind_low

effects:
  enabled: false
  size_x: 16
  size_y: 8
  size_z: 16
  random_ticks: 64

footsteps:
  enabled: true
  volume: 0.5
  stride: 2.0

logging:
  level: "debug"
  json: true
"#;

        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.scanner.block_extent(), Extent::new(7, 5, 7));
        assert_eq!(config.scanner.interval, 10);
        assert!(config.ambient_events.stop_sounds);
        assert!(!config.ambient_events.trigger_held_item_sounds);
        assert!(config.ambient_events.disabled_events.contains("wind_low"));
        assert!(!config.effects.enabled);
        assert_eq!(config.effects.random_ticks, 64);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = EngineConfig::parse("scanner:\n  interval: 5\n").unwrap();
        assert_eq!(config.scanner.interval, 5);
        assert_eq!(config.scanner.size_x, 11);
        assert!(config.ambient_events.enabled);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = EngineConfig::parse("scanner:\n  interval: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_region_is_rejected() {
        let err = EngineConfig::parse("effects:\n  size_y: 0\n").unwrap_err();
        assert!(err.to_string().contains("effects.size_y"));
    }

    #[test]
    fn volume_out_of_range_is_rejected() {
        let err = EngineConfig::parse("ambient_events:\n  volume: 1.5\n").unwrap_err();
        assert!(err.to_string().contains("ambient_events.volume"));
    }

    #[test]
    fn non_positive_stride_is_rejected() {
        assert!(EngineConfig::parse("footsteps:\n  stride: 0.0\n").is_err());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = EngineConfig::parse("scanner: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("ambience-config.yaml");
        if path.exists() {
            let config = EngineConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
