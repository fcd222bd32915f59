//! Core engine for the Ambience sound system.
//!
//! This crate decides, tick by tick, which ambient sounds, triggered sounds,
//! and block particles each tracked actor should get. It never talks to a
//! game directly: everything it knows about the world comes through an
//! [`Accessor`], and everything it wants to happen goes back out through
//! the same trait.
//!
//! # Modules
//!
//! - [`accessor`] -- The host capability trait and its command types
//! - [`stub`] -- Recording in-memory accessor for tests and headless hosts
//! - [`config`] -- YAML configuration with defaults and validation
//! - [`clock`] -- Engine tick counter and day-time windows
//! - [`scanner`] -- Cached block and entity counts around an actor
//! - [`variables`] -- Per-actor variable snapshot with change detection
//! - [`condition`] -- Predicates, tag matching, and their definitions
//! - [`cooldown`] -- Per-actor cooldown table
//! - [`event`] -- Cooldown-driven ambient sound rules
//! - [`trigger`] -- Sounds fired by discrete triggers
//! - [`effect`] -- Random-tick block particle effects
//! - [`movement`] -- Footstep, land, and jump derivation
//! - [`rules`] -- Rule set container and loader
//! - [`actor`] -- Per-actor state and tick pipeline
//! - [`arena`] -- Generation-checked actor storage
//! - [`scheduler`] -- The tick loop
//! - [`error`] -- Rule and scheduler error types

pub mod accessor;
pub mod actor;
pub mod arena;
pub mod clock;
pub mod condition;
pub mod config;
pub mod cooldown;
pub mod effect;
pub mod error;
pub mod event;
pub mod movement;
pub mod rules;
pub mod scanner;
pub mod scheduler;
pub mod stub;
pub mod trigger;
pub mod variables;

pub use accessor::{Accessor, AccessorError, ParticleCommand, SoundCommand};
pub use actor::{Actor, ActorTick};
pub use arena::ActorHandle;
pub use condition::{Condition, ConditionDefinition, EvalContext, TagMatcher};
pub use config::{ConfigError, EngineConfig};
pub use effect::{BlockEffect, BlockEffectDefinition};
pub use error::{ConditionError, RuleError, SchedulerError};
pub use event::{AmbientEvent, EventOutcome, RuleDefinition, SoundEmission};
pub use rules::{LoadReport, RuleSet, RuleSetDefinition, RulesFileError};
pub use scheduler::{Scheduler, TickSummary};
pub use stub::{AccessorCommand, CommandLog, StubAccessor};
pub use trigger::{TriggeredSound, TriggeredSoundDefinition};
pub use variables::{Variable, VariableSnapshot};
