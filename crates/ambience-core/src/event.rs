//! Cooldown-driven ambient sound rules.
//!
//! An [`AmbientEvent`] plays its sounds whenever its requirements hold, no
//! restriction vetoes, and its per-actor cooldown has run out. Each tick the
//! rule is evaluated:
//!
//! - **met**: decrement the cooldown (absent stays 0). At 0, emit every
//!   sound and re-arm with a uniform draw from `[min, max]`.
//! - **not met, stop policy on, restricted**: stop every sound and force
//!   the cooldown to 0.
//! - **otherwise**: leave the cooldown alone.
//!
//! A rule re-armed to `c` therefore stays silent for `c - 1` met ticks and
//! fires again on the `c`-th.

use ambience_types::Position;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::accessor::{Accessor, SoundCommand};
use crate::condition::{self, Condition, ConditionDefinition, EvalContext};
use crate::cooldown::CooldownTable;
use crate::error::RuleError;

// ---------------------------------------------------------------------------
// Sound emission
// ---------------------------------------------------------------------------

/// One sound a rule plays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoundEmission {
    /// Host sound identifier.
    pub sound: String,
    /// Volume before global scaling.
    #[serde(default = "default_unit")]
    pub volume: f32,
    /// Playback pitch.
    #[serde(default = "default_unit")]
    pub pitch: f32,
    /// Play without a position (heard everywhere).
    #[serde(default)]
    pub global: bool,
}

const fn default_unit() -> f32 {
    1.0
}

impl SoundEmission {
    /// Emission at full volume and normal pitch.
    pub fn new(sound: &str) -> Self {
        Self {
            sound: sound.to_owned(),
            volume: 1.0,
            pitch: 1.0,
            global: false,
        }
    }

    /// Send this sound to the accessor at `position`, scaling the volume.
    pub fn play(&self, accessor: &mut dyn Accessor, position: Position, volume_scale: f32) {
        let command = SoundCommand {
            sound: self.sound.clone(),
            position,
            volume: self.volume * volume_scale,
            pitch: self.pitch,
        };
        debug!(sound = %command.sound, volume = command.volume, global = self.global, "Play sound");
        if self.global {
            accessor.play_global_sound(&command);
        } else {
            accessor.play_sound(&command);
        }
    }
}

/// Validate a rule id and its sound list.
pub(crate) fn validate_sounds(
    id: Option<&str>,
    sounds: &[SoundEmission],
) -> Result<String, RuleError> {
    let id = id.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(RuleError::MissingId);
    }
    if sounds.is_empty() {
        return Err(RuleError::NoSounds { id: id.to_owned() });
    }
    if sounds.iter().any(|emission| emission.sound.trim().is_empty()) {
        return Err(RuleError::EmptySound { id: id.to_owned() });
    }
    Ok(id.to_owned())
}

/// Convert requirement and restriction lists, tagging errors with the rule id.
pub(crate) fn convert_conditions(
    id: &str,
    definitions: Vec<ConditionDefinition>,
) -> Result<Vec<Condition>, RuleError> {
    condition::convert_all(definitions).map_err(|source| RuleError::Condition {
        id: id.to_owned(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Cooldown range
// ---------------------------------------------------------------------------

/// Inclusive cooldown range in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRange {
    min: u32,
    max: u32,
}

impl CooldownRange {
    /// Validate a `[min, max]` pair.
    ///
    /// # Errors
    ///
    /// Fails if either bound is negative, does not fit in a `u32`, or
    /// `max < min`.
    pub fn new(id: &str, min: i64, max: i64) -> Result<Self, RuleError> {
        let lower = Self::bound(id, "minimum", min)?;
        let upper = Self::bound(id, "maximum", max)?;
        if upper < lower {
            return Err(RuleError::InvertedCooldown {
                id: id.to_owned(),
                min,
                max,
            });
        }
        Ok(Self {
            min: lower,
            max: upper,
        })
    }

    fn bound(id: &str, bound: &'static str, value: i64) -> Result<u32, RuleError> {
        if value < 0 {
            return Err(RuleError::NegativeCooldown {
                id: id.to_owned(),
                bound,
                value,
            });
        }
        u32::try_from(value).map_err(|_| RuleError::CooldownTooLarge {
            id: id.to_owned(),
            bound,
            value,
        })
    }

    /// Lower bound.
    pub const fn min(self) -> u32 {
        self.min
    }

    /// Upper bound.
    pub const fn max(self) -> u32 {
        self.max
    }

    /// Uniform draw from `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        rng.random_range(self.min..=self.max)
    }
}

// ---------------------------------------------------------------------------
// Ambient event
// ---------------------------------------------------------------------------

/// What one evaluation of an [`AmbientEvent`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Conditions met and the cooldown ran out: sounds were due and the
    /// rule re-armed.
    Triggered {
        /// The freshly drawn cooldown.
        cooldown: u32,
    },
    /// Conditions met but the cooldown is still running.
    Cooling {
        /// Ticks left after this tick's decrement.
        remaining: u32,
    },
    /// Restricted under the stop policy: sounds stopped, cooldown zeroed.
    Stopped,
    /// Nothing happened.
    Idle,
}

/// A cooldown-driven ambient sound rule.
#[derive(Debug, Clone)]
pub struct AmbientEvent {
    id: String,
    sounds: Vec<SoundEmission>,
    conditions: Vec<Condition>,
    restrictions: Vec<Condition>,
    cooldown: CooldownRange,
}

impl AmbientEvent {
    /// Build a validated rule.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank, no sound is given, a sound id is blank, or
    /// the cooldown range is invalid.
    pub fn new(
        id: &str,
        sounds: Vec<SoundEmission>,
        conditions: Vec<Condition>,
        restrictions: Vec<Condition>,
        cooldown_min: i64,
        cooldown_max: i64,
    ) -> Result<Self, RuleError> {
        let id = validate_sounds(Some(id), &sounds)?;
        let cooldown = CooldownRange::new(&id, cooldown_min, cooldown_max)?;
        Ok(Self {
            id,
            sounds,
            conditions,
            restrictions,
            cooldown,
        })
    }

    /// Rule id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sounds played on trigger.
    pub fn sounds(&self) -> &[SoundEmission] {
        &self.sounds
    }

    /// Cooldown range.
    pub const fn cooldown(&self) -> CooldownRange {
        self.cooldown
    }

    /// Advance this rule's cooldown state machine for one actor.
    ///
    /// Only the cooldown table changes here; the caller issues the play or
    /// stop commands the outcome asks for via [`play`](Self::play) and
    /// [`stop`](Self::stop).
    pub fn update<R: Rng + ?Sized>(
        &self,
        ctx: &EvalContext<'_>,
        cooldowns: &mut CooldownTable,
        rng: &mut R,
    ) -> EventOutcome {
        let stop_policy = ctx.config.ambient_events.stop_sounds;
        let required = condition::all_match(&self.conditions, ctx);
        let restricted = (required || stop_policy) && condition::any_match(&self.restrictions, ctx);

        if required && !restricted {
            let remaining = cooldowns.tick_down(&self.id);
            if remaining > 0 {
                return EventOutcome::Cooling { remaining };
            }
            let cooldown = self.cooldown.sample(rng);
            cooldowns.set(&self.id, cooldown);
            return EventOutcome::Triggered { cooldown };
        }

        if stop_policy && restricted {
            cooldowns.set(&self.id, 0);
            return EventOutcome::Stopped;
        }

        EventOutcome::Idle
    }

    /// Arm the rule with a fresh random cooldown.
    pub fn prime<R: Rng + ?Sized>(&self, cooldowns: &mut CooldownTable, rng: &mut R) -> u32 {
        let cooldown = self.cooldown.sample(rng);
        cooldowns.set(&self.id, cooldown);
        cooldown
    }

    /// Play every sound at `position`.
    pub fn play(&self, accessor: &mut dyn Accessor, position: Position, volume_scale: f32) {
        for emission in &self.sounds {
            emission.play(accessor, position, volume_scale);
        }
    }

    /// Stop every sound.
    pub fn stop(&self, accessor: &mut dyn Accessor) {
        for emission in &self.sounds {
            debug!(rule = %self.id, sound = %emission.sound, "Stop sound");
            accessor.stop_sound(&emission.sound);
        }
    }

    /// Drop memoized tags in every condition.
    pub fn invalidate_tag_caches(&mut self) {
        self.conditions
            .iter_mut()
            .chain(self.restrictions.iter_mut())
            .for_each(Condition::invalidate_tag_caches);
    }
}

/// Declarative form of an [`AmbientEvent`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleDefinition {
    /// Rule id; missing ids are rejected at conversion.
    #[serde(default)]
    pub id: Option<String>,
    /// Sounds to play.
    #[serde(default)]
    pub sounds: Vec<SoundEmission>,
    /// Requirements, all of which must hold.
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    /// Restrictions, any of which vetoes.
    #[serde(default)]
    pub restrictions: Vec<ConditionDefinition>,
    /// Minimum cooldown in ticks.
    #[serde(default)]
    pub cooldown_min: i64,
    /// Maximum cooldown in ticks.
    #[serde(default)]
    pub cooldown_max: i64,
}

impl TryFrom<RuleDefinition> for AmbientEvent {
    type Error = RuleError;

    fn try_from(definition: RuleDefinition) -> Result<Self, Self::Error> {
        let id = validate_sounds(definition.id.as_deref(), &definition.sounds)?;
        let conditions = convert_conditions(&id, definition.conditions)?;
        let restrictions = convert_conditions(&id, definition.restrictions)?;
        Self::new(
            &id,
            definition.sounds,
            conditions,
            restrictions,
            definition.cooldown_min,
            definition.cooldown_max,
        )
    }
}
