//! Sounds fired by discrete triggers instead of a cooldown.
//!
//! Hosts queue attack and use-item triggers through
//! [`Scheduler::trigger`](crate::scheduler::Scheduler::trigger); the
//! movement tracker queues footstep, land, and jump triggers itself. Every
//! queued trigger is matched against the registered [`TriggeredSound`]s on
//! the actor's next tick.

use ambience_types::{Position, Trigger};
use serde::Deserialize;

use crate::accessor::Accessor;
use crate::condition::{self, Condition, ConditionDefinition, EvalContext};
use crate::error::RuleError;
use crate::event::{SoundEmission, convert_conditions, validate_sounds};

/// A sound rule that reacts to one trigger.
#[derive(Debug, Clone)]
pub struct TriggeredSound {
    id: String,
    trigger: Trigger,
    sounds: Vec<SoundEmission>,
    conditions: Vec<Condition>,
    restrictions: Vec<Condition>,
}

impl TriggeredSound {
    /// Build a validated triggered sound.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank, no sound is given, or a sound id is blank.
    pub fn new(
        id: &str,
        trigger: Trigger,
        sounds: Vec<SoundEmission>,
        conditions: Vec<Condition>,
        restrictions: Vec<Condition>,
    ) -> Result<Self, RuleError> {
        let id = validate_sounds(Some(id), &sounds)?;
        Ok(Self {
            id,
            trigger,
            sounds,
            conditions,
            restrictions,
        })
    }

    /// Rule id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The trigger this rule reacts to.
    pub const fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Whether the rule fires for `trigger` in the current state.
    pub fn fires(&self, trigger: Trigger, ctx: &EvalContext<'_>) -> bool {
        self.trigger == trigger
            && condition::all_match(&self.conditions, ctx)
            && !condition::any_match(&self.restrictions, ctx)
    }

    /// Play every sound at `position`.
    pub fn play(&self, accessor: &mut dyn Accessor, position: Position, volume_scale: f32) {
        for emission in &self.sounds {
            emission.play(accessor, position, volume_scale);
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

/// Declarative form of a [`TriggeredSound`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriggeredSoundDefinition {
    /// Rule id; missing ids are rejected at conversion.
    #[serde(default)]
    pub id: Option<String>,
    /// The trigger to react to.
    pub trigger: Trigger,
    /// Sounds to play.
    #[serde(default)]
    pub sounds: Vec<SoundEmission>,
    /// Requirements, all of which must hold.
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    /// Restrictions, any of which vetoes.
    #[serde(default)]
    pub restrictions: Vec<ConditionDefinition>,
}

impl TryFrom<TriggeredSoundDefinition> for TriggeredSound {
    type Error = RuleError;

    fn try_from(definition: TriggeredSoundDefinition) -> Result<Self, Self::Error> {
        let id = validate_sounds(definition.id.as_deref(), &definition.sounds)?;
        let conditions = convert_conditions(&id, definition.conditions)?;
        let restrictions = convert_conditions(&id, definition.restrictions)?;
        Self::new(
            &id,
            definition.trigger,
            definition.sounds,
            conditions,
            restrictions,
        )
    }
}
