//! Per-actor state and the per-actor half of a tick.
//!
//! An [`Actor`] owns everything the engine keeps for one tracked entity:
//! its accessor, scanner cache, variable snapshot, movement tracker,
//! cooldown table, and pending trigger queue. Nothing here is shared
//! between actors; the rule set is passed in read-only.

use std::collections::VecDeque;

use ambience_types::{ActorId, Region, Trigger};
use rand::Rng;
use tracing::{debug, trace};

use crate::accessor::Accessor;
use crate::condition::EvalContext;
use crate::config::EngineConfig;
use crate::cooldown::CooldownTable;
use crate::effect::random_cell;
use crate::event::EventOutcome;
use crate::movement::Movement;
use crate::rules::RuleSet;
use crate::scanner::Scanner;
use crate::trigger::TriggeredSound;
use crate::variables::VariableSnapshot;

/// Counts of what one actor did in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorTick {
    /// Ambient events that played their sounds.
    pub events_triggered: u32,
    /// Ambient events stopped under the stop policy.
    pub events_stopped: u32,
    /// Triggered sounds that played.
    pub triggered_sounds: u32,
    /// Particles spawned by block effects.
    pub particles: u32,
}

/// One tracked entity.
pub struct Actor {
    id: ActorId,
    accessor: Box<dyn Accessor>,
    scanner: Scanner,
    variables: VariableSnapshot,
    movement: Movement,
    cooldowns: CooldownTable,
    pending: VecDeque<Trigger>,
}

impl core::fmt::Debug for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("cooldowns", &self.cooldowns)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Actor {
    /// Create an actor with empty caches.
    pub fn new(id: ActorId, accessor: Box<dyn Accessor>, config: &EngineConfig) -> Self {
        Self {
            id,
            accessor,
            scanner: Scanner::new(&config.scanner),
            variables: VariableSnapshot::new(),
            movement: Movement::new(),
            cooldowns: CooldownTable::new(),
            pending: VecDeque::new(),
        }
    }

    /// The actor's id.
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// The actor's accessor.
    pub fn accessor(&self) -> &dyn Accessor {
        &*self.accessor
    }

    /// Cached scan results.
    pub const fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Current and previous variable values.
    pub const fn variables(&self) -> &VariableSnapshot {
        &self.variables
    }

    /// Remaining cooldowns.
    pub const fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    /// Mutable cooldowns, for priming and rule reloads.
    pub const fn cooldowns_mut(&mut self) -> &mut CooldownTable {
        &mut self.cooldowns
    }

    /// Triggers waiting for the next tick.
    pub fn pending_triggers(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.pending.iter().copied()
    }

    /// Queue a trigger for the next tick.
    pub fn push_trigger(&mut self, trigger: Trigger) {
        self.pending.push_back(trigger);
    }

    /// Evaluation context over this actor's cached state.
    pub fn context<'a>(&'a self, config: &'a EngineConfig) -> EvalContext<'a> {
        EvalContext {
            accessor: &*self.accessor,
            scanner: &self.scanner,
            variables: &self.variables,
            config,
        }
    }

    /// Run this actor's part of tick `now`.
    ///
    /// Returns `None` when the accessor cannot resolve the host entity. The
    /// actor's caches and cooldowns are then left untouched until the next
    /// tick, and triggers queued for this tick are discarded.
    pub fn run_tick<R: Rng + ?Sized>(
        &mut self,
        now: u64,
        rules: &RuleSet,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Option<ActorTick> {
        if !self.accessor.resolve() {
            debug!(
                actor = %self.id,
                tick = now,
                dropped_triggers = self.pending.len(),
                "Accessor unresolved, skipping actor"
            );
            self.pending.clear();
            return None;
        }

        self.scanner.refresh(now, &*self.accessor);
        self.variables.refresh(&*self.accessor);
        let moved = self.movement.update(&*self.accessor, &config.footsteps);
        self.pending.extend(moved);

        let mut report = ActorTick::default();
        self.run_ambient_events(rules, config, rng, &mut report);
        self.run_triggers(rules, config, &mut report);
        self.run_block_effects(rules, config, rng, &mut report);
        Some(report)
    }

    fn run_ambient_events<R: Rng + ?Sized>(
        &mut self,
        rules: &RuleSet,
        config: &EngineConfig,
        rng: &mut R,
        report: &mut ActorTick,
    ) {
        let settings = &config.ambient_events;
        if !settings.enabled {
            return;
        }
        let position = self.accessor.position();
        for event in rules.events() {
            if settings.disabled_events.contains(event.id()) {
                continue;
            }
            let ctx = EvalContext {
                accessor: &*self.accessor,
                scanner: &self.scanner,
                variables: &self.variables,
                config,
            };
            match event.update(&ctx, &mut self.cooldowns, rng) {
                EventOutcome::Triggered { cooldown } => {
                    debug!(actor = %self.id, rule = event.id(), cooldown, "Ambient event triggered");
                    event.play(&mut *self.accessor, position, settings.volume);
                    report.events_triggered = report.events_triggered.saturating_add(1);
                }
                EventOutcome::Stopped => {
                    event.stop(&mut *self.accessor);
                    report.events_stopped = report.events_stopped.saturating_add(1);
                }
                EventOutcome::Cooling { .. } | EventOutcome::Idle => {}
            }
        }
    }

    fn run_triggers(&mut self, rules: &RuleSet, config: &EngineConfig, report: &mut ActorTick) {
        if self.pending.is_empty() {
            return;
        }
        let position = self.accessor.position();
        let queued: Vec<Trigger> = self.pending.drain(..).collect();
        for trigger in queued {
            let volume = if trigger.is_movement() {
                if !config.footsteps.enabled {
                    continue;
                }
                config.footsteps.volume
            } else {
                config.ambient_events.volume
            };
            let firing: Vec<&TriggeredSound> = {
                let ctx = self.context(config);
                rules
                    .triggered_sounds()
                    .iter()
                    .filter(|sound| sound.fires(trigger, &ctx))
                    .collect()
            };
            trace!(actor = %self.id, trigger = %trigger, matched = firing.len(), "Trigger dispatched");
            for sound in firing {
                sound.play(&mut *self.accessor, position, volume);
                report.triggered_sounds = report.triggered_sounds.saturating_add(1);
            }
        }
    }

    fn run_block_effects<R: Rng + ?Sized>(
        &mut self,
        rules: &RuleSet,
        config: &EngineConfig,
        rng: &mut R,
        report: &mut ActorTick,
    ) {
        if !config.effects.enabled || rules.effects().is_empty() {
            return;
        }
        let center = self.accessor.position().block_pos();
        let region = Region::centered(center, config.effects.extent());
        for _ in 0..config.effects.random_ticks {
            let cell = random_cell(&region, rng);
            let Some(block) = self.accessor.block(cell) else {
                continue;
            };
            for effect in rules.effects() {
                if effect.apply(&block, cell, &mut *self.accessor, rng) {
                    report.particles = report.particles.saturating_add(1);
                }
            }
        }
    }
}
