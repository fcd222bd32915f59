//! The tick loop.
//!
//! [`Scheduler::run_tick`] advances the engine clock and runs every live
//! actor once, in arena slot order:
//!
//! 1. **Resolve** -- ask the accessor to re-locate the host entity; skip the
//!    actor for this tick if it cannot.
//! 2. **Scan** -- refresh the scanner cache if its interval has elapsed.
//! 3. **Variables** -- recompute the snapshot and rotate the previous one.
//! 4. **Movement** -- derive footstep, land, and jump triggers.
//! 5. **Ambient events** -- evaluate every event in registration order.
//! 6. **Triggers** -- match queued triggers against triggered sounds.
//! 7. **Effects** -- sample random blocks for particle effects.
//!
//! Every mutating operation takes `&mut self`, so adding or removing an
//! actor can never interleave with a tick in progress.

use ambience_types::{ActorId, Trigger};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::accessor::Accessor;
use crate::actor::Actor;
use crate::arena::{ActorArena, ActorHandle};
use crate::clock::TickClock;
use crate::config::EngineConfig;
use crate::error::SchedulerError;
use crate::rules::{LoadReport, RuleSet, RuleSetDefinition};

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Actors that ran this tick.
    pub actors_ticked: u32,
    /// Actors skipped because their accessor did not resolve.
    pub actors_skipped: u32,
    /// Ambient events that played their sounds.
    pub events_triggered: u32,
    /// Ambient events stopped under the stop policy.
    pub events_stopped: u32,
    /// Triggered sounds that played.
    pub triggered_sounds: u32,
    /// Particles spawned.
    pub particles: u32,
}

/// Owns the actors, the rules, and the engine clock.
#[derive(Debug)]
pub struct Scheduler {
    config: EngineConfig,
    rules: RuleSet,
    actors: ActorArena,
    clock: TickClock,
    rng: SmallRng,
}

impl Scheduler {
    /// Create a scheduler seeded from the operating system.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }

    /// Create a scheduler with a fixed seed, for reproducible runs.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, rng: SmallRng) -> Self {
        Self {
            config,
            rules: RuleSet::new(),
            actors: ActorArena::new(),
            clock: TickClock::new(),
            rng,
        }
    }

    /// Engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered rules.
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Ticks run so far.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Number of live actors.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Live actor by id.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.handle(id).and_then(|handle| self.actors.get(handle))
    }

    /// Live actor by handle; `None` once the actor has been removed.
    pub fn actor_by_handle(&self, handle: ActorHandle) -> Option<&Actor> {
        self.actors.get(handle)
    }

    // -----------------------------------------------------------------------
    // Actor lifecycle
    // -----------------------------------------------------------------------

    /// Start tracking an entity.
    ///
    /// With `prime_cooldowns_on_join` set, every ambient event is armed with
    /// a random cooldown so a joining actor is not greeted by every rule at
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateActor`] if the id is already live.
    pub fn add_actor(
        &mut self,
        id: ActorId,
        accessor: Box<dyn Accessor>,
    ) -> Result<ActorHandle, SchedulerError> {
        if self.actors.contains(id) {
            return Err(SchedulerError::DuplicateActor(id));
        }
        let mut actor = Actor::new(id, accessor, &self.config);
        if self.config.ambient_events.prime_cooldowns_on_join {
            for event in self.rules.events() {
                event.prime(actor.cooldowns_mut(), &mut self.rng);
            }
        }
        let handle = self.actors.insert(actor);
        info!(actor = %id, slot = handle.index(), actors = self.actors.len(), "Actor added");
        Ok(handle)
    }

    /// Stop tracking an entity and drop all of its state.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ActorNotFound`] if the id is not live.
    pub fn remove_actor(&mut self, id: ActorId) -> Result<(), SchedulerError> {
        self.actors
            .remove(id)
            .ok_or(SchedulerError::ActorNotFound(id))?;
        info!(actor = %id, actors = self.actors.len(), "Actor removed");
        Ok(())
    }

    /// Stop tracking every entity.
    pub fn clear_actors(&mut self) {
        let removed = self.actors.len();
        self.actors.clear();
        info!(removed, "All actors cleared");
    }

    /// Queue a host trigger for the actor's next tick.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ActorNotFound`] if the id is not live.
    pub fn trigger(&mut self, id: ActorId, trigger: Trigger) -> Result<(), SchedulerError> {
        let actor = self
            .actors
            .handle(id)
            .and_then(|handle| self.actors.get_mut(handle))
            .ok_or(SchedulerError::ActorNotFound(id))?;
        debug!(actor = %id, trigger = %trigger, "Trigger queued");
        actor.push_trigger(trigger);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    /// Convert and install rule definitions, replacing the current rules.
    ///
    /// Malformed definitions are rejected one by one and listed in the
    /// returned report; the rest are installed.
    pub fn load_rules(&mut self, definitions: RuleSetDefinition) -> LoadReport {
        let (rules, report) = RuleSet::from_definitions(definitions);
        self.register_rules(rules);
        report
    }

    /// Install pre-built rules, replacing the current ones.
    ///
    /// Cooldowns of events that no longer exist are dropped.
    pub fn register_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
        let ids = self.rules.event_ids();
        for actor in self.actors.iter_mut() {
            actor.cooldowns_mut().retain(|id| ids.contains(id));
        }
        info!(rules = self.rules.len(), "Rules registered");
    }

    /// Forget every resolved tag; the next evaluation looks tags up again.
    ///
    /// Call this when the host reloads its data packs.
    pub fn reload_tags(&mut self) {
        self.rules.invalidate_tag_caches();
        info!("Tag caches invalidated");
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the clock and run every live actor once.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Clock`] if the tick counter would overflow.
    pub fn run_tick(&mut self) -> Result<TickSummary, SchedulerError> {
        let tick = self.clock.advance()?;
        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        for actor in self.actors.iter_mut() {
            let Some(report) = actor.run_tick(tick, &self.rules, &self.config, &mut self.rng)
            else {
                summary.actors_skipped = summary.actors_skipped.saturating_add(1);
                continue;
            };
            summary.actors_ticked = summary.actors_ticked.saturating_add(1);
            summary.events_triggered = summary
                .events_triggered
                .saturating_add(report.events_triggered);
            summary.events_stopped = summary
                .events_stopped
                .saturating_add(report.events_stopped);
            summary.triggered_sounds = summary
                .triggered_sounds
                .saturating_add(report.triggered_sounds);
            summary.particles = summary.particles.saturating_add(report.particles);
        }

        debug!(
            tick,
            actors = summary.actors_ticked,
            skipped = summary.actors_skipped,
            events = summary.events_triggered,
            stopped = summary.events_stopped,
            triggered = summary.triggered_sounds,
            particles = summary.particles,
            "Tick complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::{AmbientEvent, SoundEmission};
    use crate::stub::StubAccessor;

    fn birds(min: i64, max: i64) -> AmbientEvent {
        AmbientEvent::new(
            "birds",
            vec![SoundEmission::new("ambience:birds")],
            Vec::new(),
            Vec::new(),
            min,
            max,
        )
        .unwrap()
    }

    #[test]
    fn duplicate_actor_is_rejected() {
        let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
        let id = ActorId::new();
        scheduler.add_actor(id, Box::new(StubAccessor::new())).unwrap();
        assert!(matches!(
            scheduler.add_actor(id, Box::new(StubAccessor::new())),
            Err(SchedulerError::DuplicateActor(dup)) if dup == id
        ));
        assert_eq!(scheduler.actor_count(), 1);
    }

    #[test]
    fn removing_unknown_actor_is_an_error() {
        let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
        assert!(matches!(
            scheduler.remove_actor(ActorId::new()),
            Err(SchedulerError::ActorNotFound(_))
        ));
    }

    #[test]
    fn clock_advances_per_tick() {
        let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
        assert_eq!(scheduler.tick(), 0);
        assert_eq!(scheduler.run_tick().unwrap().tick, 1);
        assert_eq!(scheduler.run_tick().unwrap().tick, 2);
        assert_eq!(scheduler.tick(), 2);
    }

    #[test]
    fn unresolved_actor_is_counted_as_skipped() {
        let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
        let mut stub = StubAccessor::new();
        stub.present = false;
        scheduler.add_actor(ActorId::new(), Box::new(stub)).unwrap();
        scheduler.add_actor(ActorId::new(), Box::new(StubAccessor::new())).unwrap();
        let summary = scheduler.run_tick().unwrap();
        assert_eq!(summary.actors_skipped, 1);
        assert_eq!(summary.actors_ticked, 1);
    }

    #[test]
    fn priming_arms_every_event_on_join() {
        let mut config = EngineConfig::default();
        config.ambient_events.prime_cooldowns_on_join = true;
        let mut scheduler = Scheduler::with_seed(config, 1);
        let mut rules = RuleSet::new();
        rules.add_event(birds(50, 60)).unwrap();
        scheduler.register_rules(rules);

        let id = ActorId::new();
        scheduler.add_actor(id, Box::new(StubAccessor::new())).unwrap();
        let primed = scheduler.actor(id).unwrap().cooldowns().get("birds");
        assert!((50..=60).contains(&primed));
    }

    #[test]
    fn replacing_rules_drops_orphaned_cooldowns() {
        let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
        let mut rules = RuleSet::new();
        rules.add_event(birds(30, 30)).unwrap();
        scheduler.register_rules(rules);

        let id = ActorId::new();
        scheduler.add_actor(id, Box::new(StubAccessor::new())).unwrap();
        scheduler.run_tick().unwrap();
        assert_eq!(scheduler.actor(id).unwrap().cooldowns().get("birds"), 30);

        scheduler.register_rules(RuleSet::new());
        assert!(scheduler.actor(id).unwrap().cooldowns().is_empty());
    }

    #[test]
    fn trigger_for_unknown_actor_is_an_error() {
        let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
        assert!(scheduler.trigger(ActorId::new(), Trigger::AttackSwing).is_err());
    }

    #[test]
    fn disabled_ambient_events_never_fire() {
        let mut config = EngineConfig::default();
        config.ambient_events.enabled = false;
        let mut scheduler = Scheduler::with_seed(config, 1);
        let mut rules = RuleSet::new();
        rules.add_event(birds(0, 0)).unwrap();
        scheduler.register_rules(rules);
        scheduler.add_actor(ActorId::new(), Box::new(StubAccessor::new())).unwrap();
        for _ in 0..5 {
            assert_eq!(scheduler.run_tick().unwrap().events_triggered, 0);
        }
    }
}
