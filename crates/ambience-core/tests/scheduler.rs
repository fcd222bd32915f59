//! End-to-end scenarios for the `ambience-core` tick loop.
//!
//! Every test drives a [`Scheduler`] through [`StubAccessor`]s and inspects
//! the recorded commands, so no host is needed.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::indexing_slicing
)]

use ambience_core::condition::Condition;
use ambience_core::{
    Accessor, AccessorCommand, AccessorError, AmbientEvent, BlockEffect, EngineConfig,
    ParticleCommand, RuleSet, RuleSetDefinition, Scheduler, SoundCommand, SoundEmission,
    StubAccessor, TriggeredSound,
};
use ambience_types::{
    ActorId, ArmorSlot, BlockPos, EntityRef, Hand, LightKind, Position, Region, TagKind, Trigger,
    WeatherKind,
};

// =============================================================================
// Helpers
// =============================================================================

fn scheduler_with(config: EngineConfig, rules: RuleSet) -> Scheduler {
    let mut scheduler = Scheduler::with_seed(config, 42);
    scheduler.register_rules(rules);
    scheduler
}

fn single_event(event: AmbientEvent) -> RuleSet {
    let mut rules = RuleSet::new();
    rules.add_event(event).expect("unique id");
    rules
}

// =============================================================================
// Cooldown scenarios
// =============================================================================

#[test]
fn rule_emits_at_tick_one_and_again_after_its_cooldown() {
    let event = AmbientEvent::new(
        "wind",
        vec![SoundEmission::new("ambience:wind")],
        Vec::new(),
        Vec::new(),
        100,
        200,
    )
    .unwrap();
    let mut scheduler = scheduler_with(EngineConfig::default(), single_event(event));
    let stub = StubAccessor::new();
    let log = stub.command_log();
    let id = ActorId::new();
    scheduler.add_actor(id, Box::new(stub)).unwrap();

    let first = scheduler.run_tick().unwrap();
    assert_eq!(first.events_triggered, 1);
    assert_eq!(log.played(), vec!["ambience:wind"]);

    let cooldown = u64::from(scheduler.actor(id).unwrap().cooldowns().get("wind"));
    assert!((100..=200).contains(&cooldown));

    // Silent for ticks 2..=cooldown.
    for _ in 2..=cooldown {
        assert_eq!(scheduler.run_tick().unwrap().events_triggered, 0);
    }
    assert_eq!(log.played().len(), 1);

    // Emits again at tick cooldown + 1.
    let again = scheduler.run_tick().unwrap();
    assert_eq!(again.tick, cooldown + 1);
    assert_eq!(again.events_triggered, 1);
    assert_eq!(log.played().len(), 2);
}

#[test]
fn stop_policy_stops_each_sound_once_and_zeroes_cooldown() {
    let event = AmbientEvent::new(
        "rain",
        vec![
            SoundEmission::new("ambience:rain.light"),
            SoundEmission::new("ambience:rain.heavy"),
        ],
        Vec::new(),
        vec![Condition::Weather {
            weather: WeatherKind::Thunder,
        }],
        50,
        50,
    )
    .unwrap();
    let mut config = EngineConfig::default();
    config.ambient_events.stop_sounds = true;
    let mut scheduler = scheduler_with(config, single_event(event));

    // Thunder starts on the second tick.
    let scripted = Scripted::new(StubAccessor::new(), |tick, stub| {
        stub.thundering = tick >= 2;
    });
    let log = scripted.inner.command_log();
    let id = ActorId::new();
    scheduler.add_actor(id, Box::new(scripted)).unwrap();

    scheduler.run_tick().unwrap();
    assert_eq!(scheduler.actor(id).unwrap().cooldowns().get("rain"), 50);
    assert_eq!(log.played().len(), 2);

    let summary = scheduler.run_tick().unwrap();
    assert_eq!(summary.events_stopped, 1);
    assert_eq!(
        log.stopped(),
        vec!["ambience:rain.light", "ambience:rain.heavy"]
    );
    assert_eq!(scheduler.actor(id).unwrap().cooldowns().get("rain"), 0);
}

#[test]
fn stop_policy_off_leaves_restricted_rule_alone() {
    let event = AmbientEvent::new(
        "rain",
        vec![SoundEmission::new("ambience:rain")],
        Vec::new(),
        vec![Condition::Weather {
            weather: WeatherKind::Thunder,
        }],
        50,
        50,
    )
    .unwrap();
    let mut scheduler = scheduler_with(EngineConfig::default(), single_event(event));
    let mut stub = StubAccessor::new();
    stub.thundering = true;
    let log = stub.command_log();
    scheduler.add_actor(ActorId::new(), Box::new(stub)).unwrap();

    for _ in 0..10 {
        let summary = scheduler.run_tick().unwrap();
        assert_eq!(summary.events_stopped, 0);
        assert_eq!(summary.events_triggered, 0);
    }
    assert!(log.snapshot().is_empty());
}

// =============================================================================
// Scanner-backed conditions
// =============================================================================

#[test]
fn entity_threshold_drives_an_event() {
    let rules = RuleSetDefinition::parse(
        r"
ambient_events:
  - id: undead_moan
    sounds:
      - sound: ambience:moan
    conditions:
      - type: entities
        entity: '#undead'
        min_count: 3
    cooldown_min: 20
    cooldown_max: 20
",
    )
    .unwrap();
    let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 7);
    let report = scheduler.load_rules(rules);
    assert!(report.is_clean());

    let crowd = StubAccessor::new()
        .with_entities("minecraft:zombie", 2)
        .with_entities("minecraft:skeleton", 1)
        .with_tag(
            TagKind::Entity,
            "undead",
            &["minecraft:zombie", "minecraft:skeleton"],
        );
    let crowd_log = crowd.command_log();
    let lonely = StubAccessor::new().with_entities("minecraft:zombie", 2).with_tag(
        TagKind::Entity,
        "undead",
        &["minecraft:zombie", "minecraft:skeleton"],
    );
    let lonely_log = lonely.command_log();

    scheduler.add_actor(ActorId::new(), Box::new(crowd)).unwrap();
    scheduler.add_actor(ActorId::new(), Box::new(lonely)).unwrap();
    scheduler.run_tick().unwrap();

    assert_eq!(crowd_log.played(), vec!["ambience:moan"]);
    assert!(lonely_log.played().is_empty());
}

#[test]
fn tag_reload_picks_up_new_members() {
    let event = AmbientEvent::new(
        "logs",
        vec![SoundEmission::new("ambience:creak")],
        vec![Condition::blocks("#logs", 1).unwrap()],
        Vec::new(),
        0,
        0,
    )
    .unwrap();
    let mut scheduler = scheduler_with(EngineConfig::default(), single_event(event));
    let stub = StubAccessor::new()
        .with_block(BlockPos::new(0, 63, 0), "minecraft:oak_log")
        .with_tag(TagKind::Block, "logs", &["minecraft:oak_log"]);
    let lookups = stub.tag_lookups.clone();
    scheduler.add_actor(ActorId::new(), Box::new(stub)).unwrap();

    for _ in 0..3 {
        assert_eq!(scheduler.run_tick().unwrap().events_triggered, 1);
    }
    assert_eq!(lookups.load(std::sync::atomic::Ordering::Relaxed), 1);

    scheduler.reload_tags();
    scheduler.run_tick().unwrap();
    assert_eq!(lookups.load(std::sync::atomic::Ordering::Relaxed), 2);
}

// =============================================================================
// Actor lifecycle
// =============================================================================

#[test]
fn removed_actor_gets_no_further_commands() {
    let event = AmbientEvent::new(
        "hum",
        vec![SoundEmission::new("ambience:hum")],
        Vec::new(),
        Vec::new(),
        0,
        0,
    )
    .unwrap();
    let mut scheduler = scheduler_with(EngineConfig::default(), single_event(event));
    let stub = StubAccessor::new();
    let log = stub.command_log();
    let id = ActorId::new();
    scheduler.add_actor(id, Box::new(stub)).unwrap();

    scheduler.run_tick().unwrap();
    assert_eq!(log.played().len(), 1);

    scheduler.remove_actor(id).unwrap();
    assert!(scheduler.actor(id).is_none());
    for _ in 0..5 {
        assert_eq!(scheduler.run_tick().unwrap().actors_ticked, 0);
    }
    assert_eq!(log.played().len(), 1);
}

#[test]
fn clear_actors_empties_the_arena() {
    let mut scheduler = Scheduler::with_seed(EngineConfig::default(), 1);
    for _ in 0..3 {
        scheduler
            .add_actor(ActorId::new(), Box::new(StubAccessor::new()))
            .unwrap();
    }
    assert_eq!(scheduler.actor_count(), 3);
    scheduler.clear_actors();
    assert_eq!(scheduler.actor_count(), 0);
    assert_eq!(scheduler.run_tick().unwrap().actors_ticked, 0);
}

// =============================================================================
// Triggers, footsteps, effects
// =============================================================================

#[test]
fn host_trigger_is_dispatched_on_next_tick() {
    let mut rules = RuleSet::new();
    rules
        .add_triggered_sound(
            TriggeredSound::new(
                "swing",
                Trigger::AttackSwing,
                vec![SoundEmission::new("ambience:swing")],
                vec![Condition::item(Hand::Main, "minecraft:iron_sword").unwrap()],
                Vec::new(),
            )
            .unwrap(),
        )
        .unwrap();
    let mut scheduler = scheduler_with(EngineConfig::default(), rules);
    let mut stub = StubAccessor::new();
    stub.held.insert(Hand::Main, "minecraft:iron_sword".to_owned());
    let log = stub.command_log();
    let id = ActorId::new();
    scheduler.add_actor(id, Box::new(stub)).unwrap();

    scheduler.trigger(id, Trigger::AttackSwing).unwrap();
    assert!(log.played().is_empty());
    let summary = scheduler.run_tick().unwrap();
    assert_eq!(summary.triggered_sounds, 1);
    assert_eq!(log.played(), vec!["ambience:swing"]);
}

#[test]
fn triggers_sent_while_unresolved_are_not_replayed() {
    let mut rules = RuleSet::new();
    rules
        .add_triggered_sound(
            TriggeredSound::new(
                "swing",
                Trigger::AttackSwing,
                vec![SoundEmission::new("ambience:swing")],
                Vec::new(),
                Vec::new(),
            )
            .unwrap(),
        )
        .unwrap();
    let mut scheduler = scheduler_with(EngineConfig::default(), rules);

    // The entity is gone for the first 100 ticks.
    let scripted = Scripted::new(StubAccessor::new(), |tick, stub| {
        stub.present = tick > 100;
    });
    let log = scripted.inner.command_log();
    let id = ActorId::new();
    scheduler.add_actor(id, Box::new(scripted)).unwrap();

    for _ in 0..100 {
        scheduler.trigger(id, Trigger::AttackSwing).unwrap();
        let summary = scheduler.run_tick().unwrap();
        assert_eq!(summary.actors_skipped, 1);
        assert_eq!(scheduler.actor(id).unwrap().pending_triggers().count(), 0);
    }

    let summary = scheduler.run_tick().unwrap();
    assert_eq!(summary.triggered_sounds, 0);
    assert!(log.played().is_empty());

    scheduler.trigger(id, Trigger::AttackSwing).unwrap();
    let summary = scheduler.run_tick().unwrap();
    assert_eq!(summary.triggered_sounds, 1);
    assert_eq!(log.played(), vec!["ambience:swing"]);
}

/// Stub accessor whose state a script edits on every resolve.
struct Scripted {
    inner: StubAccessor,
    resolves: u64,
    script: fn(u64, &mut StubAccessor),
}

impl Scripted {
    fn new(inner: StubAccessor, script: fn(u64, &mut StubAccessor)) -> Self {
        Self {
            inner,
            resolves: 0,
            script,
        }
    }
}

impl Accessor for Scripted {
    fn resolve(&mut self) -> bool {
        self.resolves = self.resolves.saturating_add(1);
        (self.script)(self.resolves, &mut self.inner);
        self.inner.resolve()
    }
    fn position(&self) -> Position {
        self.inner.position()
    }
    fn health(&self) -> f64 {
        self.inner.health()
    }
    fn food_level(&self) -> f64 {
        self.inner.food_level()
    }
    fn is_submerged(&self) -> bool {
        self.inner.is_submerged()
    }
    fn is_sneaking(&self) -> bool {
        self.inner.is_sneaking()
    }
    fn is_on_ground(&self) -> bool {
        self.inner.is_on_ground()
    }
    fn has_vehicle(&self) -> bool {
        self.inner.has_vehicle()
    }
    fn is_gliding(&self) -> bool {
        self.inner.is_gliding()
    }
    fn is_climbing(&self) -> bool {
        self.inner.is_climbing()
    }
    fn armor(&self, slot: ArmorSlot) -> Option<String> {
        self.inner.armor(slot)
    }
    fn held_item(&self, hand: Hand) -> Option<String> {
        self.inner.held_item(hand)
    }
    fn day_time(&self) -> u64 {
        self.inner.day_time()
    }
    fn is_raining(&self) -> bool {
        self.inner.is_raining()
    }
    fn is_thundering(&self) -> bool {
        self.inner.is_thundering()
    }
    fn dimension(&self) -> Option<String> {
        self.inner.dimension()
    }
    fn block(&self, pos: BlockPos) -> Option<String> {
        self.inner.block(pos)
    }
    fn biome(&self, pos: BlockPos) -> Option<String> {
        self.inner.biome(pos)
    }
    fn light(&self, pos: BlockPos, kind: LightKind) -> Option<u8> {
        self.inner.light(pos, kind)
    }
    fn temperature(&self, pos: BlockPos) -> Option<f64> {
        self.inner.temperature(pos)
    }
    fn humidity(&self, pos: BlockPos) -> Option<f64> {
        self.inner.humidity(pos)
    }
    fn tag(&self, kind: TagKind, name: &str) -> Result<Vec<String>, AccessorError> {
        self.inner.tag(kind, name)
    }
    fn entities_in(&self, region: &Region) -> Vec<EntityRef> {
        self.inner.entities_in(region)
    }
    fn entity_type(&self, entity: EntityRef) -> Option<String> {
        self.inner.entity_type(entity)
    }
    fn play_sound(&mut self, command: &SoundCommand) {
        self.inner.play_sound(command);
    }
    fn play_global_sound(&mut self, command: &SoundCommand) {
        self.inner.play_global_sound(command);
    }
    fn stop_sound(&mut self, sound: &str) {
        self.inner.stop_sound(sound);
    }
    fn add_particle(&mut self, command: &ParticleCommand) {
        self.inner.add_particle(command);
    }
}

#[test]
fn walking_produces_footsteps_at_footstep_volume() {
    let mut rules = RuleSet::new();
    rules
        .add_triggered_sound(
            TriggeredSound::new(
                "step",
                Trigger::Footstep,
                vec![SoundEmission::new("ambience:step")],
                Vec::new(),
                Vec::new(),
            )
            .unwrap(),
        )
        .unwrap();
    let config = EngineConfig::default();
    let footstep_volume = config.footsteps.volume;
    let mut scheduler = scheduler_with(config, rules);
    // Walks half a block east per tick.
    let walker = Scripted::new(StubAccessor::new(), |_, stub| {
        stub.position.x += 0.5;
    });
    let log = walker.inner.command_log();
    scheduler.add_actor(ActorId::new(), Box::new(walker)).unwrap();

    // 20 ticks at half a block each, after the first sample: 9.5 blocks.
    let steps: u32 = (0..20)
        .map(|_| scheduler.run_tick().unwrap().triggered_sounds)
        .sum();
    assert_eq!(steps, 5);

    for command in log.snapshot() {
        let AccessorCommand::PlaySound(sound) = command else {
            panic!("only footsteps expected");
        };
        assert!((sound.volume - footstep_volume).abs() < f32::EPSILON);
    }
}

#[test]
fn block_effects_spawn_particles_near_matching_blocks() {
    let mut rules = RuleSet::new();
    rules
        .add_effect(
            BlockEffect::new("ash", "minecraft:soul_sand", "minecraft:ash", 1.0).unwrap(),
        )
        .unwrap();
    let mut config = EngineConfig::default();
    config.effects.random_ticks = 64;
    let mut scheduler = scheduler_with(config, rules);

    let mut stub = StubAccessor::new();
    stub.default_block = Some("minecraft:soul_sand".to_owned());
    let log = stub.command_log();
    scheduler.add_actor(ActorId::new(), Box::new(stub)).unwrap();

    let summary = scheduler.run_tick().unwrap();
    assert_eq!(summary.particles, 64);
    assert_eq!(log.particle_count(), 64);

    let mut disabled = EngineConfig::default();
    disabled.effects.enabled = false;
    let mut quiet = Scheduler::with_seed(disabled, 1);
    quiet.register_rules(scheduler.rules().clone());
    quiet
        .add_actor(ActorId::new(), Box::new(StubAccessor::new()))
        .unwrap();
    assert_eq!(quiet.run_tick().unwrap().particles, 0);
}
