//! In-memory accessor for tests and headless hosts.
//!
//! [`StubAccessor`] answers every query from plain fields and records every
//! command into a shared [`CommandLog`]. Because the log is shared through
//! an `Arc`, a test can keep a clone of it after boxing the accessor into
//! the scheduler and inspect what the engine emitted.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ambience_types::{ArmorSlot, BlockPos, EntityRef, Hand, LightKind, Position, Region, TagKind};

use crate::accessor::{Accessor, AccessorError, ParticleCommand, SoundCommand};

/// A command recorded by [`StubAccessor`].
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorCommand {
    /// [`Accessor::play_sound`] was called.
    PlaySound(SoundCommand),
    /// [`Accessor::play_global_sound`] was called.
    PlayGlobalSound(SoundCommand),
    /// [`Accessor::stop_sound`] was called.
    StopSound(String),
    /// [`Accessor::add_particle`] was called.
    AddParticle(ParticleCommand),
}

/// Shared, append-only record of accessor commands.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<AccessorCommand>>>,
}

impl CommandLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command. A poisoned lock drops the entry.
    pub fn push(&self, command: AccessorCommand) {
        let Ok(mut guard) = self.entries.lock() else {
            return;
        };
        guard.push(command);
    }

    /// Copy of every command recorded so far.
    pub fn snapshot(&self) -> Vec<AccessorCommand> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Remove and return every command recorded so far.
    pub fn drain(&self) -> Vec<AccessorCommand> {
        self.entries
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }

    /// Sound ids passed to either play command, in order.
    pub fn played(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter_map(|command| match command {
                AccessorCommand::PlaySound(cmd) | AccessorCommand::PlayGlobalSound(cmd) => {
                    Some(cmd.sound)
                }
                _ => None,
            })
            .collect()
    }

    /// Sound ids passed to [`Accessor::stop_sound`], in order.
    pub fn stopped(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter_map(|command| match command {
                AccessorCommand::StopSound(sound) => Some(sound),
                _ => None,
            })
            .collect()
    }

    /// Number of particles spawned.
    pub fn particle_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|command| matches!(command, AccessorCommand::AddParticle(_)))
            .count()
    }
}

/// An entity placed in the stub world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubEntity {
    /// Cell the entity stands in.
    pub pos: BlockPos,
    /// Type id, `None` to simulate an entity the host cannot resolve.
    pub kind: Option<String>,
}

/// Accessor backed by plain fields.
///
/// Unset block cells fall back to `default_block`; setting it to `None`
/// makes every unset cell unresolvable.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct StubAccessor {
    /// Whether [`Accessor::resolve`] succeeds.
    pub present: bool,
    /// Actor position.
    pub position: Position,
    /// Actor health.
    pub health: f64,
    /// Actor food level.
    pub food_level: f64,
    /// Submerged flag.
    pub submerged: bool,
    /// Sneaking flag.
    pub sneaking: bool,
    /// On-ground flag.
    pub on_ground: bool,
    /// Riding flag.
    pub vehicle: bool,
    /// Gliding flag.
    pub gliding: bool,
    /// Climbing flag.
    pub climbing: bool,
    /// Armor by slot.
    pub armor: BTreeMap<ArmorSlot, String>,
    /// Held items by hand.
    pub held: BTreeMap<Hand, String>,
    /// Time of day.
    pub day_time: u64,
    /// Rain flag.
    pub raining: bool,
    /// Thunder flag.
    pub thundering: bool,
    /// Dimension id.
    pub dimension: Option<String>,
    /// Explicitly placed blocks.
    pub blocks: BTreeMap<BlockPos, String>,
    /// Block returned for cells not in `blocks`.
    pub default_block: Option<String>,
    /// Biome returned everywhere.
    pub biome: Option<String>,
    /// Light level returned for every kind.
    pub light: Option<u8>,
    /// Temperature returned everywhere.
    pub temperature: Option<f64>,
    /// Humidity returned everywhere.
    pub humidity: Option<f64>,
    /// Tag memberships.
    pub tags: BTreeMap<(TagKind, String), Vec<String>>,
    /// Tag names whose lookup fails with a host error.
    pub failing_tags: BTreeSet<String>,
    /// Entities in the world.
    pub entities: Vec<StubEntity>,
    /// Recorded commands.
    pub log: CommandLog,
    /// Number of [`Accessor::tag`] calls made.
    pub tag_lookups: Arc<AtomicUsize>,
    /// Number of [`Accessor::block`] calls made.
    pub block_lookups: Arc<AtomicUsize>,
}

impl Default for StubAccessor {
    fn default() -> Self {
        Self {
            present: true,
            position: Position::new(0.5, 64.0, 0.5),
            health: 20.0,
            food_level: 20.0,
            submerged: false,
            sneaking: false,
            on_ground: true,
            vehicle: false,
            gliding: false,
            climbing: false,
            armor: BTreeMap::new(),
            held: BTreeMap::new(),
            day_time: 6000,
            raining: false,
            thundering: false,
            dimension: Some("minecraft:overworld".to_owned()),
            blocks: BTreeMap::new(),
            default_block: Some("minecraft:air".to_owned()),
            biome: Some("minecraft:plains".to_owned()),
            light: Some(15),
            temperature: Some(0.8),
            humidity: Some(0.4),
            tags: BTreeMap::new(),
            failing_tags: BTreeSet::new(),
            entities: Vec::new(),
            log: CommandLog::new(),
            tag_lookups: Arc::new(AtomicUsize::new(0)),
            block_lookups: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl StubAccessor {
    /// Create a stub standing on open plains at noon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `count` entities of `kind` at the actor's cell.
    #[must_use]
    pub fn with_entities(mut self, kind: &str, count: usize) -> Self {
        let pos = self.position.block_pos();
        self.entities.extend((0..count).map(|_| StubEntity {
            pos,
            kind: Some(kind.to_owned()),
        }));
        self
    }

    /// Register a tag.
    #[must_use]
    pub fn with_tag(mut self, kind: TagKind, name: &str, members: &[&str]) -> Self {
        self.tags.insert(
            (kind, name.to_owned()),
            members.iter().map(|m| (*m).to_owned()).collect(),
        );
        self
    }

    /// Place a block.
    #[must_use]
    pub fn with_block(mut self, pos: BlockPos, block: &str) -> Self {
        self.blocks.insert(pos, block.to_owned());
        self
    }

    /// Handle to the command log, usable after the stub is boxed away.
    pub fn command_log(&self) -> CommandLog {
        self.log.clone()
    }
}

impl Accessor for StubAccessor {
    fn resolve(&mut self) -> bool {
        self.present
    }

    fn position(&self) -> Position {
        self.position
    }

    fn health(&self) -> f64 {
        self.health
    }

    fn food_level(&self) -> f64 {
        self.food_level
    }

    fn is_submerged(&self) -> bool {
        self.submerged
    }

    fn is_sneaking(&self) -> bool {
        self.sneaking
    }

    fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    fn has_vehicle(&self) -> bool {
        self.vehicle
    }

    fn is_gliding(&self) -> bool {
        self.gliding
    }

    fn is_climbing(&self) -> bool {
        self.climbing
    }

    fn armor(&self, slot: ArmorSlot) -> Option<String> {
        self.armor.get(&slot).cloned()
    }

    fn held_item(&self, hand: Hand) -> Option<String> {
        self.held.get(&hand).cloned()
    }

    fn day_time(&self) -> u64 {
        self.day_time
    }

    fn is_raining(&self) -> bool {
        self.raining
    }

    fn is_thundering(&self) -> bool {
        self.thundering
    }

    fn dimension(&self) -> Option<String> {
        self.dimension.clone()
    }

    fn block(&self, pos: BlockPos) -> Option<String> {
        self.block_lookups.fetch_add(1, Ordering::Relaxed);
        self.blocks
            .get(&pos)
            .cloned()
            .or_else(|| self.default_block.clone())
    }

    fn biome(&self, _pos: BlockPos) -> Option<String> {
        self.biome.clone()
    }

    fn light(&self, _pos: BlockPos, _kind: LightKind) -> Option<u8> {
        self.light
    }

    fn temperature(&self, _pos: BlockPos) -> Option<f64> {
        self.temperature
    }

    fn humidity(&self, _pos: BlockPos) -> Option<f64> {
        self.humidity
    }

    fn tag(&self, kind: TagKind, name: &str) -> Result<Vec<String>, AccessorError> {
        self.tag_lookups.fetch_add(1, Ordering::Relaxed);
        if self.failing_tags.contains(name) {
            return Err(AccessorError::Host {
                reason: format!("registry unavailable for {name}"),
            });
        }
        self.tags
            .get(&(kind, name.to_owned()))
            .cloned()
            .ok_or_else(|| AccessorError::UnknownTag {
                kind: kind.as_str(),
                name: name.to_owned(),
            })
    }

    fn entities_in(&self, region: &Region) -> Vec<EntityRef> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| region.contains(entity.pos))
            .map(|(index, _)| EntityRef(u64::try_from(index).unwrap_or(u64::MAX)))
            .collect()
    }

    fn entity_type(&self, entity: EntityRef) -> Option<String> {
        let index = usize::try_from(entity.0).ok()?;
        self.entities.get(index)?.kind.clone()
    }

    fn play_sound(&mut self, command: &SoundCommand) {
        self.log.push(AccessorCommand::PlaySound(command.clone()));
    }

    fn play_global_sound(&mut self, command: &SoundCommand) {
        self.log
            .push(AccessorCommand::PlayGlobalSound(command.clone()));
    }

    fn stop_sound(&mut self, sound: &str) {
        self.log.push(AccessorCommand::StopSound(sound.to_owned()));
    }

    fn add_particle(&mut self, command: &ParticleCommand) {
        self.log.push(AccessorCommand::AddParticle(command.clone()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ambience_types::Extent;

    use super::*;

    #[test]
    fn log_survives_boxing() {
        let stub = StubAccessor::new();
        let log = stub.command_log();
        let mut boxed: Box<dyn Accessor> = Box::new(stub);
        boxed.stop_sound("minecraft:ambient.cave");
        assert_eq!(log.stopped(), vec!["minecraft:ambient.cave".to_owned()]);
    }

    #[test]
    fn entities_outside_region_are_not_enumerated() {
        let mut stub = StubAccessor::new().with_entities("minecraft:zombie", 2);
        stub.entities.push(StubEntity {
            pos: BlockPos::new(500, 64, 500),
            kind: Some("minecraft:zombie".to_owned()),
        });
        let region = Region::centered(stub.position.block_pos(), Extent::new(5, 5, 5));
        assert_eq!(stub.entities_in(&region).len(), 2);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let stub = StubAccessor::new();
        let err = stub.tag(TagKind::Entity, "undead").unwrap_err();
        assert!(matches!(err, AccessorError::UnknownTag { kind: "entity", .. }));
    }

    #[test]
    fn drain_empties_the_log() {
        let mut stub = StubAccessor::new();
        stub.stop_sound("a");
        let log = stub.command_log();
        assert_eq!(log.drain().len(), 1);
        assert!(log.snapshot().is_empty());
    }
}
