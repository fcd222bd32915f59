//! The accessor capability: the engine's only window onto the host world.
//!
//! Every actor owns one [`Accessor`]. The engine asks it for the actor's
//! vitals and flags, per-coordinate world lookups, tag memberships, and
//! nearby entities, and hands it the play/stop/particle commands it decides
//! to issue. The accessor abstracts the platform binding -- a game server
//! plugin, a client mod, or a test stub -- and must never keep a live
//! reference to the host's entity object: [`Accessor::resolve`] re-locates
//! the entity by id at the start of every tick.
//!
//! Lookups that can miss (unloaded chunks, unknown registries) return
//! `Option`/`Result`. The engine treats a miss as "no data" and carries on.
//! Queries are expected to be fast or host-cached; the engine never awaits
//! them.

use ambience_types::{ArmorSlot, BlockPos, EntityRef, Hand, LightKind, Position, Region, TagKind};

/// Errors an accessor can report for fallible registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessorError {
    /// The tag does not exist in the host's registry.
    #[error("unknown {kind} tag: {name}")]
    UnknownTag {
        /// Registry label (`block`, `biome`, `item`, `entity`).
        kind: &'static str,
        /// Tag name without the leading `#`.
        name: String,
    },

    /// The host failed to answer the lookup.
    #[error("host lookup failed: {reason}")]
    Host {
        /// Description from the host.
        reason: String,
    },
}

/// A sound the engine wants played.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundCommand {
    /// Host sound identifier (`minecraft:ambient.cave`).
    pub sound: String,
    /// Where the sound is emitted.
    pub position: Position,
    /// Final volume after global scaling.
    pub volume: f32,
    /// Playback pitch.
    pub pitch: f32,
}

/// A particle the engine wants spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleCommand {
    /// Host particle type identifier.
    pub particle: String,
    /// Host-specific particle parameter string (may be empty).
    pub parameters: String,
    /// Spawn position.
    pub position: Position,
    /// Initial velocity, one component per axis.
    pub velocity: Position,
}

/// Per-actor view of the host world.
///
/// All query methods take `&self`; conditions and the scanner read through
/// a shared borrow. Commands take `&mut self`.
pub trait Accessor: Send {
    /// Re-locate the host entity for this actor.
    ///
    /// Returns `false` when the entity is currently not present (respawning,
    /// changing dimension, disconnected but not yet removed); the scheduler
    /// then skips the actor for this tick.
    fn resolve(&mut self) -> bool {
        true
    }

    // --- Actor state ---

    /// Current position.
    fn position(&self) -> Position;
    /// Current health.
    fn health(&self) -> f64;
    /// Current food level.
    fn food_level(&self) -> f64;
    /// Head below a water surface.
    fn is_submerged(&self) -> bool;
    /// Sneaking.
    fn is_sneaking(&self) -> bool;
    /// Standing on a solid surface.
    fn is_on_ground(&self) -> bool;
    /// Riding another entity.
    fn has_vehicle(&self) -> bool;
    /// Gliding with wings.
    fn is_gliding(&self) -> bool;
    /// On a ladder, vine, or similar.
    fn is_climbing(&self) -> bool;
    /// Item id in an armor slot, `None` when empty.
    fn armor(&self, slot: ArmorSlot) -> Option<String>;
    /// Item id held in a hand, `None` when empty.
    fn held_item(&self, hand: Hand) -> Option<String>;

    // --- World state ---

    /// Time of day in ticks, `0..24000`.
    fn day_time(&self) -> u64;
    /// Raining in the actor's world.
    fn is_raining(&self) -> bool;
    /// Thundering in the actor's world.
    fn is_thundering(&self) -> bool;
    /// Dimension id.
    fn dimension(&self) -> Option<String>;
    /// Block id at a coordinate.
    fn block(&self, pos: BlockPos) -> Option<String>;
    /// Biome id at a coordinate.
    fn biome(&self, pos: BlockPos) -> Option<String>;
    /// Light level at a coordinate.
    fn light(&self, pos: BlockPos, kind: LightKind) -> Option<u8>;
    /// Biome temperature at a coordinate.
    fn temperature(&self, pos: BlockPos) -> Option<f64>;
    /// Biome humidity (downfall) at a coordinate.
    fn humidity(&self, pos: BlockPos) -> Option<f64>;

    // --- Registries ---

    /// Concrete ids that are members of a tag.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError`] when the tag cannot be resolved.
    fn tag(&self, kind: TagKind, name: &str) -> Result<Vec<String>, AccessorError>;

    // --- Entities ---

    /// Entities inside a region, excluding the actor itself.
    fn entities_in(&self, region: &Region) -> Vec<EntityRef>;
    /// Type id of an enumerated entity, `None` if it vanished or is unknown.
    fn entity_type(&self, entity: EntityRef) -> Option<String>;

    // --- Commands ---

    /// Play a positional ambient sound audible to this actor.
    fn play_sound(&mut self, command: &SoundCommand);
    /// Play a sound audible to everyone near the position.
    fn play_global_sound(&mut self, command: &SoundCommand);
    /// Stop every playing instance of a sound for this actor.
    fn stop_sound(&mut self, sound: &str);
    /// Spawn a particle visible to this actor.
    fn add_particle(&mut self, command: &ParticleCommand);
}
