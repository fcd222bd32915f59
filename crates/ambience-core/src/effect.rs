//! Particle effects sampled at random blocks around an actor.
//!
//! Each tick the scheduler picks `effects.random_ticks` random cells inside
//! the effects region, looks up the block in each, and gives every matching
//! [`BlockEffect`] one roll against its `chance`.

use ambience_types::{BlockPos, Position, Region, TagKind};
use rand::Rng;
use serde::Deserialize;
use tracing::trace;

use crate::accessor::{Accessor, ParticleCommand};
use crate::condition::TagMatcher;
use crate::error::RuleError;

/// A particle rule keyed on a block id or tag.
#[derive(Debug, Clone)]
pub struct BlockEffect {
    id: String,
    matcher: TagMatcher,
    particle: String,
    parameters: String,
    chance: f64,
    offset: Position,
    velocity: Position,
}

impl BlockEffect {
    /// Build a validated effect.
    ///
    /// # Errors
    ///
    /// Fails if the id, block, or particle is blank, or `chance` is outside
    /// `(0, 1]`.
    pub fn new(
        id: &str,
        block_or_tag: &str,
        particle: &str,
        chance: f64,
    ) -> Result<Self, RuleError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RuleError::MissingId);
        }
        let matcher = TagMatcher::new(TagKind::Block, block_or_tag, "block / block tag").map_err(
            |source| RuleError::Condition {
                id: id.to_owned(),
                source,
            },
        )?;
        if particle.trim().is_empty() {
            return Err(RuleError::EmptyParticle { id: id.to_owned() });
        }
        if chance.is_nan() || chance <= 0.0 || chance > 1.0 {
            return Err(RuleError::ChanceOutOfRange {
                id: id.to_owned(),
                chance,
            });
        }
        Ok(Self {
            id: id.to_owned(),
            matcher,
            particle: particle.trim().to_owned(),
            parameters: String::new(),
            chance,
            offset: Position::default(),
            velocity: Position::default(),
        })
    }

    /// Set the host particle parameter string.
    #[must_use]
    pub fn with_parameters(mut self, parameters: &str) -> Self {
        parameters.clone_into(&mut self.parameters);
        self
    }

    /// Set the spawn offset from the cell centre.
    #[must_use]
    pub const fn with_offset(mut self, offset: Position) -> Self {
        self.offset = offset;
        self
    }

    /// Set the initial particle velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Position) -> Self {
        self.velocity = velocity;
        self
    }

    /// Rule id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Roll for this effect at `cell`, whose block is `block`.
    ///
    /// Returns `true` when a particle was spawned.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        block: &str,
        cell: BlockPos,
        accessor: &mut dyn Accessor,
        rng: &mut R,
    ) -> bool {
        if !self.matcher.matches(block, &*accessor) || !rng.random_bool(self.chance) {
            return false;
        }
        let center = cell.center();
        let command = ParticleCommand {
            particle: self.particle.clone(),
            parameters: self.parameters.clone(),
            position: Position::new(
                center.x + self.offset.x,
                center.y + self.offset.y,
                center.z + self.offset.z,
            ),
            velocity: self.velocity,
        };
        trace!(effect = %self.id, particle = %command.particle, ?cell, "Spawn particle");
        accessor.add_particle(&command);
        true
    }

    /// Drop the memoized block tag.
    pub fn invalidate_tag_caches(&mut self) {
        self.matcher.invalidate();
    }
}

/// Uniformly random cell inside `region`.
pub fn random_cell<R: Rng + ?Sized>(region: &Region, rng: &mut R) -> BlockPos {
    BlockPos::new(
        rng.random_range(region.min.x..=region.max.x),
        rng.random_range(region.min.y..=region.max.y),
        rng.random_range(region.min.z..=region.max.z),
    )
}

/// Declarative form of a [`BlockEffect`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockEffectDefinition {
    /// Rule id; missing ids are rejected at conversion.
    #[serde(default)]
    pub id: Option<String>,
    /// Block id or `#tag`.
    pub block: String,
    /// Host particle type.
    pub particle: String,
    /// Host particle parameters.
    #[serde(default)]
    pub parameters: String,
    /// Probability per sampled matching cell.
    #[serde(default = "default_chance")]
    pub chance: f64,
    /// Spawn offset from the cell centre.
    #[serde(default)]
    pub offset: Position,
    /// Initial velocity.
    #[serde(default)]
    pub velocity: Position,
}

const fn default_chance() -> f64 {
    1.0
}

impl TryFrom<BlockEffectDefinition> for BlockEffect {
    type Error = RuleError;

    fn try_from(definition: BlockEffectDefinition) -> Result<Self, Self::Error> {
        let id = definition.id.unwrap_or_default();
        Ok(Self::new(&id, &definition.block, &definition.particle, definition.chance)?
            .with_parameters(&definition.parameters)
            .with_offset(definition.offset)
            .with_velocity(definition.velocity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ambience_types::Extent;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::stub::{AccessorCommand, StubAccessor};

    #[test]
    fn certain_effect_spawns_at_offset_cell_centre() {
        let effect = BlockEffect::new("leaf_fall", "#leaves", "minecraft:falling_leaf", 1.0)
            .unwrap()
            .with_offset(Position::new(0.0, -0.6, 0.0))
            .with_velocity(Position::new(0.0, -0.05, 0.0));
        let mut stub =
            StubAccessor::new().with_tag(TagKind::Block, "leaves", &["minecraft:oak_leaves"]);
        let log = stub.command_log();
        let mut rng = SmallRng::seed_from_u64(3);

        assert!(effect.apply("minecraft:oak_leaves", BlockPos::new(2, 70, -3), &mut stub, &mut rng));
        let commands = log.snapshot();
        let Some(AccessorCommand::AddParticle(particle)) = commands.first() else {
            panic!("expected a particle");
        };
        assert!((particle.position.x - 2.5).abs() < f64::EPSILON);
        assert!((particle.position.y - 69.9).abs() < 1e-9);
        assert!((particle.position.z + 2.5).abs() < f64::EPSILON);
        assert!((particle.velocity.y + 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn non_matching_block_never_spawns() {
        let effect = BlockEffect::new("drip", "minecraft:dripstone_block", "minecraft:dripping_water", 1.0)
            .unwrap();
        let mut stub = StubAccessor::new();
        let log = stub.command_log();
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(!effect.apply("minecraft:stone", BlockPos::new(0, 0, 0), &mut stub, &mut rng));
        assert_eq!(log.particle_count(), 0);
    }

    #[test]
    fn chance_thins_out_spawns() {
        let effect = BlockEffect::new("spore", "minecraft:moss_block", "minecraft:spore_blossom_air", 0.25)
            .unwrap();
        let mut stub = StubAccessor::new();
        let mut rng = SmallRng::seed_from_u64(11);
        let spawned = (0..1000)
            .filter(|_| effect.apply("minecraft:moss_block", BlockPos::new(0, 0, 0), &mut stub, &mut rng))
            .count();
        assert!((150..350).contains(&spawned), "spawned {spawned}");
    }

    #[test]
    fn invalid_effects_are_rejected() {
        assert!(matches!(
            BlockEffect::new("x", "minecraft:stone", "p", 0.0),
            Err(RuleError::ChanceOutOfRange { .. })
        ));
        assert!(matches!(
            BlockEffect::new("x", "minecraft:stone", "p", 1.5),
            Err(RuleError::ChanceOutOfRange { .. })
        ));
        assert!(matches!(
            BlockEffect::new("x", "minecraft:stone", "p", f64::NAN),
            Err(RuleError::ChanceOutOfRange { .. })
        ));
        assert!(matches!(
            BlockEffect::new("x", "minecraft:stone", " ", 0.5),
            Err(RuleError::EmptyParticle { .. })
        ));
        assert!(matches!(
            BlockEffect::new("x", "", "p", 0.5),
            Err(RuleError::Condition { .. })
        ));
        assert_eq!(
            BlockEffect::new("", "minecraft:stone", "p", 0.5).unwrap_err(),
            RuleError::MissingId
        );
    }

    #[test]
    fn random_cells_stay_in_region() {
        let region = Region::centered(BlockPos::new(10, 64, -10), Extent::new(36, 18, 36));
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..500 {
            assert!(region.contains(random_cell(&region, &mut rng)));
        }
    }

    #[test]
    fn definition_defaults() {
        let yaml = "id: ash\nblock: minecraft:soul_sand\nparticle: minecraft:ash\n";
        let definition: BlockEffectDefinition = serde_yml::from_str(yaml).unwrap();
        assert!((definition.chance - 1.0).abs() < f64::EPSILON);
        let effect = BlockEffect::try_from(definition).unwrap();
        assert_eq!(effect.id(), "ash");
    }
}
