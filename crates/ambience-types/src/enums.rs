//! Enumeration types shared between the engine and its hosts.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Which hand an item is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    /// The primary hand.
    Main,
    /// The secondary hand.
    Off,
}

/// An armor slot, head to toe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorSlot {
    /// Helmet slot.
    Head,
    /// Chestplate slot.
    Chest,
    /// Leggings slot.
    Legs,
    /// Boots slot.
    Feet,
}

impl ArmorSlot {
    /// All slots in head-to-toe order.
    pub const ALL: [Self; 4] = [Self::Head, Self::Chest, Self::Legs, Self::Feet];
}

// ---------------------------------------------------------------------------
// World lookups
// ---------------------------------------------------------------------------

/// Which light level to read at a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    /// Combined light level (maximum of block and sky light).
    #[default]
    Combined,
    /// Light emitted by blocks only.
    Block,
    /// Light from the sky only.
    Sky,
}

/// Registry a tag name is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// Block tags (`#logs`, `#leaves`).
    Block,
    /// Biome tags (`#is_forest`).
    Biome,
    /// Item tags (`#swords`).
    Item,
    /// Entity type tags (`#undead`).
    Entity,
}

impl TagKind {
    /// Lowercase label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Biome => "biome",
            Self::Item => "item",
            Self::Entity => "entity",
        }
    }
}

/// Weather states a condition can test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    /// Neither raining nor thundering.
    Clear,
    /// Raining (thunderstorms count as rain).
    Rain,
    /// Thundering.
    Thunder,
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// A discrete event that fires triggered sounds.
///
/// The first group is reported by the host from its input events; the
/// second group is derived by the engine from consecutive movement samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The actor hit a block.
    AttackBlock,
    /// The actor hit an entity.
    AttackHit,
    /// The actor swung without hitting anything.
    AttackSwing,
    /// The actor used the item in the main hand.
    UseItemMainHand,
    /// The actor used the item in the off hand.
    UseItemOffHand,
    /// The actor walked one stride on the ground.
    Footstep,
    /// The actor touched the ground after being airborne.
    Land,
    /// The actor left the ground by jumping.
    Jump,
}

impl Trigger {
    /// Whether the trigger is derived from movement (and therefore governed
    /// by the footstep settings).
    pub const fn is_movement(self) -> bool {
        matches!(self, Self::Footstep | Self::Land | Self::Jump)
    }

    /// Lowercase label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AttackBlock => "attack_block",
            Self::AttackHit => "attack_hit",
            Self::AttackSwing => "attack_swing",
            Self::UseItemMainHand => "use_item_main_hand",
            Self::UseItemOffHand => "use_item_off_hand",
            Self::Footstep => "footstep",
            Self::Land => "land",
            Self::Jump => "jump",
        }
    }
}

impl core::fmt::Display for Trigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
