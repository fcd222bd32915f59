//! Per-actor variable snapshot with change detection.
//!
//! Each refresh recomputes every [`Variable`] from the accessor (plus a few
//! derived values) and rotates the old current map into `previous`. The
//! previous map is therefore always exactly one refresh behind. Lookups by
//! name never fail: unknown names and accessor misses read as
//! [`Value::Absent`].

use std::collections::BTreeMap;

use ambience_types::{ArmorSlot, Hand, LightKind, Value};

use crate::accessor::Accessor;

/// Every variable the snapshot tracks.
///
/// Names are the `snake_case` strings rule definitions use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    /// Block x coordinate.
    X,
    /// Block y coordinate.
    Y,
    /// Block z coordinate.
    Z,
    /// Health.
    Health,
    /// Food level.
    FoodLevel,
    /// Head under water.
    Submerged,
    /// Sneaking.
    Sneaking,
    /// Standing on ground.
    OnGround,
    /// Riding another entity.
    Riding,
    /// Derived: in the air on one's own accord.
    Jumping,
    /// Item id in the main hand.
    ItemMainHand,
    /// Item id in the off hand.
    ItemOffHand,
    /// Item id in the head slot.
    ArmorHead,
    /// Item id in the chest slot.
    ArmorChest,
    /// Item id in the legs slot.
    ArmorLegs,
    /// Item id in the feet slot.
    ArmorFeet,
    /// Time of day, `0..24000`.
    DayTime,
    /// Raining.
    Raining,
    /// Thundering.
    Thundering,
    /// Dimension id.
    Dimension,
    /// Biome id at the actor's feet.
    Biome,
    /// Block id the actor stands in.
    Block,
    /// Block id below the actor's feet.
    BlockUnder,
    /// Combined light level.
    Light,
    /// Block light level.
    BlockLight,
    /// Sky light level.
    SkyLight,
    /// Biome temperature.
    Temperature,
    /// Biome humidity.
    Humidity,
}

impl Variable {
    /// Every variable, in refresh order.
    pub const ALL: [Self; 28] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::Health,
        Self::FoodLevel,
        Self::Submerged,
        Self::Sneaking,
        Self::OnGround,
        Self::Riding,
        Self::Jumping,
        Self::ItemMainHand,
        Self::ItemOffHand,
        Self::ArmorHead,
        Self::ArmorChest,
        Self::ArmorLegs,
        Self::ArmorFeet,
        Self::DayTime,
        Self::Raining,
        Self::Thundering,
        Self::Dimension,
        Self::Biome,
        Self::Block,
        Self::BlockUnder,
        Self::Light,
        Self::BlockLight,
        Self::SkyLight,
        Self::Temperature,
        Self::Humidity,
    ];

    /// The name used in rule definitions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Health => "health",
            Self::FoodLevel => "food_level",
            Self::Submerged => "submerged",
            Self::Sneaking => "sneaking",
            Self::OnGround => "on_ground",
            Self::Riding => "riding",
            Self::Jumping => "jumping",
            Self::ItemMainHand => "item_main_hand",
            Self::ItemOffHand => "item_off_hand",
            Self::ArmorHead => "armor_head",
            Self::ArmorChest => "armor_chest",
            Self::ArmorLegs => "armor_legs",
            Self::ArmorFeet => "armor_feet",
            Self::DayTime => "day_time",
            Self::Raining => "raining",
            Self::Thundering => "thundering",
            Self::Dimension => "dimension",
            Self::Biome => "biome",
            Self::Block => "block",
            Self::BlockUnder => "block_under",
            Self::Light => "light",
            Self::BlockLight => "block_light",
            Self::SkyLight => "sky_light",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }

    /// Look a variable up by its rule-definition name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|variable| variable.name() == name)
    }

    /// Whether the variable tracks a held item.
    pub const fn is_held_item(self) -> bool {
        matches!(self, Self::ItemMainHand | Self::ItemOffHand)
    }

    /// Compute the variable's current value.
    fn compute(self, accessor: &dyn Accessor) -> Value {
        let feet = accessor.position().block_pos();
        match self {
            Self::X => Value::Number(f64::from(feet.x)),
            Self::Y => Value::Number(f64::from(feet.y)),
            Self::Z => Value::Number(f64::from(feet.z)),
            Self::Health => Value::Number(accessor.health()),
            Self::FoodLevel => Value::Number(accessor.food_level()),
            Self::Submerged => Value::Bool(accessor.is_submerged()),
            Self::Sneaking => Value::Bool(accessor.is_sneaking()),
            Self::OnGround => Value::Bool(accessor.is_on_ground()),
            Self::Riding => Value::Bool(accessor.has_vehicle()),
            Self::Jumping => Value::Bool(is_jumping(accessor)),
            Self::ItemMainHand => Value::text(accessor.held_item(Hand::Main)),
            Self::ItemOffHand => Value::text(accessor.held_item(Hand::Off)),
            Self::ArmorHead => Value::text(accessor.armor(ArmorSlot::Head)),
            Self::ArmorChest => Value::text(accessor.armor(ArmorSlot::Chest)),
            Self::ArmorLegs => Value::text(accessor.armor(ArmorSlot::Legs)),
            Self::ArmorFeet => Value::text(accessor.armor(ArmorSlot::Feet)),
            Self::DayTime => Value::Number(ticks_to_f64(crate::clock::time_of_day(
                accessor.day_time(),
            ))),
            Self::Raining => Value::Bool(accessor.is_raining()),
            Self::Thundering => Value::Bool(accessor.is_thundering()),
            Self::Dimension => Value::text(accessor.dimension()),
            Self::Biome => Value::text(accessor.biome(feet)),
            Self::Block => Value::text(accessor.block(feet)),
            Self::BlockUnder => Value::text(accessor.block(feet.below())),
            Self::Light => light_value(accessor, LightKind::Combined),
            Self::BlockLight => light_value(accessor, LightKind::Block),
            Self::SkyLight => light_value(accessor, LightKind::Sky),
            Self::Temperature => Value::number(accessor.temperature(feet)),
            Self::Humidity => Value::number(accessor.humidity(feet)),
        }
    }
}

impl core::fmt::Display for Variable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// In the air under the actor's own power: not on ground, not riding,
/// not gliding, not climbing.
pub fn is_jumping(accessor: &dyn Accessor) -> bool {
    !accessor.is_on_ground()
        && !accessor.has_vehicle()
        && !accessor.is_gliding()
        && !accessor.is_climbing()
}

/// Day times are below 24000, well inside the exact `f64` range.
#[allow(clippy::cast_precision_loss)]
const fn ticks_to_f64(ticks: u64) -> f64 {
    ticks as f64
}

fn light_value(accessor: &dyn Accessor, kind: LightKind) -> Value {
    let feet = accessor.position().block_pos();
    Value::number(accessor.light(feet, kind).map(f64::from))
}

/// Current and previous variable values for one actor.
#[derive(Debug, Clone, Default)]
pub struct VariableSnapshot {
    current: BTreeMap<Variable, Value>,
    previous: BTreeMap<Variable, Value>,
}

impl VariableSnapshot {
    /// Create an empty snapshot (every variable absent on both sides).
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every variable and rotate current into previous.
    pub fn refresh(&mut self, accessor: &dyn Accessor) {
        let next: BTreeMap<Variable, Value> = Variable::ALL
            .into_iter()
            .map(|variable| (variable, variable.compute(accessor)))
            .collect();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Current value by name, [`Value::Absent`] if unknown.
    pub fn get(&self, name: &str) -> Value {
        Variable::from_name(name).map_or(Value::Absent, |variable| self.value(variable))
    }

    /// Previous value by name, [`Value::Absent`] if unknown.
    pub fn get_previous(&self, name: &str) -> Value {
        Variable::from_name(name).map_or(Value::Absent, |variable| self.previous_value(variable))
    }

    /// Current value of a typed variable.
    pub fn value(&self, variable: Variable) -> Value {
        self.current.get(&variable).cloned().unwrap_or_default()
    }

    /// Previous value of a typed variable.
    pub fn previous_value(&self, variable: Variable) -> Value {
        self.previous.get(&variable).cloned().unwrap_or_default()
    }

    /// Whether a variable's value differs between the last two refreshes.
    pub fn changed(&self, variable: Variable) -> bool {
        self.value(variable) != self.previous_value(variable)
    }
}
