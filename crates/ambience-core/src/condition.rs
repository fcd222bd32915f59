//! Predicates evaluated against one actor's cached state.
//!
//! [`Condition`] is a closed set of variants with one evaluation arm each.
//! Conditions are immutable after construction; the only interior state is
//! the tag cache inside a [`TagMatcher`], which resolves a `#tag` name to
//! concrete ids on first use and keeps the result until
//! [`Condition::invalidate_tag_caches`] is called on a data reload.
//!
//! Evaluation is pure with respect to the actor: it reads the scanner cache,
//! the variable snapshot, and accessor lookups, and never mutates them.
//! Accessor misses evaluate to `false`.

use std::sync::OnceLock;

use ambience_types::{BlockPos, Hand, LightKind, TagKind, Value, WeatherKind};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::accessor::Accessor;
use crate::clock::day_time_in_window;
use crate::config::EngineConfig;
use crate::error::ConditionError;
use crate::scanner::Scanner;
use crate::variables::{Variable, VariableSnapshot};

// ---------------------------------------------------------------------------
// Evaluation context
// ---------------------------------------------------------------------------

/// Everything a condition may read for one actor in one tick.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    /// The actor's accessor.
    pub accessor: &'a dyn Accessor,
    /// The actor's scanner cache.
    pub scanner: &'a Scanner,
    /// The actor's variable snapshot.
    pub variables: &'a VariableSnapshot,
    /// Engine policies.
    pub config: &'a EngineConfig,
}

impl EvalContext<'_> {
    fn feet(&self) -> BlockPos {
        self.accessor.position().block_pos()
    }
}

// ---------------------------------------------------------------------------
// Tag matcher
// ---------------------------------------------------------------------------

/// Matches an id, or any member of a tag written as `#name`.
#[derive(Debug, Clone)]
pub struct TagMatcher {
    kind: TagKind,
    pattern: String,
    resolved: OnceLock<Vec<String>>,
}

impl TagMatcher {
    /// Parse an id-or-tag string for the given registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::EmptyIdentifier`] if the string (or the tag
    /// name after `#`) is blank.
    pub fn new(kind: TagKind, pattern: &str, what: &'static str) -> Result<Self, ConditionError> {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern == "#" {
            return Err(ConditionError::EmptyIdentifier { what });
        }
        let resolved = OnceLock::new();
        if !pattern.starts_with('#') {
            // Plain ids need no lookup; fill the cache up front.
            let _ = resolved.set(vec![pattern.to_owned()]);
        }
        Ok(Self {
            kind,
            pattern: pattern.to_owned(),
            resolved,
        })
    }

    /// Whether the matcher names a tag.
    pub fn is_tag(&self) -> bool {
        self.pattern.starts_with('#')
    }

    /// The id or `#tag` string as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Concrete ids this matcher accepts, resolving the tag on first use.
    ///
    /// Resolution errors are logged and memoized as an empty list.
    pub fn ids(&self, accessor: &dyn Accessor) -> &[String] {
        self.resolved.get_or_init(|| {
            let name = self.pattern.trim_start_matches('#');
            match accessor.tag(self.kind, name) {
                Ok(ids) => {
                    debug!(kind = self.kind.as_str(), tag = name, members = ids.len(), "Resolved tag");
                    ids
                }
                Err(err) => {
                    warn!(kind = self.kind.as_str(), tag = name, error = %err, "Tag resolution failed");
                    Vec::new()
                }
            }
        })
    }

    /// Whether `id` is accepted.
    pub fn matches(&self, id: &str, accessor: &dyn Accessor) -> bool {
        self.ids(accessor).iter().any(|candidate| candidate == id)
    }

    /// Drop a resolved tag so the next evaluation looks it up again.
    pub fn invalidate(&mut self) {
        if self.is_tag() {
            let _ = self.resolved.take();
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A predicate over one actor's current state.
#[derive(Debug, Clone)]
pub enum Condition {
    /// At least `min_count` scanned cells hold a matching block.
    Blocks {
        /// Block id or `#tag`.
        matcher: TagMatcher,
        /// Threshold, at least 1.
        min_count: u32,
    },
    /// At least `min_count` scanned entities are of a matching type.
    Entities {
        /// Entity type id or `#tag`.
        matcher: TagMatcher,
        /// Threshold, at least 1.
        min_count: u32,
    },
    /// The variable's value differs from the previous refresh.
    VariableChanged {
        /// Tracked variable.
        variable: Variable,
    },
    /// The variable equals a value.
    VariableEquals {
        /// Tracked variable.
        variable: Variable,
        /// Expected value.
        value: Value,
    },
    /// The numeric variable lies in `[min, max]`.
    VariableRange {
        /// Tracked variable.
        variable: Variable,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// The biome at the actor's feet matches.
    Biome {
        /// Biome id or `#tag`.
        matcher: TagMatcher,
    },
    /// The block at an offset from the actor's feet matches.
    BlockAt {
        /// Block id or `#tag`.
        matcher: TagMatcher,
        /// Offset from the feet cell.
        offset: [i32; 3],
    },
    /// The item held in a hand matches.
    Item {
        /// Which hand.
        hand: Hand,
        /// Item id or `#tag`.
        matcher: TagMatcher,
    },
    /// The actor is in a dimension.
    Dimension {
        /// Dimension id.
        id: String,
    },
    /// The actor's block y lies in `[min, max]`.
    Height {
        /// Inclusive lower bound.
        min: i32,
        /// Inclusive upper bound.
        max: i32,
    },
    /// The light level at the actor's feet lies in `[min, max]`.
    Light {
        /// Which light level.
        kind: LightKind,
        /// Inclusive lower bound.
        min: u8,
        /// Inclusive upper bound.
        max: u8,
    },
    /// Day time lies in `[from, to]`, wrapping across midnight.
    DayTime {
        /// Window start.
        from: u64,
        /// Window end.
        to: u64,
    },
    /// Current weather.
    Weather {
        /// Expected weather.
        weather: WeatherKind,
    },
    /// Every child holds (short-circuit).
    All(Vec<Condition>),
    /// At least one child holds (short-circuit).
    Any(Vec<Condition>),
    /// The child does not hold.
    Not(Box<Condition>),
}

impl Condition {
    /// Entity count threshold over an entity type or `#tag`.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank or `min_count < 1`.
    pub fn entities(entity_or_tag: &str, min_count: i64) -> Result<Self, ConditionError> {
        Ok(Self::Entities {
            matcher: TagMatcher::new(TagKind::Entity, entity_or_tag, "entity / entity tag")?,
            min_count: validate_min_count(min_count)?,
        })
    }

    /// Block count threshold over a block id or `#tag`.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank or `min_count < 1`.
    pub fn blocks(block_or_tag: &str, min_count: i64) -> Result<Self, ConditionError> {
        Ok(Self::Blocks {
            matcher: TagMatcher::new(TagKind::Block, block_or_tag, "block / block tag")?,
            min_count: validate_min_count(min_count)?,
        })
    }

    /// True when the named variable changed since the last refresh.
    ///
    /// # Errors
    ///
    /// Fails if the name is blank or not a tracked variable.
    pub fn variable_changed(name: &str) -> Result<Self, ConditionError> {
        Ok(Self::VariableChanged {
            variable: parse_variable(name)?,
        })
    }

    /// True when the named variable equals `value`.
    ///
    /// # Errors
    ///
    /// Fails if the name is not a tracked variable.
    pub fn variable_equals(name: &str, value: Value) -> Result<Self, ConditionError> {
        Ok(Self::VariableEquals {
            variable: parse_variable(name)?,
            value,
        })
    }

    /// True when the named numeric variable lies in `[min, max]`.
    ///
    /// # Errors
    ///
    /// Fails if the name is unknown or the bounds are inverted or `NaN`.
    pub fn variable_range(name: &str, min: f64, max: f64) -> Result<Self, ConditionError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ConditionError::InvalidRange {
                what: "variable",
                reason: format!("[{min}, {max}]"),
            });
        }
        Ok(Self::VariableRange {
            variable: parse_variable(name)?,
            min,
            max,
        })
    }

    /// True when the biome at the actor's feet matches.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank.
    pub fn biome(biome_or_tag: &str) -> Result<Self, ConditionError> {
        Ok(Self::Biome {
            matcher: TagMatcher::new(TagKind::Biome, biome_or_tag, "biome / biome tag")?,
        })
    }

    /// True when the block at `offset` from the feet matches.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank.
    pub fn block_at(block_or_tag: &str, offset: [i32; 3]) -> Result<Self, ConditionError> {
        Ok(Self::BlockAt {
            matcher: TagMatcher::new(TagKind::Block, block_or_tag, "block / block tag")?,
            offset,
        })
    }

    /// True when the item in `hand` matches.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank.
    pub fn item(hand: Hand, item_or_tag: &str) -> Result<Self, ConditionError> {
        Ok(Self::Item {
            hand,
            matcher: TagMatcher::new(TagKind::Item, item_or_tag, "item / item tag")?,
        })
    }

    /// True in the given dimension.
    ///
    /// # Errors
    ///
    /// Fails if the id is blank.
    pub fn dimension(id: &str) -> Result<Self, ConditionError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ConditionError::EmptyIdentifier { what: "dimension" });
        }
        Ok(Self::Dimension { id: id.to_owned() })
    }

    /// True when the actor's block y lies in `[min, max]`.
    ///
    /// # Errors
    ///
    /// Fails if `min > max`.
    pub fn height(min: i32, max: i32) -> Result<Self, ConditionError> {
        if min > max {
            return Err(ConditionError::InvalidRange {
                what: "height",
                reason: format!("[{min}, {max}]"),
            });
        }
        Ok(Self::Height { min, max })
    }

    /// True when the light level lies in `[min, max]`.
    ///
    /// # Errors
    ///
    /// Fails if `min > max` or `max > 15`.
    pub fn light(kind: LightKind, min: u8, max: u8) -> Result<Self, ConditionError> {
        if min > max || max > 15 {
            return Err(ConditionError::InvalidRange {
                what: "light",
                reason: format!("[{min}, {max}] must be ordered within [0, 15]"),
            });
        }
        Ok(Self::Light { kind, min, max })
    }

    /// Negate a condition.
    pub fn negate(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Evaluate against one actor.
    pub fn matches(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::Blocks { matcher, min_count } => {
                count_matches(matcher, ctx.scanner.block_data(), ctx) >= *min_count
            }
            Self::Entities { matcher, min_count } => {
                count_matches(matcher, ctx.scanner.entity_data(), ctx) >= *min_count
            }
            Self::VariableChanged { variable } => {
                if variable.is_held_item() && !ctx.config.ambient_events.trigger_held_item_sounds {
                    return false;
                }
                ctx.variables.changed(*variable)
            }
            Self::VariableEquals { variable, value } => ctx.variables.value(*variable) == *value,
            Self::VariableRange { variable, min, max } => ctx
                .variables
                .value(*variable)
                .as_number()
                .is_some_and(|n| n >= *min && n <= *max),
            Self::Biome { matcher } => {
                let feet = ctx.feet();
                lookup_matches(matcher, ctx.accessor.biome(feet), "biome", feet, ctx)
            }
            Self::BlockAt { matcher, offset } => {
                let [dx, dy, dz] = *offset;
                let pos = ctx.feet().offset(dx, dy, dz);
                lookup_matches(matcher, ctx.accessor.block(pos), "block", pos, ctx)
            }
            Self::Item { hand, matcher } => ctx
                .accessor
                .held_item(*hand)
                .is_some_and(|item| matcher.matches(&item, ctx.accessor)),
            Self::Dimension { id } => ctx
                .accessor
                .dimension()
                .is_some_and(|dimension| dimension == *id),
            Self::Height { min, max } => {
                let y = ctx.feet().y;
                y >= *min && y <= *max
            }
            Self::Light { kind, min, max } => {
                let feet = ctx.feet();
                match ctx.accessor.light(feet, *kind) {
                    Some(level) => level >= *min && level <= *max,
                    None => {
                        debug!(?feet, "Light lookup missed");
                        false
                    }
                }
            }
            Self::DayTime { from, to } => day_time_in_window(ctx.accessor.day_time(), *from, *to),
            Self::Weather { weather } => {
                let raining = ctx.accessor.is_raining();
                let thundering = ctx.accessor.is_thundering();
                match weather {
                    WeatherKind::Clear => !raining && !thundering,
                    WeatherKind::Rain => raining,
                    WeatherKind::Thunder => thundering,
                }
            }
            Self::All(children) => children.iter().all(|child| child.matches(ctx)),
            Self::Any(children) => children.iter().any(|child| child.matches(ctx)),
            Self::Not(child) => !child.matches(ctx),
        }
    }

    /// Drop every memoized tag in this condition tree.
    pub fn invalidate_tag_caches(&mut self) {
        match self {
            Self::Blocks { matcher, .. }
            | Self::Entities { matcher, .. }
            | Self::Biome { matcher }
            | Self::BlockAt { matcher, .. }
            | Self::Item { matcher, .. } => matcher.invalidate(),
            Self::All(children) | Self::Any(children) => {
                children.iter_mut().for_each(Self::invalidate_tag_caches);
            }
            Self::Not(child) => child.invalidate_tag_caches(),
            Self::VariableChanged { .. }
            | Self::VariableEquals { .. }
            | Self::VariableRange { .. }
            | Self::Dimension { .. }
            | Self::Height { .. }
            | Self::Light { .. }
            | Self::DayTime { .. }
            | Self::Weather { .. } => {}
        }
    }
}

/// True when every condition holds; stops at the first failure.
pub fn all_match(conditions: &[Condition], ctx: &EvalContext<'_>) -> bool {
    conditions.iter().all(|condition| condition.matches(ctx))
}

/// True when any condition holds; stops at the first hit.
pub fn any_match(conditions: &[Condition], ctx: &EvalContext<'_>) -> bool {
    conditions.iter().any(|condition| condition.matches(ctx))
}

fn count_matches(
    matcher: &TagMatcher,
    counts: Option<&std::collections::BTreeMap<String, u32>>,
    ctx: &EvalContext<'_>,
) -> u32 {
    let Some(counts) = counts else {
        return 0;
    };
    matcher
        .ids(ctx.accessor)
        .iter()
        .filter_map(|id| counts.get(id))
        .fold(0_u32, |total, count| total.saturating_add(*count))
}

fn lookup_matches(
    matcher: &TagMatcher,
    found: Option<String>,
    what: &'static str,
    pos: BlockPos,
    ctx: &EvalContext<'_>,
) -> bool {
    match found {
        Some(id) => matcher.matches(&id, ctx.accessor),
        None => {
            debug!(what, ?pos, "World lookup missed");
            false
        }
    }
}

fn validate_min_count(min_count: i64) -> Result<u32, ConditionError> {
    u32::try_from(min_count)
        .ok()
        .filter(|count| *count >= 1)
        .ok_or(ConditionError::MinCountOutOfRange { min_count })
}

fn parse_variable(name: &str) -> Result<Variable, ConditionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConditionError::EmptyIdentifier { what: "variable" });
    }
    Variable::from_name(name).ok_or_else(|| ConditionError::UnknownVariable(name.to_owned()))
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Declarative form of a [`Condition`], deserializable from any serde
/// format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionDefinition {
    /// See [`Condition::Blocks`].
    Blocks {
        /// Block id or `#tag`.
        block: String,
        /// Threshold.
        min_count: i64,
    },
    /// See [`Condition::Entities`].
    Entities {
        /// Entity type id or `#tag`.
        entity: String,
        /// Threshold.
        min_count: i64,
    },
    /// See [`Condition::VariableChanged`].
    VariableChanged {
        /// Variable name.
        variable: String,
    },
    /// See [`Condition::VariableEquals`].
    VariableEquals {
        /// Variable name.
        variable: String,
        /// Expected value.
        value: Value,
    },
    /// See [`Condition::VariableRange`].
    VariableRange {
        /// Variable name.
        variable: String,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// See [`Condition::Biome`].
    Biome {
        /// Biome id or `#tag`.
        biome: String,
    },
    /// See [`Condition::BlockAt`].
    BlockAt {
        /// Block id or `#tag`.
        block: String,
        /// Offset from the feet cell.
        #[serde(default)]
        offset: [i32; 3],
    },
    /// See [`Condition::Item`].
    Item {
        /// Which hand.
        #[serde(default = "default_hand")]
        hand: Hand,
        /// Item id or `#tag`.
        item: String,
    },
    /// See [`Condition::Dimension`].
    Dimension {
        /// Dimension id.
        dimension: String,
    },
    /// See [`Condition::Height`].
    Height {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
    /// See [`Condition::Light`].
    Light {
        /// Which light level.
        #[serde(default)]
        kind: LightKind,
        /// Lower bound.
        min: u8,
        /// Upper bound.
        max: u8,
    },
    /// See [`Condition::DayTime`].
    DayTime {
        /// Window start.
        from: u64,
        /// Window end.
        to: u64,
    },
    /// See [`Condition::Weather`].
    Weather {
        /// Expected weather.
        weather: WeatherKind,
    },
    /// See [`Condition::All`].
    All {
        /// Children.
        conditions: Vec<ConditionDefinition>,
    },
    /// See [`Condition::Any`].
    Any {
        /// Children.
        conditions: Vec<ConditionDefinition>,
    },
    /// See [`Condition::Not`].
    Not {
        /// Child.
        condition: Box<ConditionDefinition>,
    },
}

const fn default_hand() -> Hand {
    Hand::Main
}

impl TryFrom<ConditionDefinition> for Condition {
    type Error = ConditionError;

    fn try_from(definition: ConditionDefinition) -> Result<Self, Self::Error> {
        match definition {
            ConditionDefinition::Blocks { block, min_count } => Self::blocks(&block, min_count),
            ConditionDefinition::Entities { entity, min_count } => {
                Self::entities(&entity, min_count)
            }
            ConditionDefinition::VariableChanged { variable } => Self::variable_changed(&variable),
            ConditionDefinition::VariableEquals { variable, value } => {
                Self::variable_equals(&variable, value)
            }
            ConditionDefinition::VariableRange { variable, min, max } => {
                Self::variable_range(&variable, min, max)
            }
            ConditionDefinition::Biome { biome } => Self::biome(&biome),
            ConditionDefinition::BlockAt { block, offset } => Self::block_at(&block, offset),
            ConditionDefinition::Item { hand, item } => Self::item(hand, &item),
            ConditionDefinition::Dimension { dimension } => Self::dimension(&dimension),
            ConditionDefinition::Height { min, max } => Self::height(min, max),
            ConditionDefinition::Light { kind, min, max } => Self::light(kind, min, max),
            ConditionDefinition::DayTime { from, to } => Ok(Self::DayTime { from, to }),
            ConditionDefinition::Weather { weather } => Ok(Self::Weather { weather }),
            ConditionDefinition::All { conditions } => Ok(Self::All(convert_all(conditions)?)),
            ConditionDefinition::Any { conditions } => Ok(Self::Any(convert_all(conditions)?)),
            ConditionDefinition::Not { condition } => Ok(Self::negate(Self::try_from(*condition)?)),
        }
    }
}

/// Convert a list of definitions, failing on the first invalid one.
///
/// # Errors
///
/// Returns the first [`ConditionError`] encountered.
pub fn convert_all(definitions: Vec<ConditionDefinition>) -> Result<Vec<Condition>, ConditionError> {
    definitions.into_iter().map(Condition::try_from).collect()
}
