//! Error types for the `ambience-core` crate.
//!
//! Construction-time validation is the only place the engine fails: a
//! malformed condition or rule is rejected before it reaches the registry.
//! Evaluation never returns errors; accessor misses read as "no data".

use ambience_types::ActorId;

/// A condition definition violated one of its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    /// A count threshold below 1.
    #[error("minimum count {min_count} is outside valid range [1, ...]")]
    MinCountOutOfRange {
        /// The rejected threshold.
        min_count: i64,
    },

    /// An id-or-tag string was empty (or only `#`).
    #[error("{what} cannot be empty")]
    EmptyIdentifier {
        /// Which field was empty.
        what: &'static str,
    },

    /// The variable name is not tracked by the snapshot.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// A `[min, max]` pair was inverted or not a number.
    #[error("invalid {what} range: {reason}")]
    InvalidRange {
        /// Which range was invalid.
        what: &'static str,
        /// Explanation.
        reason: String,
    },
}

/// A rule definition violated one of its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// The id was missing or blank.
    #[error("rule id cannot be empty")]
    MissingId,

    /// Another rule of the same kind already uses this id.
    #[error("duplicate rule id: {id}")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },

    /// No sounds were defined.
    #[error("rule {id}: no sounds defined")]
    NoSounds {
        /// The rule id.
        id: String,
    },

    /// A sound emission had a blank sound id.
    #[error("rule {id}: sound id cannot be empty")]
    EmptySound {
        /// The rule id.
        id: String,
    },

    /// A block effect had a blank particle id.
    #[error("rule {id}: particle cannot be empty")]
    EmptyParticle {
        /// The rule id.
        id: String,
    },

    /// A cooldown bound was negative.
    #[error("rule {id}: cooldown {bound} cannot be negative (got {value})")]
    NegativeCooldown {
        /// The rule id.
        id: String,
        /// `minimum` or `maximum`.
        bound: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// A cooldown bound did not fit in the tick counter.
    #[error("rule {id}: cooldown {bound} {value} does not fit in 32 bits")]
    CooldownTooLarge {
        /// The rule id.
        id: String,
        /// `minimum` or `maximum`.
        bound: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// The cooldown minimum exceeded the maximum.
    #[error("rule {id}: cooldown minimum {min} cannot be larger than maximum {max}")]
    InvertedCooldown {
        /// The rule id.
        id: String,
        /// Rejected minimum.
        min: i64,
        /// Rejected maximum.
        max: i64,
    },

    /// A probability outside `(0, 1]`.
    #[error("rule {id}: chance {chance} is outside (0, 1]")]
    ChanceOutOfRange {
        /// The rule id.
        id: String,
        /// The rejected chance.
        chance: f64,
    },

    /// The entry did not have the shape of its rule kind.
    #[error("malformed rule definition: {reason}")]
    Malformed {
        /// The deserializer's explanation.
        reason: String,
    },

    /// One of the rule's conditions was invalid.
    #[error("rule {id}: {source}")]
    Condition {
        /// The rule id.
        id: String,
        /// The underlying condition error.
        source: ConditionError,
    },
}

/// Errors raised by the scheduler's actor registry and tick loop.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// An actor with this id is already registered.
    #[error("actor already registered: {0}")]
    DuplicateActor(ActorId),

    /// No actor with this id is registered.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// The tick clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },
}
