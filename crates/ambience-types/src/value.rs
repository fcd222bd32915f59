//! Values stored in a variable snapshot.
//!
//! Change detection compares values, never identities: two snapshots that
//! hold equal values for a variable are unchanged even if both were
//! recomputed from scratch. Numbers compare by total order, so `NaN` equals
//! itself and a variable stuck at `NaN` is not reported as changing every
//! tick.

use serde::{Deserialize, Serialize};

/// A single variable value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Numeric reading (coordinates, light, vitals, time).
    Number(f64),
    /// Identifier or free text (block, biome, item ids).
    Text(String),
    /// No data: unknown variable or the accessor could not resolve it.
    #[default]
    Absent,
}

impl Value {
    /// Build a text value, mapping `None` to [`Value::Absent`].
    pub fn text(value: Option<String>) -> Self {
        value.map_or(Self::Absent, Self::Text)
    }

    /// Build a numeric value, mapping `None` to [`Value::Absent`].
    pub fn number(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Number)
    }

    /// Whether this is [`Value::Absent`].
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Numeric view, if this is a number.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean view, if this is a boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b).is_eq(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Absent, Self::Absent) => true,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Absent => f.write_str("<absent>"),
        }
    }
}
