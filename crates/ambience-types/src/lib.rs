//! Shared type definitions for the Ambience sound engine.
//!
//! These types cross the boundary between the engine core and its hosts:
//! the host constructs [`ActorId`]s, reports [`Trigger`]s, and answers
//! accessor queries in terms of [`BlockPos`], [`Region`], and the small
//! enums below.
//!
//! # Modules
//!
//! - [`ids`] -- Actor identifiers and opaque entity handles
//! - [`enums`] -- Hands, armor slots, light kinds, tag registries, triggers
//! - [`structs`] -- Block and continuous positions, regions, extents
//! - [`value`] -- Variable values with value-equality semantics

pub mod enums;
pub mod ids;
pub mod structs;
pub mod value;

pub use enums::{ArmorSlot, Hand, LightKind, TagKind, Trigger, WeatherKind};
pub use ids::{ActorId, EntityRef};
pub use structs::{BlockPos, Extent, Position, Region};
pub use value::Value;
