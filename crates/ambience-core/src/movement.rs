//! Movement tracking: derives footstep, land, and jump triggers from
//! consecutive position and flag samples.

use ambience_types::{Position, Trigger};

use crate::accessor::Accessor;
use crate::config::FootstepConfig;
use crate::variables::is_jumping;

/// Per-actor movement state carried between ticks.
#[derive(Debug, Clone, Default)]
pub struct Movement {
    previous: Option<Position>,
    was_on_ground: bool,
    was_jumping: bool,
    distance: f64,
}

impl Movement {
    /// Create a tracker with no previous sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Horizontal distance walked since the last footstep.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Take one sample and return the triggers it produced.
    ///
    /// The first sample only records state. Distance accumulates while the
    /// actor is on the ground, not submerged, and not riding; one stride
    /// (doubled while sneaking) yields one footstep.
    pub fn update(&mut self, accessor: &dyn Accessor, config: &FootstepConfig) -> Vec<Trigger> {
        let position = accessor.position();
        let on_ground = accessor.is_on_ground();
        let jumping = is_jumping(accessor);
        let mut triggers = Vec::new();

        if let Some(previous) = self.previous {
            if on_ground && !accessor.is_submerged() && !accessor.has_vehicle() {
                self.distance += previous.horizontal_distance(position);
                let stride = if accessor.is_sneaking() {
                    config.stride * 2.0
                } else {
                    config.stride
                };
                if self.distance >= stride {
                    self.distance -= stride;
                    // A teleport covers many strides at once; count it as one.
                    if self.distance >= stride {
                        self.distance = 0.0;
                    }
                    triggers.push(Trigger::Footstep);
                }
            }
            if on_ground && !self.was_on_ground {
                triggers.push(Trigger::Land);
                self.distance = 0.0;
            }
            if jumping && !self.was_jumping {
                triggers.push(Trigger::Jump);
            }
        }

        self.previous = Some(position);
        self.was_on_ground = on_ground;
        self.was_jumping = jumping;
        triggers
    }
}
