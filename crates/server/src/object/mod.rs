//! Tracked game objects.
//!
//! This module defines the object records the spatial index tracks and the
//! manager that owns them.

mod manager;

pub use manager::ObjectManager;

use geom::{Sides, Vec2, Volume};
use serde::{Deserialize, Serialize};

/// Handle for a tracked object.
///
/// `0` is reserved as "no object" and is never issued by the allocator;
/// fallible insertions return it instead of an error.
pub type ObjectId = u16;

/// Physics role of an object, with the per-role movement payload.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Physics {
    /// Not simulated; the stepper leaves it alone.
    #[default]
    Undefined,
    /// Paddle teleporting toward an absolute destination.
    Paddle { destination: Vec2 },
    /// Ball integrating a velocity every tick.
    Ball { velocity: Vec2 },
}

/// A tracked object: its bounding volume, its physics role, and the sides it
/// is not allowed to move toward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Object {
    pub volume: Volume,
    pub physics: Physics,
    pub constraints: Sides,
}

impl Object {
    /// Create a paddle resting at its current position.
    pub fn paddle(volume: Volume) -> Self {
        Self {
            volume,
            physics: Physics::Paddle {
                destination: volume.pos,
            },
            constraints: Sides::NONE,
        }
    }

    /// Create a ball with an initial velocity.
    pub fn ball(volume: Volume, velocity: Vec2) -> Self {
        Self {
            volume,
            physics: Physics::Ball { velocity },
            constraints: Sides::NONE,
        }
    }

    #[inline]
    pub fn is_paddle(&self) -> bool {
        matches!(self.physics, Physics::Paddle { .. })
    }

    #[inline]
    pub fn is_ball(&self) -> bool {
        matches!(self.physics, Physics::Ball { .. })
    }
}
