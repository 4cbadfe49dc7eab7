//! Shared geometry crate for native-pong.
//!
//! This crate contains:
//! - The `Volume` axis-aligned rectangle and the pure geometric functions
//!   the collision engine is built on
//! - The `Sides` bitmask used for contact faces and movement constraints
//! - Shared math types

mod sides;
mod volume;

pub use sides::Sides;
pub use volume::{
    center, closest_side, constrain, extending_sides, find_direction, inside, inside_snap,
    intersecting, is_in, outside_snap, side_distances, vector_towards, volume_quads, Volume,
};

/// 2D point/vector with f64 components, using glam's DVec2.
pub type Vec2 = glam::DVec2;
