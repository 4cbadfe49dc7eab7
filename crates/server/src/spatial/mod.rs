//! Spatial indexing of tracked objects.

mod quadtree;

pub use quadtree::{NodeContent, Quadtree};
