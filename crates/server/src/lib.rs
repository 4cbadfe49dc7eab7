//! Native Pong game-state engine library.

pub mod config;
pub mod error;
pub mod object;
pub mod snapshot;
pub mod spatial;
pub mod tree;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use error::ObjectError;
pub use object::{Object, ObjectId, ObjectManager, Physics};
pub use snapshot::Snapshot;
pub use spatial::{NodeContent, Quadtree};
pub use world::World;
