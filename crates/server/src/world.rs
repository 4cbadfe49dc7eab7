//! World state and the per-tick physics stepper.
//!
//! The stepper moves every object according to its physics tag, re-indexes
//! it through the quadtree, then resolves wall and paddle contacts for the
//! balls using the exact snap geometry.

use fixedbitset::FixedBitSet;
use geom::{
    closest_side, constrain, extending_sides, inside, inside_snap, intersecting, outside_snap,
    Sides, Vec2, Volume,
};
use tracing::debug;

use crate::config::Config;
use crate::error::ObjectError;
use crate::object::{Object, ObjectId, Physics};
use crate::spatial::Quadtree;

/// The playfield: the spatial index plus the walls that contain play.
#[derive(Debug)]
pub struct World {
    quadtree: Quadtree,
    bounds: Volume,
    // Reusable seen-set for de-duplicating multi-bucket candidate ids.
    seen: FixedBitSet,
}

impl World {
    /// Build an empty playfield from the configuration.
    pub fn new(config: &Config) -> Self {
        let bounds = Volume::new(Vec2::ZERO, config.world.width, config.world.height);
        Self {
            quadtree: Quadtree::new(bounds, config.tree.max_objects, config.tree.max_depth),
            bounds,
            seen: FixedBitSet::with_capacity(usize::from(ObjectId::MAX) + 1),
        }
    }

    pub fn bounds(&self) -> Volume {
        self.bounds
    }

    pub fn quadtree(&self) -> &Quadtree {
        &self.quadtree
    }

    /// Track a new object, rejecting any placement that overlaps an already
    /// tracked object. Returns `0` when rejected.
    pub fn insert_object(&mut self, obj: Object) -> ObjectId {
        let volume = obj.volume;
        let id = self.quadtree.insert(obj);
        if id == 0 {
            return 0;
        }
        for other in self.bucket_candidates(id) {
            let Ok(other_obj) = self.quadtree.find_object(other) else {
                continue;
            };
            if intersecting(&volume, &other_obj.volume) {
                self.quadtree.erase(id);
                return 0;
            }
        }
        id
    }

    pub fn spawn_paddle(&mut self, volume: Volume) -> ObjectId {
        self.insert_object(Object::paddle(volume))
    }

    pub fn spawn_ball(&mut self, volume: Volume, velocity: Vec2) -> ObjectId {
        self.insert_object(Object::ball(volume, velocity))
    }

    /// Stop tracking `id`.
    pub fn erase(&mut self, id: ObjectId) {
        self.quadtree.erase(id);
    }

    /// Look up the record for `id`.
    pub fn find_object(&self, id: ObjectId) -> Result<&Object, ObjectError> {
        self.quadtree.find_object(id)
    }

    /// Aim a paddle at an absolute destination, retagging the object as a
    /// paddle when needed.
    pub fn set_destination(&mut self, id: ObjectId, destination: Vec2) -> Result<(), ObjectError> {
        let mut obj = *self.quadtree.find_object(id)?;
        obj.physics = Physics::Paddle { destination };
        self.quadtree.set_object(id, obj)
    }

    /// Set a ball's velocity, retagging the object as a ball when needed.
    pub fn set_velocity(&mut self, id: ObjectId, velocity: Vec2) -> Result<(), ObjectError> {
        let mut obj = *self.quadtree.find_object(id)?;
        obj.physics = Physics::Ball { velocity };
        self.quadtree.set_object(id, obj)
    }

    /// Forbid movement toward the given sides.
    pub fn set_constraints(&mut self, id: ObjectId, constraints: Sides) -> Result<(), ObjectError> {
        let mut obj = *self.quadtree.find_object(id)?;
        obj.constraints = constraints;
        self.quadtree.set_object(id, obj)
    }

    /// Advance the simulation one tick: move every object in ascending id
    /// order, then resolve wall and paddle contacts for the balls.
    pub fn step(&mut self) {
        let ids = self.quadtree.objects().ids();
        for &id in &ids {
            self.integrate(id);
        }
        for &id in &ids {
            let is_ball = self
                .quadtree
                .find_object(id)
                .map(Object::is_ball)
                .unwrap_or(false);
            if is_ball {
                self.bounce_walls(id);
                self.bounce_paddles(id);
            }
        }
    }

    /// Move one object according to its physics tag, honoring its movement
    /// constraints.
    fn integrate(&mut self, id: ObjectId) {
        let Ok(&obj) = self.quadtree.find_object(id) else {
            return;
        };
        let delta = match obj.physics {
            Physics::Undefined => return,
            Physics::Paddle { destination } => destination - obj.volume.pos,
            Physics::Ball { velocity } => velocity,
        };
        let delta = constrain(delta, obj.constraints);
        if delta == Vec2::ZERO {
            return;
        }
        let mut moved = obj;
        moved.volume.pos += delta;
        let _ = self.quadtree.set_object(id, moved);
    }

    /// Keep a ball inside the playfield, reflecting its velocity off any
    /// wall it poked through.
    fn bounce_walls(&mut self, id: ObjectId) {
        let Ok(&obj) = self.quadtree.find_object(id) else {
            return;
        };
        if inside(&self.bounds, &obj.volume) {
            return;
        }
        let sides = extending_sides(&obj.volume, &self.bounds);
        let mut bounced = obj;
        bounced.volume.pos += inside_snap(&obj.volume, sides, &self.bounds);
        if let Physics::Ball { velocity } = &mut bounced.physics {
            if sides.intersects(Sides::LEFT | Sides::RIGHT) {
                velocity.x = -velocity.x;
            }
            if sides.intersects(Sides::TOP | Sides::BOTTOM) {
                velocity.y = -velocity.y;
            }
        }
        debug!("ball {} bounced off wall ({:?})", id, sides);
        let _ = self.quadtree.set_object(id, bounced);
    }

    /// Bounce a ball off any paddle it overlaps: separate the volumes along
    /// the contact side and reflect the matching velocity component.
    fn bounce_paddles(&mut self, id: ObjectId) {
        for other in self.bucket_candidates(id) {
            let Ok(&obj) = self.quadtree.find_object(id) else {
                return;
            };
            let Ok(&paddle) = self.quadtree.find_object(other) else {
                continue;
            };
            if !paddle.is_paddle() || !intersecting(&obj.volume, &paddle.volume) {
                continue;
            }

            let side = closest_side(&obj.volume, &paddle.volume);
            let mut bounced = obj;
            bounced.volume.pos += outside_snap(&obj.volume, side.flip(), &paddle.volume);
            if let Physics::Ball { velocity } = &mut bounced.physics {
                if side.intersects(Sides::LEFT | Sides::RIGHT) {
                    velocity.x = -velocity.x;
                }
                if side.intersects(Sides::TOP | Sides::BOTTOM) {
                    velocity.y = -velocity.y;
                }
            }
            debug!("ball {} bounced off paddle {} ({:?})", id, other, side);
            let _ = self.quadtree.set_object(id, bounced);
        }
    }

    /// Ids sharing a leaf bucket with `id`, de-duplicated across buckets.
    fn bucket_candidates(&mut self, id: ObjectId) -> Vec<ObjectId> {
        self.seen.clear();
        self.seen.insert(usize::from(id));
        let mut candidates = Vec::new();
        for node in self.quadtree.nodes_containing(id) {
            for &other in &self.quadtree.tree().data(node).ids {
                if !self.seen.put(usize::from(other)) {
                    candidates.push(other);
                }
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn world() -> World {
        World::new(&Config::default())
    }

    fn vol(x: f64, y: f64, w: f64, h: f64) -> Volume {
        Volume::new(Vec2::new(x, y), w, h)
    }

    #[test]
    fn test_insert_object_rejects_overlap() {
        let mut world = world();
        let paddle = world.spawn_paddle(vol(100.0, 100.0, 200.0, 30.0));
        assert_ne!(0, paddle);

        // Overlapping placement is rolled back entirely.
        let rejected = world.spawn_ball(vol(150.0, 110.0, 20.0, 20.0), Vec2::new(1.0, 0.0));
        assert_eq!(0, rejected);
        assert_eq!(1, world.quadtree().objects().len());

        let ball = world.spawn_ball(vol(500.0, 500.0, 20.0, 20.0), Vec2::new(1.0, 0.0));
        assert_ne!(0, ball);
    }

    #[test]
    fn test_ball_integrates_velocity() {
        let mut world = world();
        let ball = world.spawn_ball(vol(500.0, 500.0, 20.0, 20.0), Vec2::new(3.0, -2.0));

        world.step();
        assert_eq!(
            Vec2::new(503.0, 498.0),
            world.find_object(ball).unwrap().volume.pos
        );

        world.step();
        assert_eq!(
            Vec2::new(506.0, 496.0),
            world.find_object(ball).unwrap().volume.pos
        );
    }

    #[test]
    fn test_paddle_teleports_to_destination() {
        let mut world = world();
        let paddle = world.spawn_paddle(vol(400.0, 900.0, 200.0, 30.0));

        world.set_destination(paddle, Vec2::new(250.0, 900.0)).unwrap();
        world.step();
        assert_eq!(
            Vec2::new(250.0, 900.0),
            world.find_object(paddle).unwrap().volume.pos
        );
    }

    #[test]
    fn test_constraints_block_movement() {
        let mut world = world();
        let paddle = world.spawn_paddle(vol(400.0, 900.0, 200.0, 30.0));
        world
            .set_constraints(paddle, Sides::TOP | Sides::BOTTOM)
            .unwrap();

        // Vertical movement is constrained away, horizontal passes through.
        world.set_destination(paddle, Vec2::new(300.0, 100.0)).unwrap();
        world.step();
        assert_eq!(
            Vec2::new(300.0, 900.0),
            world.find_object(paddle).unwrap().volume.pos
        );
    }

    #[test]
    fn test_ball_bounces_off_wall() {
        let mut world = world();
        let ball = world.spawn_ball(vol(10.0, 10.0, 20.0, 20.0), Vec2::new(-8.0, -6.0));

        world.step();
        assert_eq!(
            Vec2::new(2.0, 4.0),
            world.find_object(ball).unwrap().volume.pos
        );

        // The next step pokes through the top-left corner and is snapped
        // back with the velocity reflected.
        world.step();
        assert_eq!(Vec2::ZERO, world.find_object(ball).unwrap().volume.pos);

        world.step();
        let obj = *world.find_object(ball).unwrap();
        assert_eq!(Vec2::new(8.0, 6.0), obj.volume.pos);
        assert_eq!(
            Physics::Ball {
                velocity: Vec2::new(8.0, 6.0)
            },
            obj.physics
        );
    }

    #[test]
    fn test_ball_bounces_off_paddle() {
        let mut world = world();
        let paddle = world.spawn_paddle(vol(400.0, 900.0, 200.0, 30.0));
        let ball = world.spawn_ball(vol(450.0, 860.0, 20.0, 20.0), Vec2::new(0.0, 10.0));

        for _ in 0..3 {
            world.step();
        }

        let obj = *world.find_object(ball).unwrap();
        // The ball sits flush on top of the paddle and is heading back up.
        assert_eq!(Vec2::new(450.0, 880.0), obj.volume.pos);
        assert_eq!(
            Physics::Ball {
                velocity: Vec2::new(0.0, -10.0)
            },
            obj.physics
        );
        assert!(!intersecting(
            &obj.volume,
            &world.find_object(paddle).unwrap().volume
        ));
    }

    #[test]
    fn test_ball_stays_inside_bounds() {
        let mut world = world();
        let ball = world.spawn_ball(vol(500.0, 500.0, 20.0, 20.0), Vec2::new(17.0, -23.0));

        for _ in 0..500 {
            world.step();
            let obj = world.find_object(ball).unwrap();
            assert!(inside(&world.bounds(), &obj.volume));
        }
    }
}
