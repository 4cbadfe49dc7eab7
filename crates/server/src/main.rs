//! Native Pong game-state server demo.

use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use geom::{Sides, Vec2, Volume};
use server::{Config, Snapshot, World};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Native Pong Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Board: {}x{}", config.world.width, config.world.height);
    info!(
        "  Tree: {} objects per bucket, max depth {}",
        config.tree.max_objects, config.tree.max_depth
    );

    let mut world = World::new(&config);

    // Top and bottom paddles, constrained to horizontal movement.
    let paddle_x = (config.world.width - config.paddle.width) / 2.0;
    let top = world.spawn_paddle(Volume::new(
        Vec2::new(paddle_x, 10.0),
        config.paddle.width,
        config.paddle.height,
    ));
    let bottom = world.spawn_paddle(Volume::new(
        Vec2::new(paddle_x, config.world.height - config.paddle.height - 10.0),
        config.paddle.width,
        config.paddle.height,
    ));
    world.set_constraints(top, Sides::TOP | Sides::BOTTOM)?;
    world.set_constraints(bottom, Sides::TOP | Sides::BOTTOM)?;

    // Serve the ball from the center in a random direction.
    let mut rng = rand::rng();
    let angle: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    let velocity = Vec2::new(angle.cos(), angle.sin()) * config.ball.speed;
    let ball = world.spawn_ball(
        Volume::new(
            Vec2::new(
                (config.world.width - config.ball.width) / 2.0,
                (config.world.height - config.ball.height) / 2.0,
            ),
            config.ball.width,
            config.ball.height,
        ),
        velocity,
    );
    info!("Serving ball {} at {:.2} rad", ball, angle);

    for tick in 0..600u32 {
        world.step();
        if tick % 100 == 0 {
            let obj = world.find_object(ball)?;
            info!(
                "tick {}: ball at ({:.1}, {:.1})",
                tick, obj.volume.pos.x, obj.volume.pos.y
            );
        }
    }

    let snapshot = Snapshot::capture(world.quadtree());
    println!("{}", snapshot.to_json()?);

    Ok(())
}
