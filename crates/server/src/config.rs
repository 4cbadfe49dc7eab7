//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub paddle: PaddleConfig,
    #[serde(default)]
    pub ball: BallConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

/// Playfield dimensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_width")]
    pub width: f64,
    #[serde(default = "default_world_height")]
    pub height: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_width(),
            height: default_world_height(),
        }
    }
}

/// Quadtree split parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeConfig {
    /// Ids a bucket holds before it subdivides.
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
    /// Depth at which buckets stop subdividing and grow unbounded instead.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_objects: default_max_objects(),
            max_depth: default_max_depth(),
        }
    }
}

/// Paddle dimensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaddleConfig {
    #[serde(default = "default_paddle_width")]
    pub width: f64,
    #[serde(default = "default_paddle_height")]
    pub height: f64,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            width: default_paddle_width(),
            height: default_paddle_height(),
        }
    }
}

/// Ball dimensions and serve speed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BallConfig {
    #[serde(default = "default_ball_width")]
    pub width: f64,
    #[serde(default = "default_ball_height")]
    pub height: f64,
    /// Serve speed in units per tick.
    #[serde(default = "default_ball_speed")]
    pub speed: f64,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            width: default_ball_width(),
            height: default_ball_height(),
            speed: default_ball_speed(),
        }
    }
}

fn default_world_width() -> f64 {
    1000.0
}
fn default_world_height() -> f64 {
    1000.0
}
fn default_max_objects() -> usize {
    5
}
fn default_max_depth() -> usize {
    5
}
fn default_paddle_width() -> f64 {
    200.0
}
fn default_paddle_height() -> f64 {
    30.0
}
fn default_ball_width() -> f64 {
    20.0
}
fn default_ball_height() -> f64 {
    20.0
}
fn default_ball_speed() -> f64 {
    4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(1000.0, config.world.width);
        assert_eq!(5, config.tree.max_objects);
        assert_eq!(5, config.tree.max_depth);
        assert_eq!(4.0, config.ball.speed);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tree]
            max_objects = 2

            [world]
            width = 640.0
            "#,
        )
        .unwrap();
        assert_eq!(2, config.tree.max_objects);
        assert_eq!(5, config.tree.max_depth);
        assert_eq!(640.0, config.world.width);
        assert_eq!(1000.0, config.world.height);
        assert_eq!(200.0, config.paddle.width);
    }
}
