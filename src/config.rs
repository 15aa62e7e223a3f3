use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Smallest board the spawn rules can handle: a 3-cell body plus room to turn.
pub const MIN_GRID_SIZE: usize = 7;

/// Rewards handed out by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub wall: f32,
    pub self_collision: f32,
    pub bad_food_death: f32,
    pub good_food: f32,
    pub bad_food: f32,
    pub starvation: f32,
    /// Reward for moving closer to the nearest good food
    pub closer: f32,
    /// Reward for moving away from the nearest good food
    pub farther: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            wall: -30.0,
            self_collision: -30.0,
            bad_food_death: -20.0,
            good_food: 20.0,
            bad_food: -10.0,
            starvation: -10.0,
            closer: 1.0,
            farther: -0.5,
        }
    }
}

/// Configuration for the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width and height of the square grid
    pub grid_size: usize,
    /// Good food items kept on the board
    pub good_food_count: usize,
    /// Bad food items kept on the board
    pub bad_food_count: usize,
    /// Length of the snake after a reset
    pub initial_length: usize,
    /// Food is only placed strictly farther than this (Manhattan) from the head
    pub min_food_distance: i32,
    /// Steps without eating allowed per grid cell of width
    pub starvation_factor: usize,
    pub rewards: RewardConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            good_food_count: 2,
            bad_food_count: 1,
            initial_length: 3,
            min_food_distance: 2,
            starvation_factor: 3,
            rewards: RewardConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Steps since the last meal after which the episode ends
    pub fn starvation_limit(&self) -> usize {
        self.starvation_factor * self.grid_size
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall {
                size: self.grid_size,
                min: MIN_GRID_SIZE,
            });
        }
        if self.good_food_count == 0 {
            return Err(ConfigError::NoGoodFood);
        }
        if self.initial_length == 0 || self.initial_length > (self.grid_size - 1) / 2 {
            return Err(ConfigError::BadInitialLength(self.initial_length));
        }
        let cells = self.grid_size * self.grid_size;
        let occupied = self.initial_length + self.good_food_count + self.bad_food_count;
        if occupied * 2 > cells {
            return Err(ConfigError::TooMuchFood {
                food: self.good_food_count + self.bad_food_count,
                cells,
            });
        }
        Ok(())
    }
}

/// Shaping terms the agent adds on top of the environment reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapingConfig {
    /// Added when the chosen direction shows good food
    pub food_bonus: f32,
    /// Subtracted once per danger level of the chosen direction
    pub danger_penalty: f32,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            food_bonus: 0.5,
            danger_penalty: 1.0,
        }
    }
}

impl ShapingConfig {
    pub fn none() -> Self {
        Self {
            food_bonus: 0.0,
            danger_penalty: 0.0,
        }
    }
}

/// Hyperparameters of the tabular agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub exploration_rate: f32,
    pub exploration_decay: f32,
    pub exploration_min: f32,
    /// Cells per ray the encoder looks at
    pub vision_horizon: usize,
    /// Bias random exploration towards safe, food-facing moves
    pub guided_exploration: bool,
    pub shaping: ShapingConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            exploration_rate: 1.0,
            exploration_decay: 0.995,
            exploration_min: 0.05,
            vision_horizon: 3,
            guided_exploration: true,
            shaping: ShapingConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = 0.0..=1.0;
        for (name, value) in [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("exploration_rate", self.exploration_rate),
            ("exploration_decay", self.exploration_decay),
            ("exploration_min", self.exploration_min),
        ] {
            if !unit.contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        if self.vision_horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        Ok(())
    }
}

/// Settings for a training or evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Episodes to play
    pub sessions: usize,
    /// When false the agent only exploits: no updates, no decay
    pub learn: bool,
    /// Hard cap on steps per episode, on top of starvation
    pub max_steps_per_episode: Option<usize>,
    pub save_path: Option<PathBuf>,
    pub stats_path: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            sessions: 10,
            learn: true,
            max_steps_per_episode: None,
            save_path: None,
            stats_path: None,
        }
    }
}
