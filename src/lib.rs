pub mod config;
pub mod error;

pub mod game;

pub use game::{
    Cell,
    Direction,
    GridWorld,
    Observation,
    Pos,
    StepOutcome,
    StepReason,
};

pub mod vision;

pub use vision::{StateKey, VisionEncoder};

pub mod agent;

pub use agent::{LoadReport, ModelRecord, TabularAgent};
pub use agent::qtable::QTable;

pub mod training;

pub use training::{EpisodeStats, StepObserver, Trainer};
pub use config::{AgentConfig, GameConfig, RewardConfig, ShapingConfig, TrainConfig};
