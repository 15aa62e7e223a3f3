use thiserror::Error;

use crate::game::Direction;

/// Configuration values the simulation cannot work with.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid size {size} is below the minimum of {min}")]
    GridTooSmall { size: usize, min: usize },
    #[error("at least one good food item is required")]
    NoGoodFood,
    #[error("initial snake length {0} does not fit the grid")]
    BadInitialLength(usize),
    #[error("{food} food items do not fit comfortably on {cells} cells")]
    TooMuchFood { food: usize, cells: usize },
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("vision horizon must be at least one cell")]
    ZeroHorizon,
    #[error("invalid board layout: {0}")]
    InvalidLayout(String),
}

/// Moves the environment refuses to play.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("illegal move: cannot reverse from {current:?} to {attempted:?}")]
    IllegalMove {
        current: Direction,
        attempted: Direction,
    },
}

/// Failures while saving or loading a model record.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode model: {0}")]
    Encode(#[source] bincode::Error),
    #[error("could not decode model: {0}")]
    Decode(#[source] bincode::Error),
    #[error("model holds unusable hyperparameters: {0}")]
    Invalid(#[source] ConfigError),
}

/// A textual state key that does not follow the `dddd|gggg|bbbb` layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("expected 3 groups separated by '|', found {0}")]
    GroupCount(usize),
    #[error("group {group} must hold 4 digits, found {found:?}")]
    GroupLength { group: usize, found: String },
    #[error("digit {digit:?} is out of range for group {group}")]
    Digit { group: usize, digit: char },
}

/// Anything that can stop a training or evaluation run.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("could not write episode stats: {0}")]
    Stats(#[from] csv::Error),
    #[error("could not write episode stats: {0}")]
    Io(#[from] std::io::Error),
}
