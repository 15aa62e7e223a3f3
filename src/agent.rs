pub mod qtable;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use bincode::Options;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::error::{ConfigError, ModelError};
use crate::game::{Direction, Observation};
use crate::vision::{StateKey, VisionEncoder};
use qtable::QTable;

/// Everything needed to resume training, written as one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub value_table: QTable,
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub exploration_rate: f32,
    pub exploration_decay: f32,
    pub exploration_min: f32,
    pub grid_size: usize,
}

/// What a successful load brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub states: usize,
    /// Grid size the model was trained on, when it differs from ours.
    pub grid_size_mismatch: Option<usize>,
}

/// All directions except the reversal of `current`.
pub fn valid_actions(current: Direction) -> impl Iterator<Item = Direction> + Clone {
    let reverse = current.opposite();
    Direction::ALL.into_iter().filter(move |&d| d != reverse)
}

pub struct TabularAgent {
    table: QTable,
    encoder: VisionEncoder,
    config: AgentConfig,
    grid_size: usize,
    rng: StdRng,
}

impl TabularAgent {
    pub fn new(config: AgentConfig, grid_size: usize, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            table: QTable::new(),
            encoder: VisionEncoder::new(config.vision_horizon),
            config,
            grid_size,
            rng,
        })
    }

    pub fn with_seed(config: AgentConfig, grid_size: usize, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, grid_size, StdRng::seed_from_u64(seed))
    }

    pub fn table(&self) -> &QTable {&self.table}
    pub fn config(&self) -> &AgentConfig {&self.config}
    pub fn encoder(&self) -> &VisionEncoder {&self.encoder}
    pub fn grid_size(&self) -> usize {self.grid_size}
    pub fn exploration_rate(&self) -> f32 {self.config.exploration_rate}

    pub fn encode(&self, observation: &Observation) -> StateKey {
        self.encoder.encode(observation)
    }

    /// Epsilon-greedy choice among the moves that do not reverse `current`.
    pub fn choose_action(&mut self, observation: &Observation, current: Direction) -> Direction {
        let key = self.encoder.encode(observation);
        self.table.entry(key);

        if self.rng.random::<f32>() < self.config.exploration_rate {
            self.explore(&key, current)
        } else {
            best_action(&self.table, &key, current, &mut self.rng)
        }
    }

    /// Greedy choice using the agent's own generator; never explores.
    pub fn exploit(&mut self, observation: &Observation, current: Direction) -> Direction {
        let key = self.encoder.encode(observation);
        best_action(&self.table, &key, current, &mut self.rng)
    }

    /// Greedy choice with an outside generator, for read-only evaluation.
    pub fn greedy_action<R: Rng + ?Sized>(
        &self,
        observation: &Observation,
        current: Direction,
        rng: &mut R,
    ) -> Direction {
        let key = self.encoder.encode(observation);
        best_action(&self.table, &key, current, rng)
    }

    fn explore(&mut self, key: &StateKey, current: Direction) -> Direction {
        let valid: Vec<Direction> = valid_actions(current).collect();
        if self.config.guided_exploration {
            let safe: Vec<Direction> = valid.iter().copied().filter(|&d| key.is_safe(d)).collect();
            let promising: Vec<Direction> = safe.iter().copied().filter(|&d| key.sees_food(d)).collect();
            for layer in [&promising, &safe] {
                if let Some(&action) = layer.choose(&mut self.rng) {
                    return action;
                }
            }
        }
        // three valid moves always remain
        valid.choose(&mut self.rng).copied().unwrap_or(current)
    }

    /// Environment reward plus the agent-side shaping for `action` in `state`.
    pub fn shaped_reward(&self, state: &StateKey, action: Direction, reward: f32) -> f32 {
        let shaping = self.config.shaping;
        let mut adjusted = reward;
        if state.sees_food(action) {
            adjusted += shaping.food_bonus;
        }
        adjusted - shaping.danger_penalty * f32::from(state.danger(action))
    }

    /// One Q-learning step; returns the new value of `(state, action)`.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: Direction,
        reward: f32,
        next_state: &StateKey,
        done: bool,
    ) -> f32 {
        let adjusted = self.shaped_reward(state, action, reward);
        self.table.entry(*next_state);
        let max_next = if done {
            0.0
        } else {
            self.table.max_value(next_state, valid_actions(action))
        };

        let alpha = self.config.learning_rate;
        let gamma = self.config.discount_factor;
        let row = self.table.entry(*state);
        let current = row[action.index()];
        let updated = current + alpha * (adjusted + gamma * max_next - current);
        row[action.index()] = updated;

        self.decay_exploration();
        updated
    }

    fn decay_exploration(&mut self) {
        let config = &mut self.config;
        if config.exploration_rate > config.exploration_min {
            config.exploration_rate = (config.exploration_rate * config.exploration_decay)
                .max(config.exploration_min);
        }
    }

    pub fn to_record(&self) -> ModelRecord {
        ModelRecord {
            value_table: self.table.clone(),
            learning_rate: self.config.learning_rate,
            discount_factor: self.config.discount_factor,
            exploration_rate: self.config.exploration_rate,
            exploration_decay: self.config.exploration_decay,
            exploration_min: self.config.exploration_min,
            grid_size: self.grid_size,
        }
    }

    /// Writes the model next to `path` first and renames it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = path.with_extension("tmp");
        let written = write_record(&staging, &self.to_record())
            .and_then(|()| fs::rename(&staging, path).map_err(ModelError::from));
        if let Err(e) = written {
            if staging.exists() {
                if let Err(cleanup) = fs::remove_file(&staging) {
                    tracing::warn!(path = %staging.display(), "could not remove staging file: {}", cleanup);
                }
            }
            return Err(e);
        }

        tracing::info!(path = %path.display(), states = self.table.len(), "saved model");
        Ok(())
    }

    /// Replaces the table and hyperparameters with the saved ones.
    ///
    /// On error the agent keeps its current state. A model trained on another
    /// grid size still loads; the mismatch is logged and reported.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, ModelError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let record: ModelRecord = codec().deserialize(&bytes).map_err(ModelError::Decode)?;

        let config = AgentConfig {
            learning_rate: record.learning_rate,
            discount_factor: record.discount_factor,
            exploration_rate: record.exploration_rate,
            exploration_decay: record.exploration_decay,
            exploration_min: record.exploration_min,
            ..self.config.clone()
        };
        config.validate().map_err(ModelError::Invalid)?;

        let grid_size_mismatch = (record.grid_size != self.grid_size).then_some(record.grid_size);
        if let Some(saved) = grid_size_mismatch {
            tracing::warn!(
                saved,
                current = self.grid_size,
                "model was trained on a different grid size, values may not transfer"
            );
        }

        self.table = record.value_table;
        self.config = config;

        tracing::info!(path = %path.display(), states = self.table.len(), "loaded model");
        Ok(LoadReport {
            states: self.table.len(),
            grid_size_mismatch,
        })
    }
}

// fixed-width integers, and nothing may follow the record
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

fn write_record(path: &Path, record: &ModelRecord) -> Result<(), ModelError> {
    let mut writer = BufWriter::new(File::create(path)?);
    codec().serialize_into(&mut writer, record).map_err(ModelError::Encode)?;
    writer.flush()?;
    Ok(())
}

// max-value action among safe valid moves (all valid moves if none is safe), ties at random
fn best_action<R: Rng + ?Sized>(
    table: &QTable,
    key: &StateKey,
    current: Direction,
    rng: &mut R,
) -> Direction {
    let valid: Vec<Direction> = valid_actions(current).collect();
    let safe: Vec<Direction> = valid.iter().copied().filter(|&d| key.is_safe(d)).collect();
    let candidates = if safe.is_empty() { &valid } else { &safe };

    let row = table.get(key).copied().unwrap_or_default();
    let best = candidates
        .iter()
        .map(|d| row[d.index()])
        .fold(f32::NEG_INFINITY, f32::max);
    let ties: Vec<Direction> = candidates
        .iter()
        .copied()
        .filter(|d| row[d.index()] == best)
        .collect();

    ties.choose(rng)
        .or_else(|| candidates.first())
        .copied()
        .unwrap_or(current)
}
