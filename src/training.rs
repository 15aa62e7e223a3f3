use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::TabularAgent;
use crate::config::{GameConfig, TrainConfig};
use crate::error::TrainError;
use crate::game::{GridWorld, StepOutcome, StepReason};

/// Summary of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub steps: usize,
    pub max_length: usize,
    pub final_length: usize,
    pub good_eaten: usize,
    pub bad_eaten: usize,
    pub total_reward: f32,
    /// Terminal reason, empty when the episode was cut short
    pub reason: Option<StepReason>,
    pub exploration_rate: f32,
}

impl EpisodeStats {
    fn start(episode: usize, world: &GridWorld) -> Self {
        Self {
            episode,
            steps: 0,
            max_length: world.snake_len(),
            final_length: world.snake_len(),
            good_eaten: 0,
            bad_eaten: 0,
            total_reward: 0.0,
            reason: None,
            exploration_rate: 0.0,
        }
    }

    fn record(&mut self, outcome: &StepOutcome, length: usize) {
        self.steps += 1;
        self.total_reward += outcome.reward;
        self.final_length = length;
        self.max_length = self.max_length.max(length);
        match outcome.reason {
            StepReason::AteGood => self.good_eaten += 1,
            StepReason::AteBad | StepReason::AteBadDied => self.bad_eaten += 1,
            _ => {}
        }
        if outcome.done {
            self.reason = Some(outcome.reason);
        }
    }
}

/// Aggregate over a batch of episodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub episodes: usize,
    pub best_length: usize,
    pub mean_length: f32,
    pub mean_steps: f32,
    pub mean_reward: f32,
}

pub fn summarize(history: &[EpisodeStats]) -> Summary {
    let n = history.len().max(1) as f32;
    Summary {
        episodes: history.len(),
        best_length: history.iter().map(|s| s.max_length).max().unwrap_or(0),
        mean_length: history.iter().map(|s| s.max_length as f32).sum::<f32>() / n,
        mean_steps: history.iter().map(|s| s.steps as f32).sum::<f32>() / n,
        mean_reward: history.iter().map(|s| s.total_reward).sum::<f32>() / n,
    }
}

/// Passive hooks into a run. Observers only ever see shared references.
pub trait StepObserver {
    fn on_step(&mut self, _world: &GridWorld, _outcome: &StepOutcome) {}
    fn on_episode_end(&mut self, _stats: &EpisodeStats) {}
    /// Checked between steps; returning false ends the run.
    fn keep_running(&self) -> bool {
        true
    }
}

pub struct NoopObserver;

impl StepObserver for NoopObserver {}

pub struct Trainer {
    config: TrainConfig,
    history: Vec<EpisodeStats>,
    record: usize,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            history: Vec::new(),
            record: 0,
        }
    }

    pub fn history(&self) -> &[EpisodeStats] {&self.history}
    pub fn record(&self) -> usize {self.record}

    /// Plays the configured number of sessions, learning unless told not to.
    pub fn run(
        &mut self,
        agent: &mut TabularAgent,
        world: &mut GridWorld,
        observer: &mut dyn StepObserver,
    ) -> Result<&[EpisodeStats], TrainError> {
        for episode in 1..=self.config.sessions {
            if !observer.keep_running() {
                tracing::info!(episode, "run interrupted");
                break;
            }

            let stats = self.play_episode(episode, agent, world, observer)?;
            tracing::info!(
                episode,
                length = stats.max_length,
                steps = stats.steps,
                reward = stats.total_reward,
                reason = stats.reason.map_or("cut-short", StepReason::as_str),
                epsilon = stats.exploration_rate,
                "episode finished"
            );

            if stats.max_length > self.record {
                self.record = stats.max_length;
                if self.config.learn {
                    if let Some(path) = &self.config.save_path {
                        agent.save(path)?;
                    }
                }
            }
            observer.on_episode_end(&stats);
            self.history.push(stats);
        }

        if self.config.learn {
            if let Some(path) = &self.config.save_path {
                agent.save(path)?;
            }
        }
        if let Some(path) = &self.config.stats_path {
            write_stats_csv(path, &self.history)?;
        }

        let summary = summarize(&self.history);
        tracing::info!(
            episodes = summary.episodes,
            record = self.record,
            mean_length = summary.mean_length,
            states = agent.table().len(),
            "run finished"
        );
        Ok(&self.history)
    }

    fn play_episode(
        &self,
        episode: usize,
        agent: &mut TabularAgent,
        world: &mut GridWorld,
        observer: &mut dyn StepObserver,
    ) -> Result<EpisodeStats, TrainError> {
        world.reset();
        let mut stats = EpisodeStats::start(episode, world);
        let mut observation = world.observe();

        while observer.keep_running() {
            if self.config.max_steps_per_episode.is_some_and(|max| stats.steps >= max) {
                break;
            }

            let current = world.direction();
            let action = if self.config.learn {
                agent.choose_action(&observation, current)
            } else {
                agent.exploit(&observation, current)
            };

            let outcome = world.step(action)?;
            let next_observation = world.observe();
            if self.config.learn {
                let state = agent.encode(&observation);
                let next_state = agent.encode(&next_observation);
                agent.update(&state, action, outcome.reward, &next_state, outcome.done);
            }

            stats.record(&outcome, world.snake_len());
            observer.on_step(world, &outcome);
            observation = next_observation;

            if outcome.done {
                break;
            }
        }

        stats.exploration_rate = agent.exploration_rate();
        Ok(stats)
    }
}

/// Plays one greedy episode per seed in parallel. The agent is only read.
pub fn evaluate(
    agent: &TabularAgent,
    config: &GameConfig,
    seeds: &[u64],
    max_steps: usize,
) -> Result<Vec<EpisodeStats>, TrainError> {
    seeds
        .par_iter()
        .enumerate()
        .map(|(i, &seed)| -> Result<EpisodeStats, TrainError> {
            let mut world = GridWorld::with_seed(config.clone(), seed)?;
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
            let mut stats = EpisodeStats::start(i + 1, &world);

            while stats.steps < max_steps {
                let observation = world.observe();
                let action = agent.greedy_action(&observation, world.direction(), &mut rng);
                let outcome = world.step(action)?;
                stats.record(&outcome, world.snake_len());
                if outcome.done {
                    break;
                }
            }

            stats.exploration_rate = 0.0;
            Ok(stats)
        })
        .collect()
}

pub fn write_stats_csv(path: impl AsRef<Path>, history: &[EpisodeStats]) -> Result<(), TrainError> {
    let mut writer = csv::Writer::from_path(path)?;
    for stats in history {
        writer.serialize(stats)?;
    }
    writer.flush()?;
    Ok(())
}
