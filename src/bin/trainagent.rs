use anyhow::{Context, Result};
use slithers::training::{evaluate, summarize, EpisodeStats, StepObserver};
use slithers::{AgentConfig, GameConfig, GridWorld, StepOutcome, TabularAgent, TrainConfig, Trainer};
use std::time::{SystemTime, UNIX_EPOCH};

const GRID_SIZE: usize = 10;
const SESSIONS: usize = 5000;
const MODEL_PATH: &str = "input/snake_agent.bin";
const STATS_PATH: &str = "input/training_stats.csv";
const EVAL_EPISODES: u64 = 200;
const EVAL_MAX_STEPS: usize = 2000;
const BOARD_EVERY: usize = 500; // episodes

// keeps the last board of an episode and prints it every few hundred episodes
struct BoardLogger {
    last_board: String,
}

impl StepObserver for BoardLogger {
    fn on_step(&mut self, world: &GridWorld, outcome: &StepOutcome) {
        if outcome.done {
            self.last_board = world.to_string();
        }
    }

    fn on_episode_end(&mut self, stats: &EpisodeStats) {
        if stats.episode % BOARD_EVERY == 0 {
            tracing::info!("board at the end of episode {}:\n{}", stats.episode, self.last_board);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_secs();

    tracing::info!(grid_size = GRID_SIZE, seed, "initializing snake world and tabular agent");
    let game_config = GameConfig::new(GRID_SIZE);
    let mut world = GridWorld::with_seed(game_config.clone(), seed)?;
    let mut agent = TabularAgent::with_seed(AgentConfig::default(), GRID_SIZE, seed.wrapping_add(1))?;

    match agent.load(MODEL_PATH) {
        Ok(report) => tracing::info!(states = report.states, "resuming from {}", MODEL_PATH),
        Err(e) => tracing::warn!("starting with an empty table: {}", e),
    }

    let mut trainer = Trainer::new(TrainConfig {
        sessions: SESSIONS,
        learn: true,
        max_steps_per_episode: None,
        save_path: Some(MODEL_PATH.into()),
        stats_path: Some(STATS_PATH.into()),
    });
    std::fs::create_dir_all("input").context("could not create the input directory")?;

    let mut observer = BoardLogger {
        last_board: String::new(),
    };
    trainer
        .run(&mut agent, &mut world, &mut observer)
        .context("training failed")?;

    let seeds: Vec<u64> = (0..EVAL_EPISODES).map(|i| seed.wrapping_add(1000 + i)).collect();
    let results = evaluate(&agent, &game_config, &seeds, EVAL_MAX_STEPS)?;
    let summary = summarize(&results);
    tracing::info!(
        episodes = summary.episodes,
        best_length = summary.best_length,
        mean_length = summary.mean_length,
        mean_steps = summary.mean_steps,
        "greedy evaluation"
    );

    Ok(())
}
