use slithers::training::NoopObserver;
use slithers::{
    AgentConfig, Direction, GameConfig, GridWorld, ShapingConfig, StateKey, TabularAgent,
    TrainConfig, Trainer,
};
use tempfile::TempDir;

fn plain_config() -> AgentConfig {
    AgentConfig {
        shaping: ShapingConfig::none(),
        ..AgentConfig::default()
    }
}

#[test]
fn test_terminal_updates_converge_to_reward() {
    let mut agent = TabularAgent::with_seed(plain_config(), 10, 7).unwrap();
    let state: StateKey = "0200|0000|0000".parse().unwrap();
    let next: StateKey = "0000|0000|0000".parse().unwrap();

    let mut value = 0.0;
    for _ in 0..300 {
        value = agent.update(&state, Direction::Up, -30.0, &next, true);
    }

    assert!((value + 30.0).abs() < 1e-3, "value was {value}");
    assert_eq!(agent.table().value(&state, Direction::Up), value);
    // the other actions of the row stay untouched
    assert_eq!(agent.table().value(&state, Direction::Down), 0.0);
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models").join("agent.bin");

    let mut trained = TabularAgent::with_seed(plain_config(), 10, 11).unwrap();
    let state: StateKey = "0010|0300|0000".parse().unwrap();
    let next: StateKey = "0000|0000|1000".parse().unwrap();
    trained.update(&state, Direction::Right, 20.0, &next, false);
    trained.update(&next, Direction::Down, -10.0, &state, false);
    trained.save(&path).unwrap();

    let mut restored = TabularAgent::with_seed(AgentConfig::default(), 10, 12).unwrap();
    let report = restored.load(&path).unwrap();

    assert_eq!(report.states, trained.table().len());
    assert_eq!(report.grid_size_mismatch, None);
    assert_eq!(restored.table(), trained.table());
    assert_eq!(restored.exploration_rate(), trained.exploration_rate());
}

#[test]
fn test_load_reports_grid_size_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.bin");

    let small = TabularAgent::with_seed(plain_config(), 10, 1).unwrap();
    small.save(&path).unwrap();

    let mut large = TabularAgent::with_seed(plain_config(), 15, 2).unwrap();
    let report = large.load(&path).unwrap();

    assert_eq!(report.grid_size_mismatch, Some(10));
    assert_eq!(large.grid_size(), 15);
}

#[test]
fn test_load_of_missing_file_keeps_agent() {
    let dir = TempDir::new().unwrap();
    let mut agent = TabularAgent::with_seed(plain_config(), 10, 3).unwrap();
    let state: StateKey = "0000|0000|0000".parse().unwrap();
    agent.update(&state, Direction::Left, 1.0, &state, false);
    let before = agent.table().clone();

    assert!(agent.load(dir.path().join("missing.bin")).is_err());
    assert_eq!(agent.table(), &before);
}

#[test]
fn test_short_training_run() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("agent.bin");
    let stats = dir.path().join("stats.csv");

    let mut world = GridWorld::with_seed(GameConfig::new(8), 21).unwrap();
    let mut agent = TabularAgent::with_seed(AgentConfig::default(), 8, 22).unwrap();
    let mut trainer = Trainer::new(TrainConfig {
        sessions: 15,
        learn: true,
        max_steps_per_episode: Some(300),
        save_path: Some(model.clone()),
        stats_path: Some(stats.clone()),
    });

    let history = trainer.run(&mut agent, &mut world, &mut NoopObserver).unwrap();

    assert_eq!(history.len(), 15);
    assert!(history.iter().all(|s| s.steps <= 300));
    assert!(!agent.table().is_empty());
    assert!(agent.exploration_rate() < 1.0);
    assert!(model.exists());
    assert!(stats.exists());
}
