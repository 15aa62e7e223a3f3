use std::collections::{HashSet, VecDeque};
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{ConfigError, StepError};

/// Grid coordinate as (x, y), origin in the top-left corner.
pub type Pos = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Fixed order shared by observations, state keys and action values.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn step_from(self, pos: Pos) -> Pos {
        let (dx, dy) = self.delta();
        (pos.0 + dx, pos.1 + dy)
    }
}

/// Contents of one grid cell. `Wall` never sits inside the grid, it only ends rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    SnakeHead,
    SnakeBody,
    GoodFood,
    BadFood,
    Wall,
}

impl Cell {
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '0',
            Cell::SnakeHead => 'H',
            Cell::SnakeBody => 'S',
            Cell::GoodFood => 'G',
            Cell::BadFood => 'R',
            Cell::Wall => 'W',
        }
    }

    /// Cells that kill the snake when entered.
    pub fn is_deadly(self) -> bool {
        matches!(self, Cell::Wall | Cell::SnakeBody)
    }
}

/// Why a step ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepReason {
    Wall,
    #[serde(rename = "self")]
    SelfCollision,
    Starvation,
    AteGood,
    AteBad,
    AteBadDied,
    Moved,
}

impl StepReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StepReason::Wall => "wall",
            StepReason::SelfCollision => "self",
            StepReason::Starvation => "starvation",
            StepReason::AteGood => "ate-good",
            StepReason::AteBad => "ate-bad",
            StepReason::AteBadDied => "ate-bad-died",
            StepReason::Moved => "moved",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepReason::Wall
                | StepReason::SelfCollision
                | StepReason::Starvation
                | StepReason::AteBadDied
        )
    }
}

impl fmt::Display for StepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub done: bool,
    pub reason: StepReason,
}

/// What the snake sees: one ray per direction in `Direction::ALL` order,
/// from the cell next to the head outwards, always ending in `Cell::Wall`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    rays: [Vec<Cell>; 4],
}

impl Observation {
    pub fn new(rays: [Vec<Cell>; 4]) -> Self {
        Self { rays }
    }

    pub fn ray(&self, direction: Direction) -> &[Cell] {
        &self.rays[direction.index()]
    }

    pub fn rays(&self) -> &[Vec<Cell>; 4] {
        &self.rays
    }
}

pub fn manhattan(a: Pos, b: Pos) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

pub struct GridWorld {
    config: GameConfig,
    rng: StdRng,
    grid: Vec<Cell>,
    snake: VecDeque<Pos>, // head first
    good_food: Vec<Pos>,
    bad_food: Vec<Pos>,
    direction: Direction,
    last_head: Pos, // where observations start once the body is gone
    steps: usize,
    steps_since_food: usize,
    terminal: Option<StepReason>,
}

impl GridWorld {
    pub fn new(config: GameConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let size = config.grid_size;

        let mut instance = Self {
            config,
            rng,
            grid: vec![Cell::Empty; size * size],
            snake: VecDeque::new(),
            good_food: Vec::new(),
            bad_food: Vec::new(),
            direction: Direction::Right,
            last_head: (0, 0),
            steps: 0,
            steps_since_food: 0,
            terminal: None,
        };
        instance.reset();

        Ok(instance)
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn config(&self) -> &GameConfig {&self.config}
    pub fn grid_size(&self) -> usize {self.config.grid_size}
    pub fn snake(&self) -> &VecDeque<Pos> {&self.snake}
    pub fn snake_len(&self) -> usize {self.snake.len()}
    pub fn head(&self) -> Option<Pos> {self.snake.front().copied()}
    pub fn direction(&self) -> Direction {self.direction}
    pub fn good_food(&self) -> &[Pos] {&self.good_food}
    pub fn bad_food(&self) -> &[Pos] {&self.bad_food}
    pub fn steps(&self) -> usize {self.steps}
    pub fn steps_since_food(&self) -> usize {self.steps_since_food}
    pub fn is_terminal(&self) -> bool {self.terminal.is_some()}
    pub fn terminal_reason(&self) -> Option<StepReason> {self.terminal}

    /// Cell at `pos`; anything off the board reads as a wall.
    pub fn cell(&self, pos: Pos) -> Cell {
        match self.index(pos) {
            Some(i) => self.grid[i],
            None => Cell::Wall,
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        let size = self.config.grid_size as i32;
        (0..size).contains(&pos.0) && (0..size).contains(&pos.1)
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.1 as usize * self.config.grid_size + pos.0 as usize)
        } else {
            None
        }
    }

    fn set(&mut self, pos: Pos, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.grid[i] = cell;
        }
    }

    fn positions(&self) -> impl Iterator<Item = Pos> {
        let size = self.config.grid_size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| (x, y)))
    }

    /// Starts a new episode: fresh snake in a random direction, fresh food.
    pub fn reset(&mut self) {
        self.grid.fill(Cell::Empty);
        self.snake.clear();
        self.good_food.clear();
        self.bad_food.clear();

        let size = self.config.grid_size as i32;
        let margin = self.config.initial_length as i32;
        let head = (
            self.rng.random_range(margin..size - margin),
            self.rng.random_range(margin..size - margin),
        );
        self.direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];

        // body trails behind the head, opposite to the heading
        let back = self.direction.opposite();
        let mut segment = head;
        for i in 0..self.config.initial_length {
            self.snake.push_back(segment);
            self.set(segment, if i == 0 { Cell::SnakeHead } else { Cell::SnakeBody });
            segment = back.step_from(segment);
        }
        self.last_head = head;

        for _ in 0..self.config.good_food_count {
            self.spawn_food(Cell::GoodFood);
        }
        for _ in 0..self.config.bad_food_count {
            self.spawn_food(Cell::BadFood);
        }

        self.steps = 0;
        self.steps_since_food = 0;
        self.terminal = None;

        debug_assert!(self.is_consistent());
    }

    /// Replaces the board with an explicit layout and starts a fresh episode on it.
    pub fn arrange(
        &mut self,
        snake: &[Pos],
        direction: Direction,
        good_food: &[Pos],
        bad_food: &[Pos],
    ) -> Result<(), ConfigError> {
        if snake.is_empty() {
            return Err(ConfigError::InvalidLayout("snake has no segments".into()));
        }
        let mut seen = HashSet::new();
        for &pos in snake.iter().chain(good_food).chain(bad_food) {
            if !self.in_bounds(pos) {
                return Err(ConfigError::InvalidLayout(format!("{pos:?} is off the board")));
            }
            if !seen.insert(pos) {
                return Err(ConfigError::InvalidLayout(format!("{pos:?} is used twice")));
            }
        }

        self.grid.fill(Cell::Empty);
        self.snake = snake.iter().copied().collect();
        for (i, &pos) in snake.iter().enumerate() {
            self.set(pos, if i == 0 { Cell::SnakeHead } else { Cell::SnakeBody });
        }
        self.good_food = good_food.to_vec();
        self.bad_food = bad_food.to_vec();
        for &pos in good_food {
            self.set(pos, Cell::GoodFood);
        }
        for &pos in bad_food {
            self.set(pos, Cell::BadFood);
        }

        self.direction = direction;
        self.last_head = snake[0];
        self.steps = 0;
        self.steps_since_food = 0;
        self.terminal = None;

        debug_assert!(self.is_consistent());
        Ok(())
    }

    // picks a random empty cell away from the head, falling back to any empty cell
    fn spawn_food(&mut self, kind: Cell) -> Option<Pos> {
        let head = self.last_head;
        let min_distance = self.config.min_food_distance;

        let empty: Vec<Pos> = self
            .positions()
            .filter(|&pos| self.cell(pos) == Cell::Empty)
            .collect();
        let far: Vec<Pos> = empty
            .iter()
            .copied()
            .filter(|&pos| manhattan(pos, head) > min_distance)
            .collect();

        let pos = match far.choose(&mut self.rng) {
            Some(&pos) => pos,
            None => *empty.choose(&mut self.rng)?,
        };

        self.set(pos, kind);
        match kind {
            Cell::GoodFood => self.good_food.push(pos),
            _ => self.bad_food.push(pos),
        }
        Some(pos)
    }

    // Manhattan distance from the head to the closest good food
    fn food_distance(&self) -> i32 {
        let head = self.last_head;
        self.good_food
            .iter()
            .map(|&food| manhattan(head, food))
            .min()
            .unwrap_or(self.config.grid_size as i32 * 2)
    }

    fn finish(&mut self, reason: StepReason, reward: f32) -> StepOutcome {
        self.terminal = Some(reason);
        tracing::debug!(reason = reason.as_str(), length = self.snake.len(), "episode over");
        StepOutcome {
            reward,
            done: true,
            reason,
        }
    }

    /// Advances the snake one cell towards `action`.
    ///
    /// Reversing onto the neck is rejected without touching the board. Once the
    /// episode is over every call returns a zero reward and the terminal reason.
    pub fn step(&mut self, action: Direction) -> Result<StepOutcome, StepError> {
        if let Some(reason) = self.terminal {
            return Ok(StepOutcome {
                reward: 0.0,
                done: true,
                reason,
            });
        }
        if action == self.direction.opposite() {
            return Err(StepError::IllegalMove {
                current: self.direction,
                attempted: action,
            });
        }

        let rewards = self.config.rewards;
        let old_distance = self.food_distance();
        let head = self.last_head;
        let next = action.step_from(head);

        self.direction = action;
        self.steps += 1;
        self.steps_since_food += 1;

        if !self.in_bounds(next) {
            return Ok(self.finish(StepReason::Wall, rewards.wall));
        }
        let target = self.cell(next);
        if target == Cell::SnakeBody {
            return Ok(self.finish(StepReason::SelfCollision, rewards.self_collision));
        }

        self.set(head, Cell::SnakeBody);
        self.snake.push_front(next);
        self.set(next, Cell::SnakeHead);
        self.last_head = next;

        let outcome = match target {
            Cell::GoodFood => {
                self.good_food.retain(|&pos| pos != next);
                self.spawn_food(Cell::GoodFood);
                self.steps_since_food = 0;
                StepOutcome {
                    reward: rewards.good_food,
                    done: false,
                    reason: StepReason::AteGood,
                }
            }
            Cell::BadFood => {
                self.bad_food.retain(|&pos| pos != next);
                // the new head is in, so two pops leave the snake one shorter
                if self.snake.len() <= 2 {
                    let dead: Vec<Pos> = self.snake.drain(..).collect();
                    for pos in dead {
                        self.set(pos, Cell::Empty);
                    }
                    self.finish(StepReason::AteBadDied, rewards.bad_food_death)
                } else {
                    self.pop_tail();
                    self.pop_tail();
                    self.spawn_food(Cell::BadFood);
                    self.steps_since_food = 0;
                    StepOutcome {
                        reward: rewards.bad_food,
                        done: false,
                        reason: StepReason::AteBad,
                    }
                }
            }
            _ => {
                self.pop_tail();
                let new_distance = self.food_distance();
                let shaping = if new_distance < old_distance {
                    rewards.closer
                } else if new_distance > old_distance {
                    rewards.farther
                } else {
                    0.0
                };

                if self.steps_since_food > self.config.starvation_limit() {
                    self.finish(StepReason::Starvation, rewards.starvation)
                } else {
                    StepOutcome {
                        reward: shaping,
                        done: false,
                        reason: StepReason::Moved,
                    }
                }
            }
        };

        debug_assert!(self.is_consistent());
        tracing::debug!(
            reason = outcome.reason.as_str(),
            reward = outcome.reward,
            length = self.snake.len(),
            "step"
        );
        Ok(outcome)
    }

    fn pop_tail(&mut self) {
        if let Some(tail) = self.snake.pop_back() {
            self.set(tail, Cell::Empty);
        }
    }

    /// Casts the four rays from the head.
    pub fn observe(&self) -> Observation {
        let origin = self.last_head;
        Observation::new(Direction::ALL.map(|direction| self.look(origin, direction)))
    }

    fn look(&self, origin: Pos, direction: Direction) -> Vec<Cell> {
        let mut ray = Vec::with_capacity(self.config.grid_size);
        let mut pos = direction.step_from(origin);
        while self.in_bounds(pos) {
            ray.push(self.cell(pos));
            pos = direction.step_from(pos);
        }
        ray.push(Cell::Wall);
        ray
    }

    /// Checks that the body list and the grid describe the same board.
    pub fn is_consistent(&self) -> bool {
        let mut heads = 0;
        let mut bodies = 0;
        for &cell in &self.grid {
            match cell {
                Cell::SnakeHead => heads += 1,
                Cell::SnakeBody => bodies += 1,
                Cell::Wall => return false,
                _ => {}
            }
        }

        let mut seen = HashSet::new();
        for (i, &pos) in self.snake.iter().enumerate() {
            let expected = if i == 0 { Cell::SnakeHead } else { Cell::SnakeBody };
            if self.cell(pos) != expected || !seen.insert(pos) {
                return false;
            }
        }
        let expected_heads = usize::from(!self.snake.is_empty());
        if heads != expected_heads || bodies + expected_heads != self.snake.len() {
            return false;
        }

        let good_ok = self.good_food.iter().all(|&pos| self.cell(pos) == Cell::GoodFood);
        let bad_ok = self.bad_food.iter().all(|&pos| self.cell(pos) == Cell::BadFood);
        let food_cells = self
            .grid
            .iter()
            .filter(|&&cell| matches!(cell, Cell::GoodFood | Cell::BadFood))
            .count();
        good_ok && bad_ok && food_cells == self.good_food.len() + self.bad_food.len()
    }

    /// Board showing only what the head can see, framed by the wall ring.
    pub fn vision_string(&self) -> String {
        let size = self.config.grid_size as i32;
        let origin = self.last_head;
        let mut visible = vec![vec![' '; (size + 2) as usize]; (size + 2) as usize];
        let mut mark = |pos: Pos, cell: Cell| {
            visible[(pos.1 + 1) as usize][(pos.0 + 1) as usize] = cell.symbol();
        };

        mark(origin, Cell::SnakeHead);
        for direction in Direction::ALL {
            let mut pos = direction.step_from(origin);
            loop {
                let cell = self.cell(pos);
                mark(pos, cell);
                if cell == Cell::Wall {
                    break;
                }
                pos = direction.step_from(pos);
            }
        }

        visible
            .into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid.chunks(self.config.grid_size) {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_GRID_SIZE;

    fn world(size: usize, seed: u64) -> GridWorld {
        GridWorld::with_seed(GameConfig::new(size), seed).unwrap()
    }

    #[test]
    fn test_opposites() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
            let (dx, dy) = direction.delta();
            let (ox, oy) = direction.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
        assert_eq!(Direction::from_index(1), Some(Direction::Right));
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn test_reset_places_everything_on_board() {
        for size in [MIN_GRID_SIZE, 10, 15, 42] {
            let mut game = world(size, 7);
            for _ in 0..50 {
                game.reset();
                assert!(game.is_consistent());
                assert_eq!(game.snake_len(), 3);
                assert_eq!(game.good_food().len(), 2);
                assert_eq!(game.bad_food().len(), 1);
                assert!(game.snake().iter().all(|&pos| game.in_bounds(pos)));

                let head = game.head().unwrap();
                for &food in game.good_food().iter().chain(game.bad_food()) {
                    assert!(!game.snake().contains(&food));
                    assert!(manhattan(head, food) > 2);
                }
                // body trails away from the heading
                let neck = game.snake()[1];
                assert_eq!(game.direction().opposite().step_from(head), neck);
            }
        }
    }

    #[test]
    fn test_new_rejects_tiny_grid() {
        assert!(GridWorld::with_seed(GameConfig::new(4), 0).is_err());
    }

    #[test]
    fn test_rays_end_in_wall() {
        let mut game = world(10, 3);
        for _ in 0..20 {
            game.reset();
            let observation = game.observe();
            for direction in Direction::ALL {
                let ray = observation.ray(direction);
                assert_eq!(ray.last(), Some(&Cell::Wall));
                assert_eq!(ray.iter().filter(|&&cell| cell == Cell::Wall).count(), 1);
                assert!(ray.len() <= game.grid_size());
            }
        }
    }

    #[test]
    fn test_ray_contents() {
        let mut game = world(10, 0);
        game.arrange(&[(2, 5), (1, 5), (0, 5)], Direction::Right, &[(5, 5)], &[(2, 2)])
            .unwrap();
        let observation = game.observe();

        let right = observation.ray(Direction::Right);
        assert_eq!(right.len(), 8);
        assert_eq!(right[2], Cell::GoodFood);

        assert_eq!(observation.ray(Direction::Left), &[Cell::SnakeBody, Cell::SnakeBody, Cell::Wall]);
        assert_eq!(observation.ray(Direction::Up)[2], Cell::BadFood);
        assert_eq!(observation.ray(Direction::Down).len(), 5);
    }

    #[test]
    fn test_eat_good_food_grows() {
        let mut game = world(10, 1);
        game.arrange(&[(4, 4), (3, 4), (2, 4)], Direction::Right, &[(5, 4), (9, 9)], &[(0, 9)])
            .unwrap();

        let outcome = game.step(Direction::Right).unwrap();

        assert_eq!(outcome.reward, 20.0);
        assert!(!outcome.done);
        assert_eq!(outcome.reason, StepReason::AteGood);
        assert_eq!(game.snake_len(), 4);
        assert_eq!(game.good_food().len(), 2);
        assert!(!game.good_food().contains(&(5, 4)));
        assert_eq!(game.steps_since_food(), 0);
        assert!(game.is_consistent());
    }

    #[test]
    fn test_wall_collision() {
        let mut game = world(10, 2);
        game.arrange(&[(9, 3), (8, 3), (7, 3)], Direction::Right, &[(0, 0)], &[(0, 9)])
            .unwrap();

        let outcome = game.step(Direction::Right).unwrap();

        assert_eq!(outcome.reward, -30.0);
        assert!(outcome.done);
        assert_eq!(outcome.reason, StepReason::Wall);
        assert!(game.is_terminal());
    }

    #[test]
    fn test_self_collision() {
        let mut game = world(10, 2);
        let snake = [(4, 4), (5, 4), (5, 5), (4, 5), (3, 5)];
        game.arrange(&snake, Direction::Left, &[(0, 0)], &[(0, 9)]).unwrap();

        let outcome = game.step(Direction::Down).unwrap();

        assert_eq!(outcome.reward, -30.0);
        assert_eq!(outcome.reason, StepReason::SelfCollision);
        assert_eq!(game.snake_len(), 5);
    }

    #[test]
    fn test_bad_food_shrinks() {
        let mut game = world(10, 4);
        let snake = [(4, 4), (3, 4), (2, 4), (1, 4)];
        game.arrange(&snake, Direction::Right, &[(9, 9)], &[(5, 4)]).unwrap();

        let outcome = game.step(Direction::Right).unwrap();

        assert_eq!(outcome.reward, -10.0);
        assert!(!outcome.done);
        assert_eq!(outcome.reason, StepReason::AteBad);
        assert_eq!(game.snake_len(), 3);
        assert_eq!(game.head(), Some((5, 4)));
        assert_eq!(game.bad_food().len(), 1);
        assert_eq!(game.cell((2, 4)), Cell::Empty);
        assert!(game.is_consistent());
    }

    #[test]
    fn test_bad_food_leaves_two_segment_snake_alive() {
        let mut game = world(10, 4);
        game.arrange(&[(4, 4), (3, 4)], Direction::Right, &[(9, 9)], &[(5, 4)]).unwrap();

        let outcome = game.step(Direction::Right).unwrap();

        assert_eq!(outcome.reward, -10.0);
        assert!(!outcome.done);
        assert_eq!(outcome.reason, StepReason::AteBad);
        assert_eq!(game.snake_len(), 1);
        assert_eq!(game.head(), Some((5, 4)));
        assert_eq!(game.cell((4, 4)), Cell::Empty);
        assert_eq!(game.cell((3, 4)), Cell::Empty);
        assert!(!game.is_terminal());
        assert!(game.is_consistent());
    }

    #[test]
    fn test_bad_food_kills_single_segment() {
        let mut game = world(10, 4);
        game.arrange(&[(4, 4)], Direction::Right, &[(9, 9)], &[(5, 4)]).unwrap();

        let outcome = game.step(Direction::Right).unwrap();

        assert_eq!(outcome.reward, -20.0);
        assert!(outcome.done);
        assert_eq!(outcome.reason, StepReason::AteBadDied);
        assert_eq!(game.snake_len(), 0);
        assert!(game.is_consistent());
        // the dead snake still has a vantage point
        assert_eq!(game.observe().ray(Direction::Right).len(), 5);
    }

    #[test]
    fn test_step_after_done_is_noop() {
        let mut game = world(10, 5);
        game.arrange(&[(0, 0), (1, 0)], Direction::Left, &[(9, 9)], &[(5, 5)]).unwrap();
        game.step(Direction::Left).unwrap();

        let before = game.to_string();
        let snake = game.snake().clone();
        for direction in Direction::ALL {
            let outcome = game.step(direction).unwrap();
            assert_eq!(outcome.reward, 0.0);
            assert!(outcome.done);
            assert_eq!(outcome.reason, StepReason::Wall);
        }
        assert_eq!(game.to_string(), before);
        assert_eq!(game.snake(), &snake);
    }

    #[test]
    fn test_reversal_is_rejected() {
        let mut game = world(10, 6);
        game.arrange(&[(4, 4), (3, 4), (2, 4)], Direction::Right, &[(9, 9)], &[(0, 9)])
            .unwrap();
        let before = game.to_string();

        let result = game.step(Direction::Left);

        assert_eq!(
            result,
            Err(StepError::IllegalMove {
                current: Direction::Right,
                attempted: Direction::Left
            })
        );
        assert_eq!(game.to_string(), before);
        assert_eq!(game.steps(), 0);
    }

    #[test]
    fn test_distance_shaping() {
        let mut game = world(10, 8);
        game.arrange(&[(4, 4), (3, 4), (2, 4)], Direction::Right, &[(8, 4)], &[(0, 9)])
            .unwrap();

        assert_eq!(game.step(Direction::Right).unwrap().reward, 1.0);
        assert_eq!(game.step(Direction::Up).unwrap().reward, -0.5);
        assert_eq!(game.step(Direction::Right).unwrap().reward, 1.0);
        assert_eq!(game.step(Direction::Right).unwrap().reason, StepReason::Moved);
    }

    #[test]
    fn test_starvation() {
        let mut game = world(10, 9);
        game.arrange(&[(1, 1)], Direction::Right, &[(9, 9)], &[(9, 0)]).unwrap();

        // circle the same four cells until the stall limit runs out
        let cycle = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];
        let mut last = None;
        for i in 0..=game.config().starvation_limit() {
            let outcome = game.step(cycle[i % 4]).unwrap();
            last = Some(outcome);
            if outcome.done {
                break;
            }
        }

        let outcome = last.unwrap();
        assert!(outcome.done);
        assert_eq!(outcome.reason, StepReason::Starvation);
        assert_eq!(outcome.reward, -10.0);
        assert_eq!(game.steps(), 31);
    }

    #[test]
    fn test_random_walk_stays_consistent() {
        let mut game = world(12, 11);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            game.reset();
            while !game.is_terminal() {
                let options: Vec<Direction> = Direction::ALL
                    .into_iter()
                    .filter(|&d| d != game.direction().opposite())
                    .collect();
                let action = *options.choose(&mut rng).unwrap();
                game.step(action).unwrap();
                assert!(game.is_consistent());
            }
        }
    }

    #[test]
    fn test_display() {
        let mut game = world(7, 0);
        game.arrange(&[(1, 0), (0, 0)], Direction::Right, &[(3, 0)], &[(6, 6)]).unwrap();
        let text = game.to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], "SH0G000");
        assert_eq!(rows[6], "000000R");

        let vision = game.vision_string();
        let rows: Vec<&str> = vision.lines().collect();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0], "  W      ");
        assert_eq!(rows[1], "WSH0G000W");
    }
}
