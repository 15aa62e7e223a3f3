use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyParseError;
use crate::game::{Cell, Direction, Observation};

pub const DANGER_NONE: u8 = 0;
pub const DANGER_NEAR: u8 = 1;
pub const DANGER_IMMEDIATE: u8 = 2;

pub const FOOD_NONE: u8 = 0;
pub const FOOD_FAR: u8 = 1;
pub const FOOD_NEAR: u8 = 2;
pub const FOOD_IMMEDIATE: u8 = 3;

pub const BAD_FOOD_VISIBLE: u8 = 1;

/// Separates the danger, good food and bad food groups in the textual key.
pub const KEY_DELIMITER: char = '|';

const GROUP_MAX: [u8; 3] = [DANGER_IMMEDIATE, FOOD_IMMEDIATE, BAD_FOOD_VISIBLE];

/// Bucketed view of an observation, one digit per direction per signal.
///
/// Digits are stored in `Direction::ALL` order. The textual form is
/// `dddd|gggg|bbbb` (danger, good food, bad food).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    danger: [u8; 4],
    good_food: [u8; 4],
    bad_food: [u8; 4],
}

impl StateKey {
    /// Builds a key from raw levels, clamping each digit to its alphabet.
    pub fn from_levels(danger: [u8; 4], good_food: [u8; 4], bad_food: [u8; 4]) -> Self {
        Self {
            danger: danger.map(|d| d.min(DANGER_IMMEDIATE)),
            good_food: good_food.map(|g| g.min(FOOD_IMMEDIATE)),
            bad_food: bad_food.map(|b| b.min(BAD_FOOD_VISIBLE)),
        }
    }

    pub fn danger(&self, direction: Direction) -> u8 {
        self.danger[direction.index()]
    }

    pub fn good_food(&self, direction: Direction) -> u8 {
        self.good_food[direction.index()]
    }

    pub fn bad_food(&self, direction: Direction) -> u8 {
        self.bad_food[direction.index()]
    }

    /// Moving this way does not hit a wall or the body right away.
    pub fn is_safe(&self, direction: Direction) -> bool {
        self.danger(direction) < DANGER_IMMEDIATE
    }

    pub fn sees_food(&self, direction: Direction) -> bool {
        self.good_food(direction) != FOOD_NONE
    }

    pub fn digits(&self) -> [[u8; 4]; 3] {
        [self.danger, self.good_food, self.bad_food]
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.digits().iter().enumerate() {
            if i > 0 {
                write!(f, "{KEY_DELIMITER}")?;
            }
            for digit in group {
                write!(f, "{digit}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for StateKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split(KEY_DELIMITER).collect();
        if groups.len() != 3 {
            return Err(KeyParseError::GroupCount(groups.len()));
        }

        let mut digits = [[0u8; 4]; 3];
        for (group, text) in groups.iter().enumerate() {
            if text.chars().count() != 4 {
                return Err(KeyParseError::GroupLength {
                    group,
                    found: text.to_string(),
                });
            }
            for (slot, ch) in text.chars().enumerate() {
                let value = ch
                    .to_digit(10)
                    .map(|d| d as u8)
                    .filter(|&d| d <= GROUP_MAX[group])
                    .ok_or(KeyParseError::Digit { group, digit: ch })?;
                digits[group][slot] = value;
            }
        }

        let [danger, good_food, bad_food] = digits;
        Ok(Self {
            danger,
            good_food,
            bad_food,
        })
    }
}

/// Compresses observations into state keys over a short look-ahead window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionEncoder {
    horizon: usize,
}

impl Default for VisionEncoder {
    fn default() -> Self {
        Self { horizon: 3 }
    }
}

impl VisionEncoder {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon: horizon.max(1),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn encode(&self, observation: &Observation) -> StateKey {
        let mut key = StateKey::default();
        for direction in Direction::ALL {
            let (danger, good, bad) = self.encode_ray(observation.ray(direction));
            let i = direction.index();
            key.danger[i] = danger;
            key.good_food[i] = good;
            key.bad_food[i] = bad;
        }
        key
    }

    /// Danger, good food and bad food levels for a single ray.
    pub fn encode_ray(&self, ray: &[Cell]) -> (u8, u8, u8) {
        let window = &ray[..ray.len().min(self.horizon)];

        let danger = match window.iter().position(|cell| cell.is_deadly()) {
            Some(0) => DANGER_IMMEDIATE,
            Some(_) => DANGER_NEAR,
            None => DANGER_NONE,
        };
        let good = match window.iter().position(|&cell| cell == Cell::GoodFood) {
            Some(0) => FOOD_IMMEDIATE,
            Some(1) => FOOD_NEAR,
            Some(_) => FOOD_FAR,
            None => FOOD_NONE,
        };
        let bad = if window.contains(&Cell::BadFood) {
            BAD_FOOD_VISIBLE
        } else {
            0
        };

        (danger, good, bad)
    }

    /// Parses the textual form back into a key, for debugging and tests.
    pub fn decode(&self, key: &str) -> Result<StateKey, KeyParseError> {
        key.parse()
    }
}
