use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::Direction;
use crate::vision::StateKey;

/// One value per direction, indexed by `Direction::index`.
pub type ActionValues = [f32; 4];

/// Sparse action-value table. Rows appear on first touch and are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    values: HashMap<StateKey, ActionValues>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &StateKey) -> Option<&ActionValues> {
        self.values.get(key)
    }

    /// Row for `key`, zero-initialised if the state has not been seen.
    pub fn entry(&mut self, key: StateKey) -> &mut ActionValues {
        self.values.entry(key).or_insert([0.0; 4])
    }

    pub fn value(&self, key: &StateKey, action: Direction) -> f32 {
        self.values
            .get(key)
            .map_or(0.0, |row| row[action.index()])
    }

    /// Highest value among `actions`, or 0 when there are none.
    pub fn max_value(&self, key: &StateKey, actions: impl IntoIterator<Item = Direction>) -> f32 {
        let row = self.values.get(key).copied().unwrap_or_default();
        actions
            .into_iter()
            .map(|action| row[action.index()])
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.values.iter()
    }
}
