// Lightweight human-behaviour tracker
//
// Not a model: a fixed window of recent fire sides and a majority test.

use std::collections::VecDeque;

use tracing::info;

use crate::world::Side;

/// How many recent human shots are remembered
pub const MEMORY_LIMIT: usize = 20;

/// Share of the window one side needs before it counts as a bias
pub const BIAS_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct PlayerBehaviorTracker {
    shot_history: VecDeque<Side>,
    human_side: Option<Side>,
}

impl Default for PlayerBehaviorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerBehaviorTracker {
    pub fn new() -> Self {
        Self {
            shot_history: VecDeque::with_capacity(MEMORY_LIMIT + 1),
            human_side: None,
        }
    }

    /// Start watching a human on `side` with an empty history
    pub fn init(&mut self, side: Side) {
        self.human_side = Some(side);
        self.reset();
        info!(%side, "behaviour tracker watching human");
    }

    /// Forget all recorded shots (round reset)
    pub fn reset(&mut self) {
        self.shot_history.clear();
    }

    pub fn human_side(&self) -> Option<Side> {
        self.human_side
    }

    /// Record a shot from the watched human. No-op when nobody is watched.
    pub fn record_human_shot(&mut self) {
        if let Some(side) = self.human_side {
            self.record_shot(side);
        }
    }

    /// Append one shot, evicting the oldest beyond `MEMORY_LIMIT`
    pub fn record_shot(&mut self, side: Side) {
        self.shot_history.push_back(side);
        if self.shot_history.len() > MEMORY_LIMIT {
            self.shot_history.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.shot_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shot_history.is_empty()
    }

    /// The side the human favours, once at least half the window is filled
    pub fn side_bias(&self) -> Option<Side> {
        if self.shot_history.len() < MEMORY_LIMIT / 2 {
            return None;
        }

        let left = self
            .shot_history
            .iter()
            .filter(|s| **s == Side::Left)
            .count();
        let total = self.shot_history.len();
        let right = total - left;

        if left as f32 / total as f32 >= BIAS_THRESHOLD {
            Some(Side::Left)
        } else if right as f32 / total as f32 >= BIAS_THRESHOLD {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Opposite of the current bias, if there is one
    pub fn counter_side(&self) -> Option<Side> {
        self.side_bias().map(Side::opposite)
    }
}
