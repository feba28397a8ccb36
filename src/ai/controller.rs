// Game-facing wrapper around one personality

use tracing::info;

use super::personality::{Personality, PersonalityState};
use super::tracker::PlayerBehaviorTracker;
use crate::config::Profile;
use crate::world::{DuelWorld, Side};

/// Drives one launcher for the host loop.
///
/// The host calls `update` once per simulation tick and `reset_round` after
/// every score; everything else is owned by the personality.
#[derive(Debug, Clone)]
pub struct OpponentController {
    personality: Personality,
}

impl OpponentController {
    pub fn new(side: Side, profile: Option<Profile>, seed: u64) -> Self {
        Self {
            personality: Personality::new(side, profile, seed),
        }
    }

    pub fn side(&self) -> Side {
        self.personality.side()
    }

    pub fn state(&self) -> PersonalityState {
        self.personality.state()
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn update<W: DuelWorld>(
        &mut self,
        world: &mut W,
        time_ms: f64,
        delta_ms: f32,
        tracker: Option<&PlayerBehaviorTracker>,
    ) {
        self.personality.update(world, time_ms, delta_ms, tracker);
    }

    pub fn reset_round(&mut self) {
        info!(side = %self.side(), "opponent reset for new round");
        self.personality.reset_round();
    }
}
