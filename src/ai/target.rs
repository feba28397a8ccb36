// Scoreable targets: a visual body paired with the bearing that carries its physics

use crate::world::{BodyId, WorldQuery};

/// A puck the agent can shoot at.
///
/// The visual body is what scores; the bearing is what moves. Both halves are
/// required, so a `Target` always names a complete pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub visual: BodyId,
    pub bearing: BodyId,
}

impl Target {
    pub fn new(visual: BodyId, bearing: BodyId) -> Self {
        Self { visual, bearing }
    }

    /// Both bodies are present and active, and the visual has not been scored
    pub fn is_live<W: WorldQuery + ?Sized>(&self, world: &W) -> bool {
        world.is_active(self.visual)
            && !world.is_captured(self.visual)
            && world.is_active(self.bearing)
            && world.position(self.bearing).is_some()
    }
}

/// Result of one targeting pass. Rebuilt every evaluation, never carried across ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSelection {
    pub best: Option<Target>,
    pub all_valid: Vec<Target>,
}

impl TargetSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Finds the held pairing for a bearing, if it is still in the set
    pub fn find_by_bearing(&self, bearing: BodyId) -> Option<Target> {
        self.all_valid.iter().copied().find(|t| t.bearing == bearing)
    }
}
