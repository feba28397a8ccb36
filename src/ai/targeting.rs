// Target selection strategies

use tracing::error;

use super::target::{Target, TargetSelection};
use crate::config::{TargetingKind, TargetingProfile};
use crate::geometry::Vec2;
use crate::world::{Side, WorldQuery};

/// Picks the best live target for one agent.
///
/// Stateless between calls: every pass re-reads the roster from the world.
#[derive(Debug, Clone)]
pub struct TargetingStrategy {
    kind: TargetingKind,
    side: Side,
}

impl TargetingStrategy {
    pub fn new(side: Side, profile: &TargetingProfile) -> Self {
        Self {
            kind: profile.strategy,
            side,
        }
    }

    pub fn kind(&self) -> TargetingKind {
        self.kind
    }

    /// Filter the roster down to live targets and choose one of them.
    ///
    /// Returns `None` only when the roster is malformed. An empty arena yields an
    /// empty selection instead, so callers can tell "broken" from "nothing to shoot".
    ///
    /// # Arguments
    /// * `world` - World to read the roster and positions from
    /// * `pivot` - The agent's launcher pivot
    pub fn find_target<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        pivot: Vec2,
    ) -> Option<TargetSelection> {
        let Some(roster) = world.target_roster() else {
            error!(side = %self.side, "target roster is incomplete");
            return None;
        };

        let all_valid: Vec<Target> = roster.into_iter().filter(|t| t.is_live(world)).collect();
        if all_valid.is_empty() {
            return Some(TargetSelection::empty());
        }

        let best = match self.kind {
            TargetingKind::Closest => closest_to(world, &all_valid, pivot),
            TargetingKind::ClosestToGoal => {
                let goal = self.opponent_goal_position(world);
                closest_to(world, &all_valid, goal)
            }
        };

        Some(TargetSelection { best, all_valid })
    }

    /// Where the opponent's goal sensor sits, or a point on the far end line if it is missing
    fn opponent_goal_position<W: WorldQuery + ?Sized>(&self, world: &W) -> Vec2 {
        world
            .find_body_by_tag(self.side.opponent_goal_tag())
            .and_then(|goal| world.position(goal))
            .unwrap_or_else(|| {
                let extents = world.extents();
                let x = match self.side {
                    Side::Left => extents.width,
                    Side::Right => 0.0,
                };
                Vec2::new(x, extents.height / 2.0)
            })
    }
}

/// First target whose bearing is nearest to `point` (strictly smaller wins ties)
fn closest_to<W: WorldQuery + ?Sized>(world: &W, targets: &[Target], point: Vec2) -> Option<Target> {
    let mut best = None;
    let mut best_metric = f32::INFINITY;

    for target in targets {
        let Some(position) = world.position(target.bearing) else {
            continue;
        };
        let metric = point.distance_squared(position);
        if metric < best_metric {
            best_metric = metric;
            best = Some(*target);
        }
    }

    best
}
