// Line-of-sight checks run right before firing

use tracing::debug;

use super::target::Target;
use crate::config::AimingProfile;
use crate::geometry::Vec2;
use crate::world::{Category, Side, WorldQuery};

/// Categories that block a shot by default: boundary walls and corner wedges
pub const DEFAULT_OBSTACLES: Category = Category::ARENA.union(Category::WEDGE);

#[derive(Debug, Clone)]
pub enum ObstacleStrategy {
    /// Every lane counts as clear
    NoCheck,
    /// Cast a ray to the target and look for blocking bodies
    RaycastLineOfSight {
        opponent_goal_tag: &'static str,
        obstacles: Category,
    },
}

impl ObstacleStrategy {
    pub fn new(side: Side, profile: &AimingProfile) -> Self {
        if profile.check_line_of_sight {
            ObstacleStrategy::raycast(side, DEFAULT_OBSTACLES)
        } else {
            ObstacleStrategy::NoCheck
        }
    }

    pub fn raycast(side: Side, obstacles: Category) -> Self {
        ObstacleStrategy::RaycastLineOfSight {
            opponent_goal_tag: side.opponent_goal_tag(),
            obstacles,
        }
    }

    /// Whether a straight shot from `origin` reaches the target's bearing unobstructed.
    ///
    /// The opponent's goal sensor and both halves of the target itself never block.
    /// A target whose bearing has no position counts as blocked.
    pub fn is_path_clear<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        origin: Vec2,
        target: &Target,
    ) -> bool {
        let ObstacleStrategy::RaycastLineOfSight {
            opponent_goal_tag,
            obstacles,
        } = self
        else {
            return true;
        };

        let Some(target_pos) = world.position(target.bearing) else {
            return false;
        };

        for hit in world.raycast(origin, target_pos) {
            if hit.tag == *opponent_goal_tag
                || hit.body == target.bearing
                || hit.body == target.visual
            {
                continue;
            }

            if hit.category.intersects(*obstacles) {
                debug!(blocker = %hit.tag, "line of sight blocked");
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaState;

    fn los() -> ObstacleStrategy {
        ObstacleStrategy::raycast(Side::Left, DEFAULT_OBSTACLES)
    }

    #[test]
    fn test_no_check_is_always_clear() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.add_wall(Vec2::new(300.0, 0.0), Vec2::new(300.0, 600.0));
        assert!(ObstacleStrategy::NoCheck.is_path_clear(&arena, Vec2::new(0.0, 300.0), &target));
    }

    #[test]
    fn test_wall_blocks() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.add_wall(Vec2::new(300.0, 0.0), Vec2::new(300.0, 600.0));
        assert!(!los().is_path_clear(&arena, Vec2::new(0.0, 300.0), &target));
    }

    #[test]
    fn test_wedge_blocks() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.add_wedge(vec![
            Vec2::new(300.0, 250.0),
            Vec2::new(350.0, 350.0),
            Vec2::new(250.0, 350.0),
        ]);
        assert!(!los().is_path_clear(&arena, Vec2::new(0.0, 300.0), &target));
    }

    #[test]
    fn test_target_goal_and_other_pucks_do_not_block() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_goal(Side::Right, Vec2::new(400.0, 300.0), 20.0, 100.0);
        // Another puck in the lane is not in the obstacle set
        arena.add_puck(Vec2::new(300.0, 300.0), Vec2::ZERO);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        assert!(los().is_path_clear(&arena, Vec2::new(0.0, 300.0), &target));
    }

    #[test]
    fn test_ignored_bodies_with_every_category_blocking() {
        let strict = ObstacleStrategy::raycast(Side::Left, Category::all());
        let origin = Vec2::new(0.0, 300.0);

        // Opponent's goal sensor in the lane plus the target's own visual and bearing
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_goal(Side::Right, Vec2::new(400.0, 300.0), 20.0, 100.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        assert!(strict.is_path_clear(&arena, origin, &target));

        // Our own goal sensor is not exempt
        arena.add_goal(Side::Left, Vec2::new(200.0, 300.0), 20.0, 100.0);
        assert!(!strict.is_path_clear(&arena, origin, &target));

        // Neither is another puck
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(300.0, 300.0), Vec2::ZERO);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        assert!(!strict.is_path_clear(&arena, origin, &target));
    }

    #[test]
    fn test_own_goal_sensor_is_not_an_obstacle_category() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_goal(Side::Left, Vec2::new(100.0, 300.0), 20.0, 100.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        assert!(los().is_path_clear(&arena, Vec2::new(0.0, 300.0), &target));
    }

    #[test]
    fn test_check_is_idempotent() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.add_wall(Vec2::new(300.0, 280.0), Vec2::new(300.0, 600.0));
        let origin = Vec2::new(0.0, 300.0);
        let first = los().is_path_clear(&arena, origin, &target);
        let second = los().is_path_clear(&arena, origin, &target);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_bearing_is_blocked() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.destroy(target.bearing);
        assert!(!los().is_path_clear(&arena, Vec2::new(0.0, 300.0), &target));
    }
}
