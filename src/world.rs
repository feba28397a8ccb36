// Collaborator interfaces the decision engine consumes
//
// The engine never owns the simulation. It reads positions, velocities and ray
// hits through `WorldQuery`, turns the launcher through `Launcher`, and spends
// or refills ammunition through `Armory`.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ai::Target;
use crate::geometry::Vec2;

/// Which end of the arena a launcher (or a human) plays from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Tag of the goal sensor this side shoots at
    pub fn opponent_goal_tag(self) -> &'static str {
        match self {
            Side::Left => GOAL_RIGHT_TAG,
            Side::Right => GOAL_LEFT_TAG,
        }
    }

    /// Tag of the goal sensor this side defends
    pub fn own_goal_tag(self) -> &'static str {
        self.opposite().opponent_goal_tag()
    }

    /// Launch angle that points from this side's back wall into the arena
    pub fn forward_angle(self) -> f32 {
        match self {
            Side::Left => 0.0,
            Side::Right => std::f32::consts::PI,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

pub const GOAL_LEFT_TAG: &str = "goal_left";
pub const GOAL_RIGHT_TAG: &str = "goal_right";

/// Opaque handle to a simulated body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

bitflags! {
    /// Collision categories, one bit each
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u32 {
        const BALL = 0x0001;
        const PUCK = 0x0002;
        const BEARING = 0x0004;
        const ARENA = 0x0008;
        const SENSOR = 0x0010;
        const WEDGE = 0x0020;
    }
}

/// One body crossed by a ray, in order of distance from the ray origin
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub body: BodyId,
    pub category: Category,
    pub tag: String,
    /// Fraction along the ray where the body is first entered
    pub fraction: f32,
}

/// A static boundary edge usable as a bank-shot cushion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSegment {
    pub a: Vec2,
    pub b: Vec2,
    pub category: Category,
}

/// Playfield size used when a goal sensor cannot be located
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub width: f32,
    pub height: f32,
}

/// Read-only queries against the physics simulation
pub trait WorldQuery {
    /// Whether the match is live; the engine idles otherwise
    fn match_in_progress(&self) -> bool {
        true
    }

    /// Every scoreable target known to the world, whether live or not.
    ///
    /// `None` means the roster itself is malformed (a target is missing a part).
    fn target_roster(&self) -> Option<Vec<Target>>;

    /// Bodies currently in the simulation
    fn active_bodies(&self) -> Vec<BodyId>;

    fn is_active(&self, body: BodyId) -> bool;

    /// Whether a target's visual body has already been scored
    fn is_captured(&self, body: BodyId) -> bool;

    fn position(&self, body: BodyId) -> Option<Vec2>;

    fn velocity(&self, body: BodyId) -> Option<Vec2>;

    /// Approximate radius of the body's visual footprint
    fn footprint_radius(&self, body: BodyId) -> Option<f32>;

    /// Bodies crossed by the segment `from -> to`, nearest first
    fn raycast(&self, from: Vec2, to: Vec2) -> Vec<RayHit>;

    fn find_body_by_tag(&self, tag: &str) -> Option<BodyId>;

    /// Edges of static, non-sensor boundary bodies
    fn wall_segments(&self) -> Vec<WallSegment>;

    fn extents(&self) -> Extents;

    /// Horizontal axis a lateral force field is centred on, if any
    fn reference_axis_y(&self) -> Option<f32>;
}

/// A rotatable launcher
pub trait Launcher {
    fn angle(&self) -> f32;

    fn set_angle(&mut self, radians: f32);

    /// Fixed point the launcher rotates about
    fn pivot(&self) -> Vec2;

    /// Where projectiles leave the barrel at the current angle
    fn exit_point(&self) -> Vec2;
}

/// Ammunition bookkeeping. Writes are serialised by the surrounding simulation.
pub trait Armory {
    fn ammo(&self, side: Side) -> u32;

    /// Fires one projectile; returns whether a shot actually left
    fn fire_launcher(&mut self, side: Side) -> bool;

    /// Moves one collected projectile back into the magazine
    fn reload_launcher(&mut self, side: Side) -> bool;

    /// Whether the side's collection zone holds a reloadable projectile
    fn is_resource_available(&self, side: Side) -> bool;
}

/// Everything one agent needs from the world in a single tick
pub trait DuelWorld: WorldQuery + Armory {
    type Launcher: Launcher;

    fn launcher(&self, side: Side) -> &Self::Launcher;

    fn launcher_mut(&mut self, side: Side) -> &mut Self::Launcher;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_goal_tags() {
        assert_eq!(Side::Left.opponent_goal_tag(), "goal_right");
        assert_eq!(Side::Right.opponent_goal_tag(), "goal_left");
        assert_eq!(Side::Left.own_goal_tag(), "goal_left");
    }

    #[test]
    fn test_category_intersection() {
        let obstacles = Category::ARENA | Category::WEDGE;
        assert!(obstacles.intersects(Category::WEDGE));
        assert!(!obstacles.intersects(Category::PUCK | Category::BEARING));
    }

    #[test]
    fn test_side_serde_lowercase() {
        let json = serde_json::to_string(&Side::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }
}
