// Single-cushion bank-shot search
//
// Sweeps launch angles around the nearest target, reflects each ray off the
// first boundary wall it meets, and accepts the first angle whose reflected
// ray passes within reach of any live target.

use tracing::debug;

use super::target::Target;
use crate::config::AimingProfile;
use crate::geometry::{reflect, segment_intersection, Vec2};
use crate::world::{Category, WallSegment, WorldQuery};

/// Length of the probe ray cast from the launcher
pub const BOUNCE_RAY_LENGTH: f32 = 2000.0;

/// Footprint radius assumed when the world cannot report one
pub const DEFAULT_TARGET_RADIUS: f32 = 10.0;

// Hits closer than this to the ray origin are the origin itself
const MIN_HIT_DISTANCE_SQ: f32 = 1e-6;

/// Search window parameters, converted to radians once
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceSearch {
    pub range_rad: f32,
    pub step_rad: f32,
    pub tolerance: f32,
}

impl BounceSearch {
    pub fn from_profile(profile: &AimingProfile) -> Self {
        Self {
            range_rad: profile.bounce_angle_search_range_deg.to_radians(),
            step_rad: profile.bounce_angle_search_step_deg.to_radians(),
            tolerance: profile.bounce_target_tolerance,
        }
    }
}

/// A launch angle that reaches a target via one cushion. Valid for one search only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceSolution {
    pub launch_angle: f32,
    pub impact_point: Vec2,
    pub reflected_direction: Vec2,
    pub resolved_target: Target,
}

/// Candidate launch angles, starting at `center` and fanning outward.
///
/// Every angle lies within `center ± range / 2` and the outermost ones reach
/// its edges. Profiles keep `range / step` bounded at validation.
pub fn sweep_angles(center: f32, range: f32, step: f32) -> impl Iterator<Item = f32> {
    let half = range / 2.0;
    let steps = if step > 0.0 && half >= 0.0 {
        ((half / step) + 1e-4).floor() as usize
    } else {
        0
    };

    std::iter::once(center).chain((1..=steps).flat_map(move |k| {
        let offset = k as f32 * step;
        [center - offset, center + offset]
    }))
}

/// Search for a bank shot from `origin` onto any of `targets`.
///
/// Returns the first accepted angle in sweep order, not the best one.
pub fn find_bounce_shot<W: WorldQuery + ?Sized>(
    world: &W,
    origin: Vec2,
    targets: &[Target],
    search: &BounceSearch,
) -> Option<BounceSolution> {
    if !origin.is_finite() || targets.is_empty() {
        return None;
    }

    let walls: Vec<WallSegment> = world
        .wall_segments()
        .into_iter()
        .filter(|w| w.category.intersects(Category::ARENA))
        .collect();
    if walls.is_empty() {
        return None;
    }

    let center = nearest_target_angle(world, origin, targets)?;

    for angle in sweep_angles(center, search.range_rad, search.step_rad) {
        let dir = Vec2::from_angle(angle);
        let ray_end = origin + dir * BOUNCE_RAY_LENGTH;

        let Some((impact, wall)) = first_wall_hit(origin, ray_end, &walls) else {
            continue;
        };
        let Some(normal) = cushion_normal(wall, dir) else {
            continue;
        };
        let reflected = reflect(dir, normal);

        if let Some(target) = first_target_on_ray(world, impact, reflected, targets, search.tolerance) {
            debug!(
                angle_deg = angle.to_degrees(),
                "bank shot found off ({:.0}, {:.0})",
                impact.x,
                impact.y
            );
            return Some(BounceSolution {
                launch_angle: angle,
                impact_point: impact,
                reflected_direction: reflected,
                resolved_target: target,
            });
        }
    }

    None
}

fn nearest_target_angle<W: WorldQuery + ?Sized>(
    world: &W,
    origin: Vec2,
    targets: &[Target],
) -> Option<f32> {
    targets
        .iter()
        .filter_map(|t| world.position(t.bearing))
        .map(|pos| (origin.distance_squared(pos), pos))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, pos)| origin.angle_to(pos))
}

fn first_wall_hit(origin: Vec2, ray_end: Vec2, walls: &[WallSegment]) -> Option<(Vec2, WallSegment)> {
    let mut best: Option<(f32, Vec2, WallSegment)> = None;

    for wall in walls {
        let Some(hit) = segment_intersection(origin, ray_end, wall.a, wall.b) else {
            continue;
        };
        let dist_sq = origin.distance_squared(hit);
        if dist_sq <= MIN_HIT_DISTANCE_SQ {
            continue;
        }
        if best.map_or(true, |(d, _, _)| dist_sq < d) {
            best = Some((dist_sq, hit, *wall));
        }
    }

    best.map(|(_, hit, wall)| (hit, wall))
}

/// Unit normal of the wall facing back toward the incoming ray
fn cushion_normal(wall: WallSegment, incoming: Vec2) -> Option<Vec2> {
    let normal = (wall.b - wall.a).perp().normalized()?;
    if incoming.dot(normal) > 0.0 {
        Some(-normal)
    } else {
        Some(normal)
    }
}

/// Ray-vs-circle acceptance test against every target
fn first_target_on_ray<W: WorldQuery + ?Sized>(
    world: &W,
    start: Vec2,
    dir: Vec2,
    targets: &[Target],
    tolerance: f32,
) -> Option<Target> {
    for target in targets {
        let Some(center) = world.position(target.bearing) else {
            continue;
        };

        let proj = (center - start).dot(dir);
        if proj < 0.0 {
            continue; // behind the cushion
        }

        let closest = start + dir * proj;
        let radius = world
            .footprint_radius(target.visual)
            .unwrap_or(DEFAULT_TARGET_RADIUS);
        let reach = radius + tolerance;
        if closest.distance_squared(center) <= reach * reach {
            return Some(*target);
        }
    }

    None
}
