// Aim solver: bank shots, direct/predictive lead, and repulsor compensation

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};

use super::bounce::{find_bounce_shot, BounceSearch};
use super::target::Target;
use crate::config::AimingProfile;
use crate::geometry::{shortest_angle_diff, Vec2};
use crate::world::{Side, WorldQuery};

/// How far ahead (in simulation frames) a moving target is extrapolated
pub const LOOKAHEAD_FRAMES: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimResult {
    pub angle: f32,
    /// The target the angle is meant to hit. A bank shot may pick a different
    /// one than requested; `None` means the aim fell back to the safe default.
    pub resolved_target: Option<Target>,
}

/// Converts a chosen target into a launch angle.
///
/// Owns the agent's seeded random source so that aim error and bank-shot
/// gating are reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct AimingStrategy {
    side: Side,
    profile: AimingProfile,
    search: BounceSearch,
    error: Option<Uniform<f32>>,
    rng: ChaCha8Rng,
}

impl AimingStrategy {
    pub fn new(side: Side, profile: &AimingProfile, seed: u64) -> Self {
        let error = (profile.error_margin > 0.0)
            .then(|| Uniform::new_inclusive(-profile.error_margin, profile.error_margin));

        Self {
            side,
            profile: profile.clone(),
            search: BounceSearch::from_profile(profile),
            error,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Compute this tick's desired launch angle.
    ///
    /// # Arguments
    /// * `world` - Positions, velocities and walls
    /// * `origin` - The launcher's exit point
    /// * `target` - Target picked by the targeting strategy
    /// * `all_valid` - Every live target, used as bank-shot candidates
    pub fn calculate_aim_angle<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        origin: Vec2,
        target: Option<Target>,
        all_valid: &[Target],
    ) -> AimResult {
        if target.is_some() && self.should_try_bounce(all_valid) {
            if let Some(solution) = find_bounce_shot(world, origin, all_valid, &self.search) {
                let angle = solution.launch_angle + self.sample_error();
                if angle.is_finite() {
                    return AimResult {
                        angle,
                        resolved_target: Some(solution.resolved_target),
                    };
                }
            }
            // No cushion reaches anything this time, aim directly instead
        }

        self.direct_aim(world, origin, target)
    }

    /// Angle used whenever the aim cannot be computed: straight out from our own end
    pub fn safe_default(&self) -> AimResult {
        AimResult {
            angle: self.side.forward_angle(),
            resolved_target: None,
        }
    }

    fn should_try_bounce(&mut self, all_valid: &[Target]) -> bool {
        // The random draw only happens when bank shots are possible at all
        self.profile.can_bounce_shot
            && !all_valid.is_empty()
            && self.rng.gen::<f32>() < self.profile.bounce_shot_chance
    }

    fn direct_aim<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        origin: Vec2,
        target: Option<Target>,
    ) -> AimResult {
        let Some(target) = target else {
            return self.safe_default();
        };
        let (Some(position), Some(velocity)) =
            (world.position(target.bearing), world.velocity(target.bearing))
        else {
            return self.safe_default();
        };
        if !origin.is_finite() || !position.is_finite() || !velocity.is_finite() {
            return self.safe_default();
        }

        let strength = self.profile.predictive_strength;
        let direct_angle = origin.angle_to(position);
        let future = position + velocity * LOOKAHEAD_FRAMES;
        let future_angle = origin.angle_to(future);

        // Blend on the circle so a target straddling +-PI doesn't flip the aim around
        let predictive_angle = direct_angle + shortest_angle_diff(direct_angle, future_angle) * strength;

        // Compensation always works from the full lookahead point
        let aim_angle = self
            .compensate_repulsor(world, origin, future)
            .unwrap_or(predictive_angle);

        let angle = aim_angle + self.sample_error();
        if !angle.is_finite() {
            return self.safe_default();
        }

        AimResult {
            angle,
            resolved_target: Some(target),
        }
    }

    /// Aim against a lateral force field centred on the reference axis.
    ///
    /// The field pushes a projectile away from the axis roughly in proportion to
    /// its offset and the flight distance, so the aim point is pulled back by
    /// `K * offset * distance`.
    fn compensate_repulsor<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        origin: Vec2,
        aim_point: Vec2,
    ) -> Option<f32> {
        let k = self.profile.repulsor_compensation;
        if k <= 0.0 {
            return None;
        }
        let axis_y = world.reference_axis_y()?;

        let distance = origin.distance(aim_point);
        let deflection = k * (aim_point.y - axis_y) * distance;
        let compensated = Vec2::new(aim_point.x, aim_point.y - deflection);
        if !compensated.is_finite() {
            return None;
        }

        let angle = origin.angle_to(compensated);
        angle.is_finite().then_some(angle)
    }

    fn sample_error(&mut self) -> f32 {
        match &self.error {
            Some(dist) => dist.sample(&mut self.rng),
            None => 0.0,
        }
    }
}
