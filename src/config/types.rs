// Opponent profile types
// Every field has a default so partial profile files still load

use serde::{Deserialize, Serialize};

use super::error::ProfileError;

/// Upper bound on bank-shot candidates, i.e. `searchRange / searchStep`
pub const MAX_BOUNCE_SWEEP_ANGLES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub aiming: AimingProfile,
    pub timing: TimingProfile,
    pub reloading: ReloadingProfile,
    pub targeting: TargetingProfile,
}

impl Default for Profile {
    fn default() -> Self {
        Self::fallback()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AimingProfile {
    // Symmetric uniform aim error in radians
    pub error_margin: f32,

    // 0.0 = aim at current position, 1.0 = aim at extrapolated position
    pub predictive_strength: f32,

    // Verify a clear lane before every shot
    pub check_line_of_sight: bool,

    // Gain against the lateral repulsor field (0 disables)
    pub repulsor_compensation: f32,

    // Rotation speed cap (rad/s) and acceleration (rad/s^2)
    pub aim_rotation_speed_cap: f32,
    pub aim_rotation_acceleration: f32,

    pub can_bounce_shot: bool,
    pub bounce_shot_chance: f32,

    // Only single-cushion shots are searched
    pub max_bounces: u32,
    pub bounce_angle_search_range_deg: f32,
    pub bounce_angle_search_step_deg: f32,

    // Extra slack around a target's footprint, in world units
    pub bounce_target_tolerance: f32,
}

impl Default for AimingProfile {
    fn default() -> Self {
        Self {
            error_margin: 0.1,
            predictive_strength: 0.0,
            check_line_of_sight: false,
            repulsor_compensation: 0.0,
            aim_rotation_speed_cap: 1.5,
            aim_rotation_acceleration: 3.0,
            can_bounce_shot: false,
            bounce_shot_chance: 0.0,
            max_bounces: 1,
            bounce_angle_search_range_deg: 60.0,
            bounce_angle_search_step_deg: 5.0,
            bounce_target_tolerance: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingProfile {
    // Milliseconds between picking a target and being allowed to fire
    pub reaction_delay: f32,

    // Minimum milliseconds between shots
    pub fire_rate: f32,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            reaction_delay: 750.0,
            fire_rate: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum ReloadStrategy {
    /// Reload only when the magazine is empty
    Empty,
    /// Top up below a threshold whenever the trough holds a ball
    Threshold,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReloadingProfile {
    pub strategy: ReloadStrategy,
    pub threshold: u32,
}

impl Default for ReloadingProfile {
    fn default() -> Self {
        Self {
            strategy: ReloadStrategy::Empty,
            threshold: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum TargetingKind {
    Closest,
    ClosestToGoal,
}

// Unknown tags fall back to the default variant instead of failing the load
impl From<String> for ReloadStrategy {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "threshold" => ReloadStrategy::Threshold,
            _ => ReloadStrategy::Empty,
        }
    }
}

impl From<String> for TargetingKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "closestToGoal" => TargetingKind::ClosestToGoal,
            _ => TargetingKind::Closest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetingProfile {
    pub strategy: TargetingKind,

    // Sample the human's counter side while evaluating
    pub can_counter: bool,
}

impl Default for TargetingProfile {
    fn default() -> Self {
        Self {
            strategy: TargetingKind::Closest,
            can_counter: false,
        }
    }
}

impl Profile {
    /// Safe profile substituted whenever a supplied one is missing or invalid
    pub fn fallback() -> Self {
        Self {
            name: "FALLBACK_ROOKIE".to_string(),
            aiming: AimingProfile::default(),
            timing: TimingProfile::default(),
            reloading: ReloadingProfile::default(),
            targeting: TargetingProfile::default(),
        }
    }

    /// Slow, sloppy, shoots straight at whatever is nearest
    pub fn rookie() -> Self {
        Self {
            name: "rookie".to_string(),
            aiming: AimingProfile {
                error_margin: 0.12,
                aim_rotation_speed_cap: 1.2,
                aim_rotation_acceleration: 2.5,
                ..AimingProfile::default()
            },
            timing: TimingProfile {
                reaction_delay: 900.0,
                fire_rate: 1200.0,
            },
            ..Self::fallback()
        }
    }

    /// Leads moving targets and keeps the magazine topped up
    pub fn veteran() -> Self {
        Self {
            name: "veteran".to_string(),
            aiming: AimingProfile {
                error_margin: 0.05,
                predictive_strength: 0.6,
                check_line_of_sight: true,
                repulsor_compensation: 0.00002,
                aim_rotation_speed_cap: 2.5,
                aim_rotation_acceleration: 6.0,
                ..AimingProfile::default()
            },
            timing: TimingProfile {
                reaction_delay: 450.0,
                fire_rate: 700.0,
            },
            reloading: ReloadingProfile {
                strategy: ReloadStrategy::Threshold,
                threshold: 5,
            },
            targeting: TargetingProfile {
                strategy: TargetingKind::ClosestToGoal,
                can_counter: true,
            },
        }
    }

    /// Near-perfect direct aim, fast hands
    pub fn sharpshooter() -> Self {
        Self {
            name: "sharpshooter".to_string(),
            aiming: AimingProfile {
                error_margin: 0.01,
                predictive_strength: 1.0,
                check_line_of_sight: true,
                aim_rotation_speed_cap: 4.0,
                aim_rotation_acceleration: 12.0,
                ..AimingProfile::default()
            },
            timing: TimingProfile {
                reaction_delay: 200.0,
                fire_rate: 500.0,
            },
            reloading: ReloadingProfile {
                strategy: ReloadStrategy::Threshold,
                threshold: 8,
            },
            targeting: TargetingProfile {
                strategy: TargetingKind::ClosestToGoal,
                can_counter: true,
            },
        }
    }

    /// Favours bank shots off the side cushions
    pub fn trickster() -> Self {
        Self {
            name: "trickster".to_string(),
            aiming: AimingProfile {
                error_margin: 0.03,
                predictive_strength: 0.3,
                check_line_of_sight: false,
                can_bounce_shot: true,
                bounce_shot_chance: 0.6,
                bounce_angle_search_range_deg: 90.0,
                bounce_angle_search_step_deg: 2.0,
                bounce_target_tolerance: 12.0,
                aim_rotation_speed_cap: 2.0,
                aim_rotation_acceleration: 5.0,
                ..AimingProfile::default()
            },
            timing: TimingProfile {
                reaction_delay: 500.0,
                fire_rate: 800.0,
            },
            ..Self::fallback()
        }
    }

    /// Names accepted by `preset`
    pub fn preset_names() -> &'static [&'static str] {
        &["rookie", "veteran", "sharpshooter", "trickster"]
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rookie" => Some(Self::rookie()),
            "veteran" => Some(Self::veteran()),
            "sharpshooter" => Some(Self::sharpshooter()),
            "trickster" => Some(Self::trickster()),
            _ => None,
        }
    }

    /// Reject values the controller cannot act on safely
    pub fn validate(&self) -> Result<(), ProfileError> {
        let a = &self.aiming;
        let t = &self.timing;

        let finite = [
            ("aiming.errorMargin", a.error_margin),
            ("aiming.predictiveStrength", a.predictive_strength),
            ("aiming.repulsorCompensation", a.repulsor_compensation),
            ("aiming.aimRotationSpeedCap", a.aim_rotation_speed_cap),
            ("aiming.aimRotationAcceleration", a.aim_rotation_acceleration),
            ("aiming.bounceShotChance", a.bounce_shot_chance),
            ("aiming.bounceAngleSearchRangeDeg", a.bounce_angle_search_range_deg),
            ("aiming.bounceAngleSearchStepDeg", a.bounce_angle_search_step_deg),
            ("aiming.bounceTargetTolerance", a.bounce_target_tolerance),
            ("timing.reactionDelay", t.reaction_delay),
            ("timing.fireRate", t.fire_rate),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ProfileError::invalid(field, "must be a finite number"));
            }
        }

        let non_negative = [
            ("aiming.errorMargin", a.error_margin),
            ("aiming.aimRotationAcceleration", a.aim_rotation_acceleration),
            ("aiming.bounceAngleSearchRangeDeg", a.bounce_angle_search_range_deg),
            ("aiming.bounceTargetTolerance", a.bounce_target_tolerance),
            ("timing.reactionDelay", t.reaction_delay),
            ("timing.fireRate", t.fire_rate),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ProfileError::invalid(field, "must not be negative"));
            }
        }

        for (field, value) in [
            ("aiming.predictiveStrength", a.predictive_strength),
            ("aiming.bounceShotChance", a.bounce_shot_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::invalid(field, "must be within 0..=1"));
            }
        }

        if a.aim_rotation_speed_cap <= 0.0 {
            return Err(ProfileError::invalid(
                "aiming.aimRotationSpeedCap",
                "must be positive",
            ));
        }
        if a.bounce_angle_search_step_deg <= 0.0 {
            return Err(ProfileError::invalid(
                "aiming.bounceAngleSearchStepDeg",
                "must be positive",
            ));
        }
        if a.bounce_angle_search_range_deg / a.bounce_angle_search_step_deg
            > MAX_BOUNCE_SWEEP_ANGLES as f32
        {
            return Err(ProfileError::invalid(
                "aiming.bounceAngleSearchStepDeg",
                "too fine for the search range",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_matches_documented_values() {
        let p = Profile::fallback();
        assert_eq!(p.name, "FALLBACK_ROOKIE");
        assert_eq!(p.aiming.error_margin, 0.1);
        assert_eq!(p.aiming.predictive_strength, 0.0);
        assert!(!p.aiming.check_line_of_sight);
        assert_eq!(p.aiming.aim_rotation_speed_cap, 1.5);
        assert_eq!(p.aiming.aim_rotation_acceleration, 3.0);
        assert!(!p.aiming.can_bounce_shot);
        assert_eq!(p.timing.reaction_delay, 750.0);
        assert_eq!(p.timing.fire_rate, 1000.0);
        assert_eq!(p.reloading.strategy, ReloadStrategy::Empty);
        assert_eq!(p.targeting.strategy, TargetingKind::Closest);
    }

    #[test]
    fn test_presets_are_valid() {
        for name in Profile::preset_names() {
            let profile = Profile::preset(name).unwrap();
            assert!(profile.validate().is_ok(), "preset {} failed validation", name);
        }
        assert!(Profile::preset("grandmaster").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut p = Profile::fallback();
        p.aiming.predictive_strength = 1.5;
        assert!(p.validate().is_err());

        let mut p = Profile::fallback();
        p.aiming.bounce_angle_search_step_deg = 0.0;
        assert!(p.validate().is_err());

        let mut p = Profile::fallback();
        p.aiming.error_margin = f32::NAN;
        assert!(p.validate().is_err());

        let mut p = Profile::fallback();
        p.timing.fire_rate = -1.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_caps_bank_shot_sweep() {
        let mut p = Profile::fallback();
        p.aiming.bounce_angle_search_range_deg = 60.0;
        p.aiming.bounce_angle_search_step_deg = 0.01;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::Invalid {
                field: "aiming.bounceAngleSearchStepDeg",
                ..
            })
        ));

        p.aiming.bounce_angle_search_step_deg = 60.0 / MAX_BOUNCE_SWEEP_ANGLES as f32;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_unknown_strategy_tags_use_defaults() {
        let json = r#"{
            "reloading": { "strategy": "whenever", "threshold": 3 },
            "targeting": { "strategy": "farthest" }
        }"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(p.reloading.strategy, ReloadStrategy::Empty);
        assert_eq!(p.reloading.threshold, 3);
        assert_eq!(p.targeting.strategy, TargetingKind::Closest);
    }

    #[test]
    fn test_camel_case_field_names() {
        let json = r#"{
            "name": "custom",
            "aiming": { "errorMargin": 0.0, "canBounceShot": true, "bounceShotChance": 0.5 },
            "timing": { "reactionDelay": 100 },
            "targeting": { "strategy": "closestToGoal", "canCounter": true }
        }"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(p.name, "custom");
        assert_eq!(p.aiming.error_margin, 0.0);
        assert!(p.aiming.can_bounce_shot);
        assert_eq!(p.timing.reaction_delay, 100.0);
        assert_eq!(p.timing.fire_rate, 1000.0);
        assert_eq!(p.targeting.strategy, TargetingKind::ClosestToGoal);
        assert!(p.targeting.can_counter);
    }
}
