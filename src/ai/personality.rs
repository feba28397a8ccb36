// Per-agent decision state machine
//
// evaluating -> reacting -> firing -> evaluating
//      \-> reloading -> evaluating
//
// Every guard failure is a local reset to `Evaluating`; nothing here is fatal.

use tracing::{debug, error, info, warn};

use super::aiming::AimingStrategy;
use super::obstacle::ObstacleStrategy;
use super::target::{Target, TargetSelection};
use super::targeting::TargetingStrategy;
use super::tracker::PlayerBehaviorTracker;
use crate::config::{resolve_profile, Profile, ReloadStrategy, ReloadingProfile};
use crate::geometry::{shortest_angle_diff, sign, wrap_angle};
use crate::world::{DuelWorld, Launcher, Side};

/// Angular error (1 degree) within which the launcher counts as on target
pub const AIM_THRESHOLD_RAD: f32 = std::f32::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalityState {
    Evaluating,
    Reacting,
    Firing,
    Reloading,
}

/// Whether a reload policy wants a reload right now
pub fn reload_needed(policy: &ReloadingProfile, ammo: u32, resource_available: bool) -> bool {
    match policy.strategy {
        ReloadStrategy::Empty => ammo == 0,
        ReloadStrategy::Threshold => ammo < policy.threshold && resource_available,
    }
}

/// One autonomous opponent: owns its state, timers, rotation speed and strategies
#[derive(Debug, Clone)]
pub struct Personality {
    side: Side,
    profile: Profile,

    state: PersonalityState,
    state_timer_ms: f32,

    // Held between ticks only while reacting/firing
    target: Option<Target>,
    held: TargetSelection,

    last_shot_time_ms: Option<f64>,
    committed_angle: f32,
    aim_speed: f32,

    counter_side: Option<Side>,
    shots_fired: u32,

    targeting: TargetingStrategy,
    aiming: AimingStrategy,
    obstacle: ObstacleStrategy,
}

impl Personality {
    /// Build a personality for `side`. A missing or invalid profile is replaced
    /// by the fallback profile; `seed` drives all of the agent's randomness.
    pub fn new(side: Side, profile: Option<Profile>, seed: u64) -> Self {
        let profile = resolve_profile(profile, side);

        let targeting = TargetingStrategy::new(side, &profile.targeting);
        let aiming = AimingStrategy::new(side, &profile.aiming, seed);
        let obstacle = ObstacleStrategy::new(side, &profile.aiming);

        info!(%side, profile = %profile.name, targeting = ?targeting.kind(), "personality ready");

        Self {
            side,
            profile,
            state: PersonalityState::Evaluating,
            state_timer_ms: 0.0,
            target: None,
            held: TargetSelection::empty(),
            last_shot_time_ms: None,
            committed_angle: side.forward_angle(),
            aim_speed: 0.0,
            counter_side: None,
            shots_fired: 0,
            targeting,
            aiming,
            obstacle,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn state(&self) -> PersonalityState {
        self.state
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }

    /// Current angular speed in rad/s
    pub fn aim_speed(&self) -> f32 {
        self.aim_speed
    }

    /// Angle the launcher was left at by the last reacting tick
    pub fn committed_angle(&self) -> f32 {
        self.committed_angle
    }

    /// Side opposite the human's observed bias, sampled when the profile can counter
    pub fn counter_side(&self) -> Option<Side> {
        self.counter_side
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    /// Drop any held plan, e.g. between rounds
    pub fn reset_round(&mut self) {
        self.reset_to_evaluating();
        self.state_timer_ms = 0.0;
    }

    /// Advance the state machine by one tick.
    ///
    /// # Arguments
    /// * `world` - Simulation collaborator; only the launcher and armory are written
    /// * `time_ms` - Absolute simulation time
    /// * `delta_ms` - Time since the previous tick
    /// * `tracker` - Human behaviour tracker, if one is running
    pub fn update<W: DuelWorld>(
        &mut self,
        world: &mut W,
        time_ms: f64,
        delta_ms: f32,
        tracker: Option<&PlayerBehaviorTracker>,
    ) {
        if !world.match_in_progress() {
            return;
        }

        if self.state_timer_ms > 0.0 {
            self.state_timer_ms -= delta_ms;
        }

        match self.state {
            PersonalityState::Evaluating => self.evaluate(world, tracker),
            PersonalityState::Reacting => self.react(world, delta_ms / 1000.0),
            PersonalityState::Firing => self.fire(world, time_ms),
            PersonalityState::Reloading => self.reload(world),
        }
    }

    fn should_reload<W: DuelWorld>(&self, world: &W) -> bool {
        reload_needed(
            &self.profile.reloading,
            world.ammo(self.side),
            world.is_resource_available(self.side),
        )
    }

    fn reset_to_evaluating(&mut self) {
        self.state = PersonalityState::Evaluating;
        self.target = None;
        self.held = TargetSelection::empty();
        self.aim_speed = 0.0;
    }

    fn target_is_stale<W: DuelWorld>(&self, world: &W) -> bool {
        match self.target {
            Some(target) => !target.is_live(world) || self.held.all_valid.is_empty(),
            None => true,
        }
    }

    fn observe_counter_side(&mut self, tracker: Option<&PlayerBehaviorTracker>) {
        if !self.profile.targeting.can_counter {
            return;
        }
        let counter = tracker.and_then(PlayerBehaviorTracker::counter_side);
        if counter != self.counter_side {
            debug!(side = %self.side, counter = ?counter, "human counter side changed");
            self.counter_side = counter;
        }
    }

    fn evaluate<W: DuelWorld>(&mut self, world: &mut W, tracker: Option<&PlayerBehaviorTracker>) {
        if self.should_reload(&*world) {
            self.state = PersonalityState::Reloading;
            self.aim_speed = 0.0;
            return;
        }

        self.observe_counter_side(tracker);

        let pivot = world.launcher(self.side).pivot();
        let Some(TargetSelection {
            best: Some(best),
            all_valid,
        }) = self.targeting.find_target(&*world, pivot)
        else {
            // Nothing to shoot (or a broken roster): stay put with clean references
            self.reset_to_evaluating();
            return;
        };

        if world.position(best.bearing).is_none() {
            error!(side = %self.side, "chosen target has no bearing position, staying in evaluating");
            self.reset_to_evaluating();
            return;
        }

        self.target = Some(best);
        self.held = TargetSelection {
            best: Some(best),
            all_valid,
        };
        self.state = PersonalityState::Reacting;
        self.state_timer_ms = self.profile.timing.reaction_delay;
    }

    fn react<W: DuelWorld>(&mut self, world: &mut W, dt: f32) {
        if self.target_is_stale(&*world) {
            warn!(side = %self.side, "target went stale while reacting, resetting");
            self.reset_to_evaluating();
            return;
        }

        // 1. Desired angle for this tick (may retarget through a bank shot)
        let origin = world.launcher(self.side).exit_point();
        let aim = self
            .aiming
            .calculate_aim_angle(&*world, origin, self.target, &self.held.all_valid);

        let held_bearing = self.target.map(|t| t.bearing);
        let resolved_bearing = aim.resolved_target.map(|t| t.bearing);
        if resolved_bearing != held_bearing {
            match resolved_bearing.and_then(|b| self.held.find_by_bearing(b)) {
                Some(target) => self.target = Some(target),
                None => {
                    error!(side = %self.side, "aim resolved to a target outside the valid set, resetting");
                    self.reset_to_evaluating();
                    return;
                }
            }
        }

        // 2. Signed shortest difference to the desired angle
        let launcher = world.launcher_mut(self.side);
        let current = launcher.angle();
        let diff = shortest_angle_diff(current, aim.angle);

        // 3. Accelerate toward it, capped, without overshooting
        let aiming = &self.profile.aiming;
        let cap = aiming.aim_rotation_speed_cap;
        self.aim_speed = (self.aim_speed + sign(diff) * aiming.aim_rotation_acceleration * dt)
            .clamp(-cap, cap);

        let mut step = self.aim_speed * dt;
        let aimed = if step.abs() >= diff.abs() {
            step = diff;
            self.aim_speed = 0.0;
            true
        } else if diff.abs() < AIM_THRESHOLD_RAD {
            self.aim_speed = 0.0;
            true
        } else {
            false
        };

        // 4. Rotate and remember where we ended up
        let new_angle = wrap_angle(current + step);
        launcher.set_angle(new_angle);
        self.committed_angle = new_angle;

        // 5. Fire only once the reaction delay is over and we're on target
        if self.state_timer_ms <= 0.0 && aimed {
            self.state = PersonalityState::Firing;
            self.state_timer_ms = self.profile.timing.fire_rate;
            self.aim_speed = 0.0;
        }
    }

    fn fire<W: DuelWorld>(&mut self, world: &mut W, time_ms: f64) {
        if self.target_is_stale(&*world) {
            warn!(side = %self.side, "target went stale while firing, resetting");
            self.reset_to_evaluating();
            return;
        }
        let Some(target) = self.target else {
            self.reset_to_evaluating();
            return;
        };

        let fire_rate = f64::from(self.profile.timing.fire_rate);
        let cooled_down = self
            .last_shot_time_ms
            .map_or(true, |last| time_ms - last > fire_rate);
        if !cooled_down {
            if self.state_timer_ms <= 0.0 {
                debug!(side = %self.side, "firing window closed before cooldown, resetting");
                self.reset_to_evaluating();
            }
            return;
        }

        // The target may have moved us off during the cooldown
        let drift = shortest_angle_diff(world.launcher(self.side).angle(), self.committed_angle);
        if drift.abs() > AIM_THRESHOLD_RAD {
            warn!(side = %self.side, drift, "aim drifted during firing cooldown, resetting");
            self.reset_to_evaluating();
            return;
        }

        let origin = world.launcher(self.side).exit_point();
        if !self.obstacle.is_path_clear(&*world, origin, &target) {
            debug!(side = %self.side, "path to target blocked, holding fire");
            self.reset_to_evaluating();
            return;
        }

        world.launcher_mut(self.side).set_angle(self.committed_angle);
        if world.fire_launcher(self.side) {
            self.shots_fired += 1;
        } else {
            debug!(side = %self.side, "launcher refused to fire");
        }
        self.last_shot_time_ms = Some(time_ms);

        // One shot per visit
        self.reset_to_evaluating();
    }

    fn reload<W: DuelWorld>(&mut self, world: &mut W) {
        if world.reload_launcher(self.side) {
            if !self.should_reload(&*world) {
                self.state = PersonalityState::Evaluating;
            }
        } else {
            warn!(side = %self.side, "reload failed, nothing in the trough");
            self.state = PersonalityState::Evaluating;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaState;
    use crate::config::{AimingProfile, TimingProfile};
    use crate::geometry::Vec2;
    use crate::world::Armory;

    const DT: f32 = 16.0;

    fn quick_profile() -> Profile {
        Profile {
            name: "test".to_string(),
            aiming: AimingProfile {
                error_margin: 0.0,
                ..AimingProfile::default()
            },
            timing: TimingProfile {
                reaction_delay: 100.0,
                fire_rate: 200.0,
            },
            ..Profile::fallback()
        }
    }

    struct Clock {
        now: f64,
    }

    impl Clock {
        fn new() -> Self {
            Self { now: 0.0 }
        }

        fn tick(&mut self, p: &mut Personality, arena: &mut ArenaState) {
            self.now += f64::from(DT);
            p.update(arena, self.now, DT, None);
        }
    }

    #[test]
    fn test_reload_policy() {
        let empty = ReloadingProfile {
            strategy: ReloadStrategy::Empty,
            threshold: 5,
        };
        let threshold = ReloadingProfile {
            strategy: ReloadStrategy::Threshold,
            threshold: 5,
        };
        for ammo in 0..10 {
            for available in [false, true] {
                assert_eq!(reload_needed(&empty, ammo, available), ammo == 0);
                assert_eq!(
                    reload_needed(&threshold, ammo, available),
                    ammo < 5 && available
                );
            }
        }
    }

    #[test]
    fn test_empty_magazine_reloads_from_trough() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.set_ammo(Side::Left, 0);
        arena.add_trough_ball(Side::Left);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();

        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Reloading);
        assert_eq!(p.aim_speed(), 0.0);

        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(arena.ammo(Side::Left), 1);
        assert!(!arena.is_resource_available(Side::Left));
    }

    #[test]
    fn test_failed_reload_returns_to_evaluating() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.set_ammo(Side::Left, 0);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();

        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Reloading);
        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(arena.ammo(Side::Left), 0);
    }

    #[test]
    fn test_no_targets_stays_evaluating() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();
        for _ in 0..5 {
            clock.tick(&mut p, &mut arena);
            assert_eq!(p.state(), PersonalityState::Evaluating);
            assert_eq!(p.target(), None);
        }
    }

    #[test]
    fn test_broken_roster_stays_evaluating() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.break_roster();
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();
        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Evaluating);
    }

    #[test]
    fn test_full_cycle_fires_once() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();

        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Reacting);
        assert_eq!(p.target(), Some(target));

        // Already on target; wait out the reaction delay
        let mut ticks = 0;
        while p.state() == PersonalityState::Reacting {
            clock.tick(&mut p, &mut arena);
            ticks += 1;
            assert!(ticks < 20);
        }
        assert_eq!(p.state(), PersonalityState::Firing);

        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(p.shots_fired(), 1);
        assert_eq!(arena.ammo(Side::Left), 19);
        assert_eq!(arena.shots_fired(Side::Left), 1);
    }

    #[test]
    fn test_rotation_respects_speed_cap() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        // Straight below the pivot: a quarter turn away
        arena.add_puck(Vec2::new(40.0, 600.0), Vec2::ZERO);
        let profile = quick_profile();
        let cap = profile.aiming.aim_rotation_speed_cap;
        let mut p = Personality::new(Side::Left, Some(profile), 1);
        let mut clock = Clock::new();

        let mut max_speed: f32 = 0.0;
        for _ in 0..300 {
            clock.tick(&mut p, &mut arena);
            assert!(p.aim_speed().abs() <= cap + 1e-6);
            max_speed = max_speed.max(p.aim_speed().abs());
        }
        assert!(max_speed > 0.0);
        assert!(arena.shots_fired(Side::Left) > 0);
    }

    #[test]
    fn test_stale_bearing_resets_reacting() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(40.0, 600.0), Vec2::ZERO);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();

        clock.tick(&mut p, &mut arena);
        clock.tick(&mut p, &mut arena);
        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Reacting);
        assert!(p.aim_speed() != 0.0);

        arena.destroy(target.bearing);
        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(p.target(), None);
        assert_eq!(p.aim_speed(), 0.0);
    }

    #[test]
    fn test_captured_target_resets_firing() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let target = arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();
        while p.state() != PersonalityState::Firing {
            clock.tick(&mut p, &mut arena);
        }

        arena.capture(target.visual);
        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(arena.shots_fired(Side::Left), 0);
    }

    #[test]
    fn test_never_fires_through_a_wall() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.add_wall(Vec2::new(300.0, 0.0), Vec2::new(300.0, 600.0));
        let mut profile = quick_profile();
        profile.aiming.check_line_of_sight = true;
        let mut p = Personality::new(Side::Left, Some(profile), 1);
        let mut clock = Clock::new();

        for _ in 0..500 {
            clock.tick(&mut p, &mut arena);
        }
        assert_eq!(arena.shots_fired(Side::Left), 0);
        assert_eq!(arena.ammo(Side::Left), 20);
    }

    #[test]
    fn test_drift_during_cooldown_aborts_shot() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();

        // First shot goes out immediately
        while arena.shots_fired(Side::Left) == 0 {
            clock.tick(&mut p, &mut arena);
        }
        // Second cycle reaches firing while the cooldown is still running
        while p.state() != PersonalityState::Firing {
            clock.tick(&mut p, &mut arena);
        }
        arena.launcher_state_mut(Side::Left).angle = 0.5;
        while p.state() == PersonalityState::Firing {
            clock.tick(&mut p, &mut arena);
        }
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(arena.shots_fired(Side::Left), 1);
    }

    #[test]
    fn test_cooldown_must_strictly_pass() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();

        while arena.shots_fired(Side::Left) == 0 {
            clock.tick(&mut p, &mut arena);
        }
        let first_shot = clock.now;
        while p.state() != PersonalityState::Firing {
            clock.tick(&mut p, &mut arena);
        }
        assert!(clock.now < first_shot + 200.0);

        // Exactly one fire interval later is still too early
        p.update(&mut arena, first_shot + 200.0, 0.0, None);
        assert_eq!(p.state(), PersonalityState::Firing);
        assert_eq!(arena.shots_fired(Side::Left), 1);

        p.update(&mut arena, first_shot + 200.5, 0.0, None);
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(arena.shots_fired(Side::Left), 2);
    }

    #[test]
    fn test_idle_when_match_not_running() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_puck(Vec2::new(600.0, 300.0), Vec2::ZERO);
        arena.set_playing(false);
        let mut p = Personality::new(Side::Left, Some(quick_profile()), 1);
        let mut clock = Clock::new();
        for _ in 0..10 {
            clock.tick(&mut p, &mut arena);
        }
        assert_eq!(p.state(), PersonalityState::Evaluating);
        assert_eq!(p.target(), None);
    }

    #[test]
    fn test_missing_profile_uses_fallback() {
        let p = Personality::new(Side::Right, None, 1);
        assert_eq!(p.profile(), &Profile::fallback());

        let mut bad = quick_profile();
        bad.aiming.bounce_angle_search_step_deg = -1.0;
        let p = Personality::new(Side::Right, Some(bad), 1);
        assert_eq!(p.profile().name, "FALLBACK_ROOKIE");
    }

    #[test]
    fn test_counter_side_sampled_when_enabled() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        let mut tracker = PlayerBehaviorTracker::new();
        tracker.init(Side::Left);
        for _ in 0..15 {
            tracker.record_human_shot();
        }

        let mut profile = quick_profile();
        profile.targeting.can_counter = true;
        let mut p = Personality::new(Side::Right, Some(profile), 1);
        p.update(&mut arena, 16.0, DT, Some(&tracker));
        assert_eq!(p.counter_side(), Some(Side::Right));

        let mut plain = Personality::new(Side::Right, Some(quick_profile()), 1);
        plain.update(&mut arena, 16.0, DT, Some(&tracker));
        assert_eq!(plain.counter_side(), None);
    }

    #[test]
    fn test_bank_shot_retargets_within_valid_set() {
        let mut arena = ArenaState::empty(1200.0, 600.0);
        arena.add_wall(Vec2::new(-100.0, 0.0), Vec2::new(1300.0, 0.0));
        let ahead = arena.add_puck(Vec2::new(340.0, 300.0), Vec2::ZERO);
        let banked = arena.add_puck(Vec2::new(500.0, 280.0), Vec2::ZERO);

        let mut profile = quick_profile();
        profile.aiming.can_bounce_shot = true;
        profile.aiming.bounce_shot_chance = 1.0;
        profile.aiming.bounce_angle_search_range_deg = 140.0;
        profile.aiming.bounce_angle_search_step_deg = 0.5;
        let mut p = Personality::new(Side::Left, Some(profile), 1);
        let mut clock = Clock::new();

        clock.tick(&mut p, &mut arena);
        assert_eq!(p.target(), Some(ahead));
        clock.tick(&mut p, &mut arena);
        assert_eq!(p.state(), PersonalityState::Reacting);
        // The cushion shot reaches the far puck first, so the plan switches to it
        assert_eq!(p.target(), Some(banked));
        // The launcher starts turning upward toward the cushion
        assert!(arena.launcher(Side::Left).angle() < 0.0);
    }
}
