// AI module for launcher opponents
//
// A `Personality` runs the per-agent state machine and delegates to three
// strategies: targeting (which puck), aiming (which angle, possibly off a
// cushion) and obstacle checks (is the lane clear). The tracker watches a
// human player's shooting side.

mod aiming;
mod bounce;
mod controller;
mod obstacle;
mod personality;
mod target;
mod targeting;
mod tracker;

pub use aiming::{AimResult, AimingStrategy, LOOKAHEAD_FRAMES};
pub use bounce::{find_bounce_shot, sweep_angles, BounceSearch, BounceSolution};
pub use controller::OpponentController;
pub use obstacle::{ObstacleStrategy, DEFAULT_OBSTACLES};
pub use personality::{reload_needed, Personality, PersonalityState, AIM_THRESHOLD_RAD};
pub use target::{Target, TargetSelection};
pub use targeting::TargetingStrategy;
pub use tracker::{PlayerBehaviorTracker, BIAS_THRESHOLD, MEMORY_LIMIT};
