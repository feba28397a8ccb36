// Sandbox duel arena
//
// A small kinematic world that implements the collaborator traits so the AI
// can be driven headless and tested without a rigid-body engine.

pub mod physics;
pub mod state;

pub use physics::{step, PhysicsEvents};
pub use state::{
    ArenaConfig, ArenaState, Body, LauncherState, Shape, SideStats, ARENA_HEIGHT, ARENA_WIDTH,
    BALL_RADIUS, BARREL_LENGTH, BEARING_RADIUS, PUCK_RADIUS, STARTING_AMMO,
};
