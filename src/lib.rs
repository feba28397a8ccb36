// Decision engine for launcher duel opponents
//
// `ai` holds the per-agent personality and its strategies, `world` the traits
// it drives a simulation through, and `arena` a sandbox implementation of them.

pub mod ai;
pub mod arena;
pub mod config;
pub mod geometry;
pub mod logging;
pub mod world;
