// Fixed-step kinematics for the sandbox arena

use tracing::debug;

use super::state::{ArenaState, BALL_RADIUS, PUCK_RADIUS};
use crate::geometry::{closest_point_on_segment, Vec2};
use crate::world::{Category, Side, WorldQuery, GOAL_LEFT_TAG};

const BALL_RESTITUTION: f32 = 0.9;
const PUCK_RESTITUTION: f32 = 0.7;
const BALL_MASS: f32 = 1.0;
const PUCK_MASS: f32 = 4.0;

// Per-frame velocity retention
const BALL_DAMPING: f32 = 0.998;
const PUCK_FRICTION: f32 = 0.985;

// Projectiles slower than this roll into the nearest trough
const BALL_REST_SPEED: f32 = 0.4;

// Largest fraction of a frame moved in one sub-step
const MAX_SUBSTEP: f32 = 0.5;

/// What happened during one step
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsEvents {
    pub wall_collision: bool,
    pub puck_hit: bool,
    /// Side that scored, if a puck was captured
    pub goal_scored: Option<Side>,
    /// Projectiles that ended up in a trough
    pub balls_collected: u32,
    /// Every puck was captured and the round restarted
    pub round_over: bool,
}

impl PhysicsEvents {
    pub fn any(&self) -> bool {
        self.wall_collision
            || self.puck_hit
            || self.goal_scored.is_some()
            || self.balls_collected > 0
            || self.round_over
    }
}

struct Sensor {
    defended_by: Side,
    index: usize,
}

/// Advance the arena by `frames` simulation frames (1.0 at 60 Hz)
pub fn step(state: &mut ArenaState, frames: f32) -> PhysicsEvents {
    let mut events = PhysicsEvents::default();
    if !state.match_in_progress() || frames.is_nan() || frames <= 0.0 {
        return events;
    }

    let edges: Vec<(Vec2, Vec2)> = state.wall_segments().into_iter().map(|w| (w.a, w.b)).collect();
    let sensors: Vec<Sensor> = state
        .bodies
        .iter()
        .enumerate()
        .filter(|(_, b)| b.active && b.category.contains(Category::SENSOR))
        .map(|(index, b)| Sensor {
            defended_by: if b.tag == GOAL_LEFT_TAG { Side::Left } else { Side::Right },
            index,
        })
        .collect();

    let substeps = (frames / MAX_SUBSTEP).ceil().max(1.0) as usize;
    let dt = frames / substeps as f32;
    for _ in 0..substeps {
        move_balls(state, dt, &edges, &mut events);
        move_pucks(state, dt, &edges, &mut events);
        resolve_ball_puck_contacts(state, &mut events);
    }

    collect_balls(state, &sensors, &mut events);
    capture_pucks(state, &sensors, &mut events);

    let roster = state.roster();
    if !roster.is_empty() && roster.iter().all(|t| state.is_captured(t.visual)) {
        debug!(round = state.rounds_played + 1, "all pucks captured, respawning");
        state.respawn_pucks();
        events.round_over = true;
    }

    events
}

fn move_balls(state: &mut ArenaState, dt: f32, edges: &[(Vec2, Vec2)], events: &mut PhysicsEvents) {
    let axis = state.reference_axis_y();
    let strength = state.repulsor_strength;

    for ball in state
        .bodies
        .iter_mut()
        .filter(|b| b.active && b.category == Category::BALL)
    {
        if let Some(axis_y) = axis {
            ball.velocity.y += strength * (ball.position.y - axis_y) * dt;
        }
        ball.position = ball.position + ball.velocity * dt;
        ball.velocity = ball.velocity * BALL_DAMPING.powf(dt);

        if bounce_off_edges(&mut ball.position, &mut ball.velocity, BALL_RADIUS, BALL_RESTITUTION, edges) {
            events.wall_collision = true;
        }
    }
}

fn move_pucks(state: &mut ArenaState, dt: f32, edges: &[(Vec2, Vec2)], events: &mut PhysicsEvents) {
    for target in state.roster().to_vec() {
        if state.is_captured(target.visual) {
            continue;
        }
        let Some(bearing) = state.body_mut(target.bearing) else {
            continue;
        };
        if !bearing.active {
            continue;
        }

        let mut position = bearing.position + bearing.velocity * dt;
        let mut velocity = bearing.velocity * PUCK_FRICTION.powf(dt);
        if bounce_off_edges(&mut position, &mut velocity, PUCK_RADIUS, PUCK_RESTITUTION, edges) {
            events.wall_collision = true;
        }
        bearing.position = position;
        bearing.velocity = velocity;

        // The visual rides on its bearing
        if let Some(visual) = state.body_mut(target.visual) {
            visual.position = position;
            visual.velocity = velocity;
        }
    }
}

/// Push a disc out of every edge it overlaps and reflect its velocity
fn bounce_off_edges(
    position: &mut Vec2,
    velocity: &mut Vec2,
    radius: f32,
    restitution: f32,
    edges: &[(Vec2, Vec2)],
) -> bool {
    let mut hit = false;
    for (a, b) in edges {
        let closest = closest_point_on_segment(*position, *a, *b);
        let offset = *position - closest;
        let dist_sq = offset.length_squared();
        if dist_sq >= radius * radius {
            continue;
        }
        let Some(normal) = offset.normalized().or_else(|| (*b - *a).perp().normalized()) else {
            continue;
        };

        *position = closest + normal * radius;
        let into = velocity.dot(normal);
        if into < 0.0 {
            *velocity = *velocity - normal * ((1.0 + restitution) * into);
            hit = true;
        }
    }
    hit
}

fn resolve_ball_puck_contacts(state: &mut ArenaState, events: &mut PhysicsEvents) {
    let reach = BALL_RADIUS + PUCK_RADIUS;
    let pucks: Vec<_> = state
        .roster()
        .iter()
        .copied()
        .filter(|t| !state.is_captured(t.visual) && state.is_active(t.bearing))
        .collect();
    let balls: Vec<usize> = state
        .bodies
        .iter()
        .enumerate()
        .filter(|(_, b)| b.active && b.category == Category::BALL)
        .map(|(i, _)| i)
        .collect();

    for target in pucks {
        for &ball_index in &balls {
            let (Some(puck_pos), Some(puck_vel)) =
                (state.position(target.bearing), state.velocity(target.bearing))
            else {
                continue;
            };
            let ball = &state.bodies[ball_index];
            let offset = puck_pos - ball.position;
            if offset.length_squared() >= reach * reach {
                continue;
            }
            let Some(normal) = offset.normalized() else {
                continue;
            };

            let closing = (ball.velocity - puck_vel).dot(normal);
            let mut ball_vel = ball.velocity;
            let mut new_puck_vel = puck_vel;
            if closing > 0.0 {
                let impulse = (1.0 + BALL_RESTITUTION) * closing / (1.0 / BALL_MASS + 1.0 / PUCK_MASS);
                ball_vel = ball_vel - normal * (impulse / BALL_MASS);
                new_puck_vel = new_puck_vel + normal * (impulse / PUCK_MASS);
                events.puck_hit = true;
            }

            let ball = &mut state.bodies[ball_index];
            ball.position = puck_pos - normal * reach;
            ball.velocity = ball_vel;
            for id in [target.visual, target.bearing] {
                state.set_velocity(id, new_puck_vel);
            }
        }
    }
}

/// Projectiles in a goal, or at rest on the field, refill a side's trough
fn collect_balls(state: &mut ArenaState, sensors: &[Sensor], events: &mut PhysicsEvents) {
    let half = state.width / 2.0;
    let mut collected = Vec::new();

    for (i, ball) in state.bodies.iter().enumerate() {
        if !ball.active || ball.category != Category::BALL {
            continue;
        }
        let in_goal = sensors
            .iter()
            .find(|s| state.bodies[s.index].contains(ball.position))
            .map(|s| s.defended_by);
        let at_rest = ball.velocity.length() < BALL_REST_SPEED;

        let trough = match (in_goal, at_rest) {
            (Some(side), _) => Some(side),
            (None, true) if ball.position.x < half => Some(Side::Left),
            (None, true) => Some(Side::Right),
            (None, false) => None,
        };
        if let Some(side) = trough {
            collected.push((i, side));
        }
    }

    for (i, side) in collected {
        state.bodies[i].active = false;
        state.stats_mut(side).trough += 1;
        events.balls_collected += 1;
    }
}

fn capture_pucks(state: &mut ArenaState, sensors: &[Sensor], events: &mut PhysicsEvents) {
    for target in state.roster().to_vec() {
        if state.is_captured(target.visual) {
            continue;
        }
        let Some(position) = state.position(target.bearing) else {
            continue;
        };
        let Some(defender) = sensors
            .iter()
            .find(|s| state.bodies[s.index].contains(position))
            .map(|s| s.defended_by)
        else {
            continue;
        };

        let scorer = defender.opposite();
        state.capture(target.visual);
        for id in [target.visual, target.bearing] {
            state.set_velocity(id, Vec2::ZERO);
        }
        state.stats_mut(scorer).score += 1;
        events.goal_scored = Some(scorer);
        debug!(side = %scorer, score = state.score(scorer), "puck captured");
    }
}
