// Sandbox world the opponents are exercised against
//
// Walls, goal sensors, wedges, launchers and pucks, plus the ammo and trough
// bookkeeping behind the `Armory` trait.

use crate::ai::Target;
use crate::geometry::{
    polygon_edges, point_in_polygon, rect_vertices, segment_circle_entry, segment_intersection,
    segment_polygon_entry, Vec2,
};
use crate::world::{
    Armory, BodyId, Category, DuelWorld, Extents, Launcher, RayHit, Side, WallSegment, WorldQuery,
};

// Virtual field the sandbox runs in; velocities are in units per frame (60 Hz)
pub const ARENA_WIDTH: f32 = 1200.0;
pub const ARENA_HEIGHT: f32 = 600.0;

pub const PUCK_RADIUS: f32 = 30.0;
pub const BEARING_RADIUS: f32 = 10.0;
pub const BALL_RADIUS: f32 = 8.0;
pub const BARREL_LENGTH: f32 = 40.0;
pub const STARTING_AMMO: u32 = 20;

/// Tunables for the standard arena
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Top and bottom walls are split into this many segments
    pub wall_segments: usize,
    /// Distance from each corner to the goal mouth, as a share of the height
    pub throat_inset_ratio: f32,
    pub goal_depth: f32,
    /// Horizontal leg of each corner wedge, as a share of the width
    pub wedge_ratio: f32,
    pub starting_ammo: u32,
    /// Projectile muzzle speed in units per frame
    pub ball_speed: f32,
    /// Lateral push away from the centre line per frame, per unit of offset
    pub repulsor_strength: f32,
    pub puck_spawns: Vec<Vec2>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            wall_segments: 3,
            throat_inset_ratio: 0.2,
            goal_depth: 60.0,
            wedge_ratio: 0.15,
            starting_ammo: STARTING_AMMO,
            ball_speed: 12.0,
            repulsor_strength: 0.0,
            puck_spawns: vec![
                Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 3.0),
                Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT * 2.0 / 3.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Segment { a: Vec2, b: Vec2 },
    /// World-space vertices; the body's position is only used as a reference point
    Polygon { vertices: Vec<Vec2> },
}

#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub tag: String,
    pub category: Category,
    pub shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_static: bool,
    pub active: bool,
    pub captured: bool,
    /// Side that fired this projectile
    pub owner: Option<Side>,
}

impl Body {
    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Circle { radius } => Some(radius),
            _ => None,
        }
    }

    /// Where `from -> to` first enters this body, as a fraction of the segment
    fn ray_entry(&self, from: Vec2, to: Vec2) -> Option<f32> {
        match &self.shape {
            Shape::Circle { radius } => segment_circle_entry(from, to, self.position, *radius),
            Shape::Segment { a, b } => {
                let hit = segment_intersection(from, to, *a, *b)?;
                let length = from.distance(to);
                (length > f32::EPSILON).then(|| from.distance(hit) / length)
            }
            Shape::Polygon { vertices } => segment_polygon_entry(from, to, vertices),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match &self.shape {
            Shape::Circle { radius } => self.position.distance_squared(point) <= radius * radius,
            Shape::Segment { .. } => false,
            Shape::Polygon { vertices } => point_in_polygon(point, vertices),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LauncherState {
    pub side: Side,
    pub pivot: Vec2,
    pub angle: f32,
    pub barrel_length: f32,
}

impl LauncherState {
    pub fn new(side: Side, pivot: Vec2) -> Self {
        Self {
            side,
            pivot,
            angle: side.forward_angle(),
            barrel_length: BARREL_LENGTH,
        }
    }
}

impl Launcher for LauncherState {
    fn angle(&self) -> f32 {
        self.angle
    }

    fn set_angle(&mut self, radians: f32) {
        self.angle = radians;
    }

    fn pivot(&self) -> Vec2 {
        self.pivot
    }

    fn exit_point(&self) -> Vec2 {
        self.pivot + Vec2::from_angle(self.angle) * self.barrel_length
    }
}

/// Per-side bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideStats {
    pub ammo: u32,
    /// Projectiles waiting in this side's goal, ready to reload
    pub trough: u32,
    pub shots_fired: u32,
    pub reloads: u32,
    pub score: u32,
}

/// In-memory duel arena implementing the world interfaces the AI consumes
#[derive(Debug, Clone)]
pub struct ArenaState {
    pub width: f32,
    pub height: f32,
    pub(crate) bodies: Vec<Body>,
    roster: Vec<Target>,
    puck_spawns: Vec<Vec2>,
    roster_broken: bool,
    reference_axis: Option<f32>,
    pub(crate) repulsor_strength: f32,
    pub(crate) ball_speed: f32,
    playing: bool,
    launchers: [LauncherState; 2],
    pub(crate) sides: [SideStats; 2],
    pub rounds_played: u32,
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

impl ArenaState {
    /// A bare field: launchers on each end line, no walls, no pucks
    pub fn empty(width: f32, height: f32) -> Self {
        let config = ArenaConfig::default();
        Self {
            width,
            height,
            bodies: Vec::new(),
            roster: Vec::new(),
            puck_spawns: Vec::new(),
            roster_broken: false,
            reference_axis: None,
            repulsor_strength: 0.0,
            ball_speed: config.ball_speed,
            playing: true,
            launchers: [
                LauncherState::new(Side::Left, Vec2::new(0.0, height / 2.0)),
                LauncherState::new(Side::Right, Vec2::new(width, height / 2.0)),
            ],
            sides: [
                SideStats {
                    ammo: config.starting_ammo,
                    ..SideStats::default()
                },
                SideStats {
                    ammo: config.starting_ammo,
                    ..SideStats::default()
                },
            ],
            rounds_played: 0,
        }
    }

    /// The full duel arena: segmented walls, goal mouths with recesses and
    /// sensors, corner wedges and two pucks
    pub fn standard(config: &ArenaConfig) -> Self {
        let (w, h) = (config.width, config.height);
        let mut arena = Self::empty(w, h);
        arena.ball_speed = config.ball_speed;
        arena.repulsor_strength = config.repulsor_strength;
        if config.repulsor_strength > 0.0 {
            arena.reference_axis = Some(h / 2.0);
        }
        for side in [Side::Left, Side::Right] {
            arena.set_ammo(side, config.starting_ammo);
        }

        let segments = config.wall_segments.max(1);
        let seg_w = w / segments as f32;
        for i in 0..segments {
            let x0 = seg_w * i as f32;
            let x1 = x0 + seg_w;
            arena.add_tagged_wall("arena_wall_top", Vec2::new(x0, 0.0), Vec2::new(x1, 0.0));
            arena.add_tagged_wall("arena_wall_bot", Vec2::new(x0, h), Vec2::new(x1, h));
        }

        let throat = h * config.throat_inset_ratio;
        let depth = config.goal_depth;
        for (side, x, back) in [(Side::Left, 0.0, -depth), (Side::Right, w, w + depth)] {
            // Back wall above and below the mouth
            arena.add_tagged_wall("arena_wall_side", Vec2::new(x, 0.0), Vec2::new(x, throat));
            arena.add_tagged_wall("arena_wall_side", Vec2::new(x, h - throat), Vec2::new(x, h));
            // Goal recess
            arena.add_tagged_wall("goal_recess", Vec2::new(x, throat), Vec2::new(back, throat));
            arena.add_tagged_wall("goal_recess", Vec2::new(x, h - throat), Vec2::new(back, h - throat));
            arena.add_tagged_wall("goal_recess", Vec2::new(back, throat), Vec2::new(back, h - throat));

            arena.add_goal(side, Vec2::new((x + back) / 2.0, h / 2.0), depth, h - 2.0 * throat);
        }

        let long = w * config.wedge_ratio;
        let tall = (throat - 2.0).max(2.0);
        arena.add_wedge(vec![Vec2::new(0.0, 0.0), Vec2::new(long, 0.0), Vec2::new(0.0, tall)]);
        arena.add_wedge(vec![Vec2::new(w, 0.0), Vec2::new(w - long, 0.0), Vec2::new(w, tall)]);
        arena.add_wedge(vec![Vec2::new(0.0, h), Vec2::new(long, h), Vec2::new(0.0, h - tall)]);
        arena.add_wedge(vec![Vec2::new(w, h), Vec2::new(w - long, h), Vec2::new(w, h - tall)]);

        for spawn in &config.puck_spawns {
            arena.add_puck(*spawn, Vec2::ZERO);
        }
        arena.puck_spawns = config.puck_spawns.clone();

        arena
    }

    fn push_body(&mut self, tag: &str, category: Category, shape: Shape, position: Vec2, is_static: bool) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(Body {
            id,
            tag: tag.to_string(),
            category,
            shape,
            position,
            velocity: Vec2::ZERO,
            is_static,
            active: true,
            captured: false,
            owner: None,
        });
        id
    }

    /// A fresh projectile, reusing the slot of a collected one when possible
    fn spawn_ball(&mut self, side: Side, position: Vec2) -> BodyId {
        let tag = format!("ball_{side}");
        let shape = Shape::Circle { radius: BALL_RADIUS };

        let spent = self
            .bodies
            .iter()
            .position(|b| !b.active && b.category == Category::BALL);
        let Some(index) = spent else {
            return self.push_body(&tag, Category::BALL, shape, position, false);
        };

        let id = BodyId(index as u32);
        self.bodies[index] = Body {
            id,
            tag,
            category: Category::BALL,
            shape,
            position,
            velocity: Vec2::ZERO,
            is_static: false,
            active: true,
            captured: false,
            owner: None,
        };
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    pub(crate) fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0 as usize)
    }

    /// A puck: visual disc plus the bearing that carries its physics
    pub fn add_puck(&mut self, position: Vec2, velocity: Vec2) -> Target {
        let n = self.roster.len();
        let visual = self.push_body(
            &format!("puck_{n}"),
            Category::PUCK,
            Shape::Circle { radius: PUCK_RADIUS },
            position,
            false,
        );
        let bearing = self.push_body(
            &format!("bearing_{n}"),
            Category::BEARING,
            Shape::Circle { radius: BEARING_RADIUS },
            position,
            false,
        );
        for id in [visual, bearing] {
            if let Some(body) = self.body_mut(id) {
                body.velocity = velocity;
            }
        }

        let target = Target::new(visual, bearing);
        self.roster.push(target);
        target
    }

    pub fn add_wall(&mut self, a: Vec2, b: Vec2) -> BodyId {
        self.add_tagged_wall("arena_wall", a, b)
    }

    fn add_tagged_wall(&mut self, tag: &str, a: Vec2, b: Vec2) -> BodyId {
        let mid = (a + b) * 0.5;
        self.push_body(tag, Category::ARENA, Shape::Segment { a, b }, mid, true)
    }

    pub fn add_wedge(&mut self, vertices: Vec<Vec2>) -> BodyId {
        let n = vertices.len().max(1) as f32;
        let centroid = vertices.iter().fold(Vec2::ZERO, |acc, v| acc + *v) * (1.0 / n);
        self.push_body("wedge", Category::WEDGE, Shape::Polygon { vertices }, centroid, true)
    }

    /// Goal sensor for the goal `side` defends
    pub fn add_goal(&mut self, side: Side, center: Vec2, width: f32, height: f32) -> BodyId {
        self.push_body(
            side.own_goal_tag(),
            Category::SENSOR,
            Shape::Polygon {
                vertices: rect_vertices(center, width, height),
            },
            center,
            true,
        )
    }

    /// Marks a puck's visual as scored
    pub fn capture(&mut self, visual: BodyId) {
        if let Some(body) = self.body_mut(visual) {
            body.captured = true;
        }
    }

    /// Removes a body from the simulation
    pub fn destroy(&mut self, id: BodyId) {
        if let Some(body) = self.body_mut(id) {
            body.active = false;
        }
    }

    /// Makes the roster report itself malformed
    pub fn break_roster(&mut self) {
        self.roster_broken = true;
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(body) = self.body_mut(id) {
            body.velocity = velocity;
        }
    }

    pub fn set_reference_axis(&mut self, axis_y: Option<f32>) {
        self.reference_axis = axis_y;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn set_ammo(&mut self, side: Side, ammo: u32) {
        self.sides[side_index(side)].ammo = ammo;
    }

    pub fn add_trough_ball(&mut self, side: Side) {
        self.sides[side_index(side)].trough += 1;
    }

    pub fn launcher_state_mut(&mut self, side: Side) -> &mut LauncherState {
        &mut self.launchers[side_index(side)]
    }

    pub fn stats(&self, side: Side) -> &SideStats {
        &self.sides[side_index(side)]
    }

    pub(crate) fn stats_mut(&mut self, side: Side) -> &mut SideStats {
        &mut self.sides[side_index(side)]
    }

    pub fn shots_fired(&self, side: Side) -> u32 {
        self.stats(side).shots_fired
    }

    pub fn score(&self, side: Side) -> u32 {
        self.stats(side).score
    }

    pub fn roster(&self) -> &[Target] {
        &self.roster
    }

    /// Projectiles still in flight
    pub fn live_balls(&self) -> usize {
        self.bodies
            .iter()
            .filter(|b| b.active && b.category == Category::BALL)
            .count()
    }

    /// Puts every puck back on its spawn point, un-captured and at rest
    pub fn respawn_pucks(&mut self) {
        let spawns = self.puck_spawns.clone();
        for (i, target) in self.roster.clone().into_iter().enumerate() {
            let spawn = spawns.get(i).copied();
            for id in [target.visual, target.bearing] {
                if let Some(body) = self.body_mut(id) {
                    if let Some(spawn) = spawn {
                        body.position = spawn;
                    }
                    body.velocity = Vec2::ZERO;
                    body.captured = false;
                    body.active = true;
                }
            }
        }
        self.rounds_played += 1;
    }

    /// Resting angle for a side's launcher between rounds
    pub fn center_launchers(&mut self) {
        for launcher in &mut self.launchers {
            launcher.angle = launcher.side.forward_angle();
        }
    }
}

impl WorldQuery for ArenaState {
    fn match_in_progress(&self) -> bool {
        self.playing
    }

    fn target_roster(&self) -> Option<Vec<Target>> {
        if self.roster_broken {
            return None;
        }
        Some(self.roster.clone())
    }

    fn active_bodies(&self) -> Vec<BodyId> {
        self.bodies.iter().filter(|b| b.active).map(|b| b.id).collect()
    }

    fn is_active(&self, body: BodyId) -> bool {
        self.body(body).is_some_and(|b| b.active)
    }

    fn is_captured(&self, body: BodyId) -> bool {
        self.body(body).is_some_and(|b| b.captured)
    }

    fn position(&self, body: BodyId) -> Option<Vec2> {
        self.body(body).filter(|b| b.active).map(|b| b.position)
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2> {
        self.body(body).filter(|b| b.active).map(|b| b.velocity)
    }

    fn footprint_radius(&self, body: BodyId) -> Option<f32> {
        self.body(body).and_then(Body::radius)
    }

    fn raycast(&self, from: Vec2, to: Vec2) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .bodies
            .iter()
            .filter(|b| b.active)
            .filter_map(|b| {
                b.ray_entry(from, to).map(|fraction| RayHit {
                    body: b.id,
                    category: b.category,
                    tag: b.tag.clone(),
                    fraction,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));
        hits
    }

    fn find_body_by_tag(&self, tag: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .find(|b| b.active && b.tag == tag)
            .map(|b| b.id)
    }

    fn wall_segments(&self) -> Vec<WallSegment> {
        let mut walls = Vec::new();
        for body in self.bodies.iter().filter(|b| b.active && b.is_static) {
            if body.category.contains(Category::SENSOR) {
                continue;
            }
            match &body.shape {
                Shape::Segment { a, b } => walls.push(WallSegment {
                    a: *a,
                    b: *b,
                    category: body.category,
                }),
                Shape::Polygon { vertices } => {
                    walls.extend(polygon_edges(vertices).map(|(a, b)| WallSegment {
                        a,
                        b,
                        category: body.category,
                    }))
                }
                Shape::Circle { .. } => {}
            }
        }
        walls
    }

    fn extents(&self) -> Extents {
        Extents {
            width: self.width,
            height: self.height,
        }
    }

    fn reference_axis_y(&self) -> Option<f32> {
        self.reference_axis
    }
}

impl Armory for ArenaState {
    fn ammo(&self, side: Side) -> u32 {
        self.stats(side).ammo
    }

    fn fire_launcher(&mut self, side: Side) -> bool {
        if self.stats(side).ammo == 0 {
            return false;
        }

        let launcher = &self.launchers[side_index(side)];
        let exit = launcher.exit_point();
        let velocity = Vec2::from_angle(launcher.angle) * self.ball_speed;
        if !exit.is_finite() || !velocity.is_finite() {
            return false;
        }

        let id = self.spawn_ball(side, exit);
        if let Some(ball) = self.body_mut(id) {
            ball.velocity = velocity;
            ball.owner = Some(side);
        }

        let stats = self.stats_mut(side);
        stats.ammo -= 1;
        stats.shots_fired += 1;
        true
    }

    fn reload_launcher(&mut self, side: Side) -> bool {
        let stats = self.stats_mut(side);
        if stats.trough == 0 {
            return false;
        }
        stats.trough -= 1;
        stats.ammo += 1;
        stats.reloads += 1;
        true
    }

    fn is_resource_available(&self, side: Side) -> bool {
        self.stats(side).trough > 0
    }
}

impl DuelWorld for ArenaState {
    type Launcher = LauncherState;

    fn launcher(&self, side: Side) -> &LauncherState {
        &self.launchers[side_index(side)]
    }

    fn launcher_mut(&mut self, side: Side) -> &mut LauncherState {
        &mut self.launchers[side_index(side)]
    }
}
