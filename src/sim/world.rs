/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
/// The world owns everything the echo mechanic touches: the live actor
/// and its recorder, the ghost population and the prop store (which is
/// also the spawner handed to transformations). Nothing is global.
///
/// ## Clock
///
/// `tick` counts simulation steps; seconds are `tick * dt`. `step()`
/// bumps the counter first, so between steps `next_step_time()` is the
/// time the next step will see. Run resets start the new run there.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera`: viewport into the world (top-left cell + size)
///   - Renderer maps: `screen(sx, sy) = world(camera.x + sx, camera.y + sy)`
///   - Camera follows the player with a dead-zone approach
///   - Maps smaller than the viewport are centered

use crate::config::GameConfig;
use crate::domain::entity::{Emitter, Player, Projectile};
use crate::domain::geom::{Aabb, Vec2};
use crate::domain::tile::TileMap;
use super::population::GhostPopulation;
use super::recording::Recorder;
use super::spawn::{PrefabRegistry, PropStore};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    LevelComplete,
    GameComplete,
}

/// Camera: a viewport into the world.
///
/// `(x, y)` is the world coordinate of the top-left visible cell.
/// `(view_w, view_h)` is how many world cells fit in the viewport.
/// These are computed from terminal size and set during `render()`.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    /// Follow a target cell, scrolling only when it leaves the inner
    /// 60% of the viewport.
    pub fn follow(&mut self, target: (i32, i32), world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = follow_axis(self.x, target.0, self.view_w, world_w);
        self.y = follow_axis(self.y, target.1, self.view_h, world_h);
    }

    /// Snap directly onto a target cell (level load).
    pub fn center_on(&mut self, target: (i32, i32), world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = center_axis(target.0, self.view_w, world_w);
        self.y = center_axis(target.1, self.view_h, world_h);
    }

    /// World cell to viewport cell, `None` if off screen.
    pub fn world_to_view(&self, wx: i32, wy: i32) -> Option<(usize, usize)> {
        let vx = wx - self.x;
        let vy = wy - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }
}

fn follow_axis(cam: i32, target: i32, view: usize, world: usize) -> i32 {
    if world <= view {
        return -((view as i32 - world as i32) / 2);
    }
    let margin = view as i32 / 5;
    let lo = cam + margin;
    let hi = cam + view as i32 - margin - 1;
    let cam = if target < lo {
        target - margin
    } else if target > hi {
        target - view as i32 + margin + 1
    } else {
        cam
    };
    cam.clamp(0, (world as i32 - view as i32).max(0))
}

fn center_axis(target: i32, view: usize, world: usize) -> i32 {
    if world <= view {
        -((view as i32 - world as i32) / 2)
    } else {
        (target - view as i32 / 2).clamp(0, (world as i32 - view as i32).max(0))
    }
}

pub struct WorldState {
    // ── Level ──
    pub map: TileMap,
    /// Player start: feet resting on the floor of the spawn cell.
    pub spawn: Vec2,
    pub emitters: Vec<Emitter>,

    // ── Entities ──
    pub player: Player,
    pub recorder: Recorder,
    pub ghosts: GhostPopulation,
    pub props: PropStore,
    pub projectiles: Vec<Projectile>,

    // ── Settings ──
    pub config: GameConfig,

    // ── Meta ──
    pub phase: Phase,
    pub tick: u64,
    /// 1-based run counter within the current level.
    pub run: u32,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub camera: Camera,
}

// ── Construction ──

impl WorldState {
    pub fn new(config: GameConfig) -> Self {
        let now = config.physics.dt();
        WorldState {
            map: TileMap::default(),
            spawn: Vec2::ZERO,
            emitters: vec![],
            player: Player::new(Vec2::ZERO, config.player.max_health),
            recorder: Recorder::new(now),
            ghosts: GhostPopulation::new(config.echo.max_ghosts),
            props: PropStore::new(PrefabRegistry::standard()),
            projectiles: vec![],
            config,
            phase: Phase::Playing,
            tick: 0,
            run: 1,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            paused: false,
            message: String::new(),
            message_timer: 0,
            camera: Camera::default(),
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

// ── Clock ──

impl WorldState {
    pub fn dt(&self) -> f64 {
        self.config.physics.dt()
    }

    /// Time of the step currently running (or the last one run).
    pub fn now(&self) -> f64 {
        self.tick as f64 * self.dt()
    }

    /// Time the next call to `step()` will see.
    pub fn next_step_time(&self) -> f64 {
        (self.tick + 1) as f64 * self.dt()
    }
}

// ── Solid queries ──
//
// Who stands on what: tiles for everyone, props for every body, frozen
// ghosts for the player and props only.

impl WorldState {
    /// Boxes of every spawned prop (reflectors and falling bodies).
    pub fn prop_boxes(&self) -> Vec<Aabb> {
        self.props.props.iter().map(|p| p.body.bounds()).collect()
    }

    /// Boxes of every frozen ghost.
    pub fn frozen_ghost_boxes(&self) -> Vec<Aabb> {
        self.ghosts.iter().filter(|g| g.is_frozen()).map(|g| g.bounds()).collect()
    }

    /// Extra solids the live actor collides with.
    pub fn player_solids(&self) -> Vec<Aabb> {
        let mut solids = self.prop_boxes();
        solids.extend(self.frozen_ghost_boxes());
        solids
    }
}
