/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Live actor: ground check, record, integrate, physics
///   2. Ghosts in population order: replay due samples, physics
///   3. Props: physics for falling bodies
///   4. Emitters fire
///   5. Projectiles move and resolve contacts
///   6. Spike contacts
///   7. Hazard dispatch: transform, spawn substitute, destroy ghost
///   8. Ghosts whose last sample ran this tick freeze
///   9. Death / goal check
///
/// Ground contact is measured here, live, for every actor against the
/// geometry that actor can stand on this tick. Recorded contact flags are
/// never consulted.
///
/// Resets (death or manual) go through `reset_run`, which hands the run
/// to the echo and starts the next one at the next step's time.

use tracing::{debug, info};

use crate::domain::entity::{EntityKind, GhostId, Player, Projectile};
use crate::domain::geom::{Aabb, Vec2};
use crate::domain::motion::{self, InputSource, LiveInput};
use crate::domain::physics::{self, BodyMode, Geometry, Scene};
use crate::domain::tile::{Tile, TileMap};
use super::event::GameEvent;
use super::ghost::Hazard;
use super::spawn::{self, Spawned};
use super::world::{Phase, WorldState};

/// How far below the map bottom the live actor may fall before dying.
pub const DEATH_MARGIN: f32 = 2.0;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: LiveInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    let now = world.now();
    let mut hazards: Vec<(GhostId, Hazard)> = Vec::new();

    step_player(world, input, now);
    step_ghosts(world, now);
    step_props(world);
    fire_emitters(world, &mut events);
    resolve_projectiles(world, &mut hazards, &mut events);
    resolve_spikes(world, &mut hazards);
    for (id, hazard) in hazards {
        transform_ghost(world, id, hazard, &mut events);
    }
    freeze_exhausted(world, &mut events);
    resolve_end(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Run lifecycle
// ══════════════════════════════════════════════════════════════

/// End the current run: its recording becomes a ghost, every ghost
/// restarts, and the live actor respawns. Atomic within this call.
pub fn reset_run(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = vec![];
    let start = world.next_step_time();

    world.recorder.set_enabled(false);
    let recording = world.recorder.take(start);
    let recorded = recording.len();
    let report = world.ghosts.on_reset(
        recording,
        start,
        world.config.physics.motion_params(),
        world.config.echo.physics_after_freeze,
    );
    if let Some(id) = report.evicted { events.push(GameEvent::GhostEvicted { id }); }
    if let Some(id) = report.created { events.push(GameEvent::GhostSpawned { id }); }

    respawn(world);
    world.recorder.set_enabled(true);
    world.run += 1;

    info!(run = world.run, recorded, ghosts = world.ghosts.len(), "run reset");
    events.push(GameEvent::RunReset { run: world.run, recorded });
    events
}

/// Start the current level over: no ghosts, no props, run 1.
pub fn restart_level(world: &mut WorldState) {
    world.ghosts.clear();
    world.props.clear();
    respawn(world);
    world.recorder.discard(world.next_step_time());
    world.recorder.set_enabled(true);
    world.run = 1;
    world.phase = Phase::Playing;
}

fn respawn(world: &mut WorldState) {
    world.player = Player::new(world.spawn, world.config.player.max_health);
    world.projectiles.clear();
    for e in &mut world.emitters {
        e.timer = 0;
    }
}

// ══════════════════════════════════════════════════════════════
// Actors
// ══════════════════════════════════════════════════════════════

fn step_player(world: &mut WorldState, input: LiveInput, now: f64) {
    let phys = world.config.physics.physics_params();
    let params = world.config.physics.motion_params();
    let probe = world.config.physics.ground_probe;
    let solids = world.player_solids();
    let scene = Scene { map: &world.map, extra: &solids };
    let player = &mut world.player;

    if player.hit_cooldown > 0 {
        player.hit_cooldown -= 1;
    }

    let grounded = scene.is_grounded(player.body.bounds(), probe);
    world.recorder.sample(
        now,
        player.body.position,
        player.body.velocity,
        grounded,
        player.motion.has_jumped,
        input.horizontal,
        input.jump_pressed,
    );
    motion::integrate(&mut player.body, &mut player.motion, grounded, params, InputSource::Live(input));
    physics::step_body(&mut player.body, &scene, &phys);
}

/// Ghosts stand on tiles and props, never on each other.
fn step_ghosts(world: &mut WorldState, now: f64) {
    let phys = world.config.physics.physics_params();
    let probe = world.config.physics.ground_probe;
    let props = world.prop_boxes();
    let scene = Scene { map: &world.map, extra: &props };

    for ghost in world.ghosts.iter_mut() {
        if ghost.is_transformed() { continue; }
        let grounded = scene.is_grounded(ghost.bounds(), probe);
        ghost.advance(now, grounded);
        physics::step_body(&mut ghost.body, &scene, &phys);
        ghost.settle(scene.is_grounded(ghost.bounds(), probe));
    }
}

/// Closes the tick for replays that ran out. Hazards this tick have
/// already landed, so a fatal run still reaches its hazard.
fn freeze_exhausted(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for ghost in world.ghosts.iter_mut() {
        if ghost.freeze_if_exhausted() {
            events.push(GameEvent::GhostFrozen { id: ghost.id() });
        }
    }
}

/// Props stand on tiles, other props and frozen ghosts.
fn step_props(world: &mut WorldState) {
    let phys = world.config.physics.physics_params();
    let frozen = world.frozen_ghost_boxes();
    let boxes = world.prop_boxes();

    for (i, prop) in world.props.props.iter_mut().enumerate() {
        if prop.body.mode == BodyMode::Fixed { continue; }
        let extra: Vec<Aabb> = boxes.iter().enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, b)| *b)
            .chain(frozen.iter().copied())
            .collect();
        let scene = Scene { map: &world.map, extra: &extra };
        physics::step_body(&mut prop.body, &scene, &phys);
    }
}

// ══════════════════════════════════════════════════════════════
// Hazards
// ══════════════════════════════════════════════════════════════

fn fire_emitters(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let interval = world.config.hazards.emitter_interval_ticks;
    let speed = world.config.hazards.projectile_speed;
    for e in world.emitters.iter_mut() {
        if e.tick(interval) {
            let at = e.muzzle();
            world.projectiles.push(Projectile { position: at, direction: e.dir.vector(), speed });
            events.push(GameEvent::ProjectileFired { at });
        }
    }
}

fn resolve_projectiles(world: &mut WorldState, hazards: &mut Vec<(GhostId, Hazard)>, events: &mut Vec<GameEvent>) {
    let dt = world.config.physics.physics_params().dt;
    let damage = world.config.player.projectile_damage;
    let cooldown = world.config.player.hit_cooldown_ticks;

    let mut alive = Vec::with_capacity(world.projectiles.len());
    for mut p in std::mem::take(&mut world.projectiles) {
        p.position += p.direction * (p.speed * dt);
        match projectile_contact(world, &p) {
            None => alive.push(p),
            Some(EntityKind::Player) => {
                let player = &mut world.player;
                if player.hit_cooldown == 0 {
                    player.health -= damage;
                    player.hit_cooldown = cooldown;
                    debug!(health = player.health, "player hit");
                    events.push(GameEvent::PlayerHit { health: player.health });
                }
            }
            Some(EntityKind::Ghost(id)) => {
                if let Some(h) = Hazard::from_contact(EntityKind::Projectile, p.direction, p.position) {
                    hazards.push((id, h));
                }
            }
            // Tiles, reflectors and falling bodies just absorb.
            Some(_) => {}
        }
    }
    world.projectiles = alive;
}

/// First thing a projectile touches, if any.
fn projectile_contact(world: &WorldState, p: &Projectile) -> Option<EntityKind> {
    let b = p.bounds();
    if p.position.y > world.map.height as f32 + DEATH_MARGIN || world.map.any_cell(b, Tile::is_solid) {
        return Some(EntityKind::Ground);
    }
    if let Some(prop) = world.props.props.iter().find(|prop| prop.body.bounds().overlaps(&b)) {
        return Some(prop.kind.entity_kind());
    }
    if world.player.body.bounds().overlaps(&b) {
        return Some(EntityKind::Player);
    }
    world.ghosts.iter()
        .find(|g| !g.is_transformed() && g.bounds().overlaps(&b))
        .map(|g| EntityKind::Ghost(g.id()))
}

/// Spikes hurt in the lower half of their cell only, so anything resting
/// on a prop that covers a spike is safe.
fn spike_contact(map: &TileMap, b: Aabb) -> bool {
    let (x0, y0) = (b.min.x.floor() as i32, b.min.y.floor() as i32);
    let (x1, y1) = (b.max.x.floor() as i32, b.max.y.floor() as i32);
    (y0..=y1).any(|y| {
        (x0..=x1).any(|x| {
            map.tile_at(x, y).is_spike()
                && Aabb::new(
                    Vec2::new(x as f32 + 0.1, y as f32 + 0.5),
                    Vec2::new(x as f32 + 0.9, y as f32 + 1.0),
                ).overlaps(&b)
        })
    })
}

fn resolve_spikes(world: &mut WorldState, hazards: &mut Vec<(GhostId, Hazard)>) {
    if spike_contact(&world.map, world.player.body.bounds()) {
        world.player.health = 0;
    }
    for g in world.ghosts.iter() {
        if g.is_transformed() || !spike_contact(&world.map, g.bounds()) { continue; }
        if let Some(h) = Hazard::from_contact(EntityKind::Spike, Vec2::ZERO, g.position()) {
            hazards.push((g.id(), h));
        }
    }
}

/// Deliver one hazard. When it transforms the ghost, the substitute is
/// spawned and the ghost destroyed.
pub(crate) fn transform_ghost(
    world: &mut WorldState,
    id: GhostId,
    hazard: Hazard,
    events: &mut Vec<GameEvent>,
) -> Option<Spawned> {
    let t = world.ghosts.get_mut(id)?.on_hazard(hazard)?;
    let spawned = spawn::spawn_substitute(&mut world.props, t.kind, t.position);
    world.ghosts.remove(id);
    events.push(GameEvent::GhostTransformed {
        id,
        into: spawned.kind,
        handle: spawned.handle,
        degraded: spawned.degraded,
    });
    Some(spawned)
}

// ══════════════════════════════════════════════════════════════
// Win / lose
// ══════════════════════════════════════════════════════════════

fn resolve_end(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let fell = world.player.body.position.y > world.map.height as f32 + DEATH_MARGIN;
    if world.player.is_dead() || fell {
        info!(run = world.run, fell, "player died");
        events.push(GameEvent::PlayerDied);
        events.extend(reset_run(world));
        return;
    }

    if world.map.any_cell(world.player.body.bounds(), Tile::is_goal) {
        world.phase = Phase::LevelComplete;
        info!(level = %world.level_name, runs = world.run, "level complete");
        events.push(GameEvent::LevelComplete);
    }
}
