/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LoggingConfig};
use domain::entity::HazardKind;
use domain::motion::LiveInput;
use sim::diagnostics;
use sim::event::GameEvent;
use sim::level::{load_level, load_levels, Level};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let (config, config_problem) = GameConfig::load();
    init_tracing(&config.logging);
    if let Some(e) = config_problem {
        warn!(error = %e, "config.toml ignored, using defaults");
    }

    let levels = load_levels(&config);
    info!(levels = levels.len(), max_ghosts = config.echo.max_ghosts, "starting");

    let mut world = WorldState::new(config.clone());
    load_level(&mut world, &levels, 0);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &levels, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Echo Runner!");
    println!("Levels cleared: {}/{}", cleared(&world), world.total_levels);
}

/// Log to a file: the terminal belongs to the renderer. `RUST_LOG`
/// overrides the configured filter. No file, no subscriber.
fn init_tracing(cfg: &LoggingConfig) {
    let file = match File::create(&cfg.file) {
        Ok(f) => f,
        Err(_) => return,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn cleared(world: &WorldState) -> usize {
    match world.phase {
        Phase::GameComplete => world.total_levels,
        Phase::LevelComplete => world.current_level + 1,
        Phase::Playing => world.current_level,
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    levels: &[Level],
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.physics.tick_rate_ms.max(1));

    // Presses between ticks are held until the next step consumes them.
    let mut pending_jump = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, levels, &kb, &gp) {
            break;
        }

        if world.phase == Phase::Playing && !world.paused
            && (kb.any_pressed(KEYS_JUMP) || gp.jump_pressed())
        {
            pending_jump = true;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.paused {
                if world.message_timer > 0 {
                    world.message_timer -= 1;
                }
            } else if world.phase == Phase::Playing {
                let input = LiveInput {
                    horizontal: detect_horizontal(&kb, &gp),
                    jump_pressed: std::mem::take(&mut pending_jump),
                };
                let events = step::step(world, input);
                present_events(world, &events);
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Turn simulation events into HUD messages.
fn present_events(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PlayerDied => world.set_message("You fell. Your echo will remember.", 45),
            GameEvent::GhostEvicted { id } => {
                world.set_message(&format!("The oldest echo fades ({id})"), 40);
            }
            GameEvent::GhostTransformed { degraded: true, .. } => {
                world.set_message("An echo collapsed into rubble", 40);
            }
            GameEvent::GhostTransformed { into, .. } => {
                world.set_message(&format!("An echo became a {}", prop_name(*into)), 30);
            }
            GameEvent::LevelComplete => world.set_message("Echo resolved!", 0),
            _ => {}
        }
    }
}

fn prop_name(kind: domain::entity::PropKind) -> &'static str {
    match kind {
        domain::entity::PropKind::Reflector(_) => "reflector",
        domain::entity::PropKind::FallingBody => "stone",
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn detect_horizontal(kb: &InputState, gp: &GamepadState) -> f32 {
    let keys = kb.axis(KEYS_LEFT, KEYS_RIGHT);
    if keys != 0.0 { keys } else { gp.horizontal() }
}

/// Non-simulation input. Returns true to quit.
fn handle_meta(world: &mut WorldState, levels: &[Level], kb: &InputState, gp: &GamepadState) -> bool {
    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        return true;
    }

    // F1: Pause / Resume
    if kb.was_pressed(KeyCode::F(1)) && world.phase == Phase::Playing {
        world.paused = !world.paused;
        if world.paused {
            world.set_message("PAUSED  [F1] Resume", 0);
        } else {
            world.message.clear();
            world.message_timer = 0;
        }
        return false;
    }
    if world.paused {
        return false;
    }

    match world.phase {
        Phase::Playing => {
            if kb.any_pressed(KEYS_RESET) || gp.reset_pressed() {
                step::reset_run(world);
                world.set_message(&format!("Run {}", world.run), 20);
            } else if kb.was_pressed(KeyCode::F(2)) {
                step::restart_level(world);
                world.set_message("Level Restarted", 30);
            } else if kb.was_pressed(KeyCode::F(5)) {
                force_oldest(world);
            } else if kb.was_pressed(KeyCode::F(6)) {
                let n = diagnostics::reset_hit_gates(world);
                world.set_message(&format!("Hit gates re-armed on {n} ghost(s)"), 40);
            } else if kb.was_pressed(KeyCode::F(7)) {
                let stats = diagnostics::population_stats(world);
                world.set_message(
                    &format!("Ghosts {}/{}  tick {}  run {}", stats.count, stats.capacity, world.tick, world.run),
                    60,
                );
            }
        }
        Phase::LevelComplete => {
            if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
                let next = world.current_level + 1;
                load_level(world, levels, next);
            } else if kb.was_pressed(KeyCode::F(2)) {
                step::restart_level(world);
            }
        }
        Phase::GameComplete => {}
    }

    false
}

/// F5: transform the oldest replaying ghost as if a projectile hit it.
fn force_oldest(world: &mut WorldState) {
    let Some(id) = diagnostics::oldest_replaying(world) else {
        world.set_message("No replaying ghost", 30);
        return;
    };
    let mut events = vec![];
    match diagnostics::force_transform(world, id, HazardKind::Projectile, &mut events) {
        Some(spawned) => world.set_message(&format!("{id} forced into {:?}", spawned.kind), 40),
        None => world.set_message(&format!("{id} ignored the hazard"), 40),
    }
}
