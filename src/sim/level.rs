/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1: `# Level Name`
///   Lines: map rows
///
/// ## Tile legend:
///   '#' = Ground                 '^' = Spike
///   '>' = Emitter firing right   '<' = Emitter firing left
///   'v' = Emitter firing down    'G' = Goal
///   'P' = Player spawn           ' ' = Empty

use std::path::Path;

use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::entity::{Emitter, ACTOR_HALF};
use crate::domain::geom::Vec2;
use crate::domain::tile::{FireDir, Tile, TileMap};
use crate::error::LevelError;
use super::step;
use super::world::{Phase, WorldState};

/// A level as read from text.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

/// A validated, ready-to-play level.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub map: TileMap,
    pub spawn: Vec2,
    pub emitters: Vec<Emitter>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Install a level into the world and start its first run.
pub fn load_level(world: &mut WorldState, levels: &[Level], level_idx: usize) {
    let Some(level) = levels.get(level_idx) else {
        world.phase = Phase::GameComplete;
        return;
    };

    world.map = level.map.clone();
    world.spawn = level.spawn;
    world.emitters = level.emitters.clone();
    world.current_level = level_idx;
    world.total_levels = levels.len();
    world.level_name = level.name.clone();

    step::restart_level(world);
    world.set_message(&level.name, 80);
    world.camera.center_on(world.spawn.cell(), world.map.width, world.map.height);
    info!(level = %level.name, index = level_idx, "level loaded");
}

/// Every playable level: the levels directory if it yields any, else
/// the embedded set. Broken files are logged and skipped.
pub fn load_levels(config: &GameConfig) -> Vec<Level> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = build_all(load_from_directory(dir));
        if !levels.is_empty() {
            info!(count = levels.len(), dir = %dir.display(), "levels loaded from directory");
            return levels;
        }
    }
    build_all(embedded_levels())
}

impl LevelDef {
    pub fn build(&self) -> Result<Level, LevelError> {
        if self.rows.is_empty() {
            return Err(LevelError::Empty { name: self.name.clone() });
        }

        let mut spawn = None;
        let tiles = self.rows.iter().enumerate().map(|(y, row)| {
            row.chars().enumerate().map(|(x, ch)| match ch {
                '#' => Tile::Ground,
                '^' => Tile::Spike,
                '>' => Tile::Emitter(FireDir::Right),
                '<' => Tile::Emitter(FireDir::Left),
                'v' => Tile::Emitter(FireDir::Down),
                'G' => Tile::Goal,
                'P' => {
                    spawn = Some((x as i32, y as i32));
                    Tile::Empty
                }
                _ => Tile::Empty,
            }).collect()
        }).collect();

        let (sx, sy) = spawn.ok_or_else(|| LevelError::NoSpawn { name: self.name.clone() })?;
        let map = TileMap::new(tiles);
        let emitters = map.emitters().into_iter()
            .map(|(x, y, dir)| Emitter::new(x, y, dir))
            .collect();

        Ok(Level {
            name: self.name.clone(),
            map,
            spawn: spawn_point(sx, sy),
            emitters,
        })
    }
}

/// Feet on the bottom edge of the spawn cell.
fn spawn_point(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 1.0 - ACTOR_HALF.y)
}

fn build_all(defs: Vec<LevelDef>) -> Vec<Level> {
    defs.iter().filter_map(|def| match def.build() {
        Ok(level) => Some(level),
        Err(e) => {
            warn!(error = %e, "skipping level");
            None
        }
    }).collect()
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = "Unnamed Echo".to_string();
    }

    if rows.is_empty() {
        return Err(LevelError::Empty { name });
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    Ok(LevelDef { name, rows })
}

/// Distinguish `# Level Name` from `#######` (level data).
/// A name line starts with `#` and contains at least one letter other
/// than the legend's own `v`, `P` and `G`.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic() && c != 'v' && c != 'P' && c != 'G')
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(source) => {
            warn!(error = %LevelError::Read { path: dir.to_path_buf(), source }, "levels directory unreadable");
            return vec![];
        }
    };

    let mut paths: Vec<_> = entries.flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(source) => {
                warn!(error = %LevelError::Read { path, source }, "skipping level");
                continue;
            }
        };
        match parse_level_file(&content) {
            Ok(def) => results.push(def),
            Err(e) => warn!(error = %e, file = %path.display(), "skipping level"),
        }
    }
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Echo 1 - Stepping Stone", &[
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                         G  ",
            "                ############",
            "                ############",
            "  P             ############",
            "############################",
        ]),
        make_embedded("Echo 2 - Bridge of Bones", &[
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "  P      ^^^^^^         G   ",
            "############################",
        ]),
        make_embedded("Echo 3 - Crossfire", &[
            "                            ",
            "                            ",
            "                            ",
            "           v                ",
            "                            ",
            "                            ",
            "                            ",
            "  P              ^^^      G<",
            "############################",
        ]),
        make_embedded("Echo 4 - Long Way Up", &[
            "                            ",
            "                            ",
            "                            ",
            "                            ",
            "                         G  ",
            "                  ##########",
            "                  ##########",
            "                  ##########",
            "  P      v     ^  ##########",
            "############################",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}
