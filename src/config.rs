/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// A file that exists but cannot be read or parsed is reported back to the
/// caller, which logs it once logging is up.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::motion::MotionParams;
use crate::domain::physics::PhysicsParams;
use crate::error::ConfigError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub echo: EchoConfig,
    pub hazards: HazardConfig,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_max_fall")]
    pub max_fall_speed: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_jump_force")]
    pub jump_force: f32,
    /// Ground query distance below the feet, in cells.
    #[serde(default = "default_ground_probe")]
    pub ground_probe: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_max_health")]
    pub max_health: i32,
    #[serde(default = "default_projectile_damage")]
    pub projectile_damage: i32,
    #[serde(default = "default_hit_cooldown")]
    pub hit_cooldown_ticks: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EchoConfig {
    #[serde(default = "default_max_ghosts")]
    pub max_ghosts: usize,
    /// Frozen ghosts stay under gravity instead of pinning in place.
    #[serde(default)]
    pub physics_after_freeze: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HazardConfig {
    #[serde(default = "default_emitter_interval")]
    pub emitter_interval_ticks: u32,
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_jump_buttons")]
    pub jump: Vec<String>,
    #[serde(default = "default_reset_buttons")]
    pub reset: Vec<String>,
    #[serde(default = "default_confirm")]
    pub confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    pub cancel: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: PhysicsConfig,
    #[serde(default)]
    player: PlayerConfig,
    #[serde(default)]
    echo: EchoConfig,
    #[serde(default)]
    hazards: HazardConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_gravity() -> f32 { 40.0 }
fn default_max_fall() -> f32 { 20.0 }
fn default_move_speed() -> f32 { 6.0 }
fn default_jump_force() -> f32 { 14.0 }   // ~2.4 cells: two-cell steps yes, three no
fn default_ground_probe() -> f32 { 0.05 }

fn default_max_health() -> i32 { 3 }
fn default_projectile_damage() -> i32 { 1 }
fn default_hit_cooldown() -> u32 { 30 }

fn default_max_ghosts() -> usize { 3 }

fn default_emitter_interval() -> u32 { 45 }
fn default_projectile_speed() -> f32 { 8.0 }

fn default_jump_buttons() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_reset_buttons() -> Vec<String> { vec!["X".into(), "Y".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> PathBuf { PathBuf::from("echorunner.log") }
fn default_log_filter() -> String { "info".into() }

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            tick_rate_ms: default_tick_rate(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall(),
            move_speed: default_move_speed(),
            jump_force: default_jump_force(),
            ground_probe: default_ground_probe(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            max_health: default_max_health(),
            projectile_damage: default_projectile_damage(),
            hit_cooldown_ticks: default_hit_cooldown(),
        }
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        EchoConfig { max_ghosts: default_max_ghosts(), physics_after_freeze: false }
    }
}

impl Default for HazardConfig {
    fn default() -> Self {
        HazardConfig {
            emitter_interval_ticks: default_emitter_interval(),
            projectile_speed: default_projectile_speed(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_jump_buttons(),
            reset: default_reset_buttons(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { file: default_log_file(), filter: default_log_filter() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Derived parameters ──

impl PhysicsConfig {
    /// Seconds per tick.
    pub fn dt(&self) -> f64 {
        self.tick_rate_ms.max(1) as f64 / 1000.0
    }

    pub fn motion_params(&self) -> MotionParams {
        MotionParams { move_speed: self.move_speed, jump_force: self.jump_force }
    }

    pub fn physics_params(&self) -> PhysicsParams {
        PhysicsParams {
            gravity: self.gravity,
            max_fall_speed: self.max_fall_speed,
            dt: self.dt() as f32,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults; a
    /// broken file falls back too and the error is handed back.
    pub fn load() -> (Self, Option<ConfigError>) {
        let search_dirs = candidate_dirs();
        let (toml_cfg, problem) = load_toml(&search_dirs);
        (GameConfig::from_toml(toml_cfg, &search_dirs), problem)
    }

    /// Parse a config document. Relative paths are kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            physics: toml_cfg.physics,
            player: toml_cfg.player,
            echo: toml_cfg.echo,
            hazards: toml_cfg.hazards,
            gamepad: toml_cfg.gamepad,
            logging: toml_cfg.logging,
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/echorunner)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/echorunner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Option<ConfigError>) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) => return (TomlConfig::default(), Some(ConfigError::Read { path, source })),
        };
        return match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => (cfg, None),
            Err(e) => (TomlConfig::default(), Some(ConfigError::Parse(e))),
        };
    }
    (TomlConfig::default(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").expect("parses");
        assert_eq!(cfg.physics.tick_rate_ms, 33);
        assert_eq!(cfg.echo.max_ghosts, 3);
        assert!(!cfg.echo.physics_after_freeze);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.logging.filter, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[echo]\nmax_ghosts = 5\nphysics_after_freeze = true\n\n[physics]\ngravity = 30.0\n",
        ).expect("parses");
        assert_eq!(cfg.echo.max_ghosts, 5);
        assert!(cfg.echo.physics_after_freeze);
        assert_eq!(cfg.physics.gravity, 30.0);
        assert_eq!(cfg.physics.jump_force, 14.0);
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = GameConfig::from_toml_str("[echo]\nmax_ghosts = \"many\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn derived_params_follow_tick_rate() {
        let mut cfg = GameConfig::default();
        cfg.physics.tick_rate_ms = 50;
        assert!((cfg.physics.dt() - 0.05).abs() < 1e-12);
        assert!((cfg.physics.physics_params().dt - 0.05).abs() < 1e-6);
        assert_eq!(cfg.physics.motion_params().move_speed, cfg.physics.move_speed);
    }
}
