/// External configuration loader.
///
/// Reads `config.toml` from `$GRIDHOP_CONFIG`, else the executable's
/// directory, else the CWD. Missing files or keys fall back to defaults;
/// an unreadable or invalid file is logged and replaced by defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::physics::{self, PhysicsParams};
use crate::error::ConfigError;
use crate::sim::level::{LevelCatalog, LevelId};

pub const CONFIG_ENV: &str = "GRIDHOP_CONFIG";
const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub physics: PhysicsParams,
    pub session: SessionConfig,
    pub driver: DriverConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub start_level: LevelId,
    /// 0 = unbounded.
    pub replay_max_frames: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
    pub tick_rate_ms: u64,
    /// Tick on a timer instead of on `tick` commands.
    pub realtime: bool,
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    driver: TomlDriver,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f64,
    #[serde(default = "default_max_fall")]
    max_fall: f64,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_start_level")]
    start_level: u32,
    #[serde(default)]
    replay_max_frames: usize,
}

#[derive(Deserialize, Debug)]
struct TomlDriver {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    realtime: bool,
    #[serde(default = "default_output")]
    output: String,
}

// ── Defaults ──

fn default_gravity() -> f64 { physics::GRAVITY }
fn default_jump_velocity() -> f64 { physics::JUMP_VELOCITY }
fn default_max_fall() -> f64 { physics::MAX_FALL }
fn default_start_level() -> u32 { 1 }
fn default_tick_rate() -> u64 { 50 }
fn default_output() -> String { "text".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            jump_velocity: default_jump_velocity(),
            max_fall: default_max_fall(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            start_level: default_start_level(),
            replay_max_frames: 0,
        }
    }
}

impl Default for TomlDriver {
    fn default() -> Self {
        TomlDriver {
            tick_rate_ms: default_tick_rate(),
            realtime: false,
            output: default_output(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            physics: PhysicsParams::default(),
            session: SessionConfig {
                start_level: LevelId(default_start_level()),
                replay_max_frames: 0,
            },
            driver: DriverConfig {
                tick_rate_ms: default_tick_rate(),
                realtime: false,
                output: OutputFormat::Text,
            },
        }
    }
}

// ── Validation ──

impl TomlConfig {
    fn into_config(self, catalog: &LevelCatalog) -> Result<GameConfig, ConfigError> {
        let p = self.physics;
        if !(p.max_fall.is_finite() && p.max_fall > 0.0) {
            return Err(invalid("physics.max_fall", format!("must be > 0, got {}", p.max_fall)));
        }
        if !(p.gravity.is_finite() && p.gravity >= 0.0) {
            return Err(invalid("physics.gravity", format!("must be >= 0, got {}", p.gravity)));
        }
        if !(p.jump_velocity.is_finite() && p.jump_velocity < 0.0) {
            return Err(invalid(
                "physics.jump_velocity",
                format!("must be < 0 (upward), got {}", p.jump_velocity),
            ));
        }
        let jump_velocity = if -p.jump_velocity > p.max_fall {
            warn!(
                jump_velocity = p.jump_velocity,
                max_fall = p.max_fall,
                "jump faster than max_fall; clamping"
            );
            -p.max_fall
        } else {
            p.jump_velocity
        };

        let start_level = LevelId(self.session.start_level);
        if !catalog.contains(start_level) {
            return Err(invalid("session.start_level", format!("no level {start_level}")));
        }

        if self.driver.tick_rate_ms == 0 {
            return Err(invalid("driver.tick_rate_ms", "must be > 0".into()));
        }
        let output = match self.driver.output.to_ascii_lowercase().as_str() {
            "text" => OutputFormat::Text,
            "json" => OutputFormat::Json,
            other => {
                return Err(invalid("driver.output", format!("expected `text` or `json`, got `{other}`")))
            }
        };

        Ok(GameConfig {
            physics: PhysicsParams { gravity: p.gravity, jump_velocity, max_fall: p.max_fall },
            session: SessionConfig {
                start_level,
                replay_max_frames: self.session.replay_max_frames,
            },
            driver: DriverConfig {
                tick_rate_ms: self.driver.tick_rate_ms,
                realtime: self.driver.realtime,
                output,
            },
        })
    }
}

fn invalid(key: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { key, reason }
}

// ── Loading ──

impl GameConfig {
    /// Load from the first `config.toml` found.
    /// Any error is logged and the defaults are used instead.
    pub fn load() -> Self {
        let Some(path) = find_config() else {
            info!("no config.toml found; using defaults");
            return GameConfig::default();
        };
        match GameConfig::load_from(&path) {
            Ok(cfg) => {
                info!(path = %path.display(), "config loaded");
                cfg
            }
            Err(e) => {
                warn!(error = %e, "using default settings");
                GameConfig::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        parse(&text, &path.display().to_string())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        parse(text, "<inline>")
    }
}

fn parse(text: &str, origin: &str) -> Result<GameConfig, ConfigError> {
    let raw: TomlConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    raw.into_config(&LevelCatalog::builtin())
}

/// `$GRIDHOP_CONFIG` if set, otherwise the first existing `config.toml`
/// among the candidate directories.
fn find_config() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    candidate_dirs()
        .into_iter()
        .map(|d| d.join(CONFIG_FILE))
        .find(|p| p.is_file())
}

/// Candidate directories: exe dir, then CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}
