//! Session configuration resource.
//!
//! Simulation and session settings loaded from an INI file. Every value has a
//! safe default so a session starts without any file on disk.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_delta = 0.016666
//! velocity_iterations = 6
//! position_iterations = 2
//! gravity_y = -30.0
//! time_scale = 1.0
//!
//! [session]
//! authoritative = true
//! player_name = player
//! player_id = -1
//! position_sync_interval = 3
//! seed = 12345
//! id_base = 0
//! ```
//!
//! `fixed_delta = 0` selects a variable step: every frame becomes one tick.

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::components::entityid::PlayerId;

const DEFAULT_FIXED_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_VELOCITY_ITERATIONS: u32 = 6;
const DEFAULT_POSITION_ITERATIONS: u32 = 2;
const DEFAULT_GRAVITY_Y: f32 = -30.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_AUTHORITATIVE: bool = true;
const DEFAULT_PLAYER_NAME: &str = "player";
const DEFAULT_PLAYER_ID: PlayerId = PlayerId::LOCAL;
const DEFAULT_POSITION_SYNC_INTERVAL: u32 = 3;
const DEFAULT_SEED: u64 = 0x5eed;
const DEFAULT_ID_BASE: i64 = 0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct SessionConfig {
    /// Seconds per simulation tick; `None` for a variable step.
    pub fixed_delta: Option<f32>,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Vertical gravity for the bundled engine (y-up, so negative pulls down).
    pub gravity_y: f32,
    pub time_scale: f32,
    /// Whether this session owns the enemies and items of the level.
    pub authoritative: bool,
    pub player_name: String,
    /// Participant id of this session's player, as seen by every peer.
    pub player_id: PlayerId,
    /// Ticks between two `EntityPosition` broadcasts; 0 disables them.
    pub position_sync_interval: u32,
    /// Seed for spawn selection and AI wander.
    pub seed: u64,
    /// First entity id this session allocates.
    pub id_base: i64,
    pub config_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            fixed_delta: Some(DEFAULT_FIXED_DELTA),
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            gravity_y: DEFAULT_GRAVITY_Y,
            time_scale: DEFAULT_TIME_SCALE,
            authoritative: DEFAULT_AUTHORITATIVE,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            player_id: DEFAULT_PLAYER_ID,
            position_sync_interval: DEFAULT_POSITION_SYNC_INTERVAL,
            seed: DEFAULT_SEED,
            id_base: DEFAULT_ID_BASE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);

        info!(
            "Loaded config: fixed_delta={:?}, iterations={}/{}, gravity_y={}, authoritative={}, seed={}",
            self.fixed_delta,
            self.velocity_iterations,
            self.position_iterations,
            self.gravity_y,
            self.authoritative,
            self.seed
        );

        Ok(())
    }

    /// Parse settings from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [simulation] section
        if let Some(delta) = config.getfloat("simulation", "fixed_delta").ok().flatten() {
            self.fixed_delta = (delta > 0.0).then_some(delta as f32);
        }
        if let Some(iters) = config
            .getuint("simulation", "velocity_iterations")
            .ok()
            .flatten()
        {
            self.velocity_iterations = iters as u32;
        }
        if let Some(iters) = config
            .getuint("simulation", "position_iterations")
            .ok()
            .flatten()
        {
            self.position_iterations = iters as u32;
        }
        if let Some(gravity) = config.getfloat("simulation", "gravity_y").ok().flatten() {
            self.gravity_y = gravity as f32;
        }
        if let Some(scale) = config.getfloat("simulation", "time_scale").ok().flatten() {
            self.time_scale = scale as f32;
        }

        // [session] section
        if let Some(authoritative) = config.getbool("session", "authoritative").ok().flatten() {
            self.authoritative = authoritative;
        }
        if let Some(name) = config.get("session", "player_name") {
            self.player_name = name;
        }
        if let Some(id) = config.getint("session", "player_id").ok().flatten() {
            self.player_id = PlayerId(id);
        }
        if let Some(interval) = config
            .getuint("session", "position_sync_interval")
            .ok()
            .flatten()
        {
            self.position_sync_interval = interval as u32;
        }
        if let Some(seed) = config.getuint("session", "seed").ok().flatten() {
            self.seed = seed;
        }
        if let Some(base) = config.getint("session", "id_base").ok().flatten() {
            self.id_base = base;
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [simulation] section
        config.set(
            "simulation",
            "fixed_delta",
            Some(self.fixed_delta.unwrap_or(0.0).to_string()),
        );
        config.set(
            "simulation",
            "velocity_iterations",
            Some(self.velocity_iterations.to_string()),
        );
        config.set(
            "simulation",
            "position_iterations",
            Some(self.position_iterations.to_string()),
        );
        config.set("simulation", "gravity_y", Some(self.gravity_y.to_string()));
        config.set("simulation", "time_scale", Some(self.time_scale.to_string()));

        // [session] section
        config.set(
            "session",
            "authoritative",
            Some(self.authoritative.to_string()),
        );
        config.set("session", "player_name", Some(self.player_name.clone()));
        config.set("session", "player_id", Some(self.player_id.0.to_string()));
        config.set(
            "session",
            "position_sync_interval",
            Some(self.position_sync_interval.to_string()),
        );
        config.set("session", "seed", Some(self.seed.to_string()));
        config.set("session", "id_base", Some(self.id_base.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.fixed_delta, Some(DEFAULT_FIXED_DELTA));
        assert!(config.authoritative);
        assert_eq!(config.position_sync_interval, 3);
    }

    #[test]
    fn test_load_from_str_overrides_present_keys_only() {
        let mut config = SessionConfig::new();
        config
            .load_from_str(
                "[simulation]\nfixed_delta = 0\nvelocity_iterations = 8\n\n[session]\nauthoritative = false\nplayer_name = bob\nplayer_id = 2\n",
            )
            .unwrap();
        assert_eq!(config.fixed_delta, None);
        assert_eq!(config.velocity_iterations, 8);
        assert_eq!(config.position_iterations, DEFAULT_POSITION_ITERATIONS);
        assert!(!config.authoritative);
        assert_eq!(config.player_name, "bob");
        assert_eq!(config.player_id, PlayerId(2));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = SessionConfig::with_path("/nonexistent/skirmish.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.seed, DEFAULT_SEED);
    }
}
