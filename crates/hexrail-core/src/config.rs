//! Configuration loading and typed config structures for hexrail.
//!
//! The canonical configuration lives in `hexrail-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads and validates the file. Every field
//! has a default, so an empty file describes the standard game.

use std::path::{Path, PathBuf};

use hexrail_types::{AiKind, PlayerColor};
use hexrail_world::{CostTables, MapConfig};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but contradict each other.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Constructed once at startup and shared read-only (behind an `Arc`) by
/// the game state and everything that prices or routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of faces of the dice.
    #[serde(default = "default_dice_sides")]
    pub dice_sides: u32,

    /// Players required to start a game.
    #[serde(default = "default_min_players")]
    pub min_players: usize,

    /// Players a game can hold.
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// Credits every player starts with.
    #[serde(default = "default_starting_credits")]
    pub starting_credits: u32,

    /// Credits paid by the bank for connecting a city no rail reached before.
    #[serde(default = "default_city_connection_bonus")]
    pub city_connection_bonus: u32,

    /// Farthest a player may reach into foreign rails, and the most edges
    /// one journey may rent.
    #[serde(default = "default_max_rentable_distance")]
    pub max_rentable_distance: u32,

    /// Prizes of a driving round, best finisher first.
    #[serde(default = "default_winning_credits")]
    pub winning_credits: Vec<u32>,

    /// Building budget of the building rounds inside the driving phase.
    #[serde(default = "default_max_building_budget_driving_phase")]
    pub max_building_budget_driving_phase: u32,

    /// The building phase ends once at most this many cities are unconnected.
    #[serde(default = "default_unconnected_cities_start_threshold")]
    pub unconnected_cities_start_threshold: usize,

    /// Seed of map generation and dice. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Map generation parameters.
    #[serde(default)]
    pub map: MapConfig,

    /// Building, driving and fee tables.
    #[serde(default)]
    pub costs: CostTables,

    /// AI player settings.
    #[serde(default)]
    pub ai: AiConfig,

    /// Players of a headless game, in turn order.
    #[serde(default)]
    pub players: Vec<PlayerConfig>,

    /// Leaderboard persistence.
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dice_sides: default_dice_sides(),
            min_players: default_min_players(),
            max_players: default_max_players(),
            starting_credits: default_starting_credits(),
            city_connection_bonus: default_city_connection_bonus(),
            max_rentable_distance: default_max_rentable_distance(),
            winning_credits: default_winning_credits(),
            max_building_budget_driving_phase: default_max_building_budget_driving_phase(),
            unconnected_cities_start_threshold: default_unconnected_cities_start_threshold(),
            seed: None,
            map: MapConfig::default(),
            costs: CostTables::default(),
            ai: AiConfig::default(),
            players: Vec::new(),
            leaderboard: LeaderboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are consistent with each other.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.dice_sides == 0 {
            return invalid("dice_sides must be at least 1".to_owned());
        }
        if self.min_players == 0 || self.min_players > self.max_players {
            return invalid(format!(
                "min_players ({}) must be between 1 and max_players ({})",
                self.min_players, self.max_players
            ));
        }
        if self.players.len() > self.max_players {
            return invalid(format!(
                "{} players configured, at most {} allowed",
                self.players.len(),
                self.max_players
            ));
        }
        if self.winning_credits.is_empty() {
            return invalid("winning_credits must name at least one prize".to_owned());
        }
        if self.map.cities < 2 {
            return invalid(format!(
                "map.cities ({}) must be at least 2 for a journey",
                self.map.cities
            ));
        }
        if self.map.starting_cities == 0 || self.map.starting_cities > self.map.cities {
            return invalid(format!(
                "map.starting_cities ({}) must be between 1 and map.cities ({})",
                self.map.starting_cities, self.map.cities
            ));
        }
        let cities = usize::try_from(self.map.cities).unwrap_or(usize::MAX);
        if self.unconnected_cities_start_threshold >= cities {
            return invalid(format!(
                "unconnected_cities_start_threshold ({}) must be below map.cities ({})",
                self.unconnected_cities_start_threshold, self.map.cities
            ));
        }
        for (name, probability) in [
            ("city_base_probability", self.map.city_base_probability),
            ("city_at_coast_probability", self.map.city_at_coast_probability),
            (
                "city_near_mountain_probability",
                self.map.city_near_mountain_probability,
            ),
            ("city_near_city_probability", self.map.city_near_city_probability),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return invalid(format!("map.{name} ({probability}) must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// AI player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Pause before an AI player acts, in milliseconds.
    #[serde(default = "default_think_delay_ms")]
    pub think_delay_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            think_delay_ms: default_think_delay_ms(),
        }
    }
}

/// One configured player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Display name. A generated name is used when empty.
    #[serde(default)]
    pub name: String,

    /// Display colour. A random colour is used when absent.
    #[serde(default)]
    pub color: Option<PlayerColor>,

    /// AI controller kind. `None` for a human.
    #[serde(default)]
    pub ai: Option<AiKind>,
}

/// Leaderboard persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Whether results are recorded at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON-lines file the results are appended to.
    #[serde(default = "default_leaderboard_path")]
    pub path: PathBuf,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_leaderboard_path(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_dice_sides() -> u32 {
    6
}

const fn default_min_players() -> usize {
    2
}

const fn default_max_players() -> usize {
    6
}

const fn default_starting_credits() -> u32 {
    20
}

const fn default_city_connection_bonus() -> u32 {
    6
}

const fn default_max_rentable_distance() -> u32 {
    10
}

fn default_winning_credits() -> Vec<u32> {
    vec![20, 10]
}

const fn default_max_building_budget_driving_phase() -> u32 {
    10
}

const fn default_unconnected_cities_start_threshold() -> usize {
    3
}

const fn default_think_delay_ms() -> u64 {
    100
}

const fn default_true() -> bool {
    true
}

fn default_leaderboard_path() -> PathBuf {
    PathBuf::from("leaderboard.jsonl")
}

fn default_log_level() -> String {
    "info".to_owned()
}
