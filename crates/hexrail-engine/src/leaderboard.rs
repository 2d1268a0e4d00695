//! Persistent results of finished games.
//!
//! One [`LeaderboardEntry`] per player and game, stored by a
//! [`LeaderboardStore`]. The engine ships [`JsonLinesLeaderboard`], which
//! appends one JSON object per line to a file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hexrail_core::GameOutcome;
use hexrail_types::{AiKind, GameId};
use serde::{Deserialize, Serialize};

/// Errors from reading or writing the leaderboard.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    /// Reading or writing the file failed.
    #[error("leaderboard I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// An entry could not be converted to JSON.
    #[error("failed to encode leaderboard entry: {source}")]
    Encode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A stored line is not a valid entry.
    #[error("invalid leaderboard entry on line {line}: {source}")]
    Decode {
        /// One-based line number.
        line: usize,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// One player's result in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Display name of the player.
    pub player_name: String,
    /// AI kind, `None` for a human.
    pub ai: Option<AiKind>,
    /// When the game ended.
    pub timestamp: DateTime<Utc>,
    /// Credits at the end of the game.
    pub score: u32,
    /// The game.
    pub game_id: GameId,
}

impl LeaderboardEntry {
    /// One entry per player of a finished game.
    pub fn from_outcome(
        game_id: GameId,
        outcome: &GameOutcome,
        timestamp: DateTime<Utc>,
    ) -> Vec<Self> {
        outcome
            .standings
            .iter()
            .map(|summary| Self {
                player_name: summary.name.clone(),
                ai: summary.ai.clone(),
                timestamp,
                score: summary.credits,
                game_id,
            })
            .collect()
    }
}

/// Storage of leaderboard entries.
pub trait LeaderboardStore {
    /// Persist `entries` after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns a [`LeaderboardError`] if the entries cannot be stored.
    fn append(&mut self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError>;

    /// Every stored entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`LeaderboardError`] if the store cannot be read.
    fn load_all(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

/// The `n` best entries, highest score first, older entries first on ties.
pub fn top_entries(mut entries: Vec<LeaderboardEntry>, n: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
    entries.truncate(n);
    entries
}

/// Leaderboard in a JSON-lines file.
#[derive(Debug, Clone)]
pub struct JsonLinesLeaderboard {
    path: PathBuf,
}

impl JsonLinesLeaderboard {
    /// A leaderboard stored at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeaderboardStore for JsonLinesLeaderboard {
    fn append(&mut self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        let mut lines = String::new();
        for entry in entries {
            let line = serde_json::to_string(entry)
                .map_err(|source| LeaderboardError::Encode { source })?;
            lines.push_str(&line);
            lines.push('\n');
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(lines.as_bytes())?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| LeaderboardError::Decode {
                    line: index.saturating_add(1),
                    source,
                })
            })
            .collect()
    }
}
