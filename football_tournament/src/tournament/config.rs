//! Tournament defaults.

use std::env;

use super::errors::{TournamentError, TournamentResult};
use super::models::{DEFAULT_MATCH_DURATION_SECS, TournamentFormat};

/// Defaults applied to newly created tournaments
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    /// Teams that qualify for the knockout (2 or 4)
    pub knockout_qualifiers: usize,

    /// Play a third-place match when there are semifinals
    pub third_place_match: bool,

    /// Match length in seconds
    pub match_duration_secs: u32,

    /// Attempt knockout progression after every completed match
    pub auto_advance: bool,
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl TournamentConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `TOURNAMENT_KNOCKOUT_QUALIFIERS`: 2 or 4 (default: 2)
    /// - `TOURNAMENT_THIRD_PLACE_MATCH`: true/false (default: false)
    /// - `TOURNAMENT_MATCH_DURATION_SECS`: match length (default: 600)
    /// - `TOURNAMENT_AUTO_ADVANCE`: true/false (default: true)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            knockout_qualifiers: parse_env_or("TOURNAMENT_KNOCKOUT_QUALIFIERS", 2),
            third_place_match: parse_env_or("TOURNAMENT_THIRD_PLACE_MATCH", false),
            match_duration_secs: parse_env_or(
                "TOURNAMENT_MATCH_DURATION_SECS",
                DEFAULT_MATCH_DURATION_SECS,
            ),
            auto_advance: parse_env_or("TOURNAMENT_AUTO_ADVANCE", true),
        }
    }

    /// Check the values describe a playable format
    pub fn validate(&self) -> TournamentResult<()> {
        if self.knockout_qualifiers != 2 && self.knockout_qualifiers != 4 {
            return Err(TournamentError::InvalidFormat(format!(
                "knockout qualifiers must be 2 or 4, got {}",
                self.knockout_qualifiers
            )));
        }
        if self.third_place_match && self.knockout_qualifiers < 4 {
            return Err(TournamentError::InvalidFormat(
                "a third-place match needs semifinals".to_string(),
            ));
        }
        if self.match_duration_secs == 0 {
            return Err(TournamentError::InvalidFormat(
                "match duration must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Format stored on new tournaments
    pub fn format(&self) -> TournamentFormat {
        TournamentFormat {
            knockout_qualifiers: self.knockout_qualifiers,
            third_place_match: self.third_place_match,
            match_duration_secs: self.match_duration_secs,
        }
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            knockout_qualifiers: 2,
            third_place_match: false,
            match_duration_secs: DEFAULT_MATCH_DURATION_SECS,
            auto_advance: true,
        }
    }
}
