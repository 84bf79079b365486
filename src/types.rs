use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type PlayerId = String;
pub type CategoryId = String;
pub type PromptId = String;

/// Separator between accepted spellings inside one canonical answer group
pub const GROUP_DELIMITER: char = '|';
/// Trailing marker on a spelling that must not lose its final vowel when stemmed
pub const STRICT_MARKER: char = '.';

/// Current unix time in milliseconds, the authoritative server clock.
pub fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Waiting,
    Playing,
    RoundEnded,
    Finished,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    Connected,
    Playing,
    Ready,
    Disconnected,
}

/// How two answers were judged equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    Exact,
    Plural,
    Gender,
    Synonym,
    StemSimilar,
}

/// One equivalence found between a player's answer and an opponent's
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMatch {
    pub player_id: PlayerId,
    pub word: String,
    pub kind: MatchKind,
}

/// A submitted answer with every match it accumulated during scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub text: String,
    pub matches: Vec<AnswerMatch>,
}

impl ScoredAnswer {
    pub fn unmatched(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            matches: Vec::new(),
        }
    }
}

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 20;

pub const DEFAULT_COUNTDOWN_MILLIS: i64 = 5_000;
pub const DEFAULT_ROUND_MILLIS: i64 = 60_000;
pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

pub const ROUND_MILLIS_MIN: i64 = 15_000;
pub const ROUND_MILLIS_MAX: i64 = 300_000;
pub const TOTAL_ROUNDS_MIN: u32 = 1;
pub const TOTAL_ROUNDS_MAX: u32 = 20;

/// Substitute the default when a requested round duration is out of range.
pub fn sanitize_round_millis(requested: Option<i64>) -> i64 {
    match requested {
        Some(ms) if (ROUND_MILLIS_MIN..=ROUND_MILLIS_MAX).contains(&ms) => ms,
        _ => DEFAULT_ROUND_MILLIS,
    }
}

/// Substitute the default when a requested round count is out of range.
pub fn sanitize_total_rounds(requested: Option<u32>) -> u32 {
    match requested {
        Some(n) if (TOTAL_ROUNDS_MIN..=TOTAL_ROUNDS_MAX).contains(&n) => n,
        _ => DEFAULT_TOTAL_ROUNDS,
    }
}

/// Per-session gameplay bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub min_players: usize,
    pub max_players: usize,
    pub max_words_per_player: usize,
    pub max_word_length: usize,
    /// Remaining-time threshold below which clients render the hurry-up state
    pub hurry_up_millis: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 10,
            max_words_per_player: 5,
            max_word_length: 30,
            hurry_up_millis: 10_000,
        }
    }
}

impl SessionConfig {
    /// Replace out-of-range fields with defaults; malformed input never
    /// rejects a config, it just falls back.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            min_players: in_range_or(self.min_players, 1..=50, defaults.min_players),
            max_players: in_range_or(self.max_players, 2..=50, defaults.max_players),
            max_words_per_player: in_range_or(
                self.max_words_per_player,
                1..=20,
                defaults.max_words_per_player,
            ),
            max_word_length: in_range_or(self.max_word_length, 2..=64, defaults.max_word_length),
            hurry_up_millis: if (1_000..=60_000).contains(&self.hurry_up_millis) {
                self.hurry_up_millis
            } else {
                defaults.hurry_up_millis
            },
        }
    }
}

fn in_range_or(value: usize, range: std::ops::RangeInclusive<usize>, fallback: usize) -> usize {
    if range.contains(&value) {
        value
    } else {
        fallback
    }
}

/// Partial config update; absent fields keep their current value, present
/// but out-of-range fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub min_players: Option<usize>,
    pub max_players: Option<usize>,
    pub max_words_per_player: Option<usize>,
    pub max_word_length: Option<usize>,
    pub hurry_up_millis: Option<i64>,
    pub countdown_millis: Option<i64>,
    pub round_millis: Option<i64>,
    pub total_rounds: Option<u32>,
}

/// Visual identity shown next to a player's name; not gameplay-relevant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColors {
    pub body: String,
    pub accent: String,
}

/// One scored round from a single player's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRoundEntry {
    pub round: u32,
    pub answers: Vec<ScoredAnswer>,
    pub delta: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub colors: PlayerColors,
    pub score: u32,
    pub status: PlayerStatus,
    pub current_answers: Vec<String>,
    pub round_history: Vec<PlayerRoundEntry>,
}

impl Player {
    /// Disconnected players are kept for reconnection but take no part in
    /// minimum-player checks or scoring.
    pub fn is_active(&self) -> bool {
        self.status != PlayerStatus::Disconnected
    }
}

/// The canonical answer set for the active round.
///
/// Each entry in `canonical_answers` is one accepted concept: spellings
/// joined by [`GROUP_DELIMITER`], the first being the canonical form, any of
/// them optionally carrying a trailing [`STRICT_MARKER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundContext {
    pub prompt_id: PromptId,
    pub question: String,
    pub canonical_answers: Vec<String>,
}

/// Append-only per-round summary kept on the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub prompt_id: PromptId,
    pub question: String,
    pub deltas: HashMap<PlayerId, u32>,
    pub ended_at: i64,
}

/// Snapshot appended when a game runs to completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub rounds_played: u32,
    pub final_scores: HashMap<PlayerId, u32>,
    pub finished_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Bumped on every committed mutation; the store rejects stale saves
    pub version: u64,
    pub status: SessionStatus,
    /// Monotonic, starts at 0, incremented by each round start
    pub round: u32,
    pub total_rounds: u32,
    pub selected_category: Option<CategoryId>,
    pub current_prompt_id: Option<PromptId>,
    /// Source material for the round's equivalence dictionary; the
    /// dictionary itself is derived and never persisted
    pub round_context: Option<RoundContext>,
    pub countdown_starts_at: Option<i64>,
    pub round_starts_at: Option<i64>,
    pub round_ends_at: Option<i64>,
    pub countdown_millis: i64,
    pub round_millis: i64,
    pub config: SessionConfig,
    pub players: HashMap<PlayerId, Player>,
    pub round_history: Vec<RoundSummary>,
    pub game_history: Vec<GameSummary>,
    pub updated_at: i64,
}

impl Session {
    pub fn new(id: SessionId, config: SessionConfig) -> Self {
        Self {
            id,
            version: 0,
            status: SessionStatus::Waiting,
            round: 0,
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            selected_category: None,
            current_prompt_id: None,
            round_context: None,
            countdown_starts_at: None,
            round_starts_at: None,
            round_ends_at: None,
            countdown_millis: DEFAULT_COUNTDOWN_MILLIS,
            round_millis: DEFAULT_ROUND_MILLIS,
            config: config.sanitized(),
            players: HashMap::new(),
            round_history: Vec::new(),
            game_history: Vec::new(),
            updated_at: unix_millis(),
        }
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_active())
    }

    pub fn active_player_count(&self) -> usize {
        self.active_players().count()
    }

    pub fn clear_timers(&mut self) {
        self.countdown_starts_at = None;
        self.round_starts_at = None;
        self.round_ends_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_config_falls_back_to_defaults() {
        let config = SessionConfig {
            min_players: 0,
            max_players: 500,
            max_words_per_player: 0,
            max_word_length: 1,
            hurry_up_millis: -5,
        }
        .sanitized();

        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn in_range_config_is_kept() {
        let config = SessionConfig {
            min_players: 3,
            max_players: 6,
            max_words_per_player: 8,
            max_word_length: 12,
            hurry_up_millis: 5_000,
        };
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn round_duration_sanitizing() {
        assert_eq!(sanitize_round_millis(Some(30_000)), 30_000);
        assert_eq!(sanitize_round_millis(Some(5)), DEFAULT_ROUND_MILLIS);
        assert_eq!(sanitize_round_millis(None), DEFAULT_ROUND_MILLIS);
        assert_eq!(sanitize_total_rounds(Some(3)), 3);
        assert_eq!(sanitize_total_rounds(Some(900)), DEFAULT_TOTAL_ROUNDS);
    }
}
