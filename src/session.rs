use std::time::Instant;

use crate::countdown::ROUND_SECONDS;
use crate::prompt::RoundPrompt;
use crate::util::{mean, std_dev};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum_macros::Display)]
pub enum GameStatus {
    #[default]
    #[strum(serialize = "not started")]
    NotStarted,
    #[strum(serialize = "playing")]
    Playing,
    #[strum(serialize = "finished")]
    Finished,
}

/// Result of the most recent scoring event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    Hit { reaction_ms: u64, points: i64 },
    Miss,
    Timeout,
}

impl RoundOutcome {
    pub fn delta(&self) -> i64 {
        match self {
            RoundOutcome::Hit { points, .. } => *points,
            RoundOutcome::Miss => -crate::engine::MISS_PENALTY,
            RoundOutcome::Timeout => -crate::engine::TIMEOUT_PENALTY,
        }
    }
}

/// Per-session tally behind the end of game summary. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundHistory {
    pub hits: u32,
    pub misses: u32,
    pub timeouts: u32,
    pub reaction_times_ms: Vec<u64>,
    /// Score after each resolved round, indexed from round 1
    pub score_timeline: Vec<i64>,
}

impl RoundHistory {
    pub fn record(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Hit { reaction_ms, .. } => {
                self.hits += 1;
                self.reaction_times_ms.push(reaction_ms);
            }
            RoundOutcome::Miss => self.misses += 1,
            RoundOutcome::Timeout => self.timeouts += 1,
        }
    }
}

/// Mutable state of one play session
#[derive(Debug, Clone)]
pub struct GameSession {
    pub status: GameStatus,
    pub round_index: u32,
    pub current_prompt: Option<RoundPrompt>,
    pub time_left: u8,
    pub score: i64,
    pub round_started_at: Option<Instant>,
    pub last_outcome: Option<RoundOutcome>,
    pub history: RoundHistory,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            status: GameStatus::NotStarted,
            round_index: 0,
            current_prompt: None,
            time_left: ROUND_SECONDS,
            score: 0,
            round_started_at: None,
            last_outcome: None,
            history: RoundHistory::default(),
        }
    }
}

/// Read-only snapshot handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameView {
    pub status: GameStatus,
    pub word: Option<&'static str>,
    pub required_key: Option<char>,
    pub time_left: u8,
    pub score: i64,
    pub round_index: u32,
    pub total_rounds: u32,
    pub last_outcome: Option<RoundOutcome>,
}

impl GameView {
    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub score: i64,
    pub hits: u32,
    pub misses: u32,
    pub timeouts: u32,
    pub mean_reaction_ms: Option<f64>,
    pub reaction_std_dev_ms: Option<f64>,
    pub best_reaction_ms: Option<u64>,
    pub score_timeline: Vec<i64>,
}

impl GameSummary {
    pub fn from_session(session: &GameSession) -> Self {
        let history = &session.history;
        let reactions: Vec<f64> = history
            .reaction_times_ms
            .iter()
            .map(|&ms| ms as f64)
            .collect();

        Self {
            score: session.score,
            hits: history.hits,
            misses: history.misses,
            timeouts: history.timeouts,
            mean_reaction_ms: mean(&reactions),
            reaction_std_dev_ms: std_dev(&reactions),
            best_reaction_ms: history.reaction_times_ms.iter().copied().min(),
            score_timeline: history.score_timeline.clone(),
        }
    }
}
