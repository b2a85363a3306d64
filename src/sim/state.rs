//! Game state and events
//!
//! Everything the board needs to render lives in `GameState`; the match
//! controller is the only writer.

use serde::{Deserialize, Serialize};

use crate::audio::SoundCue;
use crate::cards::Deck;
use crate::config::GameConfig;

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Board dealt, countdown not running
    NotStarted,
    /// All cards revealed for memorising, input locked
    Preview,
    /// Countdown running
    Running,
    Won,
    LostTimeUp,
    LostNoLives,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GamePhase::Won | GamePhase::LostTimeUp | GamePhase::LostNoLives
        )
    }
}

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    #[default]
    None,
    Win,
    TimeUp,
    NoLives,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::None => "none",
            EndReason::Win => "win",
            EndReason::TimeUp => "time_up",
            EndReason::NoLives => "no_lives",
        }
    }

    /// Title and message for the end-of-game dialog
    pub fn headline(&self) -> (&'static str, &'static str) {
        match self {
            EndReason::Win => ("Congratulations!", "You found every pair."),
            EndReason::TimeUp => ("Time's Up", "You ran out of time. Try again!"),
            EndReason::NoLives => ("Out of Lives", "You ran out of attempts. Keep practising!"),
            EndReason::None => ("", ""),
        }
    }
}

/// Something the presentation layer should react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    CardFlipped { slot: usize },
    CardsHidden { slots: Vec<usize> },
    PairMatched { first: usize, second: usize },
    HeartsChanged { attempts_left: u32, max_attempts: u32 },
    TimeChanged { time_left: u32 },
    PairsChanged { matched_pairs: u32, pair_count: u32 },
    PreviewStarted,
    PreviewEnded,
    GameEnded { reason: EndReason, won: bool },
    TrophyResult { trophies_earned: i64, total_trophies: i64 },
    Sound(SoundCue),
}

/// Complete match state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub deck: Deck,
    pub phase: GamePhase,
    pub attempts_left: u32,
    /// Seconds remaining on the countdown
    pub time_left: u32,
    pub matched_pairs: u32,
    /// Face-up cards awaiting resolution (at most two)
    pub selection: Vec<usize>,
    pub started: bool,
    pub completed: bool,
    pub end_reason: EndReason,
    /// The preview reveal has already been shown this match
    pub preview_done: bool,
}

impl GameState {
    pub fn new(config: &GameConfig, deck: Deck) -> Self {
        Self {
            deck,
            phase: GamePhase::NotStarted,
            attempts_left: config.max_attempts,
            time_left: config.max_time_seconds,
            matched_pairs: 0,
            selection: Vec::with_capacity(2),
            started: false,
            completed: false,
            end_reason: EndReason::None,
            preview_done: false,
        }
    }

    pub fn pair_count(&self) -> u32 {
        self.deck.pair_count() as u32
    }

    pub fn all_pairs_matched(&self) -> bool {
        self.matched_pairs >= self.pair_count()
    }
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
