//! Trophy ledger and player statistics
//!
//! Persisted to LocalStorage, tracks the trophy total, lifetime statistics
//! and the most recent games.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::{Difficulty, GameConfig};
use crate::error::Result;
use crate::persistence;
use crate::report::{GameResult, ReportOutcome, ResultReporter};

/// Number of recent games kept for the profile screen
pub const MAX_HISTORY: usize = 7;

/// Trophies at stake per difficulty
pub fn base_trophies(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Basic => 5,
        Difficulty::Medium => 10,
        Difficulty::Advanced => 15,
        Difficulty::Unknown => 5,
    }
}

/// Reward multiplier for lives left at the end of a win
pub fn life_multiplier(lives_left: u32) -> f64 {
    match lives_left {
        2 => 1.2,
        3 => 1.5,
        4 => 2.0,
        5 => 2.5,
        6 => 3.0,
        _ => 1.0,
    }
}

/// Trophy change for a finished game given the player's current total
///
/// Wins earn the base plus a speed bonus, scaled by remaining lives. Losses
/// cost the base, but never push the total below zero.
pub fn trophy_change(result: &GameResult, current_trophies: i64) -> i64 {
    let base = base_trophies(result.difficulty);
    if !result.won {
        return -base.min(current_trophies.max(0));
    }

    let config = GameConfig::for_difficulty(result.difficulty);
    let lives_left = config.max_attempts.saturating_sub(result.attempts_used);
    let max_time = config.max_time_seconds as f64;
    let time_bonus = ((max_time - result.time_taken as f64) / max_time * base as f64).max(0.0);

    ((base as f64 + time_bonus) * life_multiplier(lives_left)).floor() as i64
}

/// A finished game on the profile screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub difficulty: Difficulty,
    pub won: bool,
    pub attempts_used: u32,
    pub time_taken: u32,
    /// Signed change (negative for losses)
    pub trophies_change: i64,
    /// Unix timestamp (ms)
    pub timestamp: f64,
}

/// Trophy total and lifetime statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrophyLedger {
    pub trophies: i64,
    pub total_games: u32,
    pub total_wins: u32,
    pub total_losses: u32,
    /// Seconds
    pub total_time_played: f64,
    /// Games played per difficulty
    pub games_by_difficulty: BTreeMap<Difficulty, u32>,
    /// Newest first
    pub history: Vec<GameRecord>,
}

impl TrophyLedger {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "creature_match_trophies";

    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a finished game. Returns the outcome shown to the player.
    pub fn record(&mut self, result: &GameResult, timestamp: f64) -> ReportOutcome {
        let change = trophy_change(result, self.trophies);
        self.trophies = (self.trophies + change).max(0);

        self.total_games += 1;
        self.total_time_played += result.time_taken as f64;
        if result.won {
            self.total_wins += 1;
        } else {
            self.total_losses += 1;
        }
        *self.games_by_difficulty.entry(result.difficulty).or_default() += 1;

        self.history.insert(
            0,
            GameRecord {
                difficulty: result.difficulty,
                won: result.won,
                attempts_used: result.attempts_used,
                time_taken: result.time_taken,
                trophies_change: change,
                timestamp,
            },
        );
        self.history.truncate(MAX_HISTORY);

        ReportOutcome {
            success: true,
            trophies_earned: change,
            total_trophies: self.trophies,
        }
    }

    /// Average seconds per game, rounded to two decimals
    pub fn average_time(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        (self.total_time_played / self.total_games as f64 * 100.0).round() / 100.0
    }

    /// Percentage of games won
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        self.total_wins as f64 / self.total_games as f64 * 100.0
    }

    /// Difficulty played most often (basic when no games were played)
    pub fn most_played(&self) -> Difficulty {
        self.games_by_difficulty
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(d, _)| *d)
            .unwrap_or_default()
    }

    /// Player level from games played
    pub fn level(&self) -> u32 {
        (self.total_games as f64).sqrt().floor() as u32
    }

    /// Load the ledger from storage (WASM) or start fresh
    pub fn load() -> Self {
        match persistence::load::<TrophyLedger>(Self::STORAGE_KEY) {
            Some(ledger) => {
                log::info!(
                    "Loaded trophy ledger: {} trophies over {} games",
                    ledger.trophies,
                    ledger.total_games
                );
                ledger
            }
            None => {
                log::info!("No trophy ledger found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self) {
        if persistence::save(Self::STORAGE_KEY, self) {
            log::info!("Trophy ledger saved ({} games)", self.total_games);
        }
    }
}

impl ResultReporter for TrophyLedger {
    fn report(&mut self, result: &GameResult) -> Result<Option<ReportOutcome>> {
        let outcome = self.record(result, crate::platform::now_ms());
        self.save();
        Ok(Some(outcome))
    }
}

/// Shared ledger, so the caller can read statistics after the match reports
impl ResultReporter for Rc<RefCell<TrophyLedger>> {
    fn report(&mut self, result: &GameResult) -> Result<Option<ReportOutcome>> {
        self.borrow_mut().report(result)
    }
}
