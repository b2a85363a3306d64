//! Creature Match - a memory-matching card game
//!
//! Core modules:
//! - `sim`: Match controller (deck state, countdown, flip resolution)
//! - `cards`: Creatures, deck building, card sources
//! - `report`: Result reporting contract
//! - `trophies`: Local trophy ledger and player statistics
//! - `session`: Input port and presentation wiring
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: LocalStorage JSON storage

pub mod audio;
pub mod cards;
pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod report;
pub mod session;
pub mod settings;
pub mod sim;
pub mod trophies;

pub use cards::{CardSlot, Creature, Deck, build_deck};
pub use config::{Difficulty, GameConfig};
pub use error::{GameError, Result};
pub use report::{GameResult, ReportOutcome, ResultReporter};
pub use session::{FrameClock, Presentation, Session, deal_match};
pub use settings::Settings;
pub use sim::{EndReason, GameEvent, GamePhase, GameState, MatchGame};
pub use trophies::TrophyLedger;

/// Game configuration constants
pub mod consts {
    /// Distinct creatures on a standard board
    pub const DEFAULT_PAIR_COUNT: usize = 8;

    /// Pause after the second flip before the pair is checked (ms)
    pub const SETTLE_DELAY_MS: u64 = 500;
    /// Pause before mismatched cards turn face down (ms)
    pub const UNFLIP_DELAY_MS: u64 = 1000;
    /// Pause between the final match and the win screen (ms)
    pub const WIN_DELAY_MS: u64 = 500;
    /// Cascade step while the preview reveals the board (ms)
    pub const PREVIEW_STAGGER_MS: u64 = 100;
    /// Countdown resolution (ms)
    pub const TICK_INTERVAL_MS: u64 = 1000;

    /// Delay before the trophy popup follows the end-of-game dialog (ms)
    pub const TROPHY_POPUP_DELAY_MS: u64 = 1500;
}
