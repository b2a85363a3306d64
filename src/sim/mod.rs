//! Match simulation
//!
//! All gameplay logic lives here, with no rendering or network dependencies:
//! - Time only advances through the virtual-clock scheduler
//! - Randomness only enters through the deck builder
//! - State changes are reported as `GameEvent`s

pub mod game;
pub mod scheduler;
pub mod state;

pub use game::{MatchGame, Timer};
pub use scheduler::{Scheduler, TimerId};
pub use state::{EndReason, GameEvent, GamePhase, GameState, format_time};
