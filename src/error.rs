//! Error types for Creature Match

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// Card source could not deliver creatures (recovered with the fallback list)
    #[error("Card source unavailable: {0}")]
    SourceUnavailable(String),

    /// Deck inputs are inconsistent (fatal to game initialization)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Result reporter failed (logged only)
    #[error("Reporting failed: {0}")]
    Reporting(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GameError {
    /// Message shown to the player when initialization fails
    pub fn player_message(&self) -> &'static str {
        match self {
            GameError::InvalidInput(_) | GameError::InvalidConfig(_) => {
                "Error loading the game. Please reload the page."
            }
            GameError::SourceUnavailable(_) => "Could not reach the creature catalog.",
            GameError::Reporting(_) => "Could not save the game result.",
            GameError::Serialization(_) => "Unexpected data from the server.",
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
