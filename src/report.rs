//! Result reporting contract
//!
//! A finished match is handed to a `ResultReporter` exactly once. The
//! reporter only feeds the post-game trophy summary; it never touches
//! gameplay state.

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::error::{GameError, Result};

/// Outcome of a finished match (also the JSON request body)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub difficulty: Difficulty,
    pub won: bool,
    pub attempts_used: u32,
    /// Seconds spent on the countdown
    pub time_taken: u32,
}

impl GameResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Reporter answer (also the JSON response body)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportOutcome {
    pub success: bool,
    /// Signed: negative when trophies were lost
    pub trophies_earned: i64,
    pub total_trophies: i64,
}

impl ReportOutcome {
    /// Parse a response body; a body that reports failure becomes `Reporting`
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(flatten)]
            outcome: ReportOutcome,
            error: Option<String>,
        }
        let envelope: Envelope = serde_json::from_str(json)?;
        if envelope.outcome.success {
            Ok(envelope.outcome)
        } else {
            Err(GameError::Reporting(
                envelope.error.unwrap_or_else(|| "server rejected the result".into()),
            ))
        }
    }
}

/// Persists a finished match and answers with a trophy delta
pub trait ResultReporter {
    /// `Ok(None)` means the outcome will be delivered out of band
    fn report(&mut self, result: &GameResult) -> Result<Option<ReportOutcome>>;
}

/// Reporter that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ResultReporter for NoopReporter {
    fn report(&mut self, result: &GameResult) -> Result<Option<ReportOutcome>> {
        log::debug!("Discarding result: {result:?}");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let result = GameResult {
            difficulty: Difficulty::Medium,
            won: true,
            attempts_used: 1,
            time_taken: 42,
        };
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "difficulty": "medium",
                "won": true,
                "attempts_used": 1,
                "time_taken": 42
            })
        );
    }

    #[test]
    fn test_parse_success_response() {
        let json = r#"{"success":true,"trophies_earned":-5,"total_trophies":20,"won":false,"previous_trophies":25}"#;
        let outcome = ReportOutcome::from_json(json).unwrap();
        assert_eq!(outcome.trophies_earned, -5);
        assert_eq!(outcome.total_trophies, 20);
    }

    #[test]
    fn test_parse_failure_response() {
        let err = ReportOutcome::from_json(r#"{"success":false,"error":"db down"}"#).unwrap_err();
        match err {
            GameError::Reporting(msg) => assert_eq!(msg, "db down"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
