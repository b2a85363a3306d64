//! Difficulty presets and per-match configuration
//!
//! The preset table is fixed at compile time and validated before use. Any
//! difficulty name that is not recognised resolves to the default row.

use serde::{Deserialize, Serialize};

use crate::cards::MAX_PAIR_COUNT;
use crate::consts::*;
use crate::error::{GameError, Result};

/// Difficulty levels offered on the selection screen
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Basic,
    Medium,
    Advanced,
    /// Anything else; uses the default preset row
    Unknown,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Medium => "medium",
            Difficulty::Advanced => "advanced",
            Difficulty::Unknown => "unknown",
        }
    }

    /// Parse a difficulty name (never fails; unrecognised names are `Unknown`)
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "basic" => Difficulty::Basic,
            "medium" | "med" => Difficulty::Medium,
            "advanced" => Difficulty::Advanced,
            _ => Difficulty::Unknown,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Basic => "Basic",
            Difficulty::Medium => "Medium",
            Difficulty::Advanced => "Advanced",
            Difficulty::Unknown => "Custom",
        }
    }

    /// Preset row for this difficulty
    pub fn preset(&self) -> &'static Preset {
        PRESETS.lookup(*self)
    }
}

/// One row of the difficulty table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub max_attempts: u32,
    pub max_time_seconds: u32,
    pub preview_duration_ms: u64,
}

/// Enumerated difficulty table with an explicit default row
#[derive(Debug)]
pub struct PresetTable {
    pub basic: Preset,
    pub medium: Preset,
    pub advanced: Preset,
    pub fallback: Preset,
}

pub static PRESETS: PresetTable = PresetTable {
    basic: Preset {
        max_attempts: 6,
        max_time_seconds: 180,
        preview_duration_ms: 10_000,
    },
    medium: Preset {
        max_attempts: 4,
        max_time_seconds: 120,
        preview_duration_ms: 7_000,
    },
    advanced: Preset {
        max_attempts: 2,
        max_time_seconds: 60,
        preview_duration_ms: 5_000,
    },
    fallback: Preset {
        max_attempts: 6,
        max_time_seconds: 60,
        preview_duration_ms: 3_000,
    },
};

impl PresetTable {
    pub fn lookup(&self, difficulty: Difficulty) -> &Preset {
        match difficulty {
            Difficulty::Basic => &self.basic,
            Difficulty::Medium => &self.medium,
            Difficulty::Advanced => &self.advanced,
            Difficulty::Unknown => &self.fallback,
        }
    }

    /// Every row must grant at least one attempt and one second
    pub fn validate(&self) -> Result<()> {
        for (name, row) in [
            ("basic", &self.basic),
            ("medium", &self.medium),
            ("advanced", &self.advanced),
            ("default", &self.fallback),
        ] {
            if row.max_attempts == 0 || row.max_time_seconds == 0 {
                return Err(GameError::InvalidConfig(format!(
                    "preset '{name}' has an empty attempt or time budget"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for a single match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub max_attempts: u32,
    pub max_time_seconds: u32,
    pub preview_duration_ms: u64,
    /// Number of distinct creatures on the board
    pub pair_count: usize,
    /// Pause after the second flip before the pair is checked
    pub settle_delay_ms: u64,
    /// Pause before mismatched cards turn face down
    pub unflip_delay_ms: u64,
    /// Pause between the last match and the win screen
    pub win_delay_ms: u64,
    /// Cascade step during the preview reveal
    pub preview_stagger_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Basic)
    }
}

impl GameConfig {
    /// Build the configuration for a difficulty from the preset table
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let preset = difficulty.preset();
        Self {
            difficulty,
            max_attempts: preset.max_attempts,
            max_time_seconds: preset.max_time_seconds,
            preview_duration_ms: preset.preview_duration_ms,
            pair_count: DEFAULT_PAIR_COUNT,
            settle_delay_ms: SETTLE_DELAY_MS,
            unflip_delay_ms: UNFLIP_DELAY_MS,
            win_delay_ms: WIN_DELAY_MS,
            preview_stagger_ms: PREVIEW_STAGGER_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }

    /// Build the configuration from a difficulty name (e.g. a URL parameter)
    pub fn from_name(name: &str) -> Self {
        Self::for_difficulty(Difficulty::parse(name))
    }

    pub fn with_pair_count(mut self, pair_count: usize) -> Self {
        self.pair_count = pair_count;
        self
    }

    pub fn validate(&self) -> Result<()> {
        PRESETS.validate()?;
        if self.pair_count == 0 {
            return Err(GameError::InvalidConfig("pair_count must be at least 1".into()));
        }
        // The fallback roster must be able to fill any board on its own
        if self.pair_count > MAX_PAIR_COUNT {
            return Err(GameError::InvalidConfig(format!(
                "pair_count {} exceeds the {MAX_PAIR_COUNT} creatures available offline",
                self.pair_count
            )));
        }
        if self.max_attempts == 0 {
            return Err(GameError::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if self.max_time_seconds == 0 {
            return Err(GameError::InvalidConfig(
                "max_time_seconds must be at least 1".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(GameError::InvalidConfig("tick_interval_ms must be non-zero".into()));
        }
        Ok(())
    }

    /// Deck size for this configuration
    pub fn card_count(&self) -> usize {
        self.pair_count * 2
    }
}
