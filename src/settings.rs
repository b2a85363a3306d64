//! Player preferences
//!
//! Persisted separately from the trophy ledger in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::persistence;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Play sound cues
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Reveal the board before the first flip
    pub preview_enabled: bool,
    /// Last difficulty picked on the selection screen
    pub difficulty: Difficulty,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            master_volume: 0.8,
            preview_enabled: true,
            difficulty: Difficulty::Basic,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "creature_match_settings";

    /// Flip the sound preference and persist it. Returns the new value.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.save();
        log::info!(
            "Sound {}",
            if self.sound_enabled { "enabled" } else { "disabled" }
        );
        self.sound_enabled
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Load settings from storage, falling back to defaults
    pub fn load() -> Self {
        match persistence::load::<Settings>(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from storage");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if persistence::save(Self::STORAGE_KEY, self) {
            log::debug!("Settings saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_sound() {
        let mut settings = Settings::default();
        assert!(settings.sound_enabled);
        assert!(!settings.toggle_sound());
        assert!(!settings.sound_enabled);
        assert!(settings.toggle_sound());
        assert!(settings.sound_enabled);
    }

    #[test]
    fn test_volume_clamped() {
        let mut settings = Settings::default();
        settings.set_master_volume(3.0);
        assert_eq!(settings.master_volume, 1.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"sound_enabled":false}"#).unwrap();
        assert!(!settings.sound_enabled);
        assert!(settings.preview_enabled);
        assert_eq!(settings.difficulty, Difficulty::Basic);
    }
}
