//! Sound cues and playback
//!
//! Cues are emitted by the match as events. In the browser they are played
//! with procedurally generated Web Audio tones - no external files needed.
//! Native builds only log them.

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Card turned face up
    Flip,
    /// Pair found
    Match,
    /// Pair did not match
    Mismatch,
    /// All pairs found
    Win,
    /// Out of time or lives
    Lose,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Flip => "flip",
            SoundCue::Match => "match",
            SoundCue::Mismatch => "mismatch",
            SoundCue::Win => "win",
            SoundCue::Lose => "lose",
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self {
            volume: 0.8,
            muted: false,
        }
    }

    /// Set volume (0.0 - 1.0)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn play(&self, cue: SoundCue) {
        if self.effective_volume() > 0.0 {
            log::debug!("Sound: {}", cue.as_str());
        }
    }

    /// Play a sound cue
    #[cfg(target_arch = "wasm32")]
    pub fn play(&self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            SoundCue::Flip => self.play_flip(ctx, vol),
            SoundCue::Match => self.play_match(ctx, vol),
            SoundCue::Mismatch => self.play_mismatch(ctx, vol),
            SoundCue::Win => self.play_win(ctx, vol),
            SoundCue::Lose => self.play_lose(ctx, vol),
        }
    }

    /// Create an oscillator with gain envelope
    #[cfg(target_arch = "wasm32")]
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Flip - short papery tick
    #[cfg(target_arch = "wasm32")]
    fn play_flip(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 520.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.06)
            .ok();
        osc.frequency().set_value_at_time(520.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(780.0, t + 0.05)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.08).ok();
    }

    /// Match - bright two-note chime
    #[cfg(target_arch = "wasm32")]
    fn play_match(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [660.0, 880.0].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }
    }

    /// Mismatch - low buzz dropping in pitch
    #[cfg(target_arch = "wasm32")]
    fn play_mismatch(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 220.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.3)
            .ok();
        osc.frequency().set_value_at_time(220.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(110.0, t + 0.3)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.35).ok();
    }

    /// Win - rising major arpeggio, last note held
    #[cfg(target_arch = "wasm32")]
    fn play_win(&self, ctx: &AudioContext, vol: f32) {
        const NOTES: [f32; 4] = [523.25, 659.25, 783.99, 1046.5];
        for (i, freq) in NOTES.iter().enumerate() {
            let last = i == NOTES.len() - 1;
            let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Square) else {
                continue;
            };
            let t = ctx.current_time() + i as f64 * 0.12;
            let hold = if last { 0.6 } else { 0.1 };

            // Soft attack keeps the square wave from clicking
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().linear_ramp_to_value_at_time(vol * 0.12, t + 0.02).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + hold)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + hold + 0.05).ok();
        }
    }

    /// Lose - long sliding groan ending in a low thud
    #[cfg(target_arch = "wasm32")]
    fn play_lose(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        if let Some((osc, gain)) = self.create_osc(ctx, 330.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.18, t).ok();
            gain.gain().linear_ramp_to_value_at_time(vol * 0.1, t + 0.5).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.75)
                .ok();
            osc.frequency().set_value_at_time(330.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(98.0, t + 0.7)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.8).ok();
        }
        if let Some((osc, gain)) = self.create_osc(ctx, 65.0, OscillatorType::Sine) {
            let hit = t + 0.7;
            gain.gain().set_value_at_time(vol * 0.4, hit).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, hit + 0.25)
                .ok();
            osc.start_with_when(hit).ok();
            osc.stop_with_when(hit + 0.3).ok();
        }
    }
}
