//! Session wiring: one match, the player's settings and a presentation layer
//!
//! The session is the input port for the board (`on_card_clicked`,
//! `on_sound_toggle_requested`) and forwards everything the match emits to
//! a `Presentation` implementation.

use rand::Rng;

use crate::audio::SoundCue;
use crate::cards::{CardSource, build_deck, load_creatures};
use crate::config::GameConfig;
use crate::error::Result;
use crate::report::ResultReporter;
use crate::settings::Settings;
use crate::sim::{EndReason, GameEvent, MatchGame};

/// Rendering side of the game
///
/// Only the counters and the end of the match are required; card-level
/// hooks default to no-ops.
pub trait Presentation {
    fn on_hearts_changed(&mut self, attempts_left: u32, max_attempts: u32);
    fn on_time_changed(&mut self, time_left: u32);
    fn on_pairs_changed(&mut self, matched_pairs: u32, pair_count: u32);
    fn on_game_ended(&mut self, reason: EndReason, won: bool);
    fn on_trophy_result(&mut self, trophies_earned: i64, total_trophies: i64);

    fn on_card_flipped(&mut self, _slot: usize) {}
    fn on_cards_hidden(&mut self, _slots: &[usize]) {}
    fn on_pair_matched(&mut self, _first: usize, _second: usize) {}
    fn on_preview(&mut self, _active: bool) {}
    fn on_sound(&mut self, _cue: SoundCue) {}
    fn on_sound_toggled(&mut self, _enabled: bool) {}
}

/// Deal a new match: fetch creatures (falling back when the source is down),
/// build and shuffle the deck, and attach the reporter
pub fn deal_match<R: Rng + ?Sized>(
    config: GameConfig,
    source: &mut dyn CardSource,
    rng: &mut R,
    reporter: Box<dyn ResultReporter>,
) -> Result<MatchGame> {
    config.validate()?;
    let creatures = load_creatures(source, config.pair_count, rng)?;
    let deck = build_deck(&creatures, config.pair_count, rng)?;
    MatchGame::new(config, deck, reporter)
}

/// Converts animation-frame timestamps into whole-millisecond clock steps
///
/// Steps are measured from the first frame, so the sub-millisecond part of
/// each frame carries over instead of being dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    origin_ms: Option<f64>,
    emitted_ms: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole milliseconds to advance for a frame at `timestamp_ms`
    pub fn step(&mut self, timestamp_ms: f64) -> u64 {
        let origin = *self.origin_ms.get_or_insert(timestamp_ms);
        let total = (timestamp_ms - origin).max(0.0).floor() as u64;
        let step = total.saturating_sub(self.emitted_ms);
        self.emitted_ms = self.emitted_ms.max(total);
        step
    }
}

pub struct Session<P: Presentation> {
    game: MatchGame,
    settings: Settings,
    presentation: P,
    frame_clock: FrameClock,
}

impl<P: Presentation> Session<P> {
    /// Attach a match to a presentation and push the initial counters
    pub fn new(game: MatchGame, settings: Settings, presentation: P) -> Self {
        let mut session = Self {
            game,
            settings,
            presentation,
            frame_clock: FrameClock::new(),
        };
        session.refresh();
        session
    }

    pub fn game(&self) -> &MatchGame {
        &self.game
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Re-send every counter (after the board is rebuilt)
    pub fn refresh(&mut self) {
        let state = self.game.state();
        let config = self.game.config();
        let (attempts_left, max_attempts) = (state.attempts_left, config.max_attempts);
        let (time_left, matched, pairs) = (state.time_left, state.matched_pairs, state.pair_count());
        self.presentation.on_hearts_changed(attempts_left, max_attempts);
        self.presentation.on_time_changed(time_left);
        self.presentation.on_pairs_changed(matched, pairs);
        self.presentation.on_sound_toggled(self.settings.sound_enabled);
    }

    /// Start the preview reveal if the player wants one
    pub fn begin(&mut self) {
        if self.settings.preview_enabled {
            self.game.begin_preview();
        }
        self.flush();
    }

    /// Board click
    pub fn on_card_clicked(&mut self, slot: usize) -> bool {
        let accepted = self.game.select_card(slot);
        self.flush();
        accepted
    }

    /// Sound button click
    pub fn on_sound_toggle_requested(&mut self) -> bool {
        let enabled = self.settings.toggle_sound();
        self.presentation.on_sound_toggled(enabled);
        enabled
    }

    /// Let `elapsed_ms` of time pass
    pub fn advance(&mut self, elapsed_ms: u64) {
        self.game.advance(elapsed_ms);
        self.flush();
    }

    /// Animation frame at `timestamp_ms` (e.g. the `requestAnimationFrame` time)
    pub fn advance_frame(&mut self, timestamp_ms: f64) {
        let elapsed = self.frame_clock.step(timestamp_ms);
        self.advance(elapsed);
    }

    /// Jump to the next scheduled callback
    pub fn advance_to_next(&mut self) -> bool {
        let fired = self.game.advance_to_next();
        self.flush();
        fired
    }

    /// Deliver pending match events to the presentation
    pub fn flush(&mut self) {
        for event in self.game.drain_events() {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: GameEvent) {
        let p = &mut self.presentation;
        match event {
            GameEvent::CardFlipped { slot } => p.on_card_flipped(slot),
            GameEvent::CardsHidden { slots } => p.on_cards_hidden(&slots),
            GameEvent::PairMatched { first, second } => p.on_pair_matched(first, second),
            GameEvent::HeartsChanged {
                attempts_left,
                max_attempts,
            } => p.on_hearts_changed(attempts_left, max_attempts),
            GameEvent::TimeChanged { time_left } => p.on_time_changed(time_left),
            GameEvent::PairsChanged {
                matched_pairs,
                pair_count,
            } => p.on_pairs_changed(matched_pairs, pair_count),
            GameEvent::PreviewStarted => p.on_preview(true),
            GameEvent::PreviewEnded => p.on_preview(false),
            GameEvent::GameEnded { reason, won } => p.on_game_ended(reason, won),
            GameEvent::TrophyResult {
                trophies_earned,
                total_trophies,
            } => p.on_trophy_result(trophies_earned, total_trophies),
            GameEvent::Sound(cue) => {
                if self.settings.sound_enabled {
                    p.on_sound(cue);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Creature, FallbackSource, MAX_PAIR_COUNT};
    use crate::config::Difficulty;
    use crate::error::GameError;
    use crate::report::NoopReporter;
    use crate::sim::GamePhase;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[derive(Default)]
    struct Board {
        hearts: (u32, u32),
        time: u32,
        pairs: (u32, u32),
        ended: Option<(EndReason, bool)>,
        sounds: Vec<SoundCue>,
        flipped: Vec<usize>,
        preview: Vec<bool>,
        sound_enabled: Option<bool>,
    }

    impl Presentation for Board {
        fn on_hearts_changed(&mut self, attempts_left: u32, max_attempts: u32) {
            self.hearts = (attempts_left, max_attempts);
        }
        fn on_time_changed(&mut self, time_left: u32) {
            self.time = time_left;
        }
        fn on_pairs_changed(&mut self, matched_pairs: u32, pair_count: u32) {
            self.pairs = (matched_pairs, pair_count);
        }
        fn on_game_ended(&mut self, reason: EndReason, won: bool) {
            self.ended = Some((reason, won));
        }
        fn on_trophy_result(&mut self, _earned: i64, _total: i64) {}
        fn on_card_flipped(&mut self, slot: usize) {
            self.flipped.push(slot);
        }
        fn on_preview(&mut self, active: bool) {
            self.preview.push(active);
        }
        fn on_sound(&mut self, cue: SoundCue) {
            self.sounds.push(cue);
        }
        fn on_sound_toggled(&mut self, enabled: bool) {
            self.sound_enabled = Some(enabled);
        }
    }

    fn session(difficulty: Difficulty, preview: bool) -> Session<Board> {
        let mut rng = Pcg32::seed_from_u64(8);
        let config = GameConfig::for_difficulty(difficulty);
        let game = deal_match(
            config,
            &mut FallbackSource::new(3),
            &mut rng,
            Box::new(NoopReporter),
        )
        .unwrap();
        let settings = Settings {
            preview_enabled: preview,
            ..Settings::default()
        };
        Session::new(game, settings, Board::default())
    }

    struct DownSource;

    impl CardSource for DownSource {
        fn fetch_creatures(&mut self, _count: usize) -> Result<Vec<Creature>> {
            Err(GameError::SourceUnavailable("offline".into()))
        }
    }

    #[test]
    fn test_largest_board_deals_offline() {
        let mut rng = Pcg32::seed_from_u64(13);
        let config = GameConfig::default().with_pair_count(MAX_PAIR_COUNT);
        let game = deal_match(config, &mut DownSource, &mut rng, Box::new(NoopReporter)).unwrap();
        assert_eq!(game.state().deck.len(), MAX_PAIR_COUNT * 2);
    }

    #[test]
    fn test_oversized_board_rejected_before_fetching() {
        let mut rng = Pcg32::seed_from_u64(13);
        let config = GameConfig::default().with_pair_count(MAX_PAIR_COUNT + 1);
        let err = deal_match(config, &mut DownSource, &mut rng, Box::new(NoopReporter)).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_initial_counters() {
        let s = session(Difficulty::Medium, false);
        let board = s.presentation();
        assert_eq!(board.hearts, (4, 4));
        assert_eq!(board.time, 120);
        assert_eq!(board.pairs, (0, 8));
        assert_eq!(board.sound_enabled, Some(true));
    }

    #[test]
    fn test_click_flows_to_presentation() {
        let mut s = session(Difficulty::Basic, false);
        s.begin();
        assert!(s.on_card_clicked(5));
        assert_eq!(s.presentation().flipped, vec![5]);
        assert_eq!(s.presentation().sounds, vec![SoundCue::Flip]);
        s.advance(3000);
        assert_eq!(s.presentation().time, 177);
    }

    #[test]
    fn test_sound_toggle_silences_cues() {
        let mut s = session(Difficulty::Basic, false);
        assert!(!s.on_sound_toggle_requested());
        assert_eq!(s.presentation().sound_enabled, Some(false));
        s.on_card_clicked(0);
        assert!(s.presentation().sounds.is_empty());
        assert_eq!(s.presentation().flipped, vec![0]);
    }

    #[test]
    fn test_preview_locks_board() {
        let mut s = session(Difficulty::Advanced, true);
        s.begin();
        assert_eq!(s.presentation().preview, vec![true]);
        assert!(!s.on_card_clicked(0));
        s.advance(1500 + 5000);
        assert_eq!(s.presentation().preview, vec![true, false]);
        assert!(s.on_card_clicked(0));
    }

    #[test]
    fn test_frame_clock_carries_fractions() {
        let mut clock = FrameClock::new();
        let steps: u64 = (0..=60).map(|i| clock.step(1234.5 + i as f64 * 1000.0 / 60.0)).sum();
        assert_eq!(steps, 1000);
        // Timestamps going backwards never rewind the clock
        assert_eq!(clock.step(0.0), 0);
        assert_eq!(clock.step(1234.5 + 1001.0), 1);
    }

    #[test]
    fn test_countdown_keeps_real_time_at_60hz() {
        let mut s = session(Difficulty::Basic, false);
        s.advance_frame(0.0);
        assert!(s.on_card_clicked(0));
        for frame in 1..10_800 {
            s.advance_frame(frame as f64 * 1000.0 / 60.0);
        }
        assert_eq!(s.game().phase(), GamePhase::Running);
        assert_eq!(s.game().state().time_left, 1);

        s.advance_frame(180_000.0);
        assert_eq!(s.game().phase(), GamePhase::LostTimeUp);
        assert_eq!(s.presentation().ended, Some((EndReason::TimeUp, false)));
    }

    #[test]
    fn test_game_end_reaches_presentation() {
        let mut s = session(Difficulty::Advanced, false);
        s.on_card_clicked(0);
        s.advance(60_000);
        assert_eq!(s.presentation().ended, Some((EndReason::TimeUp, false)));
        assert_eq!(s.presentation().sounds.last(), Some(&SoundCue::Lose));
    }
}
