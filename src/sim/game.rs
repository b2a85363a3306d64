//! Match controller
//!
//! Owns the board, the attempt budget and the countdown, and resolves flips
//! into matches or mismatches. All delays run on the virtual-clock
//! `Scheduler`, so the controller is driven by three kinds of calls:
//!
//! - input (`select_card`, `start`, `begin_preview`)
//! - time (`advance`, or `tick` directly)
//! - inspection (`state`, `drain_events`)
//!
//! Countdown ticks fire before any other callback due in the same instant,
//! so a time-out always wins over a pair that is still settling.

use crate::audio::SoundCue;
use crate::cards::Deck;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::report::{GameResult, ResultReporter};

use super::scheduler::{Scheduler, TimerId};
use super::state::{EndReason, GameEvent, GamePhase, GameState};

/// Delayed callbacks owned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// One countdown second elapsed
    Countdown,
    /// Settle delay after the second flip elapsed
    ResolvePair,
    /// Mismatched cards turn face down
    HidePair { first: usize, second: usize },
    /// Matched-state visuals settled after the final pair
    FinishWin,
    /// Cascade step of the preview reveal
    PreviewReveal { slot: usize },
    /// Preview duration elapsed
    PreviewHide,
}

impl Timer {
    fn priority(&self) -> u8 {
        match self {
            Timer::Countdown => 0,
            _ => 1,
        }
    }
}

pub struct MatchGame {
    config: GameConfig,
    state: GameState,
    scheduler: Scheduler<Timer>,
    countdown: Option<TimerId>,
    pending_resolution: Option<TimerId>,
    reporter: Box<dyn ResultReporter>,
    result: Option<GameResult>,
    events: Vec<GameEvent>,
}

impl std::fmt::Debug for MatchGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchGame")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("now_ms", &self.scheduler.now_ms())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl MatchGame {
    /// Create a match over a freshly built deck
    pub fn new(config: GameConfig, deck: Deck, reporter: Box<dyn ResultReporter>) -> Result<Self> {
        config.validate()?;
        if deck.len() != config.card_count() {
            return Err(GameError::InvalidInput(format!(
                "deck has {} cards but {} pairs need {}",
                deck.len(),
                config.pair_count,
                config.card_count()
            )));
        }
        log::info!(
            "New {} match: {} pairs, {} attempts, {}s",
            config.difficulty.as_str(),
            config.pair_count,
            config.max_attempts,
            config.max_time_seconds
        );
        let state = GameState::new(&config, deck);
        Ok(Self {
            config,
            state,
            scheduler: Scheduler::new(),
            countdown: None,
            pending_resolution: None,
            reporter,
            result: None,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Virtual time since the match was created
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Result handed to the reporter, once the match is over
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Whether a card click would currently be ignored
    pub fn is_input_locked(&self) -> bool {
        self.state.completed
            || self.state.phase == GamePhase::Preview
            || self.state.selection.len() >= 2
            || self.state.attempts_left == 0
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start the countdown. Ignored unless the match has not started yet.
    pub fn start(&mut self) {
        if self.state.phase != GamePhase::NotStarted {
            return;
        }
        self.state.started = true;
        self.state.phase = GamePhase::Running;
        self.countdown = Some(self.schedule(self.config.tick_interval_ms, Timer::Countdown));
        log::info!("Match started, countdown running");
    }

    /// Reveal every card in a cascade, then hide them again
    ///
    /// Only valid before the first flip, and only once per match.
    pub fn begin_preview(&mut self) -> bool {
        if self.state.phase != GamePhase::NotStarted || self.state.preview_done {
            return false;
        }
        self.state.phase = GamePhase::Preview;
        let stagger = self.config.preview_stagger_ms;
        for slot in 0..self.state.deck.len() {
            self.schedule(stagger * slot as u64, Timer::PreviewReveal { slot });
        }
        let last_reveal = stagger * self.state.deck.len().saturating_sub(1) as u64;
        self.schedule(last_reveal + self.config.preview_duration_ms, Timer::PreviewHide);
        self.events.push(GameEvent::PreviewStarted);
        log::info!("Preview started ({} ms)", self.config.preview_duration_ms);
        true
    }

    /// Flip a card. Returns false when the click is ignored.
    pub fn select_card(&mut self, slot: usize) -> bool {
        if self.is_input_locked() {
            log::debug!("Card {slot} ignored: input locked");
            return false;
        }
        match self.state.deck.get(slot) {
            Some(card) if !card.is_face_up() => {}
            _ => {
                log::debug!("Card {slot} ignored: unavailable");
                return false;
            }
        }

        if !self.state.started {
            self.start();
        }

        if let Some(card) = self.state.deck.get_mut(slot) {
            card.flipped = true;
            log::debug!("Flipped card {slot}: {}", card.creature.name);
        }
        self.state.selection.push(slot);
        self.events.push(GameEvent::CardFlipped { slot });
        self.events.push(GameEvent::Sound(SoundCue::Flip));

        if self.state.selection.len() == 2 {
            self.pending_resolution =
                Some(self.schedule(self.config.settle_delay_ms, Timer::ResolvePair));
        }
        true
    }

    /// Check the two pending cards for a match
    pub fn resolve_pending_pair(&mut self) {
        if let Some(id) = self.pending_resolution.take() {
            self.scheduler.cancel(id);
        }
        if self.state.completed || self.state.selection.len() != 2 {
            return;
        }
        let (first, second) = (self.state.selection[0], self.state.selection[1]);
        self.state.selection.clear();

        let same = match (self.state.deck.get(first), self.state.deck.get(second)) {
            (Some(a), Some(b)) => a.creature.id == b.creature.id,
            _ => return,
        };

        if same {
            for slot in [first, second] {
                if let Some(card) = self.state.deck.get_mut(slot) {
                    card.matched = true;
                }
            }
            self.state.matched_pairs += 1;
            log::debug!("Match: cards {first} and {second}");
            self.events.push(GameEvent::PairMatched { first, second });
            self.events.push(GameEvent::PairsChanged {
                matched_pairs: self.state.matched_pairs,
                pair_count: self.state.pair_count(),
            });
            self.events.push(GameEvent::Sound(SoundCue::Match));

            if self.state.all_pairs_matched() {
                self.schedule(self.config.win_delay_ms, Timer::FinishWin);
            }
        } else {
            self.state.attempts_left = self.state.attempts_left.saturating_sub(1);
            log::debug!(
                "Mismatch: cards {first} and {second}, {} attempts left",
                self.state.attempts_left
            );
            self.events.push(GameEvent::HeartsChanged {
                attempts_left: self.state.attempts_left,
                max_attempts: self.config.max_attempts,
            });
            self.events.push(GameEvent::Sound(SoundCue::Mismatch));
            self.schedule(self.config.unflip_delay_ms, Timer::HidePair { first, second });
        }
    }

    /// One countdown second. Ignored unless the countdown is running.
    pub fn tick(&mut self) {
        if self.state.phase != GamePhase::Running {
            return;
        }
        self.state.time_left = self.state.time_left.saturating_sub(1);
        self.events.push(GameEvent::TimeChanged {
            time_left: self.state.time_left,
        });
        if self.state.time_left == 0 {
            self.finish(EndReason::TimeUp);
        }
    }

    /// Advance the virtual clock, firing every callback that comes due
    pub fn advance(&mut self, elapsed_ms: u64) {
        let until = self.scheduler.now_ms().saturating_add(elapsed_ms);
        while let Some((id, timer)) = self.scheduler.pop_due(until) {
            self.fire(id, timer);
        }
        self.scheduler.set_now(until);
    }

    /// Advance straight to the next scheduled callback. Returns false if none is queued.
    pub fn advance_to_next(&mut self) -> bool {
        match self.scheduler.next_due() {
            Some(due) => {
                let elapsed = due.saturating_sub(self.scheduler.now_ms());
                self.advance(elapsed);
                true
            }
            None => false,
        }
    }

    fn schedule(&mut self, delay_ms: u64, timer: Timer) -> TimerId {
        self.scheduler.schedule(delay_ms, timer.priority(), timer)
    }

    fn fire(&mut self, id: TimerId, timer: Timer) {
        // Callbacks queued before the match ended must not touch the board
        if self.state.completed {
            return;
        }
        match timer {
            Timer::Countdown => {
                self.countdown = None;
                self.tick();
                if self.state.phase == GamePhase::Running {
                    self.countdown =
                        Some(self.schedule(self.config.tick_interval_ms, Timer::Countdown));
                }
            }
            Timer::ResolvePair => {
                if self.pending_resolution == Some(id) {
                    self.resolve_pending_pair();
                }
            }
            Timer::HidePair { first, second } => {
                let mut hidden = Vec::with_capacity(2);
                for slot in [first, second] {
                    if let Some(card) = self.state.deck.get_mut(slot) {
                        if !card.matched {
                            card.flipped = false;
                            hidden.push(slot);
                        }
                    }
                }
                self.events.push(GameEvent::CardsHidden { slots: hidden });
                if self.state.attempts_left == 0 {
                    self.finish(EndReason::NoLives);
                }
            }
            Timer::FinishWin => self.finish(EndReason::Win),
            Timer::PreviewReveal { slot } => {
                if self.state.phase != GamePhase::Preview {
                    return;
                }
                if let Some(card) = self.state.deck.get_mut(slot) {
                    card.flipped = true;
                    self.events.push(GameEvent::CardFlipped { slot });
                }
            }
            Timer::PreviewHide => {
                if self.state.phase != GamePhase::Preview {
                    return;
                }
                let mut hidden = Vec::with_capacity(self.state.deck.len());
                for card in self.state.deck.iter_mut() {
                    if card.flipped && !card.matched {
                        card.flipped = false;
                        hidden.push(card.slot_index);
                    }
                }
                self.state.phase = GamePhase::NotStarted;
                self.state.preview_done = true;
                self.events.push(GameEvent::CardsHidden { slots: hidden });
                self.events.push(GameEvent::PreviewEnded);
                log::info!("Preview finished, board ready");
            }
        }
    }

    /// Enter a terminal phase and report the result (at most once)
    fn finish(&mut self, reason: EndReason) {
        if self.state.completed {
            return;
        }
        self.state.completed = true;
        self.state.end_reason = reason;
        self.state.phase = match reason {
            EndReason::Win => GamePhase::Won,
            EndReason::TimeUp => GamePhase::LostTimeUp,
            EndReason::NoLives | EndReason::None => GamePhase::LostNoLives,
        };
        self.countdown = None;
        self.pending_resolution = None;
        self.scheduler.clear();

        let won = reason == EndReason::Win;
        log::info!("Match over: {}, won: {won}", reason.as_str());
        self.events.push(GameEvent::GameEnded { reason, won });
        self.events.push(GameEvent::Sound(if won {
            SoundCue::Win
        } else {
            SoundCue::Lose
        }));

        let result = GameResult {
            difficulty: self.config.difficulty,
            won,
            attempts_used: self.config.max_attempts - self.state.attempts_left,
            time_taken: self.config.max_time_seconds - self.state.time_left,
        };
        self.result = Some(result);

        match self.reporter.report(&result) {
            Ok(Some(outcome)) if outcome.success => {
                log::info!(
                    "Result saved: {:+} trophies, {} total",
                    outcome.trophies_earned,
                    outcome.total_trophies
                );
                self.events.push(GameEvent::TrophyResult {
                    trophies_earned: outcome.trophies_earned,
                    total_trophies: outcome.total_trophies,
                });
            }
            Ok(Some(_)) => log::warn!("Reporter did not accept the result"),
            Ok(None) => log::debug!("Result handed off for asynchronous reporting"),
            Err(e) => log::warn!("Failed to report result: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Creature, build_deck};
    use crate::config::Difficulty;
    use crate::report::ReportOutcome;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        results: Rc<RefCell<Vec<GameResult>>>,
        fail: bool,
    }

    impl ResultReporter for Recorder {
        fn report(&mut self, result: &GameResult) -> Result<Option<ReportOutcome>> {
            self.results.borrow_mut().push(*result);
            if self.fail {
                return Err(GameError::Reporting("offline".into()));
            }
            Ok(Some(ReportOutcome {
                success: true,
                trophies_earned: if result.won { 10 } else { -5 },
                total_trophies: 50,
            }))
        }
    }

    fn game(difficulty: Difficulty, pairs: usize) -> (MatchGame, Recorder) {
        let creatures: Vec<Creature> = (1..=pairs as u32)
            .map(|i| Creature::new(i, format!("C{i}"), format!("{i}.png")))
            .collect();
        let mut rng = Pcg32::seed_from_u64(42);
        let deck = build_deck(&creatures, pairs, &mut rng).unwrap();
        let recorder = Recorder::default();
        let config = GameConfig::for_difficulty(difficulty).with_pair_count(pairs);
        let game = MatchGame::new(config, deck, Box::new(recorder.clone())).unwrap();
        (game, recorder)
    }

    /// Two slots holding different creatures
    fn mismatch(game: &MatchGame) -> (usize, usize) {
        let deck = &game.state().deck;
        let a = deck.iter().find(|s| !s.matched && !s.flipped).unwrap();
        let b = deck
            .iter()
            .find(|s| !s.matched && !s.flipped && s.creature.id != a.creature.id)
            .unwrap();
        (a.slot_index, b.slot_index)
    }

    #[test]
    fn test_rejects_wrong_deck_size() {
        let (g, _) = game(Difficulty::Basic, 4);
        let deck = g.state().deck.clone();
        let config = GameConfig::default(); // expects 8 pairs
        assert!(matches!(
            MatchGame::new(config, deck, Box::new(Recorder::default())),
            Err(GameError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_first_flip_starts_countdown() {
        let (mut g, _) = game(Difficulty::Basic, 4);
        assert!(!g.state().started);
        assert!(g.select_card(0));
        assert!(g.state().started);
        assert_eq!(g.phase(), GamePhase::Running);
        g.advance(1000);
        assert_eq!(g.state().time_left, 179);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut g, _) = game(Difficulty::Basic, 4);
        g.start();
        g.start();
        g.advance(1000);
        // A second countdown would have ticked twice
        assert_eq!(g.state().time_left, 179);
    }

    #[test]
    fn test_match_marks_both_cards() {
        let (mut g, _) = game(Difficulty::Basic, 4);
        let partner = g.state().deck.partner_of(0).unwrap();
        assert!(g.select_card(0));
        assert!(g.select_card(partner));

        // Third click while the pair settles is ignored
        let other = (0..8).find(|&s| s != 0 && s != partner).unwrap();
        assert!(!g.select_card(other));

        g.advance(500);
        assert!(g.state().deck.slots()[0].matched);
        assert!(g.state().deck.slots()[partner].matched);
        assert_eq!(g.state().matched_pairs, 1);
        assert!(g.state().selection.is_empty());
    }

    #[test]
    fn test_mismatch_costs_one_attempt_and_hides_cards() {
        let (mut g, _) = game(Difficulty::Basic, 4);
        let (a, b) = mismatch(&g);
        g.select_card(a);
        g.select_card(b);
        g.advance(500);
        assert_eq!(g.state().attempts_left, 5);
        assert!(g.state().deck.slots()[a].flipped);

        g.advance(1000);
        assert!(!g.state().deck.slots()[a].flipped);
        assert!(!g.state().deck.slots()[b].flipped);
    }

    #[test]
    fn test_reselecting_flipped_card_is_ignored() {
        let (mut g, _) = game(Difficulty::Basic, 4);
        assert!(g.select_card(3));
        assert!(!g.select_card(3));
        assert!(!g.select_card(99));
        assert_eq!(g.state().selection, vec![3]);
    }

    #[test]
    fn test_direct_resolution_cancels_scheduled_one() {
        let (mut g, _) = game(Difficulty::Basic, 4);
        let (a, b) = mismatch(&g);
        g.select_card(a);
        g.select_card(b);
        g.resolve_pending_pair();
        assert_eq!(g.state().attempts_left, 5);
        g.advance(500);
        assert_eq!(g.state().attempts_left, 5);
    }

    #[test]
    fn test_timeout_reports_once() {
        let (mut g, rec) = game(Difficulty::Advanced, 4);
        g.start();
        for _ in 0..60 {
            g.tick();
        }
        assert_eq!(g.phase(), GamePhase::LostTimeUp);
        assert_eq!(g.state().end_reason, EndReason::TimeUp);
        g.tick();
        g.advance(10_000);
        let results = rec.results.borrow();
        assert_eq!(results.len(), 1);
        assert!(!results[0].won);
        assert_eq!(results[0].time_taken, 60);
        assert_eq!(results[0].attempts_used, 0);
    }

    #[test]
    fn test_countdown_runs_on_clock() {
        let (mut g, _) = game(Difficulty::Advanced, 4);
        g.start();
        g.advance(60_000);
        assert_eq!(g.phase(), GamePhase::LostTimeUp);
        assert_eq!(g.state().time_left, 0);
    }

    #[test]
    fn test_timeout_beats_pending_resolution() {
        let (mut g, rec) = game(Difficulty::Advanced, 4);
        let (a, b) = mismatch(&g);
        g.select_card(a); // countdown starts at t=0
        g.advance(59_500);
        assert_eq!(g.state().time_left, 1);
        g.select_card(b); // resolution due at t=60000, same as the final tick
        g.advance(500);
        assert_eq!(g.phase(), GamePhase::LostTimeUp);
        // The mismatch was never resolved
        assert_eq!(g.state().attempts_left, 2);
        assert_eq!(rec.results.borrow().len(), 1);
    }

    #[test]
    fn test_no_input_after_completion() {
        let (mut g, _) = game(Difficulty::Advanced, 4);
        g.start();
        g.advance(60_000);
        assert!(!g.select_card(0));
        assert!(g.is_input_locked());
    }

    #[test]
    fn test_last_life_locks_input_until_loss() {
        let (mut g, rec) = game(Difficulty::Advanced, 4);
        for _ in 0..2 {
            let (a, b) = mismatch(&g);
            g.select_card(a);
            g.select_card(b);
            g.advance(500);
        }
        assert_eq!(g.state().attempts_left, 0);
        assert!(!g.select_card(mismatch(&g).0));
        g.advance(1000);
        assert_eq!(g.phase(), GamePhase::LostNoLives);
        g.advance(10_000);

        let results = rec.results.borrow();
        assert_eq!(results.len(), 1);
        assert!(!results[0].won);
        assert_eq!(results[0].attempts_used, 2);
    }

    #[test]
    fn test_reporter_failure_does_not_change_outcome() {
        let (mut g, mut rec) = game(Difficulty::Advanced, 4);
        rec.fail = true;
        g.reporter = Box::new(rec.clone());
        g.start();
        g.advance(60_000);
        assert_eq!(g.phase(), GamePhase::LostTimeUp);
        let events = g.drain_events();
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GameEvent::TrophyResult { .. }))
        );
        assert!(events.contains(&GameEvent::GameEnded {
            reason: EndReason::TimeUp,
            won: false
        }));
    }

    #[test]
    fn test_trophy_event_on_success() {
        let (mut g, _) = game(Difficulty::Advanced, 4);
        g.start();
        g.advance(60_000);
        assert!(g.drain_events().contains(&GameEvent::TrophyResult {
            trophies_earned: -5,
            total_trophies: 50
        }));
    }

    #[test]
    fn test_preview_reveals_then_hides() {
        let (mut g, _) = game(Difficulty::Advanced, 4);
        assert!(g.begin_preview());
        assert!(!g.begin_preview());
        assert!(!g.select_card(0));

        // 8 cards, 100 ms apart: last reveal at 700 ms
        g.advance(700);
        assert!(g.state().deck.iter().all(|s| s.flipped));
        assert_eq!(g.phase(), GamePhase::Preview);

        g.advance(5_000);
        assert_eq!(g.phase(), GamePhase::NotStarted);
        assert!(g.state().deck.iter().all(|s| !s.flipped));
        assert_eq!(g.state().time_left, 60);
        assert_eq!(g.state().attempts_left, 2);

        assert!(!g.begin_preview());
        assert!(g.select_card(0));
    }

    #[test]
    fn test_events_for_mismatch() {
        let (mut g, _) = game(Difficulty::Medium, 4);
        let (a, b) = mismatch(&g);
        g.select_card(a);
        g.select_card(b);
        g.advance(1500);
        let events = g.drain_events();
        assert!(events.contains(&GameEvent::HeartsChanged {
            attempts_left: 3,
            max_attempts: 4
        }));
        assert!(events.contains(&GameEvent::CardsHidden { slots: vec![a, b] }));
        assert!(events.contains(&GameEvent::Sound(SoundCue::Mismatch)));
        assert!(g.drain_events().is_empty());
    }

    #[test]
    fn test_perfect_game_wins_with_all_lives() {
        let (mut g, rec) = game(Difficulty::Basic, 8);
        for slot in 0..16 {
            if g.state().deck.slots()[slot].matched {
                continue;
            }
            let partner = g.state().deck.partner_of(slot).unwrap();
            assert!(g.select_card(slot));
            assert!(g.select_card(partner));
            g.advance(500);
        }
        assert_eq!(g.state().matched_pairs, 8);
        assert_eq!(g.phase(), GamePhase::Running);

        g.advance(500);
        assert_eq!(g.phase(), GamePhase::Won);
        assert_eq!(g.state().attempts_left, 6);
        let results = rec.results.borrow();
        assert_eq!(results.len(), 1);
        assert!(results[0].won);
        assert_eq!(results[0].attempts_used, 0);
        assert!(results[0].time_taken <= 5);
    }

    proptest! {
        #[test]
        fn prop_random_play_keeps_counters_consistent(
            moves in prop::collection::vec((0usize..12, 0u64..1500), 1..120)
        ) {
            let (mut g, rec) = game(Difficulty::Medium, 6);
            for (slot, wait) in moves {
                g.select_card(slot);
                g.advance(wait);

                let state = g.state();
                prop_assert!(state.attempts_left <= 4);
                prop_assert!(state.matched_pairs <= 6);
                prop_assert_eq!(state.deck.matched_count(), state.matched_pairs as usize * 2);
                prop_assert!(state.selection.len() <= 2);
                prop_assert!(rec.results.borrow().len() <= 1);
                prop_assert_eq!(state.completed, rec.results.borrow().len() == 1);
            }
        }
    }
}
