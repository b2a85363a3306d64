//! Creature Match entry point
//!
//! Handles platform-specific initialization and drives the match clock.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element};

    use creature_match::audio::{AudioManager, SoundCue};
    use creature_match::cards::{CARD_BACK_IMAGE, Prefetched};
    use creature_match::consts::*;
    use creature_match::platform::{self, SAVE_RESULT_PATH};
    use creature_match::sim::{EndReason, GameState, format_time};
    use creature_match::{
        GameConfig, Presentation, ReportOutcome, ResultReporter, Session, Settings,
        TrophyLedger, deal_match,
    };

    /// DOM-backed presentation
    struct DomBoard {
        document: Document,
        audio: AudioManager,
    }

    impl DomBoard {
        fn card(&self, slot: usize) -> Option<Element> {
            self.document
                .query_selector(&format!(".card-game[data-slot='{slot}']"))
                .ok()
                .flatten()
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    impl Presentation for DomBoard {
        fn on_hearts_changed(&mut self, attempts_left: u32, max_attempts: u32) {
            let Some(container) = self.document.get_element_by_id("heartsContainer") else {
                log::error!("Hearts container not found");
                return;
            };
            container.set_inner_html("");
            for i in 0..max_attempts {
                let Ok(heart) = self.document.create_element("span") else {
                    continue;
                };
                let active = i < attempts_left;
                let _ = heart.set_attribute(
                    "class",
                    if active { "heart active" } else { "heart inactive" },
                );
                heart.set_text_content(Some(if active { "❤️" } else { "💔" }));
                let _ = container.append_child(&heart);
            }
        }

        fn on_time_changed(&mut self, time_left: u32) {
            self.set_text("timeLeft", &format_time(time_left));
        }

        fn on_pairs_changed(&mut self, matched_pairs: u32, pair_count: u32) {
            self.set_text("matchedPairs", &format!("{matched_pairs}/{pair_count}"));
        }

        fn on_game_ended(&mut self, reason: EndReason, won: bool) {
            let (title, message) = reason.headline();
            let kind = match reason {
                EndReason::Win => "success",
                EndReason::TimeUp => "warning",
                _ => "error",
            };
            log::info!("Game ended: {}, won: {won}", reason.as_str());
            show_modal(&self.document, kind, title, message, Some("/difficulty/"));
        }

        fn on_trophy_result(&mut self, trophies_earned: i64, total_trophies: i64) {
            show_trophies_later(self.document.clone(), trophies_earned, total_trophies);
        }

        fn on_card_flipped(&mut self, slot: usize) {
            if let Some(card) = self.card(slot) {
                let _ = card.class_list().add_1("flipped");
            }
        }

        fn on_cards_hidden(&mut self, slots: &[usize]) {
            for &slot in slots {
                if let Some(card) = self.card(slot) {
                    let _ = card.class_list().remove_1("flipped");
                }
            }
        }

        fn on_pair_matched(&mut self, first: usize, second: usize) {
            for slot in [first, second] {
                if let Some(card) = self.card(slot) {
                    let _ = card.class_list().add_1("matched");
                }
            }
        }

        fn on_preview(&mut self, active: bool) {
            if let Some(board) = self.document.get_element_by_id("gameBoard") {
                let _ = board.class_list().toggle_with_force("locked", active);
            }
        }

        fn on_sound(&mut self, cue: SoundCue) {
            self.audio.play(cue);
        }

        fn on_sound_toggled(&mut self, enabled: bool) {
            self.audio.set_muted(!enabled);
            self.set_text("toggleSound", if enabled { "🔊" } else { "🔇" });
        }
    }

    fn show_modal(document: &Document, kind: &str, title: &str, message: &str, back_to: Option<&str>) {
        let Some(body) = document.body() else { return };
        let Ok(modal) = document.create_element("div") else { return };
        let _ = modal.set_attribute("class", "custom-modal");
        let Ok(content) = document.create_element("div") else { return };
        let _ = content.set_attribute("class", &format!("modal-content {kind}"));

        if let Ok(h) = document.create_element("h3") {
            h.set_text_content(Some(title));
            let _ = content.append_child(&h);
        }
        if let Ok(p) = document.create_element("p") {
            p.set_text_content(Some(message));
            let _ = content.append_child(&p);
        }
        if let Ok(button) = document.create_element("button") {
            button.set_text_content(Some(if back_to.is_some() { "Back to Menu" } else { "OK" }));
            let target = back_to.map(str::to_string);
            let modal_ref = modal.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                modal_ref.remove();
                if let (Some(target), Some(window)) = (&target, web_sys::window()) {
                    let _ = window.location().set_href(target);
                }
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
            let _ = content.append_child(&button);
        }

        let _ = modal.append_child(&content);
        let _ = body.append_child(&modal);
    }

    /// Trophy popup, shown after the end-of-game dialog
    fn show_trophies_later(document: Document, trophies_earned: i64, total_trophies: i64) {
        let Some(window) = web_sys::window() else { return };
        let callback = Closure::once_into_js(move || {
            let won = trophies_earned >= 0;
            let (title, message) = if won {
                (
                    "🏆 Trophies Earned",
                    format!("You earned {trophies_earned} trophies. Total: {total_trophies}"),
                )
            } else {
                (
                    "💔 Trophies Lost",
                    format!(
                        "You lost {} trophies. Total: {total_trophies}",
                        trophies_earned.abs()
                    ),
                )
            };
            show_modal(&document, if won { "success" } else { "error" }, title, &message, None);
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            TROPHY_POPUP_DELAY_MS as i32,
        );
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn query_param(search: &str, key: &str) -> Option<String> {
        search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }

    /// Create one element per card slot
    fn build_board(document: &Document, state: &GameState) {
        let Some(board) = document.get_element_by_id("gameBoard") else {
            log::error!("Game board not found");
            return;
        };
        board.set_inner_html("");

        for slot in state.deck.iter() {
            let Ok(card) = document.create_element("div") else { continue };
            let _ = card.set_attribute("class", "card-game");
            let _ = card.set_attribute("data-slot", &slot.slot_index.to_string());

            let face_down = format!(
                "<div class=\"card-front\"><img src=\"{CARD_BACK_IMAGE}\" alt=\"Card back\"></div>"
            );
            card.set_inner_html(&format!("<div class=\"card-inner\">{face_down}</div>"));

            if let (Ok(face_up), Ok(img), Ok(label)) = (
                document.create_element("div"),
                document.create_element("img"),
                document.create_element("p"),
            ) {
                let _ = face_up.set_attribute("class", "card-back");
                let _ = img.set_attribute("src", &slot.creature.image_ref);
                let _ = img.set_attribute("alt", &slot.creature.name);
                let _ = img.set_attribute("onerror", &format!("this.src='{CARD_BACK_IMAGE}'"));
                label.set_text_content(Some(&slot.creature.name));
                let _ = face_up.append_child(&img);
                let _ = face_up.append_child(&label);
                if let Some(inner) = card.first_element_child() {
                    let _ = inner.append_child(&face_up);
                }
            }
            let _ = board.append_child(&card);
        }
        log::info!("Board ready with {} cards", state.deck.len());
    }

    type SharedSession = Rc<RefCell<Session<DomBoard>>>;

    fn setup_card_handlers(document: &Document, session: SharedSession) {
        let count = session.borrow().game().state().deck.len();
        for slot in 0..count {
            let Some(card) = document
                .query_selector(&format!(".card-game[data-slot='{slot}']"))
                .ok()
                .flatten()
            else {
                continue;
            };
            let session = session.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                session.borrow_mut().on_card_clicked(slot);
            });
            let _ = card.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_sound_button(document: &Document, session: SharedSession) {
        if let Some(btn) = document.get_element_by_id("toggleSound") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                session.borrow_mut().on_sound_toggle_requested();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("Sound toggle button not found");
        }
    }

    fn request_animation_frame(session: SharedSession) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(session, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(session: SharedSession, time: f64) {
        let done = {
            let mut s = session.borrow_mut();
            s.advance_frame(time);
            s.game().state().completed
        };

        // Nothing left to animate once the result is in
        if !done {
            request_animation_frame(session);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Creature Match starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let search = window.location().search().unwrap_or_default();
        let difficulty = query_param(&search, "difficulty").unwrap_or_else(|| "basic".into());
        let config = GameConfig::from_name(&difficulty);
        log::info!("Difficulty: {}", config.difficulty.as_str());

        set_hidden(&document, "loadingScreen", false);

        let seed = js_sys::Date::now() as u64;
        let mut rng = Pcg32::seed_from_u64(seed);
        let fetched = platform::web::fetch_creatures(config.pair_count, &mut rng).await;
        let mut source = Prefetched::new(fetched);

        let reporter: Box<dyn ResultReporter> = if platform::web::csrf_token().is_some() {
            let doc = document.clone();
            let on_outcome = Rc::new(move |outcome: ReportOutcome| {
                show_trophies_later(doc.clone(), outcome.trophies_earned, outcome.total_trophies);
            });
            Box::new(platform::web::HttpReporter::new(SAVE_RESULT_PATH, on_outcome))
        } else {
            Box::new(TrophyLedger::load())
        };

        let game = match deal_match(config, &mut source, &mut rng, reporter) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Failed to initialize game: {e}");
                set_hidden(&document, "loadingScreen", true);
                let _ = window.alert_with_message(e.player_message());
                return;
            }
        };
        set_hidden(&document, "loadingScreen", true);
        build_board(&document, game.state());

        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.set_volume(settings.master_volume);
        audio.set_muted(!settings.sound_enabled);
        let board = DomBoard {
            document: document.clone(),
            audio,
        };

        let session = Rc::new(RefCell::new(Session::new(game, settings, board)));
        setup_card_handlers(&document, session.clone());
        setup_sound_button(&document, session.clone());
        session.borrow_mut().begin();

        request_animation_frame(session);

        log::info!("Creature Match running with seed {seed}");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::collections::HashMap;

    use rand::Rng;
    use rand::seq::IndexedRandom;

    use creature_match::audio::{AudioManager, SoundCue};
    use creature_match::sim::{EndReason, format_time};
    use creature_match::{Presentation, Session};

    /// Presentation that prints to the terminal
    #[derive(Default)]
    pub struct TerminalBoard {
        pub audio: AudioManager,
        pub trophies: Option<(i64, i64)>,
    }

    impl Presentation for TerminalBoard {
        fn on_hearts_changed(&mut self, attempts_left: u32, max_attempts: u32) {
            let hearts: String = (0..max_attempts)
                .map(|i| if i < attempts_left { '♥' } else { '·' })
                .collect();
            println!("  lives  {hearts}");
        }

        fn on_time_changed(&mut self, time_left: u32) {
            if time_left % 10 == 0 {
                println!("  time   {}", format_time(time_left));
            }
        }

        fn on_pairs_changed(&mut self, matched_pairs: u32, pair_count: u32) {
            println!("  pairs  {matched_pairs}/{pair_count}");
        }

        fn on_game_ended(&mut self, reason: EndReason, _won: bool) {
            let (title, message) = reason.headline();
            println!("\n{title} {message}");
        }

        fn on_trophy_result(&mut self, trophies_earned: i64, total_trophies: i64) {
            self.trophies = Some((trophies_earned, total_trophies));
            println!("Trophies: {trophies_earned:+} (total {total_trophies})");
        }

        fn on_sound(&mut self, cue: SoundCue) {
            self.audio.play(cue);
        }

        fn on_sound_toggled(&mut self, enabled: bool) {
            self.audio.set_muted(!enabled);
        }
    }

    /// Player that remembers every card it has seen, but forgets with some probability
    pub fn autoplay<R: Rng>(session: &mut Session<TerminalBoard>, rng: &mut R, recall: f64) {
        let mut seen: HashMap<usize, u32> = HashMap::new();
        const THINK_MS: u64 = 700;

        while !session.game().state().completed {
            if session.game().is_input_locked() {
                if !session.advance_to_next() {
                    break;
                }
                continue;
            }

            let deck = &session.game().state().deck;
            let hidden: Vec<usize> = deck
                .iter()
                .filter(|s| !s.is_face_up())
                .map(|s| s.slot_index)
                .collect();
            if hidden.len() < 2 {
                session.advance(THINK_MS);
                continue;
            }

            let known_pair = hidden.iter().find_map(|&a| {
                let id = seen.get(&a)?;
                hidden
                    .iter()
                    .find(|&&b| b != a && seen.get(&b) == Some(id))
                    .map(|&b| (a, b))
            });

            let first = match known_pair {
                Some((a, _)) => a,
                None => {
                    let unseen: Vec<usize> =
                        hidden.iter().copied().filter(|s| !seen.contains_key(s)).collect();
                    unseen.choose(rng).copied().unwrap_or(hidden[0])
                }
            };
            session.on_card_clicked(first);
            let first_id = session.game().state().deck.slots()[first].creature.id;
            seen.insert(first, first_id);
            session.advance(THINK_MS);

            let deck = &session.game().state().deck;
            let candidates: Vec<usize> = deck
                .iter()
                .filter(|s| !s.is_face_up())
                .map(|s| s.slot_index)
                .collect();
            let partner = candidates
                .iter()
                .copied()
                .find(|&s| seen.get(&s) == Some(&first_id) && rng.random_bool(recall));
            let second = match partner {
                Some(slot) => slot,
                None => match candidates.choose(rng) {
                    Some(&slot) => slot,
                    None => continue,
                },
            };
            if session.on_card_clicked(second) {
                let id = session.game().state().deck.slots()[second].creature.id;
                seen.insert(second, id);
            }
            session.advance(THINK_MS);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use creature_match::cards::FallbackSource;
    use creature_match::sim::GamePhase;
    use creature_match::{GameConfig, Session, Settings, TrophyLedger, deal_match};

    env_logger::init();
    log::info!("Creature Match (native) starting...");
    log::info!("The browser version runs with `trunk serve`; this is an autoplay demo");

    let difficulty = std::env::args().nth(1).unwrap_or_else(|| "basic".to_string());
    let config = GameConfig::from_name(&difficulty);
    let seed: u64 = rand::random();
    let mut rng = Pcg32::seed_from_u64(seed);

    let ledger = Rc::new(RefCell::new(TrophyLedger::load()));
    let game = match deal_match(
        config,
        &mut FallbackSource::new(seed),
        &mut rng,
        Box::new(ledger.clone()),
    ) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Failed to initialize game: {e}");
            eprintln!("{}", e.player_message());
            std::process::exit(1);
        }
    };

    println!(
        "Creature Match - {} ({} pairs, seed {seed})",
        game.config().difficulty.label(),
        game.config().pair_count
    );

    let mut session = Session::new(game, Settings::default(), terminal::TerminalBoard::default());
    session.begin();
    while session.game().phase() == GamePhase::Preview {
        session.advance_to_next();
    }

    terminal::autoplay(&mut session, &mut rng, 0.85);

    if let Some(result) = session.game().result() {
        println!(
            "Result: won={} attempts_used={} time_taken={}s",
            result.won, result.attempts_used, result.time_taken
        );
    }

    let ledger = ledger.borrow();
    println!(
        "Level {} | {} trophies | win rate {:.0}% | avg time {}s | most played: {}",
        ledger.level(),
        ledger.trophies,
        ledger.win_rate(),
        ledger.average_time(),
        ledger.most_played().label()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
