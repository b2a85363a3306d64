//! Creatures, deck construction and card sources

pub mod catalog;
pub mod creature;
pub mod deck;
pub mod source;

pub use creature::{
    CARD_BACK_IMAGE, Creature, MAX_PAIR_COUNT, fallback_creatures, fallback_roster,
};
pub use deck::{CardSlot, Deck, build_deck};
pub use source::{CardSource, FallbackSource, Prefetched, load_creatures};
