//! Deck construction
//!
//! Every creature appears in exactly two slots. Slot indices follow the
//! shuffled order, so `slot_index` is also the slot's position on the board.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::creature::Creature;
use crate::error::{GameError, Result};

/// One card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSlot {
    pub slot_index: usize,
    pub creature: Creature,
    pub flipped: bool,
    pub matched: bool,
}

impl CardSlot {
    /// Face up (either flipped this turn or already matched)
    pub fn is_face_up(&self) -> bool {
        self.flipped || self.matched
    }
}

/// Ordered board of card slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Deck {
    slots: Vec<CardSlot>,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.slots.len() / 2
    }

    pub fn get(&self, slot: usize) -> Option<&CardSlot> {
        self.slots.get(slot)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut CardSlot> {
        self.slots.get_mut(slot)
    }

    pub fn slots(&self) -> &[CardSlot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardSlot> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CardSlot> {
        self.slots.iter_mut()
    }

    /// Slot index of the other card carrying the same creature
    pub fn partner_of(&self, slot: usize) -> Option<usize> {
        let id = self.slots.get(slot)?.creature.id;
        self.slots
            .iter()
            .position(|s| s.creature.id == id && s.slot_index != slot)
    }

    pub fn matched_count(&self) -> usize {
        self.slots.iter().filter(|s| s.matched).count()
    }
}

/// Duplicate each creature into a pair and shuffle the result
pub fn build_deck<R: Rng + ?Sized>(
    creatures: &[Creature],
    pair_count: usize,
    rng: &mut R,
) -> Result<Deck> {
    if pair_count == 0 {
        return Err(GameError::InvalidInput("a deck needs at least one pair".into()));
    }
    if creatures.len() != pair_count {
        return Err(GameError::InvalidInput(format!(
            "expected {pair_count} creatures, got {}",
            creatures.len()
        )));
    }
    let mut seen = HashSet::with_capacity(pair_count);
    if let Some(dup) = creatures.iter().find(|c| !seen.insert(c.id)) {
        return Err(GameError::InvalidInput(format!(
            "creature id {} appears more than once",
            dup.id
        )));
    }

    let mut cards: Vec<Creature> = creatures.iter().chain(creatures.iter()).cloned().collect();
    cards.shuffle(rng);

    let slots = cards
        .into_iter()
        .enumerate()
        .map(|(slot_index, creature)| CardSlot {
            slot_index,
            creature,
            flipped: false,
            matched: false,
        })
        .collect();

    let deck = Deck { slots };
    log::debug!("Built deck with {} cards", deck.len());
    Ok(deck)
}
