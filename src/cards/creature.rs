//! Creature identities and the built-in fallback roster

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Image shown on the face-down side (and when artwork is missing)
pub const CARD_BACK_IMAGE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/items/poke-ball.png";

const ARTWORK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// A matchable creature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Creature {
    pub id: u32,
    pub name: String,
    pub image_ref: String,
}

impl Creature {
    pub fn new(id: u32, name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image_ref: image_ref.into(),
        }
    }

    /// Official artwork URL for a creature id
    pub fn artwork_url(id: u32) -> String {
        format!("{ARTWORK_BASE}/{id}.png")
    }
}

/// Built-in roster used when the card source is unavailable (id, name)
const FALLBACK_ROSTER: [(u32, &str); 12] = [
    (25, "Pikachu"),
    (4, "Charmander"),
    (7, "Squirtle"),
    (1, "Bulbasaur"),
    (133, "Eevee"),
    (39, "Jigglypuff"),
    (16, "Pidgey"),
    (10, "Caterpie"),
    (52, "Meowth"),
    (54, "Psyduck"),
    (94, "Gengar"),
    (143, "Snorlax"),
];

/// Largest board the fallback roster can always serve
pub const MAX_PAIR_COUNT: usize = FALLBACK_ROSTER.len();

/// The full fallback roster in a fixed order
pub fn fallback_roster() -> Vec<Creature> {
    FALLBACK_ROSTER
        .iter()
        .map(|&(id, name)| Creature::new(id, name, Creature::artwork_url(id)))
        .collect()
}

/// Pick `count` distinct fallback creatures at random
pub fn fallback_creatures<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Result<Vec<Creature>> {
    let roster = fallback_roster();
    if count > roster.len() {
        return Err(GameError::InvalidInput(format!(
            "requested {count} creatures but the fallback roster only has {}",
            roster.len()
        )));
    }
    log::info!("Using {count} fallback creatures");
    Ok(roster.choose_multiple(rng, count).cloned().collect())
}

/// First fallback creature whose id is not already taken
pub fn fallback_replacement(taken: &[Creature]) -> Option<Creature> {
    fallback_roster()
        .into_iter()
        .find(|candidate| taken.iter().all(|c| c.id != candidate.id))
}
