//! Remote creature catalog (PokeAPI-shaped JSON)
//!
//! Only parsing and selection live here; the actual HTTP calls are made by
//! the platform layer.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;

use super::creature::{CARD_BACK_IMAGE, Creature};
use crate::error::{GameError, Result};

/// Catalog listing endpoint (first 100 creatures)
pub const CATALOG_URL: &str = "https://pokeapi.co/api/v2/pokemon?limit=100";

/// Entry of the catalog listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

#[derive(Deserialize)]
struct CatalogPage {
    results: Option<Vec<CatalogEntry>>,
}

#[derive(Deserialize)]
struct SpriteRef {
    front_default: Option<String>,
}

#[derive(Deserialize, Default)]
struct OtherSprites {
    #[serde(rename = "official-artwork")]
    official_artwork: Option<SpriteRef>,
    dream_world: Option<SpriteRef>,
}

#[derive(Deserialize)]
struct Sprites {
    front_default: Option<String>,
    #[serde(default)]
    other: Option<OtherSprites>,
}

#[derive(Deserialize)]
struct CreatureDetail {
    id: u32,
    name: String,
    sprites: Option<Sprites>,
}

/// Parse the catalog listing
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>> {
    let page: CatalogPage = serde_json::from_str(json)?;
    page.results
        .ok_or_else(|| GameError::SourceUnavailable("catalog listing has no results".into()))
}

/// Pick `count` distinct entries at random
pub fn pick_entries<R: Rng + ?Sized>(
    entries: &[CatalogEntry],
    count: usize,
    rng: &mut R,
) -> Vec<CatalogEntry> {
    entries.choose_multiple(rng, count).cloned().collect()
}

/// Parse one creature detail document
pub fn parse_creature(json: &str) -> Result<Creature> {
    let detail: CreatureDetail = serde_json::from_str(json)?;
    let image = detail
        .sprites
        .and_then(|sprites| {
            let other = sprites.other.unwrap_or_default();
            other
                .official_artwork
                .and_then(|s| s.front_default)
                .or_else(|| other.dream_world.and_then(|s| s.front_default))
                .or(sprites.front_default)
        })
        .unwrap_or_else(|| CARD_BACK_IMAGE.to_string());
    Ok(Creature::new(detail.id, capitalize(&detail.name), image))
}

/// Uppercase the first character
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_parse_catalog() {
        let json = r#"{"count":2,"results":[
            {"name":"bulbasaur","url":"https://pokeapi.co/api/v2/pokemon/1/"},
            {"name":"ivysaur","url":"https://pokeapi.co/api/v2/pokemon/2/"}
        ]}"#;
        let entries = parse_catalog(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "ivysaur");
    }

    #[test]
    fn test_catalog_without_results_is_unavailable() {
        assert!(matches!(
            parse_catalog(r#"{"detail":"Not found."}"#),
            Err(GameError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_catalog_is_serialization_error() {
        assert!(matches!(parse_catalog("<html>"), Err(GameError::Serialization(_))));
    }

    #[test]
    fn test_pick_entries_distinct() {
        let entries: Vec<CatalogEntry> = (0..20)
            .map(|i| CatalogEntry {
                name: format!("c{i}"),
                url: format!("u{i}"),
            })
            .collect();
        let mut rng = Pcg32::seed_from_u64(4);
        let picked = pick_entries(&entries, 8, &mut rng);
        assert_eq!(picked.len(), 8);
        let mut names: Vec<_> = picked.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_official_artwork_preferred() {
        let json = r#"{"id":25,"name":"pikachu","sprites":{
            "front_default":"front.png",
            "other":{
                "official-artwork":{"front_default":"art.png"},
                "dream_world":{"front_default":"dream.svg"}
            }}}"#;
        let creature = parse_creature(json).unwrap();
        assert_eq!(creature.id, 25);
        assert_eq!(creature.name, "Pikachu");
        assert_eq!(creature.image_ref, "art.png");
    }

    #[test]
    fn test_sprite_fallback_chain() {
        let dream = r#"{"id":1,"name":"a","sprites":{"front_default":"front.png",
            "other":{"official-artwork":{"front_default":null},"dream_world":{"front_default":"dream.svg"}}}}"#;
        assert_eq!(parse_creature(dream).unwrap().image_ref, "dream.svg");

        let front = r#"{"id":1,"name":"a","sprites":{"front_default":"front.png","other":null}}"#;
        assert_eq!(parse_creature(front).unwrap().image_ref, "front.png");

        let none = r#"{"id":1,"name":"a","sprites":{"front_default":null}}"#;
        assert_eq!(parse_creature(none).unwrap().image_ref, CARD_BACK_IMAGE);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("mr-mime"), "Mr-mime");
        assert_eq!(capitalize(""), "");
    }
}
