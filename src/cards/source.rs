//! Card source contract and fallback recovery

use rand::Rng;

use super::creature::{Creature, fallback_creatures};
use crate::error::{GameError, Result};

/// Supplier of unique creatures for a deck
pub trait CardSource {
    /// Fetch `count` distinct creatures, or fail with `SourceUnavailable`
    fn fetch_creatures(&mut self, count: usize) -> Result<Vec<Creature>>;
}

/// Source that always serves the built-in roster
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSource {
    seed: u64,
}

impl FallbackSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl CardSource for FallbackSource {
    fn fetch_creatures(&mut self, count: usize) -> Result<Vec<Creature>> {
        use rand::SeedableRng;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(self.seed);
        self.seed = self.seed.wrapping_add(1);
        fallback_creatures(count, &mut rng)
    }
}

/// Result of a fetch that already happened elsewhere (e.g. an async browser fetch)
#[derive(Debug)]
pub struct Prefetched(Option<Result<Vec<Creature>>>);

impl Prefetched {
    pub fn new(result: Result<Vec<Creature>>) -> Self {
        Self(Some(result))
    }
}

impl CardSource for Prefetched {
    fn fetch_creatures(&mut self, count: usize) -> Result<Vec<Creature>> {
        match self.0.take() {
            Some(Ok(list)) => Ok(list.into_iter().take(count).collect()),
            Some(Err(e)) => Err(e),
            None => Err(GameError::SourceUnavailable("prefetched list already consumed".into())),
        }
    }
}

/// Fetch creatures, substituting the fallback roster when the source is down
///
/// A source that answers with fewer creatures than requested is also treated
/// as unavailable. Other errors propagate.
pub fn load_creatures<R: Rng + ?Sized>(
    source: &mut dyn CardSource,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Creature>> {
    match source.fetch_creatures(count) {
        Ok(list) if list.len() >= count => {
            log::info!("Loaded {} creatures from card source", list.len());
            Ok(list.into_iter().take(count).collect())
        }
        Ok(list) => {
            log::warn!(
                "Card source returned {} of {count} creatures, using fallback roster",
                list.len()
            );
            fallback_creatures(count, rng)
        }
        Err(GameError::SourceUnavailable(reason)) => {
            log::warn!("Card source unavailable ({reason}), using fallback roster");
            fallback_creatures(count, rng)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct DownSource;

    impl CardSource for DownSource {
        fn fetch_creatures(&mut self, _count: usize) -> Result<Vec<Creature>> {
            Err(GameError::SourceUnavailable("offline".into()))
        }
    }

    #[test]
    fn test_unavailable_source_falls_back() {
        let mut rng = Pcg32::seed_from_u64(5);
        let list = load_creatures(&mut DownSource, 8, &mut rng).unwrap();
        assert_eq!(list.len(), 8);
    }

    #[test]
    fn test_short_answer_falls_back() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut source = Prefetched::new(Ok(vec![Creature::new(1, "Solo", "solo.png")]));
        let list = load_creatures(&mut source, 4, &mut rng).unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.iter().all(|c| c.name != "Solo"));
    }

    #[test]
    fn test_prefetched_passes_through() {
        let mut rng = Pcg32::seed_from_u64(5);
        let fetched: Vec<Creature> = (1..=3).map(|i| Creature::new(i, "x", "y")).collect();
        let mut source = Prefetched::new(Ok(fetched.clone()));
        assert_eq!(load_creatures(&mut source, 3, &mut rng).unwrap(), fetched);
    }

    #[test]
    fn test_other_errors_propagate() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut source = Prefetched::new(Err(GameError::InvalidInput("bad".into())));
        assert!(matches!(
            load_creatures(&mut source, 3, &mut rng),
            Err(GameError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fallback_source_serves_roster() {
        let mut source = FallbackSource::new(1);
        assert_eq!(source.fetch_creatures(6).unwrap().len(), 6);
    }
}
