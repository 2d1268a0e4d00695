//! City name generation.
//!
//! [`MarkovNameGenerator`] learns which character follows each run of
//! `order` characters in a corpus of real town names, then walks those
//! transitions at random. Names are padded with `^` and `$` while
//! learning so the walk knows how names start and end.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use crate::error::WorldError;

const START: char = '^';
const END: char = '$';

/// Town names the default generator is trained on, one per line.
const DEFAULT_CORPUS: &str = include_str!("../data/town_names.txt");

/// Markov order of the default generator.
pub const DEFAULT_ORDER: usize = 3;

/// Produces city names for grid generation.
pub trait NameSource {
    /// Generate a name of at most `max_length` characters.
    fn generate_name(&mut self, rng: &mut dyn RngCore, max_length: usize) -> String;
}

/// Character-level Markov chain over a name corpus.
#[derive(Debug, Clone)]
pub struct MarkovNameGenerator {
    order: usize,
    /// n-gram -> (next character -> occurrences)
    transitions: BTreeMap<String, BTreeMap<char, u32>>,
    /// n-grams that begin a name.
    starts: Vec<String>,
}

impl MarkovNameGenerator {
    /// Train a generator of the given order on `corpus`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyNameCorpus`] if `order` is zero or no
    /// name is long enough to yield a transition.
    pub fn new<'a>(
        corpus: impl IntoIterator<Item = &'a str>,
        order: usize,
    ) -> Result<Self, WorldError> {
        if order == 0 {
            return Err(WorldError::EmptyNameCorpus { order });
        }
        let mut transitions: BTreeMap<String, BTreeMap<char, u32>> = BTreeMap::new();

        for name in corpus {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let padded: Vec<char> = format!("{START}{name}{END}").chars().collect();
            for window in padded.windows(order.saturating_add(1)) {
                let Some((&next, gram)) = window.split_last() else {
                    continue;
                };
                let count = transitions
                    .entry(gram.iter().collect())
                    .or_default()
                    .entry(next)
                    .or_insert(0);
                *count = count.saturating_add(1);
            }
        }

        let starts: Vec<String> = transitions
            .keys()
            .filter(|gram| gram.starts_with(START))
            .cloned()
            .collect();
        if starts.is_empty() {
            return Err(WorldError::EmptyNameCorpus { order });
        }

        Ok(Self {
            order,
            transitions,
            starts,
        })
    }

    /// A generator trained on the bundled town names.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyNameCorpus`] if the bundled corpus is empty.
    pub fn with_default_corpus() -> Result<Self, WorldError> {
        Self::new(DEFAULT_CORPUS.lines(), DEFAULT_ORDER)
    }

    fn next_char(&self, gram: &str, rng: &mut dyn RngCore) -> Option<char> {
        let followers = self.transitions.get(gram)?;
        let total: u32 = followers.values().sum();
        if total == 0 {
            return None;
        }
        let mut pick = rng.random_range(0..total);
        for (&candidate, &weight) in followers {
            if pick < weight {
                return Some(candidate);
            }
            pick = pick.saturating_sub(weight);
        }
        None
    }
}

impl NameSource for MarkovNameGenerator {
    fn generate_name(&mut self, rng: &mut dyn RngCore, max_length: usize) -> String {
        let Some(start) = self
            .starts
            .get(rng.random_range(0..self.starts.len()))
            .cloned()
        else {
            return String::new();
        };

        let mut chars: Vec<char> = start.chars().collect();
        // One extra slot for the leading start marker.
        while chars.len() <= max_length {
            let gram: String = chars
                .iter()
                .skip(chars.len().saturating_sub(self.order))
                .collect();
            match self.next_char(&gram, rng) {
                Some(END) | None => break,
                Some(next) => chars.push(next),
            }
        }

        let mut name = chars
            .into_iter()
            .filter(|&c| c != START && c != END)
            .take(max_length);
        name.next()
            .map(|first| first.to_uppercase().chain(name).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn default_corpus_trains() {
        let generator = MarkovNameGenerator::with_default_corpus().unwrap();
        assert!(!generator.starts.is_empty());
        assert!(generator.starts.iter().all(|gram| gram.chars().count() == DEFAULT_ORDER));
    }

    #[test]
    fn names_are_capitalised_and_bounded() {
        let mut generator = MarkovNameGenerator::with_default_corpus().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let name = generator.generate_name(&mut rng, 10);
            assert!(!name.is_empty());
            assert!(name.chars().count() <= 10, "{name}");
            assert!(name.chars().next().unwrap().is_uppercase(), "{name}");
        }
    }

    #[test]
    fn single_name_corpus_reproduces_it() {
        let mut generator = MarkovNameGenerator::new(["Kassel"], 2).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generator.generate_name(&mut rng, 20), "Kassel");
        assert_eq!(generator.generate_name(&mut rng, 3), "Kas");
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert!(MarkovNameGenerator::new(["", "  "], 3).is_err());
        assert!(MarkovNameGenerator::new(["Ulm"], 0).is_err());
    }
}
