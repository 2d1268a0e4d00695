//! Dice sources.
//!
//! The game loop never calls an RNG directly for dice; it asks a
//! [`DiceSource`]. Production games use [`RandomDice`], tests script the
//! exact sequence with [`ScriptedDice`].

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Something that produces dice values in `1..=sides`.
pub trait DiceSource {
    /// Roll once.
    fn roll(&mut self) -> u32;

    /// Number of faces.
    fn sides(&self) -> u32;
}

/// A fair die driven by a seeded RNG.
#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: StdRng,
    sides: u32,
}

impl RandomDice {
    /// A die with `sides` faces (at least one) seeded with `seed`.
    pub fn new(sides: u32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sides: sides.max(1),
        }
    }
}

impl DiceSource for RandomDice {
    fn roll(&mut self) -> u32 {
        self.rng.random_range(1..=self.sides)
    }

    fn sides(&self) -> u32 {
        self.sides
    }
}

/// A die that returns a fixed sequence, then repeats a fallback value.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    values: VecDeque<u32>,
    fallback: u32,
    sides: u32,
}

impl ScriptedDice {
    /// Roll `values` in order, then `fallback` forever.
    pub fn new(values: impl IntoIterator<Item = u32>, fallback: u32, sides: u32) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback,
            sides,
        }
    }

    /// A die that always shows `value`.
    pub fn constant(value: u32, sides: u32) -> Self {
        Self::new([], value, sides)
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self) -> u32 {
        self.values.pop_front().unwrap_or(self.fallback)
    }

    fn sides(&self) -> u32 {
        self.sides
    }
}
