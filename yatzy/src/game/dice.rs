//! Sources of die faces for a session.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::VecDeque;

use super::constants::MAX_FACE;

/// Produces one die face in `1..=6` per call.
pub trait DiceRoller: Send + Sync + std::fmt::Debug {
    fn roll_die(&mut self) -> u8;
}

/// Uniformly random faces.
#[derive(Debug)]
pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDice {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for RandomDice {
    fn roll_die(&mut self) -> u8 {
        self.rng.random_range(1..=MAX_FACE)
    }
}

/// Replays a fixed sequence of faces, then falls back to ones.
#[derive(Debug, Default)]
pub struct LoadedDice {
    faces: VecDeque<u8>,
}

impl LoadedDice {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    /// Queue more faces behind the ones already loaded.
    pub fn load(&mut self, faces: impl IntoIterator<Item = u8>) {
        self.faces.extend(faces);
    }
}

impl DiceRoller for LoadedDice {
    fn roll_die(&mut self) -> u8 {
        self.faces
            .pop_front()
            .filter(|face| (1..=MAX_FACE).contains(face))
            .unwrap_or(1)
    }
}
