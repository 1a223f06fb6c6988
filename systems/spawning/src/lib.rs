#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave spawning system that assigns shuffled spawn slots to new pirates.

use pirate_defence_core::{Command, WAVE_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pure system that turns wave requests into spawn commands.
///
/// The random source is injected so tests and replays can pin the slot order.
#[derive(Debug)]
pub struct Spawning<R = ChaCha8Rng> {
    rng: R,
}

impl Spawning<ChaCha8Rng> {
    /// Creates a spawning system backed by a seeded ChaCha generator.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Spawning<R> {
    /// Creates a spawning system drawing slots from the provided generator.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Emits the command that appends one wave with the provided life bonus.
    pub fn spawn_wave(&mut self, bonus_life: i32, out: &mut Vec<Command>) {
        let slots = self.draw_slots();
        out.push(Command::SpawnWave { slots, bonus_life });
    }

    /// Draws every spawn slot exactly once, in random order.
    pub fn draw_slots(&mut self) -> [u8; WAVE_SIZE] {
        let mut pool: Vec<u8> = (0..WAVE_SIZE as u8).collect();
        let mut slots = [0; WAVE_SIZE];
        for slot in &mut slots {
            let index = self.rng.gen_range(0..pool.len());
            *slot = pool.swap_remove(index);
        }
        slots
    }
}
