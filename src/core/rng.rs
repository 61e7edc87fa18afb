//! RNG module - the game's linear congruential generator
//!
//! Not remotely cryptographic; reproducibility is only needed within a single
//! run. Seeded once from wall-clock time at startup.

/// Linear congruential generator, `state' = 1103515245 * state + 12345`,
/// returning the low 30 bits of each new state.
#[derive(Debug, Clone)]
pub struct GameRng {
    state: u32,
}

impl GameRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Reset the generator state.
    pub fn seed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Next draw, in [0, 2^30).
    pub fn next_u30(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.state & ((1 << 30) - 1)
    }

    /// Next draw reduced modulo `max`.
    pub fn next_mod(&mut self, max: u32) -> u32 {
        self.next_u30() % max
    }
}
