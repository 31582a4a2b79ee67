// Test utilities shared by unit and integration tests.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::player::{PeerId, Player};


// In theory random tests verify statistical properties that should always hold, but let's fix
// the seed to avoid sporadic failures.
pub fn deterministic_rng() -> StdRng { StdRng::from_seed([0; 32]) }

pub fn seeded_rng(seed: u64) -> StdRng { StdRng::seed_from_u64(seed) }

pub fn sample_players(names: &[&str]) -> Vec<Player> {
    names
        .iter()
        .map(|&name| Player::new(PeerId::new(name.to_lowercase()), name.to_owned()))
        .collect()
}
