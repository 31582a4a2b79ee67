use std::time::Duration;

use serde::{Deserialize, Serialize};


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rules {
    // Checked only when a round is started, not when players join or leave later.
    pub min_players: usize,
    // Must be a whole number of seconds.
    pub discussion_time_per_player: Duration,
}

impl Rules {
    pub fn discussion_budget(&self, num_players: usize) -> Duration {
        let num_players = u32::try_from(num_players).unwrap_or(u32::MAX);
        self.discussion_time_per_player.saturating_mul(num_players)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            min_players: 3,
            discussion_time_per_player: Duration::from_secs(60),
        }
    }
}
