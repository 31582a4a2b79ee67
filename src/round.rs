// Host-side round state machine:
//
//   Lobby -> RoleAssignment -> Discussion -> Voting -> Resolution -> Discussion | Ended
//
// `Round` covers everything from RoleAssignment to Ended. RoleAssignment and Resolution are
// transient: they are entered and left within the handling of a single event. Only the host
// owns a `Round`; clients mirror it from broadcasts.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use instant::Instant;
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::countdown::{Countdown, CountdownOutcome};
use crate::error::VoteRejection;
use crate::player::{PeerId, Player, PlayerInfo, Role, find_player};
use crate::word_pair::WordPair;


// Remaining non-eliminated players at which the undercover wins.
pub const UNDERCOVER_WINS_AT: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum Phase {
    Lobby,
    RoleAssignment,
    Discussion,
    Voting,
    Resolution,
    Ended,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VoteProgress {
    Pending,
    // Every non-eliminated player has voted. The caller must resolve the vote.
    Complete,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoundOutcome {
    NormalsWin,
    UndercoverWins,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Resolution {
    // Round goes on with a new discussion.
    Continue { eliminated: PeerId },
    // Every vote was void because its target left the session. Voting starts over.
    Revote,
    Over { eliminated: PeerId, outcome: RoundOutcome, message: String },
}

impl RoundOutcome {
    pub fn message(self, undercover_name: &str) -> String {
        match self {
            RoundOutcome::NormalsWin => {
                format!("The normal players win! The undercover was {undercover_name}.")
            }
            RoundOutcome::UndercoverWins => {
                format!("The undercover wins! The undercover was {undercover_name}.")
            }
        }
    }
}


// Assigns exactly one undercover, chosen uniformly among `roster`. Everybody else becomes
// normal, including players who were undercover in a previous round.
pub fn assign_roles(roster: &[Player], rng: &mut impl Rng) -> Vec<Player> {
    assert!(!roster.is_empty());
    let undercover_idx = rng.random_range(0..roster.len());
    roster
        .iter()
        .enumerate()
        .map(|(idx, p)| Player {
            role: if idx == undercover_idx { Role::Undercover } else { Role::Normal },
            ..p.clone()
        })
        .collect()
}


// Votes cast during one voting phase.
#[derive(Clone, Debug, Default)]
pub struct VoteTally {
    voters: BTreeSet<PeerId>,
    counts: BTreeMap<PeerId, u32>,
}

impl VoteTally {
    pub fn new() -> Self { Self::default() }

    pub fn clear(&mut self) {
        self.voters.clear();
        self.counts.clear();
    }

    pub fn has_voted(&self, voter: &PeerId) -> bool { self.voters.contains(voter) }
    pub fn num_voters(&self) -> usize { self.voters.len() }
    pub fn votes_for(&self, target: &PeerId) -> u32 {
        self.counts.get(target).copied().unwrap_or(0)
    }
    pub fn is_empty(&self) -> bool { self.counts.is_empty() }

    // Returns false and changes nothing if `voter` has already voted.
    pub fn cast(&mut self, voter: PeerId, target: PeerId) -> bool {
        if !self.voters.insert(voter) {
            return false;
        }
        *self.counts.entry(target).or_insert(0) += 1;
        true
    }

    // Marks `voter` as done without counting anything.
    pub fn cast_void(&mut self, voter: PeerId) -> bool { self.voters.insert(voter) }

    // All targets sharing the highest count.
    pub fn leaders(&self) -> Vec<PeerId> {
        let Some(&max) = self.counts.values().max() else {
            return vec![];
        };
        self.counts.iter().filter(|&(_, &n)| n == max).map(|(id, _)| id.clone()).collect()
    }

    // Drops the voter mark of a departed peer as well as any votes against them.
    pub fn forget_peer(&mut self, id: &PeerId) {
        self.voters.remove(id);
        self.counts.remove(id);
    }
}


#[derive(Clone, Debug)]
pub struct Round {
    phase: Phase,
    players: Vec<Player>,
    pair: WordPair,
    // Captured at round start, so the undercover can be named even after they leave.
    undercover: PlayerInfo,
    starter: PeerId,
    eliminated: Vec<PeerId>,
    // Players who left the session mid-round.
    departed: Vec<PeerId>,
    tally: VoteTally,
    countdown: Countdown,
}

impl Round {
    // Applies a round snapshot and starts the discussion. `players` must come from
    // `assign_roles`.
    pub fn new(
        players: Vec<Player>, pair: WordPair, discussion_budget: Duration, starter: PeerId,
        now: Instant,
    ) -> Self {
        let undercover = players
            .iter()
            .filter(|p| p.role.is_undercover())
            .exactly_one()
            .unwrap_or_else(|_| panic!("{}", crate::internal_error_message!("need one undercover")))
            .info();
        let mut countdown = Countdown::new(discussion_budget);
        countdown.start(now);
        Round {
            phase: Phase::Discussion,
            players,
            pair,
            undercover,
            starter,
            eliminated: vec![],
            departed: vec![],
            tally: VoteTally::new(),
            countdown,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn players(&self) -> &[Player] { &self.players }
    pub fn pair(&self) -> &WordPair { &self.pair }
    pub fn undercover(&self) -> &PlayerInfo { &self.undercover }
    pub fn starter(&self) -> &PeerId { &self.starter }
    pub fn eliminated(&self) -> &[PeerId] { &self.eliminated }
    pub fn tally(&self) -> &VoteTally { &self.tally }
    pub fn countdown(&self) -> &Countdown { &self.countdown }

    pub fn player(&self, id: &PeerId) -> Option<&Player> { find_player(&self.players, id) }
    pub fn is_eliminated(&self, id: &PeerId) -> bool { self.eliminated.contains(id) }
    pub fn num_active_players(&self) -> usize {
        self.players.iter().filter(|p| !self.is_eliminated(&p.id)).count()
    }

    // Returns true if the countdown has just run out and voting has begun.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Discussion {
            return false;
        }
        match self.countdown.advance(now) {
            CountdownOutcome::Idle => false,
            CountdownOutcome::Expired => {
                self.begin_voting();
                true
            }
        }
    }

    // Returns false if there was no discussion to stop.
    pub fn stop_discussion(&mut self) -> bool {
        if self.phase != Phase::Discussion {
            return false;
        }
        self.begin_voting();
        true
    }

    fn begin_voting(&mut self) {
        self.countdown.stop();
        self.tally.clear();
        self.phase = Phase::Voting;
    }

    pub fn record_vote(
        &mut self, voter: &PeerId, target: &PeerId,
    ) -> Result<VoteProgress, VoteRejection> {
        if self.phase != Phase::Voting {
            return Err(VoteRejection::NotVoting);
        }
        if self.player(voter).is_none() {
            return Err(VoteRejection::UnknownVoter);
        }
        if self.is_eliminated(voter) {
            return Err(VoteRejection::VoterEliminated);
        }
        if self.tally.has_voted(voter) {
            return Err(VoteRejection::AlreadyVoted);
        }
        // The voter may not have seen the departure yet. Their vote is void.
        if self.departed.contains(target) {
            let cast = self.tally.cast_void(voter.clone());
            assert!(cast);
            return Ok(self.vote_progress());
        }
        if voter == target || self.player(target).is_none() || self.is_eliminated(target) {
            return Err(VoteRejection::InvalidTarget);
        }
        let cast = self.tally.cast(voter.clone(), target.clone());
        assert!(cast);
        Ok(self.vote_progress())
    }

    fn vote_progress(&self) -> VoteProgress {
        if self.phase == Phase::Voting && self.tally.num_voters() == self.num_active_players() {
            VoteProgress::Complete
        } else {
            VoteProgress::Pending
        }
    }

    // Removes a departed player. Does not re-check whether the undercover is still around.
    pub fn remove_player(&mut self, id: &PeerId) -> VoteProgress {
        let num_players = self.players.len();
        self.players.retain(|p| p.id != *id);
        if self.players.len() != num_players {
            self.departed.push(id.clone());
        }
        self.tally.forget_peer(id);
        self.vote_progress()
    }

    pub fn resolve(&mut self, rng: &mut impl Rng, now: Instant) -> Resolution {
        assert_eq!(self.phase, Phase::Voting);
        self.phase = Phase::Resolution;
        let leaders = self.tally.leaders();
        if leaders.is_empty() {
            self.begin_voting();
            return Resolution::Revote;
        }
        // Random among ties, so that the outcome does not depend on vote order.
        let eliminated = leaders[rng.random_range(0..leaders.len())].clone();
        self.eliminated.push(eliminated.clone());

        let eliminated_role = self.player(&eliminated).map(|p| p.role);
        let outcome = if eliminated_role == Some(Role::Undercover) {
            Some(RoundOutcome::NormalsWin)
        } else if self.num_active_players() <= UNDERCOVER_WINS_AT {
            Some(RoundOutcome::UndercoverWins)
        } else {
            None
        };
        match outcome {
            Some(outcome) => {
                self.countdown.stop();
                self.phase = Phase::Ended;
                let message = outcome.message(&self.undercover.name);
                Resolution::Over { eliminated, outcome, message }
            }
            None => {
                self.resume_discussion(now);
                Resolution::Continue { eliminated }
            }
        }
    }

    // The countdown continues from where it was stopped, it is not reset to the full budget.
    fn resume_discussion(&mut self, now: Instant) {
        self.tally.clear();
        self.phase = Phase::Discussion;
        self.countdown.start(now);
    }
}


#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn ids(names: &[&str]) -> Vec<PeerId> { names.iter().map(|&n| PeerId::new(n)).collect() }

    #[test]
    fn tally_leaders_are_ties_at_max() {
        let mut tally = VoteTally::new();
        for (voter, target) in [("v1", "A"), ("v2", "A"), ("v3", "B"), ("v4", "B"), ("v5", "C")] {
            assert!(tally.cast(voter.into(), target.into()));
        }
        assert_eq!(tally.leaders(), ids(&["A", "B"]));
    }

    #[test]
    fn tally_ignores_second_vote() {
        let mut tally = VoteTally::new();
        assert!(tally.cast("v1".into(), "A".into()));
        assert!(!tally.cast("v1".into(), "B".into()));
        assert_eq!(tally.votes_for(&"A".into()), 1);
        assert_eq!(tally.votes_for(&"B".into()), 0);
        assert_eq!(tally.num_voters(), 1);
    }

    #[test]
    fn empty_tally_has_no_leaders() {
        assert!(VoteTally::new().leaders().is_empty());
    }

    #[test]
    fn assign_roles_picks_exactly_one_undercover() {
        let roster = ["a", "b", "c", "d"]
            .iter()
            .map(|&id| Player::new(id.into(), id.to_uppercase()))
            .collect_vec();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let players = assign_roles(&roster, &mut rng);
            let undercovers = players.iter().filter(|p| p.role.is_undercover()).collect_vec();
            assert_eq!(undercovers.len(), 1);
            seen.insert(undercovers[0].id.clone());
        }
        assert_eq!(seen.len(), roster.len());
    }
}
