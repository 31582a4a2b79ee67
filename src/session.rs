// What a device renders. Both the host and the clients produce a `SessionView`; a front-end
// never needs to know which of them it is talking to, except for the host-only actions.

use crate::countdown::secs_to_mmss;
use crate::player::{PeerId, PlayerInfo, Role};
use crate::round::Phase;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SessionView {
    // Client that has not heard from the host yet.
    Uninitialized,
    Lobby { players: Vec<PlayerInfo> },
    InRound(RoundView),
    Ended(EndedView),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RoundView {
    // Either `Discussion` or `Voting`.
    pub phase: Phase,
    pub players: Vec<PlayerInfo>,
    pub my_role: Role,
    // Only the word matching `my_role`.
    pub my_word: String,
    pub eliminated: Vec<PeerId>,
    pub remaining_discussion_secs: u64,
    pub my_vote: Option<PeerId>,
    // Host only: the player who opens the discussion.
    pub starter: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EndedView {
    pub message: String,
    pub players: Vec<PlayerInfo>,
    pub eliminated: Vec<PeerId>,
}

impl SessionView {
    pub fn players(&self) -> &[PlayerInfo] {
        match self {
            SessionView::Uninitialized => &[],
            SessionView::Lobby { players } => players,
            SessionView::InRound(round) => &round.players,
            SessionView::Ended(ended) => &ended.players,
        }
    }

    pub fn round(&self) -> Option<&RoundView> {
        match self {
            SessionView::InRound(round) => Some(round),
            _ => None,
        }
    }
}

impl RoundView {
    pub fn is_eliminated(&self, id: &PeerId) -> bool { self.eliminated.contains(id) }

    pub fn timer_string(&self) -> String { secs_to_mmss(self.remaining_discussion_secs) }

    pub fn can_vote(&self, my_id: &PeerId) -> bool {
        self.phase == Phase::Voting && self.my_vote.is_none() && !self.is_eliminated(my_id)
    }

    // Players `my_id` may vote for: everybody still in the game except themselves.
    pub fn vote_targets<'a>(&'a self, my_id: &'a PeerId) -> impl Iterator<Item = &'a PlayerInfo> {
        self.players.iter().filter(move |p| p.id != *my_id && !self.is_eliminated(&p.id))
    }

    // Resolves a vote target typed by a user: either a player name or a peer id.
    pub fn find_target(&self, my_id: &PeerId, name_or_id: &str) -> Option<PeerId> {
        self.vote_targets(my_id)
            .find(|p| p.name == name_or_id || p.id.as_str() == name_or_id)
            .map(|p| p.id.clone())
    }
}
