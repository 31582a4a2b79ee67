// Peer client: a read-only mirror of the host's session. The mirror changes only in response to
// host messages; the client never decides roles, words or phase changes on its own. The only
// local state is what is needed for display (countdown, own vote).

use std::collections::VecDeque;

use instant::Instant;
use log::{debug, info};

use crate::countdown::Countdown;
use crate::error::{EventError, JoinError, VoteRejection};
use crate::event::{HostEvent, PeerEvent};
use crate::internal_error_message;
use crate::player::{PeerId, Player, PlayerInfo, Role, find_player};
use crate::round::Phase;
use crate::rules::Rules;
use crate::session::{EndedView, RoundView, SessionView};
use crate::word_pair::WordPair;


// Checks a join request before any connection attempt is made. Returns the host id to connect
// to.
pub fn validate_join(my_id: &PeerId, my_name: &str, join_code: &str) -> Result<PeerId, JoinError> {
    if my_name.trim().is_empty() {
        return Err(JoinError::MissingPlayerName);
    }
    let join_code = join_code.trim();
    if join_code.is_empty() {
        return Err(JoinError::MissingJoinCode);
    }
    if join_code == my_id.as_str() {
        return Err(JoinError::SelfJoinAttempt);
    }
    Ok(PeerId::new(join_code))
}


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NotableEvent {
    None,
    LobbyUpdated,
    RoundStarted,
    VotingStarted,
    PlayerEliminated(PeerId),
    RoundEnded(String),
}

#[derive(Clone, Debug)]
struct MirroredRound {
    phase: Phase,
    players: Vec<Player>,
    pair: WordPair,
    my_role: Role,
    eliminated: Vec<PeerId>,
    // Display only. Expiry is ignored: voting starts when the host says so.
    countdown: Countdown,
    my_vote: Option<PeerId>,
}

#[derive(Clone, Debug)]
enum ClientSession {
    Uninitialized,
    Lobby,
    InRound(MirroredRound),
    Ended(EndedView),
}


pub struct ClientState {
    my_id: PeerId,
    my_name: String,
    rules: Rules,
    introduced: bool,
    // Latest roster from the host. Kept up to date even during a round.
    roster: Vec<PlayerInfo>,
    session: ClientSession,
    outgoing_events: VecDeque<PeerEvent>,
}

impl ClientState {
    pub fn new(my_id: PeerId, my_name: String, rules: Rules) -> Self {
        ClientState {
            my_id,
            my_name: my_name.trim().to_owned(),
            rules,
            introduced: false,
            roster: vec![],
            session: ClientSession::Uninitialized,
            outgoing_events: VecDeque::new(),
        }
    }

    pub fn my_id(&self) -> &PeerId { &self.my_id }
    pub fn my_name(&self) -> &str { &self.my_name }
    pub fn roster(&self) -> &[PlayerInfo] { &self.roster }

    pub fn next_outgoing_event(&mut self) -> Option<PeerEvent> { self.outgoing_events.pop_front() }

    // Must be called once the connection to the host is open.
    pub fn connection_opened(&mut self) { self.introduce(); }

    // There is no way to resume a session: the caller should shut down.
    pub fn connection_closed(&mut self) -> EventError {
        info!("Connection to the host closed");
        EventError::ConnectionLost
    }

    fn introduce(&mut self) {
        if self.introduced {
            return;
        }
        self.introduced = true;
        self.outgoing_events.push_back(PeerEvent::Intro { name: self.my_name.clone() });
    }

    // Local checks only. The host validates the vote again.
    pub fn vote(&mut self, target: PeerId) -> Result<(), VoteRejection> {
        let ClientSession::InRound(ref mut round) = self.session else {
            return Err(VoteRejection::NotVoting);
        };
        if round.phase != Phase::Voting {
            return Err(VoteRejection::NotVoting);
        }
        if round.my_vote.is_some() {
            return Err(VoteRejection::AlreadyVoted);
        }
        if round.eliminated.contains(&self.my_id) {
            return Err(VoteRejection::VoterEliminated);
        }
        if target == self.my_id
            || find_player(&round.players, &target).is_none()
            || round.eliminated.contains(&target)
        {
            return Err(VoteRejection::InvalidTarget);
        }
        round.my_vote = Some(target.clone());
        self.outgoing_events.push_back(PeerEvent::Vote {
            voter_id: self.my_id.clone(),
            target_id: target,
        });
        Ok(())
    }

    pub fn tick(&mut self, now: Instant) {
        if let ClientSession::InRound(ref mut round) = self.session {
            let _ = round.countdown.advance(now);
        }
    }

    pub fn process_host_event(
        &mut self, event: HostEvent, now: Instant,
    ) -> Result<NotableEvent, EventError> {
        debug!("<<< {event:?}");
        match event {
            HostEvent::RequestIntro => {
                self.introduce();
                Ok(NotableEvent::None)
            }
            HostEvent::PlayerList { players } => {
                self.roster = players;
                match self.session {
                    ClientSession::Uninitialized | ClientSession::Lobby => {
                        self.session = ClientSession::Lobby;
                        Ok(NotableEvent::LobbyUpdated)
                    }
                    ClientSession::InRound(ref mut round) => {
                        // Late joiners wait for the next round, but whoever left is gone from
                        // this one too.
                        let roster = &self.roster;
                        round.players.retain(|p| roster.iter().any(|r| r.id == p.id));
                        Ok(NotableEvent::None)
                    }
                    ClientSession::Ended(_) => Ok(NotableEvent::None),
                }
            }
            HostEvent::Start { players, pair } => {
                let Some(me) = find_player(&players, &self.my_id) else {
                    return Err(EventError::CannotApplyEvent(internal_error_message!(
                        "round started without player {}",
                        self.my_id
                    )));
                };
                let my_role = me.role;
                let mut countdown = Countdown::new(self.rules.discussion_budget(players.len()));
                countdown.start(now);
                self.session = ClientSession::InRound(MirroredRound {
                    phase: Phase::Discussion,
                    players,
                    pair,
                    my_role,
                    eliminated: vec![],
                    countdown,
                    my_vote: None,
                });
                Ok(NotableEvent::RoundStarted)
            }
            HostEvent::VoteStart => {
                let round = self.round_mut("start voting")?;
                round.countdown.stop();
                round.my_vote = None;
                round.phase = Phase::Voting;
                Ok(NotableEvent::VotingStarted)
            }
            HostEvent::Elimination { target_id } => {
                let round = self.round_mut("eliminate player")?;
                round.eliminated.push(target_id.clone());
                round.my_vote = None;
                round.phase = Phase::Discussion;
                round.countdown.start(now);
                Ok(NotableEvent::PlayerEliminated(target_id))
            }
            HostEvent::GameEnd { message } => {
                let (players, eliminated) = match &self.session {
                    ClientSession::InRound(round) => (
                        round.players.iter().map(Player::info).collect(),
                        round.eliminated.clone(),
                    ),
                    _ => (self.roster.clone(), vec![]),
                };
                self.session = ClientSession::Ended(EndedView {
                    message: message.clone(),
                    players,
                    eliminated,
                });
                Ok(NotableEvent::RoundEnded(message))
            }
            HostEvent::Unrecognized => Ok(NotableEvent::None),
        }
    }

    fn round_mut(&mut self, action: &str) -> Result<&mut MirroredRound, EventError> {
        match self.session {
            ClientSession::InRound(ref mut round) => Ok(round),
            _ => Err(EventError::CannotApplyEvent(format!("Cannot {action}: no round in progress"))),
        }
    }

    pub fn view(&self) -> SessionView {
        match &self.session {
            ClientSession::Uninitialized => SessionView::Uninitialized,
            ClientSession::Lobby => SessionView::Lobby { players: self.roster.clone() },
            ClientSession::InRound(round) => SessionView::InRound(RoundView {
                phase: round.phase,
                players: round.players.iter().map(Player::info).collect(),
                my_role: round.my_role,
                my_word: round.pair.word_for(round.my_role).to_owned(),
                eliminated: round.eliminated.clone(),
                remaining_discussion_secs: round.countdown.remaining_secs(),
                my_vote: round.my_vote.clone(),
                starter: None,
            }),
            ClientSession::Ended(ended) => SessionView::Ended(ended.clone()),
        }
    }
}
