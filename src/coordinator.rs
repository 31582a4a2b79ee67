// Host-side session logic. The coordinator is the only writer of canonical state: clients send
// intents, the coordinator validates them, mutates its state and broadcasts the result.
//
// All inbound traffic (transport notifications, client messages, local host actions and timer
// ticks) goes through `apply_event`, one event at a time. There is no locking: the caller
// must feed events from a single queue.

use std::collections::BTreeMap;

use async_std::channel;
use instant::Instant;
use log::{debug, info, warn};
use rand::Rng;
use rand::rngs::StdRng;

use crate::error::{HostCommandError, VoteRejection};
use crate::event::{HostEvent, PeerEvent};
use crate::player::{PeerId, Player, PlayerInfo, Role, find_player};
use crate::round::{Phase, Resolution, Round, VoteProgress, assign_roles};
use crate::rules::Rules;
use crate::session::{EndedView, RoundView, SessionView};
use crate::word_pair::WordPairCatalog;


#[derive(Debug)]
pub enum IncomingEvent {
    // A client connection has opened. Outgoing messages for the client go to the sender.
    Connected(PeerId, channel::Sender<HostEvent>),
    Network(PeerId, PeerEvent),
    // The transport reported that the connection has closed.
    Closed(PeerId),
    Local(HostCommand),
    Tick,
}

// Actions available only to the host user.
#[derive(Clone, Debug)]
pub enum HostCommand {
    StartRound,
    StopDiscussion,
    Restart,
    Vote { target: PeerId },
}


struct Connection {
    events_tx: channel::Sender<HostEvent>,
}

impl Connection {
    fn is_open(&self) -> bool { !self.events_tx.is_closed() }

    // Fire-and-forget: a failed send means the connection is going away, and the transport
    // will report it with a close notification.
    fn send(&self, event: HostEvent) {
        if let Err(err) = self.events_tx.try_send(event) {
            debug!("Dropping outgoing message: {err}");
        }
    }
}

struct Connections {
    map: BTreeMap<PeerId, Connection>,
}

impl Connections {
    fn new() -> Self { Connections { map: BTreeMap::new() } }

    fn add(&mut self, id: PeerId, events_tx: channel::Sender<HostEvent>) -> &Connection {
        self.map.insert(id.clone(), Connection { events_tx });
        &self.map[&id]
    }

    fn remove(&mut self, id: &PeerId) -> bool { self.map.remove(id).is_some() }

    fn broadcast(&self, event: &HostEvent) {
        for conn in self.map.values().filter(|c| c.is_open()) {
            conn.send(event.clone());
        }
    }
}


struct EndedRound {
    message: String,
    players: Vec<Player>,
    eliminated: Vec<PeerId>,
}

enum SessionState {
    Lobby,
    InRound(Round),
    Ended(EndedRound),
}


pub struct SessionCoordinator {
    host_id: PeerId,
    rules: Rules,
    catalog: WordPairCatalog,
    rng: StdRng,
    connections: Connections,
    // Registry of introduced players in join order. The host is always the first one.
    players: Vec<Player>,
    state: SessionState,
    // The host's own vote in the current voting phase, for display.
    host_vote: Option<PeerId>,
    undercover_override: Option<PeerId>, // for tests
}

impl SessionCoordinator {
    pub fn new(
        host_id: PeerId, host_name: String, rules: Rules, catalog: WordPairCatalog, rng: StdRng,
    ) -> Self {
        info!("Hosting session {host_id} as {host_name}");
        SessionCoordinator {
            players: vec![Player::new(host_id.clone(), host_name)],
            host_id,
            rules,
            catalog,
            rng,
            connections: Connections::new(),
            state: SessionState::Lobby,
            host_vote: None,
            undercover_override: None,
        }
    }

    pub fn host_id(&self) -> &PeerId { &self.host_id }
    pub fn rules(&self) -> &Rules { &self.rules }
    pub fn players(&self) -> &[Player] { &self.players }
    pub fn round(&self) -> Option<&Round> {
        match &self.state {
            SessionState::InRound(round) => Some(round),
            _ => None,
        }
    }
    pub fn phase(&self) -> Phase {
        match &self.state {
            SessionState::Lobby => Phase::Lobby,
            SessionState::InRound(round) => round.phase(),
            SessionState::Ended(_) => Phase::Ended,
        }
    }

    pub fn apply_event(
        &mut self, event: IncomingEvent, now: Instant,
    ) -> Result<(), HostCommandError> {
        match event {
            IncomingEvent::Connected(id, events_tx) => {
                info!("Peer {id} connected");
                self.connections.add(id, events_tx).send(HostEvent::RequestIntro);
            }
            IncomingEvent::Network(id, event) => self.process_peer_event(id, event, now),
            IncomingEvent::Closed(id) => self.remove_peer(&id, now),
            IncomingEvent::Local(command) => return self.process_host_command(command, now),
            IncomingEvent::Tick => self.tick(now),
        }
        Ok(())
    }

    fn process_peer_event(&mut self, id: PeerId, event: PeerEvent, now: Instant) {
        debug!("{id} >>> {event:?}");
        match event {
            PeerEvent::Intro { name } => self.accept_introduction(id, name),
            PeerEvent::Vote { voter_id, target_id } => {
                if voter_id != id {
                    warn!("Vote from {id} rejected: {}", VoteRejection::VoterMismatch);
                    return;
                }
                if let Err(rejection) = self.record_vote(&voter_id, &target_id, now) {
                    warn!("Vote {voter_id} -> {target_id} rejected: {rejection}");
                }
            }
            PeerEvent::Unrecognized => {}
        }
    }

    fn process_host_command(
        &mut self, command: HostCommand, now: Instant,
    ) -> Result<(), HostCommandError> {
        match command {
            HostCommand::StartRound => match self.state {
                SessionState::Lobby => self.start_round(now),
                SessionState::InRound(_) => Err(HostCommandError::RoundInProgress),
                SessionState::Ended(_) => self.start_round(now),
            },
            HostCommand::Restart => match self.state {
                SessionState::Ended(_) => self.start_round(now),
                SessionState::InRound(_) => Err(HostCommandError::RoundInProgress),
                SessionState::Lobby => Err(HostCommandError::RoundNotOver),
            },
            HostCommand::StopDiscussion => self.stop_discussion(),
            HostCommand::Vote { target } => {
                if self.host_vote.is_some() {
                    return Err(HostCommandError::VoteRejected(VoteRejection::AlreadyVoted));
                }
                let host_id = self.host_id.clone();
                self.host_vote = Some(target.clone());
                self.record_vote(&host_id, &target, now).map_err(|rejection| {
                    self.host_vote = None;
                    HostCommandError::VoteRejected(rejection)
                })
            }
        }
    }

    // Registers a new player. Repeated introductions from the same peer are ignored.
    pub fn accept_introduction(&mut self, id: PeerId, name: String) {
        if find_player(&self.players, &id).is_some() {
            debug!("Ignoring repeated introduction from {id}");
            return;
        }
        let name = name.trim().to_owned();
        if name.is_empty() {
            warn!("Ignoring introduction from {id}: empty name");
            return;
        }
        info!("Player {name} ({id}) joined");
        self.players.push(Player::new(id, name));
        self.broadcast_player_list();
    }

    // Forgets a peer whose connection has closed. If the undercover leaves mid-round the round
    // goes on regardless.
    pub fn remove_peer(&mut self, id: &PeerId, now: Instant) {
        let had_connection = self.connections.remove(id);
        let num_players = self.players.len();
        self.players.retain(|p| p.id != *id);
        if self.players.len() == num_players {
            if had_connection {
                info!("Peer {id} disconnected before introducing itself");
            }
            return;
        }
        info!("Player {id} left");
        let mut vote_complete = false;
        if let SessionState::InRound(ref mut round) = self.state {
            vote_complete = round.remove_player(id) == VoteProgress::Complete;
        }
        self.broadcast_player_list();
        if vote_complete {
            self.resolve_vote(now);
        }
    }

    pub fn start_round(&mut self, now: Instant) -> Result<(), HostCommandError> {
        if let SessionState::InRound(_) = self.state {
            return Err(HostCommandError::RoundInProgress);
        }
        let num_players = self.players.len();
        let min_players = self.rules.min_players;
        if num_players < min_players {
            return Err(HostCommandError::NotEnoughPlayers { num_players, min_players });
        }
        let players: Vec<Player> = match &self.undercover_override {
            Some(undercover) if find_player(&self.players, undercover).is_some() => self
                .players
                .iter()
                .map(|p| Player {
                    role: if p.id == *undercover { Role::Undercover } else { Role::Normal },
                    ..p.clone()
                })
                .collect(),
            _ => assign_roles(&self.players, &mut self.rng),
        };
        let pair = self.catalog.choose(&mut self.rng);
        let starter = players[self.rng.random_range(0..players.len())].id.clone();
        let budget = self.rules.discussion_budget(players.len());

        self.connections.broadcast(&HostEvent::Start {
            players: players.clone(),
            pair: pair.clone(),
        });
        info!(
            "Round started with {} players, {}s of discussion",
            players.len(),
            budget.as_secs()
        );
        self.players = players.clone();
        self.host_vote = None;
        self.state = SessionState::InRound(Round::new(players, pair, budget, starter, now));
        Ok(())
    }

    pub fn stop_discussion(&mut self) -> Result<(), HostCommandError> {
        let SessionState::InRound(ref mut round) = self.state else {
            return Err(HostCommandError::NotInDiscussion);
        };
        if !round.stop_discussion() {
            return Err(HostCommandError::NotInDiscussion);
        }
        self.on_vote_started();
        Ok(())
    }

    fn tick(&mut self, now: Instant) {
        if let SessionState::InRound(ref mut round) = self.state {
            if round.tick(now) {
                self.on_vote_started();
            }
        }
    }

    fn on_vote_started(&mut self) {
        info!("Voting started");
        self.host_vote = None;
        self.connections.broadcast(&HostEvent::VoteStart);
    }

    pub fn record_vote(
        &mut self, voter: &PeerId, target: &PeerId, now: Instant,
    ) -> Result<(), VoteRejection> {
        let SessionState::InRound(ref mut round) = self.state else {
            return Err(VoteRejection::NotVoting);
        };
        match round.record_vote(voter, target)? {
            VoteProgress::Pending => {
                debug!("Vote recorded: {voter} -> {target}");
            }
            VoteProgress::Complete => {
                debug!("Vote recorded: {voter} -> {target}; all votes are in");
                self.resolve_vote(now);
            }
        }
        Ok(())
    }

    fn resolve_vote(&mut self, now: Instant) {
        let SessionState::InRound(ref mut round) = self.state else {
            return;
        };
        match round.resolve(&mut self.rng, now) {
            Resolution::Continue { eliminated: target_id } => {
                info!("Player {target_id} eliminated, the round goes on");
                self.host_vote = None;
                self.connections.broadcast(&HostEvent::Elimination { target_id });
            }
            Resolution::Revote => {
                info!("All votes were void, voting again");
                self.on_vote_started();
            }
            Resolution::Over { eliminated, outcome, message } => {
                info!("Player {eliminated} eliminated, round over: {outcome:?}");
                let ended = EndedRound {
                    message: message.clone(),
                    players: round.players().to_vec(),
                    eliminated: round.eliminated().to_vec(),
                };
                self.state = SessionState::Ended(ended);
                self.connections.broadcast(&HostEvent::GameEnd { message });
            }
        }
    }

    fn broadcast_player_list(&self) {
        let players = self.players.iter().map(Player::info).collect();
        self.connections.broadcast(&HostEvent::PlayerList { players });
    }

    pub fn view(&self) -> SessionView {
        let infos = |players: &[Player]| players.iter().map(Player::info).collect::<Vec<PlayerInfo>>();
        match &self.state {
            SessionState::Lobby => SessionView::Lobby { players: infos(&self.players) },
            SessionState::InRound(round) => {
                let my_role = round.player(&self.host_id).map_or(Role::Normal, |p| p.role);
                SessionView::InRound(RoundView {
                    phase: round.phase(),
                    players: infos(round.players()),
                    my_role,
                    my_word: round.pair().word_for(my_role).to_owned(),
                    eliminated: round.eliminated().to_vec(),
                    remaining_discussion_secs: round.countdown().remaining_secs(),
                    my_vote: self.host_vote.clone(),
                    starter: round.player(round.starter()).map(|p| p.name.clone()),
                })
            }
            SessionState::Ended(ended) => SessionView::Ended(EndedView {
                message: ended.message.clone(),
                players: infos(&ended.players),
                eliminated: ended.eliminated.clone(),
            }),
        }
    }

    #[allow(non_snake_case)]
    pub fn TEST_override_undercover(&mut self, undercover: PeerId) {
        self.undercover_override = Some(undercover);
    }
}
