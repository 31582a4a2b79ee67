// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.
//
// In-memory star network: one host coordinator and any number of clients connected to it with
// `async_std` channels. Time is fully controlled by the test.

use std::ops;
use std::time::Duration;

use async_std::channel;
use instant::Instant;
use undercover::client::{ClientState, NotableEvent};
use undercover::coordinator::{HostCommand, IncomingEvent, SessionCoordinator};
use undercover::error::{EventError, HostCommandError};
use undercover::event::{HostEvent, PeerEvent};
use undercover::player::PeerId;
use undercover::rules::Rules;
use undercover::session::SessionView;
use undercover::test_util::deterministic_rng;
use undercover::word_pair::WordPairCatalog;


pub struct Host {
    creation_instant: Instant,
    time_elapsed: Duration,
    pub state: SessionCoordinator,
}

impl Host {
    fn new(host_id: &str, host_name: &str) -> Self {
        let state = SessionCoordinator::new(
            PeerId::new(host_id),
            host_name.to_owned(),
            Rules::default(),
            WordPairCatalog::builtin(),
            deterministic_rng(),
        );
        Host {
            creation_instant: Instant::now(),
            time_elapsed: Duration::ZERO,
            state,
        }
    }

    pub fn current_instant(&self) -> Instant { self.creation_instant + self.time_elapsed }

    pub fn apply(&mut self, event: IncomingEvent) -> Result<(), HostCommandError> {
        let now = self.current_instant();
        self.state.apply_event(event, now)
    }
    pub fn command(&mut self, command: HostCommand) -> Result<(), HostCommandError> {
        self.apply(IncomingEvent::Local(command))
    }
    pub fn send_network_event(&mut self, from: &str, event: PeerEvent) {
        println!("{from} >>> {event:?}");
        self.apply(IncomingEvent::Network(PeerId::new(from), event)).unwrap();
    }
}


pub struct Client {
    pub id: PeerId,
    incoming_rx: Option<channel::Receiver<HostEvent>>,
    pub state: ClientState,
    pub notable_events: Vec<NotableEvent>,
}

impl Client {
    fn new(id: &str, name: &str) -> Self {
        Client {
            id: PeerId::new(id),
            incoming_rx: None,
            state: ClientState::new(PeerId::new(id), name.to_owned(), Rules::default()),
            notable_events: vec![],
        }
    }

    #[allow(dead_code)]
    pub fn view(&self) -> SessionView { self.state.view() }

    fn process_outgoing_events(&mut self, host: &mut Host) -> bool {
        let mut something_changed = false;
        while let Some(event) = self.state.next_outgoing_event() {
            something_changed = true;
            host.send_network_event(self.id.as_str(), event);
        }
        something_changed
    }

    fn process_incoming_events(&mut self, now: Instant) -> (bool, Result<(), EventError>) {
        let Some(incoming_rx) = self.incoming_rx.as_ref() else {
            return (false, Ok(()));
        };
        let mut something_changed = false;
        while let Ok(event) = incoming_rx.try_recv() {
            something_changed = true;
            println!("{} <<< {:?}", self.id, event);
            match self.state.process_host_event(event, now) {
                Ok(notable) => self.notable_events.push(notable),
                Err(err) => return (something_changed, Err(err)),
            }
        }
        (something_changed, Ok(()))
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TestClientId(usize);

pub struct World {
    pub host: Host,
    clients: Vec<Client>,
}

#[allow(dead_code)]
impl World {
    // The host always plays as "P1" with id "p1".
    pub fn new() -> Self { World { host: Host::new("p1", "P1"), clients: vec![] } }

    pub fn host_id(&self) -> PeerId { self.host.state.host_id().clone() }

    pub fn new_client(&mut self, id: &str, name: &str) -> TestClientId {
        let idx = TestClientId(self.clients.len());
        self.clients.push(Client::new(id, name));
        idx
    }

    // Opens the connection on both ends: the host learns about it first (and sends
    // `request-intro`), then the client introduces itself.
    pub fn connect(&mut self, client_id: TestClientId) {
        let (incoming_tx, incoming_rx) = channel::unbounded();
        let client = &mut self.clients[client_id.0];
        client.incoming_rx = Some(incoming_rx);
        self.host.apply(IncomingEvent::Connected(client.id.clone(), incoming_tx)).unwrap();
        client.state.connection_opened();
    }

    pub fn join(&mut self, id: &str, name: &str) -> TestClientId {
        let client_id = self.new_client(id, name);
        self.connect(client_id);
        self.process_all_events();
        client_id
    }

    // Host "P1" plus clients "P2", "P3", ...
    pub fn default_clients<const NUM: usize>(&mut self) -> [TestClientId; NUM] {
        std::array::from_fn(|i| {
            let n = i + 2;
            self.join(&format!("p{n}"), &format!("P{n}"))
        })
    }

    pub fn disconnect(&mut self, client_id: TestClientId) {
        let client = &mut self.clients[client_id.0];
        client.incoming_rx = None;
        self.host.apply(IncomingEvent::Closed(client.id.clone())).unwrap();
        self.process_all_events();
    }

    pub fn start_round_with_undercover(&mut self, undercover: &str) {
        self.host.state.TEST_override_undercover(PeerId::new(undercover));
        self.host.command(HostCommand::StartRound).unwrap();
        self.process_all_events();
    }

    pub fn stop_discussion(&mut self) {
        self.host.command(HostCommand::StopDiscussion).unwrap();
        self.process_all_events();
    }

    // Casts a vote from either the host ("p1") or a client, going through the regular
    // intent path.
    pub fn vote(&mut self, voter: &str, target: &str) {
        if PeerId::new(voter) == self.host_id() {
            self.host.command(HostCommand::Vote { target: PeerId::new(target) }).unwrap();
        } else {
            let client = self.client_by_peer_id(voter);
            client.state.vote(PeerId::new(target)).unwrap();
        }
        self.process_all_events();
    }

    pub fn advance_time(&mut self, d: Duration) {
        self.host.time_elapsed += d;
        self.tick();
    }

    pub fn tick(&mut self) {
        self.host.apply(IncomingEvent::Tick).unwrap();
        let now = self.host.current_instant();
        for client in self.clients.iter_mut() {
            client.state.tick(now);
        }
        self.process_all_events();
    }

    fn client_by_peer_id(&mut self, id: &str) -> &mut Client {
        self.clients.iter_mut().find(|c| c.id.as_str() == id).unwrap()
    }

    pub fn process_all_events(&mut self) {
        let now = self.host.current_instant();
        let mut something_changed = true;
        while something_changed {
            something_changed = false;
            for client in self.clients.iter_mut() {
                if client.process_outgoing_events(&mut self.host) {
                    something_changed = true;
                }
                let (change, result) = client.process_incoming_events(now);
                result.unwrap();
                if change {
                    something_changed = true;
                }
            }
        }
    }
}

impl ops::Index<TestClientId> for World {
    type Output = Client;
    fn index(&self, id: TestClientId) -> &Self::Output { &self.clients[id.0] }
}
impl ops::IndexMut<TestClientId> for World {
    fn index_mut(&mut self, id: TestClientId) -> &mut Self::Output { &mut self.clients[id.0] }
}
