use std::io::{self, BufRead};
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, anyhow};
use instant::Instant;
use log::{error, info, warn};
use tungstenite::protocol;
use undercover::client::{ClientState, NotableEvent, validate_join};
use undercover::event::{HostEvent, PeerEvent};
use undercover::player::PeerId;
use undercover::rules::Rules;
use undercover::session::SessionView;
use url::Url;

use crate::network::{self, SocketError};
use crate::tui;


pub const TICK_PERIOD: Duration = Duration::from_millis(100);

pub struct ClientConfig {
    pub host_address: String,
    pub join_code: String,
    pub player_name: String,
}

enum IncomingEvent {
    Network(HostEvent),
    ConnectionClosed,
    Terminal(String),
    Tick,
}

// Resolves `vote <name>` typed by the user against the current view.
pub fn parse_vote_target(view: &SessionView, my_id: &PeerId, arg: &str) -> Result<PeerId, String> {
    let Some(round) = view.round() else {
        return Err("No round in progress".to_owned());
    };
    round.find_target(my_id, arg.trim()).ok_or_else(|| format!("Cannot vote for '{}'", arg.trim()))
}

pub fn spawn_terminal_reader<E: Send + 'static>(
    tx: mpsc::Sender<E>, wrap: impl Fn(String) -> E + Send + 'static,
) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(wrap(line)).is_err() {
                break;
            }
        }
    });
}

pub fn spawn_ticker<E: Send + 'static>(tx: mpsc::Sender<E>, tick: impl Fn() -> E + Send + 'static) {
    thread::spawn(move || {
        loop {
            thread::sleep(TICK_PERIOD);
            if tx.send(tick()).is_err() {
                break;
            }
        }
    });
}

pub fn run(config: ClientConfig) -> anyhow::Result<()> {
    let my_id = network::new_peer_id();
    let host_id = validate_join(&my_id, &config.player_name, &config.join_code)?;

    let mut url = Url::parse(&format!("ws://{}", config.host_address))
        .with_context(|| format!("Invalid host address '{}'", config.host_address))?;
    url.set_path(host_id.as_str());
    url.query_pairs_mut().append_pair(network::PEER_ID_PARAM, my_id.as_str());
    println!("Connecting to {}...", config.host_address);
    let stream = TcpStream::connect(config.host_address.as_str())
        .with_context(|| format!("Cannot connect to {}", config.host_address))?;
    let (mut socket_in, _) = tungstenite::client(url.as_str(), stream)
        .map_err(|err| anyhow!("Cannot join session {host_id}: {err}"))?;
    let mut socket_out = network::clone_websocket(&socket_in, protocol::Role::Client)?;

    let (tx, rx) = mpsc::channel();
    let tx_net = tx.clone();
    thread::spawn(move || {
        loop {
            match network::read_obj::<HostEvent, _>(&mut socket_in) {
                Ok(event) => {
                    if tx_net.send(IncomingEvent::Network(event)).is_err() {
                        break;
                    }
                }
                Err(SocketError::Protocol(err)) => warn!("Ignoring message: {err}"),
                Err(err) => {
                    if !err.is_connection_closed() {
                        warn!("Connection error: {err}");
                    }
                    let _ = tx_net.send(IncomingEvent::ConnectionClosed);
                    break;
                }
            }
        }
    });
    spawn_terminal_reader(tx.clone(), IncomingEvent::Terminal);
    spawn_ticker(tx, || IncomingEvent::Tick);

    let (host_tx, host_rx) = mpsc::channel::<PeerEvent>();
    thread::spawn(move || {
        for event in host_rx {
            if let Err(err) = network::write_obj(&mut socket_out, &event) {
                warn!("Cannot send {event:?}: {err}");
                break;
            }
        }
    });

    // Improvement potential: Let the host push its rules with the `start` message, so that the
    //   display countdown matches a non-default discussion time.
    let mut client_state = ClientState::new(my_id.clone(), config.player_name, Rules::default());
    client_state.connection_opened();
    let mut command_error = None;
    let mut last_screen = None;
    for event in rx {
        match event {
            IncomingEvent::Network(event) => {
                match client_state.process_host_event(event, Instant::now()) {
                    Ok(NotableEvent::PlayerEliminated(id)) => {
                        let view = client_state.view();
                        let name = view.players().iter().find(|p| p.id == id).map(|p| p.name.as_str());
                        info!("{} has been eliminated", name.unwrap_or(id.as_str()));
                    }
                    Ok(_) => {}
                    Err(err) => error!("{err}"),
                }
            }
            IncomingEvent::ConnectionClosed => {
                return Err(client_state.connection_closed().into());
            }
            IncomingEvent::Terminal(line) => {
                let line = line.trim();
                command_error = if line == "quit" {
                    return Ok(());
                } else if let Some(arg) = line.strip_prefix("vote ") {
                    parse_vote_target(&client_state.view(), &my_id, arg).and_then(|target| {
                        client_state.vote(target).map_err(|err| format!("Cannot vote: {err}"))
                    })
                    .err()
                } else {
                    Some(format!("Unknown command: '{line}'. Commands: vote <name>, quit"))
                };
            }
            IncomingEvent::Tick => client_state.tick(Instant::now()),
        }
        while let Some(event) = client_state.next_outgoing_event() {
            host_tx.send(event).map_err(|_| anyhow!("Connection to the host is gone"))?;
        }
        let mut screen = tui::render_session(&client_state.view(), &my_id);
        if let Some(err) = command_error.take() {
            screen += &format!("\n{}\n", console::style(err).red());
        }
        if last_screen.as_ref() != Some(&screen) {
            println!("{screen}");
            last_screen = Some(screen);
        }
    }
    Err(anyhow!("Unexpected end of events stream"))
}
