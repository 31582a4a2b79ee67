// Hosting device: runs the session coordinator and plays in the session at the same time.
//
// Every connection gets a reader and a writer thread. All session mutations happen on the main
// thread, which consumes a single event queue fed by the connections, the terminal and the
// ticker.

use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, anyhow, bail};
use async_std::channel;
use instant::Instant;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol;
use undercover::coordinator::{HostCommand, IncomingEvent, SessionCoordinator};
use undercover::error::JoinError;
use undercover::event::{HostEvent, PeerEvent};
use undercover::player::PeerId;
use undercover::session::SessionView;

use crate::client_main::{parse_vote_target, spawn_terminal_reader, spawn_ticker};
use crate::host_config::HostConfig;
use crate::network::{self, SocketError};
use crate::tui;


enum HostLoopEvent {
    Session(IncomingEvent),
    Terminal(String),
}

enum TerminalAction {
    Command(HostCommand),
    Quit,
}

const HELP: &str = "Commands: start, stop, vote <name>, restart, quit";

fn parse_terminal_command(
    line: &str, view: &SessionView, my_id: &PeerId,
) -> Result<TerminalAction, String> {
    let line = line.trim();
    match line {
        "start" => Ok(TerminalAction::Command(HostCommand::StartRound)),
        "stop" => Ok(TerminalAction::Command(HostCommand::StopDiscussion)),
        "restart" => Ok(TerminalAction::Command(HostCommand::Restart)),
        "quit" => Ok(TerminalAction::Quit),
        _ => match line.strip_prefix("vote ") {
            Some(arg) => {
                let target = parse_vote_target(view, my_id, arg)?;
                Ok(TerminalAction::Command(HostCommand::Vote { target }))
            }
            None => Err(format!("Unknown command: '{line}'. {HELP}")),
        },
    }
}

// Clients connect to `/<host id>?peer=<client id>`.
fn peer_id_from_request(request: &Request, host_id: &PeerId) -> Option<PeerId> {
    if request.uri().path().trim_start_matches('/') != host_id.as_str() {
        return None;
    }
    let query = request.uri().query()?;
    let (_, id) = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == network::PEER_ID_PARAM)?;
    let id = id.trim();
    if id.is_empty() || id == host_id.as_str() {
        return None;
    }
    Some(PeerId::new(id))
}

fn serve_peer(
    stream: TcpStream, host_id: &PeerId, events_tx: mpsc::Sender<HostLoopEvent>,
) -> anyhow::Result<()> {
    let mut peer_id = None;
    let mut socket_in = tungstenite::accept_hdr(stream, |request: &Request, response: Response| {
        match peer_id_from_request(request, host_id) {
            Some(id) => {
                peer_id = Some(id);
                Ok(response)
            }
            None => {
                let mut error = ErrorResponse::new(Some("Unknown session".to_owned()));
                *error.status_mut() = StatusCode::NOT_FOUND;
                Err(error)
            }
        }
    })
    .map_err(|err| anyhow!("Handshake failed: {err}"))?;
    let Some(peer_id) = peer_id else {
        bail!("Handshake succeeded without a peer id");
    };
    let mut socket_out = network::clone_websocket(&socket_in, protocol::Role::Server)?;

    let (outgoing_tx, outgoing_rx) = channel::unbounded::<HostEvent>();
    events_tx
        .send(HostLoopEvent::Session(IncomingEvent::Connected(peer_id.clone(), outgoing_tx)))
        .map_err(|_| anyhow!("Session is over"))?;

    let writer_peer_id = peer_id.clone();
    thread::spawn(move || {
        // Ends when the coordinator drops the connection.
        while let Ok(event) = async_std::task::block_on(outgoing_rx.recv()) {
            if let Err(err) = network::write_obj(&mut socket_out, &event) {
                warn!("Cannot send to {writer_peer_id}: {err}");
                break;
            }
        }
        // Unblocks the reader, so that the close notification is sent.
        let _ = socket_out.get_ref().shutdown(Shutdown::Both);
    });

    loop {
        match network::read_obj::<PeerEvent, _>(&mut socket_in) {
            Ok(event) => {
                let event = HostLoopEvent::Session(IncomingEvent::Network(peer_id.clone(), event));
                if events_tx.send(event).is_err() {
                    return Ok(());
                }
            }
            Err(SocketError::Protocol(err)) => warn!("Ignoring message from {peer_id}: {err}"),
            Err(err) => {
                if !err.is_connection_closed() {
                    warn!("Connection to {peer_id} failed: {err}");
                }
                break;
            }
        }
    }
    let _ = events_tx.send(HostLoopEvent::Session(IncomingEvent::Closed(peer_id)));
    Ok(())
}

pub fn run(config: HostConfig, player_name: String) -> anyhow::Result<()> {
    let player_name = player_name.trim().to_owned();
    if player_name.is_empty() {
        return Err(JoinError::MissingPlayerName.into());
    }
    let rules = config.rules()?;
    let catalog = config.word_pairs()?;
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let host_id = network::new_peer_id();
    let listener = TcpListener::bind(&config.listen_address)
        .with_context(|| format!("Cannot listen on {}", config.listen_address))?;
    println!("Listening on {}. Join code: {host_id}", listener.local_addr()?);
    println!("{HELP}");

    let (tx, rx) = mpsc::channel();
    spawn_terminal_reader(tx.clone(), HostLoopEvent::Terminal);
    spawn_ticker(tx.clone(), || HostLoopEvent::Session(IncomingEvent::Tick));
    let listener_host_id = host_id.clone();
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let tx = tx.clone();
                    let host_id = listener_host_id.clone();
                    thread::spawn(move || {
                        if let Err(err) = serve_peer(stream, &host_id, tx) {
                            warn!("{err:#}");
                        }
                    });
                }
                Err(err) => warn!("Cannot establish connection: {err}"),
            }
        }
    });

    let mut coordinator =
        SessionCoordinator::new(host_id.clone(), player_name, rules, catalog, rng);
    let mut last_screen = None;
    for event in rx {
        let mut command_error = None;
        match event {
            HostLoopEvent::Session(event) => {
                // Only local commands can fail.
                let _ = coordinator.apply_event(event, Instant::now());
            }
            HostLoopEvent::Terminal(line) => {
                match parse_terminal_command(&line, &coordinator.view(), &host_id) {
                    Ok(TerminalAction::Quit) => {
                        info!("Session closed by the host");
                        return Ok(());
                    }
                    Ok(TerminalAction::Command(command)) => {
                        if let Err(err) =
                            coordinator.apply_event(IncomingEvent::Local(command), Instant::now())
                        {
                            command_error = Some(err.to_string());
                        }
                    }
                    Err(err) => command_error = Some(err),
                }
            }
        }
        let view = coordinator.view();
        let mut screen = tui::render_session(&view, &host_id);
        if let SessionView::Lobby { .. } = view {
            screen = format!("Join code: {host_id}\n{screen}");
        }
        if let Some(err) = command_error {
            screen += &format!("\n{}\n", console::style(err).red());
        }
        if last_screen.as_ref() != Some(&screen) {
            println!("{screen}");
            last_screen = Some(screen);
        }
    }
    Err(anyhow!("Unexpected end of events stream"))
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn request(uri: &str) -> Request { Request::builder().uri(uri).body(()).unwrap() }

    #[test]
    fn peer_id_from_handshake() {
        let host_id = PeerId::new("host1");
        assert_eq!(
            peer_id_from_request(&request("/host1?peer=abc"), &host_id),
            Some(PeerId::new("abc"))
        );
        assert_eq!(peer_id_from_request(&request("/other?peer=abc"), &host_id), None);
        assert_eq!(peer_id_from_request(&request("/host1"), &host_id), None);
        assert_eq!(peer_id_from_request(&request("/host1?peer=host1"), &host_id), None);
        assert_eq!(peer_id_from_request(&request("/host1?peer=%20"), &host_id), None);
    }

    #[test]
    fn terminal_commands() {
        let my_id = PeerId::new("host1");
        let lobby = SessionView::Lobby { players: vec![] };
        assert!(matches!(
            parse_terminal_command(" start ", &lobby, &my_id),
            Ok(TerminalAction::Command(HostCommand::StartRound))
        ));
        assert!(matches!(parse_terminal_command("quit", &lobby, &my_id), Ok(TerminalAction::Quit)));
        assert_eq!(
            parse_terminal_command("vote Bob", &lobby, &my_id).err(),
            Some("No round in progress".to_owned())
        );
        assert!(parse_terminal_command("dance", &lobby, &my_id).is_err());
    }
}
