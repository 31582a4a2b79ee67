// WebSocket transport. Every session is a star: clients connect to
//   ws://<host address>/<join code>?peer=<client id>
// and exchange JSON envelopes from `undercover::event` as text frames.

use std::fmt;
use std::io;
use std::net::TcpStream;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Serialize, de};
use tungstenite::protocol::Role;
use tungstenite::{Message, WebSocket};
use undercover::network::{CommunicationError, encode_obj, parse_obj};
use undercover::player::PeerId;


pub const PORT: u16 = 38617;

pub const PEER_ID_PARAM: &str = "peer";

const PEER_ID_LEN: usize = 8;


// Doubles as the join code when hosting.
pub fn new_peer_id() -> PeerId {
    let id: String = rand::rng().sample_iter(Alphanumeric).take(PEER_ID_LEN).map(char::from).collect();
    PeerId::new(id.to_lowercase())
}


#[derive(Debug)]
pub enum SocketError {
    Socket(tungstenite::Error),
    Protocol(CommunicationError),
    UnexpectedFrame(String),
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketError::Socket(err) => write!(f, "{err}"),
            SocketError::Protocol(err) => write!(f, "{err}"),
            SocketError::UnexpectedFrame(frame) => write!(f, "expected text, got {frame}"),
        }
    }
}

impl std::error::Error for SocketError {}

impl SocketError {
    pub fn is_connection_closed(&self) -> bool {
        matches!(
            self,
            SocketError::Socket(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)
        )
    }
}

pub fn write_obj<T, S>(socket: &mut WebSocket<S>, obj: &T) -> Result<(), SocketError>
where
    T: Serialize,
    S: io::Read + io::Write,
{
    socket.send(Message::text(encode_obj(obj))).map_err(SocketError::Socket)
}

// Skips control frames. Messages that are not valid envelopes are reported as errors, so that
// the caller can decide whether to drop them.
pub fn read_obj<T, S>(socket: &mut WebSocket<S>) -> Result<T, SocketError>
where
    T: de::DeserializeOwned,
    S: io::Read + io::Write,
{
    loop {
        match socket.read().map_err(SocketError::Socket)? {
            Message::Text(text) => {
                return parse_obj(text.as_str()).map_err(SocketError::Protocol);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            Message::Close(_) => {
                return Err(SocketError::Socket(tungstenite::Error::ConnectionClosed));
            }
            Message::Binary(data) => {
                return Err(SocketError::UnexpectedFrame(format!("{} binary bytes", data.len())));
            }
        }
    }
}


// Improvement potential: Instead of cloning the socket, call `TcpStream::set_nonblocking` on
//   the underlying stream and do reads and writes in the same thread.
pub fn clone_websocket(socket: &WebSocket<TcpStream>, role: Role) -> io::Result<WebSocket<TcpStream>> {
    let stream = socket.get_ref().try_clone()?;
    let config = *socket.get_config();
    Ok(WebSocket::from_raw_socket(stream, role, Some(config)))
}
