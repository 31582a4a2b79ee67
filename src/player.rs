use std::fmt;

use serde::{Deserialize, Serialize};


// Transport-assigned address of a device. Unique and stable for the lifetime of a session.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self { PeerId(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self { PeerId::new(id) }
}


// Only meaningful while a round is active. Outside a round everybody is `Normal`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Normal,
    Undercover,
}

impl Role {
    pub fn is_undercover(self) -> bool { self == Role::Undercover }
}


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PeerId,
    pub name: String,
    pub role: Role,
}

impl Player {
    pub fn new(id: PeerId, name: String) -> Self { Player { id, name, role: Role::Normal } }

    pub fn info(&self) -> PlayerInfo { PlayerInfo { id: self.id.clone(), name: self.name.clone() } }
}

// Roster entry as seen in the lobby: roles are never part of it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PeerId,
    pub name: String,
}


pub fn find_player<'a>(players: &'a [Player], id: &PeerId) -> Option<&'a Player> {
    players.iter().find(|p| p.id == *id)
}
