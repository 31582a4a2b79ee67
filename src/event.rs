// Wire envelopes. Every message is a JSON object tagged with a `type` field; messages with
// an unknown `type` deserialize to `Unrecognized` and are dropped by the receiver.

use serde::{Deserialize, Serialize};

use crate::player::{PeerId, Player, PlayerInfo};
use crate::word_pair::WordPair;


// Host -> client.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostEvent {
    // Sent as soon as a client connection opens.
    RequestIntro,
    PlayerList {
        players: Vec<PlayerInfo>,
    },
    // Full round snapshot, including every role and both words. Clients must only show the
    // word that matches their own role.
    Start {
        players: Vec<Player>,
        pair: WordPair,
    },
    VoteStart,
    // A normal player has been voted out and the round goes on.
    #[serde(rename_all = "camelCase")]
    Elimination {
        target_id: PeerId,
    },
    GameEnd {
        message: String,
    },
    #[serde(other)]
    Unrecognized,
}

// Client -> host.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PeerEvent {
    Intro {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    Vote {
        voter_id: PeerId,
        target_id: PeerId,
    },
    #[serde(other)]
    Unrecognized,
}
