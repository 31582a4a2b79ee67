// JSON codec for the wire envelopes in `event`. The transport itself (connections, framing,
// address brokering) lives outside of this crate.

use std::fmt;

use serde::{Serialize, de};


#[derive(Debug)]
pub enum CommunicationError {
    Serde(serde_json::Error),
    // Valid JSON, but not a tagged object.
    NotAMessage(String),
}

impl fmt::Display for CommunicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationError::Serde(err) => write!(f, "cannot parse message: {err}"),
            CommunicationError::NotAMessage(s) => write!(f, "not a tagged message: {s}"),
        }
    }
}

impl std::error::Error for CommunicationError {}

pub fn encode_obj<T: Serialize>(obj: &T) -> String {
    // Envelopes contain only strings, lists and plain structs.
    serde_json::to_string(obj).unwrap()
}

pub fn parse_obj<T: de::DeserializeOwned>(s: &str) -> Result<T, CommunicationError> {
    let value: serde_json::Value = serde_json::from_str(s).map_err(CommunicationError::Serde)?;
    if !value.get("type").is_some_and(|t| t.is_string()) {
        return Err(CommunicationError::NotAMessage(s.to_owned()));
    }
    serde_json::from_value(value).map_err(CommunicationError::Serde)
}
