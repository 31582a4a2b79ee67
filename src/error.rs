use std::fmt;


#[macro_export]
macro_rules! internal_error_message {
    () => {
        format!("Internal error at {}:{}.", file!(), line!())
    };
    ($($arg:tt)+) => {
        format!("Internal error at {}:{}: {}.", file!(), line!(), format!($($arg)*))
    };
}


// Raised before any connection attempt is made. Nothing is mutated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JoinError {
    MissingPlayerName,
    MissingJoinCode,
    // The join code points at this very device.
    SelfJoinAttempt,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::MissingPlayerName => write!(f, "Please enter your name."),
            JoinError::MissingJoinCode => write!(f, "Join code is missing."),
            JoinError::SelfJoinAttempt => write!(f, "You cannot join yourself."),
        }
    }
}

impl std::error::Error for JoinError {}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VoteRejection {
    NotVoting,
    AlreadyVoted,
    VoterEliminated,
    UnknownVoter,
    // Target is not in the round, is already eliminated, or is the voter themselves.
    InvalidTarget,
    // `voterId` in the message differs from the connection it arrived on.
    VoterMismatch,
}

impl fmt::Display for VoteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteRejection::NotVoting => "voting is not open",
            VoteRejection::AlreadyVoted => "already voted in this phase",
            VoteRejection::VoterEliminated => "eliminated players cannot vote",
            VoteRejection::UnknownVoter => "voter is not in the round",
            VoteRejection::InvalidTarget => "invalid vote target",
            VoteRejection::VoterMismatch => "voter does not match the connection",
        };
        f.write_str(s)
    }
}

impl std::error::Error for VoteRejection {}


// Errors for actions initiated on the host device.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HostCommandError {
    NotEnoughPlayers { num_players: usize, min_players: usize },
    RoundInProgress,
    RoundNotOver,
    NotInDiscussion,
    VoteRejected(VoteRejection),
}

impl fmt::Display for HostCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostCommandError::NotEnoughPlayers { num_players, min_players } => write!(
                f,
                "The game can only start with at least {min_players} players ({num_players} in the lobby)."
            ),
            HostCommandError::RoundInProgress => write!(f, "A round is already in progress."),
            HostCommandError::RoundNotOver => write!(f, "The round is not over yet."),
            HostCommandError::NotInDiscussion => write!(f, "Discussion is not running."),
            HostCommandError::VoteRejected(rejection) => write!(f, "Vote rejected: {rejection}."),
        }
    }
}

impl std::error::Error for HostCommandError {}


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EventError {
    // The connection to the host has closed. Fatal: there is no way to resume the session.
    ConnectionLost,
    CannotApplyEvent(String),
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::ConnectionLost => write!(f, "Connection to the host lost."),
            EventError::CannotApplyEvent(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for EventError {}
