use crate::models::{NavDirection, SessionId, Status};

/// Rejected input and lookup failures for session operations.
///
/// None of these leave a session partially mutated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("session is over ({0})")]
    NotActive(Status),

    #[error("illegal move {from}-{to}")]
    IllegalMove { from: String, to: String },

    #[error("not your turn")]
    NotYourTurn,

    #[error("a draw offer is already pending")]
    DrawOfferPending,

    #[error("cannot navigate {0} from here")]
    NavigationOutOfRange(NavDirection),

    #[error("game can no longer be aborted after {plies} plies")]
    AbortTooLate { plies: usize },

    #[error("invalid session config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Failures reported by a rules oracle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("invalid position snapshot {fen:?}: {reason}")]
    InvalidPosition { fen: String, reason: String },
}

/// Bad values in the environment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    NotPositive { key: &'static str },
}
