use actix::Message;
use serde::{Deserialize, Serialize};

use crate::models::{NavDirection, Promotion, ReplayCursor, SessionConfig, SessionId, Side, Status};
use crate::simul::pool::PoolView;

fn one() -> usize {
    1
}

/// Message sent from client to server
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ClientMessage {
    Create {
        #[serde(default = "one")]
        count: usize,
        config: SessionConfig,
    },
    Move {
        game_id: SessionId,
        move_from: String,
        move_to: String,
        #[serde(default)]
        promote_to: Option<Promotion>,
    },
    Resign {
        game_id: SessionId,
    },
    OfferDraw {
        game_id: SessionId,
    },
    Abort {
        game_id: SessionId,
    },
    Navigate {
        game_id: SessionId,
        direction: NavDirection,
    },
    Remove {
        game_id: SessionId,
    },
    Focus {
        game_id: SessionId,
    },
    Unfocus,
    Pool,
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameCreated {
        game_ids: Vec<SessionId>,
    },
    MoveResult {
        game_id: SessionId,
        accepted: bool,
        notation: Option<String>,
        status: Option<Status>,
        error: Option<String>,
    },
    Ack {
        game_id: Option<SessionId>,
        action: &'static str,
    },
    Cursor {
        game_id: SessionId,
        cursor: ReplayCursor,
    },
    Pool(PoolView),
    Event(SessionEvent),
    Error {
        game_id: Option<SessionId>,
        error: String,
    },
}

impl ServerMessage {
    pub fn error(game_id: Option<SessionId>, error: impl Into<String>) -> Self {
        ServerMessage::Error {
            game_id,
            error: error.into(),
        }
    }
}

/// Something observers of a pool should know about.
#[derive(Message, Serialize, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Created {
        game_id: SessionId,
        board_number: usize,
    },
    MovePlayed {
        game_id: SessionId,
        notation: String,
        mover: Side,
        by_bot: bool,
        status: Status,
    },
    DrawDeclined {
        game_id: SessionId,
    },
    Finished {
        game_id: SessionId,
        status: Status,
        winner: Option<Side>,
        rating_delta: Option<i32>,
        score_delta: Option<i32>,
    },
    Removed {
        game_id: SessionId,
    },
}

impl SessionEvent {
    pub fn game_id(&self) -> SessionId {
        match self {
            SessionEvent::Created { game_id, .. }
            | SessionEvent::MovePlayed { game_id, .. }
            | SessionEvent::DrawDeclined { game_id }
            | SessionEvent::Finished { game_id, .. }
            | SessionEvent::Removed { game_id } => *game_id,
        }
    }
}
