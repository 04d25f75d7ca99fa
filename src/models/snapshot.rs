use serde::Serialize;

use crate::game::clock::ClockReading;
use crate::game::oracle::PositionSnapshot;
use crate::models::{
    DrawOffer, GameMode, PlayerRef, ReplayCursor, SessionId, Side, Status, TimeoutCause,
};

/// Read-only copy of one board, taken atomically by its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub board_number: usize,
    pub mode: GameMode,
    pub host: PlayerRef,
    pub opponent: PlayerRef,
    pub status: Status,
    pub timeout_cause: Option<TimeoutCause>,
    pub turn: Side,
    pub host_to_move: bool,
    pub winner: Option<Side>,
    pub resigned_by: Option<Side>,
    /// Latest position.
    pub position: PositionSnapshot,
    /// Position under the replay cursor.
    pub displayed_position: PositionSnapshot,
    pub clock: ClockReading,
    pub move_history: Vec<String>,
    pub position_count: usize,
    pub replay_cursor: ReplayCursor,
    pub draw_offer: DrawOffer,
    pub rating_delta: Option<i32>,
    pub score_delta: Option<i32>,
    /// UI highlight only; never persisted.
    #[serde(skip)]
    pub opponent_just_moved: bool,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Active and waiting on the host.
    pub fn needs_host(&self) -> bool {
        self.is_active() && self.host_to_move
    }
}
