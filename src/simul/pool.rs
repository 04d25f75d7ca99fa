//! Aggregate views over a set of session snapshots.

use serde::Serialize;

use crate::game::rating::{Outcome, POINTS_PER_WIN};
use crate::models::{SessionId, SessionSnapshot};

/// Running simul score from the host's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateScore {
    pub points: i32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub active_count: u32,
    /// Most points the still-running boards could add.
    pub potential: i32,
}

impl AggregateScore {
    pub fn from_snapshots<'a, I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = &'a SessionSnapshot>,
    {
        let mut score = AggregateScore::default();
        for snapshot in snapshots {
            if snapshot.is_active() {
                score.active_count += 1;
                continue;
            }
            let Some(points) = snapshot.score_delta else {
                continue;
            };
            score.points += points;
            match outcome_of(points) {
                Outcome::Win => score.wins += 1,
                Outcome::Draw => score.draws += 1,
                Outcome::Loss => score.losses += 1,
            }
        }
        score.potential = score.active_count as i32 * POINTS_PER_WIN;
        score
    }
}

fn outcome_of(points: i32) -> Outcome {
    match points {
        p if p >= POINTS_PER_WIN => Outcome::Win,
        p if p > 0 => Outcome::Draw,
        _ => Outcome::Loss,
    }
}

/// Everything a simul dashboard renders in one go.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolView {
    /// Boards in board-number order.
    pub boards: Vec<SessionSnapshot>,
    pub focused: Option<SessionId>,
    pub needing_attention: Vec<SessionId>,
    pub waiting: Vec<SessionId>,
    pub score: AggregateScore,
}

impl PoolView {
    pub fn from_snapshots(mut boards: Vec<SessionSnapshot>, focused: Option<SessionId>) -> Self {
        boards.sort_by_key(|board| board.board_number);
        Self {
            needing_attention: needing_attention(&boards),
            waiting: waiting(&boards),
            score: AggregateScore::from_snapshots(&boards),
            focused,
            boards,
        }
    }

    pub fn board(&self, id: SessionId) -> Option<&SessionSnapshot> {
        self.boards.iter().find(|board| board.id == id)
    }
}

/// Active boards where the host is to move.
pub fn needing_attention(snapshots: &[SessionSnapshot]) -> Vec<SessionId> {
    snapshots
        .iter()
        .filter(|s| s.needs_host())
        .map(|s| s.id)
        .collect()
}

/// Active boards waiting on the other side.
pub fn waiting(snapshots: &[SessionSnapshot]) -> Vec<SessionId> {
    snapshots
        .iter()
        .filter(|s| s.is_active() && !s.host_to_move)
        .map(|s| s.id)
        .collect()
}
