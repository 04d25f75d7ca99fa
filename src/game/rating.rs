//! Elo rating deltas and the fixed-point simul score.

use serde::{Deserialize, Serialize};

/// Result of a finished game from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn actual_score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

/// Largest rating gap taken into account when computing the expected score.
pub const MAX_RATING_GAP: i32 = 400;

/// Players below this many games are still provisional.
pub const PROVISIONAL_GAMES: u32 = 30;

/// Rating at and above which the smallest K-factor applies.
pub const MASTER_RATING: i32 = 2400;

pub fn k_factor(rating: i32, games_played: u32) -> i32 {
    if games_played < PROVISIONAL_GAMES {
        40
    } else if rating < MASTER_RATING {
        20
    } else {
        10
    }
}

/// Expected score of `rating` against `opponent_rating`, with the gap capped
/// to ±400.
pub fn expected_score(rating: i32, opponent_rating: i32) -> f64 {
    let gap = (i64::from(opponent_rating) - i64::from(rating))
        .clamp(-i64::from(MAX_RATING_GAP), i64::from(MAX_RATING_GAP));
    1.0 / (1.0 + 10_f64.powf(gap as f64 / 400.0))
}

pub fn rating_delta(
    outcome: Outcome,
    rating: i32,
    opponent_rating: i32,
    games_played: u32,
) -> i32 {
    let k = f64::from(k_factor(rating, games_played));
    let expected = expected_score(rating, opponent_rating);
    (k * (outcome.actual_score() - expected)).round() as i32
}

/// Simul scoreboard points: +3 win, +1 draw, -1 loss.
pub fn hydra_score(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Win => 3,
        Outcome::Draw => 1,
        Outcome::Loss => -1,
    }
}

/// Points still available from one unfinished board.
pub const POINTS_PER_WIN: i32 = 3;
