//! One board's full mutable state.
//!
//! ```text
//! Active ──► Checkmate | Stalemate | Draw | Resigned | Timeout | Aborted
//! ```
//!
//! Every terminal status is absorbing. Scoring happens on the single
//! transition out of `Active`, so re-running game-over detection afterwards
//! changes nothing.

use log::{debug, error, info};
use rand::Rng;
use std::time::Instant;

use crate::error::SessionError;
use crate::game::bot::BotAgent;
use crate::game::clock::Clock;
use crate::game::inactivity::InactivityMonitor;
use crate::game::oracle::{PositionSnapshot, RulesOracle};
use crate::game::rating::{self, Outcome};
use crate::models::{
    DrawOffer, GameMode, MoveRequest, NavDirection, PlayerRef, ReplayCursor, SessionConfig,
    SessionId, SessionSnapshot, Side, Status, TimeoutCause,
};

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MoveOutcome {
    pub notation: String,
    pub mover: Side,
    /// Side to move after the move.
    pub turn: Side,
    pub status: Status,
    pub by_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is terminal; nothing was charged.
    Idle,
    Running,
    TimedOut { loser: Side, cause: TimeoutCause },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotTurn {
    Played(MoveOutcome),
    /// Not the bot's turn any more, or the session ended meanwhile.
    Skipped,
    /// The oracle offered no playable move although the game was still running.
    NoLegalMoves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawResolution {
    Accepted,
    Declined,
    /// No offer was pending or the session had already ended.
    Discarded,
}

pub struct GameSession {
    id: SessionId,
    board_number: usize,
    mode: GameMode,
    host: PlayerRef,
    opponent: PlayerRef,
    automated_side: Option<Side>,
    oracle: Box<dyn RulesOracle>,
    turn: Side,
    status: Status,
    timeout_cause: Option<TimeoutCause>,
    clock: Clock,
    move_history: Vec<String>,
    position_history: Vec<PositionSnapshot>,
    replay_cursor: ReplayCursor,
    created_at: Instant,
    last_move_at: Option<Instant>,
    last_activity_at: Instant,
    resigned_by: Option<Side>,
    flagged: Option<Side>,
    rating_delta: Option<i32>,
    score_delta: Option<i32>,
    draw_offer: DrawOffer,
    opponent_just_moved: bool,
}

impl GameSession {
    pub fn new(
        id: SessionId,
        board_number: usize,
        config: &SessionConfig,
        mut oracle: Box<dyn RulesOracle>,
        now: Instant,
    ) -> Result<Self, SessionError> {
        config
            .validate()
            .map_err(|reason| SessionError::InvalidConfig { reason })?;
        if let Some(fen) = &config.start_position {
            oracle.load(fen)?;
        }

        let turn = oracle.current_turn();
        let start = oracle.to_position_snapshot();
        let mut session = Self {
            id,
            board_number,
            mode: config.mode,
            host: config.host.clone(),
            opponent: config.opponent.clone(),
            automated_side: config.automated_side(),
            oracle,
            turn,
            status: Status::Active,
            timeout_cause: None,
            clock: Clock::new(config.initial_ms(), config.increment_ms(), now),
            move_history: Vec::new(),
            position_history: vec![start],
            replay_cursor: ReplayCursor::Live,
            created_at: now,
            last_move_at: None,
            last_activity_at: now,
            resigned_by: None,
            flagged: None,
            rating_delta: None,
            score_delta: None,
            draw_offer: DrawOffer::None,
            opponent_just_moved: false,
        };
        // A loaded position may already be decided.
        session.detect_game_over();
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn board_number(&self) -> usize {
        self.board_number
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn host(&self) -> &PlayerRef {
        &self.host
    }

    pub fn opponent(&self) -> &PlayerRef {
        &self.opponent
    }

    pub fn automated_side(&self) -> Option<Side> {
        self.automated_side
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn timeout_cause(&self) -> Option<TimeoutCause> {
        self.timeout_cause
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn move_history(&self) -> &[String] {
        &self.move_history
    }

    pub fn position_history(&self) -> &[PositionSnapshot] {
        &self.position_history
    }

    pub fn replay_cursor(&self) -> ReplayCursor {
        self.replay_cursor
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_move_at(&self) -> Option<Instant> {
        self.last_move_at
    }

    pub fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    pub fn resigned_by(&self) -> Option<Side> {
        self.resigned_by
    }

    pub fn rating_delta(&self) -> Option<i32> {
        self.rating_delta
    }

    pub fn score_delta(&self) -> Option<i32> {
        self.score_delta
    }

    pub fn draw_offer(&self) -> DrawOffer {
        self.draw_offer
    }

    pub fn opponent_just_moved(&self) -> bool {
        self.opponent_just_moved
    }

    pub fn is_bot_turn(&self) -> bool {
        self.status.is_active() && self.automated_side == Some(self.turn)
    }

    pub fn is_host_turn(&self) -> bool {
        self.status.is_active() && self.turn == self.host.side
    }

    /// Position the board should display for the current replay cursor.
    pub fn displayed_position(&self) -> &str {
        let index = match self.replay_cursor {
            ReplayCursor::Live => self.position_history.len() - 1,
            ReplayCursor::At(index) => index,
        };
        &self.position_history[index]
    }

    pub fn latest_position(&self) -> &str {
        &self.position_history[self.position_history.len() - 1]
    }

    pub fn winner(&self) -> Option<Side> {
        match self.status {
            Status::Active | Status::Stalemate | Status::Draw | Status::Aborted => None,
            Status::Checkmate => Some(self.turn.opposite()),
            Status::Resigned => self.resigned_by.map(Side::opposite),
            Status::Timeout => self.flagged.map(Side::opposite),
        }
    }

    /// Result from the host's side of the board, once decided.
    pub fn host_outcome(&self) -> Option<Outcome> {
        match self.status {
            Status::Active | Status::Aborted => None,
            Status::Stalemate | Status::Draw => Some(Outcome::Draw),
            Status::Checkmate | Status::Resigned | Status::Timeout => {
                self.winner().map(|winner| {
                    if winner == self.host.side {
                        Outcome::Win
                    } else {
                        Outcome::Loss
                    }
                })
            }
        }
    }

    /// Plays a move submitted by a person.
    pub fn apply_move(
        &mut self,
        request: &MoveRequest,
        now: Instant,
    ) -> Result<MoveOutcome, SessionError> {
        self.ensure_active()?;
        if self.automated_side == Some(self.turn) {
            return Err(SessionError::NotYourTurn);
        }
        let outcome = self.commit_move(request, now, false)?;
        self.opponent_just_moved = false;
        Ok(outcome)
    }

    /// Lets the bot reply if it is still its turn.
    pub fn play_bot_move<R: Rng + ?Sized>(
        &mut self,
        agent: &BotAgent,
        rng: &mut R,
        now: Instant,
    ) -> BotTurn {
        if !self.is_bot_turn() {
            return BotTurn::Skipped;
        }

        let legal = self.oracle.legal_moves(Some(self.turn));
        let Some(choice) = agent.pick(&legal, rng) else {
            error!(
                "session {}: no legal move for {} while the game is active",
                self.id, self.turn
            );
            if !self.detect_game_over() {
                self.finish(Status::Aborted);
            }
            return BotTurn::NoLegalMoves;
        };

        let request = choice.to_request();
        match self.commit_move(&request, now, true) {
            Ok(outcome) => {
                self.opponent_just_moved = true;
                BotTurn::Played(outcome)
            }
            Err(err) => {
                error!("session {}: oracle refused its own move: {}", self.id, err);
                if !self.detect_game_over() {
                    self.finish(Status::Aborted);
                }
                BotTurn::NoLegalMoves
            }
        }
    }

    pub fn resign(&mut self, side: Side, now: Instant) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.resigned_by = Some(side);
        self.last_activity_at = now;
        self.opponent_just_moved = false;
        self.finish(Status::Resigned);
        Ok(())
    }

    /// Registers a draw offer; the answer arrives through [`Self::resolve_draw_offer`].
    pub fn offer_draw(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.draw_offer == DrawOffer::Pending {
            return Err(SessionError::DrawOfferPending);
        }
        self.draw_offer = DrawOffer::Pending;
        self.opponent_just_moved = false;
        Ok(())
    }

    pub fn resolve_draw_offer(&mut self, accepted: bool) -> DrawResolution {
        if !self.status.is_active() || self.draw_offer != DrawOffer::Pending {
            return DrawResolution::Discarded;
        }
        if accepted {
            self.draw_offer = DrawOffer::None;
            self.finish(Status::Draw);
            DrawResolution::Accepted
        } else {
            self.draw_offer = DrawOffer::Declined;
            DrawResolution::Declined
        }
    }

    /// Ends the game before it properly started.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        let plies = self.move_history.len();
        if plies >= 2 {
            return Err(SessionError::AbortTooLate { plies });
        }
        self.finish(Status::Aborted);
        Ok(())
    }

    /// Moves the replay cursor. Never touches the game itself.
    pub fn navigate(&mut self, direction: NavDirection) -> Result<ReplayCursor, SessionError> {
        let last = self.position_history.len() - 1;
        let (current, live) = match self.replay_cursor {
            ReplayCursor::Live => (last, true),
            ReplayCursor::At(index) => (index, false),
        };

        let cursor = match direction {
            NavDirection::Start => ReplayCursor::At(0),
            NavDirection::End => ReplayCursor::Live,
            NavDirection::Prev if current == 0 => {
                return Err(SessionError::NavigationOutOfRange(direction))
            }
            NavDirection::Prev => ReplayCursor::At(current - 1),
            NavDirection::Next if live || current >= last => {
                return Err(SessionError::NavigationOutOfRange(direction))
            }
            NavDirection::Next if current + 1 == last => ReplayCursor::Live,
            NavDirection::Next => ReplayCursor::At(current + 1),
        };
        self.replay_cursor = cursor;
        Ok(cursor)
    }

    /// Advances the clock and runs the inactivity check.
    pub fn tick(&mut self, now: Instant, monitor: &InactivityMonitor) -> TickOutcome {
        if !self.status.is_active() {
            return TickOutcome::Idle;
        }

        let to_move = self.turn;
        let cause = if monitor.is_forfeit(self.move_history.len(), self.last_activity_at, now) {
            TimeoutCause::Inactivity
        } else if self.clock.tick(now, to_move) {
            TimeoutCause::Flag
        } else {
            return TickOutcome::Running;
        };

        self.on_timeout(to_move, cause);
        TickOutcome::TimedOut {
            loser: to_move,
            cause,
        }
    }

    /// `side` lost on time; the other side wins.
    pub fn on_timeout(&mut self, side: Side, cause: TimeoutCause) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.flagged = Some(side);
        self.timeout_cause = Some(cause);
        self.finish(Status::Timeout)
    }

    /// Asks the oracle whether the game is decided and ends it if so.
    pub fn detect_game_over(&mut self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        let status = if self.oracle.is_checkmate() {
            Status::Checkmate
        } else if self.oracle.is_stalemate() {
            Status::Stalemate
        } else if self.oracle.is_draw() {
            Status::Draw
        } else {
            return false;
        };
        self.finish(status)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            board_number: self.board_number,
            mode: self.mode,
            host: self.host.clone(),
            opponent: self.opponent.clone(),
            status: self.status,
            timeout_cause: self.timeout_cause,
            turn: self.turn,
            host_to_move: self.is_host_turn(),
            winner: self.winner(),
            resigned_by: self.resigned_by,
            position: self.latest_position().to_string(),
            displayed_position: self.displayed_position().to_string(),
            clock: self.clock.reading(),
            move_history: self.move_history.clone(),
            position_count: self.position_history.len(),
            replay_cursor: self.replay_cursor,
            draw_offer: self.draw_offer,
            rating_delta: self.rating_delta,
            score_delta: self.score_delta,
            opponent_just_moved: self.opponent_just_moved,
        }
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.status.is_active() {
            Ok(())
        } else {
            Err(SessionError::NotActive(self.status))
        }
    }

    fn commit_move(
        &mut self,
        request: &MoveRequest,
        now: Instant,
        by_bot: bool,
    ) -> Result<MoveOutcome, SessionError> {
        let mover = self.turn;
        let played = self
            .oracle
            .apply_move(request)
            .ok_or_else(|| SessionError::IllegalMove {
                from: request.from.clone(),
                to: request.to.clone(),
            })?;

        self.move_history.push(played.notation.clone());
        self.position_history.push(self.oracle.to_position_snapshot());
        self.turn = self.oracle.current_turn();
        self.last_move_at = Some(now);
        self.last_activity_at = now;
        self.clock.apply_increment(mover);
        self.replay_cursor = ReplayCursor::Live;
        if self.draw_offer == DrawOffer::Declined {
            self.draw_offer = DrawOffer::None;
        }
        debug!("session {}: {} played {}", self.id, mover, played.notation);

        self.detect_game_over();
        Ok(MoveOutcome {
            notation: played.notation,
            mover,
            turn: self.turn,
            status: self.status,
            by_bot,
        })
    }

    /// The one transition out of `Active`. Returns false if already terminal.
    fn finish(&mut self, status: Status) -> bool {
        if !self.status.is_active() || status.is_active() {
            return false;
        }
        self.status = status;
        self.draw_offer = DrawOffer::None;

        if let Some(outcome) = self.host_outcome() {
            self.rating_delta = Some(rating::rating_delta(
                outcome,
                self.host.rating_before,
                self.opponent.rating_before,
                self.host.games_played,
            ));
            self.score_delta = Some(rating::hydra_score(outcome));
        }
        info!(
            "session {} (board {}) finished: {} after {} plies",
            self.id,
            self.board_number,
            status,
            self.move_history.len()
        );
        true
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("board_number", &self.board_number)
            .field("mode", &self.mode)
            .field("status", &self.status)
            .field("turn", &self.turn)
            .field("plies", &self.move_history.len())
            .finish_non_exhaustive()
    }
}
