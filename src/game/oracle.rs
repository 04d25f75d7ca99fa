//! Move legality, generation and game-over detection.
//!
//! Sessions talk to the board only through [`RulesOracle`]; [`ChessOracle`] is
//! the implementation backed by the `chess` crate.

use chess::{BitBoard, Board, BoardStatus, ChessMove, Game, MoveGen, Piece, Square};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::OracleError;
use crate::models::{MoveRequest, Promotion, Side};

/// FEN text of a position.
pub type PositionSnapshot = String;

/// A move the oracle accepted or generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleMove {
    pub from: String,
    pub to: String,
    pub promotion: Option<Promotion>,
    /// UCI notation, e.g. `e2e4` or `e7e8q`.
    pub notation: String,
}

impl OracleMove {
    fn from_chess(mv: ChessMove) -> Self {
        Self {
            from: mv.get_source().to_string(),
            to: mv.get_dest().to_string(),
            promotion: mv.get_promotion().and_then(Promotion::from_piece),
            notation: mv.to_string(),
        }
    }

    pub fn to_request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from.clone(),
            to: self.to.clone(),
            promotion: self.promotion,
        }
    }
}

/// External chess rules collaborator.
pub trait RulesOracle: Send {
    /// Replaces the current position and forgets the move history.
    fn load(&mut self, snapshot: &str) -> Result<(), OracleError>;

    /// Plays `request` if legal; `None` leaves the position untouched.
    fn apply_move(&mut self, request: &MoveRequest) -> Option<OracleMove>;

    fn current_turn(&self) -> Side;

    fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_stalemate() || self.is_draw()
    }

    fn is_checkmate(&self) -> bool;

    fn is_stalemate(&self) -> bool;

    /// Draws other than stalemate.
    fn is_draw(&self) -> bool;

    /// Legal moves in the current position. Asking for the side that is not
    /// to move yields nothing.
    fn legal_moves(&self, for_side: Option<Side>) -> Vec<OracleMove>;

    fn to_position_snapshot(&self) -> PositionSnapshot;

    fn to_history_notation(&self) -> Vec<String>;
}

/// [`RulesOracle`] over `chess::Game`.
pub struct ChessOracle {
    game: Game,
    history: Vec<String>,
}

impl ChessOracle {
    pub fn new() -> Self {
        Self {
            game: Game::new(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        let mut oracle = Self::new();
        oracle.load(fen)?;
        Ok(oracle)
    }

    fn board(&self) -> Board {
        self.game.current_position()
    }
}

impl Default for ChessOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesOracle for ChessOracle {
    fn load(&mut self, snapshot: &str) -> Result<(), OracleError> {
        let board = Board::from_str(snapshot).map_err(|e| OracleError::InvalidPosition {
            fen: snapshot.to_string(),
            reason: format!("{e:?}"),
        })?;
        self.game = Game::new_with_board(board);
        self.history.clear();
        Ok(())
    }

    fn apply_move(&mut self, request: &MoveRequest) -> Option<OracleMove> {
        let from = Square::from_str(&request.from.to_lowercase()).ok()?;
        let to = Square::from_str(&request.to.to_lowercase()).ok()?;

        let candidates: Vec<ChessMove> = MoveGen::new_legal(&self.board())
            .filter(|mv| mv.get_source() == from && mv.get_dest() == to)
            .collect();

        // An unspecified promotion piece defaults to a queen.
        let chosen = match request.promotion {
            Some(promotion) => {
                let piece = Piece::from(promotion);
                candidates
                    .iter()
                    .copied()
                    .find(|mv| mv.get_promotion() == Some(piece))
            }
            None => candidates
                .iter()
                .copied()
                .find(|mv| mv.get_promotion().is_none())
                .or_else(|| {
                    candidates
                        .iter()
                        .copied()
                        .find(|mv| mv.get_promotion() == Some(Piece::Queen))
                }),
        }?;

        if !self.game.make_move(chosen) {
            return None;
        }
        let played = OracleMove::from_chess(chosen);
        self.history.push(played.notation.clone());
        Some(played)
    }

    fn current_turn(&self) -> Side {
        self.game.side_to_move().into()
    }

    fn is_checkmate(&self) -> bool {
        self.board().status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self) -> bool {
        self.board().status() == BoardStatus::Stalemate
    }

    fn is_draw(&self) -> bool {
        has_insufficient_material(&self.board()) || self.game.can_declare_draw()
    }

    fn legal_moves(&self, for_side: Option<Side>) -> Vec<OracleMove> {
        if for_side.is_some_and(|side| side != self.current_turn()) {
            return Vec::new();
        }
        MoveGen::new_legal(&self.board())
            .map(OracleMove::from_chess)
            .collect()
    }

    fn to_position_snapshot(&self) -> PositionSnapshot {
        self.board().to_string()
    }

    fn to_history_notation(&self) -> Vec<String> {
        self.history.clone()
    }
}

/// True when neither side can possibly deliver mate: bare kings, a single
/// minor piece, or only bishops all standing on one square colour.
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }

    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    if (knights | bishops).popcnt() <= 1 {
        return true;
    }
    knights.popcnt() == 0 && same_square_colour(bishops)
}

fn same_square_colour(pieces: BitBoard) -> bool {
    let mut colours = pieces.map(|sq| (sq.get_rank().to_index() + sq.get_file().to_index()) % 2);
    match colours.next() {
        Some(first) => colours.all(|colour| colour == first),
        None => true,
    }
}
