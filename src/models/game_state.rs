use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for one board in a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

impl From<chess::Color> for Side {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Side::White,
            chess::Color::Black => Side::Black,
        }
    }
}

impl From<Side> for chess::Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => chess::Color::White,
            Side::Black => chess::Color::Black,
        }
    }
}

/// Lifecycle of a session. Everything but `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Checkmate,
    Stalemate,
    Draw,
    Resigned,
    Timeout,
    Aborted,
}

impl Status {
    pub const fn is_active(self) -> bool {
        matches!(self, Status::Active)
    }

    pub const fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Active => "active",
            Status::Checkmate => "checkmate",
            Status::Stalemate => "stalemate",
            Status::Draw => "draw",
            Status::Resigned => "resigned",
            Status::Timeout => "timeout",
            Status::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// What ended a `Timeout` session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutCause {
    /// The side to move ran out of clock time.
    Flag,
    /// No early reply within the grace window.
    Inactivity,
}

/// How a session is played. The automated side, if any, is derived from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    /// Single board on this machine, optionally against the bot.
    Local { vs_bot: bool },
    /// Single board against a remote human.
    Online,
    /// One board of a simul conducted by the local host against bots.
    SimulHost,
    /// The local player is a participant on a remote host's simul board.
    SimulPlayer,
}

impl GameMode {
    pub const fn is_simul(self) -> bool {
        matches!(self, GameMode::SimulHost | GameMode::SimulPlayer)
    }
}

/// Piece chosen on promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl From<Promotion> for chess::Piece {
    fn from(promotion: Promotion) -> Self {
        match promotion {
            Promotion::Queen => chess::Piece::Queen,
            Promotion::Rook => chess::Piece::Rook,
            Promotion::Bishop => chess::Piece::Bishop,
            Promotion::Knight => chess::Piece::Knight,
        }
    }
}

impl Promotion {
    pub fn from_piece(piece: chess::Piece) -> Option<Self> {
        match piece {
            chess::Piece::Queen => Some(Promotion::Queen),
            chess::Piece::Rook => Some(Promotion::Rook),
            chess::Piece::Bishop => Some(Promotion::Bishop),
            chess::Piece::Knight => Some(Promotion::Knight),
            _ => None,
        }
    }
}

/// A candidate move in square notation, e.g. `e2` to `e4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

impl MoveRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    pub fn promoting(mut self, promotion: Promotion) -> Self {
        self.promotion = Some(promotion);
        self
    }
}

/// Replay navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDirection {
    Start,
    Prev,
    Next,
    End,
}

impl fmt::Display for NavDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavDirection::Start => "start",
            NavDirection::Prev => "prev",
            NavDirection::Next => "next",
            NavDirection::End => "end",
        };
        f.write_str(name)
    }
}

/// Which position the board displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayCursor {
    /// Follow the latest position.
    Live,
    /// Index into the position history.
    At(usize),
}

/// State of the single outstanding draw offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOffer {
    #[default]
    None,
    Pending,
    Declined,
}

/// A player as seen by one session, used for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub display_name: String,
    pub rating_before: i32,
    pub side: Side,
    #[serde(default)]
    pub games_played: u32,
}

impl PlayerRef {
    pub fn new(display_name: impl Into<String>, rating_before: i32, side: Side) -> Self {
        Self {
            display_name: display_name.into(),
            rating_before,
            side,
            games_played: 0,
        }
    }

    pub fn with_games_played(mut self, games_played: u32) -> Self {
        self.games_played = games_played;
        self
    }
}

fn default_time_minutes() -> f64 {
    10.0
}

/// Everything needed to open a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: GameMode,
    /// The local player; aggregate views and scoring take this side's perspective.
    pub host: PlayerRef,
    pub opponent: PlayerRef,
    #[serde(default = "default_time_minutes")]
    pub time_minutes: f64,
    #[serde(default)]
    pub increment_seconds: f64,
    /// FEN of the starting position, standard start when absent.
    #[serde(default)]
    pub start_position: Option<String>,
}

impl SessionConfig {
    /// A simul board: the host plays `host_side` against a bot.
    pub fn simul(host: impl Into<String>, host_rating: i32, host_side: Side) -> Self {
        Self {
            mode: GameMode::SimulHost,
            host: PlayerRef::new(host, host_rating, host_side),
            opponent: PlayerRef::new("Challenger", 1200, host_side.opposite()),
            time_minutes: default_time_minutes(),
            increment_seconds: 0.0,
            start_position: None,
        }
    }

    pub fn with_time_control(mut self, time_minutes: f64, increment_seconds: f64) -> Self {
        self.time_minutes = time_minutes;
        self.increment_seconds = increment_seconds;
        self
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_opponent(mut self, opponent: PlayerRef) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn with_start_position(mut self, fen: impl Into<String>) -> Self {
        self.start_position = Some(fen.into());
        self
    }

    /// The side played by the bot, if this mode has one.
    pub fn automated_side(&self) -> Option<Side> {
        match self.mode {
            GameMode::SimulHost | GameMode::Local { vs_bot: true } => Some(self.opponent.side),
            GameMode::Local { vs_bot: false } | GameMode::Online | GameMode::SimulPlayer => None,
        }
    }

    pub(crate) fn initial_ms(&self) -> i64 {
        (self.time_minutes * 60_000.0).round() as i64
    }

    pub(crate) fn increment_ms(&self) -> i64 {
        (self.increment_seconds * 1_000.0).round() as i64
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.time_minutes.is_finite() || self.time_minutes <= 0.0 || self.initial_ms() <= 0 {
            return Err(format!("time_minutes must be positive, got {}", self.time_minutes));
        }
        if !self.increment_seconds.is_finite() || self.increment_seconds < 0.0 {
            return Err(format!(
                "increment_seconds must not be negative, got {}",
                self.increment_seconds
            ));
        }
        if self.host.side == self.opponent.side {
            return Err(format!("host and opponent both play {}", self.host.side));
        }
        Ok(())
    }
}
