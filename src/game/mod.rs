pub mod bot;
pub mod clock;
pub mod inactivity;
pub mod oracle;
pub mod rating;
pub mod session;

pub use bot::BotAgent;
pub use clock::{Clock, ClockReading};
pub use inactivity::InactivityMonitor;
pub use oracle::{ChessOracle, OracleMove, PositionSnapshot, RulesOracle};
pub use rating::Outcome;
pub use session::{BotTurn, DrawResolution, GameSession, MoveOutcome, TickOutcome};
