//! Simultaneous-exhibition chess: many concurrent boards against one host,
//! each with its own clock, an optional random-moving bot opponent and
//! rating/score bookkeeping, driven by a single scheduling clock.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod simul;
pub mod websocket;

pub use error::{ConfigError, OracleError, SessionError};
