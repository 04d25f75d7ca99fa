pub mod coordinator;
pub mod pool;
pub mod scheduler;
pub mod session_actor;

pub use coordinator::{
    CreateSession, CreateSessions, Focus, GetAggregateScore, GetPoolView, NeedingAttention,
    OracleFactory, RemoveSession, SimulCoordinator, Subscribe, ToSession, Unfocus, WaitingSessions,
};
pub use pool::{AggregateScore, PoolView};
pub use scheduler::{Scheduler, Tick};
pub use session_actor::{
    Abort, ApplyMove, GetSnapshot, Navigate, OfferDraw, Resign, SessionActor, Shutdown,
};
