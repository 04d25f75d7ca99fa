//! Owns every board of one simul host.
//!
//! The coordinator never touches a `GameSession` directly. Mutations are
//! forwarded to the owning [`SessionActor`] and aggregate views are computed
//! from snapshots gathered over the session mailboxes.

use actix::prelude::*;
use futures::future::join_all;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::game::{ChessOracle, GameSession, RulesOracle};
use crate::models::{SessionConfig, SessionEvent, SessionId, SessionSnapshot};
use crate::simul::pool::{AggregateScore, PoolView};
use crate::simul::scheduler::{Deregister, Scheduler};
use crate::simul::session_actor::{GetSnapshot, SessionActor, Shutdown};

pub type OracleFactory = Arc<dyn Fn() -> Box<dyn RulesOracle> + Send + Sync>;

/// Creates `count` boards sharing one configuration.
#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<Vec<SessionId>, SessionError>")]
pub struct CreateSessions {
    pub count: usize,
    pub config: SessionConfig,
}

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<SessionId, SessionError>")]
pub struct CreateSession(pub SessionConfig);

/// Routes a session-level message to the board with the given id.
#[derive(Debug, Clone)]
pub struct ToSession<M> {
    pub id: SessionId,
    pub msg: M,
}

impl<M> ToSession<M> {
    pub fn new(id: SessionId, msg: M) -> Self {
        Self { id, msg }
    }
}

impl<M, T> Message for ToSession<M>
where
    M: Message<Result = Result<T, SessionError>>,
    T: 'static,
{
    type Result = Result<T, SessionError>;
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<(), SessionError>")]
pub struct RemoveSession(pub SessionId);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<(), SessionError>")]
pub struct Focus(pub SessionId);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Unfocus;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "PoolView")]
pub struct GetPoolView;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Vec<SessionId>")]
pub struct NeedingAttention;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Vec<SessionId>")]
pub struct WaitingSessions;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "AggregateScore")]
pub struct GetAggregateScore;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe(pub Recipient<SessionEvent>);

pub struct SimulCoordinator {
    config: EngineConfig,
    scheduler: Addr<Scheduler>,
    oracle_factory: OracleFactory,
    sessions: HashMap<SessionId, Addr<SessionActor>>,
    focused: Option<SessionId>,
    next_board: usize,
    subscribers: Vec<Recipient<SessionEvent>>,
    rng: StdRng,
}

impl SimulCoordinator {
    pub fn new(config: EngineConfig, scheduler: Addr<Scheduler>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            scheduler,
            oracle_factory: Arc::new(|| Box::new(ChessOracle::new())),
            sessions: HashMap::new(),
            focused: None,
            next_board: 1,
            subscribers: Vec::new(),
            rng,
        }
    }

    pub fn with_oracle_factory(mut self, factory: OracleFactory) -> Self {
        self.oracle_factory = factory;
        self
    }

    fn spawn_session(
        &mut self,
        config: &SessionConfig,
        ctx: &mut Context<Self>,
    ) -> Result<SessionId, SessionError> {
        if self.sessions.len() >= self.config.max_boards {
            return Err(SessionError::InvalidConfig {
                reason: format!("the pool is full ({} boards)", self.config.max_boards),
            });
        }
        let id = SessionId::new();
        let board_number = self.next_board;
        let oracle = (self.oracle_factory)();
        let session = GameSession::new(id, board_number, config, oracle, Instant::now())?;
        self.next_board += 1;

        let rng = StdRng::seed_from_u64(self.rng.gen());
        let addr = SessionActor::new(
            session,
            &self.config,
            rng,
            self.scheduler.clone(),
            ctx.address().recipient(),
        )
        .start();
        self.sessions.insert(id, addr);
        info!("board {} created as session {}", board_number, id);
        self.broadcast(SessionEvent::Created { game_id: id, board_number });
        Ok(id)
    }

    fn broadcast(&mut self, event: SessionEvent) {
        self.subscribers.retain(|subscriber| {
            !matches!(subscriber.try_send(event.clone()), Err(SendError::Closed(_)))
        });
    }

    fn forward<M, T>(&self, id: SessionId, msg: M) -> ResponseFuture<Result<T, SessionError>>
    where
        M: Message<Result = Result<T, SessionError>> + Send + 'static,
        T: Send + 'static,
        SessionActor: Handler<M>,
    {
        let Some(addr) = self.sessions.get(&id).cloned() else {
            return Box::pin(async move { Err(SessionError::NotFound(id)) });
        };
        Box::pin(async move {
            // A board removed while the request was in flight is gone.
            addr.send(msg).await.unwrap_or(Err(SessionError::NotFound(id)))
        })
    }

    fn gather(&self) -> impl Future<Output = Vec<SessionSnapshot>> + 'static {
        let requests: Vec<_> =
            self.sessions.values().map(|addr| addr.send(GetSnapshot)).collect();
        async move {
            join_all(requests)
                .await
                .into_iter()
                .filter_map(|reply| reply.ok().and_then(Result::ok))
                .collect()
        }
    }

    fn view(&self) -> impl Future<Output = PoolView> + 'static {
        let focused = self.focused;
        let snapshots = self.gather();
        async move { PoolView::from_snapshots(snapshots.await, focused) }
    }
}

impl Actor for SimulCoordinator {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("simul coordinator started");
    }
}

impl Handler<CreateSessions> for SimulCoordinator {
    type Result = Result<Vec<SessionId>, SessionError>;

    fn handle(&mut self, msg: CreateSessions, ctx: &mut Self::Context) -> Self::Result {
        // Reject up front so a bad config never leaves a partial batch behind.
        msg.config
            .validate()
            .map_err(|reason| SessionError::InvalidConfig { reason })?;
        if msg.count == 0 {
            return Err(SessionError::InvalidConfig {
                reason: "at least one board is required".to_string(),
            });
        }

        let free = self.config.max_boards.saturating_sub(self.sessions.len());
        if msg.count > free {
            return Err(SessionError::InvalidConfig {
                reason: format!(
                    "{} boards requested but only {} of {} are free",
                    msg.count, free, self.config.max_boards
                ),
            });
        }

        let mut ids = Vec::new();
        for index in 0..msg.count {
            let mut config = msg.config.clone();
            if msg.count > 1 {
                config.opponent.display_name =
                    format!("{} {}", config.opponent.display_name, index + 1);
            }
            ids.push(self.spawn_session(&config, ctx)?);
        }
        Ok(ids)
    }
}

impl Handler<CreateSession> for SimulCoordinator {
    type Result = Result<SessionId, SessionError>;

    fn handle(&mut self, msg: CreateSession, ctx: &mut Self::Context) -> Self::Result {
        self.spawn_session(&msg.0, ctx)
    }
}

impl<M, T> Handler<ToSession<M>> for SimulCoordinator
where
    M: Message<Result = Result<T, SessionError>> + Send + 'static,
    T: Send + 'static,
    SessionActor: Handler<M>,
{
    type Result = ResponseFuture<Result<T, SessionError>>;

    fn handle(&mut self, msg: ToSession<M>, _ctx: &mut Self::Context) -> Self::Result {
        self.forward(msg.id, msg.msg)
    }
}

impl Handler<RemoveSession> for SimulCoordinator {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: RemoveSession, _ctx: &mut Self::Context) -> Self::Result {
        let id = msg.0;
        let addr = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        addr.do_send(Shutdown);
        self.scheduler.do_send(Deregister { id });
        if self.focused == Some(id) {
            self.focused = None;
        }
        info!("session {} removed, {} boards left", id, self.sessions.len());
        self.broadcast(SessionEvent::Removed { game_id: id });
        Ok(())
    }
}

impl Handler<Focus> for SimulCoordinator {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: Focus, _ctx: &mut Self::Context) -> Self::Result {
        if !self.sessions.contains_key(&msg.0) {
            return Err(SessionError::NotFound(msg.0));
        }
        self.focused = Some(msg.0);
        Ok(())
    }
}

impl Handler<Unfocus> for SimulCoordinator {
    type Result = ();

    fn handle(&mut self, _msg: Unfocus, _ctx: &mut Self::Context) {
        self.focused = None;
    }
}

impl Handler<GetPoolView> for SimulCoordinator {
    type Result = ResponseFuture<PoolView>;

    fn handle(&mut self, _msg: GetPoolView, _ctx: &mut Self::Context) -> Self::Result {
        Box::pin(self.view())
    }
}

impl Handler<NeedingAttention> for SimulCoordinator {
    type Result = ResponseFuture<Vec<SessionId>>;

    fn handle(&mut self, _msg: NeedingAttention, _ctx: &mut Self::Context) -> Self::Result {
        let view = self.view();
        Box::pin(async move { view.await.needing_attention })
    }
}

impl Handler<WaitingSessions> for SimulCoordinator {
    type Result = ResponseFuture<Vec<SessionId>>;

    fn handle(&mut self, _msg: WaitingSessions, _ctx: &mut Self::Context) -> Self::Result {
        let view = self.view();
        Box::pin(async move { view.await.waiting })
    }
}

impl Handler<GetAggregateScore> for SimulCoordinator {
    type Result = ResponseFuture<AggregateScore>;

    fn handle(&mut self, _msg: GetAggregateScore, _ctx: &mut Self::Context) -> Self::Result {
        let snapshots = self.gather();
        Box::pin(async move { AggregateScore::from_snapshots(&snapshots.await) })
    }
}

impl Handler<Subscribe> for SimulCoordinator {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _ctx: &mut Self::Context) {
        self.subscribers.push(msg.0);
    }
}

impl Handler<SessionEvent> for SimulCoordinator {
    type Result = ();

    fn handle(&mut self, event: SessionEvent, _ctx: &mut Self::Context) {
        if !self.sessions.contains_key(&event.game_id()) {
            warn!("dropping {:?} from a session that is no longer pooled", event);
            return;
        }
        self.broadcast(event);
    }
}
