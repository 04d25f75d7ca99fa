use actix::prelude::*;
use log::{debug, info};
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::game::{
    BotAgent, BotTurn, DrawResolution, GameSession, InactivityMonitor, MoveOutcome, TickOutcome,
};
use crate::models::{
    MoveRequest, NavDirection, ReplayCursor, SessionEvent, SessionId, SessionSnapshot, Side,
};
use crate::simul::scheduler::{Deregister, Register, Scheduler, Tick};

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<MoveOutcome, SessionError>")]
pub struct ApplyMove(pub MoveRequest);

/// `None` resigns on behalf of the host.
#[derive(Message, Debug, Clone, Copy, Default)]
#[rtype(result = "Result<(), SessionError>")]
pub struct Resign(pub Option<Side>);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<(), SessionError>")]
pub struct OfferDraw;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<(), SessionError>")]
pub struct Abort;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<ReplayCursor, SessionError>")]
pub struct Navigate(pub NavDirection);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<SessionSnapshot, SessionError>")]
pub struct GetSnapshot;

/// Stops the actor; pending bot and draw timers die with it.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Shutdown;

/// Owns one board. Its mailbox is the only way to touch the session.
pub struct SessionActor {
    session: GameSession,
    agent: BotAgent,
    rng: StdRng,
    monitor: InactivityMonitor,
    draw_delay: Duration,
    scheduler: Addr<Scheduler>,
    events: Recipient<SessionEvent>,
    bot_task: Option<SpawnHandle>,
    draw_task: Option<SpawnHandle>,
    concluded: bool,
}

impl SessionActor {
    pub fn new(
        session: GameSession,
        config: &EngineConfig,
        rng: StdRng,
        scheduler: Addr<Scheduler>,
        events: Recipient<SessionEvent>,
    ) -> Self {
        Self {
            session,
            agent: BotAgent::from_config(config),
            rng,
            monitor: InactivityMonitor::new(config.inactivity_threshold),
            draw_delay: config.draw_response_delay,
            scheduler,
            events,
            bot_task: None,
            draw_task: None,
            concluded: false,
        }
    }

    fn id(&self) -> SessionId {
        self.session.id()
    }

    fn emit(&self, event: SessionEvent) {
        self.events.do_send(event);
    }

    fn after_move(&mut self, outcome: &MoveOutcome, ctx: &mut Context<Self>) {
        self.emit(SessionEvent::MovePlayed {
            game_id: self.id(),
            notation: outcome.notation.clone(),
            mover: outcome.mover,
            by_bot: outcome.by_bot,
            status: outcome.status,
        });
        self.after_change(ctx);
    }

    /// Follow-up work once the session may have changed state.
    fn after_change(&mut self, ctx: &mut Context<Self>) {
        if !self.session.is_active() {
            self.conclude(ctx);
        } else if self.session.is_bot_turn() && self.bot_task.is_none() {
            self.schedule_bot(ctx);
        }
    }

    fn schedule_bot(&mut self, ctx: &mut Context<Self>) {
        let delay = self.agent.think_time(&mut self.rng);
        debug!("session {}: bot replies in {:?}", self.id(), delay);
        self.bot_task = Some(ctx.run_later(delay, |act, ctx| {
            act.bot_task = None;
            act.fire_bot(ctx);
        }));
    }

    fn fire_bot(&mut self, ctx: &mut Context<Self>) {
        match self
            .session
            .play_bot_move(&self.agent, &mut self.rng, Instant::now())
        {
            BotTurn::Played(outcome) => self.after_move(&outcome, ctx),
            BotTurn::NoLegalMoves => self.after_change(ctx),
            BotTurn::Skipped => {}
        }
    }

    fn schedule_draw_answer(&mut self, ctx: &mut Context<Self>) {
        self.draw_task = Some(ctx.run_later(self.draw_delay, |act, ctx| {
            act.draw_task = None;
            let accepted = act.agent.accepts_draw(&mut act.rng);
            match act.session.resolve_draw_offer(accepted) {
                DrawResolution::Accepted => act.after_change(ctx),
                DrawResolution::Declined => {
                    debug!("session {}: draw declined", act.id());
                    act.emit(SessionEvent::DrawDeclined { game_id: act.id() });
                }
                DrawResolution::Discarded => {}
            }
        }));
    }

    /// Runs once, on the first observation of a terminal status.
    fn conclude(&mut self, ctx: &mut Context<Self>) {
        if self.concluded {
            return;
        }
        self.concluded = true;
        for handle in [self.bot_task.take(), self.draw_task.take()].into_iter().flatten() {
            ctx.cancel_future(handle);
        }
        self.scheduler.do_send(Deregister { id: self.id() });
        self.emit(SessionEvent::Finished {
            game_id: self.id(),
            status: self.session.status(),
            winner: self.session.winner(),
            rating_delta: self.session.rating_delta(),
            score_delta: self.session.score_delta(),
        });
    }
}

impl Actor for SessionActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "session {} started on board {} ({:?})",
            self.id(),
            self.session.board_number(),
            self.session.mode()
        );
        if self.session.is_active() {
            self.scheduler.do_send(Register {
                id: self.id(),
                recipient: ctx.address().recipient(),
            });
        }
        // Covers a bot playing white and a start position that is already decided.
        self.after_change(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.scheduler.do_send(Deregister { id: self.id() });
        debug!("session {} stopped", self.id());
    }
}

impl Handler<ApplyMove> for SessionActor {
    type Result = Result<MoveOutcome, SessionError>;

    fn handle(&mut self, msg: ApplyMove, ctx: &mut Self::Context) -> Self::Result {
        let outcome = self.session.apply_move(&msg.0, Instant::now())?;
        self.after_move(&outcome, ctx);
        Ok(outcome)
    }
}

impl Handler<Resign> for SessionActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: Resign, ctx: &mut Self::Context) -> Self::Result {
        let side = msg.0.unwrap_or(self.session.host().side);
        self.session.resign(side, Instant::now())?;
        self.after_change(ctx);
        Ok(())
    }
}

impl Handler<OfferDraw> for SessionActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, _msg: OfferDraw, ctx: &mut Self::Context) -> Self::Result {
        self.session.offer_draw()?;
        self.schedule_draw_answer(ctx);
        Ok(())
    }
}

impl Handler<Abort> for SessionActor {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, _msg: Abort, ctx: &mut Self::Context) -> Self::Result {
        self.session.abort()?;
        self.after_change(ctx);
        Ok(())
    }
}

impl Handler<Navigate> for SessionActor {
    type Result = Result<ReplayCursor, SessionError>;

    fn handle(&mut self, msg: Navigate, _ctx: &mut Self::Context) -> Self::Result {
        self.session.navigate(msg.0)
    }
}

impl Handler<GetSnapshot> for SessionActor {
    type Result = Result<SessionSnapshot, SessionError>;

    fn handle(&mut self, _msg: GetSnapshot, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.session.snapshot())
    }
}

impl Handler<Tick> for SessionActor {
    type Result = ();

    fn handle(&mut self, msg: Tick, ctx: &mut Self::Context) {
        match self.session.tick(msg.now, &self.monitor) {
            TickOutcome::Running => {}
            TickOutcome::TimedOut { loser, cause } => {
                debug!("session {}: {} lost on time ({:?})", self.id(), loser, cause);
                self.conclude(ctx);
            }
            TickOutcome::Idle => self.conclude(ctx),
        }
    }
}

impl Handler<Shutdown> for SessionActor {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) {
        ctx.stop();
    }
}
