//! The single clock behind every time-driven transition.
//!
//! Sessions register while they are active. Each period the scheduler reads
//! `Instant::now()` once and hands that same instant to every registered
//! session, so no two boards disagree about what time it is.

use actix::prelude::*;
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::SessionId;

/// One scheduler period elapsed.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Tick {
    pub now: Instant,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Register {
    pub id: SessionId,
    pub recipient: Recipient<Tick>,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Deregister {
    pub id: SessionId,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "SchedulerStatus")]
pub struct GetStatus;

#[derive(MessageResponse, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub running: bool,
    pub registered: usize,
}

pub struct Scheduler {
    period: Duration,
    sessions: HashMap<SessionId, Recipient<Tick>>,
    interval: Option<SpawnHandle>,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            sessions: HashMap::new(),
            interval: None,
        }
    }

    fn ensure_running(&mut self, ctx: &mut Context<Self>) {
        if self.interval.is_some() || self.sessions.is_empty() {
            return;
        }
        debug!("scheduler started ({:?} period)", self.period);
        self.interval = Some(ctx.run_interval(self.period, |act, ctx| act.tick(ctx)));
    }

    fn stop_if_idle(&mut self, ctx: &mut Context<Self>) {
        if !self.sessions.is_empty() {
            return;
        }
        if let Some(handle) = self.interval.take() {
            ctx.cancel_future(handle);
            debug!("scheduler idle, interval cancelled");
        }
    }

    fn tick(&mut self, ctx: &mut Context<Self>) {
        let now = Instant::now();
        self.sessions.retain(|id, recipient| match recipient.try_send(Tick { now }) {
            Err(SendError::Closed(_)) => {
                debug!("session {} went away, dropping it from the scheduler", id);
                false
            }
            // A full mailbox only skips this period; the next tick charges the gap.
            _ => true,
        });
        self.stop_if_idle(ctx);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl Actor for Scheduler {
    type Context = Context<Self>;
}

impl Handler<Register> for Scheduler {
    type Result = ();

    fn handle(&mut self, msg: Register, ctx: &mut Self::Context) {
        self.sessions.insert(msg.id, msg.recipient);
        self.ensure_running(ctx);
    }
}

impl Handler<Deregister> for Scheduler {
    type Result = ();

    fn handle(&mut self, msg: Deregister, ctx: &mut Self::Context) {
        if self.sessions.remove(&msg.id).is_some() {
            debug!("session {} deregistered", msg.id);
        }
        self.stop_if_idle(ctx);
    }
}

impl Handler<GetStatus> for Scheduler {
    type Result = SchedulerStatus;

    fn handle(&mut self, _msg: GetStatus, _ctx: &mut Self::Context) -> SchedulerStatus {
        SchedulerStatus {
            running: self.interval.is_some(),
            registered: self.sessions.len(),
        }
    }
}
