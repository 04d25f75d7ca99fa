use actix::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use simul_chess::config::EngineConfig;
use simul_chess::game::{ChessOracle, RulesOracle};
use simul_chess::models::{
    GameMode, MoveRequest, NavDirection, ReplayCursor, SessionConfig, SessionEvent, SessionId,
    SessionSnapshot, Side, Status, TimeoutCause,
};
use simul_chess::simul::{
    Abort, ApplyMove, CreateSession, CreateSessions, Focus, GetAggregateScore, GetPoolView,
    GetSnapshot, Navigate, NeedingAttention, OfferDraw, RemoveSession, Resign, Scheduler,
    SimulCoordinator, Subscribe, ToSession, Unfocus, WaitingSessions,
};
use simul_chess::SessionError;

fn engine() -> EngineConfig {
    EngineConfig {
        tick_period: Duration::from_millis(10),
        bot_min_delay: Duration::from_millis(5),
        bot_jitter: Duration::ZERO,
        draw_response_delay: Duration::from_millis(5),
        rng_seed: Some(2024),
        ..EngineConfig::default()
    }
}

fn start(config: EngineConfig) -> (Addr<SimulCoordinator>, Addr<Scheduler>) {
    let scheduler = Scheduler::new(config.tick_period).start();
    let coordinator = SimulCoordinator::new(config, scheduler.clone()).start();
    (coordinator, scheduler)
}

fn host_white() -> SessionConfig {
    SessionConfig::simul("Host", 1800, Side::White)
}

async fn create(
    coordinator: &Addr<SimulCoordinator>,
    count: usize,
    config: SessionConfig,
) -> Vec<SessionId> {
    coordinator
        .send(CreateSessions { count, config })
        .await
        .unwrap()
        .unwrap()
}

async fn snapshot(coordinator: &Addr<SimulCoordinator>, id: SessionId) -> SessionSnapshot {
    coordinator
        .send(ToSession::new(id, GetSnapshot))
        .await
        .unwrap()
        .unwrap()
}

async fn settle(ms: u64) {
    actix_rt::time::sleep(Duration::from_millis(ms)).await;
}

#[derive(Default)]
struct Collector {
    events: Vec<SessionEvent>,
}

impl Actor for Collector {
    type Context = Context<Self>;
}

impl Handler<SessionEvent> for Collector {
    type Result = ();

    fn handle(&mut self, msg: SessionEvent, _ctx: &mut Self::Context) {
        self.events.push(msg);
    }
}

#[derive(Message)]
#[rtype(result = "Vec<SessionEvent>")]
struct Collected;

impl Handler<Collected> for Collector {
    type Result = Vec<SessionEvent>;

    fn handle(&mut self, _msg: Collected, _ctx: &mut Self::Context) -> Vec<SessionEvent> {
        self.events.clone()
    }
}

#[actix_rt::test]
async fn resigning_one_of_three_boards() {
    let (coordinator, _) = start(engine());
    let ids = create(&coordinator, 3, host_white()).await;
    assert_eq!(ids.len(), 3);

    coordinator
        .send(ToSession::new(ids[1], Resign(None)))
        .await
        .unwrap()
        .unwrap();

    let score = coordinator.send(GetAggregateScore).await.unwrap();
    assert_eq!(score.losses, 1);
    assert_eq!(score.wins, 0);
    assert_eq!(score.active_count, 2);
    assert_eq!(score.potential, 2 * 3);
    assert_eq!(score.points, -1);

    let view = coordinator.send(GetPoolView).await.unwrap();
    let numbers: Vec<_> = view.boards.iter().map(|b| b.board_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(view.boards[1].opponent.display_name, "Challenger 2");
}

#[actix_rt::test]
async fn removing_a_board_leaves_the_others_alone() {
    let (coordinator, _) = start(engine());
    let ids = create(&coordinator, 2, host_white()).await;
    let (a, b) = (ids[0], ids[1]);

    coordinator
        .send(ToSession::new(b, ApplyMove(MoveRequest::new("d2", "d4"))))
        .await
        .unwrap()
        .unwrap();
    settle(40).await;
    let before = snapshot(&coordinator, b).await;

    coordinator.send(RemoveSession(a)).await.unwrap().unwrap();

    let after = snapshot(&coordinator, b).await;
    assert_eq!(after.id, b);
    assert_eq!(after.board_number, 2);
    assert_eq!(after.move_history, before.move_history);
    assert_eq!(after.status, Status::Active);

    let view = coordinator.send(GetPoolView).await.unwrap();
    assert_eq!(view.boards.len(), 1);
    assert_eq!(view.boards[0].id, b);

    // The removed board is gone for good.
    assert_eq!(
        coordinator
            .send(ToSession::new(a, ApplyMove(MoveRequest::new("e2", "e4"))))
            .await
            .unwrap(),
        Err(SessionError::NotFound(a))
    );
    assert_eq!(
        coordinator.send(RemoveSession(a)).await.unwrap(),
        Err(SessionError::NotFound(a))
    );

    // Board numbers are never reused.
    let c = create(&coordinator, 1, host_white()).await[0];
    assert_eq!(snapshot(&coordinator, c).await.board_number, 3);
}

#[actix_rt::test]
async fn unknown_ids_are_not_found() {
    let (coordinator, _) = start(engine());
    let ghost = SessionId::new();
    assert_eq!(
        coordinator.send(ToSession::new(ghost, Resign(None))).await.unwrap(),
        Err(SessionError::NotFound(ghost))
    );
    assert_eq!(
        coordinator.send(ToSession::new(ghost, OfferDraw)).await.unwrap(),
        Err(SessionError::NotFound(ghost))
    );
    assert_eq!(
        coordinator
            .send(ToSession::new(ghost, Navigate(NavDirection::Start)))
            .await
            .unwrap(),
        Err(SessionError::NotFound(ghost))
    );
    assert_eq!(coordinator.send(Focus(ghost)).await.unwrap(), Err(SessionError::NotFound(ghost)));
}

#[actix_rt::test]
async fn bot_replies_and_attention_follows_the_turn() {
    let config = EngineConfig {
        bot_min_delay: Duration::from_millis(40),
        ..engine()
    };
    let (coordinator, _) = start(config);
    let ids = create(&coordinator, 2, host_white()).await;

    let needing = coordinator.send(NeedingAttention).await.unwrap();
    assert_eq!(needing, ids);
    assert!(coordinator.send(WaitingSessions).await.unwrap().is_empty());

    coordinator
        .send(ToSession::new(ids[0], ApplyMove(MoveRequest::new("e2", "e4"))))
        .await
        .unwrap()
        .unwrap();
    // Straight after the move the bot is thinking.
    let waiting = coordinator.send(WaitingSessions).await.unwrap();
    assert!(waiting.contains(&ids[0]));

    settle(120).await;
    let board = snapshot(&coordinator, ids[0]).await;
    assert_eq!(board.move_history.len(), 2);
    assert!(board.host_to_move);
    assert!(board.opponent_just_moved);
    assert_eq!(coordinator.send(NeedingAttention).await.unwrap(), ids);
}

#[actix_rt::test]
async fn human_move_on_the_bots_turn_is_rejected() {
    let config = EngineConfig {
        bot_min_delay: Duration::from_millis(200),
        ..engine()
    };
    let (coordinator, _) = start(config);
    let id = create(&coordinator, 1, host_white()).await[0];
    coordinator
        .send(ToSession::new(id, ApplyMove(MoveRequest::new("e2", "e4"))))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        coordinator
            .send(ToSession::new(id, ApplyMove(MoveRequest::new("e7", "e5"))))
            .await
            .unwrap(),
        Err(SessionError::NotYourTurn)
    );
}

#[actix_rt::test]
async fn stalemating_the_bot_finishes_the_board_at_once() {
    let (coordinator, _) = start(engine());
    let config = host_white().with_start_position("7k/8/6K1/5Q2/8/8/8/8 w - - 0 1");
    let id = create(&coordinator, 1, config).await[0];

    let outcome = coordinator
        .send(ToSession::new(id, ApplyMove(MoveRequest::new("f5", "f7"))))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.status, Status::Stalemate);

    settle(40).await;
    let board = snapshot(&coordinator, id).await;
    assert_eq!(board.status, Status::Stalemate);
    assert_eq!(board.move_history.len(), 1);

    let score = coordinator.send(GetAggregateScore).await.unwrap();
    assert_eq!(score.draws, 1);
    assert_eq!(score.points, 1);
    assert_eq!(score.potential, 0);
}

#[actix_rt::test]
async fn clock_flag_through_the_scheduler() {
    let (coordinator, _) = start(engine());
    let config = host_white()
        .with_mode(GameMode::Local { vs_bot: false })
        .with_time_control(0.001, 0.0);
    let id = create(&coordinator, 1, config).await[0];

    settle(150).await;
    let board = snapshot(&coordinator, id).await;
    assert_eq!(board.status, Status::Timeout);
    assert_eq!(board.timeout_cause, Some(TimeoutCause::Flag));
    assert_eq!(board.winner, Some(Side::Black));
    assert_eq!(board.clock.white_ms, 0);
    assert_eq!(board.score_delta, Some(-1));
}

#[actix_rt::test]
async fn inactivity_forfeit_through_the_scheduler() {
    let config = EngineConfig {
        inactivity_threshold: Duration::from_millis(30),
        ..engine()
    };
    let (coordinator, _) = start(config);
    let id = create(&coordinator, 1, host_white()).await[0];

    settle(150).await;
    let board = snapshot(&coordinator, id).await;
    assert_eq!(board.status, Status::Timeout);
    assert_eq!(board.timeout_cause, Some(TimeoutCause::Inactivity));
    assert!(board.clock.white_ms > 0);
}

#[actix_rt::test]
async fn scheduler_goes_idle_and_wakes_up_again() {
    use simul_chess::simul::scheduler::GetStatus;

    let (coordinator, scheduler) = start(engine());
    assert!(!scheduler.send(GetStatus).await.unwrap().running);

    let id = create(&coordinator, 1, host_white()).await[0];
    settle(20).await;
    let status = scheduler.send(GetStatus).await.unwrap();
    assert!(status.running);
    assert_eq!(status.registered, 1);

    coordinator
        .send(ToSession::new(id, Resign(None)))
        .await
        .unwrap()
        .unwrap();
    settle(20).await;
    let status = scheduler.send(GetStatus).await.unwrap();
    assert!(!status.running);
    assert_eq!(status.registered, 0);

    create(&coordinator, 1, host_white()).await;
    settle(20).await;
    assert!(scheduler.send(GetStatus).await.unwrap().running);
}

#[actix_rt::test]
async fn abort_and_navigation_through_the_pool() {
    let (coordinator, _) = start(engine());
    let local = host_white().with_mode(GameMode::Local { vs_bot: false });
    let id = coordinator.send(CreateSession(local)).await.unwrap().unwrap();

    for (from, to) in [("e2", "e4"), ("e7", "e5")] {
        coordinator
            .send(ToSession::new(id, ApplyMove(MoveRequest::new(from, to))))
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(
        coordinator.send(ToSession::new(id, Abort)).await.unwrap(),
        Err(SessionError::AbortTooLate { plies: 2 })
    );

    let cursor = coordinator
        .send(ToSession::new(id, Navigate(NavDirection::Prev)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cursor, ReplayCursor::At(1));
    let board = snapshot(&coordinator, id).await;
    assert_ne!(board.displayed_position, board.position);
    assert_eq!(board.status, Status::Active);

    let fresh = coordinator
        .send(CreateSession(host_white()))
        .await
        .unwrap()
        .unwrap();
    coordinator.send(ToSession::new(fresh, Abort)).await.unwrap().unwrap();
    let board = snapshot(&coordinator, fresh).await;
    assert_eq!(board.status, Status::Aborted);
    assert_eq!(board.score_delta, None);
}

#[actix_rt::test]
async fn focus_is_view_state_only() {
    let (coordinator, _) = start(engine());
    let ids = create(&coordinator, 2, host_white()).await;

    coordinator.send(Focus(ids[1])).await.unwrap().unwrap();
    let view = coordinator.send(GetPoolView).await.unwrap();
    assert_eq!(view.focused, Some(ids[1]));
    assert!(view.boards.iter().all(|b| b.move_history.is_empty()));

    coordinator.send(Unfocus).await.unwrap();
    assert_eq!(coordinator.send(GetPoolView).await.unwrap().focused, None);

    coordinator.send(Focus(ids[0])).await.unwrap().unwrap();
    coordinator.send(RemoveSession(ids[0])).await.unwrap().unwrap();
    assert_eq!(coordinator.send(GetPoolView).await.unwrap().focused, None);
}

#[actix_rt::test]
async fn subscribers_hear_the_lifecycle() {
    let (coordinator, _) = start(engine());
    let collector = Collector::default().start();
    coordinator
        .send(Subscribe(collector.clone().recipient()))
        .await
        .unwrap();

    let id = create(&coordinator, 1, host_white()).await[0];
    coordinator
        .send(ToSession::new(id, ApplyMove(MoveRequest::new("e2", "e4"))))
        .await
        .unwrap()
        .unwrap();
    settle(40).await;
    coordinator
        .send(ToSession::new(id, Resign(None)))
        .await
        .unwrap()
        .unwrap();
    settle(20).await;
    coordinator.send(RemoveSession(id)).await.unwrap().unwrap();
    settle(10).await;

    let events = collector.send(Collected).await.unwrap();
    assert!(events.iter().all(|e| e.game_id() == id));
    assert!(matches!(events.first(), Some(SessionEvent::Created { board_number: 1, .. })));
    let moves = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::MovePlayed { .. }))
        .count();
    assert_eq!(moves, 2);
    let finished = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Finished { status: Status::Resigned, .. }))
        .count();
    assert_eq!(finished, 1);
    assert!(matches!(events.last(), Some(SessionEvent::Removed { .. })));
}

#[actix_rt::test]
async fn invalid_config_creates_nothing() {
    let (coordinator, _) = start(engine());
    let bad = host_white().with_time_control(0.0, 0.0);
    let result = coordinator
        .send(CreateSessions { count: 3, config: bad })
        .await
        .unwrap();
    assert!(matches!(result, Err(SessionError::InvalidConfig { .. })));
    assert!(coordinator.send(GetPoolView).await.unwrap().boards.is_empty());
}

#[actix_rt::test]
async fn oversized_batches_are_rejected_and_the_pool_survives() {
    let (coordinator, _) = start(EngineConfig {
        max_boards: 3,
        ..engine()
    });
    let result = coordinator
        .send(CreateSessions {
            count: usize::MAX,
            config: host_white(),
        })
        .await
        .unwrap();
    assert!(matches!(result, Err(SessionError::InvalidConfig { .. })));
    assert!(coordinator.send(GetPoolView).await.unwrap().boards.is_empty());

    let ids = create(&coordinator, 2, host_white()).await;
    assert_eq!(ids.len(), 2);

    // Only one slot is left.
    let result = coordinator
        .send(CreateSessions {
            count: 2,
            config: host_white(),
        })
        .await
        .unwrap();
    assert!(matches!(result, Err(SessionError::InvalidConfig { .. })));
    assert_eq!(coordinator.send(GetPoolView).await.unwrap().boards.len(), 2);

    let third = coordinator.send(CreateSession(host_white())).await.unwrap();
    assert!(third.is_ok());
    let fourth = coordinator.send(CreateSession(host_white())).await.unwrap();
    assert!(matches!(fourth, Err(SessionError::InvalidConfig { .. })));

    // Removing a board frees its slot.
    coordinator.send(RemoveSession(ids[0])).await.unwrap().unwrap();
    assert_eq!(create(&coordinator, 1, host_white()).await.len(), 1);
}

#[actix_rt::test]
async fn custom_oracle_factory_is_used() {
    let scheduler = Scheduler::new(Duration::from_millis(10)).start();
    let factory = Arc::new(|| -> Box<dyn RulesOracle> {
        Box::new(ChessOracle::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").expect("valid fen"))
    });
    let coordinator = SimulCoordinator::new(engine(), scheduler)
        .with_oracle_factory(factory)
        .start();
    let id = create(&coordinator, 1, host_white()).await[0];
    let outcome = coordinator
        .send(ToSession::new(id, ApplyMove(MoveRequest::new("a7", "a8"))))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.notation, "a7a8q");
}

#[actix_rt::test]
async fn draw_offer_through_the_pool() {
    let (coordinator, _) = start(EngineConfig {
        draw_acceptance: 1.0,
        ..engine()
    });
    let ids = create(&coordinator, 2, host_white()).await;
    coordinator
        .send(ToSession::new(ids[0], OfferDraw))
        .await
        .unwrap()
        .unwrap();
    settle(40).await;

    let board = snapshot(&coordinator, ids[0]).await;
    assert_eq!(board.status, Status::Draw);
    assert_eq!(board.score_delta, Some(1));
    assert_eq!(snapshot(&coordinator, ids[1]).await.status, Status::Active);

    let score = coordinator.send(GetAggregateScore).await.unwrap();
    assert_eq!(score.points, 1);
    assert_eq!(score.draws, 1);
}

#[actix_rt::test]
async fn declined_draw_offer_through_the_pool() {
    let (coordinator, _) = start(EngineConfig {
        draw_acceptance: 0.0,
        ..engine()
    });
    let id = create(&coordinator, 1, host_white()).await[0];
    coordinator.send(ToSession::new(id, OfferDraw)).await.unwrap().unwrap();
    settle(40).await;

    let board = snapshot(&coordinator, id).await;
    assert_eq!(board.status, Status::Active);
    assert_eq!(board.score_delta, None);
}
