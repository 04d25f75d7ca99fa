use actix::dev::ToEnvelope;
use actix::prelude::*;
use actix_web_actors::ws;
use log::{info, warn};

use crate::error::SessionError;
use crate::models::{ClientMessage, MoveRequest, ServerMessage, SessionId};
use crate::simul::{
    Abort, ApplyMove, CreateSessions, Focus, GetPoolView, Navigate, OfferDraw, RemoveSession,
    Resign, SimulCoordinator, ToSession, Unfocus,
};
use crate::websocket::handler::{send_json, ChessWebSocket};

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::Create { count, config } => {
                info!("Creating {} board(s) for {}", count, config.host.display_name);
                self.relay(CreateSessions { count, config }, ctx, |result| match result {
                    Ok(game_ids) => ServerMessage::GameCreated { game_ids },
                    Err(e) => rejected(None, &e),
                });
            }
            ClientMessage::Move {
                game_id,
                move_from,
                move_to,
                promote_to,
            } => {
                let request = MoveRequest {
                    from: move_from,
                    to: move_to,
                    promotion: promote_to,
                };
                self.relay(ToSession::new(game_id, ApplyMove(request)), ctx, move |result| {
                    match result {
                        Ok(outcome) => ServerMessage::MoveResult {
                            game_id,
                            accepted: true,
                            notation: Some(outcome.notation),
                            status: Some(outcome.status),
                            error: None,
                        },
                        Err(e) => {
                            warn!("Move rejected on {}: {}", game_id, e);
                            ServerMessage::MoveResult {
                                game_id,
                                accepted: false,
                                notation: None,
                                status: None,
                                error: Some(e.to_string()),
                            }
                        }
                    }
                });
            }
            ClientMessage::Resign { game_id } => {
                self.relay(ToSession::new(game_id, Resign(None)), ctx, move |result| {
                    ack(game_id, "resign", result)
                });
            }
            ClientMessage::OfferDraw { game_id } => {
                self.relay(ToSession::new(game_id, OfferDraw), ctx, move |result| {
                    ack(game_id, "offer_draw", result)
                });
            }
            ClientMessage::Abort { game_id } => {
                self.relay(ToSession::new(game_id, Abort), ctx, move |result| {
                    ack(game_id, "abort", result)
                });
            }
            ClientMessage::Navigate { game_id, direction } => {
                self.relay(ToSession::new(game_id, Navigate(direction)), ctx, move |result| {
                    match result {
                        Ok(cursor) => ServerMessage::Cursor { game_id, cursor },
                        Err(e) => rejected(Some(game_id), &e),
                    }
                });
            }
            ClientMessage::Remove { game_id } => {
                self.relay(RemoveSession(game_id), ctx, move |result| {
                    ack(game_id, "remove", result)
                });
            }
            ClientMessage::Focus { game_id } => {
                self.relay(Focus(game_id), ctx, move |result| ack(game_id, "focus", result));
            }
            ClientMessage::Unfocus => {
                self.relay(Unfocus, ctx, |()| ServerMessage::Ack {
                    game_id: None,
                    action: "unfocus",
                });
            }
            ClientMessage::Pool => {
                self.relay(GetPoolView, ctx, ServerMessage::Pool);
            }
        }
    }

    /// Sends `msg` to the coordinator and writes `reply(result)` back to this socket.
    fn relay<M, F>(&self, msg: M, ctx: &mut ws::WebsocketContext<Self>, reply: F)
    where
        M: Message + Send + 'static,
        M::Result: Send,
        SimulCoordinator: Handler<M>,
        <SimulCoordinator as Actor>::Context: ToEnvelope<SimulCoordinator, M>,
        F: FnOnce(M::Result) -> ServerMessage + 'static,
    {
        let request = self.coordinator.send(msg);
        ctx.spawn(request.into_actor(self).map(move |result, _act, ctx| {
            let message = match result {
                Ok(result) => reply(result),
                Err(e) => {
                    warn!("Coordinator unavailable: {}", e);
                    ServerMessage::error(None, "Server is shutting down")
                }
            };
            send_json(ctx, &message);
        }));
    }
}

fn ack(
    game_id: SessionId,
    action: &'static str,
    result: Result<(), SessionError>,
) -> ServerMessage {
    match result {
        Ok(()) => ServerMessage::Ack {
            game_id: Some(game_id),
            action,
        },
        Err(e) => rejected(Some(game_id), &e),
    }
}

fn rejected(game_id: Option<SessionId>, error: &SessionError) -> ServerMessage {
    warn!("Rejected client request: {}", error);
    ServerMessage::error(game_id, error.to_string())
}
