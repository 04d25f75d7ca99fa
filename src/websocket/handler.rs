use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::{ClientMessage, ServerMessage, SessionEvent};
use crate::simul::{SimulCoordinator, Subscribe};

/// WebSocket connection of one simul client
pub struct ChessWebSocket {
    pub id: Uuid,
    pub coordinator: Addr<SimulCoordinator>,
}

impl ChessWebSocket {
    pub fn new(coordinator: Addr<SimulCoordinator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinator,
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Every socket sees every session event.
        self.coordinator
            .do_send(Subscribe(ctx.address().recipient()));
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<SessionEvent> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, event: SessionEvent, ctx: &mut Self::Context) {
        send_json(ctx, &ServerMessage::Event(event));
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message from {}: {}", self.id, e);
                        let reply =
                            ServerMessage::error(None, format!("Invalid message format: {}", e));
                        send_json(ctx, &reply);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                send_json(ctx, &ServerMessage::error(None, "Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

pub fn send_json(ctx: &mut ws::WebsocketContext<ChessWebSocket>, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(text) => ctx.text(text),
        Err(e) => {
            warn!("Failed to serialize response: {}", e);
            ctx.text("{\"message_type\": \"error\", \"error\": \"Internal server error\"}");
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    coordinator: web::Data<Addr<SimulCoordinator>>,
) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(coordinator.get_ref().clone());
    info!("New WebSocket connection request: {}", ws.id);
    ws::start(ws, &req, stream)
}
