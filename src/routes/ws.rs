//! WebSocket upgrade + quiz play loop. One connection owns one quiz session.
//!
//! The loop waits on three things at once: client messages, completions of
//! remote calls spawned by the session, and refreshed user totals. Every
//! event may produce several JSON replies, sent in order.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, Instrument};
use uuid::Uuid;

use crate::domain::UserId;
use crate::logic::PlaySession;
use crate::protocol::{ClientWsMessage, ServerWsMessage, WsQuery};
use crate::state::AppState;

#[instrument(level = "info", skip(state, ws, q), fields(user_id = q.user_id))]
pub async fn ws_upgrade(
  Query(q): Query<WsQuery>,
  State(state): State<Arc<AppState>>,
  ws: WebSocketUpgrade,
) -> impl IntoResponse {
  info!(target: "trivia_quiz_backend", "WebSocket upgrade requested");
  let conn_id = Uuid::new_v4();
  let span = tracing::info_span!("quiz_ws", %conn_id, user_id = q.user_id);
  ws.on_upgrade(move |socket| handle_ws(socket, state, q.user_id).instrument(span))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
  info!(target: "trivia_quiz_backend", "WebSocket connected");
  let (mut play, mut completions, mut stats) = PlaySession::new(user_id, state.source.clone(), state.sink.clone());

  if send_all(&mut socket, vec![play.state_message()]).await.is_err() {
    return;
  }

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "trivia_quiz_backend", "WS received: {:?}", msg_kind(&msg));
            play.handle_client(msg)
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Ok(_)) => continue,
        Some(Err(e)) => {
          error!(target: "trivia_quiz_backend", error = %e, "WS receive error");
          break;
        }
      },
      Some(completion) = completions.recv() => play.handle_completion(completion),
      Ok(()) = stats.changed() => {
        let user = stats.borrow_and_update().clone();
        match user {
          Some(user) => vec![ServerWsMessage::ResultsSaved { user }],
          None => continue,
        }
      }
    };

    if send_all(&mut socket, replies).await.is_err() {
      break;
    }
  }
  info!(target: "trivia_quiz_backend", phase = %play.engine().phase(), "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> Result<(), axum::Error> {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "trivia_quiz_backend", error = %e, "WS send error");
      return Err(e);
    }
  }
  Ok(())
}

/// Message name for logs; guesses are not logged verbatim.
fn msg_kind(msg: &ClientWsMessage) -> &'static str {
  match msg {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::GetState => "get_state",
    ClientWsMessage::StartSession { .. } => "start_session",
    ClientWsMessage::SubmitGuess { .. } => "submit_guess",
    ClientWsMessage::Continue => "continue",
    ClientWsMessage::SubmitResults => "submit_results",
    ClientWsMessage::Restart => "restart",
  }
}
