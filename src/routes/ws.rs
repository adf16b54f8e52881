//! WebSocket upgrade + message loop. Each client message is parsed as JSON
//! and forwarded to core logic. We reply with a single JSON message per
//! request. Protected operations require an onboarded profile, same as HTTP.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::curriculum::topic_by_id;
use crate::logic;
use crate::protocol::{question_out, submit_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "sql_arena", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "sql_arena", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "sql_arena", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "sql_arena", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "sql_arena", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  // Every operation except ping is gated on an onboarded profile.
  let profile = state.profile.get().await;
  if profile.name.is_empty() && !matches!(&msg, ClientWsMessage::Ping) {
    return ServerWsMessage::Error { message: "No active session. Complete onboarding first.".into() };
  }

  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewQuestion { topic } => {
      let (question, generation, origin) = state.provide_question(&topic, profile.difficulty).await;
      tracing::info!(target: "quiz", %topic, id = %question.id, %origin, "WS question served");
      ServerWsMessage::Question { question: question_out(&question, generation) }
    }

    ClientWsMessage::SubmitQuery { question_id, query } => {
      match logic::submit_query(state, &question_id, &query).await {
        Some(outcome) => {
          tracing::info!(target: "quiz", id = %question_id, correct = outcome.result.is_correct, "WS submission evaluated");
          let out = submit_out(&outcome);
          ServerWsMessage::SubmitResult { result: out.result, profile: out.profile, stale: out.stale }
        }
        None => ServerWsMessage::Error { message: format!("Unknown question id: {}", question_id) },
      }
    }

    ClientWsMessage::Theory { topic_id, refresh } => {
      match topic_by_id(&topic_id) {
        Some(topic) => {
          let content = logic::get_theory(state, topic.id, topic.title, refresh).await;
          tracing::info!(target: "sql_arena", %topic_id, refresh, "WS theory served");
          ServerWsMessage::Theory { topic_id, content }
        }
        None => ServerWsMessage::Error { message: format!("Topic not found: {}", topic_id) },
      }
    }
  }
}
