//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic; we reply with a single JSON message per request.
//! Notifications published while the socket is open are pushed as they happen.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, instrument, warn};

use crate::logic::do_generate;
use crate::notifications::Notification;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lifemate", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

fn encode(msg: &ServerWsMessage) -> String {
  serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

enum Event {
  Incoming(Option<Result<Message, axum::Error>>),
  Note(Result<Notification, RecvError>),
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "lifemate", "WebSocket connected");
  let mut notes = state.notifications.subscribe();

  loop {
    let event = tokio::select! {
      incoming = socket.recv() => Event::Incoming(incoming),
      note = notes.recv() => Event::Note(note),
    };

    let reply = match event {
      Event::Incoming(Some(Ok(Message::Text(txt)))) => Some(handle_text(&txt, &state).await),
      Event::Incoming(Some(Ok(Message::Ping(payload)))) => {
        let _ = socket.send(Message::Pong(payload)).await;
        None
      }
      Event::Incoming(Some(Ok(Message::Close(_)))) | Event::Incoming(None) => break,
      Event::Incoming(Some(Ok(_))) => None,
      Event::Incoming(Some(Err(e))) => {
        warn!(target: "lifemate", error = %e, "WS receive error");
        break;
      }
      Event::Note(Ok(notification)) => Some(ServerWsMessage::Notification { notification }),
      Event::Note(Err(RecvError::Lagged(skipped))) => {
        debug!(target: "notifications", skipped, "WS subscriber lagged");
        None
      }
      Event::Note(Err(RecvError::Closed)) => None,
    };

    if let Some(msg) = reply {
      if let Err(e) = socket.send(Message::Text(encode(&msg))).await {
        error!(target: "lifemate", error = %e, "WS send error");
        break;
      }
    }
  }
  info!(target: "lifemate", "WebSocket disconnected");
}

async fn handle_text(txt: &str, state: &AppState) -> ServerWsMessage {
  match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "lifemate", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,
    ClientWsMessage::Generate { schema, prompt } => match do_generate(state, &schema, &prompt).await {
      Ok(payload) => ServerWsMessage::Result { payload },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Prompts;
  use crate::notifications::NotificationStore;
  use crate::pipeline::Generator;
  use crate::tasks::InMemoryTaskStore;
  use serde_json::Value;

  fn offline_state() -> AppState {
    AppState::with_parts(
      Generator::default(),
      Prompts::default(),
      Arc::new(NotificationStore::in_memory()),
      Arc::new(InMemoryTaskStore::default()),
    )
  }

  async fn reply(txt: &str) -> Value {
    let state = offline_state();
    serde_json::from_str(&encode(&handle_text(txt, &state).await)).unwrap()
  }

  #[tokio::test]
  async fn ping_pong() {
    assert_eq!(reply(r#"{"type":"ping"}"#).await["type"], "pong");
  }

  #[tokio::test]
  async fn generate_returns_tagged_payload() {
    let v = reply(r#"{"type":"generate","schema":"yoga","prompt":"back pain"}"#).await;
    assert_eq!(v["type"], "result");
    assert_eq!(v["payload"]["schema"], "yoga");
    assert_eq!(v["payload"]["source"], "fallback");
    assert_eq!(v["payload"]["items"].as_array().map(Vec::len), Some(3));
  }

  #[tokio::test]
  async fn bad_input_is_an_error_message() {
    assert_eq!(reply("{not json").await["type"], "error");
    let v = reply(r#"{"type":"generate","schema":"nope","prompt":"x"}"#).await;
    assert_eq!(v["type"], "error");
  }
}
