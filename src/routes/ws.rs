//! WebSocket upgrade + message loop. Client messages are parsed as JSON and forwarded to
//! core logic; round changes made by the feedback timer are pushed as they happen.
//!
//! A socket drives at most one round. Closing the socket ends that round.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::{IntoResponse, Response},
};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use crate::identity::Caller;
use crate::logic;
use crate::protocol::{ClientWsMessage, RoundOut, ServerWsMessage, WsQuery};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state, q))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
) -> Response {
  match state.resolve_caller(q.access_token.as_deref(), q.user_id.as_deref()).await {
    Ok(caller) => {
      info!(target: "pintarcilik", user_id = %caller.user_id, "WebSocket upgrade requested");
      ws.on_upgrade(move |socket| handle_ws(socket, state, caller))
    }
    Err(e) => e.into_response(),
  }
}

/// Per-connection round tracking.
#[derive(Default)]
struct WsSession {
  round_id: Option<String>,
  updates: Option<watch::Receiver<RoundOut>>,
  completion_sent: bool,
}

impl WsSession {
  fn clear(&mut self) {
    *self = Self::default();
  }
}

/// Next round snapshot, or pending forever when nothing is being watched.
async fn next_update(updates: &mut Option<watch::Receiver<RoundOut>>) -> Option<RoundOut> {
  match updates {
    Some(rx) => match rx.changed().await {
      Ok(()) => Some(rx.borrow_and_update().clone()),
      Err(_) => {
        // Sender dropped: the round was ended or replaced elsewhere.
        *updates = None;
        None
      }
    },
    None => std::future::pending().await,
  }
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await
}

#[instrument(level = "info", skip(socket, state, caller), fields(user_id = %caller.user_id))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, caller: Caller) {
  info!(target: "pintarcilik", "WebSocket connected");
  let mut session = WsSession::default();

  'conn: loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target: "pintarcilik", "WS received: {:?}", &incoming);
                handle_client_ws(incoming, &state, &caller, &mut session).await
              }
              Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
            };
            for reply in &replies {
              if let Err(e) = send(&mut socket, reply).await {
                error!(target: "pintarcilik", error = %e, "WS send error");
                break 'conn;
              }
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
      update = next_update(&mut session.updates) => {
        let Some(round) = update else { continue };
        for msg in pushes_for(round, &mut session) {
          if let Err(e) = send(&mut socket, &msg).await {
            error!(target: "pintarcilik", error = %e, "WS push error");
            break 'conn;
          }
        }
      }
    }
  }

  if let Some(round_id) = session.round_id.take() {
    // Already gone if the learner restarted elsewhere; nothing to report then.
    let _ = logic::end_round(&state, &caller, &round_id).await;
  }
  info!(target: "pintarcilik", "WebSocket disconnected");
}

/// Messages pushed for a round snapshot: the snapshot itself, plus the result once.
fn pushes_for(round: RoundOut, session: &mut WsSession) -> Vec<ServerWsMessage> {
  let result = round.result.clone();
  let mut out = vec![ServerWsMessage::Round { round }];
  if let Some(result) = result {
    if !session.completion_sent {
      session.completion_sent = true;
      out.push(ServerWsMessage::RoundComplete { result });
    }
  }
  out
}

#[instrument(level = "info", skip(state, caller, session), fields(user_id = %caller.user_id))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &Arc<AppState>,
  caller: &Caller,
  session: &mut WsSession,
) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::StartRound { category } => match logic::start_round(state, caller, category).await {
      Ok(round) => {
        session.clear();
        session.updates = state.rounds.subscribe(&round.id).await;
        session.round_id = Some(round.id.clone());
        info!(target: "quiz", round_id = %round.id, "WS round started");
        vec![ServerWsMessage::Round { round }]
      }
      Err(e) => vec![ServerWsMessage::Error { message: e.to_string() }],
    },

    ClientWsMessage::Answer { option } => {
      let Some(round_id) = session.round_id.clone() else {
        return vec![ServerWsMessage::Error { message: "no active round".into() }];
      };
      match logic::submit_answer(state, caller, &round_id, &option).await {
        Ok(out) => vec![ServerWsMessage::Feedback {
          accepted: out.accepted,
          feedback: out.feedback,
          correct_answer: out.correct_answer,
          score: out.round.score,
        }],
        Err(e) => {
          session.clear();
          vec![ServerWsMessage::Error { message: e.to_string() }]
        }
      }
    }

    ClientWsMessage::EndRound => {
      if let Some(round_id) = session.round_id.take() {
        let _ = logic::end_round(state, caller, &round_id).await;
      }
      session.clear();
      vec![ServerWsMessage::RoundEnded]
    }

    ClientWsMessage::GetSummary => vec![ServerWsMessage::Summary { summary: logic::summary(state, caller).await }],

    ClientWsMessage::GetReport => vec![ServerWsMessage::Report { text: logic::parent_report(state, caller).await }],
  }
}
