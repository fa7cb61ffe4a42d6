//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler resolves the caller first; identity failures short-circuit as 401/503.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{error, info, instrument};

use crate::banks::AVATAR_OPTIONS;
use crate::error::ApiError;
use crate::identity::bearer_token;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    auth: state.auth.is_some(),
    store: state.store.name(),
    ai_report: state.openai.is_some(),
  })
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LoginQuery>,
) -> impl IntoResponse {
  let redirect_to = q.redirect_to.unwrap_or_default();
  Json(LoginOut { url: state.auth.as_ref().map(|a| a.authorize_url(&redirect_to)) })
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
  let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
  if let (Some(auth), Some(token)) = (&state.auth, bearer_token(authorization)) {
    if let Err(e) = auth.sign_out(token).await {
      error!(target: "identity", error = %e, "Sign-out failed");
    }
  }
  StatusCode::NO_CONTENT
}

#[instrument(level = "info")]
pub async fn http_avatars() -> impl IntoResponse {
  Json(AvatarsOut { avatars: AVATAR_OPTIONS.to_vec() })
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_profile(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<ProfileOut>, ApiError> {
  let caller = state.identify(&headers).await?;
  Ok(Json(logic::get_profile(&state, &caller).await))
}

#[instrument(level = "info", skip(state, headers, body), fields(age = body.age))]
pub async fn http_put_profile(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<ProfileIn>,
) -> Result<impl IntoResponse, ApiError> {
  let caller = state.identify(&headers).await?;
  let profile = logic::setup_profile(&state, &caller, &body).await?;
  Ok(Json(profile))
}

#[instrument(level = "info", skip(state, headers, body), fields(level = %body.level))]
pub async fn http_put_level(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<LevelIn>,
) -> Result<impl IntoResponse, ApiError> {
  let caller = state.identify(&headers).await?;
  let profile = logic::set_level(&state, &caller, body.level).await?;
  Ok(Json(profile))
}

#[instrument(level = "info", skip(state, headers, body), fields(category = %body.category))]
pub async fn http_start_round(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<StartRoundIn>,
) -> Result<impl IntoResponse, ApiError> {
  let caller = state.identify(&headers).await?;
  let round = logic::start_round(&state, &caller, body.category).await?;
  info!(target: "quiz", round_id = %round.id, "HTTP round started");
  Ok((StatusCode::CREATED, Json(round)))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_round(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(round_id): Path<String>,
) -> Result<Json<RoundOut>, ApiError> {
  let caller = state.identify(&headers).await?;
  Ok(Json(logic::round_view(&state, &caller, &round_id).await?))
}

#[instrument(level = "info", skip(state, headers, body))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(round_id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let caller = state.identify(&headers).await?;
  Ok(Json(logic::submit_answer(&state, &caller, &round_id, &body.option).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_delete_round(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(round_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let caller = state.identify(&headers).await?;
  logic::end_round(&state, &caller, &round_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_history(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  let caller = state.identify(&headers).await?;
  Ok(Json(logic::history(&state, &caller).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_summary(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  let caller = state.identify(&headers).await?;
  Ok(Json(logic::summary(&state, &caller).await))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_report(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<ReportOut>, ApiError> {
  let caller = state.identify(&headers).await?;
  let text = logic::parent_report(&state, &caller).await;
  info!(target: "report", text_len = text.len(), "HTTP report served");
  Ok(Json(ReportOut { text }))
}
