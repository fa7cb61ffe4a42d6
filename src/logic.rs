//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting rounds and scheduling the feedback-delay advance
//!   - Submitting answers, reading and ending rounds
//!   - Profile setup and difficulty changes
//!   - History, summary and the parent report

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Category, DifficultyLevel, Profile, RoundResult};
use crate::error::ApiError;
use crate::identity::Caller;
use crate::protocol::{AnswerOut, ProfileIn, ProfileOut, RoundOut};
use crate::report::{self, ReportSummary};
use crate::rounds::Advanced;
use crate::session::QuizRound;
use crate::state::AppState;

/// Name used in the report when the learner has no profile yet.
const DEFAULT_CHILD_NAME: &str = "Anak";

fn fresh_round(category: Category, difficulty: DifficultyLevel) -> QuizRound {
  let mut rng = rand::thread_rng();
  QuizRound::generate(category, difficulty, &mut rng)
}

/// Start a round at the learner's current difficulty. Any previous round is ended.
#[instrument(level = "info", skip(state, caller), fields(user_id = %caller.user_id, %category))]
pub async fn start_round(state: &AppState, caller: &Caller, category: Category) -> Result<RoundOut, ApiError> {
  let profile = state
    .load_profile(caller)
    .await
    .ok_or_else(|| ApiError::BadRequest("profile setup required".into()))?;
  let round = fresh_round(category, profile.level);
  let view = state.rounds.start(caller, round).await;
  info!(target: "quiz", round_id = %view.id, %category, difficulty = %profile.level, "Round started");
  Ok(view)
}

/// Evaluate a selection and, when accepted, schedule the advance after the feedback delay.
#[instrument(level = "info", skip(state, caller, option), fields(user_id = %caller.user_id, %round_id))]
pub async fn submit_answer(
  state: &Arc<AppState>,
  caller: &Caller,
  round_id: &str,
  option: &str,
) -> Result<AnswerOut, ApiError> {
  let sub = state
    .rounds
    .submit(round_id, &caller.user_id, option)
    .await
    .ok_or_else(|| ApiError::NotFound("round not found".into()))?;

  match sub.feedback {
    Some(feedback) => {
      info!(target: "quiz", %round_id, ?feedback, index = sub.round.index, score = sub.round.score, "Answer evaluated");
      schedule_advance(state, round_id, sub.epoch).await;
    }
    None => debug!(target: "quiz", %round_id, "Answer ignored while feedback is showing"),
  }

  Ok(AnswerOut {
    accepted: sub.feedback.is_some(),
    feedback: sub.feedback,
    correct_answer: sub.correct_answer,
    round: sub.round,
  })
}

/// Spawn the feedback timer for `epoch` and hand its handle to the registry so ending the
/// round can cancel it.
async fn schedule_advance(state: &Arc<AppState>, round_id: &str, epoch: u64) {
  let delay = state.quiz.feedback_delay();
  let task_state = Arc::clone(state);
  let task_round = round_id.to_string();
  let handle = tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    advance_round(&task_state, &task_round, epoch).await;
  });
  state.rounds.set_pending(round_id, epoch, handle).await;
}

/// Leave the feedback state. On completion the result is tagged with the learner's
/// difficulty at this moment, attached to the round, and saved in the background.
#[instrument(level = "debug", skip(state), fields(%round_id, epoch))]
pub async fn advance_round(state: &AppState, round_id: &str, epoch: u64) {
  match state.rounds.advance(round_id, epoch).await {
    None => {}
    Some(Advanced::Next(view)) => {
      debug!(target: "quiz", %round_id, index = view.index, "Next question");
    }
    Some(Advanced::Complete { caller, round }) => {
      let difficulty = state
        .load_profile(&caller)
        .await
        .map(|p| p.level)
        .unwrap_or_else(|| round.difficulty());
      let Some(result) = round.result(difficulty, Utc::now()) else {
        warn!(target: "quiz", %round_id, "Completed round produced no result");
        return;
      };
      info!(target: "quiz", %round_id, user_id = %caller.user_id, score = result.score, category = %result.category, %difficulty, "Round complete");
      state.rounds.record_result(round_id, result.clone()).await;
      state.save_result_detached(caller, result);
    }
  }
}

pub async fn round_view(state: &AppState, caller: &Caller, round_id: &str) -> Result<RoundOut, ApiError> {
  state
    .rounds
    .view(round_id, &caller.user_id)
    .await
    .ok_or_else(|| ApiError::NotFound("round not found".into()))
}

/// Tear a round down; a pending advance is cancelled and nothing is saved.
#[instrument(level = "info", skip(state, caller), fields(user_id = %caller.user_id, %round_id))]
pub async fn end_round(state: &AppState, caller: &Caller, round_id: &str) -> Result<(), ApiError> {
  if state.rounds.end(round_id, &caller.user_id).await {
    info!(target: "quiz", %round_id, "Round ended");
    Ok(())
  } else {
    Err(ApiError::NotFound("round not found".into()))
  }
}

pub async fn get_profile(state: &AppState, caller: &Caller) -> ProfileOut {
  let profile = state.load_profile(caller).await;
  ProfileOut { needs_setup: profile.is_none(), profile }
}

/// Create or replace the learner's profile; difficulty is derived from age.
#[instrument(level = "info", skip(state, caller, body), fields(user_id = %caller.user_id, age = body.age))]
pub async fn setup_profile(state: &AppState, caller: &Caller, body: &ProfileIn) -> Result<Profile, ApiError> {
  let profile = Profile::setup(&body.name, body.age, body.avatar.as_deref())
    .ok_or_else(|| ApiError::BadRequest("name must not be empty".into()))?;
  state.save_profile(caller, &profile).await;
  info!(target: "quiz", user_id = %caller.user_id, level = %profile.level, "Profile saved");
  Ok(profile)
}

/// Change difficulty. Takes effect for the next round, and for the result of a round
/// that is finished after the change.
#[instrument(level = "info", skip(state, caller), fields(user_id = %caller.user_id, %level))]
pub async fn set_level(state: &AppState, caller: &Caller, level: DifficultyLevel) -> Result<Profile, ApiError> {
  let profile = state
    .load_profile(caller)
    .await
    .ok_or_else(|| ApiError::NotFound("profile not found".into()))?
    .with_level(level);
  state.save_profile(caller, &profile).await;
  Ok(profile)
}

pub async fn history(state: &AppState, caller: &Caller) -> Vec<RoundResult> {
  state.load_history(caller).await
}

pub async fn summary(state: &AppState, caller: &Caller) -> ReportSummary {
  report::summarize(&state.load_history(caller).await)
}

/// Parent-facing report text. Never fails; see `report::parent_report`.
#[instrument(level = "info", skip(state, caller), fields(user_id = %caller.user_id))]
pub async fn parent_report(state: &AppState, caller: &Caller) -> String {
  let history = state.load_history(caller).await;
  let name = state
    .load_profile(caller)
    .await
    .map(|p| p.name)
    .unwrap_or_else(|| DEFAULT_CHILD_NAME.to_string());
  report::parent_report(
    state.openai.as_ref(),
    &state.prompts,
    &history,
    &name,
    state.quiz.report_window,
  )
  .await
}
