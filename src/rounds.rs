//! Registry of active rounds.
//!
//! Each learner has at most one active round. A round stays registered after it completes
//! (so its result can still be read) until the learner ends it or starts another one.
//!
//! Every accepted answer bumps the round's epoch. The feedback-delay task carries the epoch
//! it was scheduled for and `advance` refuses to act on a stale one, so an aborted or late
//! timer can never move a round that was restarted or already advanced.

use std::collections::HashMap;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::RoundResult;
use crate::identity::Caller;
use crate::protocol::{round_out, RoundOut};
use crate::session::{Feedback, Phase, QuizRound};

struct ActiveRound {
  caller: Caller,
  round: QuizRound,
  epoch: u64,
  result: Option<RoundResult>,
  pending: Option<JoinHandle<()>>,
  updates: watch::Sender<RoundOut>,
}

impl ActiveRound {
  fn view(&self, id: &str) -> RoundOut {
    round_out(id, &self.round, self.result.as_ref())
  }

  fn publish(&self, id: &str) -> RoundOut {
    let view = self.view(id);
    self.updates.send_replace(view.clone());
    view
  }

  fn cancel_pending(&mut self) {
    if let Some(handle) = self.pending.take() {
      handle.abort();
    }
  }
}

/// Outcome of a submission on a known round.
#[derive(Debug)]
pub struct Submission {
  /// None when the selection was ignored (feedback showing or round complete).
  pub feedback: Option<Feedback>,
  /// Correct answer label, revealed only once feedback is showing.
  pub correct_answer: Option<String>,
  pub epoch: u64,
  pub round: RoundOut,
}

#[derive(Debug)]
pub enum Advanced {
  /// Next question is up.
  Next(RoundOut),
  /// Last question answered; the caller packages and records the result.
  Complete { caller: Caller, round: QuizRound },
}

#[derive(Default)]
struct Inner {
  rounds: HashMap<String, ActiveRound>,
  by_user: HashMap<String, String>,
}

#[derive(Default)]
pub struct RoundRegistry {
  inner: RwLock<Inner>,
}

impl RoundRegistry {
  pub fn new() -> Self { Self::default() }

  /// Register a fresh round for the caller, ending any round the learner already had.
  #[instrument(level = "debug", skip(self, caller, round), fields(user_id = %caller.user_id, category = %round.category()))]
  pub async fn start(&self, caller: &Caller, round: QuizRound) -> RoundOut {
    let id = Uuid::new_v4().to_string();
    let user_id = caller.user_id.as_str();
    let mut inner = self.inner.write().await;
    if let Some(prev) = inner.by_user.remove(user_id) {
      if let Some(mut old) = inner.rounds.remove(&prev) {
        old.cancel_pending();
        debug!(target: "quiz", round_id = %prev, "Previous round replaced");
      }
    }
    let (updates, _) = watch::channel(round_out(&id, &round, None));
    let active = ActiveRound {
      caller: caller.clone(),
      round,
      epoch: 0,
      result: None,
      pending: None,
      updates,
    };
    let view = active.view(&id);
    inner.by_user.insert(user_id.to_string(), id.clone());
    inner.rounds.insert(id, active);
    view
  }

  /// Current view of a round owned by `user_id`.
  pub async fn view(&self, round_id: &str, user_id: &str) -> Option<RoundOut> {
    let inner = self.inner.read().await;
    inner.rounds.get(round_id).filter(|a| a.caller.user_id == user_id).map(|a| a.view(round_id))
  }

  /// Watch every state change of a round (advance, completion).
  pub async fn subscribe(&self, round_id: &str) -> Option<watch::Receiver<RoundOut>> {
    self.inner.read().await.rounds.get(round_id).map(|a| a.updates.subscribe())
  }

  /// Evaluate a selection. None when the round is unknown or owned by someone else.
  #[instrument(level = "debug", skip(self, selected), fields(%round_id, %user_id))]
  pub async fn submit(&self, round_id: &str, user_id: &str, selected: &str) -> Option<Submission> {
    let mut inner = self.inner.write().await;
    let active = inner.rounds.get_mut(round_id).filter(|a| a.caller.user_id == user_id)?;
    let correct_answer = active.round.current().map(|q| q.correct_answer());
    let feedback = active.round.submit(selected);
    if feedback.is_some() {
      active.epoch += 1;
    }
    Some(Submission {
      feedback,
      correct_answer: feedback.and(correct_answer),
      epoch: active.epoch,
      round: active.publish(round_id),
    })
  }

  /// Attach the feedback timer for `epoch`. A handle for a stale epoch (or a vanished
  /// round) is aborted instead of stored.
  pub async fn set_pending(&self, round_id: &str, epoch: u64, handle: JoinHandle<()>) {
    let mut inner = self.inner.write().await;
    match inner.rounds.get_mut(round_id) {
      Some(active) if active.epoch == epoch && matches!(active.round.phase(), Phase::ShowingFeedback(_)) => {
        active.cancel_pending();
        active.pending = Some(handle);
      }
      _ => handle.abort(),
    }
  }

  /// Leave the feedback state if `epoch` is still current.
  #[instrument(level = "debug", skip(self), fields(%round_id, epoch))]
  pub async fn advance(&self, round_id: &str, epoch: u64) -> Option<Advanced> {
    let mut inner = self.inner.write().await;
    let active = inner.rounds.get_mut(round_id)?;
    if active.epoch != epoch || !matches!(active.round.phase(), Phase::ShowingFeedback(_)) {
      debug!(target: "quiz", %round_id, epoch, current = active.epoch, "Stale advance ignored");
      return None;
    }
    // Called from the timer task itself; dropping the handle just detaches it.
    active.pending = None;
    match active.round.advance() {
      Phase::Complete => {
        active.publish(round_id);
        Some(Advanced::Complete { caller: active.caller.clone(), round: active.round.clone() })
      }
      _ => Some(Advanced::Next(active.publish(round_id))),
    }
  }

  /// Attach the packaged result to a completed round and notify watchers.
  pub async fn record_result(&self, round_id: &str, result: RoundResult) -> Option<RoundOut> {
    let mut inner = self.inner.write().await;
    let active = inner.rounds.get_mut(round_id)?;
    active.result = Some(result);
    Some(active.publish(round_id))
  }

  /// Tear a round down and cancel its pending advance. Returns false if there was nothing
  /// to end.
  #[instrument(level = "debug", skip(self), fields(%round_id, %user_id))]
  pub async fn end(&self, round_id: &str, user_id: &str) -> bool {
    let mut inner = self.inner.write().await;
    let owned = inner.rounds.get(round_id).is_some_and(|a| a.caller.user_id == user_id);
    if !owned {
      return false;
    }
    if let Some(mut active) = inner.rounds.remove(round_id) {
      active.cancel_pending();
    }
    if inner.by_user.get(user_id).is_some_and(|id| id == round_id) {
      inner.by_user.remove(user_id);
    }
    true
  }

  pub async fn len(&self) -> usize {
    self.inner.read().await.rounds.len()
  }
}
