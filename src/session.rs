//! Round state machine.
//!
//! `AwaitingAnswer --submit--> ShowingFeedback --advance--> AwaitingAnswer | Complete`
//!
//! Selections while feedback is showing are ignored, so a question can only be scored once.
//! The feedback delay itself is scheduled by the caller; this type only moves between states.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::domain::{Category, DifficultyLevel, Question, RoundResult};
use crate::generators::generate_round;

pub const POINTS_PER_CORRECT: u32 = 20;
/// Results are normalized against this total; a full round is worth exactly this much.
pub const NORMALIZATION_TOTAL: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
  Correct,
  Wrong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "feedback", rename_all = "snake_case")]
pub enum Phase {
  AwaitingAnswer,
  ShowingFeedback(Feedback),
  Complete,
}

#[derive(Clone, Debug)]
pub struct QuizRound {
  category: Category,
  difficulty: DifficultyLevel,
  questions: Vec<Question>,
  index: usize,
  score: u32,
  phase: Phase,
}

impl QuizRound {
  pub fn new(category: Category, difficulty: DifficultyLevel, questions: Vec<Question>) -> Self {
    let phase = if questions.is_empty() { Phase::Complete } else { Phase::AwaitingAnswer };
    Self { category, difficulty, questions, index: 0, score: 0, phase }
  }

  /// Generate the question list atomically and start at question 0.
  pub fn generate<R: Rng + ?Sized>(category: Category, difficulty: DifficultyLevel, rng: &mut R) -> Self {
    Self::new(category, difficulty, generate_round(category, difficulty, rng))
  }

  pub fn category(&self) -> Category { self.category }
  pub fn difficulty(&self) -> DifficultyLevel { self.difficulty }
  pub fn index(&self) -> usize { self.index }
  pub fn len(&self) -> usize { self.questions.len() }
  pub fn score(&self) -> u32 { self.score }
  pub fn phase(&self) -> Phase { self.phase }
  pub fn is_complete(&self) -> bool { self.phase == Phase::Complete }

  pub fn current(&self) -> Option<&Question> {
    if self.is_complete() { None } else { self.questions.get(self.index) }
  }

  /// Evaluate a selection. Returns None when the input is ignored (feedback showing or
  /// round already complete).
  pub fn submit(&mut self, selected: &str) -> Option<Feedback> {
    if self.phase != Phase::AwaitingAnswer {
      return None;
    }
    let question = self.questions.get(self.index)?;
    let feedback = if question.is_correct(selected) {
      self.score += POINTS_PER_CORRECT;
      Feedback::Correct
    } else {
      Feedback::Wrong
    };
    self.phase = Phase::ShowingFeedback(feedback);
    Some(feedback)
  }

  /// Leave the feedback state: next question, or Complete after the last one.
  /// No-op in any other state.
  pub fn advance(&mut self) -> Phase {
    if let Phase::ShowingFeedback(_) = self.phase {
      if self.index + 1 < self.questions.len() {
        self.index += 1;
        self.phase = Phase::AwaitingAnswer;
      } else {
        self.phase = Phase::Complete;
      }
    }
    self.phase
  }

  /// Package the completed round. `difficulty` is the learner's tier at finish time,
  /// which may differ from the tier the round was generated with.
  pub fn result(&self, difficulty: DifficultyLevel, date: DateTime<Utc>) -> Option<RoundResult> {
    if !self.is_complete() {
      return None;
    }
    Some(RoundResult {
      date,
      score: normalized_score(self.score, NORMALIZATION_TOTAL),
      total_questions: NORMALIZATION_TOTAL,
      category: self.category,
      difficulty,
    })
  }
}

/// `raw / total * 100`, rounded down.
pub fn normalized_score(raw: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  raw.saturating_mul(100) / total
}
