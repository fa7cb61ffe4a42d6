//! Domain models: difficulty tiers, quiz categories, the three question families,
//! round results and the learner profile.
//!
//! Wire names (`PEMULA`, `BERHITUNG`, ...) match the hosted tables so rows written by
//! earlier clients stay readable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::banks::AVATAR_OPTIONS;

/// Proficiency band, ordered by target age (3–4, 5–6, 7+).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
  #[serde(rename = "PEMULA")]
  Beginner,
  #[serde(rename = "MENENGAH")]
  Intermediate,
  #[serde(rename = "MAHIR")]
  Advanced,
}

impl DifficultyLevel {
  /// Initial tier suggested by profile setup; the learner may change it later.
  pub fn for_age(age: u8) -> Self {
    match age {
      0..=4 => Self::Beginner,
      5..=6 => Self::Intermediate,
      _ => Self::Advanced,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Beginner => "PEMULA",
      Self::Intermediate => "MENENGAH",
      Self::Advanced => "MAHIR",
    }
  }
}

impl fmt::Display for DifficultyLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
  #[serde(rename = "BERHITUNG")]
  Arithmetic,
  #[serde(rename = "MEMBACA")]
  Reading,
  #[serde(rename = "LOGIKA")]
  Logic,
}

impl Category {
  pub const ALL: [Category; 3] = [Self::Arithmetic, Self::Reading, Self::Logic];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Arithmetic => "BERHITUNG",
      Self::Reading => "MEMBACA",
      Self::Logic => "LOGIKA",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MathKind {
  Count,
  Add,
  Sub,
  Compare,
  Mult,
  Div,
  Sequence,
}

/// Relation symbol used by COMPARE items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
  #[serde(rename = ">")]
  Greater,
  #[serde(rename = "<")]
  Less,
  #[serde(rename = "=")]
  Equal,
}

impl Comparison {
  pub fn of(a: i32, b: i32) -> Self {
    use std::cmp::Ordering::*;
    match a.cmp(&b) {
      Greater => Self::Greater,
      Less => Self::Less,
      Equal => Self::Equal,
    }
  }

  pub fn symbol(&self) -> &'static str {
    match self {
      Self::Greater => ">",
      Self::Less => "<",
      Self::Equal => "=",
    }
  }
}

/// Arithmetic answers are numbers except for COMPARE, which answers with a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MathAnswer {
  Number(i32),
  Symbol(Comparison),
}

impl fmt::Display for MathAnswer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Symbol(c) => f.write_str(c.symbol()),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
  Star,
  Apple,
}

/// Picture decoration for COUNT items: `count` copies of one pictogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualCount {
  pub kind: VisualKind,
  pub count: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MathQuestion {
  pub id: String,
  pub kind: MathKind,
  pub prompt: String,
  pub answer: MathAnswer,
  pub options: Vec<MathAnswer>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visual: Option<VisualCount>,
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingKind {
  MatchImage,
  MatchWord,
  FirstLetter,
  MissingLetter,
  Opposite,
  Scramble,
  Sentence,
}

/// A reading item. `word` is the display word (or sentence) and is NOT the answer for
/// MISSING_LETTER, OPPOSITE and SENTENCE; `answer` always holds the expected option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingQuestion {
  pub id: String,
  pub kind: ReadingKind,
  pub prompt: String,
  pub word: String,
  pub image: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scrambled_word: Option<String>,
  pub options: Vec<String>,
  pub answer: String,
}

impl ReadingQuestion {
  /// The value a selection is compared against. Which field holds it depends on the kind:
  /// word for picture matching and unscrambling, the pictogram for word matching, the first
  /// letter of the word, and the stored answer for the rest.
  pub fn expected(&self) -> String {
    match self.kind {
      ReadingKind::MatchImage | ReadingKind::Scramble => self.word.clone(),
      ReadingKind::MatchWord => self.image.clone(),
      ReadingKind::FirstLetter => self.word.chars().take(1).collect(),
      ReadingKind::MissingLetter | ReadingKind::Opposite | ReadingKind::Sentence => {
        self.answer.clone()
      }
    }
  }
}

// ---------------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicKind {
  OddOneOut,
  Pattern,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogicQuestion {
  pub id: String,
  pub kind: LogicKind,
  pub prompt: String,
  /// Display sequence; PATTERN items end with the `?` placeholder.
  pub sequence: Vec<String>,
  pub answer: String,
  pub options: Vec<String>,
}

// ---------------------------------------------------------------------------
// Question (tagged union)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
  Math(MathQuestion),
  Reading(ReadingQuestion),
  Logic(LogicQuestion),
}

impl Question {
  pub fn id(&self) -> &str {
    match self {
      Self::Math(q) => &q.id,
      Self::Reading(q) => &q.id,
      Self::Logic(q) => &q.id,
    }
  }

  pub fn category(&self) -> Category {
    match self {
      Self::Math(_) => Category::Arithmetic,
      Self::Reading(_) => Category::Reading,
      Self::Logic(_) => Category::Logic,
    }
  }

  /// Options as the learner sees them (and sends them back).
  pub fn option_labels(&self) -> Vec<String> {
    match self {
      Self::Math(q) => q.options.iter().map(|o| o.to_string()).collect(),
      Self::Reading(q) => q.options.clone(),
      Self::Logic(q) => q.options.clone(),
    }
  }

  pub fn correct_answer(&self) -> String {
    match self {
      Self::Math(q) => q.answer.to_string(),
      Self::Reading(q) => q.expected(),
      Self::Logic(q) => q.answer.clone(),
    }
  }

  pub fn is_correct(&self, selected: &str) -> bool {
    selected == self.correct_answer()
  }
}

// ---------------------------------------------------------------------------
// Results & profile
// ---------------------------------------------------------------------------

/// Persisted summary of one completed round. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
  pub date: DateTime<Utc>,
  /// Normalized to 0..=100 in steps of 20.
  pub score: u32,
  /// Normalization constant (always 100), not an item count.
  pub total_questions: u32,
  pub category: Category,
  pub difficulty: DifficultyLevel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub name: String,
  pub age: u8,
  pub level: DifficultyLevel,
  pub avatar: String,
}

pub const MIN_AGE: u8 = 3;
pub const MAX_AGE: u8 = 10;

impl Profile {
  /// Profile setup flow. Returns None when the trimmed name is empty.
  pub fn setup(name: &str, age: u8, avatar: Option<&str>) -> Option<Self> {
    let name = name.trim();
    if name.is_empty() {
      return None;
    }
    let age = age.clamp(MIN_AGE, MAX_AGE);
    let avatar = avatar
      .filter(|a| !a.trim().is_empty())
      .unwrap_or(AVATAR_OPTIONS[0])
      .to_string();
    Some(Self { name: name.to_string(), age, level: DifficultyLevel::for_age(age), avatar })
  }

  pub fn with_level(&self, level: DifficultyLevel) -> Self {
    Self { level, ..self.clone() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn age_bands_map_to_tiers() {
    assert_eq!(DifficultyLevel::for_age(3), DifficultyLevel::Beginner);
    assert_eq!(DifficultyLevel::for_age(4), DifficultyLevel::Beginner);
    assert_eq!(DifficultyLevel::for_age(5), DifficultyLevel::Intermediate);
    assert_eq!(DifficultyLevel::for_age(6), DifficultyLevel::Intermediate);
    assert_eq!(DifficultyLevel::for_age(7), DifficultyLevel::Advanced);
    assert!(DifficultyLevel::Beginner < DifficultyLevel::Advanced);
  }

  #[test]
  fn setup_trims_name_and_clamps_age() {
    let p = Profile::setup("  Budi ", 12, None).expect("profile");
    assert_eq!(p.name, "Budi");
    assert_eq!(p.age, MAX_AGE);
    assert_eq!(p.level, DifficultyLevel::Advanced);
    assert_eq!(p.avatar, AVATAR_OPTIONS[0]);
    assert!(Profile::setup("   ", 5, None).is_none());
  }

  #[test]
  fn wire_names_match_hosted_tables() {
    let r = RoundResult {
      date: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z").unwrap().with_timezone(&Utc),
      score: 80,
      total_questions: 100,
      category: Category::Arithmetic,
      difficulty: DifficultyLevel::Intermediate,
    };
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["category"], "BERHITUNG");
    assert_eq!(v["difficulty"], "MENENGAH");
    assert_eq!(v["totalQuestions"], 100);
  }

  #[test]
  fn math_answers_render_as_option_labels() {
    assert_eq!(MathAnswer::Number(7).to_string(), "7");
    assert_eq!(MathAnswer::Symbol(Comparison::of(3, 9)).to_string(), "<");
    assert_eq!(Comparison::of(4, 4), Comparison::Equal);
  }

  #[test]
  fn reading_expected_follows_kind() {
    let mut q = ReadingQuestion {
      id: "r".into(),
      kind: ReadingKind::FirstLetter,
      prompt: String::new(),
      word: "KUCING".into(),
      image: "🐱".into(),
      scrambled_word: None,
      options: vec!["K".into(), "B".into(), "Z".into()],
      answer: "K".into(),
    };
    assert_eq!(q.expected(), "K");
    q.kind = ReadingKind::MatchWord;
    assert_eq!(q.expected(), "🐱");
    q.kind = ReadingKind::Opposite;
    q.answer = "KECIL".into();
    assert_eq!(q.expected(), "KECIL");
  }
}
