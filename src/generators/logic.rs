//! Glyph puzzles: odd-one-out for beginners, "what comes next" patterns above.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{dedup, round_tag};
use crate::banks::{FALLBACK_GLYPH, GLYPHS, PLACEHOLDER};
use crate::domain::{DifficultyLevel, LogicKind, LogicQuestion};

pub fn generate<R: Rng + ?Sized>(
  difficulty: DifficultyLevel,
  count: usize,
  rng: &mut R,
) -> Vec<LogicQuestion> {
  let tag = round_tag(rng);
  (0..count)
    .map(|i| {
      let id = format!("l-{tag}-{i}");
      let mut q = match difficulty {
        DifficultyLevel::Beginner => odd_one_out(id, rng),
        tier => pattern(id, tier, rng),
      };
      q.options = dedup(q.options);
      q
    })
    .collect()
}

/// Random bank glyph not contained in `taken`.
fn glyph_except<R: Rng + ?Sized>(taken: &[&str], rng: &mut R) -> &'static str {
  loop {
    let g = GLYPHS[rng.gen_range(0..GLYPHS.len())];
    if !taken.contains(&g) {
      return g;
    }
  }
}

fn odd_one_out<R: Rng + ?Sized>(id: String, rng: &mut R) -> LogicQuestion {
  let common = glyph_except(&[], rng);
  let odd = glyph_except(&[common], rng);
  let pos = rng.gen_range(0..3);
  let mut sequence = vec![common.to_string(); 3];
  sequence[pos] = odd.to_string();

  let mut options = vec![common.to_string(), odd.to_string()];
  options.shuffle(rng);
  LogicQuestion {
    id,
    kind: LogicKind::OddOneOut,
    prompt: "Mana yang berbeda?".into(),
    sequence,
    answer: odd.into(),
    options,
  }
}

fn pattern<R: Rng + ?Sized>(id: String, tier: DifficultyLevel, rng: &mut R) -> LogicQuestion {
  let a = glyph_except(&[], rng);
  let b = glyph_except(&[a], rng);

  let (shape, answer): (Vec<&str>, &str) = if tier == DifficultyLevel::Intermediate {
    (vec![a, b, a], b)
  } else if rng.gen_bool(0.5) {
    (vec![a, a, b, a, a], b)
  } else {
    let c = glyph_except(&[a, b], rng);
    (vec![a, b, c, a, b], c)
  };

  let wrong = GLYPHS
    .iter()
    .copied()
    .find(|g| *g != answer && *g != a && *g != b)
    .unwrap_or(FALLBACK_GLYPH);
  let other = if a == answer { b } else { a };

  let mut sequence: Vec<String> = shape.into_iter().map(String::from).collect();
  sequence.push(PLACEHOLDER.to_string());
  let mut options = vec![answer.to_string(), wrong.to_string(), other.to_string()];
  options.shuffle(rng);

  LogicQuestion {
    id,
    kind: LogicKind::Pattern,
    prompt: "Apa urutan selanjutnya?".into(),
    sequence,
    answer: answer.into(),
    options,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn trials(tier: DifficultyLevel, seed: u64) -> Vec<LogicQuestion> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..1000).flat_map(|_| generate(tier, 5, &mut rng)).collect()
  }

  #[test]
  fn odd_one_out_has_one_differing_glyph() {
    for q in trials(DifficultyLevel::Beginner, 21) {
      assert_eq!(q.kind, LogicKind::OddOneOut);
      assert_eq!(q.sequence.len(), 3);
      assert_eq!(q.sequence.iter().filter(|g| **g == q.answer).count(), 1);
      assert_eq!(q.options.len(), 2);
      assert!(q.options.contains(&q.answer));
      let common = q.sequence.iter().find(|g| **g != q.answer).expect("common glyph");
      assert!(q.options.contains(common));
    }
  }

  #[test]
  fn intermediate_pattern_is_aba() {
    for q in trials(DifficultyLevel::Intermediate, 22) {
      assert_eq!(q.sequence.len(), 4);
      assert_eq!(q.sequence[0], q.sequence[2]);
      assert_eq!(q.sequence[1], q.answer);
      assert_eq!(q.sequence[3], PLACEHOLDER);
    }
  }

  #[test]
  fn advanced_patterns_resolve_the_placeholder() {
    let (mut aab, mut abc) = (false, false);
    for q in trials(DifficultyLevel::Advanced, 23) {
      let s = &q.sequence;
      assert_eq!(s.len(), 6);
      assert_eq!(s.iter().filter(|g| *g == PLACEHOLDER).count(), 1);
      assert_eq!(s[5], PLACEHOLDER);
      if s[0] == s[1] {
        aab = true;
        assert_eq!(s[2], q.answer);
        assert_eq!((&s[3], &s[4]), (&s[0], &s[1]));
      } else {
        abc = true;
        assert_eq!(s[2], q.answer);
        assert_eq!((&s[3], &s[4]), (&s[0], &s[1]));
        assert_ne!(s[0], s[2]);
      }
      assert_eq!(q.options.len(), 3);
      assert_eq!(q.options.iter().filter(|o| **o == q.answer).count(), 1);
      assert!(!q.options.iter().any(|o| o == FALLBACK_GLYPH));
    }
    assert!(aab && abc);
  }

  #[test]
  fn odd_one_out_banana_scenario() {
    let q = LogicQuestion {
      id: "l-test-0".into(),
      kind: LogicKind::OddOneOut,
      prompt: "Mana yang berbeda?".into(),
      sequence: vec!["🍎".into(), "🍎".into(), "🍌".into()],
      answer: "🍌".into(),
      options: vec!["🍌".into(), "🍎".into()],
    };
    let question = crate::domain::Question::Logic(q);
    assert!(question.is_correct("🍌"));
    assert!(!question.is_correct("🍎"));
  }
}
