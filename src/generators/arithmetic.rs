//! Arithmetic items: counting and number sequences for beginners, the four basic
//! operations and comparison above that.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{dedup, round_tag};
use crate::domain::{
  Comparison, DifficultyLevel, MathAnswer, MathKind, MathQuestion, VisualCount, VisualKind,
};

const MIN_OPTIONS: usize = 3;
/// Padding distractors are drawn from 1..=PAD_MAX.
const PAD_MAX: i32 = 20;

pub fn generate<R: Rng + ?Sized>(
  difficulty: DifficultyLevel,
  count: usize,
  rng: &mut R,
) -> Vec<MathQuestion> {
  let tag = round_tag(rng);
  (0..count)
    .map(|i| {
      let id = format!("m-{tag}-{i}");
      let q = match difficulty {
        DifficultyLevel::Beginner => beginner(id, rng),
        DifficultyLevel::Intermediate => intermediate(id, rng),
        DifficultyLevel::Advanced => advanced(id, rng),
      };
      finish(q, rng)
    })
    .collect()
}

fn beginner<R: Rng + ?Sized>(id: String, rng: &mut R) -> MathQuestion {
  if rng.gen_bool(0.6) {
    let n = rng.gen_range(1..=9);
    let kind = if rng.gen_bool(0.5) { VisualKind::Star } else { VisualKind::Apple };
    MathQuestion {
      id,
      kind: MathKind::Count,
      prompt: "Ada berapa jumlah gambar ini?".into(),
      answer: MathAnswer::Number(n),
      options: numbers(vec![n, n + 1, (n - 1).max(1)], rng),
      visual: Some(VisualCount { kind, count: n as u8 }),
    }
  } else {
    let start = rng.gen_range(1..=5);
    let terms = [start, start + 1, start + 2];
    let (shown, ans) = blank(&terms, rng.gen_range(0..terms.len()));
    MathQuestion {
      id,
      kind: MathKind::Sequence,
      prompt: format!("Lengkapi: {}", shown.join(" - ")),
      answer: MathAnswer::Number(ans),
      options: numbers(vec![ans, ans + 2, (ans - 1).max(1)], rng),
      visual: None,
    }
  }
}

fn intermediate<R: Rng + ?Sized>(id: String, rng: &mut R) -> MathQuestion {
  let roll: f64 = rng.gen();
  if roll < 0.3 {
    let a = rng.gen_range(0..=9);
    let b = rng.gen_range(0..=9);
    let ans = a + b;
    let mut distractors = vec![ans + 1, ans + 2, (ans - 1).max(0)];
    distractors.retain(|d| *d != ans);
    distractors.shuffle(rng);
    distractors.truncate(2);
    distractors.push(ans);
    MathQuestion {
      id,
      kind: MathKind::Add,
      prompt: format!("{a} + {b} = ?"),
      answer: MathAnswer::Number(ans),
      options: numbers(distractors, rng),
      visual: None,
    }
  } else if roll < 0.6 {
    let a = rng.gen_range(1..=10);
    let b = rng.gen_range(0..a);
    let ans = a - b;
    MathQuestion {
      id,
      kind: MathKind::Sub,
      prompt: format!("{a} - {b} = ?"),
      answer: MathAnswer::Number(ans),
      options: numbers(vec![ans, ans + 1, (ans - 1).max(0)], rng),
      visual: None,
    }
  } else if roll < 0.8 {
    let a = rng.gen_range(0..20);
    let b = rng.gen_range(0..20);
    MathQuestion {
      id,
      kind: MathKind::Compare,
      prompt: format!("{a} ... {b}"),
      answer: MathAnswer::Symbol(Comparison::of(a, b)),
      options: [Comparison::Greater, Comparison::Less, Comparison::Equal]
        .into_iter()
        .map(MathAnswer::Symbol)
        .collect(),
      visual: None,
    }
  } else {
    let step = rng.gen_range(2..=3);
    let terms = [step, step * 2, step * 3, step * 4];
    let (shown, ans) = blank(&terms, rng.gen_range(0..terms.len()));
    MathQuestion {
      id,
      kind: MathKind::Sequence,
      prompt: format!("Pola: {}", shown.join(", ")),
      answer: MathAnswer::Number(ans),
      options: numbers(vec![ans, ans + step, (ans - step).abs()], rng),
      visual: None,
    }
  }
}

fn advanced<R: Rng + ?Sized>(id: String, rng: &mut R) -> MathQuestion {
  let roll: f64 = rng.gen();
  if roll < 0.4 {
    let a = rng.gen_range(2..=10);
    let b = rng.gen_range(1..=5);
    let ans = a * b;
    MathQuestion {
      id,
      kind: MathKind::Mult,
      prompt: format!("{a} x {b} = ?"),
      answer: MathAnswer::Number(ans),
      options: numbers(vec![ans, ans + a, ans - b], rng),
      visual: None,
    }
  } else if roll < 0.7 {
    let divisor = rng.gen_range(2..=6);
    let quotient = rng.gen_range(1..=5);
    let dividend = divisor * quotient;
    MathQuestion {
      id,
      kind: MathKind::Div,
      prompt: format!("{dividend} : {divisor} = ?"),
      answer: MathAnswer::Number(quotient),
      options: numbers(vec![quotient, quotient + 1, (quotient - 1).max(1)], rng),
      visual: None,
    }
  } else {
    let a = rng.gen_range(10..=39);
    let b = rng.gen_range(1..=10);
    let ans = a - b;
    MathQuestion {
      id,
      kind: MathKind::Sub,
      prompt: format!("{a} - {b} = ?"),
      answer: MathAnswer::Number(ans),
      options: numbers(vec![ans, ans + 2, ans - 2], rng),
      visual: None,
    }
  }
}

/// Blank one term; returns the display terms and the hidden value.
fn blank(terms: &[i32], idx: usize) -> (Vec<String>, i32) {
  let shown = terms
    .iter()
    .enumerate()
    .map(|(i, t)| if i == idx { "?".to_string() } else { t.to_string() })
    .collect();
  (shown, terms[idx])
}

fn numbers<R: Rng + ?Sized>(mut values: Vec<i32>, rng: &mut R) -> Vec<MathAnswer> {
  values.shuffle(rng);
  values.into_iter().map(MathAnswer::Number).collect()
}

/// Dedup options, then pad numeric items with random distractors up to MIN_OPTIONS.
fn finish<R: Rng + ?Sized>(mut q: MathQuestion, rng: &mut R) -> MathQuestion {
  q.options = dedup(std::mem::take(&mut q.options));
  if let MathAnswer::Number(_) = q.answer {
    while q.options.len() < MIN_OPTIONS {
      let r = MathAnswer::Number(rng.gen_range(1..=PAD_MAX));
      if r != q.answer && !q.options.contains(&r) {
        q.options.push(r);
      }
    }
  }
  q
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn trials(tier: DifficultyLevel, seed: u64) -> Vec<MathQuestion> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..1000).flat_map(|_| generate(tier, 5, &mut rng)).collect()
  }

  fn operands(prompt: &str, sep: &str) -> (i32, i32) {
    let lhs = prompt.split(" = ").next().unwrap_or(prompt);
    let mut parts = lhs.split(sep).map(|p| p.trim().parse::<i32>().expect("operand"));
    (parts.next().unwrap(), parts.next().unwrap())
  }

  #[test]
  fn options_contain_answer_once_and_numeric_items_have_three() {
    for tier in [DifficultyLevel::Beginner, DifficultyLevel::Intermediate, DifficultyLevel::Advanced] {
      for q in trials(tier, 1) {
        assert_eq!(q.options.iter().filter(|o| **o == q.answer).count(), 1, "{q:?}");
        assert_eq!(dedup(q.options.clone()).len(), q.options.len(), "{q:?}");
        match q.answer {
          MathAnswer::Number(_) => assert!(q.options.len() >= 3, "{q:?}"),
          MathAnswer::Symbol(_) => assert_eq!(q.options.len(), 3),
        }
      }
    }
  }

  #[test]
  fn division_is_always_exact() {
    let divs: Vec<_> = trials(DifficultyLevel::Advanced, 2)
      .into_iter()
      .filter(|q| q.kind == MathKind::Div)
      .collect();
    assert!(!divs.is_empty());
    for q in divs {
      let (dividend, divisor) = operands(&q.prompt, ":");
      assert_eq!(dividend % divisor, 0);
      assert_eq!(MathAnswer::Number(dividend / divisor), q.answer);
      assert!((2..=6).contains(&divisor));
    }
  }

  #[test]
  fn lower_tier_subtraction_never_goes_negative() {
    for tier in [DifficultyLevel::Beginner, DifficultyLevel::Intermediate] {
      for q in trials(tier, 3) {
        if let MathAnswer::Number(n) = q.answer {
          assert!(n >= 0, "{q:?}");
        }
        if q.kind == MathKind::Sub {
          let (a, b) = operands(&q.prompt, "-");
          assert!(b < a && (1..=10).contains(&a));
        }
      }
    }
  }

  #[test]
  fn beginner_only_counts_and_sequences() {
    for q in trials(DifficultyLevel::Beginner, 4) {
      match q.kind {
        MathKind::Count => {
          let visual = q.visual.expect("count items carry a visual");
          assert_eq!(MathAnswer::Number(visual.count as i32), q.answer);
          assert!((1..=9).contains(&visual.count));
        }
        MathKind::Sequence => {
          assert!(q.prompt.starts_with("Lengkapi: "));
          assert_eq!(q.prompt.matches('?').count(), 1);
        }
        other => panic!("unexpected beginner kind {other:?}"),
      }
    }
  }

  #[test]
  fn compare_symbol_matches_operands() {
    for q in trials(DifficultyLevel::Intermediate, 5) {
      if q.kind == MathKind::Compare {
        let (a, b) = operands(&q.prompt, "...");
        assert_eq!(q.answer, MathAnswer::Symbol(Comparison::of(a, b)));
      }
    }
  }

  #[test]
  fn count_item_with_four_pictures() {
    let mut rng = StdRng::seed_from_u64(0);
    let q = finish(
      MathQuestion {
        id: "m-test-0".into(),
        kind: MathKind::Count,
        prompt: "Ada berapa jumlah gambar ini?".into(),
        answer: MathAnswer::Number(4),
        options: numbers(vec![4, 5, 3], &mut rng),
        visual: Some(VisualCount { kind: VisualKind::Star, count: 4 }),
      },
      &mut rng,
    );
    assert!(q.options.contains(&MathAnswer::Number(4)));
  }

  #[test]
  fn one_pads_back_to_three_options() {
    let mut rng = StdRng::seed_from_u64(9);
    let q = finish(
      MathQuestion {
        id: "m-test-1".into(),
        kind: MathKind::Div,
        prompt: "2 : 2 = ?".into(),
        answer: MathAnswer::Number(1),
        options: numbers(vec![1, 2, 1], &mut rng),
        visual: None,
      },
      &mut rng,
    );
    assert_eq!(q.options.len(), 3);
    assert_eq!(q.options.iter().filter(|o| **o == MathAnswer::Number(1)).count(), 1);
  }
}
