//! Reading items built from the word, opposite and sentence banks.
//!
//! Beginner: picture/word matching and first letters. Intermediate: missing letters and
//! opposites. Advanced: unscrambling and sentence completion.

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use super::{dedup, round_tag};
use crate::banks::{
  WordEntry, ALPHABET, OPPOSITES, SCRAMBLE_SENTINEL, SENTENCES, SENTENCE_IMAGE, WORDS,
};
use crate::domain::{DifficultyLevel, ReadingKind, ReadingQuestion};

pub fn generate<R: Rng + ?Sized>(
  difficulty: DifficultyLevel,
  count: usize,
  rng: &mut R,
) -> Vec<ReadingQuestion> {
  let tag = round_tag(rng);
  (0..count)
    .map(|i| {
      let id = format!("r-{tag}-{i}");
      let mut q = match difficulty {
        DifficultyLevel::Beginner => beginner(id, rng),
        DifficultyLevel::Intermediate => intermediate(id, rng),
        DifficultyLevel::Advanced => advanced(id, rng),
      };
      q.options = dedup(q.options);
      q
    })
    .collect()
}

fn prompt_for(kind: ReadingKind) -> &'static str {
  match kind {
    ReadingKind::MatchImage => "Pilih kata yang sesuai!",
    ReadingKind::MatchWord => "Pilih gambar yang tepat!",
    ReadingKind::FirstLetter => "Huruf depannya apa?",
    ReadingKind::MissingLetter => "Lengkapi kata ini!",
    ReadingKind::Opposite => "Apa lawan katanya?",
    ReadingKind::Scramble => "Susun menjadi kata yang benar!",
    ReadingKind::Sentence => "Lengkapi kalimat ini!",
  }
}

fn pick_word<R: Rng + ?Sized>(rng: &mut R) -> &'static WordEntry {
  &WORDS[rng.gen_range(0..WORDS.len())]
}

/// Two other bank words, in random order.
fn other_words<R: Rng + ?Sized>(item: &WordEntry, rng: &mut R) -> Vec<&'static WordEntry> {
  let mut others: Vec<&'static WordEntry> = WORDS.iter().filter(|w| w.word != item.word).collect();
  others.shuffle(rng);
  others.truncate(2);
  others
}

/// `correct` plus two distinct random alphabet letters, shuffled.
fn letter_options<R: Rng + ?Sized>(correct: char, rng: &mut R) -> Vec<String> {
  let mut picked: Vec<char> = ALPHABET.chars().filter(|c| *c != correct).choose_multiple(rng, 2);
  picked.push(correct);
  picked.shuffle(rng);
  picked.into_iter().map(String::from).collect()
}

fn beginner<R: Rng + ?Sized>(id: String, rng: &mut R) -> ReadingQuestion {
  let roll: f64 = rng.gen();
  let item = pick_word(rng);

  let (kind, options, answer) = if roll < 0.4 {
    let mut options: Vec<String> = std::iter::once(item)
      .chain(other_words(item, rng))
      .map(|w| w.word.to_string())
      .collect();
    options.shuffle(rng);
    (ReadingKind::MatchImage, options, item.word.to_string())
  } else if roll < 0.7 {
    let mut options: Vec<String> = std::iter::once(item)
      .chain(other_words(item, rng))
      .map(|w| w.image.to_string())
      .collect();
    options.shuffle(rng);
    (ReadingKind::MatchWord, options, item.image.to_string())
  } else {
    let first = item.word.chars().next().unwrap_or('A');
    (ReadingKind::FirstLetter, letter_options(first, rng), first.to_string())
  };

  ReadingQuestion {
    id,
    kind,
    prompt: prompt_for(kind).into(),
    word: item.word.into(),
    image: item.image.into(),
    scrambled_word: None,
    options,
    answer,
  }
}

fn intermediate<R: Rng + ?Sized>(id: String, rng: &mut R) -> ReadingQuestion {
  if rng.gen_bool(0.5) {
    let item = pick_word(rng);
    let letters: Vec<char> = item.word.chars().collect();
    let idx = rng.gen_range(0..letters.len());
    let missing = letters[idx];
    let display: String = letters
      .iter()
      .enumerate()
      .map(|(i, c)| if i == idx { '_' } else { *c })
      .collect();
    ReadingQuestion {
      id,
      kind: ReadingKind::MissingLetter,
      prompt: prompt_for(ReadingKind::MissingLetter).into(),
      word: display,
      image: item.image.into(),
      scrambled_word: None,
      options: letter_options(missing, rng),
      answer: missing.to_string(),
    }
  } else {
    let item = &OPPOSITES[rng.gen_range(0..OPPOSITES.len())];
    let mut others: Vec<&str> = OPPOSITES
      .iter()
      .filter(|o| o.opposite != item.opposite)
      .map(|o| o.opposite)
      .collect();
    others.shuffle(rng);
    others.truncate(2);
    let mut options: Vec<String> = std::iter::once(item.opposite)
      .chain(others)
      .map(String::from)
      .collect();
    options.shuffle(rng);
    ReadingQuestion {
      id,
      kind: ReadingKind::Opposite,
      prompt: prompt_for(ReadingKind::Opposite).into(),
      word: item.word.into(),
      image: item.image.into(),
      scrambled_word: None,
      options,
      answer: item.opposite.into(),
    }
  }
}

fn advanced<R: Rng + ?Sized>(id: String, rng: &mut R) -> ReadingQuestion {
  if rng.gen_bool(0.5) {
    let item = pick_word(rng);
    let mut letters: Vec<String> = item.word.chars().map(String::from).collect();
    letters.shuffle(rng);
    let reversed: String = item.word.chars().rev().collect();
    let mut options = vec![item.word.to_string(), reversed, SCRAMBLE_SENTINEL.to_string()];
    options.shuffle(rng);
    ReadingQuestion {
      id,
      kind: ReadingKind::Scramble,
      prompt: prompt_for(ReadingKind::Scramble).into(),
      word: item.word.into(),
      image: item.image.into(),
      scrambled_word: Some(letters.join(" ")),
      options,
      answer: item.word.into(),
    }
  } else {
    let item = &SENTENCES[rng.gen_range(0..SENTENCES.len())];
    let mut options: Vec<String> = item.options.iter().map(|o| o.to_string()).collect();
    options.shuffle(rng);
    ReadingQuestion {
      id,
      kind: ReadingKind::Sentence,
      prompt: prompt_for(ReadingKind::Sentence).into(),
      word: item.sentence.into(),
      image: SENTENCE_IMAGE.into(),
      scrambled_word: None,
      options,
      answer: item.answer.into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn trials(tier: DifficultyLevel, seed: u64) -> Vec<ReadingQuestion> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..1000).flat_map(|_| generate(tier, 5, &mut rng)).collect()
  }

  #[test]
  fn expected_value_is_an_option_exactly_once() {
    for tier in [DifficultyLevel::Beginner, DifficultyLevel::Intermediate, DifficultyLevel::Advanced] {
      for q in trials(tier, 11) {
        let expected = q.expected();
        assert_eq!(q.options.iter().filter(|o| **o == expected).count(), 1, "{q:?}");
        assert_eq!(expected, q.answer, "{q:?}");
        assert!(q.options.len() >= 2 && q.options.len() <= 4, "{q:?}");
      }
    }
  }

  #[test]
  fn tiers_only_produce_their_kinds() {
    use ReadingKind::*;
    let allowed = [
      (DifficultyLevel::Beginner, vec![MatchImage, MatchWord, FirstLetter]),
      (DifficultyLevel::Intermediate, vec![MissingLetter, Opposite]),
      (DifficultyLevel::Advanced, vec![Scramble, Sentence]),
    ];
    for (tier, kinds) in allowed {
      for q in trials(tier, 12) {
        assert!(kinds.contains(&q.kind), "{tier:?} produced {:?}", q.kind);
      }
    }
  }

  #[test]
  fn stored_answer_backs_opposite_and_sentence_items() {
    let mut seen_opposite = false;
    let mut seen_sentence = false;
    for q in trials(DifficultyLevel::Intermediate, 13)
      .into_iter()
      .chain(trials(DifficultyLevel::Advanced, 14))
    {
      match q.kind {
        ReadingKind::Opposite => {
          seen_opposite = true;
          assert_ne!(q.word, q.answer);
          assert!(q.options.contains(&q.answer));
          let pair = OPPOSITES.iter().find(|o| o.word == q.word).expect("bank pair");
          assert_eq!(pair.opposite, q.answer);
        }
        ReadingKind::Sentence => {
          seen_sentence = true;
          assert!(q.word.ends_with("..."));
          assert!(q.options.contains(&q.answer));
        }
        _ => {}
      }
    }
    assert!(seen_opposite && seen_sentence);
  }

  #[test]
  fn missing_letter_masks_exactly_one_position() {
    for q in trials(DifficultyLevel::Intermediate, 15) {
      if q.kind == ReadingKind::MissingLetter {
        assert_eq!(q.word.matches('_').count(), 1);
        let restored = q.word.replacen('_', &q.answer, 1);
        assert!(WORDS.iter().any(|w| w.word == restored), "{restored}");
      }
    }
  }

  #[test]
  fn scramble_is_a_space_joined_permutation() {
    for q in trials(DifficultyLevel::Advanced, 16) {
      if q.kind == ReadingKind::Scramble {
        let scrambled = q.scrambled_word.clone().expect("scrambled");
        let mut got: Vec<char> = scrambled.chars().filter(|c| *c != ' ').collect();
        let mut want: Vec<char> = q.word.chars().collect();
        got.sort_unstable();
        want.sort_unstable();
        assert_eq!(got, want);
        assert!(q.options.iter().any(|o| o == SCRAMBLE_SENTINEL));
      }
    }
  }
}
