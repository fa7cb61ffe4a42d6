//! Built-in content banks for the generators, plus the avatar catalogue.
//!
//! These guarantee every tier can produce a full round without external data.

pub struct WordEntry {
  pub word: &'static str,
  pub image: &'static str,
}

pub struct OppositeEntry {
  pub word: &'static str,
  pub opposite: &'static str,
  pub image: &'static str,
}

pub struct SentenceEntry {
  pub sentence: &'static str,
  pub answer: &'static str,
  pub options: [&'static str; 3],
}

pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const WORDS: &[WordEntry] = &[
  WordEntry { word: "APEL", image: "🍎" },
  WordEntry { word: "PISANG", image: "🍌" },
  WordEntry { word: "ANGGUR", image: "🍇" },
  WordEntry { word: "KUCING", image: "🐱" },
  WordEntry { word: "ANJING", image: "🐶" },
  WordEntry { word: "MOBIL", image: "🚗" },
  WordEntry { word: "BOLA", image: "⚽" },
  WordEntry { word: "BUKU", image: "📚" },
  WordEntry { word: "RUMAH", image: "🏠" },
  WordEntry { word: "MATAHARI", image: "☀️" },
];

pub const OPPOSITES: &[OppositeEntry] = &[
  OppositeEntry { word: "BESAR", opposite: "KECIL", image: "🐘" },
  OppositeEntry { word: "PANAS", opposite: "DINGIN", image: "🔥" },
  OppositeEntry { word: "SIANG", opposite: "MALAM", image: "☀️" },
  OppositeEntry { word: "BUKA", opposite: "TUTUP", image: "📂" },
  OppositeEntry { word: "ATAS", opposite: "BAWAH", image: "⬆️" },
  OppositeEntry { word: "SENANG", opposite: "SEDIH", image: "😊" },
];

pub const SENTENCES: &[SentenceEntry] = &[
  SentenceEntry { sentence: "Ikan berenang di ...", answer: "AIR", options: ["AIR", "TANAH", "API"] },
  SentenceEntry { sentence: "Burung terbang di ...", answer: "LANGIT", options: ["LANGIT", "LAUT", "DALAM TANAH"] },
  SentenceEntry { sentence: "Sapi makan ...", answer: "RUMPUT", options: ["RUMPUT", "BATU", "KAYU"] },
  SentenceEntry { sentence: "Saya tidur di ...", answer: "KASUR", options: ["KASUR", "DAPUR", "KAMAR MANDI"] },
  SentenceEntry { sentence: "Mobil punya empat ...", answer: "RODA", options: ["RODA", "KAKI", "SAYAP"] },
];

/// Pictogram shown next to sentence-completion items.
pub const SENTENCE_IMAGE: &str = "📝";

/// Fixed wrong option offered by unscramble items.
pub const SCRAMBLE_SENTINEL: &str = "SALAH";

/// Glyph tokens for the logic games. All distinct.
pub const GLYPHS: &[&str] = &[
  "🍎", "🍌", "🍇", "🐶", "🐱", "🐭", "🚗", "✈️", "🚀", "⚽", "🏀", "🏈", "🏠", "🎈", "🎁",
];

/// Used only if no bank glyph is free for a distractor.
pub const FALLBACK_GLYPH: &str = "❓";

/// Placeholder slot in logic sequences.
pub const PLACEHOLDER: &str = "?";

pub const AVATAR_OPTIONS: &[&str] = &[
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Nala",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=King",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Willow",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Ryan",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Easton",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Maria",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Nolan",
  "https://api.dicebear.com/9.x/adventurer/svg?seed=Priscilla",
];

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn banks_are_consistent() {
    let glyphs: HashSet<_> = GLYPHS.iter().collect();
    assert_eq!(glyphs.len(), GLYPHS.len());
    assert!(!GLYPHS.contains(&FALLBACK_GLYPH));

    for s in SENTENCES {
      assert!(s.options.contains(&s.answer), "{}", s.sentence);
    }
    let opposites: HashSet<_> = OPPOSITES.iter().map(|o| o.opposite).collect();
    assert_eq!(opposites.len(), OPPOSITES.len());
    // Unscramble distractors rely on no palindromes in the bank.
    for w in WORDS {
      assert!(w.word.chars().rev().collect::<String>() != w.word);
      assert!(w.word.chars().all(|c| ALPHABET.contains(c)));
    }
  }
}
