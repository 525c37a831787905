//! Normalized words and their head/tail syllables.

use crate::kana::{self, PROLONGATION_MARK, Syllable};
use serde::Serialize;
use std::borrow::Borrow;
use tracing::instrument;

/// A word in canonical hiragana form.
///
/// Words are only built through [`kana::normalize`], so their content is
/// always hiragana or the prolongation mark. Equality is by content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Word(String);

impl Word {
    pub(crate) fn from_normalized(text: String) -> Self {
        Self(text)
    }

    /// Returns the word as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if normalization left nothing usable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of syllables in the word.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Returns true if every character is hiragana or the prolongation mark.
    pub fn is_pure(&self) -> bool {
        self.0.chars().all(kana::is_canonical)
    }

    /// First syllable in its large form.
    pub fn head(&self) -> Option<Syllable> {
        self.0.chars().next().and_then(Syllable::new).map(Syllable::base)
    }

    /// The syllable the next word has to start with.
    ///
    /// Trailing prolongation marks are skipped so `とー` chains on `と`,
    /// and a small final kana chains on its large form (`きしゃ` → `や`).
    /// Returns `None` for an empty word or one made only of marks.
    #[instrument(level = "trace", skip(self), fields(word = %self.0))]
    pub fn effective_tail(&self) -> Option<Syllable> {
        self.0
            .trim_end_matches(PROLONGATION_MARK)
            .chars()
            .next_back()
            .and_then(Syllable::new)
            .map(Syllable::base)
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Word {
    fn from(raw: &str) -> Self {
        kana::normalize(raw)
    }
}

impl From<String> for Word {
    fn from(raw: String) -> Self {
        kana::normalize(&raw)
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Word {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syl(c: char) -> Syllable {
        Syllable::new(c).expect("canonical test syllable")
    }

    #[test]
    fn test_effective_tail_plain() {
        assert_eq!(Word::from("ねこ").effective_tail(), Some(syl('こ')));
        assert_eq!(Word::from("とり").effective_tail(), Some(syl('り')));
    }

    #[test]
    fn test_effective_tail_skips_prolongation() {
        assert_eq!(
            Word::from("とー").effective_tail(),
            Word::from("と").effective_tail()
        );
        assert_eq!(Word::from("こーひー").effective_tail(), Some(syl('ひ')));
    }

    #[test]
    fn test_effective_tail_collapses_repeated_marks() {
        assert_eq!(Word::from("すーぱーーー").effective_tail(), Some(syl('ぱ')));
    }

    #[test]
    fn test_effective_tail_small_kana() {
        assert_eq!(Word::from("きしゃ").effective_tail(), Some(syl('や')));
        assert_eq!(Word::from("ちょっとぉー").effective_tail(), Some(syl('お')));
    }

    #[test]
    fn test_effective_tail_missing() {
        assert_eq!(Word::from("").effective_tail(), None);
        assert_eq!(Word::from("ーー").effective_tail(), None);
    }

    #[test]
    fn test_head_uses_large_form() {
        assert_eq!(Word::from("ゃま").head(), Some(syl('や')));
        assert_eq!(Word::from("ネコ").head(), Some(syl('ね')));
        assert_eq!(Word::from("").head(), None);
    }

    #[test]
    fn test_len_counts_syllables() {
        assert_eq!(Word::from("きしゃ").len(), 3);
        assert!(Word::from("abc").is_empty());
    }
}
