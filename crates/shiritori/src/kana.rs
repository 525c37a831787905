//! Kana normalization.
//!
//! Every comparison in the game happens on hiragana. Katakana input is
//! folded onto hiragana by a fixed code-point offset, the prolongation mark
//! is shared by both scripts, and anything else is discarded.

use crate::word::Word;
use serde::Serialize;
use tracing::instrument;

/// The long-vowel mark `ー`, common to hiragana and katakana text.
pub const PROLONGATION_MARK: char = 'ー';

/// A word ending on this syllable loses the game.
pub const TABOO: Syllable = Syllable('ん');

const HIRAGANA_FIRST: char = 'ぁ';
const HIRAGANA_LAST: char = 'ゖ';
const KATAKANA_FIRST: char = 'ァ';
const KATAKANA_LAST: char = 'ヶ';
const KATAKANA_OFFSET: u32 = KATAKANA_FIRST as u32 - HIRAGANA_FIRST as u32;

/// Small kana and the large kana they stand for in chaining comparisons.
const SMALL_TO_LARGE: [(char, char); 12] = [
    ('ぁ', 'あ'),
    ('ぃ', 'い'),
    ('ぅ', 'う'),
    ('ぇ', 'え'),
    ('ぉ', 'お'),
    ('っ', 'つ'),
    ('ゃ', 'や'),
    ('ゅ', 'ゆ'),
    ('ょ', 'よ'),
    ('ゎ', 'わ'),
    ('ゕ', 'か'),
    ('ゖ', 'け'),
];

/// Returns true for characters in the hiragana block `ぁ`..=`ゖ`.
pub fn is_hiragana(c: char) -> bool {
    (HIRAGANA_FIRST..=HIRAGANA_LAST).contains(&c)
}

/// Returns true for characters allowed inside a [`Word`].
pub fn is_canonical(c: char) -> bool {
    is_hiragana(c) || c == PROLONGATION_MARK
}

/// Maps a katakana letter onto its hiragana counterpart.
///
/// Letters with no hiragana counterpart (`ヷ`..=`ヺ`) return `None`.
pub fn fold_katakana(c: char) -> Option<char> {
    if (KATAKANA_FIRST..=KATAKANA_LAST).contains(&c) {
        char::from_u32(c as u32 - KATAKANA_OFFSET)
    } else {
        None
    }
}

/// Normalizes arbitrary text into a hiragana [`Word`].
///
/// Whitespace and non-kana characters are dropped silently, katakana is
/// folded to hiragana. The result may be empty.
#[instrument(level = "trace")]
pub fn normalize(raw: &str) -> Word {
    let folded: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| {
            if is_canonical(c) {
                Some(c)
            } else {
                fold_katakana(c)
            }
        })
        .collect();
    Word::from_normalized(folded)
}

/// A single hiragana character or the prolongation mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct Syllable(char);

impl Syllable {
    /// Wraps a canonical character; anything else returns `None`.
    pub fn new(c: char) -> Option<Self> {
        is_canonical(c).then_some(Self(c))
    }

    /// Parses text that normalizes to exactly one syllable.
    pub fn parse(raw: &str) -> Option<Self> {
        let word = normalize(raw);
        let mut chars = word.as_str().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => None,
        }
    }

    /// Returns the large form used for head/tail comparisons.
    pub fn base(self) -> Self {
        SMALL_TO_LARGE
            .iter()
            .find(|(small, _)| *small == self.0)
            .map(|(_, large)| Self(*large))
            .unwrap_or(self)
    }
}

impl std::fmt::Display for Syllable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Syllable> for String {
    fn from(syllable: Syllable) -> Self {
        syllable.0.to_string()
    }
}
