//! Chaining rules.
//!
//! Each rule is a small precondition with a `check` function. The composite
//! checks run them in a fixed order and the first failure wins, so a word
//! that is both repeated and ends on `ん` is reported as repeated.

use crate::kana::{Syllable, TABOO};
use crate::word::Word;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Why a word may not be played.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RuleViolation {
    /// Nothing usable was left after normalization.
    #[display("Word is empty after normalization")]
    EmptyWord,

    /// The word contains characters outside hiragana.
    #[display("Word {_0} is not pure hiragana")]
    NotPureSyllabary(Word),

    /// The word was already played in this game.
    #[display("Word {_0} was already played")]
    RepeatedWord(Word),

    /// The word ends on the taboo syllable.
    #[display("Word {_0} ends on ん")]
    EndsOnTaboo(Word),

    /// The word does not start with the required syllable.
    #[display("Word {word} must start with {expected}")]
    WrongHead {
        /// The offending word.
        word: Word,
        /// The syllable the word had to start with.
        expected: Syllable,
    },
}

impl RuleViolation {
    /// Player-facing explanation.
    pub fn prompt(&self) -> String {
        match self {
            Self::EmptyWord => "ことばを入力してね".to_string(),
            Self::NotPureSyllabary(_) => "ひらがなだけで入力してね".to_string(),
            Self::RepeatedWord(_) => "同じことばは使えないよ".to_string(),
            Self::EndsOnTaboo(_) => format!("『{}』で終わったのでまけだよ", TABOO),
            Self::WrongHead { expected, .. } => format!("『{}』からはじめてね", expected),
        }
    }
}

impl std::error::Error for RuleViolation {}

/// Precondition: the word has content.
pub struct NonEmpty;

impl NonEmpty {
    pub fn check(word: &Word) -> Result<(), RuleViolation> {
        if word.is_empty() {
            Err(RuleViolation::EmptyWord)
        } else {
            Ok(())
        }
    }
}

/// Precondition: the word is hiragana and prolongation marks only.
pub struct PureSyllabary;

impl PureSyllabary {
    pub fn check(word: &Word) -> Result<(), RuleViolation> {
        if word.is_pure() {
            Ok(())
        } else {
            Err(RuleViolation::NotPureSyllabary(word.clone()))
        }
    }
}

/// Precondition: the word has not been played before.
pub struct NotRepeated;

impl NotRepeated {
    pub fn check(word: &Word, used: &HashSet<Word>) -> Result<(), RuleViolation> {
        if used.contains(word) {
            Err(RuleViolation::RepeatedWord(word.clone()))
        } else {
            Ok(())
        }
    }
}

/// Precondition: the word does not end on `ん`.
pub struct AvoidsTaboo;

impl AvoidsTaboo {
    pub fn check(word: &Word) -> Result<(), RuleViolation> {
        if word.effective_tail() == Some(TABOO) {
            Err(RuleViolation::EndsOnTaboo(word.clone()))
        } else {
            Ok(())
        }
    }
}

/// Precondition: the word starts with the required syllable.
///
/// A small first kana counts as its large form.
pub struct HeadMatches;

impl HeadMatches {
    pub fn check(word: &Word, expected: Syllable) -> Result<(), RuleViolation> {
        if word.head() == Some(expected.base()) {
            Ok(())
        } else {
            Err(RuleViolation::WrongHead {
                word: word.clone(),
                expected,
            })
        }
    }
}

/// Composite precondition for the human player's word.
pub struct LegalChallengerWord;

impl LegalChallengerWord {
    /// Runs every rule; the head check only applies once a word was played.
    #[instrument(skip(word, used), fields(word = %word))]
    pub fn check(
        word: &Word,
        required_head: Option<Syllable>,
        used: &HashSet<Word>,
    ) -> Result<(), RuleViolation> {
        NonEmpty::check(word)?;
        PureSyllabary::check(word)?;
        NotRepeated::check(word, used)?;
        AvoidsTaboo::check(word)?;
        if let Some(head) = required_head {
            HeadMatches::check(word, head)?;
        }
        debug!("Challenger word is legal");
        Ok(())
    }
}

/// Composite precondition for the opponent's word.
pub struct LegalOpponentWord;

impl LegalOpponentWord {
    #[instrument(skip(word, used), fields(word = %word))]
    pub fn check(
        word: &Word,
        required_head: Syllable,
        used: &HashSet<Word>,
    ) -> Result<(), RuleViolation> {
        LegalChallengerWord::check(word, Some(required_head), used)
    }
}

/// Validates the human player's word.
pub fn validate_challenger(
    word: &Word,
    required_head: Option<Syllable>,
    used: &HashSet<Word>,
) -> Result<(), RuleViolation> {
    LegalChallengerWord::check(word, required_head, used)
}

/// Validates the opponent's word; a head is always required.
pub fn validate_opponent(
    word: &Word,
    required_head: Syllable,
    used: &HashSet<Word>,
) -> Result<(), RuleViolation> {
    LegalOpponentWord::check(word, required_head, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syl(c: char) -> Syllable {
        Syllable::new(c).expect("canonical test syllable")
    }

    fn used(words: &[&str]) -> HashSet<Word> {
        words.iter().map(|w| Word::from(*w)).collect()
    }

    #[test]
    fn test_first_word_needs_no_head() {
        assert!(validate_challenger(&Word::from("ねこ"), None, &used(&[])).is_ok());
    }

    #[test]
    fn test_empty_word_rejected() {
        assert_eq!(
            validate_challenger(&Word::from("cat"), None, &used(&[])),
            Err(RuleViolation::EmptyWord)
        );
    }

    #[test]
    fn test_used_words_always_repeat() {
        let played = used(&["ねこ", "こま", "まり"]);
        for word in &played {
            for head in [None, word.head(), Some(syl('あ'))] {
                assert!(matches!(
                    validate_challenger(word, head, &played),
                    Err(RuleViolation::RepeatedWord(_))
                ));
            }
        }
    }

    #[test]
    fn test_taboo_ending_rejected_with_matching_head() {
        assert!(matches!(
            validate_challenger(&Word::from("めろん"), Some(syl('め')), &used(&[])),
            Err(RuleViolation::EndsOnTaboo(_))
        ));
    }

    #[test]
    fn test_taboo_checked_before_head() {
        assert!(matches!(
            validate_challenger(&Word::from("みかん"), Some(syl('め')), &used(&[])),
            Err(RuleViolation::EndsOnTaboo(_))
        ));
    }

    #[test]
    fn test_taboo_behind_prolongation_mark() {
        assert!(matches!(
            validate_challenger(&Word::from("らーめんー"), None, &used(&[])),
            Err(RuleViolation::EndsOnTaboo(_))
        ));
    }

    #[test]
    fn test_wrong_head_rejected() {
        let result = validate_challenger(&Word::from("いぬ"), Some(syl('こ')), &used(&[]));
        assert_eq!(
            result,
            Err(RuleViolation::WrongHead {
                word: Word::from("いぬ"),
                expected: syl('こ'),
            })
        );
        assert_eq!(
            result.unwrap_err().prompt(),
            "『こ』からはじめてね".to_string()
        );
    }

    #[test]
    fn test_small_kana_head_matches_large_form() {
        assert!(validate_challenger(&Word::from("ゃま"), Some(syl('や')), &used(&[])).is_ok());
    }

    #[test]
    fn test_opponent_requires_head() {
        assert!(validate_opponent(&Word::from("こおり"), syl('こ'), &used(&["ねこ"])).is_ok());
        assert!(matches!(
            validate_opponent(&Word::from("ごま"), syl('こ'), &used(&["ねこ"])),
            Err(RuleViolation::WrongHead { .. })
        ));
        assert_eq!(
            validate_opponent(&Word::from(""), syl('こ'), &used(&[])),
            Err(RuleViolation::EmptyWord)
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn used_words_always_repeat(
            played in prop::collection::vec("[ぁ-ゖ][ぁ-ゖー]{0,5}", 1..12),
            head in prop::char::range('\u{3041}', '\u{3096}'),
        ) {
            let used: HashSet<Word> = played.iter().map(|w| Word::from(w.as_str())).collect();
            let head = Syllable::new(head);
            for word in &used {
                for required in [None, head, word.head()] {
                    let result = validate_challenger(word, required, &used);
                    prop_assert!(
                        matches!(result, Err(RuleViolation::RepeatedWord(_))),
                        "{} with head {:?}: {:?}", word, required, result
                    );
                }
                if let Some(required) = head {
                    prop_assert!(matches!(
                        validate_opponent(word, required, &used),
                        Err(RuleViolation::RepeatedWord(_))
                    ));
                }
            }
        }
    }
}
