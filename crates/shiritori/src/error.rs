//! Request-level errors.
//!
//! These are caller mistakes, not game results. A broken rule ends the game
//! through an [`Outcome`](crate::Outcome) instead.

use crate::word::Word;

/// A round could not be played because the request was malformed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RoundError {
    /// The candidate was blank.
    #[display("Candidate word is empty")]
    EmptyCandidate,

    /// A validated word has no syllable to chain from.
    #[display("Word {_0} has no tail syllable")]
    NoTail(Word),
}

impl RoundError {
    /// Player-facing explanation.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::EmptyCandidate => "ことばを入力してね",
            Self::NoTail(_) => "単語が空です",
        }
    }
}

impl std::error::Error for RoundError {}
