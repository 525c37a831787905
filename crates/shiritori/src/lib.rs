//! Shiritori engine - the rules of the word-chaining game
//!
//! Each word must start with the syllable the previous word ended on. This
//! crate holds everything that decides a round and nothing that talks to
//! the network.
//!
//! # Architecture
//!
//! - **Kana**: normalization of raw input into hiragana words
//! - **Rules**: tail computation and the legality checks for each side
//! - **Round**: typestate phases from the player's move to the outcome
//! - **Opponent**: primary generator behind a trait, plus a fallback dictionary
//! - **Referee**: rebuilds state from the client's history and plays one round
//!
//! # Example
//!
//! ```no_run
//! use shiritori::{FallbackDictionary, MoveRequest, OpponentMoveProvider, Referee};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), shiritori::RoundError> {
//! let provider = OpponentMoveProvider::new(Arc::new(FallbackDictionary::builtin()));
//! let referee = Referee::new(provider);
//!
//! let outcome = referee.play_round(&MoveRequest::new(vec![], "ねこ")).await?;
//! println!("{}", outcome.message());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod history;
mod kana;
mod opponent;
mod outcome;
mod referee;
mod round;
mod rules;
mod word;

// Crate-level exports - Normalization
pub use kana::{
    PROLONGATION_MARK, Syllable, TABOO, fold_katakana, is_canonical, is_hiragana, normalize,
};
pub use word::Word;

// Crate-level exports - History
pub use history::{History, turn_count};

// Crate-level exports - Rules
pub use rules::{
    AvoidsTaboo, HeadMatches, LegalChallengerWord, LegalOpponentWord, NonEmpty, NotRepeated,
    PureSyllabary, RuleViolation, validate_challenger, validate_opponent,
};

// Crate-level exports - Round phases
pub use round::{AwaitingOpponentMove, AwaitingPlayerMove, PlayerValidated, RoundStep};
pub use outcome::{Outcome, Winner};
pub use error::RoundError;

// Crate-level exports - Opponent
pub use opponent::{
    DEFAULT_TIMEOUT, DictionaryError, FallbackDictionary, OpponentMoveProvider, OpponentPrompt,
    PrimarySource, SourceError, first_token,
};

// Crate-level exports - Orchestration
pub use referee::{MAX_TURNS, MoveRequest, PRIMARY_ATTEMPTS, Referee};
