//! Phase-specific typestate structs for one round.
//!
//! A round moves through `AwaitingPlayerMove → PlayerValidated →
//! AwaitingOpponentMove` and ends in an [`Outcome`]. Each phase owns the
//! state it needs, so an opponent reply can only be resolved after the
//! player's word was validated and recorded.

use crate::error::RoundError;
use crate::history::History;
use crate::kana::{self, Syllable};
use crate::outcome::Outcome;
use crate::rules::{self, RuleViolation};
use crate::word::Word;
use tracing::{debug, info, instrument, warn};

/// Result of advancing a round by one phase.
#[derive(Debug)]
pub enum RoundStep<T> {
    /// The round continues in the next phase.
    Next(T),
    /// The round is over.
    Resolved(Outcome),
}

// ─────────────────────────────────────────────────────────────
//  AwaitingPlayerMove
// ─────────────────────────────────────────────────────────────

/// Round waiting for the player's word.
#[derive(Debug, Clone)]
pub struct AwaitingPlayerMove {
    history: History,
    turns_before: u32,
    max_turns: u32,
}

impl AwaitingPlayerMove {
    /// Opens a round, or resolves it at once if the turn limit is reached.
    #[instrument(skip(history), fields(len = history.len()))]
    pub fn start(history: History, max_turns: u32) -> RoundStep<Self> {
        let turns_before = history.player_turns();
        if turns_before >= max_turns {
            info!(turns_before, max_turns, "Round limit already reached");
            return RoundStep::Resolved(Outcome::round_limit(&history, turns_before, max_turns));
        }
        RoundStep::Next(Self {
            history,
            turns_before,
            max_turns,
        })
    }

    /// Words played before this round.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Syllable the player must start with, `None` on the first move.
    pub fn required_head(&self) -> Option<Syllable> {
        self.history.required_head()
    }

    /// Player moves taken before this round.
    pub fn turns_before(&self) -> u32 {
        self.turns_before
    }

    /// Normalizes and validates the player's word.
    ///
    /// A blank candidate is a request error; any broken rule ends the game
    /// with the opponent as winner.
    #[instrument(skip(self), fields(head = ?self.required_head()))]
    pub fn submit(self, candidate: &str) -> Result<RoundStep<PlayerValidated>, RoundError> {
        if candidate.trim().is_empty() {
            warn!("Blank candidate submitted");
            return Err(RoundError::EmptyCandidate);
        }

        let word = kana::normalize(candidate);
        match rules::validate_challenger(&word, self.required_head(), self.history.used()) {
            Err(violation) => {
                info!(word = %word, %violation, "Player move rejected");
                Ok(RoundStep::Resolved(Outcome::player_fault(
                    &self.history,
                    word,
                    violation.prompt(),
                    self.turns_before + 1,
                )))
            }
            Ok(()) => {
                debug!(word = %word, "Player move accepted");
                Ok(RoundStep::Next(PlayerValidated {
                    history: self.history,
                    player_word: word,
                    turns_before: self.turns_before,
                    max_turns: self.max_turns,
                }))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  PlayerValidated
// ─────────────────────────────────────────────────────────────

/// The player's word passed every rule but is not yet recorded.
#[derive(Debug, Clone)]
pub struct PlayerValidated {
    history: History,
    player_word: Word,
    turns_before: u32,
    max_turns: u32,
}

impl PlayerValidated {
    /// The validated word.
    pub fn player_word(&self) -> &Word {
        &self.player_word
    }

    /// Records the player's word and derives the opponent's head.
    #[instrument(skip(self), fields(word = %self.player_word))]
    pub fn await_opponent(self) -> Result<AwaitingOpponentMove, RoundError> {
        let required_head = self
            .player_word
            .effective_tail()
            .ok_or_else(|| RoundError::NoTail(self.player_word.clone()))?;

        let mut history = self.history;
        history.push(self.player_word.clone());
        debug!(head = %required_head, "Waiting for opponent");

        Ok(AwaitingOpponentMove {
            history,
            player_word: self.player_word,
            required_head,
            turns_before: self.turns_before,
            max_turns: self.max_turns,
        })
    }
}

// ─────────────────────────────────────────────────────────────
//  AwaitingOpponentMove
// ─────────────────────────────────────────────────────────────

/// Round waiting for the opponent's reply.
#[derive(Debug, Clone)]
pub struct AwaitingOpponentMove {
    history: History,
    player_word: Word,
    required_head: Syllable,
    turns_before: u32,
    max_turns: u32,
}

impl AwaitingOpponentMove {
    /// Syllable the opponent must start with.
    pub fn required_head(&self) -> Syllable {
        self.required_head
    }

    /// History including the player's word.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The player's word this round.
    pub fn player_word(&self) -> &Word {
        &self.player_word
    }

    /// Checks a candidate reply without consuming the round.
    pub fn check(&self, candidate: &Word) -> Result<(), RuleViolation> {
        rules::validate_opponent(candidate, self.required_head, self.history.used())
    }

    /// Finishes the round with the opponent's final reply.
    ///
    /// The reply is validated again here; an invalid or missing reply makes
    /// the player the winner.
    #[instrument(skip(self, reply), fields(head = %self.required_head))]
    pub fn resolve(self, reply: Option<Word>) -> Outcome {
        let turns = self.turns_before + 1;
        let Some(word) = reply else {
            info!("Opponent could not answer");
            return Outcome::opponent_silent(&self.history, self.player_word, turns);
        };

        if let Err(violation) = self.check(&word) {
            info!(word = %word, %violation, "Opponent broke the rules");
            return Outcome::opponent_fault(&self.history, self.player_word, word, turns);
        }

        let next_head = word.effective_tail();
        let mut history = self.history;
        history.push(word.clone());
        Outcome::exchanged(&history, self.player_word, word, next_head, self.max_turns)
    }
}
