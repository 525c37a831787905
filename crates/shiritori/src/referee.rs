//! Turn orchestration.
//!
//! The referee rebuilds the game from the client's history, walks a round
//! through its phases, and decides how hard to try for an opponent reply.

use crate::error::RoundError;
use crate::history::History;
use crate::opponent::OpponentMoveProvider;
use crate::outcome::Outcome;
use crate::round::{AwaitingOpponentMove, AwaitingPlayerMove, RoundStep};
use crate::word::Word;
use tracing::{debug, info, instrument, warn};

/// Player moves allowed per game.
pub const MAX_TURNS: u32 = 20;

/// Calls to the primary source per opponent move: one try and one retry.
pub const PRIMARY_ATTEMPTS: u32 = 2;

/// One request: the game so far and the player's next word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveRequest {
    /// Words played so far, oldest first, player first.
    pub history: Vec<String>,
    /// The player's proposed word, raw.
    pub candidate: String,
}

impl MoveRequest {
    /// Creates a request.
    pub fn new(history: Vec<String>, candidate: impl Into<String>) -> Self {
        Self {
            history,
            candidate: candidate.into(),
        }
    }
}

/// Plays one round per request against an opponent provider.
#[derive(Debug, Clone)]
pub struct Referee {
    provider: OpponentMoveProvider,
    max_turns: u32,
}

impl Referee {
    /// Creates a referee with the default turn limit.
    #[instrument(skip(provider))]
    pub fn new(provider: OpponentMoveProvider) -> Self {
        Self {
            provider,
            max_turns: MAX_TURNS,
        }
    }

    /// Overrides the turn limit.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// The turn limit.
    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// The opponent provider.
    pub fn provider(&self) -> &OpponentMoveProvider {
        &self.provider
    }

    /// Plays the player's move and, if it stands, the opponent's reply.
    ///
    /// Broken rules end the game inside the returned [`Outcome`]; only
    /// malformed requests produce an error.
    #[instrument(skip(self, request), fields(history_len = request.history.len()))]
    pub async fn play_round(&self, request: &MoveRequest) -> Result<Outcome, RoundError> {
        let history = History::from_raw(&request.history);

        let awaiting = match AwaitingPlayerMove::start(history, self.max_turns) {
            RoundStep::Next(round) => round,
            RoundStep::Resolved(outcome) => return Ok(outcome),
        };

        let validated = match awaiting.submit(&request.candidate)? {
            RoundStep::Next(round) => round,
            RoundStep::Resolved(outcome) => return Ok(outcome),
        };

        let round = validated.await_opponent()?;
        let reply = self.opponent_reply(&round).await;
        let outcome = round.resolve(reply);

        info!(
            accepted = outcome.accepted(),
            game_over = outcome.game_over(),
            winner = ?outcome.winner(),
            turns = outcome.player_turn_count(),
            "Round resolved"
        );
        Ok(outcome)
    }

    /// Finds the opponent's reply.
    ///
    /// The primary source gets one retry when it answers nothing or answers
    /// with an illegal word. After that the fallback dictionary is asked
    /// once. If both fail, the last illegal primary word is returned so the
    /// outcome can show it; `None` means nobody answered at all.
    #[instrument(skip(self, round), fields(head = %round.required_head()))]
    async fn opponent_reply(&self, round: &AwaitingOpponentMove) -> Option<Word> {
        let head = round.required_head();
        let mut rejected = None;

        if self.provider.has_primary() {
            for attempt in 1..=PRIMARY_ATTEMPTS {
                let Some(word) = self
                    .provider
                    .propose_primary(head, round.history(), round.player_word())
                    .await
                else {
                    debug!(attempt, "No candidate from primary source");
                    continue;
                };

                match round.check(&word) {
                    Ok(()) => {
                        debug!(attempt, word = %word, "Primary candidate accepted");
                        return Some(word);
                    }
                    Err(violation) => {
                        warn!(attempt, word = %word, %violation, "Primary candidate rejected");
                        rejected = Some(word);
                    }
                }
            }
        }

        match self.provider.propose_fallback(head, round.history().used()) {
            Some(word) => Some(word),
            None => rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opponent::FallbackDictionary;
    use crate::outcome::Winner;
    use std::sync::Arc;

    fn referee(dictionary: FallbackDictionary) -> Referee {
        Referee::new(OpponentMoveProvider::new(Arc::new(dictionary)))
    }

    #[tokio::test]
    async fn test_fallback_answers_first_move() {
        let outcome = referee(FallbackDictionary::builtin())
            .play_round(&MoveRequest::new(vec![], "ねこ"))
            .await
            .unwrap();
        assert!(outcome.accepted());
        assert!(!outcome.game_over());
        let reply = outcome.opponent_word().clone().expect("opponent word");
        assert!(["ことり", "こめ", "こおり"].contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn test_custom_turn_limit() {
        let referee = referee(FallbackDictionary::builtin()).with_max_turns(1);
        let outcome = referee
            .play_round(&MoveRequest::new(vec![], "ねこ"))
            .await
            .unwrap();
        assert!(outcome.game_over());
        assert_eq!(outcome.winner(), Some(Winner::Nobody));
        assert_eq!(outcome.message(), "きょうはここまで！またあしたあそぼうね");
    }

    #[tokio::test]
    async fn test_blank_candidate_errors() {
        let err = referee(FallbackDictionary::builtin())
            .play_round(&MoveRequest::new(vec!["ねこ".into()], ""))
            .await
            .unwrap_err();
        assert_eq!(err, RoundError::EmptyCandidate);
    }
}
