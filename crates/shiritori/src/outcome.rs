//! Result of one round: the player's move and at most one opponent reply.

use crate::history::History;
use crate::kana::Syllable;
use crate::word::Word;
use derive_getters::Getters;
use serde::Serialize;

/// Who won a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// The human player.
    Player,
    /// The automated opponent.
    Opponent,
    /// Nobody; the round limit was reached.
    #[serde(rename = "none")]
    Nobody,
}

/// Everything the caller needs to render a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct Outcome {
    /// Whether the player's move stood.
    #[getter(copy)]
    accepted: bool,
    /// Player-facing message.
    message: String,
    /// The player's word after normalization.
    player_word: Option<Word>,
    /// The opponent's reply, including a rejected one.
    opponent_word: Option<Word>,
    /// Syllable the player has to start with next.
    #[getter(copy)]
    next_required_head: Option<Syllable>,
    /// Every word played so far, in order.
    used_words: Vec<Word>,
    /// Player moves taken, including this one.
    #[getter(copy)]
    player_turn_count: u32,
    /// Whether the game has ended.
    #[getter(copy)]
    game_over: bool,
    /// Winner of a finished game; `None` while it continues.
    #[getter(copy)]
    winner: Option<Winner>,
}

impl Outcome {
    /// The round limit was already reached before this move.
    pub(crate) fn round_limit(history: &History, turns: u32, max_turns: u32) -> Self {
        Self {
            accepted: false,
            message: format!("{}かいまでだよ。さいしょからやりなおしてね", max_turns),
            player_word: None,
            opponent_word: None,
            next_required_head: None,
            used_words: history.used_words(),
            player_turn_count: turns,
            game_over: true,
            winner: Some(Winner::Nobody),
        }
    }

    /// The player broke a rule and loses.
    pub(crate) fn player_fault(history: &History, word: Word, message: String, turns: u32) -> Self {
        Self {
            accepted: false,
            message,
            player_word: Some(word),
            opponent_word: None,
            next_required_head: None,
            used_words: history.used_words(),
            player_turn_count: turns,
            game_over: true,
            winner: Some(Winner::Opponent),
        }
    }

    /// The opponent had nothing to say; the player wins.
    pub(crate) fn opponent_silent(history: &History, player_word: Word, turns: u32) -> Self {
        Self {
            accepted: true,
            message: "AIはこたえられなかったよ。あなたのかち！".to_string(),
            player_word: Some(player_word),
            opponent_word: None,
            next_required_head: None,
            used_words: history.used_words(),
            player_turn_count: turns,
            game_over: true,
            winner: Some(Winner::Player),
        }
    }

    /// The opponent's last word broke a rule; the player wins.
    pub(crate) fn opponent_fault(
        history: &History,
        player_word: Word,
        opponent_word: Word,
        turns: u32,
    ) -> Self {
        Self {
            accepted: true,
            message: "AIがルールをまもれなかったよ。あなたのかち！".to_string(),
            player_word: Some(player_word),
            opponent_word: Some(opponent_word),
            next_required_head: None,
            used_words: history.used_words(),
            player_turn_count: turns,
            game_over: true,
            winner: Some(Winner::Player),
        }
    }

    /// Both moves stood. The game ends in a tie once `max_turns` is reached.
    pub(crate) fn exchanged(
        history: &History,
        player_word: Word,
        opponent_word: Word,
        next_head: Option<Syllable>,
        max_turns: u32,
    ) -> Self {
        let turns = history.player_turns();
        let game_over = turns >= max_turns;
        let message = match (game_over, next_head) {
            (true, _) => "きょうはここまで！またあしたあそぼうね".to_string(),
            (false, Some(head)) => format!("つぎは『{}』からはじめてね", head),
            (false, None) => "つぎのことばをどうぞ".to_string(),
        };
        Self {
            accepted: true,
            message,
            player_word: Some(player_word),
            opponent_word: Some(opponent_word),
            next_required_head: next_head,
            used_words: history.used_words(),
            player_turn_count: turns,
            game_over,
            winner: game_over.then_some(Winner::Nobody),
        }
    }
}
