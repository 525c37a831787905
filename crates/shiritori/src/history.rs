//! Move history rebuilt from the client on every request.

use crate::kana::{self, Syllable};
use crate::word::Word;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Number of player moves represented by a history of `len` words.
///
/// The player moves first, so even 0-based indices are player moves.
pub fn turn_count(len: usize) -> u32 {
    u32::try_from(len.div_ceil(2)).unwrap_or(u32::MAX)
}

/// Ordered words played so far, oldest first, with the derived used-set.
#[derive(Debug, Clone, Default)]
pub struct History {
    words: Vec<Word>,
    used: HashSet<Word>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes raw client entries into a history.
    ///
    /// Blank entries are skipped. Every other entry keeps its position, even
    /// one that normalizes to an empty word: it still counts as a move and,
    /// when last, leaves no head to follow.
    #[instrument(skip(raw))]
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut history = Self::new();
        let mut skipped = 0usize;
        for entry in raw {
            let entry = entry.as_ref();
            if entry.trim().is_empty() {
                skipped += 1;
                continue;
            }
            history.push(kana::normalize(entry));
        }
        debug!(len = history.len(), skipped, "Rebuilt history");
        history
    }

    /// Appends a word; non-empty words are recorded as used.
    pub fn push(&mut self, word: Word) {
        if !word.is_empty() {
            self.used.insert(word.clone());
        }
        self.words.push(word);
    }

    /// Returns true if the word has already been played.
    pub fn contains(&self, word: &Word) -> bool {
        self.used.contains(word)
    }

    /// Words in play order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The set of words already played.
    pub fn used(&self) -> &HashSet<Word> {
        &self.used
    }

    /// The most recent word, if any.
    pub fn last(&self) -> Option<&Word> {
        self.words.last()
    }

    /// Number of words in the history.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if nothing has been played yet.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Player moves taken so far.
    pub fn player_turns(&self) -> u32 {
        turn_count(self.words.len())
    }

    /// Head the next word must start with, `None` for an empty history.
    pub fn required_head(&self) -> Option<Syllable> {
        self.last().and_then(Word::effective_tail)
    }

    /// Used words in play order, each listed once.
    pub fn used_words(&self) -> Vec<Word> {
        let mut seen = HashSet::with_capacity(self.words.len());
        self.words
            .iter()
            .filter(|w| !w.is_empty() && seen.insert(w.as_str()))
            .cloned()
            .collect()
    }

    /// Up to `n` most recent distinct words, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&Word> {
        let mut seen = HashSet::with_capacity(n);
        let mut recent: Vec<&Word> = self
            .words
            .iter()
            .rev()
            .filter(|w| !w.is_empty() && seen.insert(w.as_str()))
            .take(n)
            .collect();
        recent.reverse();
        recent
    }
}
